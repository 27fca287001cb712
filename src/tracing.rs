//! Module containing some extension traits to support code instrumentation
//! using the `tracing` crate.

use async_trait::async_trait;
use tracing::instrument;

use crate::mediator::{Dispatcher, Error};
use crate::message::{Command, Event, Query};

/// [Dispatcher] type wrapper that provides instrumentation
/// features through the `tracing` crate.
///
/// Every dispatch opens a span recording the name of the message,
/// and records the error returned, if any.
#[derive(Debug, Clone)]
pub struct InstrumentedDispatcher<D>
where
    D: Dispatcher,
{
    inner: D,
}

impl<D> InstrumentedDispatcher<D>
where
    D: Dispatcher,
{
    /// Returns the wrapped [Dispatcher].
    pub fn into_inner(self) -> D {
        self.inner
    }
}

#[async_trait]
impl<D> Dispatcher for InstrumentedDispatcher<D>
where
    D: Dispatcher,
{
    #[instrument(name = "courier::Dispatcher.execute", err, skip_all, fields(command = command.name()))]
    fn execute<C>(&self, command: &C) -> Result<(), Error>
    where
        C: Command + ?Sized,
    {
        self.inner.execute(command)
    }

    #[instrument(name = "courier::Dispatcher.query", err, skip_all, fields(query = query.name()))]
    fn query<Q>(&self, query: &Q) -> Result<Q::Output, Error>
    where
        Q: Query + ?Sized,
    {
        self.inner.query(query)
    }

    #[instrument(name = "courier::Dispatcher.raise", err, skip_all, fields(event = event.name()))]
    fn raise<E>(&self, event: &E) -> Result<(), Error>
    where
        E: Event + ?Sized,
    {
        self.inner.raise(event)
    }

    #[allow(clippy::blocks_in_conditions)] // NOTE: seems to be a false positive.
    #[instrument(name = "courier::Dispatcher.execute_async", err, skip_all, fields(command = command.name()))]
    async fn execute_async<C>(&self, command: &C) -> Result<(), Error>
    where
        C: Command + ?Sized,
    {
        self.inner.execute_async(command).await
    }

    #[allow(clippy::blocks_in_conditions)] // NOTE: seems to be a false positive.
    #[instrument(name = "courier::Dispatcher.query_async", err, skip_all, fields(query = query.name()))]
    async fn query_async<Q>(&self, query: &Q) -> Result<Q::Output, Error>
    where
        Q: Query + ?Sized,
    {
        self.inner.query_async(query).await
    }

    #[allow(clippy::blocks_in_conditions)] // NOTE: seems to be a false positive.
    #[instrument(name = "courier::Dispatcher.raise_async", err, skip_all, fields(event = event.name()))]
    async fn raise_async<E>(&self, event: &E) -> Result<(), Error>
    where
        E: Event + ?Sized,
    {
        self.inner.raise_async(event).await
    }
}

/// Extension trait for any [Dispatcher] type to provide
/// instrumentation features through the `tracing` crate.
pub trait DispatcherExt: Dispatcher + Sized {
    /// Returns an instrumented version of the [Dispatcher] instance.
    fn with_tracing(self) -> InstrumentedDispatcher<Self> {
        InstrumentedDispatcher { inner: self }
    }
}

impl<T> DispatcherExt for T where T: Dispatcher {}
