//! Contains the [Handler] type, the opaque handler instance a registry stores
//! and returns to the [Mediator][crate::Mediator] during dispatch.
//!
//! A [Handler] is built from a concrete, statically-typed handler implementation
//! (e.g. a [`command::Handler`]) and captures the logic necessary to invoke it
//! with a type-erased message: the only place where the message gets
//! downcasted back to its concrete type.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::contract::{Contract, Mode};
use crate::message::{Command, Event, Query};
use crate::{command, event, query};

/// A message, erased to its runtime type.
pub(crate) type Erased<'a> = &'a (dyn Any + Send + Sync);

/// Uniform invocation surface for synchronous [Command] handlers.
///
/// All the adapter surfaces return [None] when the message is not of the type
/// the wrapped handler accepts.
pub(crate) trait CommandAdapter: Send + Sync {
    fn execute(&self, command: Erased<'_>) -> Option<anyhow::Result<()>>;
}

/// Uniform invocation surface for asynchronous [Command] handlers.
pub(crate) trait AsyncCommandAdapter: Send + Sync {
    fn execute<'a>(&'a self, command: Erased<'a>) -> Option<BoxFuture<'a, anyhow::Result<()>>>;
}

/// Uniform invocation surface for synchronous [Query] handlers producing `R`.
pub(crate) trait QueryAdapter<R>: Send + Sync {
    fn handle(&self, query: Erased<'_>) -> Option<anyhow::Result<R>>;
}

/// Uniform invocation surface for asynchronous [Query] handlers producing `R`.
pub(crate) trait AsyncQueryAdapter<R>: Send + Sync {
    fn handle<'a>(&'a self, query: Erased<'a>) -> Option<BoxFuture<'a, anyhow::Result<R>>>;
}

/// Uniform invocation surface for synchronous [Event] handlers.
pub(crate) trait EventAdapter: Send + Sync {
    fn handle(&self, event: Erased<'_>) -> Option<anyhow::Result<()>>;
}

/// Uniform invocation surface for asynchronous [Event] handlers.
pub(crate) trait AsyncEventAdapter: Send + Sync {
    fn handle<'a>(&'a self, event: Erased<'a>) -> Option<BoxFuture<'a, anyhow::Result<()>>>;
}

/// Binds a concrete handler `H` to the message type `T` it accepts.
struct Adapter<T, H> {
    inner: H,
    message: PhantomData<fn(&T)>,
}

impl<T, H> Adapter<T, H> {
    fn new(inner: H) -> Self {
        Self {
            inner,
            message: PhantomData,
        }
    }
}

impl<T, H> CommandAdapter for Adapter<T, H>
where
    T: Command,
    H: command::Handler<T>,
{
    fn execute(&self, command: Erased<'_>) -> Option<anyhow::Result<()>> {
        let command = command.downcast_ref::<T>()?;
        Some(self.inner.execute(command).map_err(Into::into))
    }
}

impl<T, H> AsyncCommandAdapter for Adapter<T, H>
where
    T: Command,
    H: command::AsyncHandler<T>,
{
    fn execute<'a>(&'a self, command: Erased<'a>) -> Option<BoxFuture<'a, anyhow::Result<()>>> {
        let command = command.downcast_ref::<T>()?;

        Some(
            async move { self.inner.execute(command).await.map_err(Into::into) }.boxed(),
        )
    }
}

impl<T, H> QueryAdapter<T::Output> for Adapter<T, H>
where
    T: Query,
    H: query::Handler<T>,
{
    fn handle(&self, query: Erased<'_>) -> Option<anyhow::Result<T::Output>> {
        let query = query.downcast_ref::<T>()?;
        Some(self.inner.handle(query).map_err(Into::into))
    }
}

impl<T, H> AsyncQueryAdapter<T::Output> for Adapter<T, H>
where
    T: Query,
    H: query::AsyncHandler<T>,
{
    fn handle<'a>(&'a self, query: Erased<'a>) -> Option<BoxFuture<'a, anyhow::Result<T::Output>>> {
        let query = query.downcast_ref::<T>()?;

        Some(async move { self.inner.handle(query).await.map_err(Into::into) }.boxed())
    }
}

impl<T, H> EventAdapter for Adapter<T, H>
where
    T: Event,
    H: event::Handler<T>,
{
    fn handle(&self, event: Erased<'_>) -> Option<anyhow::Result<()>> {
        let event = event.downcast_ref::<T>()?;
        Some(self.inner.handle(event).map_err(Into::into))
    }
}

impl<T, H> AsyncEventAdapter for Adapter<T, H>
where
    T: Event,
    H: event::AsyncHandler<T>,
{
    fn handle<'a>(&'a self, event: Erased<'a>) -> Option<BoxFuture<'a, anyhow::Result<()>>> {
        let event = event.downcast_ref::<T>()?;

        Some(async move { self.inner.handle(event).await.map_err(Into::into) }.boxed())
    }
}

#[derive(Clone)]
enum Surface {
    Command(Arc<dyn CommandAdapter>),
    AsyncCommand(Arc<dyn AsyncCommandAdapter>),
    // NOTE: holds an `Arc<dyn QueryAdapter<R>>`, as `R` is only known at dispatch time.
    Query(Arc<dyn Any + Send + Sync>),
    // NOTE: holds an `Arc<dyn AsyncQueryAdapter<R>>`.
    AsyncQuery(Arc<dyn Any + Send + Sync>),
    Event(Arc<dyn EventAdapter>),
    AsyncEvent(Arc<dyn AsyncEventAdapter>),
}

/// A handler instance, as stored in and returned by a registry.
///
/// The [Handler] satisfies exactly one [Contract], accessible
/// through [`Handler::contract`]. Cloning a [Handler] is cheap, as
/// the underlying handler implementation is shared.
#[derive(Clone)]
pub struct Handler {
    contract: Contract,
    surface: Surface,
}

impl Handler {
    /// Wraps a synchronous [`command::Handler`] for the [Command] `T`.
    pub fn command<T, H>(handler: H) -> Self
    where
        T: Command,
        H: command::Handler<T> + 'static,
    {
        Self {
            contract: Contract::command::<T>(Mode::Sync),
            surface: Surface::Command(Arc::new(Adapter::<T, H>::new(handler))),
        }
    }

    /// Wraps an asynchronous [`command::AsyncHandler`] for the [Command] `T`.
    pub fn async_command<T, H>(handler: H) -> Self
    where
        T: Command,
        H: command::AsyncHandler<T> + 'static,
    {
        Self {
            contract: Contract::command::<T>(Mode::Async),
            surface: Surface::AsyncCommand(Arc::new(Adapter::<T, H>::new(handler))),
        }
    }

    /// Wraps a synchronous [`query::Handler`] for the [Query] `T`.
    pub fn query<T, H>(handler: H) -> Self
    where
        T: Query,
        H: query::Handler<T> + 'static,
    {
        let adapter: Arc<dyn QueryAdapter<T::Output>> = Arc::new(Adapter::<T, H>::new(handler));

        Self {
            contract: Contract::query::<T>(Mode::Sync),
            surface: Surface::Query(Arc::new(adapter)),
        }
    }

    /// Wraps an asynchronous [`query::AsyncHandler`] for the [Query] `T`.
    pub fn async_query<T, H>(handler: H) -> Self
    where
        T: Query,
        H: query::AsyncHandler<T> + 'static,
    {
        let adapter: Arc<dyn AsyncQueryAdapter<T::Output>> =
            Arc::new(Adapter::<T, H>::new(handler));

        Self {
            contract: Contract::query::<T>(Mode::Async),
            surface: Surface::AsyncQuery(Arc::new(adapter)),
        }
    }

    /// Wraps a synchronous [`event::Handler`] for the [Event] `T`.
    pub fn event<T, H>(handler: H) -> Self
    where
        T: Event,
        H: event::Handler<T> + 'static,
    {
        Self {
            contract: Contract::event::<T>(Mode::Sync),
            surface: Surface::Event(Arc::new(Adapter::<T, H>::new(handler))),
        }
    }

    /// Wraps an asynchronous [`event::AsyncHandler`] for the [Event] `T`.
    pub fn async_event<T, H>(handler: H) -> Self
    where
        T: Event,
        H: event::AsyncHandler<T> + 'static,
    {
        Self {
            contract: Contract::event::<T>(Mode::Async),
            surface: Surface::AsyncEvent(Arc::new(Adapter::<T, H>::new(handler))),
        }
    }

    /// Returns the [Contract] this handler satisfies.
    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub(crate) fn as_command(&self) -> Option<&dyn CommandAdapter> {
        match &self.surface {
            Surface::Command(adapter) => Some(adapter.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn as_async_command(&self) -> Option<&dyn AsyncCommandAdapter> {
        match &self.surface {
            Surface::AsyncCommand(adapter) => Some(adapter.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn as_query<R>(&self) -> Option<&dyn QueryAdapter<R>>
    where
        R: 'static,
    {
        match &self.surface {
            Surface::Query(adapter) => adapter
                .downcast_ref::<Arc<dyn QueryAdapter<R>>>()
                .map(|adapter| &**adapter),
            _ => None,
        }
    }

    pub(crate) fn as_async_query<R>(&self) -> Option<&dyn AsyncQueryAdapter<R>>
    where
        R: 'static,
    {
        match &self.surface {
            Surface::AsyncQuery(adapter) => adapter
                .downcast_ref::<Arc<dyn AsyncQueryAdapter<R>>>()
                .map(|adapter| &**adapter),
            _ => None,
        }
    }

    pub(crate) fn as_event(&self) -> Option<&dyn EventAdapter> {
        match &self.surface {
            Surface::Event(adapter) => Some(adapter.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn as_async_event(&self) -> Option<&dyn AsyncEventAdapter> {
        match &self.surface {
            Surface::AsyncEvent(adapter) => Some(adapter.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}
