//! Module containing the Handler contracts for Domain [Command]s.
//!
//! Following the Domain-driven Design definition, a [Command] expresses the
//! intent of an Actor (e.g. a Customer, a User, a System, etc.) to modify
//! the state of the system in some way.
//!
//! To modify the state of the system through a [Command], you must implement
//! either a synchronous [Handler] or an [`AsyncHandler`] for it, and register
//! it in the registry used by the [Mediator][crate::Mediator].
//! The two contracts are looked up separately: a [Handler] is never used
//! to serve [`Dispatcher::execute_async`][crate::Dispatcher::execute_async],
//! and vice versa.

use std::sync::Arc;

use async_trait::async_trait;

use crate::message::Command;

/// A software component that is able to handle [Command]s of a certain type,
/// and mutate the state as a result of the command handling, or fail.
pub trait Handler<T>: Send + Sync
where
    T: Command,
{
    /// The error type returned by the Handler while handling a [Command].
    type Error: Into<anyhow::Error>;

    /// Handles a [Command] and returns an error if the handling has failed.
    ///
    /// Since [Command]s are solely modifying the state of the system,
    /// they do not return anything to the caller but the result of the operation
    /// (expressed by a [Result] type).
    fn execute(&self, command: &T) -> Result<(), Self::Error>;
}

impl<T, Err, F> Handler<T> for F
where
    T: Command,
    Err: Into<anyhow::Error>,
    F: Send + Sync + Fn(&T) -> Result<(), Err>,
{
    type Error = Err;

    fn execute(&self, command: &T) -> Result<(), Self::Error> {
        self(command)
    }
}

impl<T, H> Handler<T> for Arc<H>
where
    T: Command,
    H: Handler<T> + ?Sized,
{
    type Error = H::Error;

    fn execute(&self, command: &T) -> Result<(), Self::Error> {
        (**self).execute(command)
    }
}

/// Asynchronous version of the Command [Handler].
#[async_trait]
pub trait AsyncHandler<T>: Send + Sync
where
    T: Command,
{
    /// The error type returned by the Handler while handling a [Command].
    type Error: Into<anyhow::Error>;

    /// Handles a [Command] and returns an error if the handling has failed.
    async fn execute(&self, command: &T) -> Result<(), Self::Error>;
}

#[async_trait]
impl<T, H> AsyncHandler<T> for Arc<H>
where
    T: Command,
    H: AsyncHandler<T> + ?Sized,
{
    type Error = H::Error;

    async fn execute(&self, command: &T) -> Result<(), Self::Error> {
        (**self).execute(command).await
    }
}
