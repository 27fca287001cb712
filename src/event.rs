//! Module `event` contains the Handler contracts used to react to Domain [Event]s.
//!
//! Contrary to [Command][crate::message::Command]s and [Query][crate::message::Query]s,
//! an [Event] can have any number of Handlers subscribed to it, including none.

use std::sync::Arc;

use async_trait::async_trait;

use crate::message::Event;

/// A software component that reacts to [Event]s of a certain type.
pub trait Handler<T>: Send + Sync
where
    T: Event,
{
    /// The error type returned by the Handler while handling an [Event].
    type Error: Into<anyhow::Error>;

    /// Handles the [Event] provided.
    fn handle(&self, event: &T) -> Result<(), Self::Error>;
}

impl<T, Err, F> Handler<T> for F
where
    T: Event,
    Err: Into<anyhow::Error>,
    F: Send + Sync + Fn(&T) -> Result<(), Err>,
{
    type Error = Err;

    fn handle(&self, event: &T) -> Result<(), Self::Error> {
        self(event)
    }
}

impl<T, H> Handler<T> for Arc<H>
where
    T: Event,
    H: Handler<T> + ?Sized,
{
    type Error = H::Error;

    fn handle(&self, event: &T) -> Result<(), Self::Error> {
        (**self).handle(event)
    }
}

/// Asynchronous version of the Event [Handler].
#[async_trait]
pub trait AsyncHandler<T>: Send + Sync
where
    T: Event,
{
    /// The error type returned by the Handler while handling an [Event].
    type Error: Into<anyhow::Error>;

    /// Handles the [Event] provided.
    async fn handle(&self, event: &T) -> Result<(), Self::Error>;
}

#[async_trait]
impl<T, H> AsyncHandler<T> for Arc<H>
where
    T: Event,
    H: AsyncHandler<T> + ?Sized,
{
    type Error = H::Error;

    async fn handle(&self, event: &T) -> Result<(), Self::Error> {
        (**self).handle(event).await
    }
}
