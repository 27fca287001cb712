//! This module contains the definition of the [Message] type, and the three
//! categories a [Message] can belong to: [Command], [Query] and [Event].
//!
//! The [Mediator][crate::Mediator] uses the runtime type of a [Message]
//! as the dispatch key, which is why every [Message] must be `'static`
//! and exposes itself as [`Any`] through [`AsAny`].

use std::any::{Any, TypeId};

/// Access to the concrete, runtime type of a value.
///
/// This trait is implemented for every `'static` type that is [Send] and [Sync],
/// and it is mostly useful on trait objects such as `&dyn Command`, where
/// [`AsAny::as_any`] resolves to the concrete type behind the pointer.
pub trait AsAny {
    /// Returns the value as [`Any`], to inspect or downcast its concrete type.
    fn as_any(&self) -> &(dyn Any + Send + Sync);
}

impl<T> AsAny for T
where
    T: Any + Send + Sync,
{
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

/// Represents a piece of domain data that is dispatched through the system.
///
/// A Message is only ever borrowed by the [Mediator][crate::Mediator]
/// for the duration of a single dispatch call.
pub trait Message: AsAny + Send + Sync + 'static {
    /// Returns the name of the [Message], used in errors and diagnostics.
    ///
    /// Defaults to the fully-qualified name of the concrete type.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A Command expresses the intent of an Actor (e.g. a User, or a System)
/// to mutate the state of the system.
///
/// Commands return nothing but the outcome of the operation, and are handled
/// by exactly one [Handler][crate::command::Handler].
pub trait Command: Message {}

/// A Query is a request for data, producing an [Output][Query::Output]
/// and handled by exactly one [Handler][crate::query::Handler].
pub trait Query: Message {
    /// The type of the data returned when the Query gets evaluated.
    type Output: Send + 'static;
}

/// An Event is the notification of something that has already happened.
///
/// Events can be handled by any number of [Handler][crate::event::Handler]s,
/// including none at all.
pub trait Event: Message {}

/// Returns the [`TypeId`] of the concrete type of the [Message],
/// even when the [Message] is behind a trait object.
pub(crate) fn runtime_type<M>(message: &M) -> TypeId
where
    M: Message + ?Sized,
{
    message.as_any().type_id()
}
