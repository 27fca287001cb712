//! Resolution of the handler [Contract] a message must be dispatched to.
//!
//! A [Contract] is the key used to look up handlers in a registry: it is
//! derived deterministically from the message [Category], the dispatch [Mode],
//! the runtime type of the message and, for [Query]s, the type of the result.
//!
//! The functions in this module are pure: they never touch a registry.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::message::{self, Command, Event, Query};

/// The category a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// See [Command].
    Command,
    /// See [Query].
    Query,
    /// See [Event].
    Event,
}

impl Category {
    /// Returns how many handlers are expected for messages of this category.
    #[must_use]
    pub fn multiplicity(self) -> Multiplicity {
        match self {
            Category::Command | Category::Query => Multiplicity::Single,
            Category::Event => Multiplicity::Many,
        }
    }
}

/// Whether a message is dispatched to a synchronous or asynchronous handler.
///
/// Synchronous and asynchronous handlers live in separate lookup spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Dispatched to handlers such as [`command::Handler`][crate::command::Handler].
    Sync,
    /// Dispatched to handlers such as [`command::AsyncHandler`][crate::command::AsyncHandler].
    Async,
}

/// The number of handlers a [Contract] lookup is expected to yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    /// Exactly one handler must be resolved.
    Single,
    /// Zero or more handlers can be resolved.
    Many,
}

/// Identifies the handler capability that must be looked up to dispatch
/// a specific message type.
///
/// Two Contracts are equal when they share category, mode, message type
/// and result type; the message name is only carried for diagnostics.
#[derive(Clone, Copy)]
pub struct Contract {
    category: Category,
    mode: Mode,
    message: TypeId,
    message_name: &'static str,
    output: Option<TypeId>,
}

impl Contract {
    /// Returns the [Contract] satisfied by handlers of the [Command] type `T`.
    #[must_use]
    pub fn command<T>(mode: Mode) -> Self
    where
        T: Command,
    {
        Self::of::<T>(Category::Command, mode, None)
    }

    /// Returns the [Contract] satisfied by handlers of the [Query] type `T`.
    #[must_use]
    pub fn query<T>(mode: Mode) -> Self
    where
        T: Query,
    {
        Self::of::<T>(Category::Query, mode, Some(TypeId::of::<T::Output>()))
    }

    /// Returns the [Contract] satisfied by handlers of the [Event] type `T`.
    #[must_use]
    pub fn event<T>(mode: Mode) -> Self
    where
        T: Event,
    {
        Self::of::<T>(Category::Event, mode, None)
    }

    /// Resolves the [Contract] needed to dispatch the [Command] provided,
    /// using its runtime type.
    #[must_use]
    pub fn for_command<T>(command: &T, mode: Mode) -> Self
    where
        T: Command + ?Sized,
    {
        Self::for_message(command, Category::Command, mode, None)
    }

    /// Resolves the [Contract] needed to dispatch the [Query] provided,
    /// using its runtime type.
    #[must_use]
    pub fn for_query<T>(query: &T, mode: Mode) -> Self
    where
        T: Query + ?Sized,
    {
        Self::for_message(
            query,
            Category::Query,
            mode,
            Some(TypeId::of::<T::Output>()),
        )
    }

    /// Resolves the [Contract] needed to dispatch the [Event] provided,
    /// using its runtime type.
    #[must_use]
    pub fn for_event<T>(event: &T, mode: Mode) -> Self
    where
        T: Event + ?Sized,
    {
        Self::for_message(event, Category::Event, mode, None)
    }

    fn of<T>(category: Category, mode: Mode, output: Option<TypeId>) -> Self
    where
        T: message::Message,
    {
        Self {
            category,
            mode,
            message: TypeId::of::<T>(),
            message_name: type_name::<T>(),
            output,
        }
    }

    fn for_message<T>(message: &T, category: Category, mode: Mode, output: Option<TypeId>) -> Self
    where
        T: message::Message + ?Sized,
    {
        Self {
            category,
            mode,
            message: message::runtime_type(message),
            message_name: message.name(),
            output,
        }
    }

    /// The [Category] of the message the handler accepts.
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether the handler is synchronous or asynchronous.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// How many handlers are expected to satisfy this [Contract].
    #[must_use]
    pub fn multiplicity(&self) -> Multiplicity {
        self.category.multiplicity()
    }

    /// The [`TypeId`] of the message type the handler accepts.
    #[must_use]
    pub fn message_type(&self) -> TypeId {
        self.message
    }

    /// A human-readable name of the message type, for diagnostics only.
    #[must_use]
    pub fn message_name(&self) -> &'static str {
        self.message_name
    }

    /// The [`TypeId`] of the result type, for [Query] contracts.
    #[must_use]
    pub fn output_type(&self) -> Option<TypeId> {
        self.output
    }
}

impl PartialEq for Contract {
    fn eq(&self, other: &Contract) -> bool {
        self.category == other.category
            && self.mode == other.mode
            && self.message == other.message
            && self.output == other.output
    }
}

impl Eq for Contract {}

impl Hash for Contract {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.category.hash(state);
        self.mode.hash(state);
        self.message.hash(state);
        self.output.hash(state);
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("category", &self.category)
            .field("mode", &self.mode)
            .field("message", &self.message_name)
            .finish()
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match (self.mode, self.category) {
            (Mode::Async, _) => "an async ",
            (Mode::Sync, Category::Event) => "an ",
            (Mode::Sync, _) => "a ",
        };

        write!(f, "{}{:?} handler for {}", prefix, self.category, self.message_name)
    }
}
