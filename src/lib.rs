//! `courier` is an in-process message dispatcher, implementing the Mediator pattern.
//!
//! Callers submit a [Command], a [Query] or an [Event] to a [Mediator] without
//! knowing which component handles it: the [Mediator] resolves the handler(s)
//! registered for the message runtime type through a registry, and invokes them
//! either synchronously or asynchronously.
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use courier::{registry, Dispatcher, Handler, Mediator, Message, Query};
//!
//! struct GetGreeting(String);
//!
//! impl Message for GetGreeting {}
//! impl Query for GetGreeting {
//!     type Output = String;
//! }
//!
//! let mut registry = registry::InMemory::default();
//! registry
//!     .register(Handler::query::<GetGreeting, _>(|query: &GetGreeting| {
//!         Ok::<_, Infallible>(format!("Hello, {}!", query.0))
//!     }))
//!     .unwrap();
//!
//! let mediator = Mediator::from(registry);
//! let greeting = mediator.query(&GetGreeting("world".to_owned())).unwrap();
//!
//! assert_eq!("Hello, world!", greeting);
//! ```

#![deny(unsafe_code, unused_qualifications, trivial_casts)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod contract;
pub mod event;
pub mod handler;
pub mod lookup;
pub mod mediator;
pub mod message;
pub mod query;
pub mod registry;
#[cfg(feature = "tracing")]
pub mod tracing;

pub use crate::contract::{Category, Contract, Mode, Multiplicity};
pub use crate::handler::Handler;
pub use crate::lookup::{Lookup, LookupAll};
pub use crate::mediator::{Config, Dispatcher, Error, FanOut, Mediator};
pub use crate::message::{AsAny, Command, Event, Message, Query};
