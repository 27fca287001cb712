//! Contains [`InMemory`], a [`HashMap`]-based registry of [Handler]s
//! that can be used as both [Lookup] and [`LookupAll`] of a [Mediator].
//!
//! Applications with a dependency injection container would rather
//! implement [Lookup] and [`LookupAll`] on top of it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::contract::{Contract, Multiplicity};
use crate::handler::Handler;
use crate::lookup::{Lookup, LookupAll};
use crate::mediator::Mediator;

/// All possible errors returned by [`InMemory::register`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when registering a second [Handler] for a [Contract]
    /// that only allows for one, e.g. the [Contract] of a [Command][crate::Command].
    #[error("{0} has already been registered")]
    AlreadyRegistered(Contract),
}

/// In-memory registry of [Handler]s, indexed by their [Contract].
///
/// [Handler]s satisfying the same [Contract] are returned in registration order.
#[derive(Debug, Clone, Default)]
pub struct InMemory {
    handlers: HashMap<Contract, Vec<Handler>>,
}

impl InMemory {
    /// Registers a new [Handler].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if the [Contract] of the [Handler]
    /// allows for a single handler, and one has already been registered.
    pub fn register(&mut self, handler: Handler) -> Result<&mut Self, Error> {
        let contract = *handler.contract();
        let handlers = self.handlers.entry(contract).or_default();

        if contract.multiplicity() == Multiplicity::Single && !handlers.is_empty() {
            return Err(Error::AlreadyRegistered(contract));
        }

        handlers.push(handler);

        Ok(self)
    }

    /// Returns the number of [Handler]s registered for the [Contract].
    #[must_use]
    pub fn count(&self, contract: &Contract) -> usize {
        self.handlers.get(contract).map_or(0, Vec::len)
    }
}

impl Lookup for InMemory {
    fn lookup(&self, contract: &Contract) -> anyhow::Result<Option<Handler>> {
        Ok(self
            .handlers
            .get(contract)
            .and_then(|handlers| handlers.first())
            .cloned())
    }
}

impl LookupAll for InMemory {
    fn lookup_all(&self, contract: &Contract) -> Vec<Handler> {
        self.handlers.get(contract).cloned().unwrap_or_default()
    }
}

impl From<InMemory> for Mediator<Arc<InMemory>, Arc<InMemory>> {
    fn from(registry: InMemory) -> Self {
        let registry = Arc::new(registry);
        Mediator::new(registry.clone(), registry)
    }
}
