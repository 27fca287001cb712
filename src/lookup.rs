//! The boundary between the [Mediator][crate::Mediator] and the registry
//! (or container, or service locator) holding the [Handler] instances.
//!
//! The [Mediator][crate::Mediator] never owns the handlers: it uses
//! a [Lookup] to resolve the single handler of a [Command][crate::Command]
//! or [Query][crate::Query], and a [`LookupAll`] to resolve all the handlers
//! of an [Event][crate::Event].
//!
//! Both traits are implemented for closures with the same signature
//! as their methods.

use std::sync::Arc;

use crate::contract::Contract;
use crate::handler::Handler;

/// Resolves the single [Handler] satisfying a [Contract].
pub trait Lookup: Send + Sync {
    /// Returns the [Handler] registered for the [Contract], if any.
    ///
    /// # Errors
    ///
    /// The lookup can fail when the underlying registry cannot resolve
    /// a [Handler], e.g. because it is misconfigured.
    fn lookup(&self, contract: &Contract) -> anyhow::Result<Option<Handler>>;
}

impl<F> Lookup for F
where
    F: Send + Sync + Fn(&Contract) -> anyhow::Result<Option<Handler>>,
{
    fn lookup(&self, contract: &Contract) -> anyhow::Result<Option<Handler>> {
        self(contract)
    }
}

impl<T> Lookup for Arc<T>
where
    T: Lookup + ?Sized,
{
    fn lookup(&self, contract: &Contract) -> anyhow::Result<Option<Handler>> {
        (**self).lookup(contract)
    }
}

/// Resolves all the [Handler]s satisfying a [Contract].
pub trait LookupAll: Send + Sync {
    /// Returns all the [Handler]s registered for the [Contract],
    /// in the order they should be invoked.
    ///
    /// An empty list is a valid result.
    fn lookup_all(&self, contract: &Contract) -> Vec<Handler>;
}

impl<F> LookupAll for F
where
    F: Send + Sync + Fn(&Contract) -> Vec<Handler>,
{
    fn lookup_all(&self, contract: &Contract) -> Vec<Handler> {
        self(contract)
    }
}

impl<T> LookupAll for Arc<T>
where
    T: LookupAll + ?Sized,
{
    fn lookup_all(&self, contract: &Contract) -> Vec<Handler> {
        (**self).lookup_all(contract)
    }
}
