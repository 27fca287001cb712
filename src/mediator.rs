//! Module containing the [Mediator], the entrypoint used to dispatch
//! [Command]s, [Query]s and [Event]s to their handlers, without knowing
//! which component is going to handle them.
//!
//! The [Mediator] does not hold any handler itself: it resolves them at every
//! dispatch through the [Lookup] and [`LookupAll`] functions provided on
//! construction, and then invokes them.
//!
//! ## Limitations
//!
//! The [Mediator] has no notion of cancellation or timeouts: a handler
//! that never returns (or whose future never completes) blocks the caller
//! indefinitely. Wrap the dispatch futures with your runtime's timeout
//! facilities if you need one.

use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};

use crate::contract::{Contract, Mode};
use crate::handler::Handler;
use crate::lookup::{Lookup, LookupAll};
use crate::message::{Command, Event, Query};

/// All possible errors returned by a [Dispatcher].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when no handler could be resolved for a [Command] or a [Query],
    /// either because the lookup yielded nothing or because it failed.
    ///
    /// The lookup failure, if any, is available as the error source.
    #[error(
        "handler was not found for message of type {message}: the registry is not configured \
         properly, or {contract} has not been registered"
    )]
    HandlerNotFound {
        /// The name of the message type that was dispatched.
        message: &'static str,
        /// The [Contract] that was looked up.
        contract: Contract,
        /// The error returned by the lookup, if it failed.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Returned when the registry resolved a handler that does not satisfy
    /// the [Contract] that was looked up.
    ///
    /// This error indicates an inconsistent registry.
    #[error("registry returned {found} while resolving {expected}, for message of type {message}")]
    ContractMismatch {
        /// The name of the message type that was dispatched.
        message: &'static str,
        /// The [Contract] that was looked up.
        expected: Contract,
        /// The [Contract] satisfied by the handler returned by the registry.
        found: Contract,
    },

    /// Returned when the handler itself fails.
    ///
    /// The handler error is forwarded untouched, and can be inspected
    /// with [`anyhow::Error::downcast_ref`].
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl Error {
    fn not_found(contract: Contract, source: Option<anyhow::Error>) -> Self {
        Error::HandlerNotFound {
            message: contract.message_name(),
            contract,
            source,
        }
    }

    fn mismatch(expected: Contract, handler: &Handler) -> Self {
        Error::ContractMismatch {
            message: expected.message_name(),
            expected,
            found: *handler.contract(),
        }
    }
}

/// Specifies how the handlers of an [Event] are invoked by [`Dispatcher::raise_async`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// Handlers are invoked one after the other, in the order returned
    /// by the registry, each one awaited before starting the next.
    #[default]
    Sequential,

    /// Handlers are all started at once and awaited together.
    ///
    /// The first failure is returned, and the handlers still in progress
    /// are dropped.
    Concurrent,
}

/// Configuration of a [Mediator].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How the asynchronous [Event] handlers are invoked.
    pub fan_out: FanOut,
}

/// A Dispatcher delivers messages to the handlers responsible for them.
///
/// All methods accept either concrete messages or trait objects
/// (e.g. `&dyn Command`): the handlers are always resolved using the
/// runtime type of the message.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Executes a [Command] through its synchronous handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerNotFound`] if no handler is registered
    /// for the [Command], or [`Error::Handler`] if the handler fails.
    fn execute<C>(&self, command: &C) -> Result<(), Error>
    where
        C: Command + ?Sized;

    /// Evaluates a [Query] through its synchronous handler,
    /// returning the handler result untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerNotFound`] if no handler is registered
    /// for the [Query], or [`Error::Handler`] if the handler fails.
    fn query<Q>(&self, query: &Q) -> Result<Q::Output, Error>
    where
        Q: Query + ?Sized;

    /// Raises an [Event] to all its synchronous handlers, in registration order.
    ///
    /// Raising an [Event] with no handlers is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handler`] as soon as one handler fails: the handlers
    /// following it are not invoked.
    fn raise<E>(&self, event: &E) -> Result<(), Error>
    where
        E: Event + ?Sized;

    /// Asynchronous version of [`Dispatcher::execute`].
    async fn execute_async<C>(&self, command: &C) -> Result<(), Error>
    where
        C: Command + ?Sized;

    /// Asynchronous version of [`Dispatcher::query`].
    async fn query_async<Q>(&self, query: &Q) -> Result<Q::Output, Error>
    where
        Q: Query + ?Sized;

    /// Asynchronous version of [`Dispatcher::raise`].
    ///
    /// Handlers are invoked according to the [`FanOut`] configured.
    async fn raise_async<E>(&self, event: &E) -> Result<(), Error>
    where
        E: Event + ?Sized;
}

/// The default [Dispatcher] implementation.
///
/// A [Mediator] is stateless besides its lookup functions, and can be shared
/// between concurrent callers.
#[derive(Clone)]
pub struct Mediator<S, M> {
    single: S,
    multi: M,
    config: Config,
}

impl<S, M> Mediator<S, M>
where
    S: Lookup,
    M: LookupAll,
{
    /// Creates a new [Mediator] resolving single handlers through `single`,
    /// and [Event] handlers through `multi`.
    pub fn new(single: S, multi: M) -> Self {
        Self {
            single,
            multi,
            config: Config::default(),
        }
    }

    /// Replaces the [Config] of the [Mediator].
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Returns the current [Config] of the [Mediator].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolve(&self, contract: Contract) -> Result<Handler, Error> {
        let handler = self
            .single
            .lookup(&contract)
            .map_err(|err| Error::not_found(contract, Some(err)))?
            .ok_or_else(|| Error::not_found(contract, None))?;

        if handler.contract() != &contract {
            return Err(Error::mismatch(contract, &handler));
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(%contract, "resolved handler");

        Ok(handler)
    }

    fn resolve_all(&self, contract: Contract) -> Result<Vec<Handler>, Error> {
        let handlers = self.multi.lookup_all(&contract);

        if let Some(handler) = handlers.iter().find(|h| h.contract() != &contract) {
            return Err(Error::mismatch(contract, handler));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(%contract, handlers = handlers.len(), "resolved event handlers");

        Ok(handlers)
    }
}

#[async_trait]
impl<S, M> Dispatcher for Mediator<S, M>
where
    S: Lookup,
    M: LookupAll,
{
    fn execute<C>(&self, command: &C) -> Result<(), Error>
    where
        C: Command + ?Sized,
    {
        let contract = Contract::for_command(command, Mode::Sync);
        let handler = self.resolve(contract)?;

        handler
            .as_command()
            .and_then(|adapter| adapter.execute(command.as_any()))
            .ok_or_else(|| Error::mismatch(contract, &handler))?
            .map_err(Error::Handler)
    }

    fn query<Q>(&self, query: &Q) -> Result<Q::Output, Error>
    where
        Q: Query + ?Sized,
    {
        let contract = Contract::for_query(query, Mode::Sync);
        let handler = self.resolve(contract)?;

        handler
            .as_query::<Q::Output>()
            .and_then(|adapter| adapter.handle(query.as_any()))
            .ok_or_else(|| Error::mismatch(contract, &handler))?
            .map_err(Error::Handler)
    }

    fn raise<E>(&self, event: &E) -> Result<(), Error>
    where
        E: Event + ?Sized,
    {
        let contract = Contract::for_event(event, Mode::Sync);

        for handler in self.resolve_all(contract)? {
            handler
                .as_event()
                .and_then(|adapter| adapter.handle(event.as_any()))
                .ok_or_else(|| Error::mismatch(contract, &handler))?
                .map_err(Error::Handler)?;
        }

        Ok(())
    }

    #[allow(clippy::let_and_return)] // NOTE: the invocation must end before `handler` is dropped.
    async fn execute_async<C>(&self, command: &C) -> Result<(), Error>
    where
        C: Command + ?Sized,
    {
        let contract = Contract::for_command(command, Mode::Async);
        let handler = self.resolve(contract)?;

        let invocation = handler
            .as_async_command()
            .and_then(|adapter| adapter.execute(command.as_any()))
            .ok_or_else(|| Error::mismatch(contract, &handler))?;

        let result = invocation.await.map_err(Error::Handler);
        result
    }

    #[allow(clippy::let_and_return)] // NOTE: the invocation must end before `handler` is dropped.
    async fn query_async<Q>(&self, query: &Q) -> Result<Q::Output, Error>
    where
        Q: Query + ?Sized,
    {
        let contract = Contract::for_query(query, Mode::Async);
        let handler = self.resolve(contract)?;

        let invocation = handler
            .as_async_query::<Q::Output>()
            .and_then(|adapter| adapter.handle(query.as_any()))
            .ok_or_else(|| Error::mismatch(contract, &handler))?;

        let result = invocation.await.map_err(Error::Handler);
        result
    }

    async fn raise_async<E>(&self, event: &E) -> Result<(), Error>
    where
        E: Event + ?Sized,
    {
        let contract = Contract::for_event(event, Mode::Async);
        let handlers = self.resolve_all(contract)?;

        let invocations = handlers
            .iter()
            .map(|handler| {
                handler
                    .as_async_event()
                    .and_then(|adapter| adapter.handle(event.as_any()))
                    .ok_or_else(|| Error::mismatch(contract, handler))
            })
            .collect::<Result<Vec<BoxFuture<'_, anyhow::Result<()>>>, Error>>()?;

        match self.config.fan_out {
            FanOut::Sequential => {
                for invocation in invocations {
                    invocation.await.map_err(Error::Handler)?;
                }
            },
            FanOut::Concurrent => {
                future::try_join_all(invocations)
                    .await
                    .map_err(Error::Handler)?;
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::contract::Category;
    use crate::message::tests::{AccountWasOpened, GetBalance, OpenAccount};
    use crate::event;

    fn nothing(_: &Contract) -> anyhow::Result<Option<Handler>> {
        Ok(None)
    }

    fn no_one(_: &Contract) -> Vec<Handler> {
        Vec::new()
    }

    #[test]
    fn missing_handlers_are_reported_with_the_message_type() {
        let mediator = Mediator::new(nothing, no_one);

        let err = mediator
            .query(&GetBalance("test"))
            .expect_err("query should fail without handlers");

        match err {
            Error::HandlerNotFound {
                message,
                contract,
                source,
            } => {
                assert_eq!("GetBalance", message);
                assert_eq!(Category::Query, contract.category());
                assert!(source.is_none());
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lookup_failures_are_wrapped_preserving_the_cause() {
        let broken = |_: &Contract| -> anyhow::Result<Option<Handler>> {
            Err(anyhow::anyhow!("container is not initialized"))
        };

        let mediator = Mediator::new(broken, no_one);
        let command = OpenAccount {
            owner: "test@test.com".to_owned(),
        };

        let err = mediator
            .execute(&command)
            .expect_err("command should fail with a broken container");

        assert!(matches!(err, Error::HandlerNotFound { .. }));
        assert!(err.to_string().contains("OpenAccount"));

        let cause = std::error::Error::source(&err).expect("lookup failure should be the source");
        assert_eq!("container is not initialized", cause.to_string());
    }

    #[test]
    fn inconsistent_registries_are_detected() {
        let wrong = |_: &Contract| -> anyhow::Result<Option<Handler>> {
            Ok(Some(Handler::command::<OpenAccount, _>(
                |_: &OpenAccount| Ok::<_, Infallible>(()),
            )))
        };

        let mediator = Mediator::new(wrong, no_one);

        let err = mediator
            .query(&GetBalance("test"))
            .expect_err("query should not be dispatched to a command handler");

        assert!(err
            .to_string()
            .starts_with("registry returned a Command handler for "));
        assert!(err.to_string().contains("while resolving a Query handler for "));

        match err {
            Error::ContractMismatch {
                message,
                expected,
                found,
            } => {
                assert_eq!("GetBalance", message);
                assert_eq!(Contract::query::<GetBalance>(Mode::Sync), expected);
                assert_eq!(Contract::command::<OpenAccount>(Mode::Sync), found);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn async_dispatch_ignores_sync_handlers() {
        let sync_only = |contract: &Contract| -> anyhow::Result<Option<Handler>> {
            Ok((contract == &Contract::command::<OpenAccount>(Mode::Sync)).then(|| {
                Handler::command::<OpenAccount, _>(|_: &OpenAccount| Ok::<_, Infallible>(()))
            }))
        };

        let mediator = Mediator::new(sync_only, no_one);
        let command = OpenAccount {
            owner: "test@test.com".to_owned(),
        };

        assert!(mediator.execute(&command).is_ok());
        assert!(matches!(
            mediator.execute_async(&command).await,
            Err(Error::HandlerNotFound { .. })
        ));
    }

    struct Counter(Arc<AtomicUsize>);

    #[async_trait]
    impl event::AsyncHandler<AccountWasOpened> for Counter {
        type Error = Infallible;

        async fn handle(&self, _: &AccountWasOpened) -> Result<(), Self::Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn concurrent_fan_out_invokes_all_handlers() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handlers = {
            let counter = counter.clone();
            move |_: &Contract| -> Vec<Handler> {
                (0..3)
                    .map(|_| Handler::async_event::<AccountWasOpened, _>(Counter(counter.clone())))
                    .collect()
            }
        };

        let mediator = Mediator::new(nothing, handlers).with_config(Config {
            fan_out: FanOut::Concurrent,
        });

        mediator
            .raise_async(&AccountWasOpened("test@test.com"))
            .await
            .expect("event should be raised");

        assert_eq!(3, counter.load(Ordering::SeqCst));
    }

    struct Unreachable(&'static str);

    #[async_trait]
    impl event::AsyncHandler<AccountWasOpened> for Unreachable {
        type Error = anyhow::Error;

        async fn handle(&self, _: &AccountWasOpened) -> Result<(), Self::Error> {
            anyhow::bail!("{} is unreachable", self.0)
        }
    }

    #[tokio::test]
    async fn concurrent_fan_out_returns_the_handler_failure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handlers = {
            let counter = counter.clone();
            move |_: &Contract| -> Vec<Handler> {
                vec![
                    Handler::async_event::<AccountWasOpened, _>(Counter(counter.clone())),
                    Handler::async_event::<AccountWasOpened, _>(Unreachable("mailer")),
                    Handler::async_event::<AccountWasOpened, _>(Counter(counter.clone())),
                ]
            }
        };

        let mediator = Mediator::new(nothing, handlers).with_config(Config {
            fan_out: FanOut::Concurrent,
        });

        let err = mediator
            .raise_async(&AccountWasOpened("test@test.com"))
            .await
            .expect_err("event delivery should fail");

        assert!(matches!(err, Error::Handler(_)));
        assert_eq!("mailer is unreachable", err.to_string());
    }

    #[tokio::test]
    async fn event_handlers_of_the_wrong_mode_are_detected() {
        let sync_handlers = |_: &Contract| -> Vec<Handler> {
            vec![Handler::event::<AccountWasOpened, _>(
                |_: &AccountWasOpened| Ok::<_, Infallible>(()),
            )]
        };

        let mediator = Mediator::new(nothing, sync_handlers);

        let err = mediator
            .raise_async(&AccountWasOpened("test@test.com"))
            .await
            .expect_err("async delivery should not use sync handlers");

        match err {
            Error::ContractMismatch {
                message,
                expected,
                found,
            } => {
                assert!(message.ends_with("AccountWasOpened"));
                assert_eq!(Contract::event::<AccountWasOpened>(Mode::Async), expected);
                assert_eq!(Contract::event::<AccountWasOpened>(Mode::Sync), found);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn config_is_deserializable() {
        let config: Config =
            serde_json::from_str(r#"{ "fan_out": "concurrent" }"#).expect("config should parse");

        assert_eq!(FanOut::Concurrent, config.fan_out);
        assert_eq!(
            Config::default(),
            serde_json::from_str::<Config>("{}").expect("empty config should parse")
        );
    }

    #[test]
    fn dispatch_through_trait_objects() {
        let executed = Arc::new(AtomicUsize::new(0));
        let single = {
            let executed = executed.clone();
            move |_: &Contract| -> anyhow::Result<Option<Handler>> {
                let executed = executed.clone();
                Ok(Some(Handler::command::<OpenAccount, _>(
                    move |_: &OpenAccount| -> Result<(), Infallible> {
                        executed.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    },
                )))
            }
        };

        let mediator = Mediator::new(single, no_one);
        let command: Box<dyn Command> = Box::new(OpenAccount {
            owner: "test@test.com".to_owned(),
        });

        mediator
            .execute(&*command)
            .expect("command should be executed");

        assert_eq!(1, executed.load(Ordering::SeqCst));
    }
}
