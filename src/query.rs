//! Module `query` contains the Handler contracts to evaluate Domain [Query]s.

use std::sync::Arc;

use async_trait::async_trait;

use crate::message::Query;

/// An Handler describes an implementation that is able to handle specific [Query]s.
///
/// The Handler evaluates the Domain Query and produces a **result**, described
/// by the [Output][Query::Output] associated type of the [Query].
pub trait Handler<T>: Send + Sync
where
    T: Query,
{
    /// The error type returned by the Handler when Query evaluation fails.
    type Error: Into<anyhow::Error>;

    /// Evaluates the [Query] provided and returns its result.
    ///
    /// # Errors
    ///
    /// As the Handler can fail to evaluate the Query, an [Error][Handler::Error]
    /// can be returned instead.
    fn handle(&self, query: &T) -> Result<T::Output, Self::Error>;
}

impl<T, Err, F> Handler<T> for F
where
    T: Query,
    Err: Into<anyhow::Error>,
    F: Send + Sync + Fn(&T) -> Result<T::Output, Err>,
{
    type Error = Err;

    fn handle(&self, query: &T) -> Result<T::Output, Self::Error> {
        self(query)
    }
}

impl<T, H> Handler<T> for Arc<H>
where
    T: Query,
    H: Handler<T> + ?Sized,
{
    type Error = H::Error;

    fn handle(&self, query: &T) -> Result<T::Output, Self::Error> {
        (**self).handle(query)
    }
}

/// Asynchronous version of the Query [Handler].
#[async_trait]
pub trait AsyncHandler<T>: Send + Sync
where
    T: Query,
{
    /// The error type returned by the Handler when Query evaluation fails.
    type Error: Into<anyhow::Error>;

    /// Evaluates the [Query] provided and returns its result.
    async fn handle(&self, query: &T) -> Result<T::Output, Self::Error>;
}

#[async_trait]
impl<T, H> AsyncHandler<T> for Arc<H>
where
    T: Query,
    H: AsyncHandler<T> + ?Sized,
{
    type Error = H::Error;

    async fn handle(&self, query: &T) -> Result<T::Output, Self::Error> {
        (**self).handle(query).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::convert::Infallible;

    use super::*;
    use crate::message::tests::GetBalance;

    struct Balances(HashMap<&'static str, u64>);

    #[async_trait]
    impl AsyncHandler<GetBalance> for Balances {
        type Error = Infallible;

        async fn handle(&self, query: &GetBalance) -> Result<u64, Self::Error> {
            Ok(self.0.get(query.0).copied().unwrap_or_default())
        }
    }

    #[test]
    fn closures_are_query_handlers() {
        let handler = |query: &GetBalance| -> Result<u64, Infallible> {
            Ok(if query.0 == "rich" { 1_000 } else { 0 })
        };

        assert_eq!(Ok(1_000), Handler::handle(&handler, &GetBalance("rich")));
        assert_eq!(Ok(0), Handler::handle(&handler, &GetBalance("poor")));
    }

    #[tokio::test]
    async fn async_handlers_evaluate_queries() {
        let handler = Arc::new(Balances(HashMap::from([("rich", 1_000)])));

        let balance = AsyncHandler::handle(&handler, &GetBalance("rich")).await;

        assert_eq!(Ok(1_000), balance);
    }
}
