#[cfg(feature = "mock")]
pub mod mock;
pub mod prelude;
pub mod static_resolver;

pub use prelude::Resolve;
pub use static_resolver::StaticResolver;

use std::sync::Arc;

use sinkdns_proto::{Question, Record};

/// Feeds a resolved [`Record`] somewhere, typically a TTL cache. Kept as its
/// own trait (rather than folding it into [`Resolve`]) so the cache crate
/// doesn't need to know about the resolver chain to be fed by it.
#[async_trait::async_trait]
pub trait Feed: std::fmt::Debug + Send + Sync {
    fn feed(&self, question: &Question, record: &Record);
}

impl<T: Feed + ?Sized> Feed for Arc<T> {
    fn feed(&self, question: &Question, record: &Record) {
        (**self).feed(question, record)
    }
}

/// Wraps a delegate resolver and feeds every hit into a cache before
/// returning it, so the next query for the same name is served from the
/// cache instead of the delegate.
#[derive(Debug)]
pub struct CacheFeeder<D, C> {
    delegate: D,
    cache: C,
}

impl<D, C> CacheFeeder<D, C> {
    pub fn new(delegate: D, cache: C) -> Self {
        Self { delegate, cache }
    }
}

#[async_trait::async_trait]
impl<D, C> Resolve for CacheFeeder<D, C>
where
    D: Resolve,
    C: Feed,
{
    fn name(&self) -> &'static str {
        "cache-feeder"
    }

    async fn resolve(&self, question: &Question) -> Option<Record> {
        let record = self.delegate.resolve(question).await?;
        self.cache.feed(question, &record);
        Some(record)
    }
}

/// Sequential, first-hit-wins chain of resolvers. There is no intra-chain
/// parallelism: resolvers are tried in order and the first `Some` wins,
/// matching the decorator/chain design this is grounded on.
#[derive(Debug, Default)]
pub struct Chain<R> {
    resolvers: Vec<R>,
}

impl<R> Chain<R>
where
    R: Resolve,
{
    pub fn new(resolvers: Vec<R>) -> Self {
        Self { resolvers }
    }

    #[tracing::instrument(skip(self), fields(question = %question.name))]
    pub async fn resolve(&self, question: &Question) -> Option<Record> {
        for resolver in self.resolvers.iter() {
            if let Some(record) = resolver.resolve(question).await {
                tracing::debug!(resolver = resolver.name(), "resolved");
                return Some(record);
            }
            tracing::trace!(resolver = resolver.name(), "miss");
        }
        None
    }
}
