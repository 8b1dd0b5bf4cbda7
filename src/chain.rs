use std::sync::Arc;

use sinkdns_cache::TtlCache;
use sinkdns_proto::{Question, Record};
use sinkdns_resolver::{CacheFeeder, Resolve, StaticResolver};
use sinkdns_upstream::doh::DohUpstream;
use sinkdns_upstream::udp::UdpUpstream;
use sinkdns_upstream::UpstreamResolver;

/// The one external resolver configured for this run: either DoH or plain
/// UDP, never both — `external.type` in the configuration selects which.
#[derive(Debug)]
pub enum UpstreamKind {
    Doh(UpstreamResolver<DohUpstream>),
    Udp(UpstreamResolver<UdpUpstream>),
}

#[async_trait::async_trait]
impl Resolve for UpstreamKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Doh(inner) => inner.name(),
            Self::Udp(inner) => inner.name(),
        }
    }

    async fn resolve(&self, question: &Question) -> Option<Record> {
        match self {
            Self::Doh(inner) => inner.resolve(question).await,
            Self::Udp(inner) => inner.resolve(question).await,
        }
    }
}

/// Closed set of resolver variants making up the chain, in the fixed order
/// `Block -> Custom -> Cache -> CacheFeeder(Upstream)`. An enum rather than
/// a trait object per the preference for exhaustive matching over dynamic
/// dispatch.
#[derive(Debug)]
pub enum ResolverKind {
    Block(StaticResolver),
    Custom(StaticResolver),
    Cache(Arc<TtlCache>),
    Upstream(CacheFeeder<UpstreamKind, Arc<TtlCache>>),
}

#[async_trait::async_trait]
impl Resolve for ResolverKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Block(inner) => inner.name(),
            Self::Custom(inner) => inner.name(),
            Self::Cache(inner) => inner.name(),
            Self::Upstream(inner) => inner.name(),
        }
    }

    async fn resolve(&self, question: &Question) -> Option<Record> {
        match self {
            Self::Block(inner) => inner.resolve(question).await,
            Self::Custom(inner) => inner.resolve(question).await,
            Self::Cache(inner) => inner.resolve(question).await,
            Self::Upstream(inner) => inner.resolve(question).await,
        }
    }
}
