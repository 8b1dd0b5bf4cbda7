use sinkdns_proto::{Question, Record};

/// A single link in the resolver chain. `resolve` answers with `None`
/// rather than an error when this resolver simply doesn't have an answer —
/// a miss here is the ordinary case that lets the chain fall through to the
/// next resolver, not a failure.
#[async_trait::async_trait]
pub trait Resolve: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, question: &Question) -> Option<Record>;
}
