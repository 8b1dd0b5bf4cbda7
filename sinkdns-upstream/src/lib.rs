pub mod doh;
pub mod udp;

use sinkdns_proto::{Question, Record};

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out waiting for upstream response")]
    Timeout,
    #[error("response id did not match the request id")]
    IdMismatch,
    #[error("upstream returned a response that doesn't parse as a DNS packet: {0}")]
    Malformed(#[from] sinkdns_proto::ParseError),
    #[error("upstream returned no usable answer")]
    EmptyAnswer,
    #[error("upstream returned an answer of the wrong type")]
    UnsupportedAnswerType,
    #[error("DoH request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("DoH response reported status {0}")]
    DohStatus(i32),
    #[error("CNAME chain exceeded {0} hops")]
    TooManyRedirects(u8),
}

/// An upstream resolver able to answer a single question authoritatively
/// (no fallthrough semantics — failures are real errors, unlike the
/// `Option`-returning chain resolvers).
#[async_trait::async_trait]
pub trait Upstream: std::fmt::Debug + Send + Sync {
    async fn resolve(&self, question: &Question) -> Result<Record, UpstreamError>;
}

/// Adapts an [`Upstream`] client into a chain [`sinkdns_resolver::Resolve`],
/// turning errors into a miss (logged, not propagated) so one flaky upstream
/// answer doesn't take down the whole chain.
#[derive(Debug)]
pub struct UpstreamResolver<U> {
    name: &'static str,
    client: U,
}

impl<U> UpstreamResolver<U> {
    pub fn new(name: &'static str, client: U) -> Self {
        Self { name, client }
    }
}

#[async_trait::async_trait]
impl<U> sinkdns_resolver::Resolve for UpstreamResolver<U>
where
    U: Upstream,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve(&self, question: &Question) -> Option<Record> {
        match self.client.resolve(question).await {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!(resolver = self.name, error = %err, "upstream miss");
                None
            }
        }
    }
}
