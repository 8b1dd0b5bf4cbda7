/// Top-level startup failure. Anything that reaches `main` as an `Err`
/// causes a non-zero exit; everything else (graceful shutdown) exits 0.
#[derive(Debug, thiserror::Error)]
pub enum Fatal {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::LoadError),
    #[error("unable to bind a udp socket: {0}")]
    Io(#[from] std::io::Error),
    #[error("external.endpoint {0:?} is not a valid host:port for a UDP upstream")]
    InvalidUpstreamAddress(String),
}
