mod blocklist;
mod chain;
mod config;
mod error;
mod handler;
mod logging;
mod signal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use chain::{ResolverKind, UpstreamKind};
use config::{ExternalKind, Loaded};
use error::Fatal;
use handler::DnsHandler;
use sinkdns_resolver::{CacheFeeder, Chain, StaticResolver};
use sinkdns_upstream::doh::DohUpstream;
use sinkdns_upstream::udp::UdpUpstream;
use sinkdns_upstream::UpstreamResolver;

/// `W` in spec terms: number of reader/worker sockets the endpoint opens.
const WORKER_COUNT: usize = 10;
const UPSTREAM_POOL_SIZE: usize = 4;

/// Recursive, ad-blocking DNS proxy.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the JSON configuration file. Written with documented
    /// defaults and the process exits if it doesn't exist yet.
    #[arg(long, env = "SINKDNS_CONF", default_value = "./conf")]
    conf: PathBuf,
}

fn custom_resolver(pins: &[config::CustomPin]) -> StaticResolver {
    const CUSTOM_TTL: u32 = 200;
    let mut resolver = StaticResolver::new("custom", CUSTOM_TTL);
    for pin in pins {
        match pin.address {
            std::net::IpAddr::V4(addr) => resolver.insert_v4(pin.name.clone(), addr),
            std::net::IpAddr::V6(addr) => resolver.insert_v6(pin.name.clone(), addr),
        }
    }
    resolver
}

async fn run(config: config::Config, shutdown: tokio::sync::watch::Receiver<bool>) -> Result<(), Fatal> {
    let block = blocklist::build(&config.blocking_list).await;
    let custom = custom_resolver(&config.custom);
    let cache = Arc::new(sinkdns_cache::TtlCache::new(sinkdns_cache::Config {
        capacity_bytes: config.cache.size.max(0) as usize,
        base_ttl: config.cache.basettl,
        ..Default::default()
    }));

    let mut resolvers = vec![ResolverKind::Block(block), ResolverKind::Custom(custom)];
    resolvers.push(ResolverKind::Cache(cache.clone()));

    if config.allow_external {
        let upstream = match config.external.kind {
            ExternalKind::Doh => UpstreamKind::Doh(UpstreamResolver::new(
                "doh",
                DohUpstream::new(config.external.endpoint.clone()),
            )),
            ExternalKind::Udp => {
                let server = config.external.endpoint.parse().map_err(|_| {
                    Fatal::InvalidUpstreamAddress(config.external.endpoint.clone())
                })?;
                let client = UdpUpstream::new(server, UPSTREAM_POOL_SIZE).await?;
                UpstreamKind::Udp(UpstreamResolver::new("udp", client))
            }
        };
        resolvers.push(ResolverKind::Upstream(CacheFeeder::new(upstream, cache.clone())));
    }

    let chain = Chain::new(resolvers);
    let handler = DnsHandler::new(chain);

    let gc_handle = cache.spawn_gc(shutdown.clone());

    if config.endpoint.enabled {
        let endpoint = sinkdns_server::Endpoint::new(config.endpoint.address, WORKER_COUNT, handler);
        tracing::info!(address = %config.endpoint.address, "listening");
        endpoint.run(shutdown).await?;
    } else {
        let _ = shutdown.clone().changed().await;
    }

    let _ = gc_handle.await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    let config = match config::Config::load_or_init(&args.conf) {
        Ok(Loaded::Existing(config)) => config,
        Ok(Loaded::DefaultsWritten) => {
            tracing::info!(path = %args.conf.display(), "wrote default configuration, edit it and restart");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            tracing::error!(%error, "unable to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = signal::watch_for_shutdown();

    match run(config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "fatal error");
            ExitCode::FAILURE
        }
    }
}
