use std::net::{Ipv4Addr, Ipv6Addr};

use sinkdns_blocklist_loader::{BlocklistKind, BlocklistLoader};
use sinkdns_resolver::StaticResolver;

const BLOCK_TTL: u32 = 600;
const V4_SINKHOLE: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);
const V6_SINKHOLE: Ipv6Addr = Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1);

/// Fetches every configured blocklist URL and merges their entries into one
/// [`StaticResolver`] sinkholing each blocked name to `0.0.0.0` / `::1`.
/// A blocklist that fails to load is logged and skipped rather than
/// aborting startup — a stale or unreachable list shouldn't take the whole
/// server down.
pub async fn build(urls: &[String]) -> StaticResolver {
    let loader = BlocklistLoader::default();
    let mut resolver = StaticResolver::new("block", BLOCK_TTL);

    for url in urls {
        match loader.load(url, BlocklistKind::EtcHosts).await {
            Ok(blocklist) => {
                tracing::info!(
                    url,
                    entries = blocklist.entries.len(),
                    hash = %blocklist.hash,
                    "loaded blocklist"
                );
                for domain in blocklist.entries {
                    resolver.insert_v4(domain.clone(), V4_SINKHOLE);
                    resolver.insert_v6(domain, V6_SINKHOLE);
                }
            }
            Err(error) => tracing::warn!(url, %error, "unable to load blocklist"),
        }
    }

    resolver
}
