use sha2::{Digest, Sha256};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BlocklistKind {
    EtcHosts,
}

impl BlocklistKind {
    fn parse(self, input: &str) -> HashSet<String> {
        match self {
            Self::EtcHosts => parse_hostfile(input),
        }
    }
}

const SINKHOLE_PREFIX: &str = "0.0.0.0";
const COMMENT_START: char = '#';

/// Parses a hosts-file formatted blocklist, matching the source's
/// `blockParser`: only lines sinkholed to `0.0.0.0` count, everything from
/// `#` onward is a comment, and the domain is the token right after the
/// address. Unlike a generic hosts-file reader, this deliberately ignores
/// every other address (`127.0.0.1`, IPv6 loopback, real IPs) — those
/// aren't blocklist entries in this format.
fn parse_hostfile(input: &str) -> HashSet<String> {
    input
        .lines()
        .filter_map(|line| {
            let line = match line.find(COMMENT_START) {
                Some(idx) => &line[..idx],
                None => line,
            };
            if !line.starts_with(SINKHOLE_PREFIX) {
                return None;
            }
            let mut parts = line.trim_end().split(' ');
            parts.next()?; // the sinkhole address itself
            let domain = parts.next()?;
            if domain.is_empty() {
                None
            } else {
                Some(domain.to_string())
            }
        })
        .collect()
}

fn hash(input: &str) -> String {
    let result = Sha256::new().chain_update(input).finalize();
    base16ct::lower::encode_string(&result)
}

#[derive(Debug)]
pub struct Blocklist {
    pub hash: String,
    pub entries: HashSet<String>,
}

impl Blocklist {
    pub fn from_file(value: &str, kind: BlocklistKind) -> Self {
        let hash = hash(value);
        let entries = kind.parse(value);

        Self { hash, entries }
    }
}

#[derive(Debug, Default)]
pub struct BlocklistLoader;

impl BlocklistLoader {
    pub async fn load(&self, url: &str, kind: BlocklistKind) -> Result<Blocklist, reqwest::Error> {
        tracing::debug!("loading {url:?}");
        let req = reqwest::get(url).await?;
        let text = req.text().await?;
        Ok(Blocklist::from_file(&text, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::{hash, parse_hostfile, Blocklist, BlocklistKind};

    const SAMPLE: &str = "\
# ad servers
0.0.0.0 ads.example.com
0.0.0.0 tracker.example.com # inline comment
127.0.0.1 localhost
not-an-address ads.ignored.com
0.0.0.0
";

    #[test]
    fn only_sinkholed_lines_are_entries() {
        let result = parse_hostfile(SAMPLE);
        assert!(result.contains("ads.example.com"));
        assert!(result.contains("tracker.example.com"));
        assert!(!result.contains("localhost"));
        assert!(!result.contains("ads.ignored.com"));
        assert!(!result.contains("0.0.0.0"));
    }

    #[test]
    fn strips_comments_before_matching() {
        let result = parse_hostfile("0.0.0.0 blocked.example.com # because reasons\n");
        assert_eq!(result.len(), 1);
        assert!(result.contains("blocked.example.com"));
    }

    #[test]
    fn hash_is_stable_sha256_hex() {
        assert_eq!(hash(""), hash(""));
        assert_ne!(hash("a"), hash("b"));
    }

    #[test]
    fn from_file_carries_both_hash_and_entries() {
        let result = Blocklist::from_file(SAMPLE, BlocklistKind::EtcHosts);
        assert_eq!(result.hash, hash(SAMPLE));
        assert_eq!(result.entries.len(), 2);
    }
}
