use std::net::{IpAddr, SocketAddr};
use std::path::Path;

/// Top-level configuration, mirroring the JSON shape the server reads on
/// startup. Field names match the wire format exactly (no renames) so the
/// file a user edits is the same shape this struct prints when it writes
/// its own defaults.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_allow_external")]
    pub allow_external: bool,
    #[serde(default = "Config::default_blocking_list")]
    pub blocking_list: Vec<String>,
    #[serde(default)]
    pub custom: Vec<CustomPin>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub external: ExternalConfig,
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CustomPin {
    pub name: String,
    pub address: IpAddr,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_size")]
    pub size: i64,
    #[serde(default = "CacheConfig::default_basettl")]
    pub basettl: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: Self::default_size(),
            basettl: Self::default_basettl(),
        }
    }
}

impl CacheConfig {
    fn default_size() -> i64 {
        1_000_000
    }

    fn default_basettl() -> u32 {
        600
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExternalKind {
    Doh,
    Udp,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExternalConfig {
    #[serde(rename = "type", default = "ExternalConfig::default_kind")]
    pub kind: ExternalKind,
    #[serde(default = "ExternalConfig::default_endpoint")]
    pub endpoint: String,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            kind: Self::default_kind(),
            endpoint: Self::default_endpoint(),
        }
    }
}

impl ExternalConfig {
    fn default_kind() -> ExternalKind {
        ExternalKind::Doh
    }

    fn default_endpoint() -> String {
        "https://cloudflare-dns.com/dns-query".to_string()
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "EndpointConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "EndpointConfig::default_address")]
    pub address: SocketAddr,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            address: Self::default_address(),
        }
    }
}

impl EndpointConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_address() -> SocketAddr {
        "127.0.0.1:53".parse().unwrap()
    }
}

impl Config {
    fn default_allow_external() -> bool {
        true
    }

    fn default_blocking_list() -> Vec<String> {
        vec!["https://raw.githubusercontent.com/StevenBlack/hosts/master/hosts".to_string()]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_external: Self::default_allow_external(),
            blocking_list: Self::default_blocking_list(),
            custom: vec![
                CustomPin {
                    name: "cloudflare-dns.com".to_string(),
                    address: "104.16.249.249".parse().unwrap(),
                },
                CustomPin {
                    name: "cloudflare-dns.com".to_string(),
                    address: "2606:4700::6810:f8f".parse().unwrap(),
                },
            ],
            cache: CacheConfig::default(),
            external: ExternalConfig::default(),
            endpoint: EndpointConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to write default configuration to {path}: {source}")]
    WriteDefaults {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration format invalid: {0}")]
    Parse(#[from] ::config::ConfigError),
}

/// Outcome of [`Config::load_or_init`]: either a config was read from disk,
/// or none existed and defaults were just written in its place.
pub enum Loaded {
    Existing(Config),
    DefaultsWritten,
}

impl Config {
    /// Loads `path` as JSON, layered under environment variable overrides
    /// (`ALLOW_EXTERNAL`, `CACHE_BASETTL`, ...). If `path` doesn't exist,
    /// writes the documented defaults there instead and reports that the
    /// caller should exit rather than start serving.
    pub fn load_or_init(path: &Path) -> Result<Loaded, LoadError> {
        if !path.exists() {
            let defaults = Config::default();
            let json = serde_json::to_string_pretty(&defaults)
                .expect("default configuration always serializes");
            std::fs::write(path, json).map_err(|source| LoadError::WriteDefaults {
                path: path.display().to_string(),
                source,
            })?;
            return Ok(Loaded::DefaultsWritten);
        }

        let conf = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Json))
            .add_source(::config::Environment::default().separator("_"))
            .build()?;
        Ok(Loaded::Existing(conf.try_deserialize()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = Config::default();
        assert!(config.allow_external);
        assert_eq!(config.blocking_list.len(), 1);
        assert_eq!(config.custom.len(), 2);
        assert_eq!(config.cache.size, 1_000_000);
        assert_eq!(config.cache.basettl, 600);
        assert_eq!(config.external.kind, ExternalKind::Doh);
        assert_eq!(config.endpoint.address.port(), 53);
    }

    #[test]
    fn missing_file_writes_defaults_and_reports_so() {
        let dir = std::env::temp_dir().join(format!("sinkdns-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("conf-missing.json");
        let _ = std::fs::remove_file(&path);

        let outcome = Config::load_or_init(&path).unwrap();
        assert!(matches!(outcome, Loaded::DefaultsWritten));
        assert!(path.exists());

        let outcome = Config::load_or_init(&path).unwrap();
        assert!(matches!(outcome, Loaded::Existing(_)));

        std::fs::remove_file(&path).unwrap();
    }
}
