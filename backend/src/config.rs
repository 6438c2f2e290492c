use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GROUP: &str = "uk";

/// Server settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub content_dir: PathBuf,
    /// Shared secret for admin endpoints. `None` locks every mutation.
    pub api_token: Option<String>,
    pub bind_addr: SocketAddr,
    /// Group used when no group lists a requested country.
    pub default_group: String,
    pub cache_ttl: Duration,
    /// Upper bound on memoized public responses.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            api_token: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            default_group: DEFAULT_GROUP.to_string(),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            content_dir: env::var("CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.content_dir),
            api_token: env::var("API_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            bind_addr: env::var("BIND_ADDR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bind_addr),
            default_group: env::var("DEFAULT_GROUP").unwrap_or(defaults.default_group),
            cache_ttl: Duration::from_secs(env_u64("CACHE_TTL_SECS", defaults.cache_ttl.as_secs())),
            cache_capacity: env_u64("CACHE_MAX_ENTRIES", defaults.cache_capacity as u64) as usize,
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
