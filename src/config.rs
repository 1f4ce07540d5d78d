use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Canonical application identity (used by help/version surfaces).
pub const APP_NAME: &str = "autolocal";
pub const APP_DESC: &str = "Structured WP-CLI adapter for local site provisioning";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Canonical runtime defaults.
pub const DEFAULT_WP_CLI_PATH: &str = "/usr/bin/wp";
pub const DEFAULT_SITE_ROOT: &str = "/srv/http";
pub const DEFAULT_SITE_OWNER: &str = "http";
pub const DEFAULT_WP_TIMEOUT_SECS: u64 = 600;

/// Adapter configuration snapshot.
///
/// Built once by the caller and handed to [`crate::wp::WpCli`]; the adapter
/// never re-reads the environment mid-call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub wp_cli_path: PathBuf,
    pub site_root: PathBuf,
    pub site_owner: String,
    pub timeout_secs: u64,
    pub elevation: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            wp_cli_path: PathBuf::from(DEFAULT_WP_CLI_PATH),
            site_root: PathBuf::from(DEFAULT_SITE_ROOT),
            site_owner: DEFAULT_SITE_OWNER.to_string(),
            timeout_secs: DEFAULT_WP_TIMEOUT_SECS,
            elevation: true,
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .map(|v| v == 1)
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        Self {
            wp_cli_path: PathBuf::from(env_string("WP_CLI_PATH", DEFAULT_WP_CLI_PATH)),
            site_root: PathBuf::from(env_string("AUTOLOCAL_SITE_ROOT", DEFAULT_SITE_ROOT)),
            site_owner: env_string("AUTOLOCAL_SITE_OWNER", DEFAULT_SITE_OWNER),
            timeout_secs: env_u64("WP_TIMEOUT", DEFAULT_WP_TIMEOUT_SECS).max(1),
            elevation: env_bool("AUTOLOCAL_ELEVATION", true),
        }
    }

    pub fn site_path(&self, domain: &str) -> PathBuf {
        self.site_root.join(domain)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
