use std::env;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

pub const RUN_ID_ENV: &str = "AUTOLOCAL_RID";

fn sha256_hex(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Short id derived from a timestamp and pid.
pub fn make_run_id() -> String {
    let seed = format!(
        "{}-{}",
        Utc::now().format("%Y%m%dT%H%M%S%.9fZ"),
        std::process::id()
    );
    sha256_hex(&seed).chars().take(8).collect()
}

/// The run id inherited from the environment, or a fresh one.
pub fn run_id() -> String {
    env::var(RUN_ID_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(make_run_id)
}

/// Installs the stderr fmt subscriber once; later calls are no-ops.
pub fn init_logging(run_id: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    tracing::debug!("logging initialized run_id={run_id}");
}
