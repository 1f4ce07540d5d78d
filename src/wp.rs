//! Public call shapes over the WP-CLI binary.
//!
//! Every entry point spawns at most one process, blocks until it exits or
//! times out, and never returns an error: failures are logged through the
//! injected [`RunLog`] and folded into the returned success flag.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::command::{CommandSpec, normalize, sanitize_for_log};
use crate::config::AdapterConfig;
use crate::decode::decode_payload;
use crate::error::{AdapterError, AdapterResult};
use crate::flags::{QUIET_FLAG, inject_read_flags, is_readish, push_flag_once};
use crate::identity::{SiteOwner, effective_uid, elevation_prefix};
use crate::noise::filter_noise;
use crate::process::{ExecutionOutcome, Invocation, run_with_timeout};
use crate::runlog::{RunLog, TracingRunLog};

pub const UPDATE_CHECK_ENV: &str = "WP_CLI_DISABLE_AUTO_CHECK_UPDATE";

/// Raw result of [`WpCli::capture`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captured {
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
}

struct Prepared {
    parts: Vec<String>,
    readish: bool,
    display: String,
}

pub struct WpCli {
    config: AdapterConfig,
    owner: SiteOwner,
    caller_euid: u32,
    log: Arc<dyn RunLog>,
}

impl WpCli {
    pub fn new(config: AdapterConfig) -> Self {
        let owner = if config.elevation {
            SiteOwner::lookup(&config.site_owner)
        } else {
            SiteOwner::new(config.site_owner.clone(), None)
        };
        Self {
            config,
            owner,
            caller_euid: effective_uid(),
            log: Arc::new(TracingRunLog),
        }
    }

    pub fn from_env() -> Self {
        Self::new(AdapterConfig::from_env())
    }

    pub fn with_log(mut self, log: Arc<dyn RunLog>) -> Self {
        self.log = log;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Overrides the resolved owner/caller pair instead of asking the OS.
    pub fn with_identity(mut self, owner: SiteOwner, caller_euid: u32) -> Self {
        self.owner = owner;
        self.caller_euid = caller_euid;
        self
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn site_path(&self, domain: &str) -> PathBuf {
        self.config.site_path(domain)
    }

    /// Runs the command and reports only whether it succeeded.
    pub fn run(&self, domain: &str, command: impl Into<CommandSpec>) -> bool {
        let Some(site) = self.domain_path(domain) else {
            return false;
        };
        self.execute(&site, &command.into(), false)
            .is_ok_and(|(_, outcome)| outcome.success)
    }

    /// Runs the command and returns stdout/stderr exactly as produced.
    pub fn capture(&self, domain: &str, command: impl Into<CommandSpec>) -> Captured {
        let Some(site) = self.domain_path(domain) else {
            return Captured {
                stderr: "invalid domain".to_string(),
                ..Captured::default()
            };
        };
        match self.execute(&site, &command.into(), false) {
            Ok((_, outcome)) => Captured {
                ok: outcome.success,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
            },
            Err(e) => Captured {
                stderr: e.to_string(),
                ..Captured::default()
            },
        }
    }

    /// Runs the command against `<site_root>/<domain>` and decodes a payload.
    pub fn json(&self, domain: &str, command: impl Into<CommandSpec>) -> (bool, Value) {
        match self.domain_path(domain) {
            Some(site) => self.typed(&site, &command.into()),
            None => (false, Value::Null),
        }
    }

    /// Same as [`WpCli::json`] against an explicit install path.
    pub fn json_at_path(&self, path: &Path, command: impl Into<CommandSpec>) -> (bool, Value) {
        self.typed(path, &command.into())
    }

    fn domain_path(&self, domain: &str) -> Option<PathBuf> {
        let domain = domain.trim();
        if domain.is_empty() {
            self.log.log_fail("wp called with empty domain");
            return None;
        }
        Some(self.config.site_path(domain))
    }

    fn prepare(&self, spec: &CommandSpec, structured: bool) -> AdapterResult<Prepared> {
        let mut parts = normalize(spec, &self.config.wp_cli_path)?;
        let readish = if structured {
            inject_read_flags(&mut parts)
        } else {
            is_readish(&parts)
        };
        push_flag_once(&mut parts, QUIET_FLAG);
        let display = sanitize_for_log(&parts);
        Ok(Prepared {
            parts,
            readish,
            display,
        })
    }

    fn invocation(&self, site: &Path, parts: &[String]) -> Invocation {
        let mut argv = elevation_prefix(&self.owner, self.caller_euid).unwrap_or_default();
        argv.push(self.config.wp_cli_path.to_string_lossy().into_owned());
        argv.push(format!("--path={}", site.display()));
        argv.extend(parts.iter().cloned());
        Invocation {
            argv,
            envs: vec![(UPDATE_CHECK_ENV.to_string(), "1".to_string())],
            timeout: self.config.timeout(),
            label: "wp".to_string(),
        }
    }

    fn execute(
        &self,
        site: &Path,
        spec: &CommandSpec,
        structured: bool,
    ) -> AdapterResult<(Prepared, ExecutionOutcome)> {
        let prepared = self.prepare(spec, structured).inspect_err(|e| {
            self.log.log_fail(&format!("wp {e}"));
        })?;
        let outcome = run_with_timeout(&self.invocation(site, &prepared.parts)).inspect_err(|e| {
            self.log.log_fail(&format!("wp {} {e}", prepared.display));
        })?;
        self.log_outcome(&prepared, &outcome);
        Ok((prepared, outcome))
    }

    fn log_outcome(&self, prepared: &Prepared, outcome: &ExecutionOutcome) {
        let secs = outcome.duration.as_secs_f64();
        let err = match outcome.failure() {
            None => {
                self.log
                    .log_pass(&format!("PASS: wp {} ({secs:.1}s)", prepared.display));
                return;
            }
            Some(err) => err,
        };
        if let AdapterError::Timeout { .. } = err {
            self.log.log_fail(&format!(
                "wp {} timeout after {secs:.1}s exit={}",
                prepared.display,
                err.exit_code().unwrap_or(outcome.exit_code)
            ));
            return;
        }
        let mut msg = format!("wp {} {err} ({secs:.1}s)", prepared.display);
        let filtered = filter_noise(&outcome.stderr);
        let detail = if filtered.is_empty() {
            outcome.stderr.trim()
        } else {
            filtered.as_str()
        };
        if !detail.is_empty() {
            msg.push_str("\nSTDERR: ");
            msg.push_str(detail);
        }
        self.log.log_fail(&msg);
    }

    fn typed(&self, site: &Path, spec: &CommandSpec) -> (bool, Value) {
        let (prepared, outcome) = match self.execute(site, spec, true) {
            Ok(v) => v,
            Err(AdapterError::InvalidCommand(_)) => return (false, Value::Null),
            Err(_) => {
                let readish = normalize(spec, &self.config.wp_cli_path)
                    .is_ok_and(|parts| is_readish(&parts));
                return (false, empty_payload(readish));
            }
        };
        if !outcome.success {
            return (false, empty_payload(prepared.readish));
        }
        let filtered = filter_noise(&outcome.combined());
        match decode_payload(&filtered) {
            Some(v) if !(prepared.readish && v.is_null()) => (true, v),
            _ => {
                if prepared.readish {
                    let err = AdapterError::parse("read-ish call produced no JSON, scalar or tokens");
                    self.log
                        .log_warn(&format!("wp {} {err}; returning []", prepared.display));
                }
                (true, empty_payload(prepared.readish))
            }
        }
    }
}

fn empty_payload(readish: bool) -> Value {
    if readish {
        Value::Array(Vec::new())
    } else {
        Value::Null
    }
}
