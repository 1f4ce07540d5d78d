#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use autolocal::{AdapterConfig, MemoryRunLog, WpCli};
use tempfile::TempDir;

pub const DOMAIN: &str = "demo.local";

/// Scratch site root plus a mock `wp` executable that records its argv.
pub struct TempSite {
    dir: TempDir,
    pub site_root: PathBuf,
    pub wp_bin: PathBuf,
    pub args_file: PathBuf,
}

impl TempSite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let site_root = dir.path().join("srv");
        fs::create_dir_all(site_root.join(DOMAIN)).expect("create site dir");
        let bin_dir = dir.path().join("bin");
        fs::create_dir_all(&bin_dir).expect("create bin dir");
        let wp_bin = bin_dir.join("wp");
        let args_file = dir.path().join("args.txt");
        Self {
            dir,
            site_root,
            wp_bin,
            args_file,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Installs a mock `wp`; `body` is plain sh run after argv is recorded.
    pub fn write_wp(&self, body: &str) {
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{body}\n",
            self.args_file.display()
        );
        fs::write(&self.wp_bin, script).expect("write mock wp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.wp_bin)
                .expect("mock metadata")
                .permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&self.wp_bin, perms).expect("set mock executable");
        }
    }

    pub fn config(&self, timeout_secs: u64) -> AdapterConfig {
        AdapterConfig {
            wp_cli_path: self.wp_bin.clone(),
            site_root: self.site_root.clone(),
            site_owner: "autolocal-test-nobody".to_string(),
            timeout_secs,
            elevation: false,
        }
    }

    pub fn cli(&self) -> (WpCli, Arc<MemoryRunLog>) {
        self.cli_with_timeout(Duration::from_secs(10))
    }

    pub fn cli_with_timeout(&self, timeout: Duration) -> (WpCli, Arc<MemoryRunLog>) {
        let log = Arc::new(MemoryRunLog::new());
        let cli = WpCli::new(self.config(10))
            .with_timeout(timeout)
            .with_log(log.clone());
        (cli, log)
    }

    /// argv the mock received on its last run, if it ran at all.
    pub fn recorded_args(&self) -> Option<Vec<String>> {
        fs::read_to_string(&self.args_file)
            .ok()
            .map(|s| s.lines().map(str::to_string).collect())
    }

    pub fn run_bin(&self, args: &[&str]) -> Output {
        self.run_bin_with_env(args, &[])
    }

    pub fn run_bin_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autolocal"));
        cmd.args(args)
            .current_dir(self.root())
            .env("WP_CLI_PATH", &self.wp_bin)
            .env("AUTOLOCAL_SITE_ROOT", &self.site_root)
            .env("AUTOLOCAL_ELEVATION", "0")
            .env("WP_TIMEOUT", "10")
            .env_remove("RUST_LOG");
        for (k, v) in envs {
            cmd.env(k, v);
        }
        cmd.output().expect("run autolocal")
    }
}

pub fn stdout_str(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

pub fn stderr_str(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}
