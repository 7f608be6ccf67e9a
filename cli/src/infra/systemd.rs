//! systemd infrastructure — implements `ServiceManager` over `systemctl`
//! and `journalctl`.

use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ServiceManager};
use crate::infra::command_runner::TokioCommandRunner;

/// Production service manager shelling out to the systemd CLI tools.
pub struct SystemctlManager {
    runner: TokioCommandRunner,
}

impl SystemctlManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: TokioCommandRunner::default(),
        }
    }

    async fn systemctl(&self, args: &[&str]) -> Result<Output> {
        self.runner.run("systemctl", args).await
    }
}

impl Default for SystemctlManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager for SystemctlManager {
    async fn daemon_reload(&self) -> Result<()> {
        let out = self.systemctl(&["daemon-reload"]).await?;
        ensure_success("systemctl daemon-reload", &out)
    }

    async fn stop(&self, unit: &str) -> Result<()> {
        let out = self.systemctl(&["stop", unit]).await?;
        ensure_success("systemctl stop", &out)
    }

    async fn start(&self, unit: &str) -> Result<()> {
        let out = self.systemctl(&["start", unit]).await?;
        ensure_success("systemctl start", &out)
    }

    async fn active_state(&self, unit: &str) -> Result<String> {
        // is-active exits non-zero for every state but "active"; the state
        // name on stdout is the answer either way.
        let out = self.systemctl(&["is-active", unit]).await?;
        let state = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if state.is_empty() {
            Ok("unknown".to_string())
        } else {
            Ok(state)
        }
    }

    async fn recent_logs(&self, unit: &str, lines: u32) -> Result<Vec<String>> {
        let lines = lines.to_string();
        let out = self
            .runner
            .run("journalctl", &["-u", unit, "-n", &lines, "--no-pager"])
            .await
            .context("reading journal")?;
        Ok(String::from_utf8_lossy(&out.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

fn ensure_success(what: &str, out: &Output) -> Result<()> {
    if out.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&out.stderr);
    match stderr.trim() {
        "" => anyhow::bail!("{what} exited with {}", out.status),
        s => anyhow::bail!("{what}: {s}"),
    }
}
