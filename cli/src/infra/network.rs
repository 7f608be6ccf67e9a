//! Network infrastructure — implements `NetworkProbe` with the system `ping`.

use anyhow::Result;

use crate::application::ports::{CommandRunner, NetworkProbe};
use crate::infra::command_runner::TokioCommandRunner;

/// Per-probe reply timeout in seconds passed to `ping -W`.
const PROBE_TIMEOUT_SECS: &str = "2";

/// Production reachability probe that shells out to `ping`.
pub struct PingProbe {
    runner: TokioCommandRunner,
}

impl PingProbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: TokioCommandRunner::default(),
        }
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkProbe for PingProbe {
    async fn ping(&self, addr: &str, count: u32) -> Result<bool> {
        let count = count.to_string();
        let out = self
            .runner
            .run("ping", &["-c", &count, "-W", PROBE_TIMEOUT_SECS, addr])
            .await?;
        // ping exits 0 when at least one probe was answered
        Ok(out.status.success())
    }
}
