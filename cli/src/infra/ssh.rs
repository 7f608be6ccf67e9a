//! SSH infrastructure — implements `TokenSource` over the system `ssh`.
//!
//! The fetch opens an interactive session as root on the control plane with
//! public-key authentication disabled, so ssh falls back to prompting for the
//! root password on the controlling tty. New host keys are accepted and
//! pinned (`accept-new`); a changed key still aborts.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, TokenSource};
use crate::infra::command_runner::TokioCommandRunner;

/// Generous timeout covering the interactive password prompt.
const SSH_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Production token source that reads the remote token file over ssh.
pub struct SshTokenSource {
    runner: TokioCommandRunner,
}

impl SshTokenSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: TokioCommandRunner::default(),
        }
    }
}

impl Default for SshTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for SshTokenSource {
    async fn fetch_token(&self, addr: &str, remote_path: &str) -> Result<String> {
        let target = format!("root@{addr}");
        let out = self
            .runner
            .run_with_timeout(
                "ssh",
                &[
                    "-o",
                    "StrictHostKeyChecking=accept-new",
                    "-o",
                    "PubkeyAuthentication=no",
                    "-o",
                    "PreferredAuthentications=password,keyboard-interactive",
                    "-o",
                    "ConnectTimeout=10",
                    &target,
                    "cat",
                    remote_path,
                ],
                SSH_FETCH_TIMEOUT,
            )
            .await?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let detail = match stderr.trim() {
                "" => format!("ssh exited with {}", out.status),
                s => s.to_string(),
            };
            anyhow::bail!("{detail}");
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}
