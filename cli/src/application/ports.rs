//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Network Probe Port ────────────────────────────────────────────────────────

/// Abstracts ICMP reachability checks so services can be tested without real
/// network access.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    /// Send `count` echo probes to `addr`; `true` when at least one answered.
    async fn ping(&self, addr: &str, count: u32) -> Result<bool>;
}

// ── Token Source Port ─────────────────────────────────────────────────────────

/// Abstracts the remote read of the cluster join token.
#[allow(async_fn_in_trait)]
pub trait TokenSource {
    /// Read `remote_path` on the control plane at `addr` and return its
    /// content verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote shell session cannot be opened or the
    /// remote read exits non-zero; the error message carries the remote
    /// diagnostic.
    async fn fetch_token(&self, addr: &str, remote_path: &str) -> Result<String>;
}

// ── Service Manager Port ──────────────────────────────────────────────────────

/// Abstracts the host service supervisor for a single named unit.
#[allow(async_fn_in_trait)]
pub trait ServiceManager {
    /// Reload unit definitions after a unit file changed.
    async fn daemon_reload(&self) -> Result<()>;
    /// Stop the unit. Callers ignore failure — the unit may not be running.
    async fn stop(&self, unit: &str) -> Result<()>;
    /// Start the unit.
    async fn start(&self, unit: &str) -> Result<()>;
    /// Current activation state, e.g. `"active"`, `"failed"`, `"inactive"`.
    async fn active_state(&self, unit: &str) -> Result<String>;
    /// Most recent journal lines for the unit, oldest first.
    async fn recent_logs(&self, unit: &str, lines: u32) -> Result<Vec<String>>;
}

// ── Host Filesystem Port ──────────────────────────────────────────────────────

/// Abstracts the host filesystem so the repair flow can run against an
/// in-memory double in tests.
pub trait HostFiles {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;
    /// Read `path` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is absent or unreadable.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Write `content` to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    /// Write `content` to `path` with restrictive permissions (0600 file,
    /// 0700 parent directory on Unix).
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written or permissions set.
    fn write_secret(&self, path: &Path, content: &str) -> Result<()>;
    /// Copy `path` to a timestamped sibling and return the copy's location.
    ///
    /// # Errors
    ///
    /// Returns an error when the copy fails.
    fn backup(&self, path: &Path) -> Result<PathBuf>;
}

// ── Address Source Port ───────────────────────────────────────────────────────

/// Supplies the control-plane address — from a flag, the environment, or an
/// interactive prompt. Validation happens in the service, not here.
pub trait AddressSource {
    /// Produce the raw address string (possibly empty).
    ///
    /// # Errors
    ///
    /// Returns an error when the interactive prompt fails (e.g. no TTY).
    fn acquire(&self) -> Result<String>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Announce a numbered remediation stage.
    fn stage(&self, number: u8, total: u8, message: &str);
    /// Emit an in-progress step message; may be replaced by the next event.
    fn step(&self, message: &str);
    /// Emit a persistent informational message.
    fn info(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit one raw log line (journal excerpt).
    fn log_line(&self, line: &str);
}
