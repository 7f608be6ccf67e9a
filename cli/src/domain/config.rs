//! Remediation configuration — explicit replacement for the ambient state
//! (working directory, shell variables) a hand-run repair would rely on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::error::PreconditionError;

/// Name of the agent binary expected next to the nodemend executable.
pub const AGENT_BINARY_NAME: &str = "node-agent";

/// systemd unit the agent runs under.
pub const DEFAULT_SERVICE_NAME: &str = "node-agent.service";

const DEFAULT_UNIT_PATH: &str = "/etc/systemd/system/node-agent.service";
const DEFAULT_TOKEN_PATH: &str = "/var/lib/node-agent/token";
const DEFAULT_REMOTE_TOKEN_PATH: &str = "/var/lib/node-agent/server/node-token";

/// Fully resolved configuration for one remediation run.
///
/// Flags override config-file values, which override the defaults above.
#[derive(Debug, Clone)]
pub struct RemediationConfig {
    /// Agent binary the service definition must launch.
    pub expected_binary: PathBuf,
    /// systemd unit file for the agent.
    pub unit_path: PathBuf,
    /// Local join-token file.
    pub token_path: PathBuf,
    /// Token file on the control plane, read over ssh when the local one is missing.
    pub remote_token_path: String,
    /// Unit name passed to the service manager.
    pub service_name: String,
    /// ICMP echo probes sent during the reachability check.
    pub ping_count: u32,
    /// Pause after stopping the unit, before starting it again.
    pub stop_settle: Duration,
    /// Pause after starting the unit, before querying its state.
    pub start_settle: Duration,
    /// Journal lines dumped when the unit fails to come up.
    pub log_tail_lines: u32,
}

impl RemediationConfig {
    /// Resolve a config from an overlay, deriving the default binary path
    /// from the directory holding the running executable.
    #[must_use]
    pub fn resolve(overlay: ConfigOverlay, exe_dir: &Path) -> Self {
        Self {
            expected_binary: overlay
                .binary_path
                .unwrap_or_else(|| exe_dir.join(AGENT_BINARY_NAME)),
            unit_path: overlay
                .unit_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UNIT_PATH)),
            token_path: overlay
                .token_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH)),
            remote_token_path: overlay
                .remote_token_path
                .unwrap_or_else(|| DEFAULT_REMOTE_TOKEN_PATH.to_string()),
            service_name: overlay
                .service_name
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            ping_count: overlay.ping_count.unwrap_or(2),
            stop_settle: Duration::from_secs(2),
            start_settle: Duration::from_secs(5),
            log_tail_lines: overlay.log_tail_lines.unwrap_or(20),
        }
    }
}

/// Optional overrides read from the YAML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverlay {
    /// Overrides the agent binary location.
    pub binary_path: Option<PathBuf>,
    /// Overrides the unit file location.
    pub unit_path: Option<PathBuf>,
    /// Overrides the local token file location.
    pub token_path: Option<PathBuf>,
    /// Overrides the token path read on the control plane.
    pub remote_token_path: Option<String>,
    /// Overrides the unit name.
    pub service_name: Option<String>,
    /// Overrides the probe count.
    pub ping_count: Option<u32>,
    /// Overrides the failure log-tail length.
    pub log_tail_lines: Option<u32>,
}

/// Validate and normalize a control-plane address.
///
/// # Errors
///
/// Returns [`PreconditionError::EmptyServerAddress`] when the address is
/// empty after trimming.
pub fn validate_server_addr(addr: &str) -> Result<String, PreconditionError> {
    let trimmed = addr.trim();
    if trimmed.is_empty() {
        return Err(PreconditionError::EmptyServerAddress);
    }
    Ok(trimmed.to_string())
}

// ── Unit tests ────────────────────────────────────────────────────────────────
