//! Node health snapshot and pure diagnostic functions.
//!
//! Backs the read-only `check` command. This module is intentionally free of
//! I/O and async; all functions take data in and return data out.

use serde::Serialize;

/// Read-only health snapshot of the node agent setup.
#[derive(Debug, Serialize)]
#[allow(clippy::struct_excessive_bools)] // each field is an independent probe result
pub struct NodeChecks {
    /// Whether the tool is running with root privileges.
    pub privileged: bool,
    /// Whether the agent binary exists at its expected path.
    pub binary_present: bool,
    /// Whether the unit file exists.
    pub unit_present: bool,
    /// Whether the unit's ExecStart launch path matches the expected binary.
    /// Always `false` when the unit file is absent.
    pub unit_exec_matches: bool,
    /// Whether the join-token file exists with non-empty content.
    pub token_present: bool,
    /// Whether the agent service reports active.
    pub service_active: bool,
    /// Reachability of the control plane; `None` when no address was supplied.
    pub reachable: Option<bool>,
}

/// Collect actionable issues from a health snapshot.
///
/// Returns a human-readable issue string for every failing check. A missing
/// unit file reports only the absence, not the ExecStart mismatch it implies.
#[must_use]
pub fn collect_issues(checks: &NodeChecks) -> Vec<String> {
    let mut issues = Vec::new();
    if !checks.privileged {
        issues.push("not running as root (repair will refuse to start)".to_string());
    }
    if !checks.binary_present {
        issues.push("agent binary missing".to_string());
    }
    if checks.unit_present {
        if !checks.unit_exec_matches {
            issues.push("service definition does not launch the expected binary".to_string());
        }
    } else {
        issues.push("service definition missing".to_string());
    }
    if !checks.token_present {
        issues.push("join token missing or empty".to_string());
    }
    if !checks.service_active {
        issues.push("agent service is not active".to_string());
    }
    if checks.reachable == Some(false) {
        issues.push("control plane unreachable".to_string());
    }
    issues
}

// ── Unit tests ────────────────────────────────────────────────────────────────
