//! Application service — read-only node diagnosis use-case.
//!
//! Probes the same conditions the repair flow would fix, without mutating
//! anything. All I/O is routed through injected port traits.

use anyhow::Result;

use crate::application::ports::{
    CommandRunner, HostFiles, NetworkProbe, ProgressReporter, ServiceManager,
};
use crate::domain::config::RemediationConfig;
use crate::domain::health::NodeChecks;
use crate::domain::unit::extract_exec_start;

/// Run every read-only probe and return the aggregated snapshot.
///
/// Reachability is probed only when `server` is given; rendering and the
/// exit-status decision are the caller's responsibility.
///
/// # Errors
///
/// Returns an error only when a probe fails to execute in a way that leaves
/// the snapshot meaningless (currently never — individual probe failures
/// degrade to `false`).
pub async fn run_check(
    cfg: &RemediationConfig,
    server: Option<&str>,
    runner: &impl CommandRunner,
    net: &impl NetworkProbe,
    svc: &impl ServiceManager,
    fs: &impl HostFiles,
    reporter: &impl ProgressReporter,
) -> Result<NodeChecks> {
    reporter.step("checking privileges...");
    let privileged = probe_privileged(runner).await;

    reporter.step("checking agent files...");
    let binary_present = fs.exists(&cfg.expected_binary);
    let unit_present = fs.exists(&cfg.unit_path);
    let expected = cfg.expected_binary.display().to_string();
    let unit_exec_matches = unit_present
        && fs
            .read_to_string(&cfg.unit_path)
            .ok()
            .and_then(|text| extract_exec_start(&text))
            == Some(expected);
    let token_present = fs.exists(&cfg.token_path)
        && fs
            .read_to_string(&cfg.token_path)
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);

    reporter.step("checking agent service...");
    let service_active = svc
        .active_state(&cfg.service_name)
        .await
        .map(|s| s == "active")
        .unwrap_or(false);

    let reachable = match server {
        Some(addr) => {
            reporter.step("checking control plane reachability...");
            Some(net.ping(addr, cfg.ping_count).await.unwrap_or(false))
        }
        None => None,
    };

    reporter.success("diagnostics complete");

    Ok(NodeChecks {
        privileged,
        binary_present,
        unit_present,
        unit_exec_matches,
        token_present,
        service_active,
        reachable,
    })
}

async fn probe_privileged(runner: &impl CommandRunner) -> bool {
    runner
        .run("id", &["-u"])
        .await
        .map(|out| String::from_utf8_lossy(&out.stdout).trim() == "0")
        .unwrap_or(false)
}
