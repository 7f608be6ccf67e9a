//! Application service — node repair use-case.
//!
//! Orchestrates the remediation of a NotReady worker node: verify
//! preconditions, reconcile the agent's service definition and join token,
//! restart the agent, and verify it came up. Strictly sequential; the first
//! fatal condition aborts the run. No rollback is attempted — the timestamped
//! unit-file backup is the only safety artifact.

use anyhow::{Context, Result};

use crate::application::ports::{
    AddressSource, CommandRunner, HostFiles, NetworkProbe, ProgressReporter, ServiceManager,
    TokenSource,
};
use crate::domain::config::{RemediationConfig, validate_server_addr};
use crate::domain::error::{ConnectivityError, PreconditionError, ServiceError};
use crate::domain::report::{RemediationReport, StepStatus};
use crate::domain::unit::{extract_exec_start, has_exec_start, render_unit, rewrite_exec_start};

/// Numbered stages shown in the progress banner.
const STAGE_TOTAL: u8 = 5;

/// Journal lines shown in the closing summary of a successful run.
const SUMMARY_LOG_LINES: u32 = 10;

/// Run the full remediation sequence.
///
/// # Errors
///
/// Returns an error on the first fatal condition: missing privilege, empty
/// address, unreachable control plane, missing agent binary, failed token
/// fetch, failed service start, or a service that is not active afterwards.
#[allow(clippy::too_many_arguments)] // one injected port per collaborator, by design
pub async fn run_repair(
    cfg: &RemediationConfig,
    addr_source: &impl AddressSource,
    runner: &impl CommandRunner,
    net: &impl NetworkProbe,
    tokens: &impl TokenSource,
    svc: &impl ServiceManager,
    fs: &impl HostFiles,
    reporter: &impl ProgressReporter,
) -> Result<RemediationReport> {
    let mut report = RemediationReport::default();

    ensure_privileged(runner).await?;

    let addr = addr_source.acquire()?;
    let addr = validate_server_addr(&addr)?;

    check_reachability(&addr, cfg, net, reporter, &mut report).await?;
    check_agent_binary(cfg, fs, reporter, &mut report)?;
    reconcile_unit(cfg, fs, svc, reporter, &mut report).await?;
    ensure_token(&addr, cfg, tokens, fs, reporter, &mut report).await?;
    restart_and_verify(cfg, svc, reporter, &mut report).await?;
    summarize(&addr, cfg, svc, reporter).await;

    Ok(report)
}

/// Verify the effective uid is 0, queried through the command runner so the
/// check is mockable.
///
/// # Errors
///
/// Returns [`PreconditionError::NotPrivileged`] for any non-root uid.
pub async fn ensure_privileged(runner: &impl CommandRunner) -> Result<()> {
    let out = runner
        .run("id", &["-u"])
        .await
        .context("checking effective uid")?;
    let uid = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if uid == "0" {
        Ok(())
    } else {
        Err(PreconditionError::NotPrivileged.into())
    }
}

async fn check_reachability(
    addr: &str,
    cfg: &RemediationConfig,
    net: &impl NetworkProbe,
    reporter: &impl ProgressReporter,
    report: &mut RemediationReport,
) -> Result<()> {
    reporter.stage(1, STAGE_TOTAL, &format!("Checking connectivity to {addr}"));
    let reachable = net.ping(addr, cfg.ping_count).await.unwrap_or(false);
    if !reachable {
        return Err(ConnectivityError::ControlPlaneUnreachable {
            addr: addr.to_string(),
        }
        .into());
    }
    reporter.success(&format!("Control plane {addr} is reachable"));
    report.record(1, "connectivity", StepStatus::Passed, "control plane reachable");
    Ok(())
}

fn check_agent_binary(
    cfg: &RemediationConfig,
    fs: &impl HostFiles,
    reporter: &impl ProgressReporter,
    report: &mut RemediationReport,
) -> Result<()> {
    reporter.stage(2, STAGE_TOTAL, "Locating agent binary");
    if !fs.exists(&cfg.expected_binary) {
        return Err(PreconditionError::AgentBinaryMissing(cfg.expected_binary.clone()).into());
    }
    reporter.success(&format!("Agent binary found at {}", cfg.expected_binary.display()));
    report.record(2, "agent binary", StepStatus::Passed, "binary present");
    Ok(())
}

/// Make the unit file launch the expected binary.
///
/// An existing file is patched in place (after a timestamped backup) when its
/// ExecStart path is absent, empty, or different; a matching file is left
/// byte-for-byte untouched. A missing file is synthesized from the fixed
/// template. Malformed content never aborts the run — extraction is
/// best-effort and a failed extraction counts as a mismatch.
async fn reconcile_unit(
    cfg: &RemediationConfig,
    fs: &impl HostFiles,
    svc: &impl ServiceManager,
    reporter: &impl ProgressReporter,
    report: &mut RemediationReport,
) -> Result<()> {
    reporter.stage(3, STAGE_TOTAL, "Reconciling service definition");
    let expected = cfg.expected_binary.display().to_string();

    if fs.exists(&cfg.unit_path) {
        let text = fs
            .read_to_string(&cfg.unit_path)
            .with_context(|| format!("reading {}", cfg.unit_path.display()))?;

        if extract_exec_start(&text).as_deref() == Some(expected.as_str()) {
            reporter.step("Service definition already launches the expected binary");
            report.record(3, "service definition", StepStatus::Passed, "launch path matches");
            return Ok(());
        }

        let backup = fs
            .backup(&cfg.unit_path)
            .with_context(|| format!("backing up {}", cfg.unit_path.display()))?;
        reporter.step(&format!("Backed up service definition to {}", backup.display()));

        let patched = if has_exec_start(&text) {
            rewrite_exec_start(&text, &cfg.expected_binary)
        } else {
            render_unit(&cfg.expected_binary)
        };
        fs.write(&cfg.unit_path, &patched)
            .with_context(|| format!("writing {}", cfg.unit_path.display()))?;
        svc.daemon_reload().await.context("reloading unit definitions")?;
        reporter.success("Service definition patched to launch the expected binary");
        report.record(3, "service definition", StepStatus::Fixed, "launch path rewritten");
    } else {
        fs.write(&cfg.unit_path, &render_unit(&cfg.expected_binary))
            .with_context(|| format!("writing {}", cfg.unit_path.display()))?;
        svc.daemon_reload().await.context("reloading unit definitions")?;
        reporter.success(&format!("Created service definition at {}", cfg.unit_path.display()));
        report.record(3, "service definition", StepStatus::Fixed, "unit file created");
    }
    Ok(())
}

/// Ensure a non-empty join token is on disk, fetching it over the remote
/// shell when absent. A present token means no remote connection is opened.
async fn ensure_token(
    addr: &str,
    cfg: &RemediationConfig,
    tokens: &impl TokenSource,
    fs: &impl HostFiles,
    reporter: &impl ProgressReporter,
    report: &mut RemediationReport,
) -> Result<()> {
    reporter.stage(4, STAGE_TOTAL, "Checking join token");

    if token_present(cfg, fs) {
        reporter.step("Join token already provisioned");
        report.record(4, "join token", StepStatus::Passed, "token present");
        return Ok(());
    }

    reporter.step(&format!(
        "Fetching join token from root@{addr} (ssh will prompt for the root password)"
    ));
    let token = match tokens.fetch_token(addr, &cfg.remote_token_path).await {
        Ok(raw) => raw,
        Err(e) => {
            return Err(ConnectivityError::TokenFetchFailed {
                addr: addr.to_string(),
                detail: e.to_string(),
            }
            .into());
        }
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(ConnectivityError::TokenEmpty {
            addr: addr.to_string(),
        }
        .into());
    }

    fs.write_secret(&cfg.token_path, &format!("{token}\n"))
        .with_context(|| format!("writing {}", cfg.token_path.display()))?;
    reporter.success(&format!("Join token stored at {}", cfg.token_path.display()));
    report.record(4, "join token", StepStatus::Fixed, "token fetched from control plane");
    Ok(())
}

fn token_present(cfg: &RemediationConfig, fs: &impl HostFiles) -> bool {
    fs.exists(&cfg.token_path)
        && fs
            .read_to_string(&cfg.token_path)
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
}

/// Stop (ignoring failure), settle, start, settle, then verify active state.
/// On failure the recent journal tail is emitted before the error returns.
async fn restart_and_verify(
    cfg: &RemediationConfig,
    svc: &impl ServiceManager,
    reporter: &impl ProgressReporter,
    report: &mut RemediationReport,
) -> Result<()> {
    let unit = &cfg.service_name;
    reporter.stage(5, STAGE_TOTAL, &format!("Restarting {unit}"));

    if let Err(e) = svc.stop(unit).await {
        reporter.warn(&format!("Stop failed (unit may not be running): {e}"));
    }
    tokio::time::sleep(cfg.stop_settle).await;

    svc.start(unit)
        .await
        .map_err(|e| ServiceError::StartFailed {
            unit: unit.clone(),
            detail: e.to_string(),
        })?;
    reporter.step("Waiting for the agent to initialize");
    tokio::time::sleep(cfg.start_settle).await;

    let state = svc.active_state(unit).await.unwrap_or_else(|_| "unknown".to_string());
    if state == "active" {
        reporter.success(&format!("{unit} is active"));
        report.record(5, "restart", StepStatus::Passed, "service active");
        report.service_active = true;
        Ok(())
    } else {
        reporter.warn(&format!("{unit} is {state}; recent journal entries:"));
        for line in svc
            .recent_logs(unit, cfg.log_tail_lines)
            .await
            .unwrap_or_default()
        {
            reporter.log_line(&line);
        }
        report.record(5, "restart", StepStatus::Failed, format!("service state: {state}"));
        Err(ServiceError::NotActiveAfterRestart {
            unit: unit.clone(),
            state,
        }
        .into())
    }
}

/// Closing summary on success: a short journal tail plus the follow-up hint.
async fn summarize(
    addr: &str,
    cfg: &RemediationConfig,
    svc: &impl ServiceManager,
    reporter: &impl ProgressReporter,
) {
    if let Ok(lines) = svc.recent_logs(&cfg.service_name, SUMMARY_LOG_LINES).await {
        for line in lines {
            reporter.log_line(&line);
        }
    }
    reporter.info(&format!(
        "Run 'kubectl get nodes' on {addr} to confirm the node reports Ready"
    ));
}
