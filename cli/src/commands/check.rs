//! `nodemend check` — read-only node diagnostics.

use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::services::node_check::run_check;
use crate::domain::config::RemediationConfig;
use crate::domain::health::{NodeChecks, collect_issues};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::DiskFiles;
use crate::infra::network::PingProbe;
use crate::infra::systemd::SystemctlManager;
use crate::output::reporter::{SilentReporter, TerminalReporter};

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Control plane address to include a reachability probe
    #[arg(short, long, env = "NODEMEND_SERVER")]
    pub server: Option<String>,

    /// YAML config file overriding the default paths
    #[arg(short, long, env = "NODEMEND_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Run `nodemend check`.
///
/// # Errors
///
/// Returns an error when issues were found, so the process exits non-zero.
pub async fn run(ctx: &AppContext, args: CheckArgs) -> Result<()> {
    let cfg = super::repair::resolve_config(args.config.as_deref())?;

    let runner = TokioCommandRunner::default();
    let net = PingProbe::default();
    let svc = SystemctlManager::default();
    let fs = DiskFiles;

    let checks = if ctx.json {
        run_check(&cfg, args.server.as_deref(), &runner, &net, &svc, &fs, &SilentReporter).await?
    } else {
        let reporter = TerminalReporter::new(&ctx.output);
        run_check(&cfg, args.server.as_deref(), &runner, &net, &svc, &fs, &reporter).await?
    };
    let issues = collect_issues(&checks);

    if ctx.json {
        let out = serde_json::json!({
            "status": if issues.is_empty() { "healthy" } else { "unhealthy" },
            "checks": checks,
            "issues": issues,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("JSON serialization")?
        );
    } else {
        render_human(ctx, &cfg, &checks, &issues);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} issue(s) found", issues.len())
    }
}

fn render_human(ctx: &AppContext, cfg: &RemediationConfig, checks: &NodeChecks, issues: &[String]) {
    println!();
    ctx.output.header("Node Health Check");
    println!();

    ctx.output.check(checks.privileged, "Running as root");
    ctx.output.check(
        checks.binary_present,
        &format!("Agent binary at {}", cfg.expected_binary.display()),
    );
    if checks.unit_present {
        ctx.output.check(
            checks.unit_exec_matches,
            "Service definition launches the expected binary",
        );
    } else {
        ctx.output.check(
            false,
            &format!("Service definition at {}", cfg.unit_path.display()),
        );
    }
    ctx.output.check(
        checks.token_present,
        &format!("Join token at {}", cfg.token_path.display()),
    );
    ctx.output
        .check(checks.service_active, &format!("{} is active", cfg.service_name));
    if let Some(reachable) = checks.reachable {
        ctx.output.check(reachable, "Control plane reachable");
    }

    println!();
    if issues.is_empty() {
        ctx.output.success("Everything looks good!");
    } else {
        println!(
            "  {} Found {} issue(s); run 'nodemend repair' to fix:",
            "✗".style(ctx.output.styles.error),
            issues.len()
        );
        for issue in issues {
            println!("    - {issue}");
        }
    }
}
