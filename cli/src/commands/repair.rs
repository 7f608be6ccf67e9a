//! `nodemend repair` — the full remediation sequence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::application::ports::AddressSource;
use crate::application::services::node_repair::run_repair;
use crate::domain::config::RemediationConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::DiskFiles;
use crate::infra::network::PingProbe;
use crate::infra::ssh::SshTokenSource;
use crate::infra::systemd::SystemctlManager;
use crate::output::reporter::{SilentReporter, TerminalReporter};

#[derive(clap::Args)]
pub struct RepairArgs {
    /// Control plane address (hostname or IP); prompted for when omitted
    #[arg(short, long, env = "NODEMEND_SERVER")]
    pub server: Option<String>,

    /// YAML config file overriding the default paths
    #[arg(short, long, env = "NODEMEND_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Run `nodemend repair`.
///
/// # Errors
///
/// Returns an error when any remediation stage fails fatally.
pub async fn run(ctx: &AppContext, args: RepairArgs) -> Result<()> {
    let cfg = resolve_config(args.config.as_deref())?;
    let addr_source = CliAddressSource {
        flag: args.server,
        non_interactive: ctx.non_interactive,
    };

    let runner = TokioCommandRunner::default();
    let net = PingProbe::default();
    let tokens = SshTokenSource::default();
    let svc = SystemctlManager::default();
    let fs = DiskFiles;

    let report = if ctx.json {
        run_repair(&cfg, &addr_source, &runner, &net, &tokens, &svc, &fs, &SilentReporter).await?
    } else {
        let reporter = TerminalReporter::new(&ctx.output);
        run_repair(&cfg, &addr_source, &runner, &net, &tokens, &svc, &fs, &reporter).await?
    };

    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("JSON serialization")?
        );
    } else {
        println!();
        ctx.output.success("Node remediation complete");
    }
    Ok(())
}

/// Build the resolved config from the overlay file and the executable's
/// directory (where the agent binary is expected to sit).
pub(crate) fn resolve_config(explicit: Option<&Path>) -> Result<RemediationConfig> {
    let overlay = crate::infra::config::load_overlay(explicit)?;
    let exe = std::env::current_exe().context("cannot locate the nodemend executable")?;
    let exe_dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable has no parent directory"))?;
    Ok(RemediationConfig::resolve(overlay, exe_dir))
}

/// Address source backed by the `--server` flag with an interactive
/// dialoguer fallback. Non-interactive runs without a flag yield an empty
/// string, which the service rejects as an empty address.
struct CliAddressSource {
    flag: Option<String>,
    non_interactive: bool,
}

impl AddressSource for CliAddressSource {
    fn acquire(&self) -> Result<String> {
        if let Some(addr) = &self.flag {
            return Ok(addr.clone());
        }
        if self.non_interactive {
            return Ok(String::new());
        }
        let addr: String = dialoguer::Input::new()
            .with_prompt("Control plane address")
            .allow_empty(true)
            .interact_text()
            .context("reading control plane address")?;
        Ok(addr)
    }
}
