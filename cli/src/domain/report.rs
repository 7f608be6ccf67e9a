//! Per-step remediation outcomes.
//!
//! Each stage of the repair records an explicit result instead of relying on
//! process exit codes; the accumulated report backs the `--json` output.

use serde::Serialize;

/// How a single remediation stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The checked condition already held; nothing was changed.
    Passed,
    /// The condition did not hold and was repaired.
    Fixed,
    /// The stage did not apply on this run.
    Skipped,
    /// The stage failed; the run aborts after recording this.
    Failed,
}

/// Outcome of one numbered remediation stage.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// Stage number as shown in the progress banner.
    pub stage: u8,
    /// Short stage label, e.g. `"connectivity"`.
    pub label: String,
    /// How the stage ended.
    pub status: StepStatus,
    /// Human-readable detail.
    pub detail: String,
}

/// Accumulated outcome of a full remediation run.
#[derive(Debug, Default, Serialize)]
pub struct RemediationReport {
    /// Per-stage outcomes in execution order.
    pub steps: Vec<StepOutcome>,
    /// Whether the agent service verified active at the end.
    pub service_active: bool,
}

impl RemediationReport {
    /// Append a stage outcome.
    pub fn record(&mut self, stage: u8, label: &str, status: StepStatus, detail: impl Into<String>) {
        self.steps.push(StepOutcome {
            stage,
            label: label.to_string(),
            status,
            detail: detail.into(),
        });
    }
}
