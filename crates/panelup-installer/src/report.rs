use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use panelup_core::FailurePolicy;
use serde::Serialize;

use crate::pipeline::StepId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: StepId,
    pub description: String,
    pub command: String,
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub message: Option<String>,
}

impl StepOutcome {
    pub fn failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    pub archive_url: String,
    pub ownership: String,
    pub failure_policy: FailurePolicy,
    pub completed: bool,
    pub steps: Vec<StepOutcome>,
}

impl UpgradeReport {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|outcome| outcome.failed())
    }

    pub fn outcome(&self, step: StepId) -> Option<&StepOutcome> {
        self.steps.iter().find(|outcome| outcome.step == step)
    }

    /// True when maintenance mode was entered and never successfully left.
    pub fn left_in_maintenance(&self) -> bool {
        let entered = self
            .outcome(StepId::MaintenanceDown)
            .is_some_and(|outcome| outcome.status == StepStatus::Ok);
        let left = self
            .outcome(StepId::MaintenanceUp)
            .is_some_and(|outcome| outcome.status == StepStatus::Ok);
        entered && !left
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create report dir: {}", parent.display()))?;
        }
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize upgrade report")?;
        fs::write(path, payload.as_bytes())
            .with_context(|| format!("failed to write upgrade report: {}", path.display()))
    }
}
