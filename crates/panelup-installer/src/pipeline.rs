use std::path::Path;

use panelup_core::{FailurePolicy, Ownership};
use serde::Serialize;

use crate::fetch::FetchRequest;
use crate::framework::{reload_runtime_context, FrameworkHandle, ToolPaths};
use crate::fs_utils::remove_rotated_logs;
use crate::layout::{InstallLayout, WRITABLE_DIRS, WRITABLE_DIR_MODE};
use crate::process::{CommandRunner, Invocation, OutputSink, OutputStream, ProcessExit};
use crate::report::{StepOutcome, StepStatus, UpgradeReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    FetchRelease,
    MaintenanceDown,
    NormalizePermissions,
    InstallDependencies,
    ReloadRuntime,
    Migrate,
    ClearConfigCache,
    ClearViewCache,
    RemoveOldLogs,
    ChownTree,
    MaintenanceUp,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchRelease => "fetch_release",
            Self::MaintenanceDown => "maintenance_down",
            Self::NormalizePermissions => "normalize_permissions",
            Self::InstallDependencies => "install_dependencies",
            Self::ReloadRuntime => "reload_runtime",
            Self::Migrate => "migrate",
            Self::ClearConfigCache => "clear_config_cache",
            Self::ClearViewCache => "clear_view_cache",
            Self::RemoveOldLogs => "remove_old_logs",
            Self::ChownTree => "chown_tree",
            Self::MaintenanceUp => "maintenance_up",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    FetchExtract(FetchRequest),
    Exec(Invocation),
    /// Resolved against whichever framework handle is current when the step runs.
    Artisan {
        command: &'static str,
        args: Vec<String>,
    },
    ReloadRuntime,
    RemoveLogs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub id: StepId,
    pub description: &'static str,
    pub action: StepAction,
}

impl PipelineStep {
    fn new(id: StepId, description: &'static str, action: StepAction) -> Self {
        Self {
            id,
            description,
            action,
        }
    }

    pub fn command_line(&self, handle: &FrameworkHandle) -> String {
        match &self.action {
            StepAction::FetchExtract(request) => request.command_line(),
            StepAction::Exec(invocation) => invocation.command_line(),
            StepAction::Artisan { command, args } => handle.artisan(command, args).command_line(),
            StepAction::ReloadRuntime => "reload runtime context".to_string(),
            StepAction::RemoveLogs => "rm -f storage/logs/*.log".to_string(),
        }
    }
}

/// Receives progress while the pipeline runs, on top of child output lines.
pub trait StepObserver: OutputSink {
    fn step_started(
        &mut self,
        _index: usize,
        _total: usize,
        _step: &PipelineStep,
        _command_line: &str,
    ) {
    }

    fn step_finished(&mut self, _outcome: &StepOutcome) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    layout: InstallLayout,
    archive_url: String,
    ownership: Ownership,
    tools: ToolPaths,
    steps: Vec<PipelineStep>,
}

impl UpgradePlan {
    pub fn new(
        layout: InstallLayout,
        archive_url: String,
        ownership: Ownership,
        tools: ToolPaths,
    ) -> Self {
        let steps = build_steps(&layout, &archive_url, &ownership, &tools);
        Self {
            layout,
            archive_url,
            ownership,
            tools,
            steps,
        }
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn archive_url(&self) -> &str {
        &self.archive_url
    }

    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn initial_handle(&self) -> FrameworkHandle {
        FrameworkHandle::bootstrap(&self.layout, &self.tools.php)
    }

    /// Runs every step in order. Under [`FailurePolicy::Continue`] a failed
    /// step never prevents the next one from running; under
    /// [`FailurePolicy::Halt`] the steps after the first failure are skipped.
    pub fn run<R, O>(
        &self,
        runner: &mut R,
        observer: &mut O,
        policy: FailurePolicy,
    ) -> UpgradeReport
    where
        R: CommandRunner + ?Sized,
        O: StepObserver,
    {
        let total = self.steps.len();
        let mut handle = self.initial_handle();
        let mut halted = false;
        let mut outcomes = Vec::with_capacity(total);

        for (index, step) in self.steps.iter().enumerate() {
            let command_line = step.command_line(&handle);
            if halted {
                outcomes.push(outcome(step, command_line, StepStatus::Skipped, None, None));
                continue;
            }

            observer.step_started(index, total, step, &command_line);
            tracing::info!(
                step = step.id.as_str(),
                command = %command_line,
                "step started"
            );
            let result = self.execute(step, &command_line, &mut handle, runner, observer);
            if result.failed() {
                tracing::warn!(
                    step = step.id.as_str(),
                    message = ?result.message,
                    "step failed"
                );
                halted = policy == FailurePolicy::Halt;
            }
            observer.step_finished(&result);
            outcomes.push(result);
        }

        UpgradeReport {
            archive_url: self.archive_url.clone(),
            ownership: self.ownership.chown_spec(),
            failure_policy: policy,
            completed: !halted,
            steps: outcomes,
        }
    }

    fn execute<R, O>(
        &self,
        step: &PipelineStep,
        command_line: &str,
        handle: &mut FrameworkHandle,
        runner: &mut R,
        observer: &mut O,
    ) -> StepOutcome
    where
        R: CommandRunner + ?Sized,
        O: StepObserver,
    {
        let command_line = command_line.to_string();
        match &step.action {
            StepAction::FetchExtract(request) => {
                process_outcome(step, command_line, runner.fetch_extract(request, observer))
            }
            StepAction::Exec(invocation) => {
                process_outcome(step, command_line, runner.run(invocation, observer))
            }
            StepAction::Artisan { command, args } => {
                let invocation = handle.artisan(command, args);
                process_outcome(step, command_line, runner.run(&invocation, observer))
            }
            StepAction::ReloadRuntime => match reload_runtime_context(&self.layout, handle) {
                Ok(fresh) => {
                    let message = format!("runtime context generation {}", fresh.generation());
                    *handle = fresh;
                    outcome(step, command_line, StepStatus::Ok, None, Some(message))
                }
                Err(err) => {
                    let message = err.to_string();
                    observer.line(OutputStream::Stderr, &message);
                    outcome(step, command_line, StepStatus::Failed, None, Some(message))
                }
            },
            StepAction::RemoveLogs => match remove_rotated_logs(&self.layout.logs_dir()) {
                Ok(removed) => {
                    for path in &removed {
                        observer.line(
                            OutputStream::Stdout,
                            &format!("removed {}", relative_display(self.layout.root(), path)),
                        );
                    }
                    let message = format!("removed {} log file(s)", removed.len());
                    outcome(step, command_line, StepStatus::Ok, None, Some(message))
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    observer.line(OutputStream::Stderr, &message);
                    outcome(step, command_line, StepStatus::Failed, None, Some(message))
                }
            },
        }
    }
}

fn build_steps(
    layout: &InstallLayout,
    archive_url: &str,
    ownership: &Ownership,
    tools: &ToolPaths,
) -> Vec<PipelineStep> {
    let root = layout.root();
    let mut chmod_args = vec!["-R".to_string(), WRITABLE_DIR_MODE.to_string()];
    chmod_args.extend(WRITABLE_DIRS.iter().map(|dir| dir.to_string()));

    vec![
        PipelineStep::new(
            StepId::FetchRelease,
            "download and extract the release archive",
            StepAction::FetchExtract(FetchRequest::new(archive_url, root)),
        ),
        PipelineStep::new(
            StepId::MaintenanceDown,
            "enter maintenance mode",
            StepAction::Artisan {
                command: "down",
                args: Vec::new(),
            },
        ),
        PipelineStep::new(
            StepId::NormalizePermissions,
            "normalize permissions on writable directories",
            StepAction::Exec(Invocation::new("chmod", chmod_args, root)),
        ),
        PipelineStep::new(
            StepId::InstallDependencies,
            "install production dependencies",
            StepAction::Exec(Invocation::new(
                tools.composer.clone(),
                ["install", "--no-dev", "--optimize-autoloader"],
                root,
            )),
        ),
        PipelineStep::new(
            StepId::ReloadRuntime,
            "reload runtime context",
            StepAction::ReloadRuntime,
        ),
        PipelineStep::new(
            StepId::Migrate,
            "run database migrations",
            StepAction::Artisan {
                command: "migrate",
                args: vec!["--force".to_string()],
            },
        ),
        PipelineStep::new(
            StepId::ClearConfigCache,
            "clear configuration cache",
            StepAction::Artisan {
                command: "config:clear",
                args: Vec::new(),
            },
        ),
        PipelineStep::new(
            StepId::ClearViewCache,
            "clear compiled views",
            StepAction::Artisan {
                command: "view:clear",
                args: Vec::new(),
            },
        ),
        PipelineStep::new(
            StepId::RemoveOldLogs,
            "remove old log files",
            StepAction::RemoveLogs,
        ),
        PipelineStep::new(
            StepId::ChownTree,
            "set ownership of the installation",
            StepAction::Exec(Invocation::new(
                "chown",
                ["-R".to_string(), ownership.chown_spec(), ".".to_string()],
                root,
            )),
        ),
        PipelineStep::new(
            StepId::MaintenanceUp,
            "leave maintenance mode",
            StepAction::Artisan {
                command: "up",
                args: Vec::new(),
            },
        ),
    ]
}

fn process_outcome(
    step: &PipelineStep,
    command_line: String,
    result: anyhow::Result<ProcessExit>,
) -> StepOutcome {
    match result {
        Ok(exit) if exit.success => outcome(step, command_line, StepStatus::Ok, exit.code, None),
        Ok(exit) => {
            let message = match exit.code {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            };
            outcome(
                step,
                command_line,
                StepStatus::Failed,
                exit.code,
                Some(message),
            )
        }
        Err(err) => outcome(
            step,
            command_line,
            StepStatus::Failed,
            None,
            Some(format!("{err:#}")),
        ),
    }
}

fn outcome(
    step: &PipelineStep,
    command: String,
    status: StepStatus,
    exit_code: Option<i32>,
    message: Option<String>,
) -> StepOutcome {
    StepOutcome {
        step: step.id,
        description: step.description.to_string(),
        command,
        status,
        exit_code,
        message,
    }
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
