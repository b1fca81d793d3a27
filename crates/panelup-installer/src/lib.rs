mod accounts;
mod fetch;
mod framework;
mod fs_utils;
mod layout;
mod pipeline;
mod process;
mod report;

pub use accounts::{detect_owner, AccountDatabase, DetectedOwner, GROUP_PATH, PASSWD_PATH};
pub use fetch::FetchRequest;
pub use framework::{
    check_runtime, reload_runtime_context, FrameworkHandle, ToolPaths, DEFAULT_COMPOSER,
    DEFAULT_PHP,
};
pub use fs_utils::remove_rotated_logs;
pub use layout::{InstallLayout, WRITABLE_DIRS, WRITABLE_DIR_MODE};
pub use pipeline::{PipelineStep, StepAction, StepId, StepObserver, UpgradePlan};
pub use process::{
    error_chain_has_not_found, CaptureSink, CommandRunner, Invocation, OutputSink, OutputStream,
    ProcessExit, SystemRunner,
};
pub use report::{StepOutcome, StepStatus, UpgradeReport};
