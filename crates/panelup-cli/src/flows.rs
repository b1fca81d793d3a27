use std::path::{Path, PathBuf};

use anyhow::Result;
use panelup_core::{
    resolve_archive_url, FailurePolicy, Ownership, RuntimeCheck, UpgradeConfig, UpgradeOptions,
    DEFAULT_GROUP, DEFAULT_USER, SUGGESTED_ACCOUNTS,
};
use panelup_installer::{
    check_runtime, CommandRunner, DetectedOwner, InstallLayout, ToolPaths, UpgradePlan,
    UpgradeReport, DEFAULT_COMPOSER, DEFAULT_PHP,
};

use crate::prompt::Prompter;
use crate::render::{format_report_summary_lines, Console};
use crate::TargetArgs;

pub(crate) const CONFIRM_UPGRADE_PROMPT: &str =
    "Are you sure you want to run the upgrade process for your Panel?";
pub(crate) const UPGRADE_DECLINED_MESSAGE: &str = "Upgrade process terminated by user.";
pub(crate) const USER_ENTRY_PROMPT: &str = "Please enter the name of the user running your \
    webserver process. This varies from system to system, but is generally \"www-data\", \
    \"nginx\", or \"apache\".";
pub(crate) const GROUP_ENTRY_PROMPT: &str = "Please enter the name of the group running your \
    webserver process. Normally this is the same as your user.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpgradeSettings {
    pub(crate) layout: InstallLayout,
    pub(crate) options: UpgradeOptions,
    pub(crate) tools: ToolPaths,
    pub(crate) policy: FailurePolicy,
    pub(crate) interactive: bool,
    pub(crate) report_path: Option<PathBuf>,
}

#[derive(Debug)]
pub(crate) enum UpgradeCommandOutcome {
    Declined,
    PreconditionFailed(RuntimeCheck),
    Finished(UpgradeReport),
}

impl UpgradeCommandOutcome {
    pub(crate) fn is_failure(&self) -> bool {
        match self {
            Self::Declined => false,
            Self::PreconditionFailed(_) => true,
            Self::Finished(report) => !report.completed,
        }
    }
}

/// An explicit `--config` must exist; otherwise `panelup.toml` in the root is optional.
pub(crate) fn load_config(root: Option<&Path>, config: Option<&Path>) -> Result<UpgradeConfig> {
    if let Some(path) = config {
        return UpgradeConfig::load(path);
    }
    let base = root.unwrap_or_else(|| Path::new("."));
    Ok(UpgradeConfig::load_default(base)?.unwrap_or_default())
}

pub(crate) fn resolve_upgrade_settings(
    root: Option<&Path>,
    target: &TargetArgs,
    on_failure: Option<FailurePolicy>,
    report_path: Option<PathBuf>,
    interactive: bool,
    config: UpgradeConfig,
) -> Result<UpgradeSettings> {
    let root = root
        .map(Path::to_path_buf)
        .or(config.root)
        .unwrap_or_else(|| PathBuf::from("."));
    let options = UpgradeOptions {
        user: target.user.clone().or(config.user),
        group: target.group.clone().or(config.group),
        url: target.url.clone().or(config.url),
    };
    Ownership::with_defaults(options.user.as_deref(), options.group.as_deref())?;
    resolve_archive_url(options.url.as_deref())?;

    let tools = ToolPaths {
        php: target
            .php
            .clone()
            .or(config.php)
            .unwrap_or_else(|| DEFAULT_PHP.to_string()),
        composer: target
            .composer
            .clone()
            .or(config.composer)
            .unwrap_or_else(|| DEFAULT_COMPOSER.to_string()),
    };

    Ok(UpgradeSettings {
        layout: InstallLayout::new(root),
        options,
        tools,
        policy: on_failure.or(config.on_failure).unwrap_or_default(),
        interactive,
        report_path,
    })
}

pub(crate) fn resolve_ownership<P, D>(
    options: &UpgradeOptions,
    interactive: bool,
    public_dir: &Path,
    prompter: &mut P,
    mut detect: D,
) -> Result<Ownership>
where
    P: Prompter + ?Sized,
    D: FnMut(&Path) -> Result<DetectedOwner>,
{
    if !interactive || (options.user.is_some() && options.group.is_some()) {
        return Ownership::with_defaults(options.user.as_deref(), options.group.as_deref());
    }

    let detected = match detect(public_dir) {
        Ok(owner) => Some(owner),
        Err(err) => {
            tracing::warn!(
                path = %public_dir.display(),
                error = %err,
                "owner detection failed"
            );
            None
        }
    };

    let user = match &options.user {
        Some(user) => user.clone(),
        None => {
            let guess = detected
                .as_ref()
                .and_then(|owner| owner.user.clone())
                .unwrap_or_else(|| DEFAULT_USER.to_string());
            confirm_or_ask(prompter, "user", guess, USER_ENTRY_PROMPT)?
        }
    };
    let group = match &options.group {
        Some(group) => group.clone(),
        None => {
            let guess = detected
                .as_ref()
                .and_then(|owner| owner.group.clone())
                .unwrap_or_else(|| DEFAULT_GROUP.to_string());
            confirm_or_ask(prompter, "group", guess, GROUP_ENTRY_PROMPT)?
        }
    };

    Ownership::new(user, group)
}

fn confirm_or_ask<P>(
    prompter: &mut P,
    kind: &str,
    detected: String,
    entry_prompt: &str,
) -> Result<String>
where
    P: Prompter + ?Sized,
{
    let question =
        format!("Your webserver {kind} has been detected as [{detected}]: is this correct?");
    if prompter.confirm(&question, true)? {
        return Ok(detected);
    }
    prompter.ask(entry_prompt, &SUGGESTED_ACCOUNTS)
}

/// Ownership shown by `plan`: explicit values, else the current owner of
/// `public/`, else the defaults. Never prompts.
pub(crate) fn preview_ownership<D>(
    options: &UpgradeOptions,
    public_dir: &Path,
    mut detect: D,
) -> Result<Ownership>
where
    D: FnMut(&Path) -> Result<DetectedOwner>,
{
    let detected = if options.user.is_some() && options.group.is_some() {
        None
    } else {
        detect(public_dir).ok()
    };
    let user = options
        .user
        .clone()
        .or_else(|| detected.as_ref().and_then(|owner| owner.user.clone()));
    let group = options
        .group
        .clone()
        .or_else(|| detected.as_ref().and_then(|owner| owner.group.clone()));
    Ownership::with_defaults(user.as_deref(), group.as_deref())
}

pub(crate) fn build_upgrade_plan(
    settings: &UpgradeSettings,
    ownership: Ownership,
) -> Result<UpgradePlan> {
    Ok(UpgradePlan::new(
        settings.layout.clone(),
        resolve_archive_url(settings.options.url.as_deref())?,
        ownership,
        settings.tools.clone(),
    ))
}

pub(crate) fn execute_upgrade<R, P, D>(
    settings: &UpgradeSettings,
    runner: &mut R,
    prompter: &mut P,
    console: &mut Console,
    detect: D,
) -> Result<UpgradeCommandOutcome>
where
    R: CommandRunner + ?Sized,
    P: Prompter + ?Sized,
    D: FnMut(&Path) -> Result<DetectedOwner>,
{
    console.info("Starting upgrade process...");

    let runtime = check_runtime(runner, &settings.layout, &settings.tools.php);
    if runtime.is_supported() {
        tracing::info!(check = %runtime.message(), "runtime check passed");
    } else {
        console.error(&runtime.message());
        if settings.policy == FailurePolicy::Halt {
            return Ok(UpgradeCommandOutcome::PreconditionFailed(runtime));
        }
    }

    let ownership = resolve_ownership(
        &settings.options,
        settings.interactive,
        &settings.layout.public_dir(),
        prompter,
        detect,
    )?;

    if settings.interactive && !prompter.confirm(CONFIRM_UPGRADE_PROMPT, false)? {
        console.warn(UPGRADE_DECLINED_MESSAGE);
        return Ok(UpgradeCommandOutcome::Declined);
    }

    let plan = build_upgrade_plan(settings, ownership)?;
    tracing::info!(
        url = plan.archive_url(),
        ownership = %plan.ownership(),
        policy = settings.policy.as_str(),
        root = %plan.layout().root().display(),
        "running upgrade pipeline"
    );
    let report = plan.run(runner, console, settings.policy);
    console.finish_progress();

    let summary = format_report_summary_lines(&report, console.style());
    console.lines(&summary);

    if let Some(path) = &settings.report_path {
        match report.write_json(path) {
            Ok(()) => tracing::info!(path = %path.display(), "wrote upgrade report"),
            Err(err) => console.error(&format!("{err:#}")),
        }
    }
    Ok(UpgradeCommandOutcome::Finished(report))
}

pub(crate) fn format_plan_lines(plan: &UpgradePlan) -> Vec<String> {
    let mut lines = vec![
        format!("root: {}", plan.layout().root().display()),
        format!("archive: {}", plan.archive_url()),
        format!("ownership: {}", plan.ownership()),
    ];
    let handle = plan.initial_handle();
    for (index, step) in plan.steps().iter().enumerate() {
        lines.push(format!(
            "{:>2}. {}: {}",
            index + 1,
            step.description,
            step.command_line(&handle)
        ));
    }
    lines
}
