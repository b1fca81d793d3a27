use std::path::PathBuf;

use anyhow::{anyhow, Result};
use panelup_core::RuntimeCheck;

use crate::layout::InstallLayout;
use crate::process::{CaptureSink, CommandRunner, Invocation};

pub const DEFAULT_PHP: &str = "php";
pub const DEFAULT_COMPOSER: &str = "composer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub php: String,
    pub composer: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            php: DEFAULT_PHP.to_string(),
            composer: DEFAULT_COMPOSER.to_string(),
        }
    }
}

/// Entry point for framework console commands (`php artisan ...`).
///
/// A handle describes the code that was on disk when it was created. After
/// the release archive replaces that code, later commands must go through the
/// handle returned by [`reload_runtime_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkHandle {
    php: String,
    root: PathBuf,
    generation: u32,
}

impl FrameworkHandle {
    pub fn bootstrap(layout: &InstallLayout, php: &str) -> Self {
        Self {
            php: php.to_string(),
            root: layout.root().to_path_buf(),
            generation: 0,
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn artisan(&self, command: &str, args: &[String]) -> Invocation {
        let mut argv = vec!["artisan".to_string(), command.to_string()];
        argv.extend(args.iter().cloned());
        Invocation::new(self.php.clone(), argv, &self.root)
    }
}

pub fn reload_runtime_context(
    layout: &InstallLayout,
    previous: &FrameworkHandle,
) -> Result<FrameworkHandle> {
    let artisan = layout.artisan_path();
    if !artisan.is_file() {
        return Err(anyhow!(
            "cannot reload runtime context: framework entry point missing at {}",
            artisan.display()
        ));
    }

    let handle = FrameworkHandle {
        php: previous.php.clone(),
        root: layout.root().to_path_buf(),
        generation: previous.generation + 1,
    };
    tracing::info!(generation = handle.generation, "runtime context reloaded");
    Ok(handle)
}

fn runtime_version_invocation(layout: &InstallLayout, php: &str) -> Invocation {
    Invocation::new(php, ["-r", "echo PHP_VERSION;"], layout.root())
}

/// Asks the PHP binary for its version and compares it with the supported minimum.
pub fn check_runtime<R>(runner: &mut R, layout: &InstallLayout, php: &str) -> RuntimeCheck
where
    R: CommandRunner + ?Sized,
{
    let invocation = runtime_version_invocation(layout, php);
    let mut capture = CaptureSink::default();
    match runner.run(&invocation, &mut capture) {
        Ok(exit) if exit.success => RuntimeCheck::from_reported(&capture.stdout.join("\n")),
        Ok(exit) => {
            let status = match exit.code {
                Some(code) => code.to_string(),
                None => "signal".to_string(),
            };
            RuntimeCheck::Unknown(format!(
                "'{}' exited with status {status}: {}",
                invocation.command_line(),
                capture.stderr.join(" ").trim()
            ))
        }
        Err(err) => RuntimeCheck::Unknown(format!("{err:#}")),
    }
}
