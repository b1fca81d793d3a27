use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Result;
use clap::CommandFactory;
use panelup_installer::{detect_owner, AccountDatabase, SystemRunner};

use crate::flows::{
    build_upgrade_plan, execute_upgrade, format_plan_lines, load_config, preview_ownership,
    resolve_upgrade_settings,
};
use crate::prompt::TerminalPrompter;
use crate::render::{current_output_style, Console};
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<ExitCode> {
    let interactive = !cli.no_interaction && std::io::stdin().is_terminal();

    match cli.command {
        Commands::Upgrade {
            target,
            on_failure,
            report,
        } => {
            let config = load_config(cli.root.as_deref(), cli.config.as_deref())?;
            let settings = resolve_upgrade_settings(
                cli.root.as_deref(),
                &target,
                on_failure.map(Into::into),
                report,
                interactive,
                config,
            )?;
            let mut console = Console::new(current_output_style());
            let outcome = execute_upgrade(
                &settings,
                &mut SystemRunner,
                &mut TerminalPrompter::new(),
                &mut console,
                |path| detect_owner(path, &AccountDatabase::load()?),
            )?;
            if outcome.is_failure() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Plan { target } => {
            let config = load_config(cli.root.as_deref(), cli.config.as_deref())?;
            let settings =
                resolve_upgrade_settings(cli.root.as_deref(), &target, None, None, false, config)?;
            let ownership = preview_ownership(
                &settings.options,
                &settings.layout.public_dir(),
                |path| detect_owner(path, &AccountDatabase::load()?),
            )?;
            let plan = build_upgrade_plan(&settings, ownership)?;
            let mut console = Console::new(current_output_style());
            console.section("Upgrade plan");
            console.lines(&format_plan_lines(&plan));
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let mut stdout = std::io::stdout();
            clap_complete::generate(shell, &mut command, "panelup", &mut stdout);
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(ExitCode::SUCCESS)
}
