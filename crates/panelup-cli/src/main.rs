mod dispatch;
mod flows;
mod logging;
mod prompt;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use panelup_core::FailurePolicy;

#[derive(Parser, Debug)]
#[command(name = "panelup")]
#[command(about = "Upgrade a self-hosted panel installation in place", long_about = None)]
struct Cli {
    /// Installation directory (defaults to the current directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// TOML config file (defaults to panelup.toml in the installation directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Never prompt; missing values fall back to defaults.
    #[arg(short = 'n', long = "no-interaction", global = true)]
    no_interaction: bool,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the release archive and upgrade the installation.
    Upgrade {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long, value_enum)]
        on_failure: Option<FailurePolicyArg>,
        /// Write a JSON report of every step to this file.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the steps an upgrade would run without running them.
    Plan {
        #[command(flatten)]
        target: TargetArgs,
    },
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    Version,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
struct TargetArgs {
    /// The user that PHP runs under. All files will be owned by this user.
    #[arg(long)]
    user: Option<String>,
    /// The group that PHP runs under. All files will be owned by this group.
    #[arg(long)]
    group: Option<String>,
    /// The specific archive to download.
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    php: Option<String>,
    #[arg(long)]
    composer: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FailurePolicyArg {
    Continue,
    Halt,
}

impl From<FailurePolicyArg> for FailurePolicy {
    fn from(value: FailurePolicyArg) -> Self {
        match value {
            FailurePolicyArg::Continue => Self::Continue,
            FailurePolicyArg::Halt => Self::Halt,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match dispatch::run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
