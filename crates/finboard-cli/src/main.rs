mod config_file;
mod driver;
mod headless;
mod logging;
mod palette;
mod render;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use finboard_core::Config;
use finboard_core::DashState;
use tracing::info;

use crate::config_file::default_config_path;
use crate::config_file::load_config;
use crate::logging::init_logging;
use crate::logging::LogTarget;

#[derive(Debug, Parser)]
#[command(name = "finboard", version, about = "FinOps agent dashboard")]
struct Cli {
    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive dashboard (the default).
    Tui {
        #[arg(long)]
        tenant: Option<String>,
    },
    /// Feed a JSONL tool event script through the result store.
    Replay {
        file: PathBuf,
        #[arg(long)]
        tenant: Option<String>,
    },
    /// Run one agent turn without the UI and print every commit.
    Ask {
        prompt: String,
        #[arg(long)]
        tenant: Option<String>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.or_else(default_config_path) {
        Some(path) => load_config(&path)?,
        None => Config::default(),
    };

    match cli.command.unwrap_or(Command::Tui { tenant: None }) {
        Command::Tui { tenant } => {
            let log_path = init_logging(&config.logging, LogTarget::File);
            let mut state = DashState::from_config(&config);
            if let Some(tenant) = tenant.filter(|tenant| !tenant.trim().is_empty()) {
                state.header.tenant_id = tenant.trim().into();
            }
            info!(tenant = %state.header.tenant_id, "starting dashboard");
            ui::run(state, &config, log_path.as_deref()).context("terminal UI failed")
        }
        Command::Replay { file, tenant } => {
            init_logging(&config.logging, LogTarget::Stderr);
            let tenant = tenant.unwrap_or_else(|| config.agent.tenant_id.clone());
            headless::run_replay(&file, &tenant, &mut io::stdout().lock())
        }
        Command::Ask { prompt, tenant } => {
            init_logging(&config.logging, LogTarget::Stderr);
            headless::run_ask(&config, &prompt, tenant.as_deref(), &mut io::stdout().lock())
        }
    }
}
