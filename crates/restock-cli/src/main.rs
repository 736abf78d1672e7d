mod cmd_config;
mod cmd_history;
mod cmd_mail;
mod cmd_notify;
mod cmd_run;
mod cmd_targets;
mod cmd_tasks;

use clap::{Parser, Subcommand};
use restock_store::StorePaths;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "restock",
    version,
    about = "Watch a storefront's restock listing and buy targets"
)]
struct Cli {
    /// Data directory (default: $RESTOCK_DATA_DIR or the per-user data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attach to the browser and run rounds until Ctrl-C
    Run {
        /// WebDriver endpoint (overrides `webdriver_url`)
        #[arg(long)]
        webdriver: Option<String>,
        /// Run a single round and exit
        #[arg(long)]
        once: bool,
    },
    /// Manage the watch-list
    Targets {
        #[command(subcommand)]
        cmd: cmd_targets::TargetsCmd,
    },
    /// Manage scheduled purchase tasks
    Tasks {
        #[command(subcommand)]
        cmd: cmd_tasks::TasksCmd,
    },
    /// Show today's matched purchases
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mail addressing used for notifications
    Mail {
        #[command(subcommand)]
        cmd: cmd_mail::MailCmd,
    },
    /// Read or change agent settings in config.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Notification channels
    Notify {
        #[command(subcommand)]
        cmd: cmd_notify::NotifyCmd,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = StorePaths::resolve(cli.data_dir.as_deref());
    paths.ensure_layout()?;

    match cli.cmd {
        Command::Run { webdriver, once } => cmd_run::execute(&paths, webdriver, once),
        Command::Targets { cmd } => cmd_targets::run(cmd, &paths),
        Command::Tasks { cmd } => cmd_tasks::run(cmd, &paths),
        Command::History { json } => cmd_history::execute(&paths, json),
        Command::Mail { cmd } => cmd_mail::run(cmd, &paths),
        Command::Config { cmd } => cmd_config::run(cmd, &paths),
        Command::Notify { cmd } => cmd_notify::run(cmd, &paths),
    }
}
