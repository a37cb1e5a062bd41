//! hostgatectl — ask the orchestrator for permission to take hosts down.
//!
//! # Usage
//!
//! ```text
//! hostgatectl --topology topology.toml check host1 host2
//! hostgatectl --topology topology.toml --data-dir /var/lib/hostgate suspend host1
//! hostgatectl --topology topology.toml resume host1
//! hostgatectl status --application music:search --format json
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hostgate_model::ApplicationId;

mod commands;

#[derive(Parser)]
#[command(
    name = "hostgatectl",
    about = "hostgate — suspend and resume hosts without breaking service availability",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    context: ContextArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
pub struct ContextArgs {
    /// Topology file describing the applications and their services.
    #[arg(long, global = true, default_value = "topology.toml")]
    pub topology: PathBuf,

    /// Data directory holding the host status database.
    #[arg(long, global = true, default_value = "/var/lib/hostgate")]
    pub data_dir: PathBuf,

    /// Orchestrator configuration (hostgate.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate whether the hosts could be suspended, without changing anything.
    Check {
        /// Hosts of a single application.
        #[arg(required = true)]
        hosts: Vec<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Suspend the hosts, allowing them to be taken down.
    Suspend {
        #[arg(required = true)]
        hosts: Vec<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Resume suspended hosts.
    Resume {
        #[arg(required = true)]
        hosts: Vec<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the host status of every host of an application.
    Status {
        /// Application id, as tenant:application.
        #[arg(long)]
        application: ApplicationId,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hostgate=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let context = commands::Context::load(&cli.context)?;

    match cli.command {
        Command::Check { hosts, format } => commands::hosts::check(&context, &hosts, format),
        Command::Suspend { hosts, format } => {
            commands::hosts::suspend(&context, &hosts, format).await
        }
        Command::Resume { hosts, format } => {
            commands::hosts::resume(&context, &hosts, format).await
        }
        Command::Status {
            application,
            format,
        } => commands::status::status(&context, &application, format),
    }
}
