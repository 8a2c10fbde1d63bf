mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    area::AreaSubcommand, config::ConfigSubcommand, order::OrderSubcommand,
    timer::TimerSubcommand, Overrides,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ordenes",
    about = "Multi-area work orders with per-area state machines and SLA tracking",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data directory holding ordenes.yaml and ordenes.redb (default: auto-detect)
    #[arg(long, global = true, env = "ORDENES_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Override timer.n_seg (seconds between periodic ticks)
    #[arg(long = "n-seg", global = true)]
    n_seg: Option<u64>,

    /// Override timer.sla_seg (active seconds before an area is overdue)
    #[arg(long = "sla-seg", global = true)]
    sla_seg: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the periodic SLA timer until Ctrl-C
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,
    },

    /// Run one SLA timer tick now
    Tick,

    /// Create, inspect and move work orders
    Order {
        #[command(subcommand)]
        subcommand: OrderSubcommand,
    },

    /// Manage the area catalog
    Area {
        #[command(subcommand)]
        subcommand: AreaSubcommand,
    },

    /// Show order KPIs
    Kpis,

    /// Inspect the SLA timer
    Timer {
        #[command(subcommand)]
        subcommand: TimerSubcommand,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let overrides = Overrides {
        n_seg: cli.n_seg,
        sla_seg: cli.sla_seg,
    };

    let result = match cli.command {
        Commands::Serve { port, host } => cmd::serve::run(&root, &overrides, port, host),
        Commands::Tick => cmd::tick::run(&root, &overrides, cli.json),
        Commands::Order { subcommand } => cmd::order::run(&root, subcommand, cli.json),
        Commands::Area { subcommand } => cmd::area::run(&root, subcommand, cli.json),
        Commands::Kpis => cmd::kpis::run(&root, cli.json),
        Commands::Timer { subcommand } => cmd::timer::run(&root, &overrides, subcommand, cli.json),
        Commands::Config { subcommand } => {
            cmd::config::run(&root, &overrides, subcommand, cli.json)
        }
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
