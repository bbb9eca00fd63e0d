use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod paths;

use commands::Commands;

#[derive(Parser)]
#[command(name = "puller", version, about = "Keeps a deployed theme directory in sync with a GitHub branch")]
struct Cli {
    /// State directory (defaults to $PULLER_HOME or the platform data dir)
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let layout = paths::state_layout(cli.state_dir)?;
    cli.command.run(layout).await
}
