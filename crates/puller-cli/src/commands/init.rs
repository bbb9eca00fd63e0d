use std::path::PathBuf;

use clap::Args;
use puller_core::{Config, StateLayout};

#[derive(Args)]
pub struct InitArgs {
    /// Repository URL or owner/repo shorthand
    #[arg(long)]
    repo_url: Option<String>,
    /// Branch to track
    #[arg(long, default_value = "main")]
    branch: String,
    /// Live theme directory to keep in sync
    #[arg(long)]
    theme_dir: Option<PathBuf>,
}

pub fn run(args: InitArgs, layout: StateLayout) -> anyhow::Result<()> {
    if layout.is_initialized() {
        anyhow::bail!("already initialized at {}", layout.root().display());
    }

    let mut config = Config::default();
    config.repo_url = args.repo_url.unwrap_or_default();
    config.branch = args.branch;
    config.theme_dir = args.theme_dir.unwrap_or_default();
    config.encryption_key = puller_crypto::webhook::generate_secret();
    config.webhook_secret = puller_crypto::webhook::generate_secret();

    layout.create_dirs()?;
    config.save(&layout)?;

    println!("Initialized puller state in {}", layout.root().display());
    println!("Webhook secret: {}", config.webhook_secret);
    println!("Configure the repository with `puller config set` if you haven't.");
    Ok(())
}
