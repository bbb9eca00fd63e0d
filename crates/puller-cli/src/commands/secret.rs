use clap::{Args, Subcommand};
use puller_core::StateLayout;

use crate::paths::open_updater;

#[derive(Args)]
pub struct SecretArgs {
    #[command(subcommand)]
    command: SecretCommand,
}

#[derive(Subcommand)]
enum SecretCommand {
    /// Print the current webhook secret
    Show,
    /// Rotate the webhook secret
    Regenerate,
}

pub fn run(args: SecretArgs, layout: StateLayout) -> anyhow::Result<()> {
    let updater = open_updater(layout)?;
    match args.command {
        SecretCommand::Show => {
            let secret = updater.config().webhook_secret;
            if secret.is_empty() {
                println!("No webhook secret configured; run `puller secret regenerate`.");
            } else {
                println!("{secret}");
            }
            Ok(())
        }
        SecretCommand::Regenerate => {
            let secret = updater.regenerate_secret()?;
            println!("New webhook secret: {secret}");
            println!("Update the webhook configuration on GitHub to match.");
            Ok(())
        }
    }
}
