use std::path::PathBuf;

use clap::{Args, Subcommand};
use puller_core::StateLayout;
use puller_sync::SettingsPatch;

use crate::output::kv;
use crate::paths::open_updater;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the current configuration (token masked)
    Show,
    /// Change configuration values
    Set {
        /// Repository URL or owner/repo shorthand
        #[arg(long)]
        repo_url: Option<String>,
        /// Branch to track
        #[arg(long)]
        branch: Option<String>,
        /// Subpath inside the repository holding the theme
        #[arg(long)]
        theme_path: Option<String>,
        /// Live theme directory
        #[arg(long)]
        theme_dir: Option<PathBuf>,
        /// Personal access token (pass an empty string to clear)
        #[arg(long)]
        token: Option<String>,
        /// Apply webhook pushes automatically
        #[arg(long)]
        auto_update: Option<bool>,
        /// Snapshots to keep (1-10)
        #[arg(long)]
        retention: Option<u32>,
    },
}

pub fn run(args: ConfigArgs, layout: StateLayout) -> anyhow::Result<()> {
    let updater = open_updater(layout)?;
    match args.command {
        ConfigCommand::Show => {
            let config = updater.config();
            let token = puller_crypto::token::decrypt_token(&config.encryption_key, &config.token)?;
            println!("{}", kv("repo_url", &config.repo_url));
            println!("{}", kv("branch", &config.branch));
            println!("{}", kv("theme_path", &config.theme_path));
            println!("{}", kv("theme_dir", &config.theme_dir.display().to_string()));
            println!("{}", kv("token", &puller_crypto::token::mask_token(&token)));
            println!("{}", kv("auto_update", &config.auto_update.to_string()));
            println!("{}", kv("retention", &config.snapshot_retention.to_string()));
            Ok(())
        }
        ConfigCommand::Set {
            repo_url,
            branch,
            theme_path,
            theme_dir,
            token,
            auto_update,
            retention,
        } => {
            let patch = SettingsPatch {
                repo_url,
                branch,
                theme_path,
                theme_dir,
                token,
                auto_update,
                snapshot_retention: retention,
            };
            updater.apply_settings(patch)?;
            println!("Settings saved.");
            Ok(())
        }
    }
}
