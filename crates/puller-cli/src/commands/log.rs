use clap::{Args, Subcommand};
use puller_core::StateLayout;

use crate::paths::open_updater;

#[derive(Args)]
pub struct LogArgs {
    #[command(subcommand)]
    command: Option<LogCommand>,
}

#[derive(Subcommand)]
enum LogCommand {
    /// Show recent activity (default)
    Show {
        /// Number of entries
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Clear the activity log
    Clear,
}

pub fn run(args: LogArgs, layout: StateLayout) -> anyhow::Result<()> {
    let updater = open_updater(layout)?;
    match args.command.unwrap_or(LogCommand::Show { count: 10 }) {
        LogCommand::Show { count } => {
            let entries = updater.recent_log(count);
            if entries.is_empty() {
                println!("Activity log is empty.");
                return Ok(());
            }
            for entry in entries {
                println!(
                    "{}  [{:7}] [{:7}] {}",
                    entry.datetime,
                    entry.status.to_string(),
                    entry.source.to_string(),
                    entry.message
                );
            }
            Ok(())
        }
        LogCommand::Clear => {
            updater.clear_log()?;
            println!("Activity log cleared.");
            Ok(())
        }
    }
}
