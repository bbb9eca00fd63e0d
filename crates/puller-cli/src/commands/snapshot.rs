use chrono::{DateTime, Local};
use clap::{Args, Subcommand};
use puller_core::StateLayout;

use crate::paths::open_updater;

#[derive(Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    command: SnapshotCommand,
}

#[derive(Subcommand)]
enum SnapshotCommand {
    /// List snapshots, newest first
    List,
    /// Replace the live theme with a snapshot
    Restore {
        /// Snapshot name as shown by `snapshot list`
        name: String,
    },
    /// Delete a snapshot
    Delete {
        /// Snapshot name as shown by `snapshot list`
        name: String,
    },
}

pub fn run(args: SnapshotArgs, layout: StateLayout) -> anyhow::Result<()> {
    let updater = open_updater(layout)?;
    match args.command {
        SnapshotCommand::List => {
            let snapshots = updater.list_snapshots()?;
            if snapshots.is_empty() {
                println!("No snapshots.");
                return Ok(());
            }
            for snap in snapshots {
                let created: DateTime<Local> = snap.created_at.into();
                println!(
                    "{}  {}  {}",
                    snap.name,
                    created.format("%Y-%m-%d %H:%M:%S"),
                    snap.size_display()
                );
            }
            Ok(())
        }
        SnapshotCommand::Restore { name } => {
            updater.restore_snapshot(&name)?;
            println!("Restored theme from snapshot {name}.");
            Ok(())
        }
        SnapshotCommand::Delete { name } => {
            updater.delete_snapshot(&name)?;
            println!("Deleted snapshot {name}.");
            Ok(())
        }
    }
}
