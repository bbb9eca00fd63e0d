use clap::Args;
use puller_core::StateLayout;

#[derive(Args)]
pub struct UninstallArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    yes: bool,
}

/// Removes configuration, the activity log and the update lock. Snapshots
/// and the live theme directory are deliberately left in place.
pub fn run(args: UninstallArgs, layout: StateLayout) -> anyhow::Result<()> {
    if !layout.is_initialized() {
        println!("Nothing to remove at {}.", layout.root().display());
        return Ok(());
    }

    if !args.yes {
        anyhow::bail!("pass --yes to confirm removing puller state (snapshots are kept)");
    }

    for path in [layout.config_file(), layout.activity_file(), layout.lock_file()] {
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
    }
    if layout.tmp_dir().exists() {
        std::fs::remove_dir_all(layout.tmp_dir())?;
    }

    println!("Removed puller configuration and activity log.");
    println!("Snapshots remain in {}.", layout.snapshots_dir().display());
    Ok(())
}
