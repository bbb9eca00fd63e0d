use puller_core::StateLayout;

use crate::paths::open_updater;

pub async fn run(layout: StateLayout) -> anyhow::Result<()> {
    let updater = open_updater(layout)?;
    let outcome = updater.check_for_updates().await?;

    println!(
        "Latest commit on branch: {} ({})",
        outcome.latest_commit.short_sha, outcome.latest_commit.author
    );
    if outcome.is_first_install {
        println!("No commit installed yet; run `puller update` to install.");
    } else if outcome.update_available {
        println!(
            "Update available: {} -> {}",
            outcome.current_commit.as_deref().unwrap_or("?"),
            outcome.latest_commit.sha
        );
    } else {
        println!("Theme is up to date.");
    }
    Ok(())
}
