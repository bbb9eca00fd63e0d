use puller_core::activity::LogSource;
use puller_core::StateLayout;

use crate::paths::open_updater;

pub async fn run(layout: StateLayout) -> anyhow::Result<()> {
    let updater = open_updater(layout)?;
    let outcome = updater.update(LogSource::Manual).await?;

    println!(
        "Updated {} to {} ({})",
        outcome.theme_name, outcome.commit.short_sha, outcome.commit.message.lines().next().unwrap_or("")
    );
    match outcome.snapshot {
        Some(snapshot) => println!("Snapshot taken: {} ({})", snapshot.name, snapshot.size_display()),
        None => println!("First install; no snapshot taken."),
    }
    Ok(())
}
