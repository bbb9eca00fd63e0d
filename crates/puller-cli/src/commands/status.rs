use puller_core::StateLayout;

use crate::output::{kv, timestamp};
use crate::paths::open_updater;

pub fn run(layout: StateLayout) -> anyhow::Result<()> {
    let updater = open_updater(layout)?;
    let status = updater.status();

    let repo = status
        .repo
        .as_ref()
        .map(|r| r.full_name())
        .unwrap_or_else(|| "not configured".to_string());
    println!("{}", kv("repository", &repo));
    println!("{}", kv("branch", &status.branch));
    if !status.theme_path.is_empty() {
        println!("{}", kv("theme path", &status.theme_path));
    }
    println!("{}", kv("theme dir", &status.theme_dir.display().to_string()));
    println!(
        "{}",
        kv(
            "current commit",
            status.short_commit.as_deref().unwrap_or("none (first install pending)"),
        )
    );
    println!("{}", kv("last check", &timestamp(status.last_check)));
    println!("{}", kv("auto-update", if status.auto_update { "on" } else { "off" }));
    println!(
        "{}",
        kv(
            "webhook",
            if status.webhook_configured { "secret configured" } else { "no secret" },
        )
    );
    Ok(())
}
