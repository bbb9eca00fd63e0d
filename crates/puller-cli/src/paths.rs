use std::path::PathBuf;

use puller_core::StateLayout;
use puller_sync::Updater;

/// Resolve the state directory: explicit flag, then `PULLER_HOME`, then the
/// platform data directory.
pub fn state_layout(flag: Option<PathBuf>) -> anyhow::Result<StateLayout> {
    let root = if let Some(dir) = flag {
        dir
    } else if let Ok(home) = std::env::var("PULLER_HOME") {
        PathBuf::from(home)
    } else {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot determine a data directory; pass --state-dir"))?
            .join("puller")
    };
    Ok(StateLayout::new(&root))
}

pub fn open_updater(layout: StateLayout) -> anyhow::Result<Updater> {
    if !layout.is_initialized() {
        anyhow::bail!(
            "not initialized (no config at {}); run `puller init` first",
            layout.config_file().display()
        );
    }
    Ok(Updater::open(layout)?)
}
