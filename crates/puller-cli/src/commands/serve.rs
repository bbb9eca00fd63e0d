use std::net::SocketAddr;
use std::sync::Arc;

use clap::Args;
use puller_core::StateLayout;

use crate::paths::open_updater;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:8787")]
    addr: SocketAddr,
}

pub async fn run(args: ServeArgs, layout: StateLayout) -> anyhow::Result<()> {
    let updater = Arc::new(open_updater(layout)?);
    if updater.config().webhook_secret.is_empty() {
        anyhow::bail!("no webhook secret configured; run `puller secret regenerate` first");
    }
    println!("Webhook endpoint: http://{}/webhook", args.addr);
    puller_sync::webhook::serve(updater, args.addr).await?;
    Ok(())
}
