pub mod check;
pub mod config;
pub mod init;
pub mod log;
pub mod secret;
pub mod serve;
pub mod snapshot;
pub mod status;
pub mod uninstall;
pub mod update;

use clap::Subcommand;
use puller_core::StateLayout;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the state directory with a default configuration
    Init(init::InitArgs),
    /// Show the sync status
    Status,
    /// Show or change configuration
    Config(config::ConfigArgs),
    /// Test the connection to the configured (or given) repository
    Test(test::TestArgs),
    /// Check whether an update is available
    Check,
    /// Pull the latest commit and replace the live theme
    Update,
    /// Manage theme snapshots
    Snapshot(snapshot::SnapshotArgs),
    /// Show or clear the activity log
    Log(log::LogArgs),
    /// Manage the webhook secret
    Secret(secret::SecretArgs),
    /// Run the webhook gateway
    Serve(serve::ServeArgs),
    /// Remove configuration and the activity log (snapshots are kept)
    Uninstall(uninstall::UninstallArgs),
}

impl Commands {
    pub async fn run(self, layout: StateLayout) -> anyhow::Result<()> {
        match self {
            Commands::Init(args) => init::run(args, layout),
            Commands::Status => status::run(layout),
            Commands::Config(args) => config::run(args, layout),
            Commands::Test(args) => test::run(args, layout).await,
            Commands::Check => check::run(layout).await,
            Commands::Update => update::run(layout).await,
            Commands::Snapshot(args) => snapshot::run(args, layout),
            Commands::Log(args) => log::run(args, layout),
            Commands::Secret(args) => secret::run(args, layout),
            Commands::Serve(args) => serve::run(args, layout).await,
            Commands::Uninstall(args) => uninstall::run(args, layout),
        }
    }
}
