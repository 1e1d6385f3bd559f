use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zbus::Connection;

use bubblejail_manager::instances::InstanceStore;
use bubblejail_manager::service::register_manager_interface;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let store = InstanceStore::from_env().context("Failed to locate instance directories")?;
    info!(data_dirs = ?store.data_dirs(), "Serving instances");

    let connection = Connection::session()
        .await
        .context("Failed to connect to the session bus")?;
    register_manager_interface(&connection, store).await?;

    signal::ctrl_c().await?;
    info!("Shutdown requested");

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
