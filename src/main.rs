use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zbus::ConnectionBuilder;

use bubblejail_config::app::{ConfigApp, TextListView, APPLICATION_ID};
use bubblejail_config::config::Config;
use bubblejail_config::icons::DesktopEntryIcons;
use bubblejail_config::presenter::ListPresenter;
use bubblejail_config::{InstanceDirectory, SessionBus};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let (locales, fallback_icon) =
        Config::with(|config| (config.locales.clone(), config.fallback_icon.clone()));

    // Owning the application id keeps a single instance per session. Without a
    // bus the directory reports the failure itself on activation.
    let connector = match claim_application_id().await {
        Ok(connection) => SessionBus::with_connection(connection),
        Err(zbus::Error::NameTaken) => {
            info!(name = APPLICATION_ID, "Already running in this session");
            return Ok(());
        }
        Err(err) => {
            warn!(%err, "Could not claim application id");
            SessionBus::new()
        }
    };

    let presenter =
        ListPresenter::with_fallback_icon(DesktopEntryIcons::new(locales), fallback_icon);
    let mut app = ConfigApp::new(
        InstanceDirectory::new(connector),
        presenter,
        TextListView::new(std::io::stdout()),
    );

    app.activate().await;
    app.view_mut()
        .flush()
        .context("Failed to write the instance list")?;

    Ok(())
}

async fn claim_application_id() -> zbus::Result<zbus::Connection> {
    ConnectionBuilder::session()?
        .name(APPLICATION_ID)?
        .build()
        .await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
