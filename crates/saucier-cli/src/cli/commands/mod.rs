pub mod auth;
pub mod config;
pub mod open;
pub mod recipes;
mod render;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use saucier_app::{AppRuntime, RunOutcome};
use saucier_core::config::{CloudKitSettings, Config};
use saucier_core::location::{BrowserNavigator, MemoryHistory};
use saucier_core::session::FileTokenStore;
use saucier_core::{AuthSession, CloudKitClient};

/// Loads config and resolves the CloudKit connection.
fn load_settings() -> Result<(Config, CloudKitSettings)> {
    let config = Config::load().context("load config")?;
    let settings = CloudKitSettings::from_config(&config)?;
    Ok((config, settings))
}

/// Boots the app at `location`: consumes any sign-in redirect parameters,
/// restores the stored session and wires the runtime.
fn boot(settings: CloudKitSettings, location: &str) -> Result<AppRuntime> {
    let history = Arc::new(MemoryHistory::parse(location)?);
    let session = AuthSession::bootstrap(FileTokenStore::default_location(), history.as_ref())
        .context("restore session")?;
    let client = CloudKitClient::new(settings, Arc::new(session));
    Ok(AppRuntime::new(
        client,
        history,
        Arc::new(BrowserNavigator::from_env()),
    ))
}

/// Runs the app until nothing is in flight.
async fn settle(runtime: &mut AppRuntime) -> Result<()> {
    match runtime.run_until_idle().await {
        RunOutcome::Idle => Ok(()),
        RunOutcome::Navigated(url) => bail!("Unexpected navigation to {url}"),
    }
}
