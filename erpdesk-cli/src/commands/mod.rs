pub mod completion;
pub mod config;
pub mod locations;
pub mod orders;
pub mod profile;
pub mod session;
pub mod stock;

use std::sync::Arc;

use anyhow::{Context, Result};
use client::{ApiError, ErpClient, FileStorage};
use shared::config::Config;

/// Open the stored session and build a client around it.
pub fn connect(config: &Config) -> Result<ErpClient> {
    let path = config.session.resolved_path();
    let storage = FileStorage::open(&path)
        .with_context(|| format!("failed to open session file {}", path.display()))?;
    ErpClient::new(config, Arc::new(storage)).context("failed to build API client")
}

/// Turn a client error into a user-facing one. The login hint is only
/// given once the stored session is actually gone.
pub fn report(client: &ErpClient, err: ApiError) -> anyhow::Error {
    describe(err, client.session().is_authenticated())
}

fn describe(err: ApiError, session_kept: bool) -> anyhow::Error {
    if err.requires_login() && !session_kept {
        anyhow::anyhow!("{err}. Run `erpdesk login` to sign in again")
    } else if matches!(err, ApiError::NoLocation) {
        anyhow::anyhow!("{err}. Pass a location id or log in first")
    } else {
        anyhow::Error::new(err)
    }
}
