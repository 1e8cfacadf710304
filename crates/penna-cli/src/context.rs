//! Builds a session manager from the global arguments.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use penna::{ApiUrl, Config, FileStore, SessionManager, SessionStatus};

use crate::cli::SessionArgs;

/// Default credential file under the platform data directory.
fn default_store_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "penna").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("credentials.json"))
}

/// Resolve the credential file path.
fn store_path(args: &SessionArgs) -> Result<PathBuf> {
    match &args.store {
        Some(path) => Ok(path.clone()),
        None => default_store_path(),
    }
}

/// Open a session manager without restoring it.
pub fn open(args: &SessionArgs) -> Result<SessionManager> {
    let api_url = ApiUrl::new(&args.api_url).context("Invalid API URL")?;
    let config = Config::new(api_url).with_restore_policy(args.restore_policy);
    let path = store_path(args)?;
    debug!(store = %path.display(), "Opening session");

    SessionManager::new(config, Arc::new(FileStore::new(&path)))
        .context("Failed to create HTTP client")
}

/// Open a session manager and restore the stored session.
pub async fn restore(args: &SessionArgs) -> Result<SessionManager> {
    let session = open(args)?;
    session.restore().await;
    Ok(session)
}

/// Open and restore, failing unless a user is signed in.
pub async fn require_session(args: &SessionArgs) -> Result<SessionManager> {
    let session = restore(args).await?;
    if session.status() != SessionStatus::Authenticated {
        let reason = session
            .error()
            .map(|e| format!(" ({})", e.message))
            .unwrap_or_default();
        anyhow::bail!("No active session{}. Run 'penna login' first.", reason);
    }
    Ok(session)
}
