//! Refresh token command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use crate::cli::SessionArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs, session_args: &SessionArgs) -> Result<()> {
    let session = context::open(session_args)?;

    eprintln!("{}", "Refreshing access token...".dimmed());

    let token = session
        .gateway()
        .refresh()
        .await
        .context("Failed to refresh session")?;

    output::success("Access token refreshed");
    if let Ok(claims) = penna::auth::decode(token.as_str()) {
        let remaining = claims.expires_in(Utc::now().timestamp());
        output::field("Expires in", &format!("{}s", remaining));
    }

    Ok(())
}
