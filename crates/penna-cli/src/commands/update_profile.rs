//! Update profile command implementation.

use anyhow::{Context, Result};
use clap::Args;

use penna::ProfileUpdate;

use crate::cli::SessionArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct UpdateProfileArgs {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,
}

pub async fn run(args: UpdateProfileArgs, session_args: &SessionArgs) -> Result<()> {
    let update = ProfileUpdate {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
    };
    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass --first-name, --last-name or --email.");
    }

    let session = context::require_session(session_args).await?;
    let user = session
        .update_profile(&update)
        .await
        .context("Failed to update profile")?;

    output::success("Profile updated");
    println!();
    output::profile(&user);

    Ok(())
}
