//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use penna::Credentials;

use crate::cli::SessionArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(args: LoginArgs, session_args: &SessionArgs) -> Result<()> {
    let session = context::restore(session_args).await?;
    let credentials = Credentials::new(&args.username, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let user = session
        .login(credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::profile(&user);
    output::field("API", session.gateway().api().as_str());

    Ok(())
}
