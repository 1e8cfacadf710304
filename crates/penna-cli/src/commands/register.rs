//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use penna::Registration;

use crate::cli::SessionArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username, 3 to 30 characters
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// At least 8 characters with lower and upper case letters, a digit and
    /// one of !@#$%^&*
    #[arg(long)]
    pub password: String,

    /// Repeat the password
    #[arg(long)]
    pub password_confirmation: String,
}

pub async fn run(args: RegisterArgs, session_args: &SessionArgs) -> Result<()> {
    let session = context::restore(session_args).await?;
    let registration = Registration {
        username: args.username,
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        password: args.password,
        password_confirmation: args.password_confirmation,
    };

    eprintln!("{}", "Creating account...".dimmed());

    let user = session
        .register(registration)
        .await
        .context("Failed to register")?;

    output::success("Account created and logged in");
    println!();
    output::profile(&user);

    Ok(())
}
