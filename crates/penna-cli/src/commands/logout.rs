//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::SessionArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(_args: LogoutArgs, session_args: &SessionArgs) -> Result<()> {
    let session = context::open(session_args)?;
    session.logout();

    output::success("Logged out");
    Ok(())
}
