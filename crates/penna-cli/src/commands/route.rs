//! Route command implementation.

use anyhow::Result;
use clap::Args;

use penna::{Access, Decision, RouteGate};

use crate::cli::SessionArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Front-end path, e.g. /blogs/42/edit
    pub path: String,
}

pub async fn run(args: RouteArgs, session_args: &SessionArgs) -> Result<()> {
    let session = context::restore(session_args).await?;
    let gate = RouteGate::blog();

    let access = match gate.access_for(&args.path) {
        Access::Public => "public",
        Access::Protected => "protected",
    };
    output::field("Route", &args.path);
    output::field("Access", access);

    match gate.check(&args.path, session.status()) {
        Decision::Allow => output::success("Allow"),
        Decision::Wait => output::field("Decision", "wait"),
        Decision::RedirectTo(target) => output::error(&format!("Redirect to {}", target)),
    }

    Ok(())
}
