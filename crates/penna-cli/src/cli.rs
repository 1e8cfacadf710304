//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};
use penna::RestorePolicy;
use penna::config::DEFAULT_API_URL;

use crate::commands::Commands;

/// Penna blog API session tool.
#[derive(Parser, Debug)]
#[command(name = "penna")]
#[command(author, version = env!("PENNA_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the session lives and how it is restored.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Blog API base URL
    #[arg(long, env = "PENNA_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Credential file [default: <data dir>/penna/credentials.json]
    #[arg(long, env = "PENNA_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// What to do with an expired access token at startup: refresh | local-expiry
    #[arg(long, default_value = "refresh", global = true)]
    pub restore_policy: RestorePolicy,
}
