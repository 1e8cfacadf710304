//! Call command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use penna::{ApiRequest, Method};

use crate::cli::SessionArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct CallArgs {
    /// HTTP method
    pub method: String,

    /// Path relative to the API base URL, e.g. blogs/
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,

    /// Send without the stored access token
    #[arg(long)]
    pub anonymous: bool,
}

pub async fn run(args: CallArgs, session_args: &SessionArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{}'", args.method))?;

    let mut request = ApiRequest::new(method, args.path);
    if let Some(data) = &args.data {
        let body: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.json_value(body);
    }
    if args.anonymous {
        request = request.anonymous();
    }

    let session = context::restore(session_args).await?;

    let response: Option<Value> = session
        .gateway()
        .call_optional(request)
        .await
        .context("Request failed")?;
    match response {
        Some(body) => output::json_pretty(&body)?,
        None => output::success("No content"),
    }

    Ok(())
}
