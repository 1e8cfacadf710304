//! Whoami command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::cli::SessionArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub async fn run(_args: WhoamiArgs, session_args: &SessionArgs) -> Result<()> {
    let session = context::require_session(session_args).await?;
    let user = session.user().context("Session has no profile")?;

    output::profile(&user);
    output::field("API", session.gateway().api().as_str());

    if let Some(claims) = session
        .access_claims()
        .context("Stored access token is invalid")?
    {
        output::field("Token expires", &format_expiry(claims.exp, Utc::now()));
    }

    Ok(())
}

fn format_expiry(exp: i64, now: DateTime<Utc>) -> String {
    let Some(at) = DateTime::<Utc>::from_timestamp(exp, 0) else {
        return exp.to_string();
    };
    let remaining = at.signed_duration_since(now);
    if remaining.num_seconds() <= 0 {
        format!("{} (expired)", at.to_rfc3339())
    } else {
        format!("{} (in {}m)", at.to_rfc3339(), remaining.num_minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_formatting() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            format_expiry(1_700_000_000 + 600, now),
            "2023-11-14T22:23:20+00:00 (in 10m)"
        );
        assert!(format_expiry(1_700_000_000, now).ends_with("(expired)"));
    }
}
