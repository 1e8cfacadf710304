//! Subcommand implementations.

mod call;
mod login;
mod logout;
mod refresh_token;
mod register;
mod route;
mod update_profile;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::SessionArgs;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login(login::LoginArgs),

    /// Create an account and log in with it
    Register(register::RegisterArgs),

    /// End the session and clear stored credentials
    Logout(logout::LogoutArgs),

    /// Display the active session
    Whoami(whoami::WhoamiArgs),

    /// Mint a new access token from the stored refresh token
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Update the signed-in user's profile
    UpdateProfile(update_profile::UpdateProfileArgs),

    /// Show whether a front-end route may render in the current session
    Route(route::RouteArgs),

    /// Make an authenticated API call and print the JSON response
    Call(call::CallArgs),
}

pub async fn handle(cmd: Commands, session: &SessionArgs) -> Result<()> {
    match cmd {
        Commands::Login(args) => login::run(args, session).await,
        Commands::Register(args) => register::run(args, session).await,
        Commands::Logout(args) => logout::run(args, session),
        Commands::Whoami(args) => whoami::run(args, session).await,
        Commands::RefreshToken(args) => refresh_token::run(args, session).await,
        Commands::UpdateProfile(args) => update_profile::run(args, session).await,
        Commands::Route(args) => route::run(args, session).await,
        Commands::Call(args) => call::run(args, session).await,
    }
}
