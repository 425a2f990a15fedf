//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use quizgate_core::LoginCredentials;

use crate::commands::whoami::print_profile;
use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "QUIZGATE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(session: &CliSession, args: LoginArgs) -> Result<()> {
    output::note("Logging in...");

    let credential = session
        .gateway()
        .login(&LoginCredentials::new(args.email, args.password))
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    print_profile(credential.user());

    Ok(())
}
