//! Signup command implementation.

use anyhow::{Context, Result};
use clap::Args;

use quizgate_core::SignupDetails;

use crate::commands::whoami::print_profile;
use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct SignupArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "QUIZGATE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(session: &CliSession, args: SignupArgs) -> Result<()> {
    output::note("Creating account...");

    let details = SignupDetails::new(args.name, args.email, args.password);
    let credential = session
        .gateway()
        .signup(&details)
        .await
        .context("Failed to sign up")?;

    output::success("Account created, logged in");
    println!();
    print_profile(credential.user());

    Ok(())
}
