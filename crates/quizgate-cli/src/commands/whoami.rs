//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use quizgate_core::UserProfile;

use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Fetch the profile from the server instead of the stored copy
    #[arg(long)]
    pub remote: bool,

    /// Print the profile as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(session: &CliSession, args: WhoamiArgs) -> Result<()> {
    let user = if args.remote {
        session.require_login().await?;
        session
            .gateway()
            .fetch_user()
            .await
            .context("Failed to fetch profile")?
    } else {
        session
            .gateway()
            .current_user()
            .context("Not logged in. Run 'quizgate login' first.")?
    };

    if args.json {
        return output::json_pretty(&user);
    }

    print_profile(&user);
    if let Some(expires_at) = session.gateway().credential().and_then(|c| c.expires_at()) {
        output::field("Token expires", &expires_at.to_rfc3339());
    }

    Ok(())
}

pub fn print_profile(user: &UserProfile) {
    output::field("Name", &user.name);
    output::field("Email", &user.email);
    output::field("Id", &user.id_string());
    if let Some(role) = &user.role {
        output::field("Role", role);
    }
}
