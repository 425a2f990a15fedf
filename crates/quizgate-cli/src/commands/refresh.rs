//! Refresh command implementation.

use anyhow::{Result, bail};
use clap::Args;

use quizgate_session::RefreshOutcome;

use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(session: &CliSession, _args: RefreshArgs) -> Result<()> {
    let gateway = session.gateway();
    if !gateway.is_authenticated() {
        bail!("Not logged in. Run 'quizgate login' first.");
    }

    output::note("Refreshing session...");

    match gateway.refresh_shared().await {
        RefreshOutcome::Refreshed(credential) => {
            output::success("Session refreshed successfully");
            if let Some(expires_at) = credential.expires_at() {
                output::field("Token expires", &expires_at.to_rfc3339());
            }
            Ok(())
        }
        RefreshOutcome::LogoutRequired => {
            gateway.logout();
            bail!("Session expired, please log in again");
        }
    }
}
