//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(session: &CliSession, _args: LogoutArgs) -> Result<()> {
    let gateway = session.gateway();
    if !gateway.is_authenticated() {
        output::note("Not logged in");
        return Ok(());
    }

    gateway.logout();
    output::success("Logged out");
    Ok(())
}
