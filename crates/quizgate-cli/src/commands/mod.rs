//! Subcommand implementations.

pub mod exam;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod signup;
pub mod whoami;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::session::CliSession;

pub async fn handle(cli: Cli) -> Result<()> {
    let session = CliSession::open(&cli.api_url, cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Login(args) => login::run(&session, args).await,
        Commands::Signup(args) => signup::run(&session, args).await,
        Commands::Whoami(args) => whoami::run(&session, args).await,
        Commands::Refresh(args) => refresh::run(&session, args).await,
        Commands::Logout(args) => logout::run(&session, args),
        Commands::Exam(cmd) => exam::handle(&session, cmd).await,
    }
}
