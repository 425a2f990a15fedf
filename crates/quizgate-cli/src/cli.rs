//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use quizgate_core::ApiUrl;

use crate::commands::{exam, login, logout, refresh, signup, whoami};

/// Command-line client for the quiz portal.
#[derive(Parser, Debug)]
#[command(name = "quizgate")]
#[command(author, version = env!("QUIZGATE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Base URL of the portal API
    #[arg(
        long,
        env = "QUIZGATE_API_URL",
        default_value = "http://127.0.0.1:8000",
        global = true
    )]
    pub api_url: ApiUrl,

    /// Directory holding the stored login (defaults to the user data dir)
    #[arg(long, env = "QUIZGATE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password
    Login(login::LoginArgs),

    /// Create an account and log in
    Signup(signup::SignupArgs),

    /// Show the logged-in user
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new access token
    Refresh(refresh::RefreshArgs),

    /// Forget the stored login
    Logout(logout::LogoutArgs),

    /// Exam operations
    Exam(exam::ExamCommand),
}
