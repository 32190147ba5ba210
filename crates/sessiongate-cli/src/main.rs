//! sessiongate - log in, sign up and manage a session against a GraphQL
//! authentication service from the terminal.

mod app;
mod prompt;
mod shell;

use std::io;

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

const USAGE: &str = "\
Usage: sessiongate [COMMAND]

Commands:
  login [USERNAME]    Log in and store the session
  signup [USERNAME]   Create an account and store the session
  logout              Remove the stored session
  forget [USERNAME]   Delete the password remembered in the keychain
  status              Show the stored session
  shell               Interactive shell with idle logout (default)

Environment:
  SESSIONGATE_ENDPOINT   GraphQL endpoint URL
  SESSIONGATE_USERNAME   Username to pre-fill
  RUST_LOG               Log filter (default: warn)";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("shell");
    if matches!(command, "help" | "--help" | "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    info!(command, "sessiongate starting");
    let mut app = App::new()?;
    let username = args.get(2).cloned();

    match command {
        "login" => app.login_interactive(username).await,
        "signup" => app.signup_interactive(username).await,
        "logout" => {
            app.logout();
            Ok(())
        }
        "forget" => app.forget(username),
        "status" => {
            app.print_status();
            Ok(())
        }
        "shell" => shell::run(&mut app).await,
        other => {
            eprintln!("{}", USAGE);
            Err(anyhow!("Unknown command: {}", other))
        }
    }
}
