//! Interactive shell with the idle timer running.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use sessiongate_core::IdleTimer;

use crate::app::App;
use crate::prompt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Login,
    Signup,
    Toggle,
    Status,
    Logout,
    Forget(Option<String>),
    Help,
    Quit,
}

impl Command {
    fn parse(input: &str) -> Result<Option<Self>, String> {
        let mut words = input.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let argument = words.next().map(str::to_string);

        let command = match name.to_lowercase().as_str() {
            "login" => Command::Login,
            "signup" => Command::Signup,
            "toggle" => Command::Toggle,
            "status" | "whoami" => Command::Status,
            "logout" => Command::Logout,
            "forget" => Command::Forget(argument),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command: {}. Type `help` for a list.", other)),
        };
        Ok(Some(command))
    }
}

const HELP: &str = "\
Commands:
  login    Log in with username and password
  signup   Create an account
  toggle   Switch between the login and signup forms
  status   Show the current session
  logout   End the current session
  forget   Delete a remembered password (forget [USERNAME])
  help     Show this help
  quit     Leave the shell";

pub async fn run(app: &mut App) -> Result<()> {
    let timer = IdleTimer::spawn(Arc::clone(&app.store), app.config.idle_timeout());

    println!("{}\n", HELP);

    let mut was_logged_in = app.store.is_logged_in();
    loop {
        let who = app
            .store
            .current()
            .map(|s| s.username().to_string())
            .unwrap_or_else(|| "anonymous".to_string());
        print!("[{}] {}> ", app.flow.mode(), who);
        io::stdout().flush()?;

        // Read on the blocking pool so the idle timer keeps running meanwhile
        let line = tokio::task::spawn_blocking(prompt::read_line).await??;
        let Some(line) = line else {
            break;
        };
        if ended_while_waiting(was_logged_in, app.store.is_logged_in()) {
            println!("Session ended after inactivity.");
        }
        timer.touch();

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        debug!(?command, "Shell command");

        match command {
            Command::Login => report(app.login_interactive(None).await),
            Command::Signup => report(app.signup_interactive(None).await),
            Command::Toggle => {
                app.flow.toggle_view();
                println!("Switched to {}.", app.flow.mode());
            }
            Command::Status => app.print_status(),
            Command::Logout => app.logout(),
            Command::Forget(username) => report(app.forget(username)),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
        // Typing into a form counts as activity too
        timer.touch();
        was_logged_in = app.store.is_logged_in();
    }

    timer.stop();
    Ok(())
}

/// Between two commands only the idle timer removes the session, so a
/// session gone while the prompt waited ended through inactivity.
fn ended_while_waiting(was_logged_in: bool, logged_in: bool) -> bool {
    was_logged_in && !logged_in
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        println!("Error: {}\n", e);
    }
}
