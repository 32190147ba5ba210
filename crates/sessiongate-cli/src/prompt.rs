//! Blocking terminal prompts.

use std::io::{self, Write};

use anyhow::Result;

/// Read one line from stdin. `None` at end of input.
pub fn read_line() -> Result<Option<String>> {
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
}

/// Ask for a username, offering `default` when non-empty.
pub fn username(default: &str) -> Result<String> {
    if default.is_empty() {
        print!("Username: ");
    } else {
        print!("Username [{}]: ", default);
    }
    io::stdout().flush()?;

    let input = read_line()?.unwrap_or_default();
    Ok(or_default(&input, default))
}

pub fn password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(label)?;
    Ok(password)
}

/// Yes/no question defaulting to yes.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{} [Y/n]: ", question);
    io::stdout().flush()?;
    Ok(is_yes(&read_line()?.unwrap_or_default()))
}

fn or_default(input: &str, default: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        default.to_string()
    } else {
        input.to_string()
    }
}

fn is_yes(input: &str) -> bool {
    input.trim().to_lowercase() != "n"
}
