//! Application state for the sessiongate shell.
//!
//! `App` wires the shared session store to its on-disk copy, the GraphQL
//! client, the keychain and one submission flow, and drives the flow from
//! terminal prompts.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use sessiongate_core::{
    Config, CredentialStore, GraphQlClient, SessionFile, SessionStore, SubmissionFlow, ViewMode,
};

use crate::prompt;

pub struct App {
    pub config: Config,
    pub store: Arc<SessionStore>,
    pub api: GraphQlClient,
    pub credentials: CredentialStore,
    pub flow: SubmissionFlow,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        });

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let store = Arc::new(SessionStore::new());
        let session_file = SessionFile::new(cache_dir);
        match session_file.restore_into(&store) {
            Ok(restored) => debug!(restored, "Session file checked"),
            Err(e) => warn!(error = %e, "Failed to restore session"),
        }
        // Attach after restoring so the restore itself is not written back
        session_file.attach(&store);

        let endpoint = config.endpoint();
        info!(endpoint = %endpoint, "Using GraphQL endpoint");
        let api = GraphQlClient::new(&endpoint)?;
        let credentials = CredentialStore::for_endpoint(&endpoint);

        let mut flow = SubmissionFlow::new(Arc::clone(&store), config.default_view())
            .with_boxed_policy(config.password_policy())
            .on_success(|session| {
                info!(username = %session.username(), "Authenticated");
            });
        if let Some(username) = config.initial_username() {
            flow.set_username(username);
        }

        Ok(Self {
            config,
            store,
            api,
            credentials,
            flow,
        })
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub async fn login_interactive(&mut self, username: Option<String>) -> Result<()> {
        self.flow.set_view(ViewMode::Login);
        self.run_form(username).await
    }

    pub async fn signup_interactive(&mut self, username: Option<String>) -> Result<()> {
        self.flow.set_view(ViewMode::Signup);
        self.run_form(username).await
    }

    pub fn logout(&mut self) {
        match self.store.current() {
            Some(session) => {
                self.store.remove();
                self.flow.close();
                println!("Logged out {}.", session.username());
            }
            None => println!("Not logged in."),
        }
    }

    /// Delete the keychain password for `username`, falling back to the last
    /// user who logged in and then to the name typed into the form.
    pub fn forget(&mut self, username: Option<String>) -> Result<()> {
        let username = forget_target(
            username,
            self.config.last_username.as_deref(),
            self.flow.username(),
        )
        .ok_or_else(|| anyhow!("No username given. Usage: forget USERNAME"))?;

        if !self.credentials.has_credentials(&username) {
            println!("No stored password for {}.", username);
            return Ok(());
        }

        self.credentials.delete(&username)?;
        info!(username = %username, "Stored password deleted");
        println!("Forgot stored password for {}.", username);
        Ok(())
    }

    pub fn print_status(&self) {
        match self.store.current() {
            Some(session) => {
                println!("Logged in as {} (user id {})", session.username(), session.user_id());
                let expiry = match session.expires_at() {
                    Some(at) if session.is_expired() => format!("expired {}", at.to_rfc3339()),
                    Some(at) => format!("expires {}", at.to_rfc3339()),
                    None => format!("expires {}", session.token_expiration()),
                };
                println!("Token {}", expiry);
            }
            None => println!("Not logged in."),
        }
    }

    // =========================================================================
    // Form
    // =========================================================================

    /// Fill the active form from prompts and submit it once.
    async fn run_form(&mut self, username: Option<String>) -> Result<()> {
        let mode = self.flow.mode();
        println!("\n=== {} ===\n", mode);

        let username = match username {
            Some(u) => u,
            None => prompt::username(self.flow.username())?,
        };
        self.flow.set_username(username.as_str());

        let password = if mode == ViewMode::Login
            && self.credentials.has_credentials(&username)
            && prompt::confirm("Use stored password?")?
        {
            self.credentials.get_password(&username)?
        } else {
            prompt::password("Password: ")?
        };
        self.flow.set_password(password.as_str());

        if mode == ViewMode::Signup {
            self.flow.set_confirm_password(prompt::password("Confirm password: ")?);
        }

        println!("\nContacting {}...", self.api.endpoint());

        match self.flow.submit(&self.api).await {
            Ok(session) => {
                self.remember(&username, &password);
                println!("Welcome, {}!\n", session.username());
                Ok(())
            }
            Err(e) => {
                let message = self.flow.displayed_error().unwrap_or_else(|| e.to_string());
                Err(anyhow!(message))
            }
        }
    }

    /// Persist the username and password after a successful submission.
    /// Failures are logged; the login itself already succeeded.
    fn remember(&mut self, username: &str, password: &str) {
        if let Err(e) = self.credentials.store(username, password) {
            warn!(error = %e, "Failed to store credentials");
        }

        self.config.last_username = Some(username.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

fn forget_target(explicit: Option<String>, last: Option<&str>, typed: &str) -> Option<String> {
    explicit
        .or_else(|| last.map(str::to_string))
        .or_else(|| Some(typed.to_string()))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forget_target_prefers_explicit_name() {
        assert_eq!(
            forget_target(Some("bob".to_string()), Some("alice"), "carol"),
            Some("bob".to_string())
        );
        assert_eq!(forget_target(None, Some("alice"), "carol"), Some("alice".to_string()));
        assert_eq!(forget_target(None, None, " carol "), Some("carol".to_string()));
    }

    #[test]
    fn test_forget_target_needs_some_name() {
        assert_eq!(forget_target(None, None, ""), None);
        assert_eq!(forget_target(Some("  ".to_string()), None, "carol"), None);
    }
}
