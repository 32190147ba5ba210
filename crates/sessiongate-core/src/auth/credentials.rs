use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_PREFIX: &str = "sessiongate";

/// Passwords remembered in the OS keychain, one keychain service per
/// endpoint so accounts on different servers never collide.
pub struct CredentialStore {
    service: String,
}

impl CredentialStore {
    pub fn for_endpoint(endpoint: &str) -> Self {
        Self {
            service: format!("{}:{}", SERVICE_PREFIX, endpoint.trim_end_matches('/')),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, username: &str) -> Result<Entry> {
        Entry::new(&self.service, username).context("Failed to create keyring entry")
    }

    /// Store the password for a username in the OS keychain
    pub fn store(&self, username: &str, password: &str) -> Result<()> {
        self.entry(username)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// Retrieve the password for a username from the OS keychain
    pub fn get_password(&self, username: &str) -> Result<String> {
        self.entry(username)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Delete the stored password for a username from the OS keychain
    pub fn delete(&self, username: &str) -> Result<()> {
        self.entry(username)?
            .delete_credential()
            .context("Failed to delete credential from keychain")
    }

    pub fn has_credentials(&self, username: &str) -> bool {
        self.entry(username)
            .map(|entry| entry.get_password().is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_is_scoped_to_endpoint() {
        let a = CredentialStore::for_endpoint("https://api.example.com/graphql/");
        let b = CredentialStore::for_endpoint("http://localhost:4000/graphql");
        assert_eq!(a.service(), "sessiongate:https://api.example.com/graphql");
        assert_ne!(a.service(), b.service());
    }
}
