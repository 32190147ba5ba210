//! Authentication module for holding and persisting the user's session.
//!
//! This module provides:
//! - `SessionStore`: the single source of truth for "is a user logged in"
//! - `SessionFile`: JSON copy of the session in the cache directory
//! - `CredentialStore`: remembered passwords via the OS keychain
//! - `IdleTimer`: removes the session after a period of inactivity

pub mod credentials;
pub mod idle;
pub mod session_file;
pub mod store;

pub use credentials::CredentialStore;
pub use idle::IdleTimer;
pub use session_file::SessionFile;
pub use store::SessionStore;
