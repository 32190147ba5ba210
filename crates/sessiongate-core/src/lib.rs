//! sessiongate core library.
//!
//! Client-side authentication for a GraphQL backend:
//!
//! - `auth`: the shared `SessionStore`, its on-disk copy, keychain access
//!   and the idle timer
//! - `flow`: validation and the login/signup submission state machine
//! - `api`: the `AuthApi` seam and its GraphQL-over-HTTP implementation
//! - `config`: endpoint, timeouts and policy settings
//! - `models`: `Session` and `ViewMode`

pub mod api;
pub mod auth;
pub mod config;
pub mod flow;
pub mod models;

pub use api::{ApiError, AuthApi, GraphQlClient};
pub use auth::{CredentialStore, IdleTimer, SessionFile, SessionStore};
pub use config::Config;
pub use flow::{FlowError, FlowState, SubmissionFlow, ValidationError};
pub use models::{Session, ViewMode};
