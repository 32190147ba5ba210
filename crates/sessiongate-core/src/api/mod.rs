//! GraphQL API client module for the authentication service.
//!
//! This module provides the `AuthApi` trait consumed by the submission flow
//! and `GraphQlClient`, its implementation over HTTP. Login is a GraphQL
//! query and signup a mutation; both return the new session.

pub mod auth_api;
pub mod client;
pub mod error;
pub mod queries;

pub use auth_api::AuthApi;
pub use client::GraphQlClient;
pub use error::ApiError;
