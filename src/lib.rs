//! Onboarding identity verification service.
//!
//! Resolves a person's directory account from their national identity
//! number, preferring the correlation id held by the education registry,
//! and issues the login material needed to finish account onboarding.

pub mod api;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod http;
pub mod jobs;
pub mod mfa;
pub mod registry;
pub mod server;
pub mod token;
pub mod verify;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::{OnboardError, OnboardResult};
