//! CondoLink client: session handling with one-shot token refresh, a shared
//! dashboard snapshot, admin writes and resident maintenance summaries.

pub mod analytics;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod session;
pub mod state;
pub mod time_utils;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use session::{AuthPhase, SessionManager};
pub use state::{AppState, SharedState};
