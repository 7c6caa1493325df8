// Library surface shared by the CLI, the HTTP server and integration tests.
pub mod app_dirs;
pub mod auth;
pub mod config;
pub mod drill;
pub mod error;
pub mod report;
pub mod server;
pub mod store;
pub mod user;
pub mod vocabulary;

pub use error::{DrillError, Result};
