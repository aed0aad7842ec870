//! Shared models, configuration, and the HTTP-facing error taxonomy.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, DEFAULT_ERR_MSG};
pub use models::PendingFile;
