// Core modules
pub mod api;
pub mod config;
pub mod execution;
pub mod models;

// Re-export commonly used types
pub use config::Settings;
pub use models::*;
