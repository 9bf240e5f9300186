//! Terravale Core - shared building blocks for the Terravale Ventures services
//!
//! Holds the role model used on both sides of the session boundary, the
//! unified error type, logging setup and file/environment configuration.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
