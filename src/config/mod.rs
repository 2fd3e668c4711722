//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment variables (loader.rs)
//!     → CLI flags (main.rs)
//!     → validation.rs (semantic checks, resolved socket addresses)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so the service starts with no config at all
//! - Validation reports every problem, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, LogConfig, LogFormat};
pub use validation::{validate_config, ListenAddresses, ValidationError};
