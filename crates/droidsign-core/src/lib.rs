//! droidsign core - configuration and shared error types
//!
//! This crate holds the pieces of droidsign that are independent of the
//! Android toolchain: the configuration model, its discovery and
//! validation, and the error types used to report configuration problems.

pub mod config;
pub mod error;

pub use config::{Config, load_config, load_config_or_default};
pub use error::{ConfigError, CoreError, Result};
