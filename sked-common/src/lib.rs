//! # Sked Common Library
//!
//! Shared code for the sked crates:
//! - Error taxonomy
//! - Configuration model and TOML loading
//! - Logging bootstrap

pub mod config;
pub mod error;
pub mod logging;

pub use config::{FormatConfig, MatchConfig, TomlConfig};
pub use error::{Error, Result};
