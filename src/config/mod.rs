//! Configuration management module
//!
//! This module handles loading and validating gateway configuration
//! from environment variables and .env files.

pub mod settings;

pub use settings::{LogFormat, Settings};
