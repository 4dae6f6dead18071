//! Shared configuration and error types for Seclink.
//!
//! This crate provides common types used across all other crates:
//! - Application configuration with environment overrides
//! - Application-wide error types with HTTP status mapping

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
