//! # Paneltrack Common Library
//!
//! Shared code for the paneltrack service including:
//! - Database schema initialization and shared queries
//! - Error types
//! - Configuration loading and root folder resolution
//! - Password hashing primitives

pub mod auth;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use error::{Error, Result};
