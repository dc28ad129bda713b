//! Error handling for the hotel dashboard

use hotel_dashboard_auth::AuthError;
use hotel_dashboard_query::QueryError;
use std::fmt;
use thiserror::Error;

/// Unified error type for the hotel dashboard
#[derive(Error, Debug)]
pub enum Error {
    /// Session, credential and persistence errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Invalid list query mutations
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// A record id that is not in the catalog
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected catalog input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The session may not reach the requested view
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog file errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration values
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new not found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new forbidden error
    pub fn forbidden<T: fmt::Display>(msg: T) -> Self {
        Error::Forbidden(msg.to_string())
    }

    /// Create a new config error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }
}
