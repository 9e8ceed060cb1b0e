//! Error types for splatedit-core
//!
//! Every failure here is a contract violation by the caller (bad input shapes,
//! corrupt packed buffers, invalid configuration). Nothing is transient, so
//! nothing is retried.

use thiserror::Error;

/// Main error type for splatedit operations
#[derive(Error, Debug)]
pub enum SplatEditError {
    /// Spatial index errors
    #[error("Spatial index error: {0}")]
    Spatial(#[from] SpatialError),

    /// Selection encoding errors
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while building a [`PointIndex`](crate::spatial::PointIndex)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpatialError {
    /// Coordinate arrays of different lengths, or too many points
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Building over zero points
    #[error("Cannot build a spatial index over an empty point cloud")]
    EmptyIndex,
}

/// Errors raised while building or decoding a [`SelectionSet`](crate::selection::SelectionSet)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Domain size or index outside the 31-bit range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Raw words that break the packed buffer invariants
    #[error("Malformed selection buffer at word {offset}: {reason}")]
    MalformedBuffer { offset: usize, reason: String },

    /// Raw index list that is not strictly ascending
    #[error("Index list not strictly ascending at position {position}: {previous} then {current}")]
    UnsortedIds {
        position: usize,
        previous: u32,
        current: u32,
    },
}

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// JSON parsing or serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result type for splatedit operations
pub type Result<T> = std::result::Result<T, SplatEditError>;
