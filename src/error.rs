//! Error types
//!
//! Only malformed input is an error. Raycast misses, empty tow queries and the
//! end of a round are ordinary values.

use thiserror::Error;

/// Rejected entity spawn. Checked before anything reaches the physics engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpawnError {
    /// Radius must be finite and strictly positive
    #[error("invalid radius: {0}")]
    InvalidRadius(f32),

    /// Position has a NaN or infinite component
    #[error("non-finite position ({0}, {1})")]
    NonFinitePosition(f32, f32),

    /// Velocity has a NaN or infinite component
    #[error("non-finite velocity ({0}, {1})")]
    NonFiniteVelocity(f32, f32),

    /// Polygons need at least three vertices
    #[error("polygon needs at least 3 vertices, got {0}")]
    DegeneratePolygon(usize),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse or write error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is outside its allowed range
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
