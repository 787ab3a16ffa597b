//! # Planet Error Types
//!
//! All errors that can occur while configuring, editing or meshing a planet.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the voxel planet.
#[derive(Error, Debug)]
pub enum PlanetError {
    /// A configuration value is out of its valid domain.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A brush edit was rejected before touching the overlay.
    #[error("invalid brush: {0}")]
    InvalidBrush(String),

    /// A sample or material array does not match the block dimensions.
    #[error("block size mismatch: expected {expected} samples, got {actual}")]
    BlockSizeMismatch {
        /// `nx * ny * nz`.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::PlanetConfig`].
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl PlanetError {
    /// Shorthand for [`PlanetError::InvalidConfig`].
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for planet operations.
pub type PlanetResult<T> = Result<T, PlanetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_field() {
        let err = PlanetError::config("radius", "must be positive, got -1");
        assert_eq!(
            err.to_string(),
            "invalid configuration: `radius` must be positive, got -1"
        );

        let err = PlanetError::BlockSizeMismatch { expected: 8, actual: 7 };
        assert!(err.to_string().contains("expected 8"));
    }
}
