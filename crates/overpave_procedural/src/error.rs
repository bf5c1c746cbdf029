//! # Generation Error Types
//!
//! Errors here are contract violations or bad configuration. A street
//! that does not fit is never an error; see `roads::Rejection`.

use overpave_core::{CacheError, GraphError};
use thiserror::Error;

use crate::units::RegionCoord;

/// Invalid generator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A value is out of its allowed range.
    #[error("invalid configuration: {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The TOML document could not be parsed.
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while generating road networks.
#[derive(Error, Debug)]
pub enum GenError {
    /// A point/path graph contract was violated.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cache could not be built.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A region was checked out twice at the same time.
    #[error("region {0} is already in use by another neighborhood")]
    RegionBusy(RegionCoord),

    /// A region disappeared from its store while it was needed.
    #[error("region {0} is not cached")]
    RegionMissing(RegionCoord),

    /// A canvas snapshot could not be decoded.
    #[error("corrupt canvas snapshot: {0}")]
    Snapshot(String),
}

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenError>;
