//! Startup configuration errors
//!
//! Everything here is fatal at startup. Gameplay never produces errors:
//! out-of-bounds motion, firing while destroyed and similar edge cases are
//! ordinary control flow inside the simulation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The render surface has no initialized root to attach visuals to
    #[error("render surface root is not initialized")]
    SurfaceNotReady,

    /// The frame scheduler was started before an updater was installed
    #[error("frame scheduler started without an updater")]
    MissingUpdater,

    #[error("no levels configured")]
    NoLevels,

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: String, reason: String },

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
