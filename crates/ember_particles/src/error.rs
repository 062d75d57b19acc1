//! Particle configuration errors

use thiserror::Error;

/// Errors raised while applying emitter configuration
///
/// The per-frame update path never fails; everything here is reported when
/// options are parsed or handed to `Emitter::configure`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParticleError {
    /// Template references an image name the registry does not know
    #[error("Image not registered: {0}")]
    MissingImage(String),

    /// A sprite frame cannot be used with the template's image
    #[error("Invalid frame #{index}: {reason}")]
    InvalidFrame { index: usize, reason: String },

    /// Options text could not be parsed
    #[error("Failed to parse emitter options: {0}")]
    Parse(String),
}

/// Result type for particle configuration
pub type Result<T> = std::result::Result<T, ParticleError>;
