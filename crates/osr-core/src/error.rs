//! Error types for renderer configuration

use thiserror::Error;

/// Errors surfaced while configuring a renderer. Per-block processing never
/// fails once configuration has succeeded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Ambisonic order out of the supported range
    #[error("Unsupported ambisonic order: {0} (max supported: 3)")]
    InvalidHoaOrder(u32),

    /// Number of HOA tracks in the stream does not match (order+1)^2
    #[error("HOA channel count mismatch: expected {expected}, got {got}")]
    HoaChannelCountMismatch { expected: usize, got: usize },

    /// Unknown or unsupported layout name
    #[error("Invalid speaker layout: {0}")]
    InvalidLayout(String),

    /// Custom layout position list has the wrong length
    #[error("Layout position count mismatch: expected {expected}, got {got}")]
    LayoutPositionCount { expected: usize, got: usize },

    /// A loudspeaker sits outside the valid angular range for its layout
    #[error("Loudspeaker position out of range in layout {0}")]
    SpeakerOutOfRange(String),

    /// Binaural output requested without any HRTF data
    #[error("HRTF not available: {0}")]
    HrtfNotAvailable(String),

    /// Block size of zero or similar invalid processing parameters
    #[error("Invalid processing parameter: {0}")]
    InvalidParameter(String),
}
