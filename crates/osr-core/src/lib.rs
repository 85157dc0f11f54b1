//! osr-core: geometry, loudspeaker layouts and stream metadata for the OSR
//! object-based scene renderer.
//!
//! This crate carries the shared data model:
//! - polar/cartesian coordinates and the angle helpers used by the panners
//! - the BS.2094 channel registry and BS.2051-3 layout presets, including
//!   per-layout angular-range validation
//! - screen geometry with the scale and edge-lock handlers
//! - per-block metadata for Objects, HOA and DirectSpeakers streams
//! - the cartesian-to-polar metadata conversions of BS.2127 sec. 10

pub mod conversions;
pub mod coords;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod screen;

pub use coords::{CartesianPosition, PolarPosition};
pub use error::ConfigError;
pub use layout::{check_layout_angles, nominal_speaker_label, Channel, Layout};
pub use metadata::{
    is_lfe_metadata, itu_pack_layout, ChannelLock, DirectSpeakerMetadata,
    DirectSpeakerPolarPosition, ExclusionZone, Frequency, HoaMetadata, HoaNormalization,
    JumpPosition, ObjectDivergence, ObjectMetadata, ObjectPosition, PolarBounds, ScreenEdge,
    ScreenEdgeLock, StreamInformation, TypeDefinition,
};
pub use screen::{PolarEdges, Screen, ScreenEdgeLockHandler, ScreenScaleHandler};
