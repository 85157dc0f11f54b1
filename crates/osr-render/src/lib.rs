//! osr-render: the rendering engine of the OSR object-based audio stack.
//!
//! Takes per-block audio plus parsed metadata and mixes Objects, HOA,
//! DirectSpeakers and Binaural streams to a loudspeaker layout or binaural,
//! per Rec. ITU-R BS.2127 with the EBU Tech 3396 binaural extensions:
//!
//! - `point_source` - VBAP-style panning over a triangulated speaker hull
//! - `extent` - width/height/depth spreading
//! - `object_gains` - the full Objects pipeline (channel lock, zone
//!   exclusion, screen handling, divergence, diffuseness)
//! - `direct_speakers` - rule-based channel routing with fallbacks
//! - `allrad` - ambisonics to loudspeakers
//! - `renderer` - the block-based orchestrator

pub mod allrad;
pub mod direct_speakers;
pub mod extent;
pub mod hulls;
pub mod object_gains;
pub mod point_source;
pub mod renderer;

pub use allrad::AllRadDecoder;
pub use direct_speakers::DirectSpeakerGainCalc;
pub use extent::PolarExtentPanner;
pub use object_gains::ObjectGainCalc;
pub use point_source::PointSourcePanner;
pub use renderer::{OutputLayout, Renderer, RendererConfig};
