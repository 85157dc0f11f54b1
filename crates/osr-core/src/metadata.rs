//! Per-block stream metadata consumed by the renderer.
//!
//! Structures mirror the shared metadata model of Rec. ITU-R BS.2127-0
//! sec. 11.1. Positions and exclusion zones are sum types: a block carries
//! either polar or cartesian data, never both.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::coords::{CartesianPosition, PolarPosition};
use crate::screen::Screen;

/// The audio element types from Rec. ITU-R BS.2127-0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDefinition {
    DirectSpeakers,
    Objects,
    Hoa,
    Binaural,
}

/// Channel frequency information.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frequency {
    pub low_pass: Option<f64>,
    pub high_pass: Option<f64>,
}

/// Channel lock: snap to the nearest loudspeaker within `max_distance`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelLock {
    /// Unset means lock to the closest speaker at any distance
    pub max_distance: Option<f64>,
}

/// Object divergence: split into three correlated sources spread in azimuth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectDivergence {
    pub value: f64,
    pub azimuth_range: Option<f64>,
    pub position_range: Option<f64>,
}

impl Default for ObjectDivergence {
    fn default() -> Self {
        Self {
            value: 0.0,
            azimuth_range: None,
            position_range: None,
        }
    }
}

/// One screen edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenEdge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Screen-edge lock request.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenEdgeLock {
    pub horizontal: Option<ScreenEdge>,
    pub vertical: Option<ScreenEdge>,
}

/// Angular bounds for DirectSpeaker position matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarBounds {
    pub min_azimuth: f64,
    pub max_azimuth: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

/// Jump position: cross-fade hint for gain changes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JumpPosition {
    pub flag: bool,
    /// Interpolation duration in samples
    pub interpolation_length: Option<u32>,
}

/// An object position in one of the two coordinate conventions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObjectPosition {
    Polar(PolarPosition),
    Cartesian(CartesianPosition),
}

impl Default for ObjectPosition {
    fn default() -> Self {
        ObjectPosition::Polar(PolarPosition::default())
    }
}

/// A zone of the loudspeaker array an object must not be rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExclusionZone {
    Polar {
        min_azimuth: f64,
        max_azimuth: f64,
        min_elevation: f64,
        max_elevation: f64,
    },
    Cartesian {
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
    },
}

/// Metadata for an Objects track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub position: ObjectPosition,
    pub gain: f64,
    /// Diffuseness in [0, 1]
    pub diffuse: f64,
    pub channel_lock: Option<ChannelLock>,
    pub object_divergence: Option<ObjectDivergence>,
    /// True if the cartesian metadata convention applies
    pub cartesian: bool,
    /// Extent: degrees in polar mode, unit lengths in cartesian mode
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub jump_position: JumpPosition,
    pub track_index: usize,
    pub zone_exclusion: Vec<ExclusionZone>,
    pub screen_ref: bool,
    pub screen_edge_lock: ScreenEdgeLock,
    /// Length of the metadata block in samples
    pub block_length: u32,
    pub reference_screen: Screen,
}

impl Default for ObjectMetadata {
    fn default() -> Self {
        Self {
            position: ObjectPosition::default(),
            gain: 1.0,
            diffuse: 0.0,
            channel_lock: None,
            object_divergence: None,
            cartesian: false,
            width: 0.0,
            height: 0.0,
            depth: 0.0,
            jump_position: JumpPosition::default(),
            track_index: 0,
            zone_exclusion: Vec::new(),
            screen_ref: false,
            screen_edge_lock: ScreenEdgeLock::default(),
            block_length: 0,
            reference_screen: Screen::default(),
        }
    }
}

/// The HOA normalization conventions accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoaNormalization {
    Sn3d,
    N3d,
    FuMa,
}

/// Metadata for a HOA stream. `orders`, `degrees` and `track_indices` run in
/// parallel, one entry per ambisonic channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoaMetadata {
    pub orders: Vec<i32>,
    /// Degrees with |degree| <= order
    pub degrees: Vec<i32>,
    pub normalization: HoaNormalization,
    pub track_indices: Vec<usize>,
    pub gain: f64,
}

impl Default for HoaMetadata {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            degrees: Vec::new(),
            normalization: HoaNormalization::Sn3d,
            track_indices: Vec::new(),
            gain: 1.0,
        }
    }
}

/// Polar position (with optional bounds) of a DirectSpeaker channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectSpeakerPolarPosition {
    pub azimuth: f64,
    pub elevation: f64,
    pub distance: f64,
    pub bounds: Option<PolarBounds>,
}

impl Default for DirectSpeakerPolarPosition {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            distance: 1.0,
            bounds: None,
        }
    }
}

impl DirectSpeakerPolarPosition {
    pub fn polar(self) -> PolarPosition {
        PolarPosition::new(self.azimuth, self.elevation, self.distance)
    }
}

/// Metadata for a DirectSpeakers track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectSpeakerMetadata {
    pub speaker_label: String,
    pub polar_position: DirectSpeakerPolarPosition,
    pub track_index: usize,
    pub audio_pack_format_id: Option<String>,
    pub channel_frequency: Frequency,
    pub screen_edge_lock: ScreenEdgeLock,
    pub gain: f64,
}

impl Default for DirectSpeakerMetadata {
    fn default() -> Self {
        Self {
            speaker_label: String::new(),
            polar_position: DirectSpeakerPolarPosition::default(),
            track_index: 0,
            audio_pack_format_id: None,
            channel_frequency: Frequency::default(),
            screen_edge_lock: ScreenEdgeLock::default(),
            gain: 1.0,
        }
    }
}

/// Check whether DirectSpeaker metadata denotes an LFE channel.
/// See Rec. ITU-R BS.2127-1 sec. 6.3.
pub fn is_lfe_metadata(metadata: &DirectSpeakerMetadata) -> bool {
    if let Some(low_pass) = metadata.channel_frequency.low_pass {
        if low_pass <= 120.0 {
            return true;
        }
    }
    let nominal = crate::layout::nominal_speaker_label(&metadata.speaker_label);
    nominal == "LFE1" || nominal == "LFE2"
}

/// Declares, per track, what type of content arrives on it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamInformation {
    pub type_definitions: Vec<TypeDefinition>,
}

impl StreamInformation {
    pub fn num_channels(&self) -> usize {
        self.type_definitions.len()
    }
}

/// Common-definitions audioPackFormatID to input layout name.
/// Rec. ITU-R BS.2127-0 Table 15.
pub static ITU_PACK_NAMES: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("AP_00010001", "0+1+0"),
        ("AP_00010002", "0+2+0"),
        ("AP_0001000c", "0+5+0"),
        ("AP_00010003", "0+5+0"),
        ("AP_00010004", "2+5+0"),
        ("AP_00010005", "4+5+0"),
        ("AP_00010010", "4+5+1"),
        ("AP_00010007", "3+7+0"),
        ("AP_00010008", "4+9+0"),
        ("AP_00010009", "9+10+3"),
        ("AP_0001000f", "0+7+0"),
        ("AP_00010017", "4+7+0"),
    ]
});

/// Resolve an audioPackFormatID to its input layout name.
pub fn itu_pack_layout(pack_id: &str) -> Option<&'static str> {
    ITU_PACK_NAMES
        .iter()
        .find(|(id, _)| *id == pack_id)
        .map(|(_, name)| *name)
}
