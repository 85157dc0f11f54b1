//! Loudspeaker channels and named layouts.
//!
//! Channel labels and directions follow Rec. ITU-R BS.2094-2 Table 1A, with
//! the two bottom-rear speakers added for the EBU Tech 3396 (BEAR) 9+10+5
//! layout. Layout definitions follow Rec. ITU-R BS.2051-3 plus the IAMF
//! 7.1.2 / 3.1.2 arrangements.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::coords::{inside_angle_range, PolarPosition};
use crate::screen::Screen;

/// Speaker channel labels from Rec. ITU-R BS.2094-2 Table 1A (plus BEAR
/// extensions), paired with their canonical directions.
pub static CHANNEL_LABELS: &[(&str, PolarPosition)] = &[
    ("M+030", PolarPosition { azimuth: 30.0, elevation: 0.0, distance: 1.0 }),
    ("M-030", PolarPosition { azimuth: -30.0, elevation: 0.0, distance: 1.0 }),
    ("M+000", PolarPosition { azimuth: 0.0, elevation: 0.0, distance: 1.0 }),
    ("LFE", PolarPosition { azimuth: 0.0, elevation: -30.0, distance: 1.0 }),
    ("M+110", PolarPosition { azimuth: 110.0, elevation: 0.0, distance: 1.0 }),
    ("M-110", PolarPosition { azimuth: -110.0, elevation: 0.0, distance: 1.0 }),
    ("M+022", PolarPosition { azimuth: 22.5, elevation: 0.0, distance: 1.0 }),
    ("M-022", PolarPosition { azimuth: -22.5, elevation: 0.0, distance: 1.0 }),
    ("M+180", PolarPosition { azimuth: 180.0, elevation: 0.0, distance: 1.0 }),
    ("M+090", PolarPosition { azimuth: 90.0, elevation: 0.0, distance: 1.0 }),
    ("M-090", PolarPosition { azimuth: -90.0, elevation: 0.0, distance: 1.0 }),
    ("T+000", PolarPosition { azimuth: 0.0, elevation: 90.0, distance: 1.0 }),
    ("U+030", PolarPosition { azimuth: 30.0, elevation: 30.0, distance: 1.0 }),
    ("U+000", PolarPosition { azimuth: 0.0, elevation: 30.0, distance: 1.0 }),
    ("U-030", PolarPosition { azimuth: -30.0, elevation: 30.0, distance: 1.0 }),
    ("U+110", PolarPosition { azimuth: 110.0, elevation: 30.0, distance: 1.0 }),
    ("U+180", PolarPosition { azimuth: 180.0, elevation: 30.0, distance: 1.0 }),
    ("U-110", PolarPosition { azimuth: -110.0, elevation: 30.0, distance: 1.0 }),
    ("U+090", PolarPosition { azimuth: 90.0, elevation: 30.0, distance: 1.0 }),
    ("U-090", PolarPosition { azimuth: -90.0, elevation: 30.0, distance: 1.0 }),
    ("B+000", PolarPosition { azimuth: 0.0, elevation: -30.0, distance: 1.0 }),
    ("B+045", PolarPosition { azimuth: 45.0, elevation: -30.0, distance: 1.0 }),
    ("B-045", PolarPosition { azimuth: -45.0, elevation: -30.0, distance: 1.0 }),
    ("M+060", PolarPosition { azimuth: 60.0, elevation: 0.0, distance: 1.0 }),
    ("M-060", PolarPosition { azimuth: -60.0, elevation: 0.0, distance: 1.0 }),
    ("M+135", PolarPosition { azimuth: 135.0, elevation: 0.0, distance: 1.0 }),
    ("M-135", PolarPosition { azimuth: -135.0, elevation: 0.0, distance: 1.0 }),
    ("U+135", PolarPosition { azimuth: 135.0, elevation: 30.0, distance: 1.0 }),
    ("U-135", PolarPosition { azimuth: -135.0, elevation: 30.0, distance: 1.0 }),
    ("LFE1", PolarPosition { azimuth: 45.0, elevation: -30.0, distance: 1.0 }),
    ("LFE2", PolarPosition { azimuth: -45.0, elevation: -30.0, distance: 1.0 }),
    ("U+045", PolarPosition { azimuth: 45.0, elevation: 30.0, distance: 1.0 }),
    ("U-045", PolarPosition { azimuth: -45.0, elevation: 30.0, distance: 1.0 }),
    ("M+SC", PolarPosition { azimuth: 25.0, elevation: 0.0, distance: 1.0 }),
    ("M-SC", PolarPosition { azimuth: -25.0, elevation: 0.0, distance: 1.0 }),
    ("M+045", PolarPosition { azimuth: 45.0, elevation: 0.0, distance: 1.0 }),
    ("M-045", PolarPosition { azimuth: -45.0, elevation: 0.0, distance: 1.0 }),
    ("UH+180", PolarPosition { azimuth: 180.0, elevation: 45.0, distance: 1.0 }),
    ("M+150", PolarPosition { azimuth: 150.0, elevation: 0.0, distance: 1.0 }),
    ("M-150", PolarPosition { azimuth: -150.0, elevation: 0.0, distance: 1.0 }),
    ("B+030", PolarPosition { azimuth: 30.0, elevation: -30.0, distance: 1.0 }),
    ("B-030", PolarPosition { azimuth: -30.0, elevation: -30.0, distance: 1.0 }),
    ("B+135", PolarPosition { azimuth: 135.0, elevation: -30.0, distance: 1.0 }),
    ("B-135", PolarPosition { azimuth: -135.0, elevation: -30.0, distance: 1.0 }),
];

/// Strip a `urn:itu:bs:2051:x:speaker:X+YYY` style label down to its nominal
/// `X+YYY` form. Unknown labels come back empty. Bare LFE spellings are
/// folded onto LFE1/LFE2 per Rec. ITU-R BS.2127-1 sec. 8.3.
pub fn nominal_speaker_label(label: &str) -> &str {
    for (name, _) in CHANNEL_LABELS {
        if *name != "LFE" && label.contains(name) {
            return name;
        }
    }
    if label.contains("LFER") {
        return "LFE2";
    }
    if label.contains("LFE") || label.contains("LFEL") {
        return "LFE1";
    }
    ""
}

fn label_position(label: &str) -> Option<PolarPosition> {
    CHANNEL_LABELS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, pos)| *pos)
}

/// A loudspeaker channel: label plus real and nominal directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    /// Real loudspeaker direction
    pub polar_position: PolarPosition,
    /// Nominal direction from Rec. ITU-R BS.2051-3
    pub polar_position_nominal: PolarPosition,
    pub is_lfe: bool,
}

impl Channel {
    /// Look up one of the labels in [`CHANNEL_LABELS`]. Returns None for
    /// unknown labels.
    pub fn from_label(name: &str) -> Option<Self> {
        let position = label_position(name)?;
        let nominal = nominal_speaker_label(name);
        let is_lfe = nominal == "LFE1" || nominal == "LFE2";
        Some(Self {
            name: name.to_string(),
            polar_position: position,
            polar_position_nominal: position,
            is_lfe,
        })
    }

    /// Build a custom channel with explicit positions.
    pub fn custom(name: &str, position: PolarPosition, nominal: PolarPosition, is_lfe: bool) -> Self {
        Self {
            name: name.to_string(),
            polar_position: position,
            polar_position_nominal: nominal,
            is_lfe,
        }
    }
}

/// An ordered set of loudspeaker channels with a canonical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,
    pub channels: Vec<Channel>,
    pub has_lfe: bool,
    pub reproduction_screen: Option<Screen>,
}

impl Layout {
    fn from_labels(name: &str, labels: &[&str], has_lfe: bool) -> Self {
        let channels = labels
            .iter()
            .map(|l| Channel::from_label(l).expect("layout preset uses a known label"))
            .collect();
        Self {
            name: name.to_string(),
            channels,
            has_lfe,
            reproduction_screen: None,
        }
    }

    /// The preset layout matching `name`, if it is one of the canonical
    /// layouts.
    pub fn with_name(name: &str) -> Option<Layout> {
        SPEAKER_LAYOUTS.iter().find(|l| l.name == name).cloned()
    }

    /// Index of the channel with the given name, if present.
    pub fn channel_index(&self, channel_name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == channel_name)
    }

    pub fn contains_channel(&self, channel_name: &str) -> bool {
        self.channel_index(channel_name).is_some()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// A copy of this layout with any LFE channels removed.
    pub fn without_lfe(&self) -> Layout {
        Layout {
            name: self.name.clone(),
            channels: self.channels.iter().filter(|c| !c.is_lfe).cloned().collect(),
            has_lfe: false,
            reproduction_screen: self.reproduction_screen.clone(),
        }
    }

    /// Indices of the non-LFE channels in declared order.
    pub fn non_lfe_indices(&self) -> Vec<usize> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_lfe)
            .map(|(i, _)| i)
            .collect()
    }
}

/// The canonical layout presets.
static SPEAKER_LAYOUTS: Lazy<Vec<Layout>> = Lazy::new(|| {
    vec![
        // Stereo - BS.2051-3 System A
        Layout::from_labels("0+2+0", &["M+030", "M-030"], false),
        // Quad - not in BS.2051-3
        Layout::from_labels("0+4+0", &["M+045", "M-045", "M+135", "M-135"], false),
        // 5.1 - System B
        Layout::from_labels("0+5+0", &["M+030", "M-030", "M+000", "LFE1", "M+110", "M-110"], true),
        // 5.1.2 - System C
        Layout::from_labels(
            "2+5+0",
            &["M+030", "M-030", "M+000", "LFE1", "M+110", "M-110", "U+030", "U-030"],
            true,
        ),
        // 5.1.4 - System D
        Layout::from_labels(
            "4+5+0",
            &["M+030", "M-030", "M+000", "LFE1", "M+110", "M-110", "U+030", "U-030", "U+110", "U-110"],
            true,
        ),
        // System E
        Layout::from_labels(
            "4+5+1",
            &[
                "M+030", "M-030", "M+000", "LFE1", "M+110", "M-110", "U+030", "U-030", "U+110",
                "U-110", "B+000",
            ],
            true,
        ),
        // 7.1.3 - System F
        Layout::from_labels(
            "3+7+0",
            &[
                "M+000", "M+030", "M-030", "U+045", "U-045", "M+090", "M-090", "M+135", "M-135",
                "UH+180", "LFE1", "LFE2",
            ],
            true,
        ),
        // 13.1 - System G
        Layout::from_labels(
            "4+9+0",
            &[
                "M+030", "M-030", "M+000", "LFE1", "M+090", "M-090", "M+135", "M-135", "U+045",
                "U-045", "U+135", "U-135", "M+SC", "M-SC",
            ],
            true,
        ),
        // 22.2 - System H
        Layout::from_labels(
            "9+10+3",
            &[
                "M+060", "M-060", "M+000", "LFE1", "M+135", "M-135", "M+030", "M-030", "M+180",
                "LFE2", "M+090", "M-090", "U+045", "U-045", "U+000", "T+000", "U+135", "U-135",
                "U+090", "U-090", "U+180", "B+000", "B+045", "B-045",
            ],
            true,
        ),
        // 7.1 - System I
        Layout::from_labels(
            "0+7+0",
            &["M+030", "M-030", "M+000", "LFE1", "M+090", "M-090", "M+135", "M-135"],
            true,
        ),
        // 7.1.4 - System J
        Layout::from_labels(
            "4+7+0",
            &[
                "M+030", "M-030", "M+000", "LFE1", "M+090", "M-090", "M+135", "M-135", "U+045",
                "U-045", "U+135", "U-135",
            ],
            true,
        ),
        // 7.1.2 - IAMF v1.0.0
        Layout::from_labels(
            "2+7+0",
            &[
                "M+030", "M-030", "M+000", "LFE1", "M+090", "M-090", "M+135", "M-135", "U+045",
                "U-045",
            ],
            true,
        ),
        // 3.1.2 - IAMF v1.0.0
        Layout::from_labels(
            "2+3+0",
            &["M+030", "M-030", "M+000", "LFE1", "U+045", "U-045"],
            true,
        ),
        // EBU Tech 3396 (BEAR): 9+10+3 without LFEs, plus B+135/B-135
        Layout::from_labels(
            "9+10+5",
            &[
                "M+060", "M-060", "M+000", "M+135", "M-135", "M+030", "M-030", "M+180", "M+090",
                "M-090", "U+045", "U-045", "U+000", "T+000", "U+135", "U-135", "U+090", "U-090",
                "U+180", "B+000", "B+045", "B-045", "B+135", "B-135",
            ],
            false,
        ),
    ]
});

struct ChannelRange {
    label: &'static str,
    az: (f64, f64),
    el: (f64, f64),
}

macro_rules! ranges {
    ($($label:literal : ($a0:expr, $a1:expr), ($e0:expr, $e1:expr));* $(;)?) => {
        &[$(ChannelRange { label: $label, az: ($a0, $a1), el: ($e0, $e1) }),*]
    };
}

/// Valid loudspeaker position ranges per layout, from Rec. ITU-R BS.2051-3
/// (nearest equivalents for layouts outside it).
static SPEAKER_RANGES: Lazy<Vec<(&'static str, &'static [ChannelRange])>> = Lazy::new(|| {
    vec![
        ("0+2+0", ranges! {
            "M+030": (30., 30.), (0., 0.);
            "M-030": (-30., -30.), (0., 0.);
        }),
        ("0+4+0", ranges! {
            "M+045": (45., 45.), (0., 0.);
            "M-045": (-45., -45.), (0., 0.);
            "M+135": (135., 135.), (0., 0.);
            "M-135": (-135., -135.), (0., 0.);
        }),
        ("0+5+0", ranges! {
            "M+030": (30., 30.), (0., 0.);
            "M-030": (-30., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "M+110": (100., 120.), (0., 15.);
            "M-110": (-120., -100.), (0., 15.);
        }),
        ("2+5+0", ranges! {
            "M+030": (30., 30.), (0., 0.);
            "M-030": (-30., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "M+110": (100., 120.), (0., 15.);
            "M-110": (-120., -100.), (0., 15.);
            "U+030": (30., 45.), (30., 55.);
            "U-030": (-45., -30.), (30., 55.);
        }),
        ("4+5+0", ranges! {
            "M+030": (30., 30.), (0., 0.);
            "M-030": (-30., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "M+110": (100., 120.), (0., 15.);
            "M-110": (-120., -100.), (0., 15.);
            "U+030": (30., 45.), (30., 55.);
            "U-030": (-45., -30.), (30., 55.);
            "U+110": (110., 135.), (30., 55.);
            "U-110": (-135., -110.), (30., 55.);
        }),
        ("4+5+1", ranges! {
            "M+030": (30., 30.), (0., 0.);
            "M-030": (-30., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "M+110": (100., 120.), (0., 15.);
            "M-110": (-120., -100.), (0., 15.);
            "U+030": (30., 45.), (30., 55.);
            "U-030": (-45., -30.), (30., 55.);
            "U+110": (110., 135.), (30., 55.);
            "U-110": (-135., -110.), (30., 55.);
            "B+000": (0., 0.), (-30., -15.);
        }),
        ("3+7+0", ranges! {
            "M+000": (0., 0.), (0., 0.);
            "M+030": (30., 30.), (0., 0.);
            "M-030": (-30., -30.), (0., 0.);
            "U+045": (30., 45.), (30., 45.);
            "U-045": (-45., -30.), (30., 45.);
            "M+090": (60., 150.), (0., 0.);
            "M-090": (-150., -60.), (0., 0.);
            "M+135": (60., 150.), (0., 0.);
            "M-135": (-150., -60.), (0., 0.);
            "UH+180": (180., 180.), (45., 90.);
            "LFE1": (-180., 180.), (-90., 90.);
            "LFE2": (-180., 180.), (-90., 90.);
        }),
        ("4+9+0", ranges! {
            "M+030": (30., 45.), (0., 0.);
            "M-030": (-45., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "M+090": (85., 110.), (0., 0.);
            "M-090": (-110., -85.), (0., 0.);
            "M+135": (120., 150.), (0., 0.);
            "M-135": (-150., -120.), (0., 0.);
            "U+045": (30., 45.), (30., 55.);
            "U-045": (-45., -30.), (30., 55.);
            "U+135": (100., 150.), (30., 55.);
            "U-135": (-150., -100.), (30., 55.);
            "M+SC": (5., 25.), (0., 0.);
            "M-SC": (-25., -5.), (0., 0.);
        }),
        ("9+10+3", ranges! {
            "M+060": (45., 60.), (0., 5.);
            "M-060": (-60., -45.), (0., 5.);
            "M+000": (0., 0.), (0., 5.);
            "LFE1": (30., 90.), (-30., -15.);
            "M+135": (110., 135.), (0., 15.);
            "M-135": (-135., -110.), (0., 15.);
            "M+030": (22.5, 30.), (0., 5.);
            "M-030": (-30., -22.5), (0., 5.);
            "M+180": (180., 180.), (0., 15.);
            "LFE2": (-90., -30.), (-30., -15.);
            "M+090": (90., 90.), (0., 15.);
            "M-090": (-90., -90.), (0., 15.);
            "U+045": (45., 60.), (30., 45.);
            "U-045": (-60., -45.), (30., 45.);
            "U+000": (0., 0.), (30., 45.);
            "T+000": (-180., 180.), (90., 90.);
            "U+135": (110., 135.), (30., 45.);
            "U-135": (-135., -110.), (30., 45.);
            "U+090": (90., 90.), (30., 45.);
            "U-090": (-90., -90.), (30., 45.);
            "U+180": (180., 180.), (30., 45.);
            "B+000": (0., 0.), (-30., -15.);
            "B+045": (45., 60.), (-30., -15.);
            "B-045": (-60., -45.), (-30., -15.);
        }),
        ("0+7+0", ranges! {
            "M+030": (30., 45.), (0., 0.);
            "M-030": (-45., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "M+090": (85., 110.), (0., 0.);
            "M-090": (-110., -85.), (0., 0.);
            "M+135": (120., 150.), (0., 0.);
            "M-135": (-150., -120.), (0., 0.);
        }),
        ("4+7+0", ranges! {
            "M+030": (30., 45.), (0., 0.);
            "M-030": (-45., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "M+090": (85., 110.), (0., 0.);
            "M-090": (-110., -85.), (0., 0.);
            "M+135": (120., 150.), (0., 0.);
            "M-135": (-150., -120.), (0., 0.);
            "U+045": (30., 45.), (30., 55.);
            "U-045": (-45., -30.), (30., 55.);
            "U+135": (100., 150.), (30., 55.);
            "U-135": (-150., -100.), (30., 55.);
        }),
        ("2+7+0", ranges! {
            "M+030": (30., 45.), (0., 0.);
            "M-030": (-45., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "M+090": (85., 110.), (0., 0.);
            "M-090": (-110., -85.), (0., 0.);
            "M+135": (120., 150.), (0., 0.);
            "M-135": (-150., -120.), (0., 0.);
            "U+045": (30., 45.), (30., 55.);
            "U-045": (-45., -30.), (30., 55.);
        }),
        ("2+3+0", ranges! {
            "M+030": (30., 45.), (0., 0.);
            "M-030": (-45., -30.), (0., 0.);
            "M+000": (0., 0.), (0., 0.);
            "LFE1": (-180., 180.), (-90., 90.);
            "U+045": (30., 45.), (30., 55.);
            "U-045": (-45., -30.), (30., 55.);
        }),
        ("9+10+5", ranges! {
            "M+060": (45., 60.), (0., 5.);
            "M-060": (-60., -45.), (0., 5.);
            "M+000": (0., 0.), (0., 5.);
            "M+135": (110., 135.), (0., 15.);
            "M-135": (-135., -110.), (0., 15.);
            "M+030": (22.5, 30.), (0., 5.);
            "M-030": (-30., -22.5), (0., 5.);
            "M+180": (180., 180.), (0., 15.);
            "M+090": (90., 90.), (0., 15.);
            "M-090": (-90., -90.), (0., 15.);
            "U+045": (45., 60.), (30., 45.);
            "U-045": (-60., -45.), (30., 45.);
            "U+000": (0., 0.), (30., 45.);
            "T+000": (-180., 180.), (90., 90.);
            "U+135": (110., 135.), (30., 45.);
            "U-135": (-135., -110.), (30., 45.);
            "U+090": (90., 90.), (30., 45.);
            "U-090": (-90., -90.), (30., 45.);
            "U+180": (180., 180.), (30., 45.);
            "B+000": (0., 0.), (-30., -15.);
            "B+045": (45., 60.), (-30., -15.);
            "B-045": (-60., -45.), (-30., -15.);
            "B+135": (110., 135.), (-30., -15.);
            "B-135": (-135., -110.), (-30., -15.);
        }),
    ]
});

/// Check that every loudspeaker in the layout lies inside the valid angular
/// range for its label. See Rec. ITU-R BS.2127-1 sec. 3.1. The M+SC/M-SC
/// screen speakers additionally accept the wide 35..60 degree placement.
pub fn check_layout_angles(layout: &Layout) -> bool {
    let tol = 1e-6;
    let Some((_, layout_ranges)) = SPEAKER_RANGES.iter().find(|(name, _)| *name == layout.name)
    else {
        return false;
    };

    for channel in &layout.channels {
        let nominal = nominal_speaker_label(&channel.name);
        let Some(range) = layout_ranges.iter().find(|r| r.label == nominal) else {
            return false;
        };

        let az = channel.polar_position.azimuth;
        let el = channel.polar_position.elevation;
        if channel.name == "M+SC" || channel.name == "M-SC" {
            // The screen speakers must sit either 5..25 or 35..60 degrees
            // off-centre on their own side.
            let abs_az = az.abs();
            let narrow = inside_angle_range(az, range.az.0, range.az.1, tol);
            let wide = (35.0 - tol..=60.0 + tol).contains(&abs_az);
            if !(narrow || wide) || !inside_angle_range(el, 0.0, 0.0, tol) {
                return false;
            }
        } else if !inside_angle_range(az, range.az.0, range.az.1, tol)
            || !inside_angle_range(el, range.el.0, range.el.1, tol)
        {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve() {
        for name in [
            "0+2+0", "0+4+0", "0+5+0", "2+5+0", "4+5+0", "4+5+1", "3+7+0", "4+9+0", "9+10+3",
            "0+7+0", "4+7+0", "2+7+0", "2+3+0", "9+10+5",
        ] {
            let layout = Layout::with_name(name).unwrap();
            assert_eq!(layout.name, name);
            assert!(!layout.channels.is_empty());
        }
        assert!(Layout::with_name("5+5+5").is_none());
    }

    #[test]
    fn lfe_detection() {
        let five_one = Layout::with_name("0+5+0").unwrap();
        assert!(five_one.has_lfe);
        assert_eq!(five_one.channels[3].name, "LFE1");
        assert!(five_one.channels[3].is_lfe);
        assert_eq!(five_one.without_lfe().num_channels(), 5);
    }

    #[test]
    fn nominal_label_from_urn() {
        assert_eq!(nominal_speaker_label("urn:itu:bs:2051:0:speaker:M+030"), "M+030");
        assert_eq!(nominal_speaker_label("LFE"), "LFE1");
        assert_eq!(nominal_speaker_label("LFER"), "LFE2");
        assert_eq!(nominal_speaker_label("garbage"), "");
    }

    #[test]
    fn default_positions_pass_range_check() {
        for name in ["0+2+0", "0+5+0", "4+5+0", "9+10+3", "9+10+5", "4+9+0"] {
            let layout = Layout::with_name(name).unwrap();
            assert!(check_layout_angles(&layout), "layout {name} out of range");
        }
    }

    #[test]
    fn out_of_range_position_fails() {
        let mut layout = Layout::with_name("0+2+0").unwrap();
        layout.channels[0].polar_position.azimuth = 40.0;
        assert!(!check_layout_angles(&layout));
    }

    #[test]
    fn bear_layout_shape() {
        let bear = Layout::with_name("9+10+5").unwrap();
        assert_eq!(bear.num_channels(), 24);
        assert!(!bear.channels.iter().any(|c| c.is_lfe));
        assert!(bear.contains_channel("B+135"));
    }
}
