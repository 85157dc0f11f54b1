//! DirectSpeakers channel routing.
//!
//! Attempts, in order: the common-definitions mapping rules (when the
//! metadata names an ITU pack), an exact label match, LFE routing, and a
//! closest-speaker-within-bounds search after screen-edge locking. Anything
//! left over is panned as a point source. See Rec. ITU-R BS.2127-1 sec. 8.

use once_cell::sync::Lazy;
use osr_core::coords::inside_angle_range;
use osr_core::layout::{nominal_speaker_label, Layout};
use osr_core::metadata::{is_lfe_metadata, itu_pack_layout, DirectSpeakerMetadata};
use osr_core::{ConfigError, PolarPosition, ScreenEdgeLockHandler};

use crate::point_source::PointSourcePanner;

/// One speaker-label mapping rule. A rule applies when the label matches,
/// the input and output layout constraints (when present) hold, and every
/// gain target exists in the output layout.
struct MappingRule {
    speaker_label: &'static str,
    input_layouts: &'static [&'static str],
    output_layouts: &'static [&'static str],
    gains: &'static [(&'static str, f64)],
}

const SQ2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Ordered mapping rules for the common-definitions input packs: identity
/// routes first, then the preferred degradations.
static MAPPING_RULES: Lazy<Vec<MappingRule>> = Lazy::new(|| {
    vec![
        // Mono lands on the centre, else splits onto the front pair
        MappingRule {
            speaker_label: "M+000",
            input_layouts: &["0+1+0"],
            output_layouts: &[],
            gains: &[("M+000", 1.0)],
        },
        MappingRule {
            speaker_label: "M+000",
            input_layouts: &["0+1+0"],
            output_layouts: &[],
            gains: &[("M+030", SQ2), ("M-030", SQ2)],
        },
        // Identity routes
        MappingRule { speaker_label: "M+000", input_layouts: &[], output_layouts: &[], gains: &[("M+000", 1.0)] },
        MappingRule { speaker_label: "M+030", input_layouts: &[], output_layouts: &[], gains: &[("M+030", 1.0)] },
        MappingRule { speaker_label: "M-030", input_layouts: &[], output_layouts: &[], gains: &[("M-030", 1.0)] },
        MappingRule { speaker_label: "M+060", input_layouts: &[], output_layouts: &[], gains: &[("M+060", 1.0)] },
        MappingRule { speaker_label: "M-060", input_layouts: &[], output_layouts: &[], gains: &[("M-060", 1.0)] },
        MappingRule { speaker_label: "M+090", input_layouts: &[], output_layouts: &[], gains: &[("M+090", 1.0)] },
        MappingRule { speaker_label: "M-090", input_layouts: &[], output_layouts: &[], gains: &[("M-090", 1.0)] },
        MappingRule { speaker_label: "M+110", input_layouts: &[], output_layouts: &[], gains: &[("M+110", 1.0)] },
        MappingRule { speaker_label: "M-110", input_layouts: &[], output_layouts: &[], gains: &[("M-110", 1.0)] },
        MappingRule { speaker_label: "M+135", input_layouts: &[], output_layouts: &[], gains: &[("M+135", 1.0)] },
        MappingRule { speaker_label: "M-135", input_layouts: &[], output_layouts: &[], gains: &[("M-135", 1.0)] },
        MappingRule { speaker_label: "M+180", input_layouts: &[], output_layouts: &[], gains: &[("M+180", 1.0)] },
        MappingRule { speaker_label: "M+SC", input_layouts: &[], output_layouts: &[], gains: &[("M+SC", 1.0)] },
        MappingRule { speaker_label: "M-SC", input_layouts: &[], output_layouts: &[], gains: &[("M-SC", 1.0)] },
        MappingRule { speaker_label: "U+000", input_layouts: &[], output_layouts: &[], gains: &[("U+000", 1.0)] },
        MappingRule { speaker_label: "U+030", input_layouts: &[], output_layouts: &[], gains: &[("U+030", 1.0)] },
        MappingRule { speaker_label: "U-030", input_layouts: &[], output_layouts: &[], gains: &[("U-030", 1.0)] },
        MappingRule { speaker_label: "U+045", input_layouts: &[], output_layouts: &[], gains: &[("U+045", 1.0)] },
        MappingRule { speaker_label: "U-045", input_layouts: &[], output_layouts: &[], gains: &[("U-045", 1.0)] },
        MappingRule { speaker_label: "U+090", input_layouts: &[], output_layouts: &[], gains: &[("U+090", 1.0)] },
        MappingRule { speaker_label: "U-090", input_layouts: &[], output_layouts: &[], gains: &[("U-090", 1.0)] },
        MappingRule { speaker_label: "U+110", input_layouts: &[], output_layouts: &[], gains: &[("U+110", 1.0)] },
        MappingRule { speaker_label: "U-110", input_layouts: &[], output_layouts: &[], gains: &[("U-110", 1.0)] },
        MappingRule { speaker_label: "U+135", input_layouts: &[], output_layouts: &[], gains: &[("U+135", 1.0)] },
        MappingRule { speaker_label: "U-135", input_layouts: &[], output_layouts: &[], gains: &[("U-135", 1.0)] },
        MappingRule { speaker_label: "U+180", input_layouts: &[], output_layouts: &[], gains: &[("U+180", 1.0)] },
        MappingRule { speaker_label: "UH+180", input_layouts: &[], output_layouts: &[], gains: &[("UH+180", 1.0)] },
        MappingRule { speaker_label: "T+000", input_layouts: &[], output_layouts: &[], gains: &[("T+000", 1.0)] },
        MappingRule { speaker_label: "B+000", input_layouts: &[], output_layouts: &[], gains: &[("B+000", 1.0)] },
        MappingRule { speaker_label: "B+045", input_layouts: &[], output_layouts: &[], gains: &[("B+045", 1.0)] },
        MappingRule { speaker_label: "B-045", input_layouts: &[], output_layouts: &[], gains: &[("B-045", 1.0)] },
        MappingRule { speaker_label: "LFE1", input_layouts: &[], output_layouts: &[], gains: &[("LFE1", 1.0)] },
        MappingRule { speaker_label: "LFE2", input_layouts: &[], output_layouts: &[], gains: &[("LFE2", 1.0)] },
        // Preferred degradations
        MappingRule { speaker_label: "LFE2", input_layouts: &[], output_layouts: &[], gains: &[("LFE1", 1.0)] },
        MappingRule {
            speaker_label: "M+110",
            input_layouts: &[],
            output_layouts: &[],
            gains: &[("M+090", SQ2), ("M+135", SQ2)],
        },
        MappingRule {
            speaker_label: "M-110",
            input_layouts: &[],
            output_layouts: &[],
            gains: &[("M-090", SQ2), ("M-135", SQ2)],
        },
        MappingRule { speaker_label: "M+110", input_layouts: &[], output_layouts: &[], gains: &[("M+135", 1.0)] },
        MappingRule { speaker_label: "M-110", input_layouts: &[], output_layouts: &[], gains: &[("M-135", 1.0)] },
        MappingRule { speaker_label: "M+135", input_layouts: &[], output_layouts: &[], gains: &[("M+110", 1.0)] },
        MappingRule { speaker_label: "M-135", input_layouts: &[], output_layouts: &[], gains: &[("M-110", 1.0)] },
        MappingRule { speaker_label: "U+030", input_layouts: &[], output_layouts: &[], gains: &[("U+045", 1.0)] },
        MappingRule { speaker_label: "U-030", input_layouts: &[], output_layouts: &[], gains: &[("U-045", 1.0)] },
        MappingRule { speaker_label: "U+045", input_layouts: &[], output_layouts: &[], gains: &[("U+030", 1.0)] },
        MappingRule { speaker_label: "U-045", input_layouts: &[], output_layouts: &[], gains: &[("U-030", 1.0)] },
        MappingRule { speaker_label: "U+110", input_layouts: &[], output_layouts: &[], gains: &[("U+135", 1.0)] },
        MappingRule { speaker_label: "U-110", input_layouts: &[], output_layouts: &[], gains: &[("U-135", 1.0)] },
        MappingRule { speaker_label: "U+135", input_layouts: &[], output_layouts: &[], gains: &[("U+110", 1.0)] },
        MappingRule { speaker_label: "U-135", input_layouts: &[], output_layouts: &[], gains: &[("U-110", 1.0)] },
        MappingRule {
            speaker_label: "M+180",
            input_layouts: &[],
            output_layouts: &[],
            gains: &[("M+135", SQ2), ("M-135", SQ2)],
        },
        MappingRule {
            speaker_label: "U+180",
            input_layouts: &[],
            output_layouts: &[],
            gains: &[("U+135", SQ2), ("U-135", SQ2)],
        },
        MappingRule { speaker_label: "U+180", input_layouts: &[], output_layouts: &[], gains: &[("UH+180", 1.0)] },
        MappingRule {
            speaker_label: "UH+180",
            input_layouts: &[],
            output_layouts: &[],
            gains: &[("U+135", SQ2), ("U-135", SQ2)],
        },
        MappingRule {
            speaker_label: "T+000",
            input_layouts: &[],
            output_layouts: &[],
            gains: &[("U+045", 0.5), ("U-045", 0.5), ("U+135", 0.5), ("U-135", 0.5)],
        },
    ]
});

fn rule_applies(rule: &MappingRule, input_layout: &str, speaker_label: &str, output: &Layout) -> bool {
    if speaker_label != rule.speaker_label {
        return false;
    }
    if !rule.input_layouts.is_empty() && !rule.input_layouts.contains(&input_layout) {
        return false;
    }
    if !rule.output_layouts.is_empty() && !rule.output_layouts.iter().any(|l| *l == output.name) {
        return false;
    }
    rule.gains.iter().all(|(name, _)| output.contains_channel(name))
}

/// Gains for a DirectSpeakers channel on the output layout.
pub struct DirectSpeakerGainCalc {
    layout: Layout,
    psp: PointSourcePanner,
    screen_edge_lock: ScreenEdgeLockHandler,
    gains_psp: Vec<f64>,
}

impl DirectSpeakerGainCalc {
    /// `layout` is the full output layout including LFE channels.
    pub fn new(layout: &Layout) -> Result<Self, ConfigError> {
        let psp = PointSourcePanner::new(layout)?;
        let n_psp = psp.num_channels();
        Ok(Self {
            screen_edge_lock: ScreenEdgeLockHandler::new(
                layout.reproduction_screen.as_ref(),
                layout.clone(),
            ),
            layout: layout.clone(),
            psp,
            gains_psp: vec![0.0; n_psp],
        })
    }

    /// Fill `gains` (one entry per layout channel) for the metadata block.
    pub fn calculate(&mut self, metadata: &DirectSpeakerMetadata, gains: &mut [f64]) {
        debug_assert_eq!(gains.len(), self.layout.num_channels());
        gains.fill(0.0);

        let is_lfe = is_lfe_metadata(metadata);
        let nominal_label = nominal_speaker_label(&metadata.speaker_label);

        // 1. Mapping rules, when the pack implies a known input layout
        if let Some(pack_id) = &metadata.audio_pack_format_id {
            if let Some(input_layout) = itu_pack_layout(pack_id) {
                for rule in MAPPING_RULES.iter() {
                    if rule_applies(rule, input_layout, nominal_label, &self.layout) {
                        for (name, gain) in rule.gains {
                            if let Some(idx) = self.layout.channel_index(name) {
                                gains[idx] = *gain * metadata.gain;
                            }
                        }
                        return;
                    }
                }
            }
        }

        // 2. Exact label match with matching LFE-ness
        if let Some(idx) = self.layout.channel_index(nominal_label) {
            if self.layout.channels[idx].is_lfe == is_lfe {
                gains[idx] = metadata.gain;
                return;
            }
        }

        // 3. Screen edge lock on the metadata direction
        let mut direction = metadata.polar_position;
        let position = self
            .screen_edge_lock
            .handle_vector(direction.polar().to_cartesian(), metadata.screen_edge_lock, false);
        let polar = position.to_polar();
        direction.azimuth = polar.azimuth;
        direction.elevation = polar.elevation;
        direction.distance = polar.distance;

        // 4. Frequency-flagged LFE content goes to LFE1 or nowhere
        if is_lfe {
            if let Some(idx) = self.layout.channel_index("LFE1") {
                gains[idx] = metadata.gain;
            }
            return;
        }

        // 5. Unique closest speaker inside the position bounds
        if let Some(idx) = self.find_closest_within_bounds(&direction, 1e-5) {
            gains[idx] = metadata.gain;
            return;
        }

        // 6. Point-source panning fallback
        self.psp.gains_polar(
            PolarPosition::new(direction.azimuth, direction.elevation, direction.distance),
            &mut self.gains_psp,
        );
        let mut psp_ch = 0;
        for (i, channel) in self.layout.channels.iter().enumerate() {
            if !channel.is_lfe {
                gains[i] = self.gains_psp[psp_ch] * metadata.gain;
                psp_ch += 1;
            }
        }
    }

    /// The unique in-bounds speaker nearest to the direction, or None when
    /// there is no candidate or the minimum is tied.
    /// See Rec. ITU-R BS.2127-0 sec. 8.5.
    fn find_closest_within_bounds(
        &self,
        direction: &osr_core::metadata::DirectSpeakerPolarPosition,
        tol: f64,
    ) -> Option<usize> {
        let (min_az, max_az, min_el, max_el, min_dist, max_dist) = match direction.bounds {
            Some(b) => (
                b.min_azimuth,
                b.max_azimuth,
                b.min_elevation,
                b.max_elevation,
                b.min_distance,
                b.max_distance,
            ),
            None => (
                direction.azimuth,
                direction.azimuth,
                direction.elevation,
                direction.elevation,
                direction.distance,
                direction.distance,
            ),
        };

        let mut within: Vec<usize> = Vec::new();
        for (i, channel) in self.layout.channels.iter().enumerate() {
            let speaker = channel.polar_position_nominal;
            if (inside_angle_range(speaker.azimuth, min_az, max_az, tol) || speaker.elevation > 90.0 - tol)
                && speaker.elevation <= max_el + tol
                && speaker.elevation >= min_el - tol
                && speaker.distance <= max_dist + tol
                && speaker.distance >= min_dist - tol
            {
                within.push(i);
            }
        }

        match within.len() {
            0 => None,
            1 => Some(within[0]),
            _ => {
                let target = direction.polar().to_cartesian();
                let distances: Vec<f64> = within
                    .iter()
                    .map(|&i| self.layout.channels[i].polar_position_nominal.to_cartesian().distance_to(target))
                    .collect();
                let smallest = distances.iter().cloned().fold(f64::MAX, f64::min);
                let closest: Vec<usize> = within
                    .iter()
                    .zip(&distances)
                    .filter(|(_, d)| **d == smallest)
                    .map(|(i, _)| *i)
                    .collect();
                // A tie means no unique answer; fall through to the panner
                if closest.len() == 1 {
                    Some(closest[0])
                } else {
                    None
                }
            }
        }
    }
}
