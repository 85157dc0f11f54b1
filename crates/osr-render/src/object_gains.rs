//! The Objects rendering pipeline: metadata in, a pair of direct/diffuse
//! loudspeaker gain vectors out.
//!
//! Processing order per Rec. ITU-R BS.2127-1 sec. 7.3: screen scaling,
//! screen-edge lock, channel lock, divergence, extent, zone exclusion,
//! gain and the diffuseness split.

use osr_core::coords::{inside_angle_range, rotation_matrix, sgn, CartesianPosition};
use osr_core::layout::Layout;
use osr_core::metadata::{ChannelLock, ExclusionZone, ObjectMetadata, ObjectPosition};
use osr_core::{ConfigError, ScreenEdgeLockHandler, ScreenScaleHandler};

use crate::extent::PolarExtentPanner;
use crate::point_source::PointSourcePanner;

/// Default divergence azimuth range in degrees when the metadata leaves it
/// unset.
const DEFAULT_DIVERGENCE_RANGE: f64 = 45.0;

/// Snaps a source to the nearest loudspeaker when channel lock is active.
struct ChannelLockHandler {
    layout: Layout,
}

impl ChannelLockHandler {
    fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Returns the (possibly snapped) source position. Ties between
    /// equidistant speakers break on the lexicographic order of
    /// (|az|, az, |el|, el).
    fn handle(&self, channel_lock: Option<ChannelLock>, position: CartesianPosition) -> CartesianPosition {
        let Some(lock) = channel_lock else {
            return position;
        };
        let max_distance = lock.max_distance.unwrap_or(f64::MAX);
        let tol = 1e-10;

        // Distances to the normalized real speaker directions
        let mut in_range: Vec<(usize, f64)> = Vec::new();
        for (i, channel) in self.layout.channels.iter().enumerate() {
            let mut speaker = channel.polar_position;
            speaker.distance = 1.0;
            let distance = speaker.to_cartesian().distance_to(position);
            if distance < max_distance {
                in_range.push((i, distance));
            }
        }
        if in_range.is_empty() {
            return position;
        }

        let min_distance = in_range
            .iter()
            .map(|(_, d)| *d)
            .fold(f64::MAX, f64::min);
        let mut candidates: Vec<usize> = in_range
            .iter()
            .filter(|(_, d)| (*d - min_distance).abs() < tol)
            .map(|(i, _)| *i)
            .collect();

        if candidates.len() > 1 {
            candidates.sort_by(|&a, &b| {
                let key = |i: usize| {
                    let p = self.layout.channels[i].polar_position;
                    (p.azimuth.abs(), p.azimuth, p.elevation.abs(), p.elevation)
                };
                key(a).partial_cmp(&key(b)).unwrap()
            });
        }
        self.layout.channels[candidates[0]]
            .polar_position
            .to_cartesian()
    }
}

/// Removes excluded loudspeakers from a gain vector, shifting their energy
/// onto the nearest remaining speakers.
struct ZoneExclusionHandler {
    layout: Layout,
    /// Per speaker: groups of candidate receivers, nearest first
    downmix_groups: Vec<Vec<Vec<usize>>>,
}

fn layer_priority(input_name: &str, output_name: &str) -> i32 {
    let layer_index = |name: &str| match name.as_bytes().first() {
        Some(b'B') => 0,
        Some(b'M') => 1,
        Some(b'U') => 2,
        Some(b'T') => 3,
        _ => 1,
    };
    const PRIORITY: [[i32; 4]; 4] = [[0, 1, 2, 3], [3, 0, 1, 2], [3, 2, 0, 1], [3, 2, 1, 0]];
    PRIORITY[layer_index(input_name)][layer_index(output_name)]
}

impl ZoneExclusionHandler {
    fn new(layout: Layout) -> Self {
        let layout = layout.without_lfe();
        let n = layout.num_channels();
        let cartesian: Vec<CartesianPosition> = layout
            .channels
            .iter()
            .map(|c| c.polar_position_nominal.to_cartesian())
            .collect();

        // Candidate receiver groups per speaker, ordered by the tuple
        // (layer priority, front/back priority, distance, |dy|) over the
        // nominal positions. See Rec. ITU-R BS.2127-0 sec. 7.3.12.2.1.
        let mut downmix_groups = Vec::with_capacity(n);
        for i in 0..n {
            let mut keyed: Vec<((i32, i32, f64, f64), usize)> = (0..n)
                .map(|j| {
                    let lp = layer_priority(&layout.channels[i].name, &layout.channels[j].name);
                    let fb = (sgn(cartesian[j].y) - sgn(cartesian[i].y)).abs();
                    let dist = cartesian[j].distance_to(cartesian[i]);
                    let dy = (cartesian[j].y - cartesian[i].y).abs();
                    ((lp, fb, dist, dy), j)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

            let mut groups: Vec<Vec<usize>> = Vec::new();
            let mut iter = keyed.into_iter();
            if let Some((first_key, first)) = iter.next() {
                let mut current_key = first_key;
                let mut current = vec![first];
                for (key, j) in iter {
                    let same = key.0 == current_key.0
                        && key.1 == current_key.1
                        && (key.2 - current_key.2).abs() < 1e-9
                        && (key.3 - current_key.3).abs() < 1e-9;
                    if same {
                        current.push(j);
                    } else {
                        groups.push(std::mem::take(&mut current));
                        current.push(j);
                        current_key = key;
                    }
                }
                groups.push(current);
            }
            downmix_groups.push(groups);
        }

        Self {
            layout,
            downmix_groups,
        }
    }

    fn excluded_speakers(&self, zones: &[ExclusionZone]) -> Vec<bool> {
        let tol = 1e-6;
        let mut excluded = vec![false; self.layout.num_channels()];
        for zone in zones {
            for (i, channel) in self.layout.channels.iter().enumerate() {
                let nominal = channel.polar_position_nominal;
                match *zone {
                    ExclusionZone::Polar {
                        min_azimuth,
                        max_azimuth,
                        min_elevation,
                        max_elevation,
                    } => {
                        let el = nominal.elevation;
                        let az = nominal.azimuth;
                        if (min_elevation - tol < el && el < max_elevation + tol)
                            && (el > 90.0 - tol || inside_angle_range(az, min_azimuth, max_azimuth, 0.0))
                        {
                            excluded[i] = true;
                        }
                    }
                    ExclusionZone::Cartesian {
                        min_x,
                        max_x,
                        min_y,
                        max_y,
                        min_z,
                        max_z,
                    } => {
                        let p = nominal.to_cartesian();
                        if p.x > min_x - tol
                            && p.x < max_x + tol
                            && p.y > min_y - tol
                            && p.y < max_y + tol
                            && p.z > min_z - tol
                            && p.z < max_z + tol
                        {
                            excluded[i] = true;
                        }
                    }
                }
            }
        }
        excluded
    }

    /// Apply zone exclusion to a gain vector in place. Power moves from
    /// each excluded speaker to its nearest non-excluded group; excluding
    /// every speaker leaves the vector untouched.
    fn handle(&self, zones: &[ExclusionZone], gains: &mut [f64]) {
        let n = self.layout.num_channels();
        debug_assert_eq!(gains.len(), n);
        if zones.is_empty() {
            return;
        }

        let excluded = self.excluded_speakers(zones);
        let count = excluded.iter().filter(|e| **e).count();
        if count == 0 || count == n {
            return;
        }

        let mut downmix = vec![vec![0.0f64; n]; n];
        for col in 0..n {
            for group in &self.downmix_groups[col] {
                let receivers: Vec<usize> = group.iter().copied().filter(|j| !excluded[*j]).collect();
                if !receivers.is_empty() {
                    let share = 1.0 / receivers.len() as f64;
                    for &row in &receivers {
                        downmix[row][col] = share;
                    }
                    break;
                }
            }
        }

        let input: Vec<f64> = gains.to_vec();
        for (i, g_out) in gains.iter_mut().enumerate() {
            let mut power = 0.0;
            for (j, g_in) in input.iter().enumerate() {
                power += downmix[i][j] * g_in * g_in;
            }
            *g_out = power.sqrt();
        }
    }
}

/// Splits a source into three azimuth-spread positions when divergence is
/// active. See Rec. ITU-R BS.2127-0 sec. 7.3.7.1.
fn diverged_positions_and_gains(
    metadata: &ObjectMetadata,
    position: CartesianPosition,
    positions: &mut Vec<CartesianPosition>,
    weights: &mut Vec<f64>,
) {
    positions.clear();
    weights.clear();

    let Some(divergence) = metadata.object_divergence else {
        positions.push(position);
        weights.push(1.0);
        return;
    };
    let x = divergence.value;
    if x == 0.0 {
        positions.push(position);
        weights.push(1.0);
        return;
    }

    let polar = position.to_polar();
    let d = polar.distance;
    let azimuth_range = divergence.azimuth_range.unwrap_or(DEFAULT_DIVERGENCE_RANGE);

    weights.push((1.0 - x) / (x + 1.0));
    let side = x / (x + 1.0);
    weights.push(side);
    weights.push(side);

    // The three sources in a frame where +x points at the source, then
    // rotated onto the actual direction.
    let offset = osr_core::PolarPosition::new(x * azimuth_range, 0.0, d).to_cartesian();
    let raw = [
        CartesianPosition::new(d, 0.0, 0.0),
        CartesianPosition::new(offset.y, -offset.x, offset.z),
        CartesianPosition::new(offset.y, offset.x, offset.z),
    ];

    let rot = rotation_matrix(polar.azimuth, -polar.elevation, 0.0);
    for p in raw {
        let rotated = CartesianPosition::new(
            rot[0][0] * p.x + rot[0][1] * p.y + rot[0][2] * p.z,
            rot[1][0] * p.x + rot[1][1] * p.y + rot[1][2] * p.z,
            rot[2][0] * p.x + rot[2][1] * p.y + rot[2][2] * p.z,
        );
        positions.push(CartesianPosition::new(-rotated.y, rotated.x, rotated.z));
    }
}

/// Computes direct and diffuse gain vectors for Object metadata.
pub struct ObjectGainCalc {
    layout: Layout,
    non_lfe_indices: Vec<usize>,
    psp: PointSourcePanner,
    extent: PolarExtentPanner,
    screen_scale: ScreenScaleHandler,
    screen_edge_lock: ScreenEdgeLockHandler,
    channel_lock: ChannelLockHandler,
    zone_exclusion: ZoneExclusionHandler,
    gains_no_lfe: Vec<f64>,
    diverged_positions: Vec<CartesianPosition>,
    diverged_weights: Vec<f64>,
    gains_per_position: Vec<Vec<f64>>,
}

impl ObjectGainCalc {
    /// `layout` is the full output layout including any LFE channels; the
    /// produced vectors have one entry per layout channel with zeros at
    /// LFE positions.
    pub fn new(layout: &Layout) -> Result<Self, ConfigError> {
        let no_lfe = layout.without_lfe();
        let psp = PointSourcePanner::new(layout)?;
        let extent = PolarExtentPanner::new(&psp);
        let n = psp.num_channels();
        Ok(Self {
            layout: layout.clone(),
            non_lfe_indices: layout.non_lfe_indices(),
            extent,
            screen_scale: ScreenScaleHandler::new(layout.reproduction_screen.as_ref(), no_lfe.clone()),
            screen_edge_lock: ScreenEdgeLockHandler::new(
                layout.reproduction_screen.as_ref(),
                no_lfe.clone(),
            ),
            channel_lock: ChannelLockHandler::new(no_lfe.clone()),
            zone_exclusion: ZoneExclusionHandler::new(no_lfe),
            psp,
            gains_no_lfe: vec![0.0; n],
            diverged_positions: Vec::with_capacity(3),
            diverged_weights: Vec::with_capacity(3),
            gains_per_position: vec![vec![0.0; n]; 3],
        })
    }

    /// Run the Object pipeline. `direct` and `diffuse` must have one entry
    /// per channel of the full layout.
    pub fn calculate(&mut self, metadata: &ObjectMetadata, direct: &mut [f64], diffuse: &mut [f64]) {
        debug_assert_eq!(direct.len(), self.layout.num_channels());
        debug_assert_eq!(diffuse.len(), self.layout.num_channels());

        let position = match metadata.position {
            ObjectPosition::Polar(polar) => polar.to_cartesian(),
            ObjectPosition::Cartesian(cart) => cart,
        };

        let position = self.screen_scale.handle(
            position,
            metadata.screen_ref,
            &metadata.reference_screen,
            metadata.cartesian,
        );
        let position =
            self.screen_edge_lock
                .handle_vector(position, metadata.screen_edge_lock, metadata.cartesian);
        let position = self.channel_lock.handle(metadata.channel_lock, position);

        diverged_positions_and_gains(
            metadata,
            position,
            &mut self.diverged_positions,
            &mut self.diverged_weights,
        );

        for (i, pos) in self.diverged_positions.iter().enumerate() {
            self.extent.handle(
                &self.psp,
                *pos,
                metadata.width,
                metadata.height,
                metadata.depth,
                &mut self.gains_per_position[i],
            );
        }

        // Power summation over the diverged sources
        let n = self.gains_no_lfe.len();
        for ch in 0..n {
            let mut power = 0.0;
            for (w, g) in self
                .diverged_weights
                .iter()
                .zip(self.gains_per_position.iter())
            {
                power += w * g[ch] * g[ch];
            }
            self.gains_no_lfe[ch] = power.sqrt();
        }

        self.zone_exclusion
            .handle(&metadata.zone_exclusion, &mut self.gains_no_lfe);

        for g in self.gains_no_lfe.iter_mut() {
            *g *= metadata.gain;
        }

        // Diffuseness split, expanded onto the full layout
        let direct_coefficient = (1.0 - metadata.diffuse).sqrt();
        let diffuse_coefficient = metadata.diffuse.sqrt();
        direct.fill(0.0);
        diffuse.fill(0.0);
        for (no_lfe_ch, &full_ch) in self.non_lfe_indices.iter().enumerate() {
            direct[full_ch] = self.gains_no_lfe[no_lfe_ch] * direct_coefficient;
            diffuse[full_ch] = self.gains_no_lfe[no_lfe_ch] * diffuse_coefficient;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osr_core::metadata::ObjectDivergence;
    use osr_core::{Layout, PolarPosition};

    fn calc(name: &str) -> ObjectGainCalc {
        ObjectGainCalc::new(&Layout::with_name(name).unwrap()).unwrap()
    }

    fn run(calc: &mut ObjectGainCalc, metadata: &ObjectMetadata) -> (Vec<f64>, Vec<f64>) {
        let n = calc.layout.num_channels();
        let mut direct = vec![0.0; n];
        let mut diffuse = vec![0.0; n];
        calc.calculate(metadata, &mut direct, &mut diffuse);
        (direct, diffuse)
    }

    fn object_at(az: f64, el: f64) -> ObjectMetadata {
        ObjectMetadata {
            position: ObjectPosition::Polar(PolarPosition::new(az, el, 1.0)),
            ..Default::default()
        }
    }

    #[test]
    fn centre_object_goes_to_centre_speaker() {
        let mut calc = calc("0+5+0");
        let (direct, diffuse) = run(&mut calc, &object_at(0.0, 0.0));
        // Channel order: M+030, M-030, M+000, LFE1, M+110, M-110
        assert!((direct[2] - 1.0).abs() < 1e-9);
        assert!(direct[3].abs() < 1e-12, "LFE must stay silent");
        assert!(diffuse.iter().all(|g| g.abs() < 1e-12));
    }

    #[test]
    fn diffuse_split_preserves_power() {
        let mut calc = calc("0+5+0");
        let mut md = object_at(10.0, 0.0);
        md.diffuse = 0.3;
        let (direct, diffuse) = run(&mut calc, &md);
        let total: f64 = direct.iter().map(|g| g * g).sum::<f64>()
            + diffuse.iter().map(|g| g * g).sum::<f64>();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn channel_lock_snaps_within_distance() {
        let mut calc = calc("0+5+0");
        let mut md = object_at(25.0, 0.0);
        md.channel_lock = Some(ChannelLock { max_distance: Some(2.0) });
        let (direct, _) = run(&mut calc, &md);
        assert!((direct[0] - 1.0).abs() < 1e-9, "expected a hard M+030 snap");
    }

    #[test]
    fn channel_lock_out_of_range_is_passthrough() {
        let mut calc = calc("0+5+0");
        let mut md = object_at(15.0, 0.0);
        md.channel_lock = Some(ChannelLock { max_distance: Some(0.01) });
        let (direct, _) = run(&mut calc, &md);
        // Between centre and M+030, both active
        assert!(direct[0] > 0.1 && direct[2] > 0.1);
    }

    #[test]
    fn channel_lock_tie_breaks_lexicographically() {
        let mut calc = calc("0+2+0");
        let mut md = object_at(0.0, 0.0);
        md.channel_lock = Some(ChannelLock { max_distance: Some(2.0) });
        let (direct, _) = run(&mut calc, &md);
        // M+030 and M-030 are equidistant; ordering on (|az|, az, |el|, el)
        // puts the negative azimuth first
        assert!((direct[1] - 1.0).abs() < 1e-6, "gains {direct:?}");
    }

    #[test]
    fn zone_exclusion_moves_energy_without_losing_it() {
        let mut calc = calc("0+5+0");
        let mut md = object_at(0.0, 0.0);
        md.zone_exclusion = vec![ExclusionZone::Polar {
            min_azimuth: -10.0,
            max_azimuth: 10.0,
            min_elevation: -10.0,
            max_elevation: 10.0,
        }];
        let (direct, _) = run(&mut calc, &md);
        assert!(direct[2].abs() < 1e-12, "M+000 excluded but active");
        let total: f64 = direct.iter().map(|g| g * g).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn excluding_everything_changes_nothing() {
        let mut calc = calc("0+5+0");
        let reference = run(&mut calc, &object_at(20.0, 0.0)).0;
        let mut md = object_at(20.0, 0.0);
        md.zone_exclusion = vec![ExclusionZone::Polar {
            min_azimuth: -180.0,
            max_azimuth: 180.0,
            min_elevation: -90.0,
            max_elevation: 90.0,
        }];
        let (direct, _) = run(&mut calc, &md);
        for (a, b) in reference.iter().zip(direct.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn divergence_spreads_across_three_positions() {
        let mut calc = calc("0+5+0");
        let mut md = object_at(0.0, 0.0);
        md.object_divergence = Some(ObjectDivergence {
            value: 1.0,
            azimuth_range: Some(30.0),
            position_range: None,
        });
        let (direct, _) = run(&mut calc, &md);
        // Full divergence: all energy at az +-30, nothing in the centre
        assert!(direct[2].abs() < 1e-6, "centre still active: {}", direct[2]);
        assert!(direct[0] > 0.5 && direct[1] > 0.5);
        let total: f64 = direct.iter().map(|g| g * g).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn metadata_gain_scales_output() {
        let mut calc = calc("0+5+0");
        let mut md = object_at(0.0, 0.0);
        md.gain = 0.5;
        let (direct, _) = run(&mut calc, &md);
        assert!((direct[2] - 0.5).abs() < 1e-9);
    }
}
