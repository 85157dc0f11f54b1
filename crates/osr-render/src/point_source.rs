//! Point-source panning over a triangulated loudspeaker hull.
//!
//! The panner covers the sphere with triangle and quadrilateral regions
//! spanning the layout's real loudspeakers plus synthesized fill speakers
//! where the array has large gaps. A direction is panned by the first
//! region that yields an all-non-negative gain vector; fill-speaker gains
//! are folded back onto their source channels. See Rec. ITU-R BS.2127-1
//! sec. 6.1.

use osr_core::coords::{mat3_inverse, vec_norm, CartesianPosition, PolarPosition};
use osr_core::layout::{Channel, Layout};
use osr_core::ConfigError;

use crate::hulls;

const REGION_TOL: f64 = 1e-6;

/// A triangular region: gains solve the source direction as a non-negative
/// combination of the three vertex directions.
#[derive(Debug, Clone)]
struct Triplet {
    channel_inds: [usize; 3],
    /// Inverse of the matrix whose rows are the vertex unit vectors
    inverse: [[f64; 3]; 3],
}

impl Triplet {
    /// Returns None for degenerate (near-colinear) vertex sets.
    fn new(channel_inds: [usize; 3], positions: [CartesianPosition; 3]) -> Option<Self> {
        let units: Vec<CartesianPosition> = positions.iter().map(|p| p.normalized()).collect();
        let mat = [
            [units[0].x, units[0].y, units[0].z],
            [units[1].x, units[1].y, units[1].z],
            [units[2].x, units[2].y, units[2].z],
        ];
        Some(Self {
            channel_inds,
            inverse: mat3_inverse(&mat)?,
        })
    }

    /// Gains for `direction`, or None if it lies outside the region.
    /// Valid gains are clipped to non-negative and L2-normalized.
    fn gains(&self, direction: CartesianPosition, out: &mut [f64; 3]) -> bool {
        let d = [direction.x, direction.y, direction.z];
        for j in 0..3 {
            out[j] = d[0] * self.inverse[0][j] + d[1] * self.inverse[1][j] + d[2] * self.inverse[2][j];
        }
        if out.iter().any(|g| *g < -REGION_TOL) {
            return false;
        }
        for g in out.iter_mut() {
            *g = g.max(0.0);
        }
        let norm = (out[0] * out[0] + out[1] * out[1] + out[2] * out[2]).sqrt();
        if norm < REGION_TOL {
            return false;
        }
        for g in out.iter_mut() {
            *g /= norm;
        }
        true
    }
}

/// Quadrilateral region panned by inverting the bilinear blend of its four
/// corner directions.
#[derive(Debug, Clone)]
struct QuadRegion {
    channel_inds: [usize; 4],
    positions: [CartesianPosition; 4],
    poly_x: [CartesianPosition; 3],
    poly_y: [CartesianPosition; 3],
}

impl QuadRegion {
    fn new(channel_inds: [usize; 4], positions: [CartesianPosition; 4]) -> Self {
        let units: Vec<CartesianPosition> = positions.iter().map(|p| p.normalized()).collect();
        let order = order_around_centre(&units);
        let inds = [
            channel_inds[order[0]],
            channel_inds[order[1]],
            channel_inds[order[2]],
            channel_inds[order[3]],
        ];
        let pos = [units[order[0]], units[order[1]], units[order[2]], units[order[3]]];

        Self {
            channel_inds: inds,
            positions: pos,
            poly_x: Self::axis_poly(pos[0], pos[1], pos[2], pos[3]),
            poly_y: Self::axis_poly(pos[0], pos[3], pos[2], pos[1]),
        }
    }

    /// Quadratic coefficients (a, b, c) of the plane condition
    /// `d . [((1-t) p0 + t p1) x ((1-t) p3 + t p2)] = 0`.
    fn axis_poly(
        p0: CartesianPosition,
        p1: CartesianPosition,
        p2: CartesianPosition,
        p3: CartesianPosition,
    ) -> [CartesianPosition; 3] {
        let a = (p1 - p0).cross(p2 - p3);
        let b = p0.cross(p2 - p3) + (p1 - p0).cross(p3);
        let c = p0.cross(p3);
        [a, b, c]
    }

    /// Panning parameters along one axis, in [0, 1], up to two candidates.
    fn pan_values(poly: &[CartesianPosition; 3], direction: CartesianPosition) -> Vec<f64> {
        let a = direction.dot(poly[0]);
        let b = direction.dot(poly[1]);
        let c = direction.dot(poly[2]);

        let mut roots = Vec::new();
        if a.abs() < 1e-10 {
            if b.abs() > 1e-10 {
                roots.push(-c / b);
            }
        } else {
            let disc = b * b - 4.0 * a * c;
            if disc >= 0.0 {
                let sqrt_disc = disc.sqrt();
                roots.push((-b + sqrt_disc) / (2.0 * a));
                roots.push((-b - sqrt_disc) / (2.0 * a));
            }
        }
        roots
            .into_iter()
            .filter(|r| (-REGION_TOL..=1.0 + REGION_TOL).contains(r))
            .map(|r| r.clamp(0.0, 1.0))
            .collect()
    }

    fn gains(&self, direction: CartesianPosition, out: &mut [f64; 4]) -> bool {
        for x in Self::pan_values(&self.poly_x, direction) {
            for y in Self::pan_values(&self.poly_y, direction) {
                let w = [(1.0 - x) * (1.0 - y), x * (1.0 - y), x * y, (1.0 - x) * y];
                // The blended direction must point the same way as the
                // source, not through the centre of the sphere.
                let blended = self.positions[0] * w[0]
                    + self.positions[1] * w[1]
                    + self.positions[2] * w[2]
                    + self.positions[3] * w[3];
                if blended.dot(direction) <= 0.0 {
                    continue;
                }
                let norm = (w.iter().map(|g| g * g).sum::<f64>()).sqrt();
                if norm < REGION_TOL {
                    continue;
                }
                for (o, g) in out.iter_mut().zip(w.iter()) {
                    *o = g / norm;
                }
                return true;
            }
        }
        false
    }
}

/// Ring of real speakers around a virtual centre speaker. The ring is
/// split into triangles against the centre; the centre's gain is spread
/// equally over the ring before normalization.
#[derive(Debug, Clone)]
struct VirtualNgon {
    channel_inds: Vec<usize>,
    triplets: Vec<([usize; 2], Triplet)>,
}

impl VirtualNgon {
    fn new(channel_inds: Vec<usize>, positions: Vec<CartesianPosition>, centre: CartesianPosition) -> Self {
        let units: Vec<CartesianPosition> = positions.iter().map(|p| p.normalized()).collect();
        let order = order_around_centre(&units);
        let n = order.len();
        let mut triplets = Vec::new();
        for i in 0..n {
            let v0 = order[i];
            let v1 = order[(i + 1) % n];
            // Local triplet of two adjacent ring vertices plus the centre;
            // indices 0/1 address positions within this ngon.
            if let Some(triplet) = Triplet::new([0, 1, 2], [units[v0], units[v1], centre.normalized()]) {
                triplets.push(([v0, v1], triplet));
            }
        }
        Self {
            channel_inds,
            triplets,
        }
    }

    fn gains(&self, direction: CartesianPosition, out: &mut [f64]) -> bool {
        debug_assert_eq!(out.len(), self.channel_inds.len());
        for g in out.iter_mut() {
            *g = 0.0;
        }
        let n = self.channel_inds.len() as f64;
        for (verts, triplet) in &self.triplets {
            let mut tri_gains = [0.0; 3];
            if triplet.gains(direction, &mut tri_gains) {
                out[verts[0]] += tri_gains[0];
                out[verts[1]] += tri_gains[1];
                // Spread the virtual centre gain equally over the ring
                let centre_share = tri_gains[2] / n;
                for g in out.iter_mut() {
                    *g += centre_share;
                }
                let norm = vec_norm(out);
                if norm < REGION_TOL {
                    return false;
                }
                for g in out.iter_mut() {
                    *g /= norm;
                }
                return true;
            }
        }
        false
    }
}

/// Sort vertex indices to run anticlockwise around the (normalized) mean
/// direction of the set.
fn order_around_centre(units: &[CartesianPosition]) -> Vec<usize> {
    let mut centre = CartesianPosition::new(0.0, 0.0, 0.0);
    for u in units {
        centre = centre + *u;
    }
    let centre = centre.normalized();

    // Tangent-plane basis at the centre
    let mut u_axis = units[0] - centre * units[0].dot(centre);
    if u_axis.norm() < 1e-9 {
        u_axis = CartesianPosition::new(0.0, 0.0, 1.0) - centre * centre.z;
    }
    let u_axis = u_axis.normalized();
    let v_axis = centre.cross(u_axis);

    let mut order: Vec<usize> = (0..units.len()).collect();
    order.sort_by(|&a, &b| {
        let ta = units[a] - centre * units[a].dot(centre);
        let tb = units[b] - centre * units[b].dot(centre);
        let angle_a = ta.dot(v_axis).atan2(ta.dot(u_axis));
        let angle_b = tb.dot(v_axis).atan2(tb.dot(u_axis));
        angle_a.partial_cmp(&angle_b).unwrap()
    });
    order
}

enum DownmixOutput {
    None,
    /// Pan in 0+5+0, fold to stereo (Rec. ITU-R BS.2127-0 sec. 6.1.2.4)
    Stereo,
    /// Pan in 4+7+0, fold to 3.1.2 (IAMF v1.0.0 sec. 7.6.2)
    ThreeOneTwo,
}

/// Gains for a point source on the configured loudspeaker layout.
pub struct PointSourcePanner {
    output_layout: Layout,
    internal_layout: Layout,
    downmix_output: DownmixOutput,
    /// Extended-speaker index to internal channel index
    downmix_mapping: Vec<usize>,
    ngons: Vec<VirtualNgon>,
    triplets: Vec<Triplet>,
    quads: Vec<QuadRegion>,
    max_ngon_verts: usize,
}

impl PointSourcePanner {
    pub fn new(layout: &Layout) -> Result<Self, ConfigError> {
        let output_layout = layout.without_lfe();
        let mut internal_layout = output_layout.clone();
        let mut downmix_output = DownmixOutput::None;

        let hull: &[hulls::Facet] = match output_layout.name.as_str() {
            "0+2+0" => {
                downmix_output = DownmixOutput::Stereo;
                internal_layout = Layout::with_name("0+5+0")
                    .expect("preset exists")
                    .without_lfe();
                hulls::HULL_0_5_0
            }
            "0+4+0" => hulls::HULL_0_4_0,
            "0+5+0" => hulls::HULL_0_5_0,
            "2+5+0" => hulls::HULL_2_5_0,
            "4+5+0" => hulls::HULL_4_5_0,
            "4+5+1" => hulls::HULL_4_5_1,
            "3+7+0" => hulls::HULL_3_7_0,
            "4+9+0" => {
                let (wide_left, wide_right) = screen_speaker_widths(&output_layout)?;
                // The screen speakers take the nominal direction of the
                // azimuth band they actually sit in.
                let left_ind = internal_layout.channel_index("M+SC").expect("4+9+0 has M+SC");
                let right_ind = internal_layout.channel_index("M-SC").expect("4+9+0 has M-SC");
                internal_layout.channels[left_ind].polar_position_nominal.azimuth =
                    if wide_left { 45.0 } else { 15.0 };
                internal_layout.channels[right_ind].polar_position_nominal.azimuth =
                    if wide_right { -45.0 } else { -15.0 };
                match (wide_left, wide_right) {
                    (false, false) => hulls::HULL_4_9_0,
                    (true, false) => hulls::HULL_4_9_0_WIDE_L,
                    (false, true) => hulls::HULL_4_9_0_WIDE_R,
                    (true, true) => hulls::HULL_4_9_0_WIDE,
                }
            }
            "9+10+3" => hulls::HULL_9_10_3,
            "0+7+0" => hulls::HULL_0_7_0,
            "4+7+0" => hulls::HULL_4_7_0,
            "2+7+0" => hulls::HULL_2_7_0,
            "9+10+5" => hulls::HULL_9_10_5,
            "2+3+0" => {
                downmix_output = DownmixOutput::ThreeOneTwo;
                internal_layout = Layout::with_name("4+7+0")
                    .expect("preset exists")
                    .without_lfe();
                hulls::HULL_4_7_0
            }
            other => return Err(ConfigError::InvalidLayout(other.to_string())),
        };

        let n_internal = internal_layout.num_channels();
        let mut downmix_mapping: Vec<usize> = (0..n_internal).collect();
        let mut positions: Vec<CartesianPosition> = internal_layout
            .channels
            .iter()
            .map(|c| c.polar_position.to_cartesian())
            .collect();

        let extra = extra_speakers_layout(&internal_layout, &mut downmix_mapping);
        let n_extra = extra.channels.len();

        // The top and bottom fill speakers are purely virtual: regions that
        // touch them become ngons instead. They can only be the last one or
        // two entries.
        let mut virtual_inds = Vec::new();
        for i in [n_extra.saturating_sub(2), n_extra - 1] {
            let name = extra.channels[i].name.as_str();
            if (name == "TOP" || name == "BOTTOM") && !virtual_inds.contains(&(n_internal + i)) {
                virtual_inds.push(n_internal + i);
            }
        }
        for channel in &extra.channels {
            positions.push(channel.polar_position.to_cartesian());
        }

        let mut ngons = Vec::new();
        let mut triplets = Vec::new();
        let mut quads = Vec::new();

        for facet in hull {
            let has_virtual = facet.iter().any(|v| virtual_inds.contains(&(*v as usize)));
            if has_virtual {
                continue;
            }
            match facet.len() {
                3 => {
                    let inds = [facet[0] as usize, facet[1] as usize, facet[2] as usize];
                    if let Some(triplet) =
                        Triplet::new(inds, [positions[inds[0]], positions[inds[1]], positions[inds[2]]])
                    {
                        triplets.push(triplet);
                    }
                }
                4 => {
                    let inds = [
                        facet[0] as usize,
                        facet[1] as usize,
                        facet[2] as usize,
                        facet[3] as usize,
                    ];
                    quads.push(QuadRegion::new(
                        inds,
                        [positions[inds[0]], positions[inds[1]], positions[inds[2]], positions[inds[3]]],
                    ));
                }
                _ => {}
            }
        }

        for &virt in &virtual_inds {
            let mut ring: Vec<usize> = Vec::new();
            for facet in hull {
                if facet.iter().any(|v| *v as usize == virt) {
                    for v in facet.iter() {
                        let v = *v as usize;
                        if v != virt && !ring.contains(&v) {
                            ring.push(v);
                        }
                    }
                }
            }
            ring.sort_unstable();
            let ring_positions: Vec<CartesianPosition> = ring.iter().map(|&i| positions[i]).collect();
            ngons.push(VirtualNgon::new(ring, ring_positions, positions[virt]));
        }

        let max_ngon_verts = ngons.iter().map(|n| n.channel_inds.len()).max().unwrap_or(0);

        Ok(Self {
            output_layout,
            internal_layout,
            downmix_output,
            downmix_mapping,
            ngons,
            triplets,
            quads,
            max_ngon_verts,
        })
    }

    /// Number of output channels the panner produces gains for (the non-LFE
    /// channels of the target layout).
    pub fn num_channels(&self) -> usize {
        self.output_layout.num_channels()
    }

    /// The non-LFE output layout the panner targets.
    pub fn output_layout(&self) -> &Layout {
        &self.output_layout
    }

    pub fn gains_polar(&self, direction: PolarPosition, gains: &mut [f64]) {
        self.gains(direction.to_cartesian(), gains)
    }

    /// Compute the panning gains for a source direction. `gains` must have
    /// `num_channels()` entries; the result is L2-normalized.
    pub fn gains(&self, direction: CartesianPosition, gains: &mut [f64]) {
        debug_assert_eq!(gains.len(), self.num_channels());
        match self.downmix_output {
            DownmixOutput::None => {
                self.gains_from_regions(direction, gains);
            }
            DownmixOutput::Stereo => {
                let mut internal = vec![0.0; self.internal_layout.num_channels()];
                self.gains_from_regions(direction, &mut internal);

                // Fold 0+5+0 onto the stereo pair; the centre splits evenly
                // and the surrounds fold at -3 dB, with a front/rear balance
                // term keeping rear content slightly lower.
                let k = std::f64::consts::FRAC_1_SQRT_2;
                let third = 1.0 / 3f64.sqrt();
                gains[0] = internal[0] + third * internal[2] + k * internal[3];
                gains[1] = internal[1] + third * internal[2] + k * internal[4];

                let a_front = internal[0].max(internal[1]).max(internal[2]);
                let a_rear = internal[3].max(internal[4]);
                let total = a_front + a_rear;
                let r = if total > 0.0 { a_rear / total } else { 0.0 };
                let norm = vec_norm(gains);
                if norm > 0.0 {
                    let normalization = 0.5f64.powf(r / 2.0) / norm;
                    gains[0] *= normalization;
                    gains[1] *= normalization;
                }
            }
            DownmixOutput::ThreeOneTwo => {
                let mut internal = vec![0.0; self.internal_layout.num_channels()];
                self.gains_from_regions(direction, &mut internal);

                // Fold 4+7+0 onto 3.1.2: sides and rears fold to the fronts,
                // rear heights to the front heights.
                let p = 0.5f64.sqrt();
                let normalization = 2.0 / (1.0 + 2.0 * p);
                gains[0] = internal[0] + p * (internal[3] + internal[5]);
                gains[1] = internal[1] + p * (internal[4] + internal[6]);
                gains[2] = internal[2];
                gains[3] = internal[7] + p * internal[9];
                gains[4] = internal[8] + p * internal[10];
                for g in gains.iter_mut() {
                    *g *= normalization;
                }
            }
        }
    }

    fn gains_from_regions(&self, direction: CartesianPosition, gains: &mut [f64]) {
        debug_assert_eq!(gains.len(), self.internal_layout.num_channels());
        for g in gains.iter_mut() {
            *g = 0.0;
        }
        let direction = direction.normalized();

        let mut ngon_gains = vec![0.0; self.max_ngon_verts];
        for ngon in &self.ngons {
            let n = ngon.channel_inds.len();
            if ngon.gains(direction, &mut ngon_gains[..n]) {
                for (i, &ind) in ngon.channel_inds.iter().enumerate() {
                    gains[self.downmix_mapping[ind]] += ngon_gains[i];
                }
                normalize_in_place(gains);
                return;
            }
        }

        let mut tri_gains = [0.0; 3];
        for triplet in &self.triplets {
            if triplet.gains(direction, &mut tri_gains) {
                for (i, &ind) in triplet.channel_inds.iter().enumerate() {
                    gains[self.downmix_mapping[ind]] += tri_gains[i];
                }
                normalize_in_place(gains);
                return;
            }
        }

        let mut quad_gains = [0.0; 4];
        for quad in &self.quads {
            if quad.gains(direction, &mut quad_gains) {
                for (i, &ind) in quad.channel_inds.iter().enumerate() {
                    gains[self.downmix_mapping[ind]] += quad_gains[i];
                }
                normalize_in_place(gains);
                return;
            }
        }
    }
}

fn normalize_in_place(gains: &mut [f64]) {
    let norm = vec_norm(gains);
    if norm > REGION_TOL {
        for g in gains.iter_mut() {
            *g /= norm;
        }
    }
}

/// Classify the 4+9+0 screen speakers as narrow (5..25 deg) or wide
/// (35..60 deg). Anything else fails configuration.
fn screen_speaker_widths(layout: &Layout) -> Result<(bool, bool), ConfigError> {
    let mut wide_left = false;
    let mut wide_right = false;
    for channel in &layout.channels {
        let az = channel.polar_position.azimuth;
        if channel.name == "M+SC" {
            if (35.0..=60.0).contains(&az) {
                wide_left = true;
            } else if !(5.0..=25.0).contains(&az) {
                return Err(ConfigError::SpeakerOutOfRange(layout.name.clone()));
            }
        } else if channel.name == "M-SC" {
            if (-60.0..=-35.0).contains(&az) {
                wide_right = true;
            } else if !(-25.0..=-5.0).contains(&az) {
                return Err(ConfigError::SpeakerOutOfRange(layout.name.clone()));
            }
        }
    }
    Ok((wide_left, wide_right))
}

/// Synthesize the fill speakers for a layout: mid-layer channels mirrored
/// into sparse upper and lower layers, plus a BOTTOM virtual speaker and,
/// unless the layout covers the zenith, a TOP one. Each mirrored speaker
/// appends its source channel to `downmix_mapping`.
/// See Rec. ITU-R BS.2127-0 sec. 6.1.3.1.
fn extra_speakers_layout(layout: &Layout, downmix_mapping: &mut Vec<usize>) -> Layout {
    let n = layout.num_channels();
    let mut upper_set = Vec::new();
    let mut mid_set = Vec::new();
    let mut lower_set = Vec::new();
    let mut max_upper_az: f64 = 0.0;
    let mut max_lower_az: f64 = 0.0;
    let mut mean_upper_el = 0.0;
    let mut mean_lower_el = 0.0;

    for i in 0..n {
        let channel = &layout.channels[i];
        let el = channel.polar_position_nominal.elevation;
        if (30.0..=70.0).contains(&el) {
            upper_set.push(i);
            max_upper_az = max_upper_az.max(channel.polar_position_nominal.azimuth.abs());
            mean_upper_el += channel.polar_position.elevation;
        } else if (-10.0..=10.0).contains(&el) {
            mid_set.push(i);
        } else if (-70.0..=-30.0).contains(&el) {
            lower_set.push(i);
            max_lower_az = max_lower_az.max(channel.polar_position_nominal.azimuth.abs());
            mean_lower_el += channel.polar_position.elevation;
        }
    }
    let mean_upper_el = if upper_set.is_empty() { 30.0 } else { mean_upper_el / upper_set.len() as f64 };
    let mean_lower_el = if lower_set.is_empty() { -30.0 } else { mean_lower_el / lower_set.len() as f64 };

    let mut extra = Layout {
        name: String::new(),
        channels: Vec::new(),
        has_lfe: false,
        reproduction_screen: None,
    };

    for &mid in &mid_set {
        let channel = &layout.channels[mid];
        let azimuth = channel.polar_position.azimuth;
        if lower_set.is_empty() || azimuth.abs() > max_lower_az + 40.0 {
            downmix_mapping.push(mid);
            let mut name = channel.name.clone();
            name.replace_range(0..1, "B");
            extra.channels.push(Channel::custom(
                &name,
                PolarPosition::new(azimuth, mean_lower_el, 1.0),
                PolarPosition::new(channel.polar_position_nominal.azimuth, -30.0, 1.0),
                false,
            ));
        }
    }
    for &mid in &mid_set {
        let channel = &layout.channels[mid];
        let azimuth = channel.polar_position.azimuth;
        if upper_set.is_empty() || azimuth.abs() > max_upper_az + 40.0 {
            downmix_mapping.push(mid);
            let mut name = channel.name.clone();
            name.replace_range(0..1, "U");
            extra.channels.push(Channel::custom(
                &name,
                PolarPosition::new(azimuth, mean_upper_el, 1.0),
                PolarPosition::new(channel.polar_position_nominal.azimuth, 30.0, 1.0),
                false,
            ));
        }
    }

    let bottom = PolarPosition::new(0.0, -90.0, 1.0);
    extra
        .channels
        .push(Channel::custom("BOTTOM", bottom, bottom, false));
    if !layout.contains_channel("T+000") && !layout.contains_channel("UH+180") {
        let top = PolarPosition::new(0.0, 90.0, 1.0);
        extra.channels.push(Channel::custom("TOP", top, top, false));
    }

    extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use osr_core::coords::vec_norm;

    fn panner(name: &str) -> PointSourcePanner {
        PointSourcePanner::new(&Layout::with_name(name).unwrap()).unwrap()
    }

    fn gains_at(psp: &PointSourcePanner, az: f64, el: f64) -> Vec<f64> {
        let mut g = vec![0.0; psp.num_channels()];
        psp.gains_polar(PolarPosition::new(az, el, 1.0), &mut g);
        g
    }

    #[test]
    fn energy_is_preserved_over_the_sphere() {
        for name in ["0+5+0", "0+4+0", "2+5+0", "4+5+0", "4+5+1", "0+7+0", "4+7+0", "9+10+3", "9+10+5", "3+7+0", "2+7+0", "4+9+0"] {
            let psp = panner(name);
            let mut el = -85.0;
            while el <= 85.0 {
                let mut az = -180.0;
                while az < 180.0 {
                    let g = gains_at(&psp, az, el);
                    let norm = vec_norm(&g);
                    assert!(
                        (norm - 1.0).abs() < 1e-9,
                        "{name} az {az} el {el}: norm {norm}"
                    );
                    assert!(g.iter().all(|x| *x >= -1e-12), "{name}: negative gain");
                    az += 10.0;
                }
                el += 10.0;
            }
        }
    }

    #[test]
    fn vertex_directions_snap_to_their_speaker() {
        for name in ["0+5+0", "4+5+0", "0+7+0", "9+10+3"] {
            let psp = panner(name);
            let layout = psp.output_layout().clone();
            for (i, channel) in layout.channels.iter().enumerate() {
                let g = gains_at(
                    &psp,
                    channel.polar_position.azimuth,
                    channel.polar_position.elevation,
                );
                assert!((g[i] - 1.0).abs() < 1e-9, "{name} {}: {}", channel.name, g[i]);
                for (j, other) in g.iter().enumerate() {
                    if j != i {
                        assert!(other.abs() < 1e-9, "{name} {} leaked to {j}", channel.name);
                    }
                }
            }
        }
    }

    #[test]
    fn stereo_centre_splits_equally() {
        let psp = panner("0+2+0");
        assert_eq!(psp.num_channels(), 2);
        let g = gains_at(&psp, 0.0, 0.0);
        assert!((g[0] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6, "L {}", g[0]);
        assert!((g[1] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6, "R {}", g[1]);
    }

    #[test]
    fn stereo_hard_pan() {
        let psp = panner("0+2+0");
        let g = gains_at(&psp, -30.0, 0.0);
        assert!(g[0].abs() < 1e-6);
        assert!((g[1] - 1.0).abs() < 1e-6);

        let g = gains_at(&psp, 30.0, 0.0);
        assert!((g[0] - 1.0).abs() < 1e-6);
        assert!(g[1].abs() < 1e-6);
    }

    #[test]
    fn stereo_rear_is_attenuated() {
        let psp = panner("0+2+0");
        let g = gains_at(&psp, 180.0, 0.0);
        let norm = vec_norm(&g);
        // Pure rear content folds in at -3 dB
        assert!((norm - 0.5f64.powf(0.5)).abs() < 1e-6, "norm {norm}");
    }

    #[test]
    fn three_one_two_folds_surrounds_forward() {
        let psp = panner("2+3+0");
        assert_eq!(psp.num_channels(), 5);
        let g = gains_at(&psp, 90.0, 0.0); // left side
        assert!(g[0] > 0.1, "left fold {}", g[0]);
        assert!(g[1].abs() < 1e-9, "no right leakage");
    }

    #[test]
    fn equidistant_direction_is_shared() {
        let psp = panner("0+5+0");
        let g = gains_at(&psp, 15.0, 0.0);
        // Between centre and left front, both active
        assert!(g[0] > 0.1 && g[2] > 0.1);
        assert!(g[1].abs() < 1e-9 && g[3].abs() < 1e-9 && g[4].abs() < 1e-9);
    }

    #[test]
    fn top_of_sphere_pans_without_holes() {
        let psp = panner("0+5+0");
        let g = gains_at(&psp, 0.0, 90.0);
        let norm = vec_norm(&g);
        assert!((norm - 1.0).abs() < 1e-9);
    }
}
