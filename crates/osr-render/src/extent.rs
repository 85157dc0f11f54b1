//! Extent panning: spreading a source over width, height and depth.
//!
//! A fixed grid of virtual sources covers the sphere; a "stadium" shaped
//! weighting function selects the grid points inside the extent area around
//! the source direction, and their pre-computed point-source gain vectors
//! are power-summed. The result blends with the plain point-source gains as
//! the extent shrinks. See Rec. ITU-R BS.2127-0 sec. 7.3.8.

use osr_core::coords::{
    clamp, local_coordinate_system, mat3_mul_vec, sphere_grid, vec_norm, CartesianPosition,
    PolarPosition,
};

use crate::point_source::PointSourcePanner;

/// Elevation rows of the virtual source grid (5 degree pitch).
const GRID_ROWS: usize = 37;
/// Weight fade-out margin around the extent area, in degrees.
const FADE_OUT: f64 = 10.0;
/// Extent below which panning is purely point-source, in degrees.
const MIN_EXTENT: f64 = 5.0;

/// The stadium weighting function: a rectangle with circular caps, oriented
/// towards the source.
struct WeightingFunction {
    rot_mat: [[f64; 3]; 3],
    height: f64,
    circular_cap_azimuth: f64,
    circular_cap: CartesianPosition,
}

impl WeightingFunction {
    fn new(position: CartesianPosition, width: f64, height: f64) -> Self {
        let polar = position.to_polar();
        let mut rot_mat = local_coordinate_system(polar.azimuth, polar.elevation);
        let mut width = width;
        let mut height = height;
        if height > width {
            std::mem::swap(&mut width, &mut height);
            rot_mat.swap(0, 2);
        }

        // Widths beyond 180 degrees grow until the caps meet at the back
        if width > 180.0 {
            width = 180.0 + (width - 180.0) / 180.0 * (180.0 + height);
        }

        let circular_cap_azimuth = width / 2.0 - height / 2.0;
        Self {
            rot_mat,
            height,
            circular_cap_azimuth,
            circular_cap: PolarPosition::new(circular_cap_azimuth, 0.0, 1.0).to_cartesian(),
        }
    }

    fn weight(&self, position: CartesianPosition) -> f64 {
        let mut basis = mat3_mul_vec(&self.rot_mat, position);
        let basis_polar = basis.to_polar();

        let distance = if basis_polar.azimuth.abs() < self.circular_cap_azimuth {
            basis_polar.elevation.abs() - 0.5 * self.height
        } else {
            // Reflect into the cap's hemisphere and measure the great-circle
            // distance from the cap centre
            if basis.x > 0.0 {
                basis.x = -basis.x;
            }
            let dot = basis.dot(self.circular_cap).min(1.0);
            dot.acos().to_degrees() - 0.5 * self.height
        };

        let distance = clamp(distance, 0.0, FADE_OUT);
        1.0 - distance / FADE_OUT
    }
}

/// Spread panner: weighted sum of virtual-source panning vectors.
struct SpreadPanner {
    virtual_positions: Vec<CartesianPosition>,
    virtual_panning_vectors: Vec<Vec<f64>>,
    num_channels: usize,
}

impl SpreadPanner {
    fn new(psp: &PointSourcePanner) -> Self {
        let virtual_positions = sphere_grid(GRID_ROWS);
        let num_channels = psp.num_channels();
        let virtual_panning_vectors = virtual_positions
            .iter()
            .map(|p| {
                let mut g = vec![0.0; num_channels];
                psp.gains(*p, &mut g);
                g
            })
            .collect();
        Self {
            virtual_positions,
            virtual_panning_vectors,
            num_channels,
        }
    }

    fn gains(&self, position: CartesianPosition, width: f64, height: f64, gains: &mut [f64]) {
        debug_assert_eq!(gains.len(), self.num_channels);
        let weighting = WeightingFunction::new(position, width, height);

        for g in gains.iter_mut() {
            *g = 0.0;
        }
        for (pos, vector) in self.virtual_positions.iter().zip(&self.virtual_panning_vectors) {
            let w = weighting.weight(*pos);
            if w > 1e-4 {
                for (g, v) in gains.iter_mut().zip(vector.iter()) {
                    *g += w * v;
                }
            }
        }

        let norm = vec_norm(gains);
        if norm > 1e-3 {
            for g in gains.iter_mut() {
                *g /= norm;
            }
        } else {
            for g in gains.iter_mut() {
                *g = 0.0;
            }
        }
    }
}

/// Extent handler combining point-source and spread panning, with the
/// distance-dependent extent modification and depth handling.
pub struct PolarExtentPanner {
    psp_gains: Vec<f64>,
    spread_gains: Vec<f64>,
    gains_near: Vec<f64>,
    gains_far: Vec<f64>,
    spread_panner: SpreadPanner,
}

impl PolarExtentPanner {
    pub fn new(psp: &PointSourcePanner) -> Self {
        let n = psp.num_channels();
        Self {
            psp_gains: vec![0.0; n],
            spread_gains: vec![0.0; n],
            gains_near: vec![0.0; n],
            gains_far: vec![0.0; n],
            spread_panner: SpreadPanner::new(psp),
        }
    }

    /// Grow the apparent extent as the source comes closer than the unit
    /// sphere and shrink it as it recedes.
    pub fn extent_modification(distance: f64, extent: f64) -> f64 {
        let min_size = 0.2;
        let size = min_size + (1.0 - min_size) * extent / 360.0;
        let e_1 = 4.0 * size.atan2(1.0).to_degrees();
        let e_d = 4.0 * size.atan2(distance).to_degrees();
        if e_d < e_1 {
            extent * e_d / e_1
        } else {
            extent + (360.0 - extent) * (e_d - e_1) / (360.0 - e_1)
        }
    }

    /// Gains for a source with polar extent. `width`/`height` in degrees,
    /// `depth` as a distance span.
    pub fn handle(
        &mut self,
        psp: &PointSourcePanner,
        position: CartesianPosition,
        width: f64,
        height: f64,
        depth: f64,
        gains: &mut [f64],
    ) {
        let source_distance = position.norm();

        if depth != 0.0 {
            let d1 = (source_distance + depth / 2.0).max(0.0);
            let d2 = (source_distance - depth / 2.0).max(0.0);

            let w1 = Self::extent_modification(d1, width);
            let h1 = Self::extent_modification(d1, height);
            let w2 = Self::extent_modification(d2, width);
            let h2 = Self::extent_modification(d2, height);

            let mut gains_near = std::mem::take(&mut self.gains_near);
            let mut gains_far = std::mem::take(&mut self.gains_far);
            self.extent_gains(psp, position, w1, h1, &mut gains_far);
            self.extent_gains(psp, position, w2, h2, &mut gains_near);
            for (g, (gf, gn)) in gains.iter_mut().zip(gains_far.iter().zip(gains_near.iter())) {
                *g = (0.5 * (gf * gf + gn * gn)).sqrt();
            }
            self.gains_near = gains_near;
            self.gains_far = gains_far;
        } else {
            let w = Self::extent_modification(source_distance, width);
            let h = Self::extent_modification(source_distance, height);
            self.extent_gains(psp, position, w, h, gains);
        }
    }

    /// Blend point-source and spread gains for a single width/height pair.
    fn extent_gains(
        &mut self,
        psp: &PointSourcePanner,
        position: CartesianPosition,
        width: f64,
        height: f64,
        gains: &mut [f64],
    ) {
        let p = clamp(width.max(height) / MIN_EXTENT, 0.0, 1.0);

        if p < 1.0 {
            psp.gains(position, &mut self.psp_gains);
        } else {
            self.psp_gains.fill(0.0);
        }
        if p > 0.0 {
            self.spread_panner
                .gains(position, width, height, &mut self.spread_gains);
        } else {
            self.spread_gains.fill(0.0);
        }

        for (i, g) in gains.iter_mut().enumerate() {
            let g_s = self.spread_gains[i];
            let g_p = self.psp_gains[i];
            *g = (p * g_s * g_s + (1.0 - p) * g_p * g_p).sqrt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osr_core::Layout;

    fn setup(name: &str) -> (PointSourcePanner, PolarExtentPanner) {
        let psp = PointSourcePanner::new(&Layout::with_name(name).unwrap()).unwrap();
        let extent = PolarExtentPanner::new(&psp);
        (psp, extent)
    }

    #[test]
    fn zero_extent_equals_point_source() {
        let (psp, mut extent) = setup("0+5+0");
        let position = PolarPosition::new(20.0, 0.0, 1.0).to_cartesian();

        let mut point = vec![0.0; psp.num_channels()];
        psp.gains(position, &mut point);

        let mut spread = vec![0.0; psp.num_channels()];
        extent.handle(&psp, position, 0.0, 0.0, 0.0, &mut spread);

        for (a, b) in point.iter().zip(spread.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn wide_extent_engages_more_speakers() {
        let (psp, mut extent) = setup("0+5+0");
        let position = PolarPosition::new(0.0, 0.0, 1.0).to_cartesian();

        let mut gains = vec![0.0; psp.num_channels()];
        extent.handle(&psp, position, 360.0, 360.0, 0.0, &mut gains);

        let active = gains.iter().filter(|g| **g > 0.05).count();
        assert!(active >= 4, "only {active} speakers active");
        assert!((vec_norm(&gains) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn extent_gains_preserve_energy() {
        let (psp, mut extent) = setup("4+5+0");
        for width in [0.0, 30.0, 90.0, 180.0, 300.0] {
            let position = PolarPosition::new(45.0, 10.0, 1.0).to_cartesian();
            let mut gains = vec![0.0; psp.num_channels()];
            extent.handle(&psp, position, width, width / 2.0, 0.0, &mut gains);
            let norm = vec_norm(&gains);
            assert!((norm - 1.0).abs() < 1e-6, "width {width}: norm {norm}");
        }
    }

    #[test]
    fn extent_modification_identity_at_unit_distance() {
        for extent in [0.0, 30.0, 90.0, 250.0] {
            let modified = PolarExtentPanner::extent_modification(1.0, extent);
            assert!((modified - extent).abs() < 1e-9);
        }
    }

    #[test]
    fn depth_keeps_unit_energy() {
        let (psp, mut extent) = setup("0+5+0");
        let position = PolarPosition::new(0.0, 0.0, 1.0).to_cartesian();
        let mut gains = vec![0.0; psp.num_channels()];
        extent.handle(&psp, position, 20.0, 20.0, 0.5, &mut gains);
        let norm = vec_norm(&gains);
        assert!((norm - 1.0).abs() < 0.05, "norm {norm}");
    }
}
