//! Sound-field rotation for head tracking.
//!
//! Explicit per-order rotation matrices (up to third order) for yaw, pitch
//! and roll, composed in a configurable order. Orientation changes
//! cross-fade the matrix coefficients over a fixed fade time so the field
//! never jumps.

use crate::bformat::BFormat;
use crate::order_to_components;

/// Head orientation in radians. Yaw turns left, pitch nods up, roll tilts
/// to the right ear, matching the rotation conventions of the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationOrientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Order in which the three rotations are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationOrder {
    #[default]
    YawPitchRoll,
    YawRollPitch,
    PitchYawRoll,
    PitchRollYaw,
    RollYawPitch,
    RollPitchYaw,
}

type Mat = Vec<Vec<f32>>;

fn zeros(n: usize) -> Mat {
    vec![vec![0.0; n]; n]
}

fn mat_mul(a: &Mat, b: &Mat, out: &mut Mat) {
    let n = a.len();
    for i in 0..n {
        for j in 0..n {
            let mut acc = 0.0;
            for (k, b_row) in b.iter().enumerate() {
                acc += a[i][k] * b_row[j];
            }
            out[i][j] = acc;
        }
    }
}

/// Rotates a B-format stream to match a head orientation.
pub struct AmbisonicRotator {
    order: u32,
    num_channels: usize,
    orientation: RotationOrientation,
    rotation_order: RotationOrder,
    target: Mat,
    target_tmp: Mat,
    current: Mat,
    delta: Mat,
    yaw_mat: Mat,
    pitch_mat: Mat,
    roll_mat: Mat,
    fading_samples: u32,
    fading_counter: u32,
    temp: BFormat,
}

impl AmbisonicRotator {
    /// `fade_ms` is the crossfade applied on orientation changes
    /// (50 ms by default in the renderer).
    pub fn new(order: u32, block_size: usize, sample_rate: u32, fade_ms: f32) -> Self {
        let num_channels = order_to_components(order);
        let mut rotator = Self {
            order,
            num_channels,
            orientation: RotationOrientation::default(),
            rotation_order: RotationOrder::default(),
            target: zeros(num_channels),
            target_tmp: zeros(num_channels),
            current: zeros(num_channels),
            delta: zeros(num_channels),
            yaw_mat: zeros(num_channels),
            pitch_mat: zeros(num_channels),
            roll_mat: zeros(num_channels),
            fading_samples: (0.001 * fade_ms as f64 * sample_rate as f64).round() as u32,
            fading_counter: 0,
            temp: BFormat::new(order, block_size),
        };
        rotator.reset();
        rotator
    }

    pub fn orientation(&self) -> RotationOrientation {
        self.orientation
    }

    /// Change the head orientation. Unchanged orientations are a no-op.
    pub fn set_orientation(&mut self, orientation: RotationOrientation) {
        if self.orientation == orientation {
            return;
        }
        self.orientation = orientation;
        self.stage_target();
    }

    pub fn set_rotation_order(&mut self, rotation_order: RotationOrder) {
        if self.rotation_order != rotation_order {
            self.rotation_order = rotation_order;
            self.stage_target();
        }
    }

    /// Rebuild the target matrix and restart the crossfade towards it.
    fn stage_target(&mut self) {
        self.update_target_matrix();
        if self.fading_samples == 0 {
            for i in 0..self.num_channels {
                self.current[i].copy_from_slice(&self.target[i]);
            }
        }
        for i in 0..self.num_channels {
            for j in 0..self.num_channels {
                self.delta[i][j] = if self.fading_samples == 0 {
                    0.0
                } else {
                    (self.target[i][j] - self.current[i][j]) / self.fading_samples as f32
                };
            }
        }
        self.fading_counter = 0;
    }

    /// Rotate the buffer contents in place.
    pub fn process(&mut self, buffer: &mut BFormat, n_samples: usize) {
        self.temp.copy_from(buffer);
        buffer.reset();

        let n_fade = (n_samples as u32).min(self.fading_samples.saturating_sub(self.fading_counter)) as usize;

        if self.fading_counter < self.fading_samples {
            for i_out in 0..self.num_channels {
                for i_in in 0..self.num_channels {
                    if self.current[i_out][i_in].abs() <= 1e-6 && self.target[i_out][i_in].abs() <= 1e-6 {
                        continue;
                    }
                    let mut coeff = self.current[i_out][i_in];
                    let delta = self.delta[i_out][i_in];
                    let src = self.temp.channel(i_in);
                    let dst = buffer.channel_mut(i_out);
                    for i in 0..n_fade {
                        dst[i] += coeff * src[i];
                        coeff += delta;
                    }
                    self.current[i_out][i_in] = coeff;
                }
            }
            self.fading_counter += n_fade as u32;
        }

        for i_out in 0..self.num_channels {
            for i_in in 0..self.num_channels {
                let coeff = self.target[i_out][i_in];
                if coeff.abs() <= 1e-6 {
                    continue;
                }
                let src = self.temp.channel(i_in);
                let dst = buffer.channel_mut(i_out);
                for i in n_fade..n_samples {
                    dst[i] += coeff * src[i];
                }
            }
        }
    }

    /// Snap to the target orientation and clear the crossfade.
    pub fn reset(&mut self) {
        self.update_target_matrix();
        for i in 0..self.num_channels {
            self.current[i].copy_from_slice(&self.target[i]);
        }
        self.fading_counter = self.fading_samples;
    }

    fn update_target_matrix(&mut self) {
        fill_yaw_matrix(self.orientation.yaw, self.order, &mut self.yaw_mat);
        fill_pitch_matrix(self.orientation.pitch, self.order, &mut self.pitch_mat);
        fill_roll_matrix(self.orientation.roll, self.order, &mut self.roll_mat);

        let (first, second, third) = match self.rotation_order {
            RotationOrder::YawPitchRoll => (&self.yaw_mat, &self.pitch_mat, &self.roll_mat),
            RotationOrder::YawRollPitch => (&self.yaw_mat, &self.roll_mat, &self.pitch_mat),
            RotationOrder::PitchYawRoll => (&self.pitch_mat, &self.yaw_mat, &self.roll_mat),
            RotationOrder::PitchRollYaw => (&self.pitch_mat, &self.roll_mat, &self.yaw_mat),
            RotationOrder::RollYawPitch => (&self.roll_mat, &self.yaw_mat, &self.pitch_mat),
            RotationOrder::RollPitchYaw => (&self.roll_mat, &self.pitch_mat, &self.yaw_mat),
        };
        mat_mul(second, first, &mut self.target_tmp);
        mat_mul(third, &self.target_tmp, &mut self.target);
    }
}

fn clear(mat: &mut Mat) {
    for row in mat.iter_mut() {
        row.fill(0.0);
    }
}

fn fill_yaw_matrix(yaw: f32, order: u32, mat: &mut Mat) {
    clear(mat);
    mat[0][0] = 1.0;
    if order < 1 {
        return;
    }
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    mat[1][1] = cos_yaw;
    mat[1][3] = -sin_yaw;
    mat[2][2] = 1.0;
    mat[3][1] = sin_yaw;
    mat[3][3] = cos_yaw;
    if order < 2 {
        return;
    }
    let (sin_2yaw, cos_2yaw) = (2.0 * yaw).sin_cos();
    mat[4][4] = cos_2yaw;
    mat[4][8] = -sin_2yaw;
    mat[5][5] = cos_yaw;
    mat[5][7] = -sin_yaw;
    mat[6][6] = 1.0;
    mat[7][5] = sin_yaw;
    mat[7][7] = cos_yaw;
    mat[8][4] = sin_2yaw;
    mat[8][8] = cos_2yaw;
    if order < 3 {
        return;
    }
    let (sin_3yaw, cos_3yaw) = (3.0 * yaw).sin_cos();
    mat[9][9] = cos_3yaw;
    mat[9][15] = -sin_3yaw;
    mat[10][10] = cos_2yaw;
    mat[10][14] = -sin_2yaw;
    mat[11][11] = cos_yaw;
    mat[11][13] = -sin_yaw;
    mat[12][12] = 1.0;
    mat[13][11] = sin_yaw;
    mat[13][13] = cos_yaw;
    mat[14][10] = sin_2yaw;
    mat[14][14] = cos_2yaw;
    mat[15][9] = sin_3yaw;
    mat[15][15] = cos_3yaw;
}

fn fill_pitch_matrix(pitch: f32, order: u32, mat: &mut Mat) {
    clear(mat);
    let sqrt3_2 = 0.5 * 3f32.sqrt();
    let sqrt6_4 = 0.25 * 6f32.sqrt();
    let sqrt10_4 = 0.25 * 10f32.sqrt();
    let sqrt15_4 = 0.25 * 15f32.sqrt();
    let sqrt15_2 = 0.5 * 15f32.sqrt();

    mat[0][0] = 1.0;
    if order < 1 {
        return;
    }
    let (sin_p, cos_p) = pitch.sin_cos();
    mat[1][1] = 1.0;
    mat[2][2] = cos_p;
    mat[2][3] = sin_p;
    mat[3][2] = -sin_p;
    mat[3][3] = cos_p;
    if order < 2 {
        return;
    }
    let (sin_2p, cos_2p) = (2.0 * pitch).sin_cos();
    let cos_p_sq = cos_p * cos_p;
    let sin_p_sq = sin_p * sin_p;
    mat[4][4] = cos_p;
    mat[4][5] = -sin_p;
    mat[5][4] = sin_p;
    mat[5][5] = cos_p;
    mat[6][6] = 1.0 - 1.5 * sin_p_sq;
    mat[6][7] = sqrt3_2 * sin_2p;
    mat[6][8] = sqrt3_2 * sin_p_sq;
    mat[7][6] = -sqrt3_2 * sin_2p;
    mat[7][7] = cos_2p;
    mat[7][8] = 0.5 * sin_2p;
    mat[8][6] = sqrt3_2 * sin_p_sq;
    mat[8][7] = -0.5 * sin_2p;
    mat[8][8] = 0.5 * (1.0 + cos_p_sq);
    if order < 3 {
        return;
    }
    let cos_p_cu = cos_p_sq * cos_p;
    let sin_p_cu = sin_p_sq * sin_p;
    mat[9][9] = 0.25 * (3.0 * cos_p_sq + 1.0);
    mat[9][10] = -sqrt6_4 * sin_2p;
    mat[9][11] = sqrt15_4 * sin_p_sq;
    mat[10][9] = sqrt6_4 * sin_2p;
    mat[10][10] = cos_2p;
    mat[10][11] = -sqrt10_4 * sin_2p;
    mat[11][9] = sqrt15_4 * sin_p_sq;
    mat[11][10] = sqrt10_4 * sin_2p;
    mat[11][11] = 1.0 - 1.25 * sin_p_sq;
    mat[12][12] = 0.5 * cos_p * (5.0 * cos_p_sq - 3.0);
    mat[12][13] = -sqrt6_4 * sin_p * (5.0 * sin_p_sq - 4.0);
    mat[12][14] = -sqrt15_2 * cos_p * (cos_p_sq - 1.0);
    mat[12][15] = sqrt10_4 * sin_p_cu;
    mat[13][12] = sqrt6_4 * sin_p * (5.0 * sin_p_sq - 4.0);
    mat[13][13] = 0.25 * cos_p * (15.0 * cos_p_sq - 11.0);
    mat[13][14] = -sqrt10_4 * sin_p * (3.0 * sin_p_sq - 2.0);
    mat[13][15] = -sqrt15_4 * cos_p * (cos_p_sq - 1.0);
    mat[14][12] = -sqrt15_2 * cos_p * (cos_p_sq - 1.0);
    mat[14][13] = sqrt10_4 * sin_p * (3.0 * sin_p_sq - 2.0);
    mat[14][14] = 0.5 * cos_p * (3.0 * cos_p_sq - 1.0);
    mat[14][15] = -sqrt6_4 * sin_p * (sin_p_sq - 2.0);
    mat[15][12] = -sqrt10_4 * sin_p_cu;
    mat[15][13] = -sqrt15_4 * cos_p * (cos_p_sq - 1.0);
    mat[15][14] = sqrt6_4 * sin_p * (sin_p_sq - 2.0);
    mat[15][15] = 0.25 * cos_p * (cos_p_sq + 3.0);
}

fn fill_roll_matrix(roll: f32, order: u32, mat: &mut Mat) {
    clear(mat);
    let sqrt3_2 = 0.5 * 3f32.sqrt();
    let sqrt6_4 = 0.25 * 6f32.sqrt();
    let sqrt10_4 = 0.25 * 10f32.sqrt();
    let sqrt15_4 = 0.25 * 15f32.sqrt();
    let sqrt15_2 = 0.5 * 15f32.sqrt();

    mat[0][0] = 1.0;
    if order < 1 {
        return;
    }
    let (sin_r, cos_r) = roll.sin_cos();
    mat[1][1] = cos_r;
    mat[1][2] = sin_r;
    mat[2][1] = -sin_r;
    mat[2][2] = cos_r;
    mat[3][3] = 1.0;
    if order < 2 {
        return;
    }
    let (sin_2r, cos_2r) = (2.0 * roll).sin_cos();
    let cos_r_sq = cos_r * cos_r;
    let sin_r_sq = sin_r * sin_r;
    mat[4][4] = cos_r;
    mat[4][7] = sin_r;
    mat[5][5] = cos_2r;
    mat[5][6] = sqrt3_2 * sin_2r;
    mat[5][8] = 0.5 * sin_2r;
    mat[6][5] = -sqrt3_2 * sin_2r;
    mat[6][6] = 1.0 - 1.5 * sin_r_sq;
    mat[6][8] = -sqrt3_2 * sin_r_sq;
    mat[7][4] = -sin_r;
    mat[7][7] = cos_r;
    mat[8][5] = -0.5 * sin_2r;
    mat[8][6] = -sqrt3_2 * sin_r_sq;
    mat[8][8] = 0.5 * (cos_r_sq + 1.0);
    if order < 3 {
        return;
    }
    let sin_r_cu = sin_r_sq * sin_r;
    mat[9][9] = 0.25 * cos_r * (cos_r_sq + 3.0);
    mat[9][11] = sqrt15_4 * cos_r * (cos_r_sq - 1.0);
    mat[9][12] = -sqrt10_4 * sin_r_cu;
    mat[9][14] = -sqrt6_4 * sin_r * (sin_r_sq - 2.0);
    mat[10][10] = cos_2r;
    mat[10][13] = sqrt10_4 * sin_2r;
    mat[10][15] = sqrt6_4 * sin_2r;
    mat[11][9] = sqrt15_4 * cos_r * (cos_r_sq - 1.0);
    mat[11][11] = 0.25 * cos_r * (15.0 * cos_r_sq - 11.0);
    mat[11][12] = -sqrt6_4 * sin_r * (5.0 * sin_r_sq - 4.0);
    mat[11][14] = -sqrt10_4 * sin_r * (3.0 * sin_r_sq - 2.0);
    mat[12][9] = sqrt10_4 * sin_r_cu;
    mat[12][11] = sqrt6_4 * sin_r * (5.0 * sin_r_sq - 4.0);
    mat[12][12] = 0.5 * cos_r * (5.0 * cos_r_sq - 3.0);
    mat[12][14] = sqrt15_2 * cos_r * (cos_r_sq - 1.0);
    mat[13][10] = -sqrt10_4 * sin_2r;
    mat[13][13] = 1.0 - 1.25 * sin_r_sq;
    mat[13][15] = -sqrt15_4 * sin_r_sq;
    mat[14][9] = sqrt6_4 * sin_r * (sin_r_sq - 2.0);
    mat[14][11] = sqrt10_4 * sin_r * (3.0 * sin_r_sq - 2.0);
    mat[14][12] = sqrt15_2 * cos_r * (cos_r_sq - 1.0);
    mat[14][14] = 0.5 * cos_r * (3.0 * cos_r_sq - 1.0);
    mat[15][10] = -sqrt6_4 * sin_2r;
    mat[15][13] = -sqrt15_4 * sin_r_sq;
    mat[15][15] = 0.25 * (3.0 * cos_r_sq + 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sh::sn3d_coefficients;
    use osr_core::PolarPosition;

    fn encode_block(az: f64, el: f64, order: u32, n: usize) -> BFormat {
        let mut coeffs = vec![0.0; order_to_components(order)];
        sn3d_coefficients(PolarPosition::new(az, el, 1.0), order, &mut coeffs);
        let mut bf = BFormat::new(order, n);
        for (ch, c) in coeffs.iter().enumerate() {
            for s in bf.channel_mut(ch).iter_mut() {
                *s = *c as f32;
            }
        }
        bf
    }

    #[test]
    fn identity_orientation_passes_through() {
        let mut rot = AmbisonicRotator::new(3, 64, 48000, 0.0);
        let mut bf = encode_block(35.0, 10.0, 3, 64);
        let reference = bf.clone();
        rot.process(&mut bf, 64);
        for ch in 0..16 {
            assert!((bf.channel(ch)[10] - reference.channel(ch)[10]).abs() < 1e-5, "channel {ch}");
        }
    }

    #[test]
    fn yaw_rotates_source_azimuth() {
        // Turning the head 30 degrees towards a source at +30 brings it to
        // the front of the rotated field.
        let mut rot = AmbisonicRotator::new(3, 64, 48000, 0.0);
        rot.set_orientation(RotationOrientation {
            yaw: 30f32.to_radians(),
            pitch: 0.0,
            roll: 0.0,
        });
        rot.reset();
        let mut bf = encode_block(30.0, 0.0, 3, 64);
        rot.process(&mut bf, 64);

        let front = encode_block(0.0, 0.0, 3, 64);
        for ch in 0..16 {
            assert!(
                (bf.channel(ch)[0] - front.channel(ch)[0]).abs() < 1e-4,
                "channel {ch}: {} vs {}",
                bf.channel(ch)[0],
                front.channel(ch)[0]
            );
        }
    }

    #[test]
    fn pitch_rotates_source_elevation() {
        let mut rot = AmbisonicRotator::new(2, 64, 48000, 0.0);
        rot.set_orientation(RotationOrientation {
            yaw: 0.0,
            pitch: (-20f32).to_radians(),
            roll: 0.0,
        });
        rot.reset();
        let mut bf = encode_block(0.0, 20.0, 2, 64);
        rot.process(&mut bf, 64);

        let front = encode_block(0.0, 0.0, 2, 64);
        for ch in 0..9 {
            assert!(
                (bf.channel(ch)[0] - front.channel(ch)[0]).abs() < 1e-4,
                "channel {ch}: {} vs {}",
                bf.channel(ch)[0],
                front.channel(ch)[0]
            );
        }
    }

    #[test]
    fn orientation_change_crossfades() {
        let mut rot = AmbisonicRotator::new(1, 128, 48000, 1.0); // 48-sample fade
        let mut bf = encode_block(90.0, 0.0, 1, 128);
        rot.set_orientation(RotationOrientation {
            yaw: std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            roll: 0.0,
        });
        rot.process(&mut bf, 128);
        // Early samples near the original field, late samples fully rotated
        let y_first = bf.channel(1)[0];
        let y_last = bf.channel(1)[127];
        assert!((y_first - 1.0).abs() < 0.1);
        assert!(y_last.abs() < 1e-3);
    }
}
