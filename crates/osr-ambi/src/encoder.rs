//! Point-source to B-format encoder with coefficient fading.

use osr_core::PolarPosition;
use osr_dsp::GainInterp;

use crate::bformat::BFormat;
use crate::order_to_components;
use crate::sh::sn3d_coefficients;

/// Encodes a mono stream into B-format at a given direction. Position
/// changes cross-fade the coefficient set to avoid zipper noise.
#[derive(Debug, Clone)]
pub struct AmbisonicEncoder {
    order: u32,
    coeffs: Vec<f64>,
    coeff_interp: GainInterp,
    fade_samples: u32,
    position: PolarPosition,
}

impl AmbisonicEncoder {
    /// Create an encoder of the given order. `fade_ms` controls how long a
    /// position change takes to settle.
    pub fn new(order: u32, sample_rate: u32, fade_ms: f32) -> Self {
        let num_channels = order_to_components(order);
        Self {
            order,
            coeffs: vec![0.0; num_channels],
            coeff_interp: GainInterp::new(num_channels),
            fade_samples: (0.001 * fade_ms as f64 * sample_rate as f64).round() as u32,
            position: PolarPosition::default(),
        }
    }

    pub fn num_channels(&self) -> usize {
        self.coeffs.len()
    }

    pub fn position(&self) -> PolarPosition {
        self.position
    }

    /// Point the encoder at a new direction.
    pub fn set_position(&mut self, position: PolarPosition) {
        self.position = position;
        sn3d_coefficients(position, self.order, &mut self.coeffs);
        let coeffs = self.coeffs.clone();
        self.coeff_interp.set_gain_vector(&coeffs, self.fade_samples);
    }

    /// Encode and mix a mono block into the destination buffer.
    pub fn process_accumul(
        &mut self,
        input: &[f32],
        n_samples: usize,
        dst: &mut BFormat,
        offset: usize,
        gain: f64,
    ) {
        self.coeff_interp
            .process_accumul(input, dst.channels_mut(), n_samples, offset, gain);
    }

    pub fn reset(&mut self) {
        self.coeff_interp.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_source_encodes_expected_components() {
        let mut enc = AmbisonicEncoder::new(1, 48000, 0.0);
        enc.set_position(PolarPosition::new(0.0, 0.0, 1.0));
        let mut bf = BFormat::new(1, 16);
        let input = vec![1.0f32; 16];
        enc.process_accumul(&input, 16, &mut bf, 0, 1.0);
        assert!((bf.channel(0)[0] - 1.0).abs() < 1e-6); // W
        assert!(bf.channel(1)[0].abs() < 1e-6); // Y
        assert!(bf.channel(2)[0].abs() < 1e-6); // Z
        assert!((bf.channel(3)[0] - 1.0).abs() < 1e-6); // X
    }

    #[test]
    fn position_change_fades_over_configured_time() {
        let mut enc = AmbisonicEncoder::new(1, 48000, 1.0); // 48 samples
        enc.set_position(PolarPosition::new(90.0, 0.0, 1.0));
        let input = vec![1.0f32; 64];
        let mut bf = BFormat::new(1, 64);
        enc.process_accumul(&input, 64, &mut bf, 0, 1.0); // settle

        enc.set_position(PolarPosition::new(-90.0, 0.0, 1.0));
        bf.reset();
        enc.process_accumul(&input, 64, &mut bf, 0, 1.0);
        // Y sweeps from +1 towards -1 across the 48-sample fade
        assert!(bf.channel(1)[0] > 0.9);
        assert!((bf.channel(1)[63] + 1.0).abs() < 1e-4);
        assert!(bf.channel(1)[24] > -0.2 && bf.channel(1)[24] < 0.2);
    }
}
