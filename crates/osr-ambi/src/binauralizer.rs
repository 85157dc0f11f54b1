//! B-format to binaural decoding via ambisonic-space HRIRs.
//!
//! At configure time every HRTF measurement direction on a dense sphere
//! grid is projected onto the spherical-harmonic basis, yielding one HRIR
//! pair per ambisonic channel. Per block, each ambisonic channel is
//! convolved with its pair and summed into the two ears; the convolution
//! runs in the frequency domain with one inverse transform per ear.

use num_complex::Complex;
use osr_core::coords::sphere_grid;
use osr_core::ConfigError;
use osr_dsp::{BlockFft, OverlapAdd};

use crate::bformat::BFormat;
use crate::hrtf::HrtfSet;
use crate::sh::sn3d_coefficients;
use crate::{component_to_order, order_to_components};

/// Density of the sampling grid used to project the HRTF set onto the
/// spherical-harmonic basis (2.5 degree elevation pitch).
const GRID_ROWS: usize = 19;

/// Binaural decoder for SN3D B-format.
pub struct Binauralizer {
    num_channels: usize,
    block_size: usize,
    tail_length: usize,
    fft: BlockFft,
    /// Per-ear, per-ambisonic-channel filter spectra
    filter_spectra: [Vec<Vec<Complex<f32>>>; 2],
    overlaps: [OverlapAdd; 2],
    channel_spectra: Vec<Vec<Complex<f32>>>,
    accum: Vec<Complex<f32>>,
    scratch_time: Vec<f32>,
}

impl Binauralizer {
    /// Build the ambisonic-space HRIR bank for the given order from an HRTF
    /// set. Fails if the set carries no impulse responses.
    pub fn new(
        order: u32,
        block_size: usize,
        hrtf: &dyn HrtfSet,
        _sample_rate: u32,
    ) -> Result<Self, ConfigError> {
        let num_channels = order_to_components(order);
        let num_taps = hrtf.num_taps();
        if num_taps == 0 {
            return Err(ConfigError::HrtfNotAvailable(
                "HRTF set has zero-length impulse responses".into(),
            ));
        }

        // Sampling decode of the HRTF set into SH space. For SN3D input
        // signals the sampling weights carry the (2l + 1) N3D factor.
        let grid = sphere_grid(GRID_ROWS);
        let recip_grid = 1.0 / grid.len() as f64;
        let mut amb_hrirs = vec![[vec![0.0f32; num_taps], vec![0.0f32; num_taps]]; num_channels];
        let mut coeffs = vec![0.0f64; num_channels];
        for point in &grid {
            let polar = point.to_polar();
            let pair = hrtf.hrir(polar.azimuth, polar.elevation);
            sn3d_coefficients(polar, order, &mut coeffs);
            for (ch, hrir) in amb_hrirs.iter_mut().enumerate() {
                let order_factor = (2 * component_to_order(ch) + 1) as f64;
                let weight = (coeffs[ch] * order_factor * recip_grid) as f32;
                if weight.abs() < 1e-12 {
                    continue;
                }
                for (t, tap) in pair.left.iter().take(num_taps).enumerate() {
                    hrir[0][t] += tap * weight;
                }
                for (t, tap) in pair.right.iter().take(num_taps).enumerate() {
                    hrir[1][t] += tap * weight;
                }
            }
        }

        let mut fft = BlockFft::new(block_size, num_taps);
        let mut filter_spectra = [Vec::new(), Vec::new()];
        for (ear, spectra) in filter_spectra.iter_mut().enumerate() {
            for hrir in &amb_hrirs {
                spectra.push(fft.filter_spectrum(&hrir[ear]));
            }
        }

        let num_bins = fft.num_bins();
        let fft_size = fft.fft_size();
        Ok(Self {
            num_channels,
            block_size,
            tail_length: num_taps,
            fft,
            filter_spectra,
            overlaps: [OverlapAdd::new(fft_size), OverlapAdd::new(fft_size)],
            channel_spectra: vec![vec![Complex::new(0.0, 0.0); num_bins]; num_channels],
            accum: vec![Complex::new(0.0, 0.0); num_bins],
            scratch_time: vec![0.0; fft_size],
        })
    }

    /// Length of the HRIRs in samples; the convolution tail the renderer
    /// may want to account for.
    pub fn tail_length(&self) -> usize {
        self.tail_length
    }

    /// Decode a B-format block into the two output channels (replacing
    /// their contents).
    pub fn process(&mut self, src: &BFormat, output: &mut [Vec<f32>], n_samples: usize) {
        debug_assert!(n_samples <= self.block_size);
        debug_assert!(output.len() >= 2);

        for ch in 0..self.num_channels {
            self.fft
                .forward(&src.channel(ch)[..n_samples], &mut self.channel_spectra[ch]);
        }

        for ear in 0..2 {
            self.accum.fill(Complex::new(0.0, 0.0));
            for ch in 0..self.num_channels {
                for (acc, (sig, filt)) in self
                    .accum
                    .iter_mut()
                    .zip(self.channel_spectra[ch].iter().zip(self.filter_spectra[ear][ch].iter()))
                {
                    *acc += sig * filt;
                }
            }
            self.fft.inverse(&mut self.accum, &mut self.scratch_time);
            self.overlaps[ear].emit(&self.scratch_time, &mut output[ear], n_samples);
        }
    }

    /// Clear the convolution tails.
    pub fn reset(&mut self) {
        for overlap in &mut self.overlaps {
            overlap.reset();
        }
    }
}
