//! Diffuse-signal decorrelation with compensating direct-path delay.
//!
//! Per Rec. ITU-R BS.2127-0 sec. 7.4: each output channel gets a 512-tap
//! FIR with unit magnitude response and pseudo-random phase, and the direct
//! signal is delayed by the filter group delay of (512 - 1) / 2 samples so
//! the direct and diffuse paths stay time-aligned.

use num_complex::Complex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use realfft::RealFftPlanner;

use crate::delay::FixedDelay;
use crate::fft_conv::{BlockFft, OverlapAdd};

const FILTER_TAPS: usize = 512;

/// Per-channel decorrelation filter bank with direct-path compensation.
pub struct Decorrelator {
    num_channels: usize,
    block_size: usize,
    fft: BlockFft,
    filter_spectra: Vec<Vec<Complex<f32>>>,
    overlaps: Vec<OverlapAdd>,
    direct_delays: Vec<FixedDelay>,
    scratch_in: Vec<f32>,
}

impl Decorrelator {
    /// Build filters for `num_channels` outputs processing blocks of up to
    /// `block_size` samples.
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        let mut fft = BlockFft::new(block_size, FILTER_TAPS);
        let filter_spectra = (0..num_channels)
            .map(|ch| {
                let taps = decorrelation_filter(ch as u64);
                fft.filter_spectrum(&taps)
            })
            .collect();
        let overlaps = (0..num_channels).map(|_| OverlapAdd::new(fft.fft_size())).collect();
        let direct_delays = (0..num_channels)
            .map(|_| FixedDelay::new((FILTER_TAPS - 1) / 2))
            .collect();
        Self {
            num_channels,
            block_size,
            fft,
            filter_spectra,
            overlaps,
            direct_delays,
            scratch_in: vec![0.0; block_size],
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Delay applied to the direct path, in samples.
    pub fn compensation_delay(&self) -> usize {
        (FILTER_TAPS - 1) / 2
    }

    /// Process one block in place: the direct bus is delayed by the
    /// compensation delay, the diffuse bus is replaced by its decorrelated
    /// version.
    pub fn process(&mut self, direct: &mut [Vec<f32>], diffuse: &mut [Vec<f32>], n_samples: usize) {
        debug_assert!(n_samples <= self.block_size);
        for ch in 0..self.num_channels {
            self.direct_delays[ch].process_in_place(&mut direct[ch][..n_samples]);

            self.scratch_in[..n_samples].copy_from_slice(&diffuse[ch][..n_samples]);
            let scratch = std::mem::take(&mut self.scratch_in);
            self.fft.convolve_block(
                &scratch[..n_samples],
                &self.filter_spectra[ch],
                &mut self.overlaps[ch],
                &mut diffuse[ch],
                n_samples,
            );
            self.scratch_in = scratch;
        }
    }

    /// Clear convolution tails and delay lines.
    pub fn reset(&mut self) {
        for overlap in &mut self.overlaps {
            overlap.reset();
        }
        for delay in &mut self.direct_delays {
            delay.reset();
        }
    }
}

/// Time-domain decorrelation FIR for one channel seed: unit magnitude,
/// random phase at every interior bin.
fn decorrelation_filter(seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let num_bins = FILTER_TAPS / 2 + 1;
    let mut spectrum = vec![Complex::new(0.0f32, 0.0); num_bins];
    spectrum[0] = Complex::new(1.0, 0.0);
    spectrum[num_bins - 1] = Complex::new(1.0, 0.0);
    for bin in spectrum.iter_mut().take(num_bins - 1).skip(1) {
        let phase = rng.gen::<f32>() * 2.0 * std::f32::consts::PI;
        *bin = Complex::new(phase.cos(), phase.sin());
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let irfft = planner.plan_fft_inverse(FILTER_TAPS);
    let mut taps = vec![0.0f32; FILTER_TAPS];
    irfft
        .process(&mut spectrum, &mut taps)
        .expect("buffer lengths match the plan");
    let scale = 1.0 / FILTER_TAPS as f32;
    for t in taps.iter_mut() {
        *t *= scale;
    }
    taps
}
