//! Block FFT convolution with overlap-add.
//!
//! The convolvers here hold a fixed filter bank (frequency domain) and
//! process one block per call. Spectra of independent channels can be
//! accumulated before the inverse transform, which is how the binauralizer
//! sums all ambisonic channels into each ear with a single IFFT.

use std::sync::Arc;

use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

/// Shared forward/inverse real-FFT pair for a fixed block and filter length.
pub struct BlockFft {
    fft_size: usize,
    block_size: usize,
    rfft: Arc<dyn RealToComplex<f32>>,
    irfft: Arc<dyn ComplexToReal<f32>>,
    scratch_time: Vec<f32>,
    scratch_freq: Vec<Complex<f32>>,
    scratch_out: Vec<f32>,
}

impl BlockFft {
    /// Plan transforms for blocks up to `block_size` convolved with filters
    /// of `filter_taps` samples.
    pub fn new(block_size: usize, filter_taps: usize) -> Self {
        let fft_size = (block_size + filter_taps).next_power_of_two();
        let mut planner = RealFftPlanner::<f32>::new();
        let rfft = planner.plan_fft_forward(fft_size);
        let irfft = planner.plan_fft_inverse(fft_size);
        Self {
            fft_size,
            block_size,
            rfft,
            irfft,
            scratch_time: vec![0.0; fft_size],
            scratch_freq: vec![Complex::new(0.0, 0.0); fft_size / 2 + 1],
            scratch_out: vec![0.0; fft_size],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Transform a filter impulse response into its spectrum.
    pub fn filter_spectrum(&mut self, taps: &[f32]) -> Vec<Complex<f32>> {
        let mut spectrum = vec![Complex::new(0.0, 0.0); self.num_bins()];
        self.scratch_time.fill(0.0);
        let n = taps.len().min(self.fft_size);
        self.scratch_time[..n].copy_from_slice(&taps[..n]);
        self.rfft
            .process(&mut self.scratch_time, &mut spectrum)
            .expect("buffer lengths match the plan");
        spectrum
    }

    /// Transform a zero-padded signal block into `out_spec`.
    pub fn forward(&mut self, block: &[f32], out_spec: &mut [Complex<f32>]) {
        self.scratch_time.fill(0.0);
        let n = block.len().min(self.fft_size);
        self.scratch_time[..n].copy_from_slice(&block[..n]);
        self.rfft
            .process(&mut self.scratch_time, out_spec)
            .expect("buffer lengths match the plan");
    }

    /// Inverse-transform `spec` into `out_time` (length `fft_size`),
    /// applying the 1/N normalization. The spectrum is clobbered.
    pub fn inverse(&mut self, spec: &mut [Complex<f32>], out_time: &mut [f32]) {
        self.irfft
            .process(spec, out_time)
            .expect("buffer lengths match the plan");
        let scale = 1.0 / self.fft_size as f32;
        for s in out_time.iter_mut() {
            *s *= scale;
        }
    }

    /// Convolve one block against a pre-computed filter spectrum, using the
    /// caller's overlap state, writing `n_samples` output samples.
    pub fn convolve_block(
        &mut self,
        input: &[f32],
        filter_spec: &[Complex<f32>],
        overlap: &mut OverlapAdd,
        output: &mut [f32],
        n_samples: usize,
    ) {
        let mut spec = std::mem::take(&mut self.scratch_freq);
        let mut time = std::mem::take(&mut self.scratch_out);
        self.forward(&input[..n_samples.min(input.len())], &mut spec);
        for (bin, filt) in spec.iter_mut().zip(filter_spec.iter()) {
            *bin *= filt;
        }
        self.inverse(&mut spec, &mut time);
        overlap.emit(&time, output, n_samples);
        self.scratch_freq = spec;
        self.scratch_out = time;
    }
}

/// Overlap-add tail state for one output lane.
#[derive(Debug, Clone)]
pub struct OverlapAdd {
    tail: Vec<f32>,
}

impl OverlapAdd {
    pub fn new(fft_size: usize) -> Self {
        Self {
            tail: vec![0.0; fft_size],
        }
    }

    /// Combine a full convolution result with the stored tail: the first
    /// `n_samples` go to `output` (replacing its contents), the remainder
    /// becomes the new tail.
    pub fn emit(&mut self, conv: &[f32], output: &mut [f32], n_samples: usize) {
        debug_assert_eq!(conv.len(), self.tail.len());
        for i in 0..n_samples {
            output[i] = conv[i] + self.tail[i];
        }
        let len = self.tail.len();
        for i in 0..len - n_samples {
            self.tail[i] = self.tail[i + n_samples] + conv[i + n_samples];
        }
        for i in len - n_samples..len {
            self.tail[i] = 0.0;
        }
    }

    /// As `emit`, but adding into the destination.
    pub fn emit_accumul(&mut self, conv: &[f32], output: &mut [f32], n_samples: usize) {
        debug_assert_eq!(conv.len(), self.tail.len());
        for i in 0..n_samples {
            output[i] += conv[i] + self.tail[i];
        }
        let len = self.tail.len();
        for i in 0..len - n_samples {
            self.tail[i] = self.tail[i + n_samples] + conv[i + n_samples];
        }
        for i in len - n_samples..len {
            self.tail[i] = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.tail.fill(0.0);
    }
}
