//! Per-channel linear gain ramping.
//!
//! A `GainInterp` applies a vector of gains to a mono input, fanning out to
//! one destination buffer per channel. Gain changes glide linearly over a
//! caller-chosen number of samples; once the ramp completes the target gain
//! holds exactly.

/// Linear gain interpolator over a fixed set of output channels.
#[derive(Debug, Clone)]
pub struct GainInterp {
    current: Vec<f64>,
    target: Vec<f64>,
    delta: Vec<f64>,
    interp_duration: u32,
    interp_count: u32,
    first_call: bool,
}

impl GainInterp {
    pub fn new(num_channels: usize) -> Self {
        Self {
            current: vec![0.0; num_channels],
            target: vec![0.0; num_channels],
            delta: vec![0.0; num_channels],
            interp_duration: 0,
            interp_count: 0,
            first_call: true,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.target.len()
    }

    /// Stage the same gain on every channel.
    pub fn set_gain(&mut self, gain: f64, interp_samples: u32) {
        let new = vec![gain; self.target.len()];
        self.set_gain_vector(&new, interp_samples);
    }

    /// Stage a new target gain vector. Re-staging the pending target is a
    /// no-op; a zero interpolation time takes effect immediately.
    pub fn set_gain_vector(&mut self, new_gains: &[f64], interp_samples: u32) {
        debug_assert_eq!(new_gains.len(), self.target.len());

        if self.target == new_gains {
            return;
        }
        if interp_samples > 0 {
            self.target.copy_from_slice(new_gains);
            for i in 0..self.target.len() {
                self.delta[i] = (self.target[i] - self.current[i]) / interp_samples as f64;
            }
            self.interp_duration = interp_samples;
            self.interp_count = 0;
        } else {
            self.target.copy_from_slice(new_gains);
            self.current.copy_from_slice(new_gains);
            self.delta.fill(0.0);
            self.interp_duration = 0;
            self.interp_count = 0;
        }
    }

    fn begin_block(&mut self, n_samples: u32) -> u32 {
        if self.first_call {
            // The first processed block starts at the target without a
            // fade-in from silence.
            self.current.copy_from_slice(&self.target);
            self.interp_count = self.interp_duration;
            self.first_call = false;
        }
        n_samples.min(self.interp_duration.saturating_sub(self.interp_count))
    }

    /// Replace-mode processing: `out[ch][offset + i] = in[i] * gain[ch]`.
    /// During the hold phase, channels whose target gain is within 1e-5 of
    /// unity are skipped entirely (unity is unity).
    pub fn process(&mut self, input: &[f32], out: &mut [Vec<f32>], n_samples: usize, offset: usize) {
        let n_interp = self.begin_block(n_samples as u32) as usize;

        if self.interp_count < self.interp_duration {
            for (ch, out_ch) in out.iter_mut().enumerate() {
                let mut g = self.current[ch];
                for i in 0..n_interp {
                    out_ch[offset + i] = input[i] * g as f32;
                    g += self.delta[ch];
                }
            }
            for (ch, g) in self.current.iter_mut().enumerate() {
                *g += self.delta[ch] * n_interp as f64;
            }
            self.interp_count += n_interp as u32;
        }

        for (ch, out_ch) in out.iter_mut().enumerate() {
            let gain = self.target[ch] as f32;
            if (gain - 1.0).abs() <= 1e-5 {
                continue;
            }
            for i in n_interp..n_samples {
                out_ch[offset + i] = input[i] * gain;
            }
        }
    }

    /// Replace-mode processing of a single channel, in place. Only valid for
    /// single-channel interpolators.
    pub fn process_in_place(&mut self, buffer: &mut [f32], n_samples: usize) {
        debug_assert_eq!(self.target.len(), 1);
        let n_interp = self.begin_block(n_samples as u32) as usize;

        if self.interp_count < self.interp_duration {
            let mut g = self.current[0];
            for sample in buffer.iter_mut().take(n_interp) {
                *sample *= g as f32;
                g += self.delta[0];
            }
            self.current[0] = g;
            self.interp_count += n_interp as u32;
        }

        let gain = self.target[0] as f32;
        if (gain - 1.0).abs() > 1e-5 {
            for sample in buffer.iter_mut().take(n_samples).skip(n_interp) {
                *sample *= gain;
            }
        }
    }

    /// Accumulate-mode processing:
    /// `out[ch][offset + i] += in[i] * gain[ch] * mix_gain`.
    /// During the hold phase, channels whose target gain magnitude is below
    /// 1e-5 are skipped.
    pub fn process_accumul(
        &mut self,
        input: &[f32],
        out: &mut [Vec<f32>],
        n_samples: usize,
        offset: usize,
        mix_gain: f64,
    ) {
        let n_interp = self.begin_block(n_samples as u32) as usize;

        if self.interp_count < self.interp_duration {
            for (ch, out_ch) in out.iter_mut().enumerate() {
                let mut g = self.current[ch];
                for i in 0..n_interp {
                    out_ch[offset + i] += input[i] * (g * mix_gain) as f32;
                    g += self.delta[ch];
                }
            }
            for (ch, g) in self.current.iter_mut().enumerate() {
                *g += self.delta[ch] * n_interp as f64;
            }
            self.interp_count += n_interp as u32;
        }

        for (ch, out_ch) in out.iter_mut().enumerate() {
            let gain = self.target[ch];
            if gain.abs() < 1e-5 {
                continue;
            }
            let g = (gain * mix_gain) as f32;
            for i in n_interp..n_samples {
                out_ch[offset + i] += input[i] * g;
            }
        }
    }

    /// Jump to the target gains and mark the next process call as the first.
    pub fn reset(&mut self) {
        self.interp_count = self.interp_duration;
        self.current.copy_from_slice(&self.target);
        self.first_call = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bufs(ch: usize, n: usize) -> Vec<Vec<f32>> {
        vec![vec![0.0; n]; ch]
    }

    #[test]
    fn first_block_snaps_to_target() {
        let mut interp = GainInterp::new(2);
        interp.set_gain_vector(&[0.5, 0.25], 128);
        let input = vec![1.0f32; 64];
        let mut out = bufs(2, 64);
        interp.process_accumul(&input, &mut out, 64, 0, 1.0);
        // No ramp from zero on the very first call
        assert!((out[0][0] - 0.5).abs() < 1e-6);
        assert!((out[1][63] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn ramp_is_linear_over_exactly_n_samples() {
        let mut interp = GainInterp::new(1);
        interp.set_gain_vector(&[0.0], 0);
        let input = vec![1.0f32; 100];
        let mut out = bufs(1, 100);
        interp.process_accumul(&input, &mut out, 100, 0, 1.0); // settle first call

        interp.set_gain_vector(&[1.0], 100);
        let mut out = bufs(1, 100);
        interp.process_accumul(&input, &mut out, 100, 0, 1.0);
        for i in 0..100 {
            let expected = i as f32 / 100.0;
            assert!(
                (out[0][i] - expected).abs() < 1e-5,
                "sample {i}: {} vs {expected}",
                out[0][i]
            );
        }

        // Next block holds the target exactly
        let mut out2 = bufs(1, 16);
        interp.process_accumul(&input, &mut out2, 16, 0, 1.0);
        for i in 0..16 {
            assert!((out2[0][i] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_interp_time_is_immediate() {
        let mut interp = GainInterp::new(1);
        interp.set_gain_vector(&[0.5], 0);
        let input = vec![1.0f32; 8];
        let mut out = bufs(1, 8);
        interp.process_accumul(&input, &mut out, 8, 0, 1.0);
        interp.set_gain_vector(&[1.0], 0);
        let mut out = bufs(1, 8);
        interp.process_accumul(&input, &mut out, 8, 0, 1.0);
        assert!((out[0][0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn restaging_pending_target_is_noop() {
        let mut interp = GainInterp::new(1);
        interp.set_gain_vector(&[1.0], 0);
        let input = vec![1.0f32; 4];
        let mut out = bufs(1, 4);
        interp.process_accumul(&input, &mut out, 4, 0, 1.0);

        interp.set_gain_vector(&[0.5], 8);
        // Process half the ramp, then re-stage the same target: the ramp
        // must continue rather than restart.
        let mut out = bufs(1, 4);
        interp.process_accumul(&input, &mut out, 4, 0, 1.0);
        interp.set_gain_vector(&[0.5], 8);
        let mut out2 = bufs(1, 4);
        interp.process_accumul(&input, &mut out2, 4, 0, 1.0);
        assert!(out2[0][0] < out[0][3], "ramp restarted instead of continuing");
        assert!((out2[0][3] - 0.5).abs() < 0.07);
    }

    #[test]
    fn accumul_skips_silent_channels_only() {
        // Replace-mode skips near-unity channels; accumulate-mode skips
        // near-zero channels.
        let mut interp = GainInterp::new(2);
        interp.set_gain_vector(&[1.0, 0.0], 0);
        let input = vec![1.0f32; 4];

        let mut acc = bufs(2, 4);
        acc[1][0] = 7.0;
        interp.process_accumul(&input, &mut acc, 4, 0, 1.0);
        assert!((acc[0][0] - 1.0).abs() < 1e-6);
        assert!((acc[1][0] - 7.0).abs() < 1e-6, "silent channel touched");

        let mut rep = bufs(2, 4);
        rep[0][0] = 7.0; // unity channel must be left untouched in replace mode
        interp.process(&input, &mut rep, 4, 0);
        assert!((rep[0][0] - 7.0).abs() < 1e-6);
        assert!((rep[1][0] - 0.0).abs() < 1e-6);
    }
}
