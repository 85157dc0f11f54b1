//! HRTF data contract and a built-in synthetic set.
//!
//! Datasets are addressed by direction: `(azimuth, elevation)` in degrees
//! maps to a pair of impulse responses. File-format loaders live outside
//! the core; the synthetic set below lets binaural output configure with no
//! external data, using a simple ITD/ILD/head-shadow model.

use osr_core::PolarPosition;

/// A left/right pair of head-related impulse responses.
#[derive(Debug, Clone, PartialEq)]
pub struct HrirPair {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl HrirPair {
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Self {
        Self { left, right }
    }

    pub fn len(&self) -> usize {
        self.left.len().max(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// Read-only HRTF dataset addressed by direction. Implementations may share
/// one set across renderers.
pub trait HrtfSet: Send + Sync {
    /// Sample rate the impulse responses are stored at.
    fn sample_rate(&self) -> u32;

    /// Length of the impulse responses in samples.
    fn num_taps(&self) -> usize;

    /// The impulse-response pair for the measurement closest to the given
    /// direction (degrees).
    fn hrir(&self, azimuth: f64, elevation: f64) -> HrirPair;
}

/// Deterministic synthetic HRTF set built from a spherical-head model:
/// interaural time difference, level difference and a first-order shadow
/// filter on the far ear.
pub struct SyntheticHrtf {
    sample_rate: u32,
    num_taps: usize,
}

impl SyntheticHrtf {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            num_taps: 128,
        }
    }
}

impl HrtfSet for SyntheticHrtf {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn num_taps(&self) -> usize {
        self.num_taps
    }

    fn hrir(&self, azimuth: f64, elevation: f64) -> HrirPair {
        let mut left = vec![0.0f32; self.num_taps];
        let mut right = vec![0.0f32; self.num_taps];

        // With azimuth positive counter-clockwise, positive pan means the
        // source is on the left.
        let az_rad = azimuth.to_radians();
        let el_rad = elevation.to_radians();
        let pan = az_rad.sin() * el_rad.cos();

        let head_radius = 0.0875; // metres
        let speed_of_sound = 343.0;
        let itd_seconds = (head_radius / speed_of_sound) * (pan.abs() + pan.abs().asin());
        let itd_samples = itd_seconds * self.sample_rate as f64;

        let left_gain = ((1.0 - pan) * 0.25 * std::f64::consts::PI).sin();
        let right_gain = ((1.0 + pan) * 0.25 * std::f64::consts::PI).sin();

        // Far ear receives the delayed path
        let left_delay = if pan < 0.0 { itd_samples } else { 0.0 };
        let right_delay = if pan > 0.0 { itd_samples } else { 0.0 };

        let sigma = 2.0f64;
        for i in 0..self.num_taps {
            let t = i as f64;
            let dl = t - 4.0 - left_delay;
            let dr = t - 4.0 - right_delay;
            left[i] = (left_gain * (-dl * dl / (2.0 * sigma * sigma)).exp()) as f32;
            right[i] = (right_gain * (-dr * dr / (2.0 * sigma * sigma)).exp()) as f32;
        }

        // Head shadow: gentle low-pass on the far ear
        let shadow = 1.0 - 0.6 * pan.abs() as f32;
        let far = if pan > 0.0 { &mut right } else { &mut left };
        let mut state = 0.0f32;
        for s in far.iter_mut() {
            state += (1.0 - shadow) * (*s - state);
            *s = shadow * *s + state * 0.5;
        }

        HrirPair::new(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_is_symmetric() {
        let set = SyntheticHrtf::new(48000);
        let pair = set.hrir(0.0, 0.0);
        let diff: f32 = pair
            .left
            .iter()
            .zip(&pair.right)
            .map(|(l, r)| (l - r).abs())
            .sum();
        assert!(diff < 1e-6);
    }

    #[test]
    fn left_source_is_left_dominant_and_leads() {
        let set = SyntheticHrtf::new(48000);
        let pair = set.hrir(90.0, 0.0);
        let left_energy: f32 = pair.left.iter().map(|s| s * s).sum();
        let right_energy: f32 = pair.right.iter().map(|s| s * s).sum();
        assert!(left_energy > right_energy * 2.0);

        let left_peak = pair.left.iter().enumerate().max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap()).unwrap().0;
        let right_peak = pair.right.iter().enumerate().max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap()).unwrap().0;
        assert!(right_peak > left_peak, "far ear should arrive later");
    }

    #[test]
    fn mirrored_directions_swap_ears() {
        let set = SyntheticHrtf::new(48000);
        let l = set.hrir(45.0, 0.0);
        let r = set.hrir(-45.0, 0.0);
        let diff: f32 = l.left.iter().zip(&r.right).map(|(a, b)| (a - b).abs()).sum();
        assert!(diff < 1e-5);
    }
}
