//! B-format sample buffer

use crate::order_to_components;

/// A block of ambisonic audio: (order+1)^2 channels in ACN ordering, SN3D
/// normalization by convention.
#[derive(Debug, Clone)]
pub struct BFormat {
    order: u32,
    num_samples: usize,
    channels: Vec<Vec<f32>>,
}

impl BFormat {
    pub fn new(order: u32, num_samples: usize) -> Self {
        let num_channels = order_to_components(order);
        Self {
            order,
            num_samples,
            channels: vec![vec![0.0; num_samples]; num_channels],
        }
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Overwrite one channel from the start of the buffer.
    pub fn insert_stream(&mut self, data: &[f32], channel: usize, n_samples: usize) {
        self.channels[channel][..n_samples].copy_from_slice(&data[..n_samples]);
    }

    /// Mix data into one channel at the given offset with a gain.
    pub fn add_stream(&mut self, data: &[f32], channel: usize, n_samples: usize, offset: usize, gain: f32) {
        let dst = &mut self.channels[channel][offset..offset + n_samples];
        for (d, s) in dst.iter_mut().zip(data.iter()) {
            *d += s * gain;
        }
    }

    /// Copy one channel out.
    pub fn extract_stream(&self, data: &mut [f32], channel: usize, n_samples: usize) {
        data[..n_samples].copy_from_slice(&self.channels[channel][..n_samples]);
    }

    /// Zero all channels.
    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.fill(0.0);
        }
    }

    /// Copy sample data from another buffer of the same shape.
    pub fn copy_from(&mut self, other: &BFormat) {
        debug_assert_eq!(self.channels.len(), other.channels.len());
        for (dst, src) in self.channels.iter_mut().zip(other.channels.iter()) {
            dst.copy_from_slice(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_follows_order() {
        let bf = BFormat::new(2, 256);
        assert_eq!(bf.num_channels(), 9);
        assert_eq!(bf.num_samples(), 256);
    }

    #[test]
    fn add_stream_accumulates_with_offset_and_gain() {
        let mut bf = BFormat::new(1, 16);
        let data = vec![1.0f32; 4];
        bf.add_stream(&data, 2, 4, 8, 0.5);
        bf.add_stream(&data, 2, 4, 8, 0.25);
        assert!((bf.channel(2)[8] - 0.75).abs() < 1e-6);
        assert!((bf.channel(2)[7]).abs() < 1e-9);
        bf.reset();
        assert!(bf.channel(2).iter().all(|s| *s == 0.0));
    }
}
