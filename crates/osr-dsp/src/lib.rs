//! osr-dsp: audio-rate primitives for the OSR scene renderer.
//!
//! - `gain_interp` - sample-accurate linear gain ramps
//! - `biquad` - TDF-II filters (AllRAD LFE feed)
//! - `delay` - fixed compensation delay lines
//! - `fft_conv` - block FFT convolution with overlap-add
//! - `decorrelate` - the BS.2127 diffuse decorrelation bank

pub mod biquad;
pub mod decorrelate;
pub mod delay;
pub mod fft_conv;
pub mod gain_interp;

pub use biquad::BiquadTdf2;
pub use decorrelate::Decorrelator;
pub use delay::FixedDelay;
pub use fft_conv::{BlockFft, OverlapAdd};
pub use gain_interp::GainInterp;
