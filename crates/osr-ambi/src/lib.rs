//! osr-ambi: the ambisonic core of the OSR scene renderer.
//!
//! B-format buffers in ACN ordering with SN3D normalization, a point-source
//! encoder, sound-field rotation for head tracking, and HRTF
//! binauralization. Decoding to loudspeakers (AllRAD) lives in `osr-render`
//! next to the point-source panner it is built from.

pub mod bformat;
pub mod binauralizer;
pub mod encoder;
pub mod hrtf;
pub mod rotator;
pub mod sh;

pub use bformat::BFormat;
pub use binauralizer::Binauralizer;
pub use encoder::AmbisonicEncoder;
pub use hrtf::{HrirPair, HrtfSet, SyntheticHrtf};
pub use rotator::{AmbisonicRotator, RotationOrder, RotationOrientation};

/// Number of ambisonic components for a 3D signal of the given order.
pub fn order_to_components(order: u32) -> usize {
    ((order + 1) * (order + 1)) as usize
}

/// ACN component index for a spherical harmonic of given order and degree.
pub fn order_and_degree_to_component(order: i32, degree: i32) -> usize {
    (order * (order + 1) + degree) as usize
}

/// Spherical harmonic order of an ACN component index.
pub fn component_to_order(component: usize) -> u32 {
    (component as f64).sqrt().floor() as u32
}

/// Gain converting one N3D component of the given order to SN3D.
pub fn n3d_to_sn3d_factor(order: i32) -> f64 {
    1.0 / ((2 * order) as f64 + 1.0).sqrt()
}

/// Gain converting one SN3D component of the given order to N3D.
pub fn sn3d_to_n3d_factor(order: i32) -> f64 {
    ((2 * order) as f64 + 1.0).sqrt()
}

/// Gain converting one FuMa-normalized component to SN3D. Defined up to
/// third order.
pub fn fuma_to_sn3d_factor(order: i32, degree: i32) -> f64 {
    match order_and_degree_to_component(order, degree) {
        0..=3 => 2f64.sqrt(),
        4 | 5 | 7 | 8 => 3f64.sqrt() / 2.0,
        6 => 1.0,
        9 | 15 => (5.0f64 / 8.0).sqrt(),
        10 | 14 => 5f64.sqrt() / 3.0,
        11 | 13 => (32.0f64 / 45.0).sqrt(),
        12 => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_counts() {
        assert_eq!(order_to_components(0), 1);
        assert_eq!(order_to_components(1), 4);
        assert_eq!(order_to_components(3), 16);
    }

    #[test]
    fn acn_indexing() {
        assert_eq!(order_and_degree_to_component(0, 0), 0);
        assert_eq!(order_and_degree_to_component(1, -1), 1);
        assert_eq!(order_and_degree_to_component(1, 0), 2);
        assert_eq!(order_and_degree_to_component(1, 1), 3);
        assert_eq!(order_and_degree_to_component(3, 3), 15);
        for comp in 0..16 {
            assert_eq!(component_to_order(comp), [0, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3][comp]);
        }
    }

    #[test]
    fn normalization_factors() {
        assert!((n3d_to_sn3d_factor(0) - 1.0).abs() < 1e-12);
        assert!((n3d_to_sn3d_factor(1) - 1.0 / 3f64.sqrt()).abs() < 1e-12);
        assert!((n3d_to_sn3d_factor(2) * sn3d_to_n3d_factor(2) - 1.0).abs() < 1e-12);
        assert!((fuma_to_sn3d_factor(0, 0) - 2f64.sqrt()).abs() < 1e-12);
        assert!((fuma_to_sn3d_factor(2, 0) - 1.0).abs() < 1e-12);
    }
}
