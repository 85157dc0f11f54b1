//! Real spherical harmonics in ACN ordering with SN3D normalization.

use osr_core::PolarPosition;

/// Evaluate the SN3D spherical harmonics up to `order` (max 3) for a
/// direction, writing one coefficient per ACN component into `coeffs`.
/// Azimuth is positive counter-clockwise, angles in degrees.
pub fn sn3d_coefficients(direction: PolarPosition, order: u32, coeffs: &mut [f64]) {
    debug_assert!(order <= 3);
    debug_assert!(coeffs.len() >= ((order + 1) * (order + 1)) as usize);

    let az = direction.azimuth.to_radians();
    let el = direction.elevation.to_radians();
    let (sin_az, cos_az) = az.sin_cos();
    let (sin_el, cos_el) = el.sin_cos();

    coeffs[0] = 1.0;
    if order < 1 {
        return;
    }

    coeffs[1] = cos_el * sin_az; // Y
    coeffs[2] = sin_el; // Z
    coeffs[3] = cos_el * cos_az; // X
    if order < 2 {
        return;
    }

    let sqrt3_2 = 3f64.sqrt() / 2.0;
    let sin_2az = (2.0 * az).sin();
    let cos_2az = (2.0 * az).cos();
    let cos_el_sq = cos_el * cos_el;
    let sin_el_sq = sin_el * sin_el;

    coeffs[4] = sqrt3_2 * cos_el_sq * sin_2az; // V
    coeffs[5] = sqrt3_2 * (2.0 * el).sin() * sin_az; // T
    coeffs[6] = 0.5 * (3.0 * sin_el_sq - 1.0); // R
    coeffs[7] = sqrt3_2 * (2.0 * el).sin() * cos_az; // S
    coeffs[8] = sqrt3_2 * cos_el_sq * cos_2az; // U
    if order < 3 {
        return;
    }

    let sqrt5_8 = (5.0f64 / 8.0).sqrt();
    let sqrt15_2 = 15f64.sqrt() / 2.0;
    let sqrt3_8 = (3.0f64 / 8.0).sqrt();
    let sin_3az = (3.0 * az).sin();
    let cos_3az = (3.0 * az).cos();
    let cos_el_cu = cos_el_sq * cos_el;

    coeffs[9] = sqrt5_8 * cos_el_cu * sin_3az; // Q
    coeffs[10] = sqrt15_2 * sin_el * cos_el_sq * sin_2az; // O
    coeffs[11] = sqrt3_8 * cos_el * (5.0 * sin_el_sq - 1.0) * sin_az; // M
    coeffs[12] = 0.5 * sin_el * (5.0 * sin_el_sq - 3.0); // K
    coeffs[13] = sqrt3_8 * cos_el * (5.0 * sin_el_sq - 1.0) * cos_az; // L
    coeffs[14] = sqrt15_2 * sin_el * cos_el_sq * cos_2az; // N
    coeffs[15] = sqrt5_8 * cos_el_cu * cos_3az; // P
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coeffs(az: f64, el: f64) -> Vec<f64> {
        let mut c = vec![0.0; 16];
        sn3d_coefficients(PolarPosition::new(az, el, 1.0), 3, &mut c);
        c
    }

    #[test]
    fn front_direction() {
        let c = coeffs(0.0, 0.0);
        assert!((c[0] - 1.0).abs() < 1e-12);
        assert!(c[1].abs() < 1e-12); // no left/right component
        assert!(c[2].abs() < 1e-12); // no up/down component
        assert!((c[3] - 1.0).abs() < 1e-12); // fully frontal
        assert!((c[6] + 0.5).abs() < 1e-12);
        assert!((c[8] - 3f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn hard_left_flips_odd_azimuth_terms() {
        let l = coeffs(90.0, 0.0);
        let r = coeffs(-90.0, 0.0);
        // Sine-phase components change sign left/right
        assert!((l[1] - 1.0).abs() < 1e-12 && (r[1] + 1.0).abs() < 1e-12);
        // Cosine-phase components are shared
        assert!((l[6] - r[6]).abs() < 1e-12);
    }

    #[test]
    fn zenith_kills_all_but_m_zero() {
        let c = coeffs(0.0, 90.0);
        // Only the degree-0 components survive at the pole
        for (i, v) in c.iter().enumerate() {
            match i {
                0 => assert!((v - 1.0).abs() < 1e-9),
                2 => assert!((v - 1.0).abs() < 1e-9),
                6 => assert!((v - 1.0).abs() < 1e-9),
                12 => assert!((v - 1.0).abs() < 1e-9),
                _ => assert!(v.abs() < 1e-9, "component {i} = {v}"),
            }
        }
    }
}
