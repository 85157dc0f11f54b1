//! Metadata-space conversions between the cartesian and polar conventions.
//!
//! These are not geometric coordinate conversions: the cartesian metadata
//! convention of Rec. ITU-R BS.2127-0 sec. 10 maps the room cube onto the
//! sphere through per-sector warping, so positions and extents convert
//! through the sector mapping below.

use crate::coords::{
    inside_angle_range, local_coordinate_system, relative_angle, sgn, CartesianPosition,
    PolarPosition,
};
use crate::metadata::{ObjectMetadata, ObjectPosition};

const EL_TOP: f64 = 30.0;
const EL_DASH_TOP: f64 = 45.0;

/// Map a source positioned between two azimuths to a linear coordinate.
fn map_az_to_linear(az_l: f64, az_r: f64, az: f64) -> f64 {
    let az_mid = 0.5 * (az_l + az_r);
    let az_range = az_r - az_mid;
    let az_rel = az - az_mid;
    let g_r = 0.5 * (1.0 + az_rel.to_radians().tan() / az_range.to_radians().tan());
    2.0 / std::f64::consts::PI * g_r.atan2(1.0 - g_r)
}

/// Map a linear coordinate back to an azimuth between two azimuths.
fn map_linear_to_az(az_l: f64, az_r: f64, x: f64) -> f64 {
    let az_mid = 0.5 * (az_l + az_r);
    let az_range = az_r - az_mid;
    let g_dash_l = (x * std::f64::consts::FRAC_PI_2).cos();
    let g_dash_r = (x * std::f64::consts::FRAC_PI_2).sin();
    let g_r = g_dash_r / (g_dash_l + g_dash_r);
    let az_rel = (2.0 * (g_r - 0.5) * az_range.to_radians().tan())
        .atan()
        .to_degrees();
    az_mid + az_rel
}

/// Azimuth sector for the polar-to-cartesian direction.
/// Returns ((az_l, az_r), (x_l, y_l), (x_r, y_r)).
fn find_sector(az: f64) -> ((f64, f64), (f64, f64), (f64, f64)) {
    let tol = 1e-10;
    if inside_angle_range(az, 0.0, 30.0, tol) {
        ((30.0, 0.0), (-1.0, 1.0), (0.0, 1.0))
    } else if inside_angle_range(az, -30.0, 0.0, tol) {
        ((0.0, -30.0), (0.0, 1.0), (1.0, 1.0))
    } else if inside_angle_range(az, -110.0, -30.0, tol) {
        ((-30.0, -110.0), (1.0, 1.0), (1.0, -1.0))
    } else if inside_angle_range(az, 110.0, -110.0, tol) {
        ((-110.0, 110.0), (1.0, -1.0), (-1.0, -1.0))
    } else {
        ((110.0, 30.0), (-1.0, -1.0), (-1.0, 1.0))
    }
}

/// Azimuth sector for the cartesian-to-polar direction (the cube diagonals
/// land at +-45/135 degrees).
fn find_cart_sector(az: f64) -> ((f64, f64), (f64, f64), (f64, f64)) {
    let tol = 1e-10;
    if inside_angle_range(az, 0.0, 45.0, tol) {
        ((30.0, 0.0), (-1.0, 1.0), (0.0, 1.0))
    } else if inside_angle_range(az, -45.0, 0.0, tol) {
        ((0.0, -30.0), (0.0, 1.0), (1.0, 1.0))
    } else if inside_angle_range(az, -135.0, -45.0, tol) {
        ((-30.0, -110.0), (1.0, 1.0), (1.0, -1.0))
    } else if inside_angle_range(az, 135.0, -135.0, tol) {
        ((-110.0, 110.0), (1.0, -1.0), (-1.0, -1.0))
    } else {
        ((110.0, 30.0), (-1.0, -1.0), (-1.0, 1.0))
    }
}

/// Convert a polar metadata position to the cartesian convention.
pub fn point_polar_to_cart(polar: PolarPosition) -> CartesianPosition {
    let az = polar.azimuth;
    let el = polar.elevation;
    let d = polar.distance;

    let (z, r_xy) = if el.abs() > EL_TOP {
        let el_dash = EL_DASH_TOP + (90.0 - EL_DASH_TOP) * (el.abs() - EL_TOP) / (90.0 - EL_TOP);
        (d * sgn(el) as f64, d * (90.0 - el_dash).to_radians().tan())
    } else {
        let el_dash = EL_DASH_TOP * el / EL_TOP;
        (d * el_dash.to_radians().tan(), d)
    };

    let ((az_l, az_r), (x_l, y_l), (x_r, y_r)) = find_sector(az);
    let az_dash = relative_angle(az_r, az);
    let az_dash_l = relative_angle(az_r, az_l);
    let p = map_az_to_linear(az_dash_l, az_r, az_dash);
    CartesianPosition::new(r_xy * (x_l + p * (x_r - x_l)), r_xy * (y_l + p * (y_r - y_l)), z)
}

/// Convert a cartesian metadata position to the polar convention.
pub fn point_cart_to_polar(cart: CartesianPosition) -> PolarPosition {
    let tol = 1e-10;
    let (x, y, z) = (cart.x, cart.y, cart.z);

    if x.abs() < tol && y.abs() < tol {
        return if z.abs() < tol {
            PolarPosition::new(0.0, 0.0, 0.0)
        } else {
            PolarPosition::new(0.0, 90.0 * sgn(z) as f64, z.abs())
        };
    }

    let az_dash = -x.atan2(y).to_degrees();
    let ((az_l, az_r), (x_l, y_l), (x_r, y_r)) = find_cart_sector(az_dash);

    let det = x_l * y_r - y_l * x_r;
    let g0 = x * (y_r / det) + y * (-x_r / det);
    let g1 = x * (-y_l / det) + y * (x_l / det);
    let r_xy = g0 + g1;
    let az_dash_l = relative_angle(az_r, az_l);
    let az_rel = map_linear_to_az(az_dash_l, az_r, g1 / r_xy);
    let az = relative_angle(-180.0, az_rel);
    let el_dash = (z / r_xy).atan().to_degrees();

    let (el, d) = if el_dash.abs() > EL_DASH_TOP {
        let el = (EL_TOP + (90.0 - EL_TOP) * (el_dash.abs() - EL_DASH_TOP) / (90.0 - EL_DASH_TOP))
            * sgn(el_dash) as f64;
        (el, z.abs())
    } else {
        (el_dash * EL_TOP / EL_DASH_TOP, r_xy)
    };

    PolarPosition::new(az, el, d)
}

/// Convert polar extent (width/height/depth) to cartesian extent.
pub fn whd2xyz(w: f64, h: f64, d: f64) -> (f64, f64, f64) {
    let s_xw = if w < 180.0 { (w * 0.5).to_radians().sin() } else { 1.0 };
    let s_yw = 0.5 * (1.0 - (w * 0.5).to_radians().cos());
    let s_zh = if h < 180.0 { (h * 0.5).to_radians().sin() } else { 1.0 };
    let s_yh = 0.5 * (1.0 - (h * 0.5).to_radians().cos());
    (s_xw, s_yw.max(s_yh).max(d), s_zh)
}

/// Convert cartesian extent to polar extent.
pub fn xyz2whd(s_x: f64, s_y: f64, s_z: f64) -> (f64, f64, f64) {
    let w_sx = 2.0 * s_x.asin().to_degrees();
    let w_sy = 2.0 * (1.0 - 2.0 * s_y).acos().to_degrees();
    let w = w_sx + s_x * (w_sy - w_sx).max(0.0);

    let h_sz = 2.0 * s_z.asin().to_degrees();
    let h_sy = 2.0 * (1.0 - 2.0 * s_y).acos().to_degrees();
    let h = h_sz + s_z * (h_sy - h_sz).max(0.0);

    let (_, s_eq_y, _) = whd2xyz(w, h, 0.0);
    (w, h, (s_y - s_eq_y).max(0.0))
}

/// Convert a cartesian source position and extent to polar equivalents.
pub fn extent_cart_to_polar(
    position: CartesianPosition,
    s_x: f64,
    s_y: f64,
    s_z: f64,
) -> (PolarPosition, (f64, f64, f64)) {
    let polar = point_cart_to_polar(position);
    let local = local_coordinate_system(polar.azimuth, polar.elevation);
    let diag = [s_x, s_y, s_z];
    let mut m = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            m[i][j] = diag[i] * local[i][j];
        }
    }
    let s_xf = (m[0][0] * m[0][0] + m[1][0] * m[1][0] + m[2][0] * m[2][0]).sqrt();
    let s_yf = (m[0][1] * m[0][1] + m[1][1] * m[1][1] + m[2][1] * m[2][1]).sqrt();
    let s_zf = (m[0][2] * m[0][2] + m[1][2] * m[1][2] + m[2][2] * m[2][2]).sqrt();
    (polar, xyz2whd(s_xf, s_yf, s_zf))
}

/// Normalize a metadata block to the polar convention. Blocks already in
/// polar form pass through unchanged.
pub fn to_polar(metadata: &ObjectMetadata) -> ObjectMetadata {
    let mut out = metadata.clone();
    if metadata.cartesian {
        let position = match metadata.position {
            ObjectPosition::Cartesian(cart) => cart,
            ObjectPosition::Polar(polar) => polar.to_cartesian(),
        };
        let (polar, (w, h, d)) =
            extent_cart_to_polar(position, metadata.width, metadata.height, metadata.depth);
        out.position = ObjectPosition::Polar(polar);
        out.width = w;
        out.height = h;
        out.depth = d;
        out.cartesian = false;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_cube() {
        // Front centre maps to the front face centre
        let front = point_polar_to_cart(PolarPosition::new(0.0, 0.0, 1.0));
        assert!(front.x.abs() < 1e-9 && (front.y - 1.0).abs() < 1e-9 && front.z.abs() < 1e-9);

        // The left speaker direction maps to the front-left corner
        let left = point_polar_to_cart(PolarPosition::new(30.0, 0.0, 1.0));
        assert!((left.x + 1.0).abs() < 1e-9 && (left.y - 1.0).abs() < 1e-9);

        // Straight up maps to the top face
        let top = point_polar_to_cart(PolarPosition::new(0.0, 90.0, 1.0));
        assert!((top.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cart_polar_round_trip() {
        for (az, el) in [(0.0, 0.0), (30.0, 0.0), (-110.0, 0.0), (45.0, 20.0), (180.0, -15.0)] {
            let polar = PolarPosition::new(az, el, 1.0);
            let back = point_cart_to_polar(point_polar_to_cart(polar));
            assert!((back.azimuth - az).abs() < 1e-6, "az {az} -> {}", back.azimuth);
            assert!((back.elevation - el).abs() < 1e-6, "el {el} -> {}", back.elevation);
            assert!((back.distance - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_extent_stays_zero() {
        let (w, h, d) = xyz2whd(0.0, 0.0, 0.0);
        assert!(w.abs() < 1e-9 && h.abs() < 1e-9 && d.abs() < 1e-9);
    }

    #[test]
    fn to_polar_unflags_cartesian() {
        let md = ObjectMetadata {
            position: ObjectPosition::Cartesian(CartesianPosition::new(0.0, 1.0, 0.0)),
            cartesian: true,
            ..Default::default()
        };
        let out = to_polar(&md);
        assert!(!out.cartesian);
        match out.position {
            ObjectPosition::Polar(p) => {
                assert!(p.azimuth.abs() < 1e-6 && p.elevation.abs() < 1e-6);
            }
            _ => panic!("expected polar position"),
        }
    }
}
