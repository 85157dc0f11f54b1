//! Screen geometry, screen scaling and screen-edge locking.
//!
//! See Rec. ITU-R BS.2127-1 sections 7.3.3 and 7.3.4.

use serde::{Deserialize, Serialize};

use crate::coords::{interp, CartesianPosition, PolarPosition};
use crate::layout::Layout;
use crate::metadata::{ScreenEdge, ScreenEdgeLock};

/// A screen described either by a polar centre and azimuthal width or by a
/// cartesian centre and an X width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Screen {
    Polar {
        aspect_ratio: f64,
        centre: PolarPosition,
        width_azimuth: f64,
    },
    Cartesian {
        aspect_ratio: f64,
        centre: CartesianPosition,
        width_x: f64,
    },
}

impl Default for Screen {
    /// The default reference screen from Rec. ITU-R BS.2127-1 sec. 9.1
    fn default() -> Self {
        Screen::Polar {
            aspect_ratio: 1.78,
            centre: PolarPosition::new(0.0, 0.0, 1.0),
            width_azimuth: 58.0,
        }
    }
}

/// The screen reduced to its polar edge angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarEdges {
    pub left_azimuth: f64,
    pub right_azimuth: f64,
    pub top_elevation: f64,
    pub bottom_elevation: f64,
}

impl PolarEdges {
    pub fn from_screen(screen: &Screen) -> Self {
        match screen {
            Screen::Polar {
                aspect_ratio,
                centre,
                width_azimuth,
            } => {
                let half_width = 0.5 * width_azimuth;
                // Height follows from the aspect ratio on the unit sphere
                let half_height = (half_width.to_radians().tan() / aspect_ratio)
                    .atan()
                    .to_degrees();
                Self {
                    left_azimuth: centre.azimuth + half_width,
                    right_azimuth: centre.azimuth - half_width,
                    top_elevation: centre.elevation + half_height,
                    bottom_elevation: centre.elevation - half_height,
                }
            }
            Screen::Cartesian {
                aspect_ratio,
                centre,
                width_x,
            } => {
                let half_width = 0.5 * width_x;
                let half_height = half_width / aspect_ratio;
                let left = CartesianPosition::new(centre.x - half_width, centre.y, centre.z).to_polar();
                let right = CartesianPosition::new(centre.x + half_width, centre.y, centre.z).to_polar();
                let top = CartesianPosition::new(centre.x, centre.y, centre.z + half_height).to_polar();
                let bottom = CartesianPosition::new(centre.x, centre.y, centre.z - half_height).to_polar();
                Self {
                    left_azimuth: left.azimuth,
                    right_azimuth: right.azimuth,
                    top_elevation: top.elevation,
                    bottom_elevation: bottom.elevation,
                }
            }
        }
    }
}

/// In some layouts the cartesian path warps vertical panning in front of the
/// listener; this compensates. Identity for layouts without U+045.
/// See Rec. ITU-R BS.2127-0 sec. 7.3.2.
pub fn compensate_position(az: f64, el: f64, layout: &Layout) -> (f64, f64) {
    if layout.contains_channel("U+045") {
        let az_r = interp(el, &[-90.0, 0.0, 30.0, 90.0], &[30.0, 30.0, 30.0 * 30.0 / 45.0, 30.0]);
        let az_dash = interp(az, &[-180.0, -30.0, 30.0, 180.0], &[-180.0, -az_r, az_r, 180.0]);
        (az_dash, el)
    } else {
        (az, el)
    }
}

/// Remaps positions from reference-screen space to reproduction-screen
/// space.
#[derive(Debug, Clone)]
pub struct ScreenScaleHandler {
    layout: Layout,
    rep_edges: Option<PolarEdges>,
}

impl ScreenScaleHandler {
    pub fn new(reproduction_screen: Option<&Screen>, layout: Layout) -> Self {
        Self {
            layout,
            rep_edges: reproduction_screen.map(PolarEdges::from_screen),
        }
    }

    /// Scale `position` when `screen_ref` is set and a reproduction screen
    /// was configured; otherwise pass through.
    pub fn handle(
        &self,
        position: CartesianPosition,
        screen_ref: bool,
        reference_screen: &Screen,
        cartesian: bool,
    ) -> CartesianPosition {
        let Some(rep) = self.rep_edges else {
            return position;
        };
        if !screen_ref {
            return position;
        }
        let reference = PolarEdges::from_screen(reference_screen);
        let polar = position.to_polar();
        let (az, el) = self.scale_az_el(polar.azimuth, polar.elevation, &reference, &rep);
        if cartesian {
            let (az, el) = compensate_position(az, el, &self.layout);
            PolarPosition::new(az, el, polar.distance).to_cartesian()
        } else {
            PolarPosition::new(az, el, polar.distance).to_cartesian()
        }
    }

    fn scale_az_el(&self, az: f64, el: f64, reference: &PolarEdges, rep: &PolarEdges) -> (f64, f64) {
        let az_scaled = interp(
            az,
            &[-180.0, reference.right_azimuth, reference.left_azimuth, 180.0],
            &[-180.0, rep.right_azimuth, rep.left_azimuth, 180.0],
        );
        let el_scaled = interp(
            el,
            &[-90.0, reference.bottom_elevation, reference.top_elevation, 90.0],
            &[-90.0, rep.bottom_elevation, rep.top_elevation, 90.0],
        );
        (az_scaled, el_scaled)
    }
}

/// Forces positions onto the reproduction-screen edges when the metadata
/// requests it.
#[derive(Debug, Clone)]
pub struct ScreenEdgeLockHandler {
    layout: Layout,
    rep_edges: Option<PolarEdges>,
}

impl ScreenEdgeLockHandler {
    pub fn new(reproduction_screen: Option<&Screen>, layout: Layout) -> Self {
        Self {
            layout,
            rep_edges: reproduction_screen.map(PolarEdges::from_screen),
        }
    }

    pub fn handle_vector(
        &self,
        position: CartesianPosition,
        edge_lock: ScreenEdgeLock,
        cartesian: bool,
    ) -> CartesianPosition {
        if self.rep_edges.is_none() {
            return position;
        }
        let polar = position.to_polar();
        let (az, el) = self.handle_az_el(polar.azimuth, polar.elevation, edge_lock);
        if cartesian {
            let (az, el) = compensate_position(az, el, &self.layout);
            PolarPosition::new(az, el, polar.distance).to_cartesian()
        } else {
            PolarPosition::new(az, el, polar.distance).to_cartesian()
        }
    }

    pub fn handle_az_el(&self, az: f64, el: f64, edge_lock: ScreenEdgeLock) -> (f64, f64) {
        let Some(edges) = self.rep_edges else {
            return (az, el);
        };
        let az = match edge_lock.horizontal {
            Some(ScreenEdge::Left) => edges.left_azimuth,
            Some(ScreenEdge::Right) => edges.right_azimuth,
            _ => az,
        };
        let el = match edge_lock.vertical {
            Some(ScreenEdge::Top) => edges.top_elevation,
            Some(ScreenEdge::Bottom) => edges.bottom_elevation,
            _ => el,
        };
        (az, el)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_screen_edges() {
        let edges = PolarEdges::from_screen(&Screen::default());
        assert!((edges.left_azimuth - 29.0).abs() < 1e-9);
        assert!((edges.right_azimuth + 29.0).abs() < 1e-9);
        assert!(edges.top_elevation > 0.0 && edges.top_elevation < 29.0);
        assert!((edges.top_elevation + edges.bottom_elevation).abs() < 1e-9);
    }

    #[test]
    fn identical_screens_scale_to_identity() {
        let layout = Layout::with_name("0+5+0").unwrap().without_lfe();
        let screen = Screen::default();
        let handler = ScreenScaleHandler::new(Some(&screen), layout);
        for az in [-120.0, -29.0, 0.0, 15.0, 170.0] {
            let pos = PolarPosition::new(az, 10.0, 1.0).to_cartesian();
            let out = handler.handle(pos, true, &screen, false);
            assert!((out.x - pos.x).abs() < 1e-9, "azimuth {az}");
            assert!((out.y - pos.y).abs() < 1e-9);
            assert!((out.z - pos.z).abs() < 1e-9);
        }
    }

    #[test]
    fn no_reproduction_screen_is_passthrough() {
        let layout = Layout::with_name("0+5+0").unwrap().without_lfe();
        let handler = ScreenScaleHandler::new(None, layout);
        let pos = PolarPosition::new(12.0, 3.0, 1.0).to_cartesian();
        let out = handler.handle(pos, true, &Screen::default(), false);
        assert_eq!(out, pos);
    }

    #[test]
    fn edge_lock_snaps_to_edges() {
        let layout = Layout::with_name("0+5+0").unwrap().without_lfe();
        let handler = ScreenEdgeLockHandler::new(Some(&Screen::default()), layout);
        let lock = ScreenEdgeLock {
            horizontal: Some(ScreenEdge::Left),
            vertical: Some(ScreenEdge::Top),
        };
        let (az, el) = handler.handle_az_el(0.0, 0.0, lock);
        assert!((az - 29.0).abs() < 1e-9);
        assert!(el > 0.0);
    }
}
