use crate::svg::num;
use crate::types::{Point, Viewport};
use geo::MultiPolygon;
use std::f64::consts::{FRAC_PI_4, PI};

// Latitude where the Mercator square ends; beyond this y runs off to infinity.
const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    scale: f64,
    translate: (f64, f64),
}

impl Mercator {
    pub fn new(scale: f64, translate: (f64, f64)) -> Self {
        Self { scale, translate }
    }

    // Projection whose output fills `viewport` with the bounds of `shapes`.
    // Returns `None` for an empty viewport or shapes without extent.
    pub fn fit_size(viewport: Viewport, shapes: &[&MultiPolygon<f64>]) -> Option<Self> {
        if !viewport.is_renderable() || viewport.height <= 0.0 {
            return None;
        }
        let (x0, y0, x1, y1) = raw_bounds(shapes)?;
        let (dx, dy) = (x1 - x0, y1 - y0);
        if dx <= 0.0 || dy <= 0.0 {
            return None;
        }
        let k = (viewport.width / dx).min(viewport.height / dy);
        let tx = (viewport.width - k * (x1 + x0)) / 2.0;
        let ty = (viewport.height - k * (y1 + y0)) / 2.0;
        Some(Self::new(k, (tx, ty)))
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> (f64, f64) {
        self.translate
    }

    pub fn project(&self, lon: f64, lat: f64) -> Point {
        let (x, y) = raw(lon, lat);
        Point::new(
            self.translate.0 + self.scale * x,
            self.translate.1 + self.scale * y,
        )
    }

    // SVG path data for every ring of `geometry`. A ring that wraps across
    // the antimeridian is broken into separate subpaths at the jump.
    pub fn path_data(&self, geometry: &MultiPolygon<f64>) -> String {
        let half_world = PI * self.scale;
        let mut d = String::new();
        for polygon in geometry {
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                let mut previous: Option<Point> = None;
                let mut started = false;
                for coord in ring.coords() {
                    let p = self.project(coord.x, coord.y);
                    let command = match previous {
                        Some(prev) if (p.x - prev.x).abs() <= half_world => 'L',
                        _ => 'M',
                    };
                    d.push(command);
                    d.push_str(&num(p.x));
                    d.push(',');
                    d.push_str(&num(p.y));
                    previous = Some(p);
                    started = true;
                }
                if started {
                    d.push('Z');
                }
            }
        }
        d
    }
}

fn raw(lon: f64, lat: f64) -> (f64, f64) {
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (lon.to_radians(), -(FRAC_PI_4 + phi / 2.0).tan().ln())
}

fn raw_bounds(shapes: &[&MultiPolygon<f64>]) -> Option<(f64, f64, f64, f64)> {
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for shape in shapes {
        for polygon in shape.iter() {
            for coord in polygon.exterior().coords() {
                let (x, y) = raw(coord.x, coord.y);
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    #[test]
    fn origin_projects_to_translate() {
        let m = Mercator::new(100.0, (480.0, 320.0));
        let p = m.project(0.0, 0.0);
        assert!((p.x - 480.0).abs() < 1e-9);
        assert!((p.y - 320.0).abs() < 1e-9);
    }

    #[test]
    fn north_is_up_and_poles_are_clamped() {
        let m = Mercator::new(100.0, (0.0, 0.0));
        assert!(m.project(0.0, 45.0).y < 0.0);
        let pole = m.project(0.0, 90.0);
        assert!(pole.y.is_finite());
        assert!((pole.y + PI * 100.0).abs() < 1e-3);
    }

    #[test]
    fn fit_size_fills_viewport() {
        let square: MultiPolygon<f64> = MultiPolygon::new(vec![polygon![
            (x: -10.0, y: -10.0),
            (x: 10.0, y: -10.0),
            (x: 10.0, y: 10.0),
            (x: -10.0, y: 10.0),
        ]]);
        let m = Mercator::fit_size(Viewport::new(200.0, 100.0), &[&square]).unwrap();
        let top_left = m.project(-10.0, 10.0);
        let bottom_right = m.project(10.0, -10.0);
        // Height is the binding dimension, so the shape spans it exactly and is centred.
        assert!(top_left.y.abs() < 1e-9);
        assert!((bottom_right.y - 100.0).abs() < 1e-9);
        assert!(((top_left.x + bottom_right.x) / 2.0 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn fit_size_rejects_degenerate_input() {
        let square: MultiPolygon<f64> =
            MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
        assert!(Mercator::fit_size(Viewport::new(0.0, 100.0), &[&square]).is_none());
        assert!(Mercator::fit_size(Viewport::new(100.0, 50.0), &[]).is_none());
    }

    #[test]
    fn path_breaks_at_antimeridian() {
        let m = Mercator::new(100.0, (0.0, 0.0));
        let strip: MultiPolygon<f64> = MultiPolygon::new(vec![polygon![
            (x: 170.0, y: 0.0),
            (x: -170.0, y: 0.0),
            (x: -170.0, y: 10.0),
        ]]);
        let d = m.path_data(&strip);
        assert_eq!(d.matches('M').count(), 3);
        assert!(d.ends_with('Z'));
    }
}
