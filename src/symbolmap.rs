use crate::basemap::{BaseMap, FALLBACK_MESSAGE};
use crate::config::SymbolMapConfig;
use crate::markers::{Marker, Reconciliation};
use crate::projection::Mercator;
use crate::svg::{num, svg_root, Element};
use crate::types::{Point, Responsive, Viewport};
use std::f64::consts::PI;
use std::sync::Arc;

pub const CONTAINER: &str = "vis-symbolmap";

const ASPECT: f64 = 0.6;

pub struct SymbolMap {
    base_map: Option<Arc<BaseMap>>,
    viewport: Viewport,
    projection: Mercator,
    config: SymbolMapConfig,
}

impl SymbolMap {
    pub fn new(base_map: Option<Arc<BaseMap>>, width: f64, config: SymbolMapConfig) -> Self {
        let viewport = Self::viewport_for(width);
        Self {
            base_map,
            viewport,
            projection: Self::projection_for(viewport),
            config,
        }
    }

    pub fn viewport_for(width: f64) -> Viewport {
        Viewport::new(width, width * ASPECT)
    }

    pub fn projection_for(viewport: Viewport) -> Mercator {
        Mercator::new(
            viewport.width / (2.0 * PI),
            (viewport.width / 2.0, viewport.height / 1.5),
        )
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> Mercator {
        self.projection
    }

    pub fn is_live(&self) -> bool {
        self.base_map.is_some()
    }

    pub fn marker_position(&self, marker: &Marker) -> Point {
        self.projection.project(marker.lon, marker.lat)
    }

    pub fn render(&self, frame: &Reconciliation) -> Element {
        let base_map = match &self.base_map {
            Some(map) => map,
            None => return fallback(),
        };

        let mut g = Element::new("g");
        for country in &base_map.countries {
            g.push(
                Element::new("path")
                    .attr("class", "scountry")
                    .attr("d", self.projection.path_data(&country.geometry)),
            );
        }

        let radius = num(self.config.marker_radius);
        for marker in &frame.entering {
            let enter = format!("{}ms", self.config.enter_ms);
            g.push(
                self.marker_circle(marker, "visitor-point new")
                    .attr("r", 0)
                    .child(animate("r", "0", &radius, &enter))
                    .child(
                        Element::new("set")
                            .attr("attributeName", "class")
                            .attr("to", "visitor-point")
                            .attr("begin", &enter),
                    ),
            );
        }
        for marker in &frame.persisting {
            g.push(self.marker_circle(marker, "visitor-point").attr("r", &radius));
        }
        for marker in &frame.exiting {
            let exit = format!("{}ms", self.config.exit_ms);
            g.push(
                self.marker_circle(marker, "visitor-point exiting")
                    .attr("r", &radius)
                    .child(animate("r", &radius, "0", &exit))
                    .child(animate("opacity", "1", "0", &exit)),
            );
        }

        svg_root(self.viewport.width, self.viewport.height, "xMidYMid meet")
            .attr("width", "100%")
            .attr("height", num(self.viewport.height))
            .child(g)
    }

    fn marker_circle(&self, marker: &Marker, class: &str) -> Element {
        let p = self.marker_position(marker);
        Element::new("circle")
            .attr("class", class)
            .attr("data-id", marker.id)
            .attr("cx", num(p.x))
            .attr("cy", num(p.y))
    }
}

impl Responsive for SymbolMap {
    fn resize(&mut self, viewport: Viewport) -> bool {
        if !viewport.is_renderable() {
            return false;
        }
        self.viewport = Self::viewport_for(viewport.width);
        self.projection = Self::projection_for(self.viewport);
        true
    }
}

fn animate(attribute: &str, from: &str, to: &str, duration: &str) -> Element {
    Element::new("animate")
        .attr("attributeName", attribute)
        .attr("from", from)
        .attr("to", to)
        .attr("dur", duration)
        .attr("fill", "freeze")
}

pub fn fallback() -> Element {
    Element::new("p")
        .attr("class", "map-error")
        .attr("style", "color: red")
        .text(FALLBACK_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MarkerManager;
    use crate::topology::tests::TWO_SQUARES;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::{Duration, Instant};

    fn map(width: f64) -> SymbolMap {
        let base = BaseMap::from_topojson(TWO_SQUARES, "countries").unwrap();
        SymbolMap::new(Some(Arc::new(base)), width, SymbolMapConfig::default())
    }

    fn manager() -> MarkerManager {
        MarkerManager::with_rng(Duration::from_secs(15), StdRng::seed_from_u64(1))
    }

    #[test]
    fn projection_depends_only_on_width() {
        let p = SymbolMap::projection_for(SymbolMap::viewport_for(960.0));
        assert!((p.scale() - 960.0 / (2.0 * PI)).abs() < 1e-9);
        assert_eq!(p.translate(), (480.0, 576.0 / 1.5));
    }

    #[test]
    fn resize_reprojects_markers() {
        let mut symbol_map = map(960.0);
        let mut markers = manager();
        let t0 = Instant::now();
        markers.spawn_at(t0, 30.0, 120.0);
        let frame = markers.reconcile(t0);

        assert!(symbol_map.resize(Viewport::new(480.0, 0.0)));
        assert_eq!(symbol_map.viewport(), Viewport::new(480.0, 288.0));
        let expected = SymbolMap::projection_for(Viewport::new(480.0, 288.0)).project(120.0, 30.0);
        let svg = symbol_map.render(&frame);
        let circle = svg.find_by_class("visitor-point")[0];
        assert_eq!(circle.get_attr("cx"), Some(num(expected.x).as_str()));
        assert_eq!(circle.get_attr("cy"), Some(num(expected.y).as_str()));
    }

    #[test]
    fn non_positive_width_keeps_last_geometry() {
        let mut symbol_map = map(960.0);
        let before = symbol_map.projection();
        assert!(!symbol_map.resize(Viewport::new(0.0, 100.0)));
        assert!(!symbol_map.resize(Viewport::new(-20.0, 100.0)));
        assert_eq!(symbol_map.projection(), before);
    }

    #[test]
    fn frame_animates_enter_and_exit() {
        let symbol_map = map(960.0);
        let mut markers = MarkerManager::with_rng(Duration::from_secs(3), StdRng::seed_from_u64(1));
        let t0 = Instant::now();
        markers.tick(t0);
        let frame = markers.tick(t0 + Duration::from_secs(4));
        let svg = symbol_map.render(&frame);

        let entering = svg.find_by_class("new");
        assert_eq!(entering.len(), 1);
        assert_eq!(entering[0].get_attr("r"), Some("0"));

        let exiting = svg.find_by_class("exiting");
        assert_eq!(exiting.len(), 1);
        assert_eq!(exiting[0].get_attr("data-id"), Some("0"));
        let animations = exiting[0].find_all(&|e: &Element| e.name() == "animate");
        assert_eq!(animations.len(), 2);
        assert!(animations.iter().all(|a| a.get_attr("to") == Some("0")));
        assert!(animations.iter().all(|a| a.get_attr("dur") == Some("1000ms")));

        assert_eq!(svg.find_by_class("scountry").len(), 2);
    }

    #[test]
    fn without_base_map_renders_fallback_only() {
        let symbol_map = SymbolMap::new(None, 960.0, SymbolMapConfig::default());
        assert!(!symbol_map.is_live());
        let out = symbol_map.render(&Reconciliation::default());
        assert_eq!(out.name(), "p");
        assert_eq!(out.text_content(), FALLBACK_MESSAGE);
    }
}
