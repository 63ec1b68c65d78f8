use crate::basemap::BaseMap;
use crate::data::{PurposeCategory, TravelData};
use crate::projection::Mercator;
use crate::svg::{num, svg_root, translate, Element};
use crate::symbolmap::fallback;
use crate::types::{Point, Responsive, Viewport};
use rand::Rng;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

pub const CONTAINER: &str = "vis-dotmap";

const DOT_RADIUS: f64 = 1.5;
const JITTER: f64 = 4.0;
const HOVER_RADIUS: f64 = 6.0;
const LEGEND_ROW: f64 = 25.0;
const LEGEND_WIDTH: f64 = 120.0;
const LEGEND_OFFSET: f64 = 20.0;
const LEGEND_PADDING: f64 = 8.0;

#[derive(Debug, Clone)]
pub struct Dot {
    pub location: String,
    pub country: String,
    pub category: usize,
    pub lon: f64,
    pub lat: f64,
    // Fixed offset so visits to the same place do not stack exactly.
    pub jitter: (f64, f64),
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverInfo {
    pub location: String,
    pub country: String,
    pub purpose: String,
}

// Wrapper for RTree indexing
struct DotIndex {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for DotIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for DotIndex {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

pub struct DotMap {
    base_map: Option<Arc<BaseMap>>,
    categories: Vec<PurposeCategory>,
    dots: Vec<Dot>,
    viewport: Viewport,
    projection: Option<Mercator>,
    tree: RTree<DotIndex>,
}

impl DotMap {
    pub fn new<R: Rng>(
        travel: &TravelData,
        base_map: Option<Arc<BaseMap>>,
        width: f64,
        rng: &mut R,
    ) -> Self {
        let mut viewport = Self::viewport_for(width);
        if !viewport.is_renderable() {
            warn!("#{} has no usable width, using 960x480", CONTAINER);
            viewport = Viewport::new(960.0, 480.0);
        }

        let mut categories = travel.categories.clone();
        if categories.is_empty() {
            warn!("No purpose categories, every visit counts as Tourism");
            categories.push(PurposeCategory::tourism());
        }

        let mut dots = Vec::new();
        for visit in &travel.visits {
            let [lon, lat] = match visit.coords {
                Some(coords) => coords,
                None => {
                    warn!("Missing coordinates for {}. Dot not drawn.", visit.name);
                    continue;
                }
            };
            let category = match category_for(&categories, &visit.name) {
                Some(index) => index,
                None => {
                    warn!("No purpose category for {}. Dot not drawn.", visit.name);
                    continue;
                }
            };
            for _ in 0..visit.count {
                dots.push(Dot {
                    location: visit.name.clone(),
                    country: visit.country.clone(),
                    category,
                    lon,
                    lat,
                    jitter: (rng.gen_range(-JITTER..JITTER), rng.gen_range(-JITTER..JITTER)),
                    position: Point::new(0.0, 0.0),
                });
            }
        }

        let mut map = Self {
            base_map,
            categories,
            dots,
            viewport,
            projection: None,
            tree: RTree::new(),
        };
        map.reproject();
        map
    }

    pub fn viewport_for(width: f64) -> Viewport {
        Viewport::new(width, width / 2.0)
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> Option<Mercator> {
        self.projection
    }

    // Fits the projection to the current viewport and moves every dot.
    fn reproject(&mut self) {
        let projection = match &self.base_map {
            Some(map) => Mercator::fit_size(self.viewport, &map.shapes()),
            None => None,
        };
        let projection = match projection {
            Some(p) => p,
            None => return,
        };
        for dot in &mut self.dots {
            let p = projection.project(dot.lon, dot.lat);
            dot.position = Point::new(p.x + dot.jitter.0, p.y + dot.jitter.1);
        }
        self.tree = RTree::bulk_load(
            self.dots
                .iter()
                .enumerate()
                .map(|(index, dot)| DotIndex { index, position: [dot.position.x, dot.position.y] })
                .collect(),
        );
        self.projection = Some(projection);
    }

    // The dot under the pointer, if any lies within a few pixels.
    pub fn hover_at(&self, x: f64, y: f64) -> Option<HoverInfo> {
        self.projection?;
        let nearest = self.tree.nearest_neighbor(&[x, y])?;
        if nearest.distance_2(&[x, y]) > HOVER_RADIUS * HOVER_RADIUS {
            return None;
        }
        let dot = self.dots.get(nearest.index)?;
        let category = self.categories.get(dot.category)?;
        Some(HoverInfo {
            location: dot.location.clone(),
            country: dot.country.clone(),
            purpose: category.name.clone(),
        })
    }

    pub fn render(&self) -> Element {
        let (base_map, projection) = match (&self.base_map, self.projection) {
            (Some(map), Some(projection)) => (map, projection),
            _ => return fallback(),
        };

        let countries = Element::new("g").attr("class", "d3-map-countries").children(
            base_map.countries.iter().map(|country| {
                Element::new("path")
                    .attr("class", "d3-map-country")
                    .attr("d", projection.path_data(&country.geometry))
            }),
        );

        let dots = Element::new("g").attr("class", "d3-map-dots").children(self.dots.iter().filter_map(|dot| {
            let category = self.categories.get(dot.category)?;
            Some(Element::new("circle")
                .attr("class", format!("d3-map-dot {}", category.class_name))
                .attr("r", DOT_RADIUS)
                .attr("cx", num(dot.position.x))
                .attr("cy", num(dot.position.y))
                .child(Element::new("title").text(format!(
                    "Location: {}\nCountry: {}\nPurpose: {}",
                    dot.location, dot.country, category.name
                ))))
        }));

        svg_root(self.viewport.width, self.viewport.height, "xMidYMid meet")
            .child(countries)
            .child(dots)
            .child(self.legend())
    }

    fn legend(&self) -> Element {
        let rows = self.categories.len() as f64;
        let content_height = rows * LEGEND_ROW + 30.0;
        let mut legend = Element::new("g")
            .attr("class", "d3-map-legend-group")
            .attr(
                "transform",
                translate(self.viewport.width - LEGEND_WIDTH - LEGEND_OFFSET, LEGEND_OFFSET),
            )
            .child(
                Element::new("rect")
                    .attr("class", "d3-map-legend-background")
                    .attr("x", -LEGEND_PADDING)
                    .attr("y", -LEGEND_PADDING)
                    .attr("width", LEGEND_WIDTH + 2.0 * LEGEND_PADDING)
                    .attr("height", content_height + 2.0 * LEGEND_PADDING),
            );
        for (i, category) in self.categories.iter().enumerate() {
            legend.push(
                Element::new("g")
                    .attr("class", "d3-map-legend-item")
                    .attr("transform", translate(0.0, i as f64 * LEGEND_ROW))
                    .child(
                        Element::new("rect")
                            .attr("width", 18)
                            .attr("height", 18)
                            .attr("fill", &category.color),
                    )
                    .child(
                        Element::new("text")
                            .attr("x", 24)
                            .attr("y", 9)
                            .attr("dy", "0.35em")
                            .text(&category.name),
                    ),
            );
        }
        legend.child(
            Element::new("text")
                .attr("class", "d3-map-legend-note")
                .attr("x", 0)
                .attr("y", num(rows * LEGEND_ROW + 10.0))
                .text("One dot represents one visit"),
        )
    }
}

impl Responsive for DotMap {
    fn resize(&mut self, viewport: Viewport) -> bool {
        if !viewport.is_renderable() {
            warn!("#{} has no usable width during resize, skipping", CONTAINER);
            return false;
        }
        self.viewport = Self::viewport_for(viewport.width);
        self.reproject();
        true
    }
}

// Index of the category listing `location`, else the fallback category.
fn category_for(categories: &[PurposeCategory], location: &str) -> Option<usize> {
    categories
        .iter()
        .position(|c| c.locations.iter().any(|l| l == location))
        .or_else(|| categories.iter().position(|c| c.fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Visit;
    use crate::topology::tests::TWO_SQUARES;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn base() -> Option<Arc<BaseMap>> {
        Some(Arc::new(BaseMap::from_topojson(TWO_SQUARES, "countries").unwrap()))
    }

    fn travel(visits: Vec<Visit>) -> TravelData {
        TravelData { visits, ..TravelData::default() }
    }

    fn visit(name: &str, count: u32, coords: Option<[f64; 2]>) -> Visit {
        Visit { name: name.to_string(), country: "Testland".to_string(), count, coords }
    }

    #[test]
    fn one_dot_per_visit_with_category_fallback() {
        let data = travel(vec![
            visit("Shanghai", 3, Some([0.5, 0.5])),
            visit("Atlantis", 2, Some([1.5, 0.5])),
        ]);
        let map = DotMap::new(&data, base(), 400.0, &mut StdRng::seed_from_u64(3));
        assert_eq!(map.dots().len(), 5);
        let svg = map.render();
        assert_eq!(svg.find_by_class("d3-map-category-resident").len(), 3);
        assert_eq!(svg.find_by_class("d3-map-category-tourism").len(), 2);
    }

    #[test]
    fn entry_without_coordinates_draws_nothing() {
        let data = travel(vec![
            visit("Nowhere", 4, None),
            visit("Shanghai", 1, Some([0.5, 0.5])),
        ]);
        let map = DotMap::new(&data, base(), 400.0, &mut StdRng::seed_from_u64(3));
        let svg = map.render();
        let dots = svg.find_by_class("d3-map-dot");
        assert_eq!(dots.len(), 1);
        assert!(dots[0].text_content().contains("Shanghai"));
        assert!(!svg.render().contains("Nowhere"));
    }

    #[test]
    fn resize_recomputes_every_dot_from_projection() {
        let data = travel(vec![visit("Shanghai", 2, Some([0.5, 0.5]))]);
        let mut map = DotMap::new(&data, base(), 400.0, &mut StdRng::seed_from_u64(3));
        assert!(map.resize(Viewport::new(800.0, 123.0)));
        assert_eq!(map.viewport(), Viewport::new(800.0, 400.0));

        let shapes = base().unwrap();
        let expected = Mercator::fit_size(Viewport::new(800.0, 400.0), &shapes.shapes()).unwrap();
        assert_eq!(map.projection(), Some(expected));
        for dot in map.dots() {
            let p = expected.project(dot.lon, dot.lat);
            assert_eq!(dot.position, Point::new(p.x + dot.jitter.0, p.y + dot.jitter.1));
            assert!(dot.jitter.0.abs() <= JITTER && dot.jitter.1.abs() <= JITTER);
        }
    }

    #[test]
    fn zero_width_resize_is_skipped() {
        let data = travel(vec![visit("Shanghai", 1, Some([0.5, 0.5]))]);
        let mut map = DotMap::new(&data, base(), 400.0, &mut StdRng::seed_from_u64(3));
        let before = map.dots()[0].position;
        assert!(!map.resize(Viewport::new(0.0, 0.0)));
        assert_eq!(map.dots()[0].position, before);
        assert_eq!(map.viewport().width, 400.0);
    }

    #[test]
    fn hover_finds_nearby_dot_only() {
        let data = travel(vec![visit("Boston", 1, Some([0.5, 0.5]))]);
        let map = DotMap::new(&data, base(), 400.0, &mut StdRng::seed_from_u64(3));
        let p = map.dots()[0].position;
        let info = map.hover_at(p.x + 2.0, p.y).unwrap();
        assert_eq!(info.location, "Boston");
        assert_eq!(info.purpose, "Study");
        assert!(map.hover_at(p.x + 50.0, p.y + 50.0).is_none());
    }

    #[test]
    fn legend_is_anchored_to_right_edge() {
        let map = DotMap::new(&travel(vec![]), base(), 600.0, &mut StdRng::seed_from_u64(3));
        let svg = map.render();
        let legend = svg.find_by_class("d3-map-legend-group")[0];
        assert_eq!(legend.get_attr("transform"), Some("translate(460,20)"));
        assert_eq!(svg.find_by_class("d3-map-legend-item").len(), 3);
    }

    #[test]
    fn empty_category_list_falls_back_to_tourism() {
        let data = TravelData {
            visits: vec![visit("X", 1, Some([0.5, 0.5]))],
            categories: Vec::new(),
        };
        let map = DotMap::new(&data, base(), 400.0, &mut StdRng::seed_from_u64(3));
        let svg = map.render();
        assert_eq!(svg.find_by_class("d3-map-category-tourism").len(), 1);
        assert_eq!(svg.find_by_class("d3-map-legend-item").len(), 1);
        let p = map.dots()[0].position;
        assert_eq!(map.hover_at(p.x, p.y).unwrap().purpose, "Tourism");
    }

    #[test]
    fn visit_without_any_matching_category_is_skipped() {
        let mut study = PurposeCategory::tourism();
        study.name = "Study".to_string();
        study.class_name = "d3-map-category-academic".to_string();
        study.locations = vec!["Boston".to_string()];
        study.fallback = false;
        let data = TravelData {
            visits: vec![visit("Boston", 1, Some([0.5, 0.5])), visit("X", 3, Some([1.5, 0.5]))],
            categories: vec![study],
        };
        let map = DotMap::new(&data, base(), 400.0, &mut StdRng::seed_from_u64(3));
        assert_eq!(map.dots().len(), 1);
        assert_eq!(map.render().find_by_class("d3-map-dot").len(), 1);
    }

    #[test]
    fn missing_base_map_renders_fallback() {
        let data = travel(vec![visit("Shanghai", 1, Some([0.5, 0.5]))]);
        let map = DotMap::new(&data, None, 400.0, &mut StdRng::seed_from_u64(3));
        assert_eq!(map.render().name(), "p");
        assert!(map.hover_at(0.0, 0.0).is_none());
    }
}
