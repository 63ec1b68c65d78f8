use crate::data::{Placement, TimelineEntry};
use crate::scale::{extent, LinearScale};
use crate::svg::{num, svg_root, translate, Element};
use crate::types::{Margin, Responsive, Viewport};

pub const CONTAINER: &str = "timeline-chart";

const MARGIN: Margin = Margin::new(130.0, 60.0, 90.0, 60.0);
const MIN_WIDTH: f64 = 600.0;
const HEIGHT: f64 = 700.0;
const POINT_PADDING: f64 = 250.0;
const POINT_RADIUS: f64 = 8.0;
const ROLE_BOX: (f64, f64) = (410.0, 80.0);
const DESCRIPTION_BOX: (f64, f64) = (400.0, 200.0);
const IMAGE_SIZE: (f64, f64) = (300.0, 100.0);
const XHTML: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Clone)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    width: f64,
    x: LinearScale,
}

impl Timeline {
    pub fn new(entries: &[TimelineEntry], container_width: f64) -> Self {
        let years = extent(entries.iter().map(|e| e.year as f64)).unwrap_or((0.0, 0.0));
        let mut timeline = Self {
            entries: entries.to_vec(),
            width: MIN_WIDTH,
            x: LinearScale::new(years, (0.0, 0.0)),
        };
        timeline.apply_width(container_width);
        timeline
    }

    fn apply_width(&mut self, container_width: f64) {
        self.width = container_width.max(MIN_WIDTH);
        let chart_width = self.chart_width();
        self.x.set_range((POINT_PADDING, chart_width - POINT_PADDING));
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    fn chart_width(&self) -> f64 {
        self.width - MARGIN.horizontal()
    }

    fn axis_y(&self) -> f64 {
        (HEIGHT - MARGIN.vertical()) / 2.0
    }

    pub fn point_x(&self, year: i32) -> f64 {
        self.x.map(year as f64)
    }

    pub fn render(&self) -> Element {
        let axis_y = self.axis_y();
        let mut chart = Element::new("g")
            .attr("transform", translate(MARGIN.left, MARGIN.top))
            .child(
                Element::new("line")
                    .attr("class", "timeline-line")
                    .attr("x1", 0)
                    .attr("y1", num(axis_y))
                    .attr("x2", num(self.chart_width() + 20.0))
                    .attr("y2", num(axis_y))
                    .attr("marker-end", "url(#arrowhead)"),
            )
            .child(
                Element::new("defs").child(
                    Element::new("marker")
                        .attr("id", "arrowhead")
                        .attr("viewBox", "0 -5 10 10")
                        .attr("refX", 5)
                        .attr("refY", 0)
                        .attr("markerWidth", 8)
                        .attr("markerHeight", 8)
                        .attr("orient", "auto")
                        .child(
                            Element::new("path")
                                .attr("d", "M0,-5L10,0L0,5")
                                .attr("class", "arrowhead"),
                        ),
                ),
            );

        for entry in &self.entries {
            chart.push(self.point(entry, axis_y));
        }

        svg_root(self.width, HEIGHT, "xMidYMid meet").child(chart)
    }

    fn point(&self, entry: &TimelineEntry, axis_y: f64) -> Element {
        let year_y = match entry.year_position {
            Placement::Below => 35.0,
            Placement::Above => -20.0,
        };
        let role_y = match entry.year_position {
            Placement::Below => 25.0,
            Placement::Above => -35.0 - ROLE_BOX.1,
        };
        let description_y = match entry.description_position {
            Placement::Above => -DESCRIPTION_BOX.1 - 20.0,
            Placement::Below => 10.0,
        };
        let image_y = match entry.image_position {
            Placement::Above => (-DESCRIPTION_BOX.1 + 80.0) - IMAGE_SIZE.1 - 100.0,
            Placement::Below => (-95.0 + DESCRIPTION_BOX.1) + 10.0,
        };

        Element::new("g")
            .attr("class", "timeline-point-group")
            .attr("transform", translate(self.point_x(entry.year), axis_y))
            .child(Element::new("circle").attr("class", "timeline-point").attr("r", POINT_RADIUS))
            .child(
                Element::new("text")
                    .attr("class", "timeline-year")
                    .attr("x", 0)
                    .attr("y", year_y)
                    .text(entry.year),
            )
            .child(foreign_box(ROLE_BOX, role_y, "timeline-company-role-content", &entry.company_role))
            .child(foreign_box(
                DESCRIPTION_BOX,
                description_y,
                "timeline-description-content",
                &entry.description,
            ))
            .child(
                Element::new("image")
                    .attr("class", "timeline-image")
                    .attr("href", &entry.image)
                    .attr("width", IMAGE_SIZE.0)
                    .attr("height", IMAGE_SIZE.1)
                    .attr("x", -IMAGE_SIZE.0 / 2.0)
                    .attr("y", image_y),
            )
    }
}

fn foreign_box(size: (f64, f64), y: f64, class: &str, text: &str) -> Element {
    let mut div = Element::new("div").attr("xmlns", XHTML).attr("class", class);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            div.push(Element::new("br"));
        }
        div = div.text(line);
    }
    Element::new("foreignObject")
        .attr("x", -size.0 / 2.0)
        .attr("y", y)
        .attr("width", size.0)
        .attr("height", size.1)
        .child(div)
}

impl Responsive for Timeline {
    fn resize(&mut self, viewport: Viewport) -> bool {
        if !viewport.is_renderable() {
            return false;
        }
        self.apply_width(viewport.width);
        true
    }
}
