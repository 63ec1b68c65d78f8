use crate::data::Slice;
use crate::scale::{OrdinalScale, CATEGORY10};
use crate::svg::{num, svg_root, translate, Element};
use crate::types::Point;
use std::f64::consts::TAU;

pub const CONTAINER: &str = "vis-piechart";

const SIZE: f64 = 450.0;
const LEGEND_SPACE: f64 = 150.0;
const SWEEP_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub start: f64,
    pub end: f64,
}

impl Arc {
    fn point(angle: f64, radius: f64) -> Point {
        Point::new(radius * angle.sin(), -radius * angle.cos())
    }

    pub fn path(&self, radius: f64) -> String {
        let sweep = self.end - self.start;
        if sweep >= TAU - 1e-9 {
            // A full circle cannot be a single arc command.
            let top = Arc::point(self.start, radius);
            let bottom = Arc::point(self.start + TAU / 2.0, radius);
            return format!(
                "M{},{}A{r},{r},0,1,1,{},{}A{r},{r},0,1,1,{},{}Z",
                num(top.x),
                num(top.y),
                num(bottom.x),
                num(bottom.y),
                num(top.x),
                num(top.y),
                r = num(radius)
            );
        }
        let p0 = Arc::point(self.start, radius);
        let p1 = Arc::point(self.end, radius);
        let large = if sweep > TAU / 2.0 { 1 } else { 0 };
        format!(
            "M{},{}A{r},{r},0,{},1,{},{}L0,0Z",
            num(p0.x),
            num(p0.y),
            large,
            num(p1.x),
            num(p1.y),
            r = num(radius)
        )
    }

    pub fn centroid(&self, radius: f64) -> Point {
        Arc::point((self.start + self.end) / 2.0, radius / 2.0)
    }
}

pub fn layout(slices: &[Slice]) -> Vec<Arc> {
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
    let k = if total > 0.0 { TAU / total } else { 0.0 };
    let mut angle = 0.0;
    slices
        .iter()
        .map(|s| {
            let start = angle;
            angle += s.value.max(0.0) * k;
            Arc { start, end: angle }
        })
        .collect()
}

pub fn render(slices: &[Slice]) -> Element {
    let radius = SIZE / 2.0;
    let color = OrdinalScale::new(slices.iter().map(|s| s.category.clone()), CATEGORY10);

    let mut chart = Element::new("g").attr("transform", translate(SIZE / 2.0, SIZE / 2.0));
    for (slice, arc) in slices.iter().zip(layout(slices)) {
        let fill = color.map(&slice.category).unwrap_or(CATEGORY10[0]);
        let collapsed = Arc { start: 0.0, end: 0.0 }.path(radius);
        let centroid = arc.centroid(radius);
        chart.push(
            Element::new("g")
                .attr("class", "pie-arc")
                .child(
                    Element::new("path")
                        .attr("d", arc.path(radius))
                        .attr("fill", fill)
                        .attr("stroke", "white")
                        .attr("style", "stroke-width: 2px")
                        .child(
                            Element::new("animate")
                                .attr("attributeName", "d")
                                .attr("from", collapsed)
                                .attr("to", arc.path(radius))
                                .attr("dur", format!("{}ms", SWEEP_MS))
                                .attr("fill", "freeze"),
                        ),
                )
                .child(
                    Element::new("text")
                        .attr("transform", translate(centroid.x, centroid.y))
                        .attr("text-anchor", "middle")
                        .attr("style", "fill: white; font-size: 14px; pointer-events: none")
                        .text(format!("{}%", num(slice.value))),
                ),
        );
    }

    for (i, slice) in slices.iter().enumerate() {
        let fill = color.map(&slice.category).unwrap_or(CATEGORY10[0]);
        chart.push(
            Element::new("g")
                .attr("class", "pie-legend")
                .attr("transform", translate(radius + 20.0, i as f64 * 25.0 - radius + 50.0))
                .child(
                    Element::new("rect")
                        .attr("width", 18)
                        .attr("height", 18)
                        .attr("style", format!("fill: {}", fill)),
                )
                .child(
                    Element::new("text")
                        .attr("x", 24)
                        .attr("y", 9)
                        .attr("dy", ".35em")
                        .attr("style", "text-anchor: start")
                        .text(&slice.category),
                ),
        );
    }

    svg_root(SIZE + LEGEND_SPACE, SIZE, "xMinYMin meet").child(chart)
}
