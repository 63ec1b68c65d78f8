use crate::data::CreativeWork;
use crate::scale::{BandScale, LinearScale, OrdinalScale, SqrtScale, CATEGORY10};
use crate::svg::{num, svg_root, translate, Element};
use crate::types::{Margin, Responsive, Viewport};
use tracing::warn;

pub const CONTAINER: &str = "vis-scatterplot";

const MARGIN: Margin = Margin::new(30.0, 75.0, 65.0, 80.0);
const PLOT_WIDTH: f64 = 550.0;
const PLOT_HEIGHT: f64 = 450.0 - 30.0 - 65.0;
const FIRST_YEAR: i32 = 2020;
const LAST_YEAR: i32 = 2025;
const MIN_YEAR: i32 = 2021;
const INITIAL_ORDER: [&str; 3] = ["games", "paintings", "videos"];
const COLOR_ORDER: [&str; 3] = ["paintings", "videos", "games"];
const TRANSITION_MS: u64 = 750;
const LEGEND_WIDTH: f64 = 80.0;

const STROKE: (&str, f64) = ("#666", 1.5);
const STROKE_HOVER: (&str, f64) = ("darkred", 3.0);

#[derive(Debug, Clone, PartialEq)]
pub enum ScatterEvent {
    SortAscending,
    SortDescending,
    Hover(usize),
    Unhover,
}

#[derive(Debug, Clone)]
pub struct ScatterPlot {
    works: Vec<CreativeWork>,
    totals: Vec<(String, u32)>,
    x: LinearScale,
    y: BandScale,
    r: SqrtScale,
    color: OrdinalScale,
    previous_order: Option<Vec<String>>,
    hovered: Option<usize>,
}

impl ScatterPlot {
    pub fn new(works: &[CreativeWork]) -> Self {
        let works: Vec<CreativeWork> = works.iter().filter(|w| w.year >= MIN_YEAR).cloned().collect();

        let mut totals: Vec<(String, u32)> = Vec::new();
        for work in &works {
            match totals.iter_mut().find(|(kind, _)| *kind == work.kind) {
                Some(entry) => entry.1 += work.count,
                None => totals.push((work.kind.clone(), work.count)),
            }
        }

        let mut order: Vec<String> = INITIAL_ORDER
            .iter()
            .filter(|k| totals.iter().any(|(kind, _)| kind == *k))
            .map(|k| k.to_string())
            .collect();
        for (kind, _) in &totals {
            if !order.contains(kind) {
                order.push(kind.clone());
            }
        }

        let mut color_domain: Vec<String> = COLOR_ORDER.iter().map(|k| k.to_string()).collect();
        for (kind, _) in &totals {
            if !color_domain.contains(kind) {
                color_domain.push(kind.clone());
            }
        }

        let max_count = works.iter().map(|w| w.count).max().unwrap_or(0);

        Self {
            works,
            totals,
            x: LinearScale::new((FIRST_YEAR as f64, LAST_YEAR as f64), (0.0, PLOT_WIDTH)),
            y: BandScale::new(order, (PLOT_HEIGHT, 0.0)).with_padding(1.0),
            r: SqrtScale::new((0.0, max_count as f64), (2.0, 25.0)),
            color: OrdinalScale::new(color_domain, CATEGORY10),
            previous_order: None,
            hovered: None,
        }
    }

    pub fn order(&self) -> &[String] {
        self.y.domain()
    }

    pub fn works(&self) -> &[CreativeWork] {
        &self.works
    }

    pub fn total(&self, kind: &str) -> Option<u32> {
        self.totals.iter().find(|(k, _)| k == kind).map(|(_, t)| *t)
    }

    pub fn bubble_y(&self, kind: &str) -> Option<f64> {
        self.y.map(kind)
    }

    pub fn handle(&mut self, event: ScatterEvent) {
        match event {
            ScatterEvent::SortAscending => self.sort_by(|a, b| a.cmp(&b)),
            ScatterEvent::SortDescending => self.sort_by(|a, b| b.cmp(&a)),
            ScatterEvent::Hover(index) if index < self.works.len() => self.hovered = Some(index),
            ScatterEvent::Hover(index) => warn!("Ignoring hover on missing bubble {}", index),
            ScatterEvent::Unhover => self.hovered = None,
        }
    }

    fn sort_by(&mut self, cmp: impl Fn(u32, u32) -> std::cmp::Ordering) {
        let mut sorted = self.totals.clone();
        sorted.sort_by(|(_, a), (_, b)| cmp(*a, *b));
        let order: Vec<String> = sorted.into_iter().map(|(kind, _)| kind).collect();
        self.previous_order = Some(self.y.domain().to_vec());
        self.y.set_domain(order);
    }

    fn previous_y(&self, kind: &str) -> Option<f64> {
        let previous = self.previous_order.as_ref()?;
        let mut scale = self.y.clone();
        scale.set_domain(previous.clone());
        scale.map(kind)
    }

    pub fn render(&self) -> Element {
        let (_, width) = self.x.range();
        let mut chart = Element::new("g").attr("transform", translate(MARGIN.left, MARGIN.top));

        chart.push(self.x_axis(width));
        chart.push(self.y_axis());

        for (i, work) in self.works.iter().enumerate() {
            let Some(cy) = self.y.map(&work.kind) else {
                continue;
            };
            let (stroke, stroke_width) = if self.hovered == Some(i) { STROKE_HOVER } else { STROKE };
            let mut bubble = Element::new("circle")
                .attr("class", "bubble")
                .attr("cx", num(self.x.map(work.year as f64)))
                .attr("cy", num(cy))
                .attr("r", num(self.r.map(work.count as f64)))
                .attr("fill", self.color.map(&work.kind).unwrap_or(CATEGORY10[0]))
                .attr("stroke", stroke)
                .attr("stroke-width", stroke_width)
                .attr("data-index", i)
                .child(Element::new("title").text(format!(
                    "year: {}\ntype: {}\ncount: {}",
                    work.year, work.kind, work.count
                )));
            if let Some(from) = self.previous_y(&work.kind).filter(|from| *from != cy) {
                bubble.push(move_animation("cy", num(from), num(cy)));
            }
            chart.push(bubble);
        }

        chart.push(self.legend(width));

        svg_root(width + MARGIN.horizontal(), PLOT_HEIGHT + MARGIN.vertical(), "xMinYMin meet")
            .child(chart)
    }

    fn x_axis(&self, width: f64) -> Element {
        let mut axis = Element::new("g")
            .attr("class", "x axis")
            .attr("transform", translate(0.0, PLOT_HEIGHT))
            .child(
                Element::new("path")
                    .attr("class", "domain")
                    .attr("stroke", "currentColor")
                    .attr("d", format!("M0,6V0H{}V6", num(width))),
            );
        for year in FIRST_YEAR..=LAST_YEAR {
            axis.push(
                Element::new("g")
                    .attr("class", "tick")
                    .attr("transform", translate(self.x.map(year as f64), 0.0))
                    .child(Element::new("line").attr("stroke", "currentColor").attr("y2", 6))
                    .child(
                        Element::new("text")
                            .attr("fill", "currentColor")
                            .attr("y", 9)
                            .attr("dy", "0.71em")
                            .attr("text-anchor", "middle")
                            .text(year),
                    ),
            );
        }
        axis.child(
            Element::new("text")
                .attr("y", 40)
                .attr("x", num(width / 2.0))
                .attr("fill", "#000")
                .attr("style", "text-anchor: middle")
                .text("Year"),
        )
    }

    fn y_axis(&self) -> Element {
        let mut axis = Element::new("g").attr("class", "y axis").child(
            Element::new("path")
                .attr("class", "domain")
                .attr("stroke", "currentColor")
                .attr("d", format!("M-6,{}H0V0H-6", num(PLOT_HEIGHT))),
        );
        for (kind, y) in self.y.ticks() {
            let mut tick = Element::new("g")
                .attr("class", "tick")
                .attr("data-kind", kind)
                .attr("transform", translate(0.0, y))
                .child(Element::new("line").attr("stroke", "currentColor").attr("x2", -6))
                .child(
                    Element::new("text")
                        .attr("fill", "currentColor")
                        .attr("x", -9)
                        .attr("dy", "0.32em")
                        .attr("text-anchor", "end")
                        .text(kind),
                );
            if let Some(from) = self.previous_y(kind).filter(|from| *from != y) {
                tick.push(translate_animation((0.0, from), (0.0, y)));
            }
            axis.push(tick);
        }
        axis.child(
            Element::new("text")
                .attr("transform", "rotate(-90)")
                .attr("y", num(-MARGIN.left + 20.0))
                .attr("x", num(-PLOT_HEIGHT / 2.0))
                .attr("dy", "1em")
                .attr("fill", "#000")
                .attr("style", "text-anchor: middle")
                .text("Work type"),
        )
    }

    fn legend(&self, width: f64) -> Element {
        let position = |order: &[String], kind: &str| {
            order.iter().rev().position(|k| k == kind).map(|i| i as f64 * 20.0)
        };
        let mut legend = Element::new("g")
            .attr("class", "legend")
            .attr("transform", translate(width - LEGEND_WIDTH, 10.0));
        for kind in self.order().iter().rev() {
            let Some(y) = position(self.order(), kind.as_str()) else {
                continue;
            };
            let mut item = Element::new("g")
                .attr("class", "legend-item")
                .attr("transform", translate(0.0, y))
                .child(
                    Element::new("rect")
                        .attr("x", 0)
                        .attr("y", 0)
                        .attr("width", 10)
                        .attr("height", 10)
                        .attr("fill", self.color.map(kind).unwrap_or(CATEGORY10[0]))
                        .attr("stroke", "#333"),
                )
                .child(
                    Element::new("text")
                        .attr("x", 15)
                        .attr("y", 9)
                        .attr("style", "alignment-baseline: middle")
                        .text(kind),
                );
            let from = self.previous_order.as_deref().and_then(|p| position(p, kind.as_str()));
            if let Some(from) = from.filter(|from| *from != y) {
                item.push(translate_animation((0.0, from), (0.0, y)));
            }
            legend.push(item);
        }
        legend
    }
}

fn move_animation(attribute: &str, from: String, to: String) -> Element {
    Element::new("animate")
        .attr("attributeName", attribute)
        .attr("from", from)
        .attr("to", to)
        .attr("dur", format!("{}ms", TRANSITION_MS))
        .attr("fill", "freeze")
}

fn translate_animation(from: (f64, f64), to: (f64, f64)) -> Element {
    Element::new("animateTransform")
        .attr("attributeName", "transform")
        .attr("type", "translate")
        .attr("from", format!("{} {}", num(from.0), num(from.1)))
        .attr("to", format!("{} {}", num(to.0), num(to.1)))
        .attr("dur", format!("{}ms", TRANSITION_MS))
        .attr("fill", "freeze")
}

impl Responsive for ScatterPlot {
    fn resize(&mut self, viewport: Viewport) -> bool {
        let width = viewport.width - MARGIN.horizontal();
        if !viewport.is_renderable() || width <= 0.0 {
            return false;
        }
        self.x.set_range((0.0, width));
        true
    }
}
