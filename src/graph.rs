use crate::data::{GraphNode, SkillGraph};
use crate::error::VizError;
use crate::force::{SimNode, Simulation};
use crate::svg::{num, svg_root, translate, Element};
use crate::types::{Margin, Point, Responsive, Viewport};
use serde::Deserialize;
use tracing::warn;

pub const CONTAINER: &str = "vis-graphdata";

const MARGIN: Margin = Margin::new(10.0, 10.0, 10.0, 10.0);
const LINK_DISTANCE: f64 = 150.0;
const CHARGE: f64 = -400.0;
const COLLIDE_PADDING: f64 = 15.0;
const SETTLE_TICKS: usize = 300;
const DRAG_TICKS: usize = 30;
const REHEAT_ALPHA: f64 = 0.3;

const LINK_STROKE: &str = "#999";
const LINK_WIDTH: &str = "2px";
const HIGHLIGHT_STROKE: &str = "rgb(0,0,0)";
const HIGHLIGHT_WIDTH: &str = "4px";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphEvent {
    Hover(String),
    Unhover,
    DragStart(String),
    Drag { id: String, x: f64, y: f64 },
    DragEnd(String),
}

pub struct GraphView {
    nodes: Vec<GraphNode>,
    simulation: Simulation,
    viewport: Viewport,
    highlighted: Option<usize>,
}

pub fn node_radius(node: &GraphNode) -> f64 {
    if node.group == 1 {
        60.0
    } else {
        30.0
    }
}

fn node_stroke(node: &GraphNode) -> &'static str {
    if node.group == 1 {
        "rgb(50, 50, 50)"
    } else {
        "rgb(80, 80, 80)"
    }
}

impl GraphView {
    pub fn new(graph: &SkillGraph, viewport: Viewport) -> Self {
        let mut links = Vec::new();
        for link in &graph.links {
            let source = graph.nodes.iter().position(|n| n.id == link.source);
            let target = graph.nodes.iter().position(|n| n.id == link.target);
            match (source, target) {
                (Some(s), Some(t)) => links.push((s, t)),
                _ => warn!("Skipping link {} -> {}: unknown node", link.source, link.target),
            }
        }

        let (width, height) = drawing_size(viewport);
        let radii = graph
            .nodes
            .iter()
            .map(|n| node_radius(n) + COLLIDE_PADDING)
            .collect();
        let simulation = Simulation::new(graph.nodes.len(), links)
            .with_link_distance(LINK_DISTANCE)
            .with_charge(CHARGE)
            .with_center(width / 2.0, height / 2.0)
            .with_collide(radii);

        let mut view = Self {
            nodes: graph.nodes.clone(),
            simulation,
            viewport,
            highlighted: None,
        };
        view.settle(SETTLE_TICKS);
        view
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        let index = self.index_of(id).ok()?;
        let node = self.simulation.nodes()[index];
        Some(Point::new(node.x, node.y))
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.map(|i| self.nodes[i].id.as_str())
    }

    pub fn handle(&mut self, event: GraphEvent) -> Result<(), VizError> {
        match event {
            GraphEvent::Hover(id) => {
                self.highlighted = Some(self.index_of(&id)?);
            }
            GraphEvent::Unhover => {
                self.highlighted = None;
            }
            GraphEvent::DragStart(id) => {
                let index = self.index_of(&id)?;
                let node = self.simulation.nodes()[index];
                self.simulation.set_alpha_target(REHEAT_ALPHA);
                self.simulation.pin(index, node.x, node.y);
            }
            GraphEvent::Drag { id, x, y } => {
                let index = self.index_of(&id)?;
                let (cx, cy) = self.clamp(index, x, y);
                self.simulation.pin(index, cx, cy);
                self.step(DRAG_TICKS);
            }
            GraphEvent::DragEnd(id) => {
                let index = self.index_of(&id)?;
                self.simulation.set_alpha_target(0.0);
                self.simulation.unpin(index);
                self.settle(SETTLE_TICKS);
            }
        }
        Ok(())
    }

    fn index_of(&self, id: &str) -> Result<usize, VizError> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| VizError::UnknownNode(id.to_string()))
    }

    fn clamp(&self, index: usize, x: f64, y: f64) -> (f64, f64) {
        let r = node_radius(&self.nodes[index]);
        let (width, height) = drawing_size(self.viewport);
        (clamp_axis(x, r, width), clamp_axis(y, r, height))
    }

    fn settle(&mut self, max_ticks: usize) {
        let radii: Vec<f64> = self.nodes.iter().map(node_radius).collect();
        let (width, height) = drawing_size(self.viewport);
        self.simulation
            .run(max_ticks, |nodes| clamp_nodes(nodes, &radii, width, height));
    }

    fn step(&mut self, ticks: usize) {
        let radii: Vec<f64> = self.nodes.iter().map(node_radius).collect();
        let (width, height) = drawing_size(self.viewport);
        for _ in 0..ticks {
            self.simulation.tick();
            clamp_nodes(self.simulation.nodes_mut(), &radii, width, height);
        }
    }

    pub fn render(&self) -> Element {
        let positions = self.simulation.nodes();
        let incident = |s: usize, t: usize| self.highlighted.map_or(false, |h| h == s || h == t);

        let links = Element::new("g").attr("class", "d3-graph-links-group").children(
            self.simulation.links().iter().map(|&(s, t)| {
                let (stroke, width) = if incident(s, t) {
                    (HIGHLIGHT_STROKE, HIGHLIGHT_WIDTH)
                } else {
                    (LINK_STROKE, LINK_WIDTH)
                };
                Element::new("line")
                    .attr("class", "d3-graph-link")
                    .attr("x1", num(positions[s].x))
                    .attr("y1", num(positions[s].y))
                    .attr("x2", num(positions[t].x))
                    .attr("y2", num(positions[t].y))
                    .attr("stroke", stroke)
                    .attr("stroke-width", width)
            }),
        );

        // The hovered node is drawn last so it sits above its neighbours.
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        if let Some(h) = self.highlighted {
            order.retain(|&i| i != h);
            order.push(h);
        }
        let nodes = Element::new("g")
            .attr("class", "d3-graph-nodes-group")
            .children(order.into_iter().map(|i| self.render_node(i, &positions[i])));

        svg_root(self.viewport.width, self.viewport.height, "xMidYMid meet").child(
            Element::new("g")
                .attr("transform", translate(MARGIN.left, MARGIN.top))
                .child(links)
                .child(nodes),
        )
    }

    fn render_node(&self, index: usize, position: &SimNode) -> Element {
        let node = &self.nodes[index];
        let radius = node_radius(node);
        let mut group = Element::new("g")
            .attr("class", "d3-graph-node")
            .attr("data-id", &node.id)
            .attr("transform", translate(position.x, position.y))
            .child(
                Element::new("circle")
                    .attr("r", radius)
                    .attr("fill", &node.color)
                    .attr("stroke", node_stroke(node)),
            );
        let layout = label_layout(&node.label, radius);
        for (line, y) in layout.lines {
            group.push(
                Element::new("text")
                    .attr("y", num(y))
                    .attr("font-size", format!("{}px", num(layout.font_size)))
                    .text(line),
            );
        }
        group
    }
}

impl Responsive for GraphView {
    fn resize(&mut self, viewport: Viewport) -> bool {
        let (width, height) = drawing_size(viewport);
        if !viewport.is_renderable() || width <= 0.0 || height <= 0.0 {
            return false;
        }
        self.viewport = viewport;
        self.simulation.set_center(width / 2.0, height / 2.0);
        self.simulation.set_alpha(REHEAT_ALPHA);
        self.settle(SETTLE_TICKS);
        true
    }
}

fn drawing_size(viewport: Viewport) -> (f64, f64) {
    (
        viewport.width - MARGIN.horizontal(),
        viewport.height - MARGIN.vertical(),
    )
}

fn clamp_axis(value: f64, radius: f64, extent: f64) -> f64 {
    value.min(extent - radius).max(radius)
}

fn clamp_nodes(nodes: &mut [SimNode], radii: &[f64], width: f64, height: f64) {
    for (node, &r) in nodes.iter_mut().zip(radii) {
        node.x = clamp_axis(node.x, r, width);
        node.y = clamp_axis(node.y, r, height);
    }
}

struct LabelLayout<'a> {
    font_size: f64,
    lines: Vec<(&'a str, f64)>,
}

fn label_layout(label: &str, radius: f64) -> LabelLayout<'_> {
    let lines: Vec<&str> = label.split('\n').collect();
    let factor = if lines.len() > 1 { 0.3 } else { 0.4 };
    let font_size = (radius * factor).clamp(12.0, 30.0);
    let line_height = font_size * 1.2;
    let start = -(lines.len() as f64 * line_height) / 2.0 + line_height / 2.0;
    LabelLayout {
        font_size,
        lines: lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| (line, start + i as f64 * line_height))
            .collect(),
    }
}
