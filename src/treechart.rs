use crate::data::TreeNode;
use crate::scale::OrdinalScale;
use crate::svg::{num, svg_root, translate, Element};
use crate::types::Margin;

pub const CONTAINER: &str = "vis-treechart";

const MARGIN: Margin = Margin::new(30.0, 120.0, 30.0, 120.0);
const WIDTH: f64 = 1000.0 - 120.0 - 120.0;
const HEIGHT: f64 = 500.0 - 30.0 - 30.0;
const DEPTH_FACTOR: f64 = 0.4;
const DEPTH_COLORS: [&str; 5] = ["#9467bd", "#1f77b4", "#2ca02c", "#ff7f0e", "#d62728"];
const NODE_RADIUS: f64 = 6.0;
const LABEL_OFFSET: f64 = 13.0;
const WRAP_WIDTH: f64 = 200.0;
// Average glyph advance of the label font, used to estimate line width.
const CHAR_WIDTH: f64 = 6.5;
const LINE_HEIGHT_EM: f64 = 1.1;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub name: String,
    pub depth: usize,
    pub parent: Option<usize>,
    pub leaf: bool,
    // Breadth position, across `[0, HEIGHT]`.
    pub x: f64,
    // Depth position, across `[0, WIDTH]` before compression.
    pub y: f64,
}

// Working state of the Buchheim walk for one node.
#[derive(Debug, Clone)]
struct Walk {
    parent: usize,
    children: Vec<usize>,
    index: usize,
    prelim: f64,
    modifier: f64,
    change: f64,
    shift: f64,
    thread: Option<usize>,
    ancestor: usize,
    default_ancestor: Option<usize>,
}

struct TidyLayout {
    // Slot 0 is a synthetic parent of the root.
    walk: Vec<Walk>,
}

impl TidyLayout {
    fn new(parents: &[Option<usize>], children: &[Vec<usize>]) -> Self {
        let mut walk = vec![Walk {
            parent: 0,
            children: vec![1],
            index: 0,
            prelim: 0.0,
            modifier: 0.0,
            change: 0.0,
            shift: 0.0,
            thread: None,
            ancestor: 0,
            default_ancestor: None,
        }];
        for (n, kids) in children.iter().enumerate() {
            let parent = parents[n].map(|p| p + 1).unwrap_or(0);
            let index = if parent == 0 {
                0
            } else {
                children[parent - 1].iter().position(|&c| c == n).unwrap_or(0)
            };
            walk.push(Walk {
                parent,
                children: kids.iter().map(|c| c + 1).collect(),
                index,
                prelim: 0.0,
                modifier: 0.0,
                change: 0.0,
                shift: 0.0,
                thread: None,
                ancestor: n + 1,
                default_ancestor: None,
            });
        }
        Self { walk }
    }

    fn separation(&self, a: usize, b: usize) -> f64 {
        if self.walk[a].parent == self.walk[b].parent {
            1.0
        } else {
            2.0
        }
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.walk[v].children.first().copied().or(self.walk[v].thread)
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.walk[v].children.last().copied().or(self.walk[v].thread)
    }

    fn post_order(&self, v: usize, out: &mut Vec<usize>) {
        for &c in &self.walk[v].children {
            self.post_order(c, out);
        }
        out.push(v);
    }

    fn pre_order(&self, v: usize, out: &mut Vec<usize>) {
        out.push(v);
        for &c in &self.walk[v].children {
            self.pre_order(c, out);
        }
    }

    // Unscaled breadth coordinate per node, root-relative.
    fn run(mut self) -> Vec<f64> {
        let mut order = Vec::new();
        self.post_order(1, &mut order);
        for &v in &order {
            self.first_walk(v);
        }
        self.walk[0].modifier = -self.walk[1].prelim;

        let mut x = vec![0.0; self.walk.len()];
        order.clear();
        self.pre_order(1, &mut order);
        for &v in &order {
            let parent_mod = self.walk[self.walk[v].parent].modifier;
            x[v] = self.walk[v].prelim + parent_mod;
            self.walk[v].modifier += parent_mod;
        }
        x.remove(0);
        x
    }

    fn first_walk(&mut self, v: usize) {
        let parent = self.walk[v].parent;
        let left_sibling = match self.walk[v].index {
            0 => None,
            i => Some(self.walk[parent].children[i - 1]),
        };
        let children = self.walk[v].children.clone();
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            self.execute_shifts(v);
            let midpoint = (self.walk[first].prelim + self.walk[last].prelim) / 2.0;
            match left_sibling {
                Some(w) => {
                    self.walk[v].prelim = self.walk[w].prelim + self.separation(v, w);
                    self.walk[v].modifier = self.walk[v].prelim - midpoint;
                }
                None => self.walk[v].prelim = midpoint,
            }
        } else if let Some(w) = left_sibling {
            self.walk[v].prelim = self.walk[w].prelim + self.separation(v, w);
        }
        let fallback = self.walk[parent].children[0];
        let ancestor = self.walk[parent].default_ancestor.unwrap_or(fallback);
        let ancestor = self.apportion(v, left_sibling, ancestor);
        self.walk[parent].default_ancestor = Some(ancestor);
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for &w in self.walk[v].children.clone().iter().rev() {
            let node = &mut self.walk[w];
            node.prelim += shift;
            node.modifier += shift;
            change += node.change;
            shift += node.shift + change;
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let change = shift / (self.walk[wp].index as f64 - self.walk[wm].index as f64);
        self.walk[wp].change -= change;
        self.walk[wp].shift += shift;
        self.walk[wm].change += change;
        self.walk[wp].prelim += shift;
        self.walk[wp].modifier += shift;
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.walk[vim].ancestor;
        if self.walk[candidate].parent == self.walk[v].parent {
            candidate
        } else {
            ancestor
        }
    }

    fn apportion(&mut self, v: usize, left_sibling: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = left_sibling else {
            return ancestor;
        };
        let mut vop = v;
        let mut vom = self.walk[self.walk[v].parent].children[0];
        let mut sip = self.walk[v].modifier;
        let mut sop = self.walk[v].modifier;
        let mut sim = self.walk[w].modifier;
        let mut som = self.walk[vom].modifier;

        let mut inner_left = self.next_right(w);
        let mut inner_right = self.next_left(v);
        while let (Some(vim), Some(vip)) = (inner_left, inner_right) {
            let (Some(om), Some(op)) = (self.next_left(vom), self.next_right(vop)) else {
                break;
            };
            vom = om;
            vop = op;
            self.walk[vop].ancestor = v;
            let shift = self.walk[vim].prelim + sim - self.walk[vip].prelim - sip
                + self.separation(vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.walk[vim].modifier;
            sip += self.walk[vip].modifier;
            som += self.walk[vom].modifier;
            sop += self.walk[vop].modifier;
            inner_left = self.next_right(vim);
            inner_right = self.next_left(vip);
        }
        if let Some(vim) = inner_left {
            if self.next_right(vop).is_none() {
                self.walk[vop].thread = Some(vim);
                self.walk[vop].modifier += sim - sop;
            }
        }
        if let Some(vip) = inner_right {
            if self.next_left(vom).is_none() {
                self.walk[vom].thread = Some(vip);
                self.walk[vom].modifier += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }
}

// Lays the tree out over `breadth × depth`, leftmost and rightmost nodes
// inset by half their separation.
pub fn layout(root: &TreeNode, breadth: f64, depth: f64) -> Vec<PlacedNode> {
    let mut nodes = Vec::new();
    let mut children: Vec<Vec<usize>> = Vec::new();
    flatten(root, None, 0, &mut nodes, &mut children);

    let parents: Vec<Option<usize>> = nodes.iter().map(|n| n.parent).collect();
    let xs = TidyLayout::new(&parents, &children).run();

    let separation = |a: usize, b: usize| if parents[a] == parents[b] { 1.0 } else { 2.0 };
    let by_x = |cmp: fn(f64, f64) -> bool| {
        (0..xs.len()).fold(0, |best, i| if cmp(xs[i], xs[best]) { i } else { best })
    };
    let left = by_x(|a, b| a < b);
    let right = by_x(|a, b| a > b);
    let bottom = nodes.iter().map(|n| n.depth).max().unwrap_or(0);

    let s = if left == right { 1.0 } else { separation(left, right) / 2.0 };
    let tx = s - xs[left];
    let kx = breadth / (xs[right] + s + tx);
    let ky = depth / bottom.max(1) as f64;
    for (node, x) in nodes.iter_mut().zip(xs) {
        node.x = (x + tx) * kx;
        node.y = node.depth as f64 * ky;
    }
    nodes
}

fn flatten(
    node: &TreeNode,
    parent: Option<usize>,
    depth: usize,
    nodes: &mut Vec<PlacedNode>,
    children: &mut Vec<Vec<usize>>,
) {
    let id = nodes.len();
    nodes.push(PlacedNode {
        name: node.name.clone(),
        depth,
        parent,
        leaf: node.children.is_empty(),
        x: 0.0,
        y: 0.0,
    });
    children.push(Vec::new());
    if let Some(p) = parent {
        children[p].push(id);
    }
    for child in &node.children {
        flatten(child, Some(id), depth + 1, nodes, children);
    }
}

// Greedy word wrap by estimated text width. A single over-long word keeps
// its own line.
pub fn wrap_words(text: &str, max_width: f64) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if !line.is_empty() && candidate.chars().count() as f64 * CHAR_WIDTH > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[derive(Debug, Clone)]
pub struct TreeChart {
    nodes: Vec<PlacedNode>,
    color: OrdinalScale,
}

impl TreeChart {
    pub fn new(root: &TreeNode) -> Self {
        Self {
            nodes: layout(root, HEIGHT, WIDTH),
            color: OrdinalScale::new((0..DEPTH_COLORS.len()).map(|d| d.to_string()), DEPTH_COLORS),
        }
    }

    pub fn nodes(&self) -> &[PlacedNode] {
        &self.nodes
    }

    fn depth_color(&self, depth: usize) -> &str {
        self.color.nth(depth).unwrap_or(DEPTH_COLORS[0])
    }

    pub fn render(&self) -> Element {
        let screen = |n: &PlacedNode| (n.y * DEPTH_FACTOR, n.x);
        let mut chart = Element::new("g").attr("transform", translate(MARGIN.left, MARGIN.top));

        for node in &self.nodes {
            let Some(parent) = node.parent.map(|p| &self.nodes[p]) else {
                continue;
            };
            let (x0, y0) = screen(parent);
            let (x1, y1) = screen(node);
            let mid = (x0 + x1) / 2.0;
            chart.push(
                Element::new("path")
                    .attr("class", "link")
                    .attr("style", format!("stroke: {}", self.depth_color(parent.depth)))
                    .attr(
                        "d",
                        format!(
                            "M{},{}C{},{},{},{},{},{}",
                            num(x0),
                            num(y0),
                            num(mid),
                            num(y0),
                            num(mid),
                            num(y1),
                            num(x1),
                            num(y1)
                        ),
                    ),
            );
        }

        for node in &self.nodes {
            let (x, y) = screen(node);
            let (kind, label_x, anchor) = if node.leaf {
                ("node--leaf", LABEL_OFFSET, "start")
            } else {
                ("node--internal", -LABEL_OFFSET, "end")
            };
            let mut text = Element::new("text")
                .attr("dy", ".35em")
                .attr("x", label_x)
                .attr("style", format!("text-anchor: {}", anchor));
            for (i, line) in wrap_words(&node.name, WRAP_WIDTH).into_iter().enumerate() {
                text.push(
                    Element::new("tspan")
                        .attr("x", label_x)
                        .attr("y", 0)
                        .attr("dy", format!("{}em", num(i as f64 * LINE_HEIGHT_EM + 0.35)))
                        .text(line),
                );
            }
            chart.push(
                Element::new("g")
                    .attr("class", format!("node level-{} {}", node.depth, kind))
                    .attr("transform", translate(x, y))
                    .child(
                        Element::new("circle")
                            .attr("r", NODE_RADIUS)
                            .attr("style", format!("fill: {}", self.depth_color(node.depth))),
                    )
                    .child(text),
            );
        }

        svg_root(WIDTH + MARGIN.horizontal(), HEIGHT + MARGIN.vertical(), "xMinYMin meet")
            .child(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Portfolio;

    fn leaf(name: &str) -> TreeNode {
        TreeNode { name: name.to_string(), children: Vec::new() }
    }

    fn branch(name: &str, children: Vec<TreeNode>) -> TreeNode {
        TreeNode { name: name.to_string(), children }
    }

    #[test]
    fn single_node_sits_in_the_middle() {
        let nodes = layout(&leaf("only"), 100.0, 50.0);
        assert_eq!(nodes[0].x, 50.0);
        assert_eq!(nodes[0].y, 0.0);
    }

    #[test]
    fn siblings_are_evenly_spaced_and_parent_centred() {
        let tree = branch("root", vec![leaf("a"), leaf("b"), leaf("c")]);
        let nodes = layout(&tree, 400.0, 100.0);
        // Two units between the outer leaves plus a half unit inset each side.
        let unit = 400.0 / 3.0;
        let expected = [1.5 * unit, 0.5 * unit, 1.5 * unit, 2.5 * unit];
        for (node, x) in nodes.iter().zip(expected) {
            assert!((node.x - x).abs() < 1e-9, "{} at {}", node.name, node.x);
        }
        assert!(nodes[1..].iter().all(|n| n.y == 100.0));
    }

    #[test]
    fn cousins_get_double_separation() {
        let nodes = layout(&Portfolio::default().skill_tree, HEIGHT, WIDTH);
        let leaves: Vec<&PlacedNode> = nodes.iter().filter(|n| n.leaf).collect();
        assert_eq!(leaves.len(), 10);
        let unit = HEIGHT / 14.0;
        let expected = [1.0, 2.0, 3.0, 5.0, 6.0, 7.0, 9.0, 10.0, 12.0, 13.0];
        for (leaf, slot) in leaves.iter().zip(expected) {
            assert!((leaf.x - slot * unit).abs() < 1e-9, "{} at {}", leaf.name, leaf.x);
            assert_eq!(leaf.y, WIDTH);
        }
        assert!((nodes[0].x - 7.25 * unit).abs() < 1e-9);
        assert!((nodes[1].x - 2.0 * unit).abs() < 1e-9);
    }

    #[test]
    fn deeper_subtrees_do_not_overlap() {
        let tree = branch(
            "root",
            vec![
                branch("a", vec![branch("a1", vec![leaf("x"), leaf("y")])]),
                leaf("b"),
                branch("c", vec![branch("c1", vec![leaf("z"), leaf("w")])]),
            ],
        );
        let nodes = layout(&tree, 100.0, 30.0);
        let by_name = |name: &str| nodes.iter().find(|n| n.name == name).unwrap().x;
        assert!(by_name("y") < by_name("z"));
        assert!(by_name("a") < by_name("b") && by_name("b") < by_name("c"));
        assert!(by_name("x") >= 0.0 && by_name("w") <= 100.0);
    }

    #[test]
    fn wrap_breaks_on_estimated_width() {
        let lines = wrap_words("Once designed the cover for the Korean magazine WEHONG", 200.0);
        assert_eq!(lines, ["Once designed the cover for", "the Korean magazine WEHONG"]);
        assert_eq!(wrap_words("Writing", 200.0), ["Writing"]);
        assert_eq!(wrap_words("", 200.0), Vec::<String>::new());
    }

    #[test]
    fn renders_links_nodes_and_labels() {
        let chart = TreeChart::new(&Portfolio::default().skill_tree);
        let svg = chart.render();
        assert_eq!(svg.find_by_class("link").len(), 14);
        assert_eq!(svg.find_by_class("node--internal").len(), 5);
        assert_eq!(svg.find_by_class("node--leaf").len(), 10);

        let root = svg.find_by_class("level-0")[0];
        assert!(root.render().contains("text-anchor: end"));
        assert!(root.render().contains("fill: #9467bd"));

        let leaf = svg.find_by_class("level-2")[0];
        assert!(leaf.render().contains("<tspan x=\"13\" y=\"0\" dy=\"0.35em\">"));
        let links = svg.find_by_class("link");
        assert_eq!(links[0].get_attr("style"), Some("stroke: #9467bd"));
        assert!(links[0].get_attr("d").unwrap().starts_with("M0,"));
    }
}
