use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

const INITIAL_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimNode {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

#[derive(Debug, Clone)]
struct LinkForce {
    distance: f64,
    strengths: Vec<f64>,
    biases: Vec<f64>,
}

pub struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<(usize, usize)>,
    link: Option<LinkForce>,
    charge: Option<f64>,
    center: Option<(f64, f64)>,
    collide: Option<Vec<f64>>,
    alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    alpha_target: f64,
    velocity_decay: f64,
    rng: StdRng,
}

impl Simulation {
    // Nodes start on a phyllotaxis spiral around the origin so the layout is
    // deterministic for a given input.
    pub fn new(node_count: usize, links: Vec<(usize, usize)>) -> Self {
        let angle = PI * (3.0 - 5f64.sqrt());
        let nodes = (0..node_count)
            .map(|i| {
                let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                let theta = i as f64 * angle;
                SimNode {
                    x: radius * theta.cos(),
                    y: radius * theta.sin(),
                    vx: 0.0,
                    vy: 0.0,
                    fx: None,
                    fy: None,
                }
            })
            .collect();
        let alpha_min = 0.001;
        Self {
            nodes,
            links: links
                .into_iter()
                .filter(|&(s, t)| s < node_count && t < node_count)
                .collect(),
            link: None,
            charge: None,
            center: None,
            collide: None,
            alpha: 1.0,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            alpha_target: 0.0,
            velocity_decay: 0.6,
            rng: StdRng::seed_from_u64(0x5eed),
        }
    }

    // Springs along every link with the given rest length. Each link's
    // stiffness falls with the degree of its busier endpoint.
    pub fn with_link_distance(mut self, distance: f64) -> Self {
        let mut degree = vec![0usize; self.nodes.len()];
        for &(s, t) in &self.links {
            degree[s] += 1;
            degree[t] += 1;
        }
        let strengths = self
            .links
            .iter()
            .map(|&(s, t)| 1.0 / degree[s].min(degree[t]).max(1) as f64)
            .collect();
        let biases = self
            .links
            .iter()
            .map(|&(s, t)| degree[s] as f64 / (degree[s] + degree[t]) as f64)
            .collect();
        self.link = Some(LinkForce { distance, strengths, biases });
        self
    }

    // Pairwise charge; negative strength pushes nodes apart.
    pub fn with_charge(mut self, strength: f64) -> Self {
        self.charge = Some(strength);
        self
    }

    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = Some((x, y));
        self
    }

    // Keeps node `i` at least `radii[i] + radii[j]` from node `j`.
    pub fn with_collide(mut self, radii: Vec<f64>) -> Self {
        self.collide = Some(radii);
        self
    }

    pub fn set_center(&mut self, x: f64, y: f64) {
        self.center = Some((x, y));
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [SimNode] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target;
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.alpha_min
    }

    pub fn pin(&mut self, index: usize, x: f64, y: f64) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.fx = Some(x);
            node.fy = Some(y);
        }
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.fx = None;
            node.fy = None;
        }
    }

    // Runs until the simulation cools or `max_ticks` is reached, handing the
    // node positions to `on_tick` after every step.
    pub fn run<F>(&mut self, max_ticks: usize, mut on_tick: F) -> usize
    where
        F: FnMut(&mut [SimNode]),
    {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_settled() {
            self.tick();
            on_tick(&mut self.nodes);
            ticks += 1;
        }
        ticks
    }

    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        self.apply_links(alpha);
        self.apply_charge(alpha);
        self.apply_center();
        self.apply_collide();

        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= self.velocity_decay;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= self.velocity_decay;
                    node.y += node.vy;
                }
            }
        }
    }

    fn jiggle(&mut self) -> f64 {
        (self.rng.gen::<f64>() - 0.5) * 1e-6
    }

    fn apply_links(&mut self, alpha: f64) {
        let link = match self.link.clone() {
            Some(link) => link,
            None => return,
        };
        for (i, &(s, t)) in self.links.clone().iter().enumerate() {
            let (source, target) = (self.nodes[s], self.nodes[t]);
            let mut x = target.x + target.vx - source.x - source.vx;
            let mut y = target.y + target.vy - source.y - source.vy;
            if x == 0.0 {
                x = self.jiggle();
            }
            if y == 0.0 {
                y = self.jiggle();
            }
            let l = (x * x + y * y).sqrt();
            let k = (l - link.distance) / l * alpha * link.strengths[i];
            x *= k;
            y *= k;
            let b = link.biases[i];
            self.nodes[t].vx -= x * b;
            self.nodes[t].vy -= y * b;
            self.nodes[s].vx += x * (1.0 - b);
            self.nodes[s].vy += y * (1.0 - b);
        }
    }

    fn apply_charge(&mut self, alpha: f64) {
        let strength = match self.charge {
            Some(strength) => strength,
            None => return,
        };
        let n = self.nodes.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = self.nodes[j].x - self.nodes[i].x;
                let mut y = self.nodes[j].y - self.nodes[i].y;
                if x == 0.0 {
                    x = self.jiggle();
                }
                if y == 0.0 {
                    y = self.jiggle();
                }
                let mut l = x * x + y * y;
                if l < 1.0 {
                    l = l.sqrt();
                }
                let w = strength * alpha / l;
                self.nodes[i].vx += x * w;
                self.nodes[i].vy += y * w;
            }
        }
    }

    fn apply_center(&mut self) {
        let (cx, cy) = match self.center {
            Some(center) => center,
            None => return,
        };
        if self.nodes.is_empty() {
            return;
        }
        let n = self.nodes.len() as f64;
        let sx = self.nodes.iter().map(|node| node.x).sum::<f64>() / n - cx;
        let sy = self.nodes.iter().map(|node| node.y).sum::<f64>() / n - cy;
        for node in &mut self.nodes {
            node.x -= sx;
            node.y -= sy;
        }
    }

    fn apply_collide(&mut self) {
        let radii = match self.collide.clone() {
            Some(radii) => radii,
            None => return,
        };
        let n = self.nodes.len().min(radii.len());
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (self.nodes[i], self.nodes[j]);
                let r = radii[i] + radii[j];
                let mut x = (a.x + a.vx) - (b.x + b.vx);
                let mut y = (a.y + a.vy) - (b.y + b.vy);
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.jiggle();
                    l += y * y;
                }
                let l_root = l.sqrt();
                let k = (r - l_root) / l_root;
                x *= k;
                y *= k;
                let (ri2, rj2) = (radii[i] * radii[i], radii[j] * radii[j]);
                let share = rj2 / (ri2 + rj2);
                self.nodes[i].vx += x * share;
                self.nodes[i].vy += y * share;
                self.nodes[j].vx -= x * (1.0 - share);
                self.nodes[j].vy -= y * (1.0 - share);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: &SimNode, b: &SimNode) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn alpha_cools_to_settled_in_about_300_ticks() {
        let mut sim = Simulation::new(3, vec![(0, 1)]).with_link_distance(50.0);
        let ticks = sim.run(1000, |_| {});
        assert!(sim.is_settled());
        assert!((295..=305).contains(&ticks), "{}", ticks);
    }

    #[test]
    fn link_pulls_towards_rest_length() {
        let mut sim = Simulation::new(2, vec![(0, 1)]).with_link_distance(100.0);
        sim.run(300, |_| {});
        let d = distance(&sim.nodes()[0], &sim.nodes()[1]);
        assert!((d - 100.0).abs() < 5.0, "{}", d);
    }

    #[test]
    fn charge_pushes_nodes_apart() {
        let mut sim = Simulation::new(2, vec![]).with_charge(-400.0);
        let before = distance(&sim.nodes()[0], &sim.nodes()[1]);
        sim.run(50, |_| {});
        assert!(distance(&sim.nodes()[0], &sim.nodes()[1]) > before);
    }

    #[test]
    fn center_moves_the_mean() {
        let mut sim = Simulation::new(5, vec![]).with_center(200.0, 100.0);
        sim.tick();
        let n = sim.nodes().len() as f64;
        let mx = sim.nodes().iter().map(|p| p.x).sum::<f64>() / n;
        let my = sim.nodes().iter().map(|p| p.y).sum::<f64>() / n;
        assert!((mx - 200.0).abs() < 1e-9);
        assert!((my - 100.0).abs() < 1e-9);
    }

    #[test]
    fn collide_separates_overlapping_nodes() {
        let mut sim = Simulation::new(2, vec![]).with_collide(vec![30.0, 30.0]);
        sim.run(300, |_| {});
        assert!(distance(&sim.nodes()[0], &sim.nodes()[1]) > 55.0);
    }

    #[test]
    fn pinned_node_stays_put() {
        let mut sim = Simulation::new(3, vec![(0, 1), (1, 2)])
            .with_link_distance(50.0)
            .with_charge(-100.0);
        sim.pin(1, 42.0, 24.0);
        sim.run(100, |_| {});
        assert_eq!((sim.nodes()[1].x, sim.nodes()[1].y), (42.0, 24.0));
        sim.unpin(1);
        assert_eq!(sim.nodes()[1].fx, None);
    }

    #[test]
    fn callback_sees_every_tick() {
        let mut sim = Simulation::new(2, vec![(0, 1)]).with_link_distance(10.0);
        let mut seen = 0;
        let ticks = sim.run(25, |nodes| {
            seen += 1;
            assert_eq!(nodes.len(), 2);
        });
        assert_eq!((ticks, seen), (25, 25));
    }

    #[test]
    fn out_of_range_links_are_dropped() {
        let sim = Simulation::new(2, vec![(0, 1), (0, 5)]);
        assert_eq!(sim.links(), &[(0, 1)]);
    }
}
