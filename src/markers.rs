use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

pub type MarkerId = u64;

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub id: MarkerId,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip)]
    pub created: Instant,
}

impl Marker {
    // Visible iff created within `(now - lifespan, now]`.
    pub fn is_alive(&self, now: Instant, lifespan: Duration) -> bool {
        self.created <= now && now.duration_since(self.created) < lifespan
    }
}

// Classification of markers relative to the previous render.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
    pub entering: Vec<Marker>,
    pub persisting: Vec<Marker>,
    pub exiting: Vec<Marker>,
}

pub struct MarkerManager {
    active: Vec<Marker>,
    rendered: Vec<Marker>,
    next_id: MarkerId,
    lifespan: Duration,
    rng: StdRng,
}

impl MarkerManager {
    pub fn new(lifespan: Duration) -> Self {
        Self::with_rng(lifespan, StdRng::from_entropy())
    }

    pub fn with_rng(lifespan: Duration, rng: StdRng) -> Self {
        Self {
            active: Vec::new(),
            rendered: Vec::new(),
            next_id: 0,
            lifespan,
            rng,
        }
    }

    pub fn lifespan(&self) -> Duration {
        self.lifespan
    }

    pub fn active(&self) -> &[Marker] {
        &self.active
    }

    // Adds a marker at a random position. Latitudes stop at ±85° where
    // Mercator distortion blows up; the point may land in the sea.
    pub fn spawn(&mut self, now: Instant) -> MarkerId {
        let lat = self.rng.gen_range(-85.0..85.0);
        let lon = self.rng.gen_range(-180.0..180.0);
        self.spawn_at(now, lat, lon)
    }

    pub fn spawn_at(&mut self, now: Instant, lat: f64, lon: f64) -> MarkerId {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(Marker { id, lat, lon, created: now });
        id
    }

    // Markers alive at `now`, without evicting anything.
    pub fn active_at(&self, now: Instant) -> Vec<&Marker> {
        self.active
            .iter()
            .filter(|m| m.is_alive(now, self.lifespan))
            .collect()
    }

    // Evicts expired markers and diffs the survivors against the last render.
    pub fn reconcile(&mut self, now: Instant) -> Reconciliation {
        let lifespan = self.lifespan;
        self.active.retain(|m| m.is_alive(now, lifespan));

        let previous: HashSet<MarkerId> = self.rendered.iter().map(|m| m.id).collect();
        let current: HashSet<MarkerId> = self.active.iter().map(|m| m.id).collect();

        let (persisting, entering): (Vec<Marker>, Vec<Marker>) = self
            .active
            .iter()
            .cloned()
            .partition(|m| previous.contains(&m.id));
        let exiting = self
            .rendered
            .iter()
            .filter(|m| !current.contains(&m.id))
            .cloned()
            .collect();

        self.rendered = self.active.clone();
        Reconciliation { entering, persisting, exiting }
    }

    // One interval: spawn a marker, then reconcile.
    pub fn tick(&mut self, now: Instant) -> Reconciliation {
        self.spawn(now);
        self.reconcile(now)
    }
}
