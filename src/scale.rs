pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub fn extent<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().filter(|v| !v.is_nan()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        self.range = range;
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        // A collapsed domain maps everything to the middle of the range.
        let t = if d1 != d0 { (value - d0) / (d1 - d0) } else { 0.5 };
        r0 + t * (r1 - r0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    inner: LinearScale,
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            inner: LinearScale::new((signed_sqrt(domain.0), signed_sqrt(domain.1)), range),
        }
    }

    pub fn map(&self, value: f64) -> f64 {
        self.inner.map(signed_sqrt(value))
    }
}

fn signed_sqrt(v: f64) -> f64 {
    if v < 0.0 {
        -(-v).sqrt()
    } else {
        v.sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: Vec<String>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    positions: Vec<f64>,
    step: f64,
}

impl BandScale {
    pub fn new(domain: Vec<String>, range: (f64, f64)) -> Self {
        let mut scale = Self {
            domain,
            range,
            padding_inner: 0.0,
            padding_outer: 0.0,
            align: 0.5,
            positions: Vec::new(),
            step: 0.0,
        };
        scale.rescale();
        scale
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding_inner = padding.clamp(0.0, 1.0);
        self.padding_outer = padding.max(0.0);
        self.rescale();
        self
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn set_domain(&mut self, domain: Vec<String>) {
        self.domain = domain;
        self.rescale();
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        self.range = range;
        self.rescale();
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn bandwidth(&self) -> f64 {
        self.step * (1.0 - self.padding_inner)
    }

    pub fn map(&self, key: &str) -> Option<f64> {
        self.domain
            .iter()
            .position(|d| d == key)
            .map(|i| self.positions[i])
    }

    pub fn ticks(&self) -> Vec<(&str, f64)> {
        self.domain
            .iter()
            .map(String::as_str)
            .zip(self.positions.iter().copied())
            .collect()
    }

    fn rescale(&mut self) {
        let n = self.domain.len() as f64;
        let (r0, r1) = self.range;
        let reverse = r1 < r0;
        let (start, stop) = if reverse { (r1, r0) } else { (r0, r1) };
        let step = (stop - start) / (n - self.padding_inner + self.padding_outer * 2.0).max(1.0);
        let start = start + (stop - start - step * (n - self.padding_inner)) * self.align;

        let mut positions: Vec<f64> = (0..self.domain.len())
            .map(|i| start + step * i as f64)
            .collect();
        if reverse {
            positions.reverse();
        }
        self.positions = positions;
        self.step = step;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalScale {
    domain: Vec<String>,
    range: Vec<String>,
}

impl OrdinalScale {
    pub fn new<D, R>(domain: D, range: R) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            domain: domain.into_iter().map(Into::into).collect(),
            range: range.into_iter().map(Into::into).collect(),
        }
    }

    pub fn map(&self, key: &str) -> Option<&str> {
        let index = self.domain.iter().position(|d| d == key)?;
        self.nth(index)
    }

    pub fn nth(&self, index: usize) -> Option<&str> {
        if self.range.is_empty() {
            return None;
        }
        Some(self.range[index % self.range.len()].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn linear_maps_endpoints_and_midpoint() {
        let scale = LinearScale::new((2020.0, 2025.0), (0.0, 550.0));
        assert_eq!(scale.map(2020.0), 0.0);
        assert_eq!(scale.map(2025.0), 550.0);
        assert_eq!(scale.map(2022.5), 275.0);
    }

    #[test]
    fn linear_with_collapsed_domain_maps_to_range_middle() {
        let scale = LinearScale::new((2024.0, 2024.0), (250.0, 350.0));
        assert_eq!(scale.map(2024.0), 300.0);
    }

    #[test]
    fn sqrt_scale_tracks_area() {
        let scale = SqrtScale::new((0.0, 16.0), (0.0, 8.0));
        assert_eq!(scale.map(4.0), 4.0);
        assert_eq!(scale.map(16.0), 8.0);
    }

    #[test]
    fn band_with_full_padding_on_reversed_range() {
        let scale = BandScale::new(kinds(&["games", "paintings", "videos"]), (355.0, 0.0))
            .with_padding(1.0);
        assert_eq!(scale.bandwidth(), 0.0);
        // First domain value sits at the bottom of a reversed range.
        assert_eq!(scale.map("games"), Some(266.25));
        assert_eq!(scale.map("paintings"), Some(177.5));
        assert_eq!(scale.map("videos"), Some(88.75));
        assert_eq!(scale.map("poems"), None);
    }

    #[test]
    fn band_reorders_with_new_domain() {
        let mut scale = BandScale::new(kinds(&["a", "b"]), (0.0, 90.0)).with_padding(1.0);
        let a_before = scale.map("a");
        scale.set_domain(kinds(&["b", "a"]));
        assert_eq!(scale.map("b"), a_before);
    }

    #[test]
    fn ordinal_cycles_range() {
        let scale = OrdinalScale::new(["x", "y", "z"], ["red", "blue"]);
        assert_eq!(scale.map("x"), Some("red"));
        assert_eq!(scale.map("z"), Some("red"));
        assert_eq!(scale.map("w"), None);
    }

    #[test]
    fn extent_skips_nan() {
        assert_eq!(extent([3.0, f64::NAN, -1.0, 7.0]), Some((-1.0, 7.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }
}
