use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_renderable(&self) -> bool {
        self.width.is_finite() && self.width > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self { top, right, bottom, left }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub trait Responsive {
    fn resize(&mut self, viewport: Viewport) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative_widths_are_not_renderable() {
        assert!(!Viewport::new(0.0, 100.0).is_renderable());
        assert!(!Viewport::new(-5.0, 100.0).is_renderable());
        assert!(!Viewport::new(f64::NAN, 100.0).is_renderable());
        assert!(Viewport::new(1.0, 0.0).is_renderable());
    }
}
