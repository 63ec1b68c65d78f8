use crate::svg::Element;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const TRIGGER_OFFSET: f64 = 100.0;
pub const SCROLLED_AFTER: f64 = 50.0;
pub const HOME_SECTION: &str = "home-section";
pub const NAV_ID: &str = "floating-nav";
pub const BACK_TO_TOP_ID: &str = "backToTopBtn";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl Section {
    pub fn new(id: &str, top: f64, height: f64) -> Self {
        Self { id: id.to_string(), top, height }
    }

    fn straddles_trigger(&self, scroll_y: f64) -> bool {
        let top = self.top - scroll_y;
        let bottom = top + self.height;
        top <= TRIGGER_OFFSET && bottom > TRIGGER_OFFSET
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Hidden,
    Shown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackToTopEvent {
    Scroll(f64),
    Resize { section_top: Option<f64>, window_height: f64 },
    Click,
}

#[derive(Debug, Clone)]
pub struct BackToTop {
    threshold: f64,
    scroll_y: f64,
    state: Visibility,
}

impl BackToTop {
    pub fn new(section_top: Option<f64>, window_height: f64) -> Self {
        let threshold = section_top.unwrap_or_else(|| {
            warn!("Content section not found; back-to-top button uses half the window height");
            Self::fallback_threshold(window_height)
        });
        Self::with_threshold(threshold)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        let mut button = Self { threshold, scroll_y: 0.0, state: Visibility::Hidden };
        button.evaluate();
        button
    }

    pub fn fallback_threshold(window_height: f64) -> f64 {
        window_height * 0.5
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn handle(&mut self, event: BackToTopEvent) -> Option<f64> {
        match event {
            BackToTopEvent::Scroll(y) => {
                self.scroll_y = y;
                self.evaluate();
                None
            }
            BackToTopEvent::Resize { section_top, .. } => {
                if let Some(top) = section_top {
                    self.threshold = top;
                }
                self.evaluate();
                None
            }
            BackToTopEvent::Click => Some(0.0),
        }
    }

    fn evaluate(&mut self) {
        self.state = if self.scroll_y >= self.threshold {
            Visibility::Shown
        } else {
            Visibility::Hidden
        };
    }

    pub fn render(&self) -> Element {
        let mut button = Element::new("button")
            .attr("id", BACK_TO_TOP_ID)
            .attr("type", "button")
            .attr("title", "Back to top");
        if self.state == Visibility::Shown {
            button.set_attr("class", "show");
        }
        button.text("\u{2191}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Scroll(f64),
    Resize(Vec<Section>),
    Click(String),
}

#[derive(Debug, Clone)]
pub struct NavItem {
    pub target: String,
    pub label: String,
}

impl NavItem {
    pub fn new(target: &str, label: &str) -> Self {
        Self { target: target.to_string(), label: label.to_string() }
    }
}

#[derive(Debug, Clone)]
pub struct ScrollSpy {
    items: Vec<NavItem>,
    sections: Vec<Section>,
    scroll_y: f64,
    active: Option<String>,
    scrolled: bool,
}

impl ScrollSpy {
    pub fn new(items: Vec<NavItem>, sections: Vec<Section>) -> Self {
        let mut spy = Self { items, sections, scroll_y: 0.0, active: None, scrolled: false };
        spy.evaluate();
        spy
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_items(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| self.active.as_deref() == Some(item.target.as_str()))
            .map(|item| item.target.as_str())
            .collect()
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    pub fn handle(&mut self, event: NavEvent) -> Option<f64> {
        match event {
            NavEvent::Scroll(y) => {
                self.scroll_y = y;
                self.evaluate();
                None
            }
            NavEvent::Resize(sections) => {
                self.sections = sections;
                self.evaluate();
                None
            }
            NavEvent::Click(target) => match self.sections.iter().find(|s| s.id == target) {
                Some(section) => Some(section.top.max(0.0)),
                None => {
                    warn!("Nav target {} has no section", target);
                    None
                }
            },
        }
    }

    fn evaluate(&mut self) {
        // Later sections win when boxes overlap the trigger line.
        let mut active = self
            .sections
            .iter()
            .filter(|s| s.straddles_trigger(self.scroll_y))
            .last()
            .map(|s| s.id.clone());
        if active.is_none() && self.scroll_y == 0.0 {
            active = Some(HOME_SECTION.to_string());
        }
        self.active = active;
        self.scrolled = self.scroll_y > SCROLLED_AFTER;
    }

    pub fn render(&self) -> Element {
        let mut nav = Element::new("nav").attr("id", NAV_ID);
        if self.scrolled {
            nav.set_attr("class", "scrolled");
        }
        let mut list = Element::new("ul");
        for item in &self.items {
            let mut link = Element::new("a")
                .attr("class", "nav-item")
                .attr("href", format!("#{}", item.target));
            if self.active.as_deref() == Some(item.target.as_str()) {
                link.set_attr("class", "nav-item active");
            }
            list.push(Element::new("li").child(link.text(&item.label)));
        }
        nav.child(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spy() -> ScrollSpy {
        ScrollSpy::new(
            vec![NavItem::new("home", "Home"), NavItem::new("about", "About")],
            vec![Section::new("home", 0.0, 500.0), Section::new("about", 500.0, 700.0)],
        )
    }

    #[test]
    fn scrolling_into_a_section_activates_only_it() {
        let mut spy = spy();
        spy.handle(NavEvent::Scroll(600.0));
        assert_eq!(spy.active(), Some("about"));
        assert_eq!(spy.active_items(), ["about"]);

        let nav = spy.render();
        let active = nav.find_by_class("active");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].get_attr("href"), Some("#about"));
    }

    #[test]
    fn trigger_line_is_inclusive_at_the_top() {
        let mut spy = spy();
        spy.handle(NavEvent::Scroll(400.0));
        assert_eq!(spy.active(), Some("about"));
        spy.handle(NavEvent::Scroll(399.0));
        assert_eq!(spy.active(), Some("home"));
    }

    #[test]
    fn top_of_page_falls_back_to_home_section() {
        let spy = ScrollSpy::new(vec![NavItem::new(HOME_SECTION, "Home")], vec![Section::new("about", 500.0, 100.0)]);
        assert_eq!(spy.active(), Some(HOME_SECTION));
        assert!(!spy.is_scrolled());
    }

    #[test]
    fn nothing_active_between_sections() {
        let mut spy = ScrollSpy::new(Vec::new(), vec![Section::new("about", 500.0, 100.0)]);
        spy.handle(NavEvent::Scroll(10.0));
        assert_eq!(spy.active(), None);
    }

    #[test]
    fn nav_is_marked_scrolled_past_threshold() {
        let mut spy = spy();
        spy.handle(NavEvent::Scroll(50.0));
        assert!(!spy.is_scrolled());
        spy.handle(NavEvent::Scroll(51.0));
        assert!(spy.is_scrolled());
        assert_eq!(spy.render().get_attr("class"), Some("scrolled"));
    }

    #[test]
    fn click_targets_section_offset() {
        let mut spy = ScrollSpy::new(Vec::new(), vec![Section::new("intro", -20.0, 100.0), Section::new("about", 500.0, 100.0)]);
        assert_eq!(spy.handle(NavEvent::Click("about".into())), Some(500.0));
        assert_eq!(spy.handle(NavEvent::Click("intro".into())), Some(0.0));
        assert_eq!(spy.handle(NavEvent::Click("missing".into())), None);
    }

    #[test]
    fn resize_remeasures_sections() {
        let mut spy = spy();
        spy.handle(NavEvent::Scroll(600.0));
        spy.handle(NavEvent::Resize(vec![Section::new("home", 0.0, 800.0), Section::new("about", 800.0, 700.0)]));
        assert_eq!(spy.active(), Some("home"));
    }

    #[test]
    fn back_to_top_follows_threshold() {
        let mut button = BackToTop::new(Some(700.0), 900.0);
        assert_eq!(button.state(), Visibility::Hidden);
        button.handle(BackToTopEvent::Scroll(700.0));
        assert_eq!(button.state(), Visibility::Shown);
        assert_eq!(button.render().get_attr("class"), Some("show"));
        button.handle(BackToTopEvent::Scroll(699.0));
        assert_eq!(button.state(), Visibility::Hidden);
        assert_eq!(button.handle(BackToTopEvent::Click), Some(0.0));
    }

    #[test]
    fn back_to_top_without_section_uses_half_window() {
        let mut button = BackToTop::new(None, 800.0);
        assert_eq!(button.threshold(), 400.0);
        button.handle(BackToTopEvent::Resize { section_top: None, window_height: 1000.0 });
        assert_eq!(button.threshold(), 400.0);
        button.handle(BackToTopEvent::Scroll(450.0));
        assert_eq!(button.state(), Visibility::Shown);
    }

    #[test]
    fn resize_moves_threshold_and_reevaluates() {
        let mut button = BackToTop::new(Some(700.0), 900.0);
        button.handle(BackToTopEvent::Scroll(650.0));
        assert_eq!(button.state(), Visibility::Hidden);
        button.handle(BackToTopEvent::Resize { section_top: Some(600.0), window_height: 900.0 });
        assert_eq!(button.state(), Visibility::Shown);
    }
}
