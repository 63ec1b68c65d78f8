use crate::chrome::{NavItem, Section};
use crate::config::AppConfig;
use crate::error::VizError;
use anyhow::{Context, Result};
use std::fs;

pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/index.html");
pub const STYLESHEET: &str = include_str!("../assets/style.css");

pub const NAV_CONTAINER: &str = "nav-root";
pub const BACK_TO_TOP_CONTAINER: &str = "back-to-top-root";

pub const ASSUMED_WINDOW_HEIGHT: f64 = 900.0;

pub fn nav_items() -> Vec<NavItem> {
    vec![
        NavItem::new("home-section", "Home"),
        NavItem::new("about-section", "About"),
        NavItem::new("travel-section", "Travel"),
        NavItem::new("skills-section", "Skills"),
        NavItem::new("works-section", "Works"),
        NavItem::new("career-section", "Career"),
    ]
}

pub fn unmeasured_sections() -> Vec<Section> {
    nav_items().iter().map(|item| Section::new(&item.target, 0.0, 0.0)).collect()
}

pub fn load_template(config: &AppConfig) -> Result<String> {
    match &config.input.template {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read page template: {:?}", path)),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

fn content_start(html: &str, id: &str) -> Option<usize> {
    let needle = format!("id=\"{}\"", id);
    html.match_indices(&needle).find_map(|(at, _)| {
        let preceded_by_space = html[..at].ends_with(|c: char| c.is_ascii_whitespace());
        let tag_start = html[..at].rfind('<')?;
        let unclosed = !html[tag_start..at].contains('>');
        if !(preceded_by_space && unclosed) {
            return None;
        }
        let tag_end = at + html[at..].find('>')?;
        if html[..tag_end].ends_with('/') {
            return None;
        }
        Some(tag_end + 1)
    })
}

pub fn has_container(html: &str, id: &str) -> bool {
    content_start(html, id).is_some()
}

pub fn insert_into_container(html: &str, id: &str, fragment: &str) -> Result<String, VizError> {
    let at = content_start(html, id).ok_or_else(|| VizError::MissingContainer(id.to_string()))?;
    let mut out = String::with_capacity(html.len() + fragment.len());
    out.push_str(&html[..at]);
    out.push_str(fragment);
    out.push_str(&html[at..]);
    Ok(out)
}
