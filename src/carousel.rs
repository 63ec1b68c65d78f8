use crate::data::GalleryImage;
use crate::svg::Element;
use serde::Deserialize;

pub const CONTAINER: &str = "image-carousel-container";

const ARROW_WIDTH: f64 = 50.0;
const ARROW_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CarouselLayout {
    pub images_to_show: usize,
    pub image_width: f64,
    pub spacing: f64,
}

impl Default for CarouselLayout {
    fn default() -> Self {
        Self { images_to_show: 3, image_width: 250.0, spacing: 20.0 }
    }
}

impl CarouselLayout {
    pub fn viewport_width(&self) -> f64 {
        let n = self.images_to_show as f64;
        n * self.image_width + (n - 1.0).max(0.0) * self.spacing
    }

    pub fn container_max_width(&self) -> f64 {
        self.viewport_width() + 2.0 * ARROW_WIDTH + 2.0 * ARROW_MARGIN
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarouselEvent {
    Prev,
    Next,
    Open(usize),
    CloseButton,
    OverlayClick { on_backdrop: bool },
    Resize(CarouselLayout),
}

#[derive(Debug, Clone)]
pub struct Carousel {
    images: Vec<GalleryImage>,
    layout: CarouselLayout,
    index: usize,
    lightbox: Option<usize>,
}

impl Carousel {
    pub fn new(images: Vec<GalleryImage>, layout: CarouselLayout) -> Self {
        Self { images, layout, index: 0, lightbox: None }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lightbox(&self) -> Option<&GalleryImage> {
        self.lightbox.and_then(|i| self.images.get(i))
    }

    fn last_index(&self) -> usize {
        self.images.len().saturating_sub(self.layout.images_to_show)
    }

    pub fn offset(&self) -> f64 {
        -(self.index as f64) * (self.layout.image_width + self.layout.spacing)
    }

    pub fn prev_disabled(&self) -> bool {
        self.index == 0
    }

    pub fn next_disabled(&self) -> bool {
        self.index >= self.last_index()
    }

    pub fn handle(&mut self, event: CarouselEvent) {
        match event {
            CarouselEvent::Prev => {
                if !self.prev_disabled() {
                    self.index -= 1;
                }
            }
            CarouselEvent::Next => {
                if !self.next_disabled() {
                    self.index += 1;
                }
            }
            CarouselEvent::Open(i) if i < self.images.len() => self.lightbox = Some(i),
            CarouselEvent::Open(_) => {}
            CarouselEvent::CloseButton | CarouselEvent::OverlayClick { on_backdrop: true } => {
                self.lightbox = None
            }
            CarouselEvent::OverlayClick { on_backdrop: false } => {}
            CarouselEvent::Resize(layout) => {
                self.layout = layout;
                self.index = self.index.min(self.last_index());
            }
        }
    }

    pub fn render(&self) -> Element {
        let mut prev = Element::new("button")
            .attr("id", "prev-btn")
            .attr("class", "carousel-arrow")
            .attr("type", "button");
        if self.prev_disabled() {
            prev.set_attr("disabled", "disabled");
        }
        let mut next = Element::new("button")
            .attr("id", "next-btn")
            .attr("class", "carousel-arrow")
            .attr("type", "button");
        if self.next_disabled() {
            next.set_attr("disabled", "disabled");
        }

        let images = self.images.iter().enumerate().map(|(i, image)| {
            let mut img = Element::new("img")
                .attr("class", "carousel-image")
                .attr("src", &image.src)
                .attr("data-index", i);
            if let Some(alt) = &image.alt {
                img.set_attr("alt", alt);
            }
            img
        });

        let mut overlay = Element::new("div").attr("id", "large-image-overlay");
        if self.lightbox.is_some() {
            overlay.set_attr("class", "visible");
        }
        let mut large = Element::new("img").attr("id", "large-image");
        if let Some(image) = self.lightbox() {
            large.set_attr("src", &image.src);
            large.set_attr("alt", image.alt.as_deref().unwrap_or(""));
        }

        Element::new("div")
            .attr("class", "carousel")
            .attr("style", format!("max-width: {}px", self.layout.container_max_width()))
            .child(prev.text("\u{2039}"))
            .child(
                Element::new("div")
                    .attr("id", "carousel-viewport")
                    .attr("style", format!("width: {}px", self.layout.viewport_width()))
                    .child(
                        Element::new("div")
                            .attr("id", "carousel-images-wrapper")
                            .attr("style", format!("transform: translateX({}px)", self.offset()))
                            .children(images),
                    ),
            )
            .child(next.text("\u{203a}"))
            .child(
                overlay
                    .child(Element::new("span").attr("id", "close-large-image").text("\u{00d7}"))
                    .child(large),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Portfolio;

    fn carousel() -> Carousel {
        Carousel::new(Portfolio::default().gallery, CarouselLayout::default())
    }

    #[test]
    fn paging_stays_in_bounds() {
        let mut c = carousel();
        assert!(c.prev_disabled());
        c.handle(CarouselEvent::Prev);
        assert_eq!(c.index(), 0);
        for _ in 0..10 {
            c.handle(CarouselEvent::Next);
        }
        assert_eq!(c.index(), 5);
        assert!(c.next_disabled());
        assert_eq!(c.offset(), -5.0 * 270.0);
    }

    #[test]
    fn layout_widths() {
        let layout = CarouselLayout::default();
        assert_eq!(layout.viewport_width(), 790.0);
        assert_eq!(layout.container_max_width(), 910.0);
    }

    #[test]
    fn resize_clamps_index() {
        let mut c = carousel();
        for _ in 0..5 {
            c.handle(CarouselEvent::Next);
        }
        c.handle(CarouselEvent::Resize(CarouselLayout { images_to_show: 6, image_width: 100.0, spacing: 10.0 }));
        assert_eq!(c.index(), 2);
        c.handle(CarouselEvent::Resize(CarouselLayout { images_to_show: 12, image_width: 100.0, spacing: 10.0 }));
        assert_eq!(c.index(), 0);
        assert!(c.prev_disabled() && c.next_disabled());
    }

    #[test]
    fn lightbox_closes_only_from_backdrop_or_button() {
        let mut c = carousel();
        c.handle(CarouselEvent::Open(1));
        assert_eq!(c.lightbox().map(|i| i.src.as_str()), Some("yayale.jpg"));
        c.handle(CarouselEvent::OverlayClick { on_backdrop: false });
        assert!(c.lightbox().is_some());
        c.handle(CarouselEvent::OverlayClick { on_backdrop: true });
        assert!(c.lightbox().is_none());

        c.handle(CarouselEvent::Open(7));
        c.handle(CarouselEvent::CloseButton);
        assert!(c.lightbox().is_none());
    }

    #[test]
    fn renders_state() {
        let mut c = carousel();
        c.handle(CarouselEvent::Next);
        c.handle(CarouselEvent::Open(7));
        let html = c.render().render();
        assert!(html.contains("transform: translateX(-270px)"));
        assert!(!html.contains("id=\"prev-btn\" class=\"carousel-arrow\" type=\"button\" disabled"));
        assert!(html.contains("id=\"large-image-overlay\" class=\"visible\""));
        assert!(html.contains("<img id=\"large-image\" src=\"mitsui.jpg\" alt=\"\"/>"));
        assert_eq!(c.render().find_by_class("carousel-image").len(), 8);
    }
}
