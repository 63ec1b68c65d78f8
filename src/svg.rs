use std::fmt::{Display, Write};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(mut self, key: &str, value: impl Display) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl Display) {
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn children<I: IntoIterator<Item = Element>>(mut self, children: I) -> Self {
        self.children
            .extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn text(mut self, text: impl Display) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn raw(mut self, markup: impl Into<String>) -> Self {
        self.children.push(Node::Raw(markup.into()));
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|c| c.split_whitespace().any(|part| part == class))
            .unwrap_or(false)
    }

    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect(pred, &mut found);
        found
    }

    pub fn find_by_class<'a>(&'a self, class: &str) -> Vec<&'a Element> {
        self.find_all(&|e: &Element| e.has_class(class))
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Element(e) => out.push_str(&e.text_content()),
                Node::Text(t) => out.push_str(t),
                Node::Raw(_) => {}
            }
        }
        out
    }

    fn collect<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, found: &mut Vec<&'a Element>) {
        if pred(self) {
            found.push(self);
        }
        for child in &self.children {
            if let Node::Element(e) = child {
                e.collect(pred, found);
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", k, escape(v));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_to(out),
                Node::Text(t) => out.push_str(&escape(t)),
                Node::Raw(r) => out.push_str(r),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

pub fn svg_root(width: f64, height: f64, aspect: &str) -> Element {
    Element::new("svg")
        .attr("xmlns", "http://www.w3.org/2000/svg")
        .attr("viewBox", format!("0 0 {} {}", num(width), num(height)))
        .attr("preserveAspectRatio", aspect)
}

pub fn translate(x: f64, y: f64) -> String {
    format!("translate({},{})", num(x), num(y))
}

pub fn num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let mut s = format!("{:.3}", value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_elements_with_escaping() {
        let el = Element::new("g")
            .attr("class", "legend")
            .child(Element::new("text").attr("x", 24).text("Fish & <Chips>"))
            .child(Element::new("rect").attr("width", 18));
        assert_eq!(
            el.render(),
            "<g class=\"legend\"><text x=\"24\">Fish &amp; &lt;Chips&gt;</text><rect width=\"18\"/></g>"
        );
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut el = Element::new("line").attr("stroke", "#999").attr("stroke-width", "2px");
        el.set_attr("stroke", "rgb(0,0,0)");
        assert_eq!(el.render(), "<line stroke=\"rgb(0,0,0)\" stroke-width=\"2px\"/>");
    }

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(num(1.5), "1.5");
        assert_eq!(num(2.0), "2");
        assert_eq!(num(-0.0001), "0");
        assert_eq!(num(3.14159), "3.142");
    }

    #[test]
    fn finds_by_class() {
        let el = Element::new("g")
            .child(Element::new("circle").attr("class", "bubble big"))
            .child(Element::new("g").child(Element::new("circle").attr("class", "bubble")));
        assert_eq!(el.find_by_class("bubble").len(), 2);
        assert_eq!(el.find_by_class("big").len(), 1);
    }
}
