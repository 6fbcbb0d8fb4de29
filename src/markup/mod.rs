//! Markup Tree
//!
//! Views produce a small element tree instead of concatenated strings. The
//! tree renders to an HTML string through `Display`, escaping text and
//! attribute values, and hosts that keep their own document model (the
//! in-memory DOM) can walk it directly.

use std::fmt;

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta"];

/// A renderable piece of markup
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    Element(Element),
    Text(String),
    /// Sibling nodes without a wrapping element
    Fragment(Vec<Markup>),
}

/// An HTML element with ordered attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Markup>,
}

/// Start building an element
pub fn el(tag: &str) -> Element {
    Element::new(tag)
}

/// A text node
pub fn text(content: impl Into<String>) -> Markup {
    Markup::Text(content.into())
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn children(&self) -> &[Markup] {
        &self.children
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    /// Set an attribute, replacing any previous value
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
        self
    }

    pub fn attr_if(self, cond: bool, name: &str, value: impl Into<String>) -> Self {
        if cond {
            self.attr(name, value)
        } else {
            self
        }
    }

    /// Boolean attribute such as `disabled` or `selected`
    pub fn flag(self, name: &str) -> Self {
        self.attr(name, "")
    }

    pub fn flag_if(self, cond: bool, name: &str) -> Self {
        if cond {
            self.flag(name)
        } else {
            self
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Append one or more space-separated classes
    pub fn class(mut self, class: &str) -> Self {
        if class.trim().is_empty() {
            return self;
        }
        match self.attrs.iter_mut().find(|(n, _)| n == "class") {
            Some(slot) if !slot.1.is_empty() => {
                slot.1.push(' ');
                slot.1.push_str(class.trim());
            }
            Some(slot) => slot.1 = class.trim().to_string(),
            None => self.attrs.push(("class".to_string(), class.trim().to_string())),
        }
        self
    }

    pub fn class_if(self, cond: bool, class: &str) -> Self {
        if cond {
            self.class(class)
        } else {
            self
        }
    }

    pub fn child(mut self, child: impl Into<Markup>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children_from<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Markup>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(Markup::Text(content.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl From<Element> for Markup {
    fn from(element: Element) -> Self {
        Markup::Element(element)
    }
}

impl From<&str> for Markup {
    fn from(content: &str) -> Self {
        Markup::Text(content.to_string())
    }
}

impl From<String> for Markup {
    fn from(content: String) -> Self {
        Markup::Text(content)
    }
}

impl From<Vec<Markup>> for Markup {
    fn from(nodes: Vec<Markup>) -> Self {
        Markup::Fragment(nodes)
    }
}

/// Escape text content
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value
pub fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            if value.is_empty() && name != "class" && name != "value" {
                write!(f, " {}", name)?;
            } else {
                write!(f, " {}=\"{}\"", name, escape_attr(value))?;
            }
        }
        write!(f, ">")?;

        if self.is_void() {
            return Ok(());
        }

        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Markup::Element(element) => write!(f, "{}", element),
            Markup::Text(content) => write!(f, "{}", escape_text(content)),
            Markup::Fragment(nodes) => {
                for node in nodes {
                    write!(f, "{}", node)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_nested_elements() {
        let markup: Markup = el("div")
            .id("root")
            .class("card")
            .child(el("span").text("Hello"))
            .into();

        assert_eq!(
            markup.to_string(),
            r#"<div id="root" class="card"><span>Hello</span></div>"#
        );
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let markup: Markup = el("div")
            .attr("title", r#"a "quoted" <name>"#)
            .text("<script>alert(1)</script> & co")
            .into();

        assert_eq!(
            markup.to_string(),
            "<div title=\"a &quot;quoted&quot; &lt;name&gt;\">&lt;script&gt;alert(1)&lt;/script&gt; &amp; co</div>"
        );
    }

    #[test]
    fn test_void_and_boolean_attributes() {
        let markup: Markup = el("input")
            .attr("type", "text")
            .flag_if(true, "disabled")
            .flag_if(false, "required")
            .into();

        assert_eq!(markup.to_string(), r#"<input type="text" disabled>"#);
    }

    #[test]
    fn test_class_accumulates() {
        let element = el("div")
            .class("nav-item")
            .class_if(true, "active")
            .class_if(false, "hidden");
        assert_eq!(element.get_attr("class"), Some("nav-item active"));
    }

    #[test]
    fn test_attr_replaces_existing() {
        let element = el("button").attr("data-mode", "login").attr("data-mode", "register");
        assert_eq!(element.attrs().len(), 1);
        assert_eq!(element.get_attr("data-mode"), Some("register"));
    }

    #[test]
    fn test_fragment_renders_siblings() {
        let markup = Markup::Fragment(vec![el("p").text("a").into(), text("b")]);
        assert_eq!(markup.to_string(), "<p>a</p>b");
    }
}
