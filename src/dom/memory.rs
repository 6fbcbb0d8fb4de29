//! In-memory DOM
//!
//! A document model that lives entirely in process: element trees built from
//! [`Markup`], handlers stored on the elements they were bound to, a location
//! fragment with change listeners, recorded alerts, and a manual clock for
//! timers. Replacing an element's content drops the replaced elements along
//! with their handlers, as a browser does.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{Dom, EventKind, Handler};
use crate::markup::{Element, Markup};

/// Handle to an element in a [`MemoryDom`]
#[derive(Clone)]
pub struct MemNode(Rc<RefCell<MemElement>>);

struct MemElement {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<MemChild>,
    handlers: HashMap<EventKind, Handler>,
}

enum MemChild {
    Element(MemNode),
    Text(String),
}

struct Timer {
    due_ms: u64,
    callback: Box<dyn FnOnce()>,
}

impl MemNode {
    fn new(tag: &str) -> Self {
        Self(Rc::new(RefCell::new(MemElement {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
            handlers: HashMap::new(),
        })))
    }

    fn from_element(element: &Element) -> Self {
        let node = Self::new(element.tag());
        {
            let mut inner = node.0.borrow_mut();
            inner.attrs = element.attrs().to_vec();
            for child in element.children() {
                append_markup(&mut inner.children, child);
            }
        }
        node
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn ptr_eq(&self, other: &MemNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn has_handler(&self, event: EventKind) -> bool {
        self.0.borrow().handlers.contains_key(&event)
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attr(&self, name: &str, value: &str) {
        let mut inner = self.0.borrow_mut();
        match inner.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => inner.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attr(&self, name: &str) {
        self.0.borrow_mut().attrs.retain(|(n, _)| n != name);
    }

    fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn child_elements(&self) -> Vec<MemNode> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|c| match c {
                MemChild::Element(node) => Some(node.clone()),
                MemChild::Text(_) => None,
            })
            .collect()
    }

    fn text_content(&self) -> String {
        let inner = self.0.borrow();
        let mut out = String::new();
        for child in &inner.children {
            match child {
                MemChild::Text(t) => out.push_str(t),
                MemChild::Element(node) => out.push_str(&node.text_content()),
            }
        }
        out
    }

    fn find_first(&self, pred: &dyn Fn(&MemNode) -> bool) -> Option<MemNode> {
        for child in self.child_elements() {
            if pred(&child) {
                return Some(child);
            }
            if let Some(found) = child.find_first(pred) {
                return Some(found);
            }
        }
        None
    }

    fn collect(&self, pred: &dyn Fn(&MemNode) -> bool, out: &mut Vec<MemNode>) {
        for child in self.child_elements() {
            if pred(&child) {
                out.push(child.clone());
            }
            child.collect(pred, out);
        }
    }

    /// Rebuild markup for this element and its subtree
    pub fn to_markup(&self) -> Markup {
        let inner = self.0.borrow();
        let element = inner
            .attrs
            .iter()
            .fold(Element::new(&inner.tag), |el, (n, v)| el.attr(n, v.as_str()));
        let element = inner
            .children
            .iter()
            .fold(element, |el, child| el.child(child.to_markup()));
        Markup::Element(element)
    }

    fn inner_markup(&self) -> Markup {
        Markup::Fragment(
            self.0
                .borrow()
                .children
                .iter()
                .map(MemChild::to_markup)
                .collect(),
        )
    }
}

impl fmt::Debug for MemNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("MemNode")
            .field("tag", &inner.tag)
            .field("attrs", &inner.attrs)
            .finish()
    }
}

impl MemChild {
    fn to_markup(&self) -> Markup {
        match self {
            MemChild::Element(node) => node.to_markup(),
            MemChild::Text(t) => Markup::Text(t.clone()),
        }
    }
}

fn append_markup(children: &mut Vec<MemChild>, markup: &Markup) {
    match markup {
        Markup::Element(element) => children.push(MemChild::Element(MemNode::from_element(element))),
        Markup::Text(t) => children.push(MemChild::Text(t.clone())),
        Markup::Fragment(nodes) => {
            for node in nodes {
                append_markup(children, node);
            }
        }
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            if k.is_empty() {
                None
            } else {
                Some((k.to_string(), v.trim().to_string()))
            }
        })
        .collect()
}

/// In-process document with a `#root` mount point
pub struct MemoryDom {
    body: MemNode,
    fragment: RefCell<String>,
    fragment_listeners: RefCell<Vec<Handler>>,
    alerts: RefCell<Vec<String>>,
    timers: RefCell<Vec<Timer>>,
    now_ms: Cell<u64>,
}

impl MemoryDom {
    /// Empty document containing `<div id="root"></div>`
    pub fn new() -> Self {
        let dom = Self::without_root();
        dom.body
            .0
            .borrow_mut()
            .children
            .push(MemChild::Element(MemNode::from_element(
                &Element::new("div").id("root"),
            )));
        dom
    }

    /// Empty document with no mount point
    pub fn without_root() -> Self {
        Self {
            body: MemNode::new("body"),
            fragment: RefCell::new(String::new()),
            fragment_listeners: RefCell::new(Vec::new()),
            alerts: RefCell::new(Vec::new()),
            timers: RefCell::new(Vec::new()),
            now_ms: Cell::new(0),
        }
    }

    /// Start with the given location fragment
    pub fn with_fragment(self, fragment: &str) -> Self {
        *self.fragment.borrow_mut() = fragment.trim_start_matches('#').to_string();
        self
    }

    pub fn body(&self) -> MemNode {
        self.body.clone()
    }

    /// Serialized content of `node`
    pub fn inner_html(&self, node: &MemNode) -> String {
        node.inner_markup().to_string()
    }

    /// Run the handler bound for `event` on `node` to completion.
    /// Returns false when nothing was bound.
    pub async fn dispatch(&self, node: &MemNode, event: EventKind) -> bool {
        let handler = node.0.borrow().handlers.get(&event).cloned();
        match handler {
            Some(handler) => {
                handler().await;
                true
            }
            None => false,
        }
    }

    /// Click the element with `id`; false when absent or unbound
    pub async fn click_id(&self, id: &str) -> bool {
        match self.by_id(id) {
            Some(node) => self.dispatch(&node, EventKind::Click).await,
            None => false,
        }
    }

    /// Submit the form with `id`; false when absent or unbound
    pub async fn submit_id(&self, id: &str) -> bool {
        match self.by_id(id) {
            Some(node) => self.dispatch(&node, EventKind::Submit).await,
            None => false,
        }
    }

    /// Set the value of the form control with `id`
    pub fn fill(&self, id: &str, value: &str) -> bool {
        match self.by_id(id) {
            Some(node) => {
                self.set_value(&node, value);
                true
            }
            None => false,
        }
    }

    /// Change the fragment the way an address-bar edit or back/forward
    /// would, notifying fragment listeners
    pub async fn change_fragment(&self, fragment: &str) {
        *self.fragment.borrow_mut() = fragment.trim_start_matches('#').to_string();
        let listeners: Vec<Handler> = self.fragment_listeners.borrow().clone();
        for listener in listeners {
            listener().await;
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Move the clock forward, firing timers that come due in order
    pub fn advance(&self, ms: u64) {
        let target = self.now_ms.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let idx = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due_ms <= target)
                    .min_by_key(|(_, t)| t.due_ms)
                    .map(|(i, _)| i);
                idx.map(|i| timers.remove(i))
            };
            match next {
                Some(timer) => {
                    self.now_ms.set(timer.due_ms);
                    (timer.callback)();
                }
                None => break,
            }
        }
        self.now_ms.set(target);
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom for MemoryDom {
    type Node = MemNode;

    fn by_id(&self, id: &str) -> Option<MemNode> {
        self.body
            .find_first(&|node| node.attr("id").as_deref() == Some(id))
    }

    fn by_class(&self, class: &str) -> Vec<MemNode> {
        let mut out = Vec::new();
        self.body
            .collect(&|node| node.classes().iter().any(|c| c == class), &mut out);
        out
    }

    fn set_inner_html(&self, node: &MemNode, markup: &Markup) {
        let mut children = Vec::new();
        append_markup(&mut children, markup);
        node.0.borrow_mut().children = children;
    }

    fn text(&self, node: &MemNode) -> String {
        node.text_content()
    }

    fn set_text(&self, node: &MemNode, text: &str) {
        let mut inner = node.0.borrow_mut();
        inner.children.clear();
        if !text.is_empty() {
            inner.children.push(MemChild::Text(text.to_string()));
        }
    }

    fn attr(&self, node: &MemNode, name: &str) -> Option<String> {
        node.attr(name)
    }

    fn set_attr(&self, node: &MemNode, name: &str, value: &str) {
        node.set_attr(name, value);
    }

    fn remove_attr(&self, node: &MemNode, name: &str) {
        node.remove_attr(name);
    }

    fn add_class(&self, node: &MemNode, class: &str) {
        let mut classes = node.classes();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            node.set_attr("class", &classes.join(" "));
        }
    }

    fn remove_class(&self, node: &MemNode, class: &str) {
        let classes = node.classes();
        if classes.iter().any(|c| c == class) {
            let kept: Vec<String> = classes.into_iter().filter(|c| c != class).collect();
            node.set_attr("class", &kept.join(" "));
        }
    }

    fn has_class(&self, node: &MemNode, class: &str) -> bool {
        node.classes().iter().any(|c| c == class)
    }

    fn set_class_name(&self, node: &MemNode, class_name: &str) {
        node.set_attr("class", class_name);
    }

    fn set_style(&self, node: &MemNode, property: &str, value: &str) {
        let mut decls = parse_style(&node.attr("style").unwrap_or_default());
        match decls.iter_mut().find(|(k, _)| k == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        let style = decls
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        node.set_attr("style", &style);
    }

    fn style(&self, node: &MemNode, property: &str) -> Option<String> {
        parse_style(&node.attr("style").unwrap_or_default())
            .into_iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v)
    }

    fn value(&self, node: &MemNode) -> String {
        match node.tag().as_str() {
            "textarea" => node.text_content(),
            "select" => {
                let mut options = Vec::new();
                node.collect(&|n| n.tag() == "option", &mut options);
                let chosen = options
                    .iter()
                    .find(|o| o.attr("selected").is_some())
                    .or_else(|| options.first());
                chosen
                    .map(|o| o.attr("value").unwrap_or_else(|| o.text_content()))
                    .unwrap_or_default()
            }
            _ => node.attr("value").unwrap_or_default(),
        }
    }

    fn set_value(&self, node: &MemNode, value: &str) {
        match node.tag().as_str() {
            "textarea" => self.set_text(node, value),
            "select" => {
                let mut options = Vec::new();
                node.collect(&|n| n.tag() == "option", &mut options);
                for option in options {
                    if option.attr("value").as_deref() == Some(value) {
                        option.set_attr("selected", "");
                    } else {
                        option.remove_attr("selected");
                    }
                }
            }
            _ => node.set_attr("value", value),
        }
    }

    fn on(&self, node: &MemNode, event: EventKind, handler: Handler) {
        node.0.borrow_mut().handlers.insert(event, handler);
    }

    fn fragment(&self) -> String {
        self.fragment.borrow().clone()
    }

    fn set_fragment(&self, fragment: &str) {
        *self.fragment.borrow_mut() = fragment.trim_start_matches('#').to_string();
    }

    fn on_fragment_change(&self, handler: Handler) {
        self.fragment_listeners.borrow_mut().push(handler);
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        self.timers.borrow_mut().push(Timer {
            due_ms: self.now_ms.get() + u64::from(delay_ms),
            callback,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::handler;
    use crate::markup::el;

    fn mounted() -> MemoryDom {
        let dom = MemoryDom::new();
        let root = dom.by_id("root").unwrap();
        dom.set_inner_html(
            &root,
            &el("div")
                .class("list")
                .child(el("span").id("a").class("item").text("one"))
                .child(el("span").id("b").class("item active").text("two"))
                .child(el("input").id("name").attr("value", "x"))
                .into(),
        );
        dom
    }

    #[test]
    fn test_lookup_by_id_and_class() {
        let dom = mounted();
        assert_eq!(dom.by_id("a").map(|n| n.tag()), Some("span".to_string()));
        assert!(dom.by_id("missing").is_none());
        assert_eq!(dom.by_class("item").len(), 2);
        assert_eq!(dom.by_class("active").len(), 1);
    }

    #[test]
    fn test_without_root_has_no_mount_point() {
        let dom = MemoryDom::without_root();
        assert!(dom.by_id("root").is_none());
    }

    #[test]
    fn test_class_and_style_mutation() {
        let dom = mounted();
        let a = dom.by_id("a").unwrap();
        dom.add_class(&a, "active");
        dom.add_class(&a, "active");
        assert_eq!(dom.attr(&a, "class").as_deref(), Some("item active"));
        dom.remove_class(&a, "item");
        assert!(!dom.has_class(&a, "item"));

        dom.set_style(&a, "display", "none");
        dom.set_style(&a, "color", "red");
        dom.set_style(&a, "display", "block");
        assert_eq!(dom.style(&a, "display").as_deref(), Some("block"));
        assert_eq!(dom.style(&a, "color").as_deref(), Some("red"));
    }

    #[test]
    fn test_text_and_values() {
        let dom = mounted();
        let a = dom.by_id("a").unwrap();
        dom.set_text(&a, "changed");
        assert_eq!(dom.text(&a), "changed");

        assert!(dom.fill("name", "alice"));
        let input = dom.by_id("name").unwrap();
        assert_eq!(dom.value(&input), "alice");
    }

    #[test]
    fn test_select_value_follows_selected_option() {
        let dom = MemoryDom::new();
        let root = dom.by_id("root").unwrap();
        dom.set_inner_html(
            &root,
            &el("select")
                .id("s")
                .child(el("option").attr("value", "online").text("Online"))
                .child(el("option").attr("value", "away").flag("selected").text("Away"))
                .into(),
        );
        let select = dom.by_id("s").unwrap();
        assert_eq!(dom.value(&select), "away");
        dom.set_value(&select, "online");
        assert_eq!(dom.value(&select), "online");
    }

    #[test]
    fn test_inner_html_round_trips_markup() {
        let dom = mounted();
        let root = dom.by_id("root").unwrap();
        assert_eq!(
            dom.inner_html(&root),
            r#"<div class="list"><span id="a" class="item">one</span><span id="b" class="item active">two</span><input id="name" value="x"></div>"#
        );
    }

    #[tokio::test]
    async fn test_rebinding_replaces_handler() {
        let dom = mounted();
        let hits = Rc::new(Cell::new(0));
        let a = dom.by_id("a").unwrap();

        for _ in 0..3 {
            let hits = hits.clone();
            dom.on(&a, EventKind::Click, handler(move || {
                let hits = hits.clone();
                async move { hits.set(hits.get() + 1) }
            }));
        }

        assert!(dom.click_id("a").await);
        assert_eq!(hits.get(), 1);
        assert!(!dom.click_id("b").await);
    }

    #[tokio::test]
    async fn test_replacing_content_drops_handlers() {
        let dom = mounted();
        let a = dom.by_id("a").unwrap();
        dom.on(&a, EventKind::Click, handler(|| async {}));
        assert!(a.has_handler(EventKind::Click));

        let root = dom.by_id("root").unwrap();
        dom.set_inner_html(&root, &el("span").id("a").into());
        assert!(!dom.click_id("a").await);
    }

    #[tokio::test]
    async fn test_fragment_listeners_only_fire_on_external_change() {
        let dom = MemoryDom::new().with_fragment("#login");
        assert_eq!(dom.fragment(), "login");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let dom = Rc::new(dom);
        let dom_clone = Rc::downgrade(&dom);
        dom.on_fragment_change(handler(move || {
            let seen = seen_clone.clone();
            let dom = dom_clone.clone();
            async move {
                if let Some(dom) = dom.upgrade() {
                    seen.borrow_mut().push(dom.fragment());
                }
            }
        }));

        dom.set_fragment("dashboard");
        assert!(seen.borrow().is_empty());

        dom.change_fragment("#settings").await;
        assert_eq!(*seen.borrow(), vec!["settings".to_string()]);
    }

    #[test]
    fn test_timers_fire_when_due() {
        let dom = MemoryDom::new();
        let fired = Rc::new(RefCell::new(Vec::new()));
        for (delay, label) in [(500, "late"), (100, "early")] {
            let fired = fired.clone();
            dom.set_timeout(delay, Box::new(move || fired.borrow_mut().push(label)));
        }

        dom.advance(99);
        assert!(fired.borrow().is_empty());
        dom.advance(1);
        assert_eq!(*fired.borrow(), vec!["early"]);
        dom.advance(1000);
        assert_eq!(*fired.borrow(), vec!["early", "late"]);
        assert_eq!(dom.pending_timers(), 0);
    }
}
