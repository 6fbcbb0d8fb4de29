//! Browser DOM
//!
//! [`Dom`] over `web-sys`. Event listeners are `gloo-events` guards owned
//! by [`WebDom`]: binding an element again drops its previous listener for
//! that event, and listeners on detached elements are dropped on the next
//! bind.

use std::cell::RefCell;

use chat_client::{Dom, EventKind, Handler, Markup};
use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
    Window,
};

struct Binding {
    node: Element,
    event: EventKind,
    _listener: EventListener,
}

pub struct WebDom {
    window: Window,
    document: Document,
    bindings: RefCell<Vec<Binding>>,
    fragment_listeners: RefCell<Vec<EventListener>>,
}

impl WebDom {
    /// `None` outside a browser window
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self {
            window,
            document,
            bindings: RefCell::new(Vec::new()),
            fragment_listeners: RefCell::new(Vec::new()),
        })
    }

    /// Live element listeners
    pub fn binding_count(&self) -> usize {
        self.bindings.borrow().len()
    }
}

fn as_html(node: &Element) -> Option<&HtmlElement> {
    node.dyn_ref::<HtmlElement>()
}

/// Run the handler's future on the browser task queue
fn listen(node: &Element, event: EventKind, handler: Handler) -> EventListener {
    match event {
        EventKind::Click => EventListener::new(node, "click", move |_| {
            spawn_local(handler());
        }),
        EventKind::Submit => EventListener::new_with_options(
            node,
            "submit",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                event.prevent_default();
                spawn_local(handler());
            },
        ),
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn by_class(&self, class: &str) -> Vec<Element> {
        let collection = self.document.get_elements_by_class_name(class);
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .collect()
    }

    fn set_inner_html(&self, node: &Element, markup: &Markup) {
        node.set_inner_html(&markup.to_string());
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn attr(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attr(&self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            warn!("Failed to set attribute {}: {:?}", name, e);
        }
    }

    fn remove_attr(&self, node: &Element, name: &str) {
        if let Err(e) = node.remove_attribute(name) {
            warn!("Failed to remove attribute {}: {:?}", name, e);
        }
    }

    fn add_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().add_1(class) {
            warn!("Failed to add class {}: {:?}", class, e);
        }
    }

    fn remove_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().remove_1(class) {
            warn!("Failed to remove class {}: {:?}", class, e);
        }
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_class_name(&self, node: &Element, class_name: &str) {
        node.set_class_name(class_name);
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        if let Some(html) = as_html(node) {
            if let Err(e) = html.style().set_property(property, value) {
                warn!("Failed to set style {}: {:?}", property, e);
            }
        }
    }

    fn style(&self, node: &Element, property: &str) -> Option<String> {
        as_html(node)
            .and_then(|html| html.style().get_property_value(property).ok())
            .filter(|value| !value.is_empty())
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else {
            String::new()
        }
    }

    fn set_value(&self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn on(&self, node: &Element, event: EventKind, handler: Handler) {
        let mut bindings = self.bindings.borrow_mut();
        bindings.retain(|b| b.node.is_connected() && !(b.event == event && &b.node == node));
        bindings.push(Binding {
            node: node.clone(),
            event,
            _listener: listen(node, event, handler),
        });
    }

    fn fragment(&self) -> String {
        self.window
            .location()
            .hash()
            .map(|hash| hash.trim_start_matches('#').to_string())
            .unwrap_or_default()
    }

    fn set_fragment(&self, fragment: &str) {
        if let Err(e) = self.window.location().set_hash(fragment) {
            warn!("Failed to set location hash: {:?}", e);
        }
    }

    fn on_fragment_change(&self, handler: Handler) {
        let listener = EventListener::new(&self.window, "hashchange", move |_| {
            spawn_local(handler());
        });
        self.fragment_listeners.borrow_mut().push(listener);
    }

    fn alert(&self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            warn!("Failed to show alert: {:?}", e);
        }
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        Timeout::new(delay_ms, callback).forget();
    }
}
