//! DOM Surface
//!
//! The single mount point views render into, plus the handful of element
//! operations listener-attachment code needs. The browser crate implements
//! this over `web-sys`; [`MemoryDom`] implements it over an in-process tree.

mod memory;

pub use memory::{MemNode, MemoryDom};

use futures_util::future::{FutureExt, LocalBoxFuture};
use std::future::Future;
use std::rc::Rc;

use crate::markup::Markup;

/// Event kinds views bind handlers for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    /// Form submission; hosts suppress the default page reload
    Submit,
}

/// An event handler. Handlers may suspend on external calls; the host
/// decides how the returned future is driven.
pub type Handler = Rc<dyn Fn() -> LocalBoxFuture<'static, ()>>;

/// Build a [`Handler`] from an async closure
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Rc::new(move || f().boxed_local())
}

/// Document operations used by the router and views.
///
/// Lookups that find nothing return `None`/empty so callers can treat absent
/// elements as a no-op.
pub trait Dom: 'static {
    /// Cheap handle to a live element
    type Node: Clone + 'static;

    fn by_id(&self, id: &str) -> Option<Self::Node>;

    /// All elements carrying `class`, in document order
    fn by_class(&self, class: &str) -> Vec<Self::Node>;

    /// Replace the element's entire content
    fn set_inner_html(&self, node: &Self::Node, markup: &Markup);

    fn text(&self, node: &Self::Node) -> String;

    fn set_text(&self, node: &Self::Node, text: &str);

    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attr(&self, node: &Self::Node, name: &str, value: &str);

    fn remove_attr(&self, node: &Self::Node, name: &str);

    fn add_class(&self, node: &Self::Node, class: &str);

    fn remove_class(&self, node: &Self::Node, class: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Replace the element's class list
    fn set_class_name(&self, node: &Self::Node, class_name: &str);

    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    fn style(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Current value of a form control; empty for other elements
    fn value(&self, node: &Self::Node) -> String;

    fn set_value(&self, node: &Self::Node, value: &str);

    /// Bind `handler` for `event`, replacing any handler previously bound
    /// for the same event on the same element
    fn on(&self, node: &Self::Node, event: EventKind, handler: Handler);

    /// Location fragment without the leading `#`
    fn fragment(&self) -> String;

    fn set_fragment(&self, fragment: &str);

    /// Register a listener for fragment changes made outside the router
    fn on_fragment_change(&self, handler: Handler);

    /// Blocking user-facing message
    fn alert(&self, message: &str);

    /// Run `callback` once after `delay_ms`
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>);

    fn set_disabled(&self, node: &Self::Node, disabled: bool) {
        if disabled {
            self.set_attr(node, "disabled", "");
        } else {
            self.remove_attr(node, "disabled");
        }
    }

    fn is_disabled(&self, node: &Self::Node) -> bool {
        self.attr(node, "disabled").is_some()
    }

    /// `data-*` attribute lookup
    fn data(&self, node: &Self::Node, key: &str) -> Option<String> {
        self.attr(node, &format!("data-{}", key))
    }

    fn set_data(&self, node: &Self::Node, key: &str, value: &str) {
        self.set_attr(node, &format!("data-{}", key), value);
    }
}
