//! Hash Router
//!
//! Owns the view registry and the current view state. Navigation replaces
//! the root element's content with the view's markup, re-attaches the
//! view's listeners and writes the view name into the location fragment.
//!
//! Two listeners keep the current view in step with the outside world:
//! - fragment changes (back/forward, edited address bar)
//! - auth-state changes from the identity provider, which force "login"
//!   and "dashboard" as the user signs out and in

mod error;
mod params;
mod view;

pub use error::RouterError;
pub use params::Params;
pub use view::{RenderFn, View};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info};

use crate::config::RouterConfig;
use crate::dom::{handler, Dom};
use crate::markup::Markup;
use crate::models::User;
use crate::platform::{AuthUser, IdentityProvider, Subscription};

pub const LOGIN_VIEW: &str = "login";
pub const DASHBOARD_VIEW: &str = "dashboard";

/// Current view and the params it was rendered with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouterState {
    pub current_view: Option<String>,
    pub current_params: Params,
}

struct RouterInner<D: Dom> {
    dom: Rc<D>,
    root: D::Node,
    default_view: String,
    views: RefCell<HashMap<String, Rc<dyn View<D>>>>,
    state: RefCell<RouterState>,
    identity: RefCell<Option<Rc<dyn IdentityProvider>>>,
    auth_subscription: RefCell<Option<Subscription>>,
}

/// Shared handle to a router
pub struct Router<D: Dom> {
    inner: Rc<RouterInner<D>>,
}

impl<D: Dom> Clone for Router<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Non-owning router handle for listeners stored in the DOM
pub struct WeakRouter<D: Dom> {
    inner: Weak<RouterInner<D>>,
}

impl<D: Dom> Clone for WeakRouter<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<D: Dom> WeakRouter<D> {
    pub fn upgrade(&self) -> Option<Router<D>> {
        self.inner.upgrade().map(|inner| Router { inner })
    }
}

impl<D: Dom> Router<D> {
    /// Bind to the root element; a missing root is fatal
    pub fn new(dom: Rc<D>, config: &RouterConfig) -> Result<Self, RouterError> {
        let root = dom.by_id(&config.root_id).ok_or_else(|| {
            error!("Root element #{} not found", config.root_id);
            RouterError::MissingRoot(config.root_id.clone())
        })?;

        Ok(Self {
            inner: Rc::new(RouterInner {
                dom,
                root,
                default_view: config.default_view.clone(),
                views: RefCell::new(HashMap::new()),
                state: RefCell::new(RouterState::default()),
                identity: RefCell::new(None),
                auth_subscription: RefCell::new(None),
            }),
        })
    }

    pub fn downgrade(&self) -> WeakRouter<D> {
        WeakRouter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn dom(&self) -> &Rc<D> {
        &self.inner.dom
    }

    /// Register a render-only view; a reused name replaces the old view
    pub fn register_view<F>(&self, name: &str, render: F)
    where
        F: Fn(&Params) -> Markup + 'static,
    {
        self.register(name, RenderFn(render));
    }

    /// Register a view with listeners; a reused name replaces the old view
    pub fn register<V: View<D> + 'static>(&self, name: &str, view: V) {
        self.inner
            .views
            .borrow_mut()
            .insert(name.to_string(), Rc::new(view));
        debug!(view = %name, "Registered view");
    }

    pub fn has_view(&self, name: &str) -> bool {
        self.inner.views.borrow().contains_key(name)
    }

    pub fn current_view(&self) -> Option<String> {
        self.inner.state.borrow().current_view.clone()
    }

    pub fn current_params(&self) -> Params {
        self.inner.state.borrow().current_params.clone()
    }

    pub fn state(&self) -> RouterState {
        self.inner.state.borrow().clone()
    }

    /// Render `name` into the root. An unknown name leaves everything as is.
    pub fn navigate_to(&self, name: &str, params: Params) -> Result<(), RouterError> {
        let view = self.inner.views.borrow().get(name).cloned();
        let view = match view {
            Some(view) => view,
            None => {
                error!("View {} not found", name);
                return Err(RouterError::ViewNotFound(name.to_string()));
            }
        };

        let previous = self
            .current_view()
            .and_then(|current| self.inner.views.borrow().get(&current).cloned());
        if let Some(previous) = previous {
            previous.cleanup();
        }

        let markup = view.render(&params);
        self.inner.dom.set_inner_html(&self.inner.root, &markup);

        {
            let mut state = self.inner.state.borrow_mut();
            state.current_view = Some(name.to_string());
            state.current_params = params;
        }

        view.attach(self);
        self.inner.dom.set_fragment(name);

        info!("Navigated to: {}", name);
        Ok(())
    }

    /// Initial navigation plus fragment and auth-state listeners. Without
    /// an identity provider the router falls back to fragment-only routing.
    pub fn init(&self, identity: Option<Rc<dyn IdentityProvider>>) {
        *self.inner.identity.borrow_mut() = identity.clone();

        let fragment = self.inner.dom.fragment();
        let initial = if !fragment.is_empty() && self.has_view(&fragment) {
            fragment
        } else {
            self.inner.default_view.clone()
        };
        let _ = self.navigate_to(&initial, self.params_for(&initial));

        let weak = self.downgrade();
        self.inner.dom.on_fragment_change(handler(move || {
            let weak = weak.clone();
            async move {
                if let Some(router) = weak.upgrade() {
                    router.handle_fragment_change();
                }
            }
        }));

        let identity = match identity {
            Some(identity) => identity,
            None => {
                error!("Identity provider not available; auth-state routing disabled");
                return;
            }
        };

        let weak = self.downgrade();
        let subscription = identity.on_auth_state_changed(Rc::new(move |user: Option<&AuthUser>| {
            if let Some(router) = weak.upgrade() {
                router.handle_auth_change(user);
            }
        }));
        *self.inner.auth_subscription.borrow_mut() = Some(subscription);
    }

    fn handle_fragment_change(&self) {
        let fragment = self.inner.dom.fragment();
        let target = if fragment.is_empty() {
            self.inner.default_view.clone()
        } else {
            fragment
        };

        // our own fragment writes land here too
        if self.current_view().as_deref() == Some(target.as_str()) {
            return;
        }

        let _ = self.navigate_to(&target, self.params_for(&target));
    }

    fn handle_auth_change(&self, user: Option<&AuthUser>) {
        let current = self.current_view();
        match user {
            Some(user) if current.as_deref() == Some(LOGIN_VIEW) => {
                debug!(uid = %user.uid, "Signed in on login view");
                let params = Params::new().with("user", User::from_identity(user));
                let _ = self.navigate_to(DASHBOARD_VIEW, params);
            }
            None if current.is_some() && current.as_deref() != Some(LOGIN_VIEW) => {
                debug!("Signed out; returning to login");
                let _ = self.navigate_to(LOGIN_VIEW, Params::new());
            }
            _ => {}
        }
    }

    /// The dashboard gets the signed-in identity as its `user` param
    fn params_for(&self, view: &str) -> Params {
        if view != DASHBOARD_VIEW {
            return Params::new();
        }
        let user = self
            .inner
            .identity
            .borrow()
            .as_ref()
            .and_then(|identity| identity.current_user());
        match user {
            Some(user) => Params::new().with("user", User::from_identity(&user)),
            None => Params::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::markup::el;
    use crate::platform::memory::MemoryIdentity;
    use std::cell::Cell;

    fn page(name: &'static str) -> impl Fn(&Params) -> Markup {
        move |params: &Params| {
            el("h1")
                .id("title")
                .text(format!("{}:{}", name, params.get_str("who").unwrap_or("-")))
                .into()
        }
    }

    fn router(dom: &Rc<MemoryDom>) -> Router<MemoryDom> {
        let router = Router::new(dom.clone(), &RouterConfig::default()).unwrap();
        router.register_view(LOGIN_VIEW, page("login"));
        router.register_view(DASHBOARD_VIEW, page("dashboard"));
        router
    }

    fn title(dom: &MemoryDom) -> String {
        dom.by_id("title").map(|n| dom.text(&n)).unwrap_or_default()
    }

    #[derive(Default)]
    struct Counting {
        attached: Rc<Cell<u32>>,
        cleaned: Rc<Cell<u32>>,
    }

    impl View<MemoryDom> for Counting {
        fn render(&self, _params: &Params) -> Markup {
            el("button").id("btn").text("go").into()
        }

        fn attach(&self, router: &Router<MemoryDom>) {
            self.attached.set(self.attached.get() + 1);
            let dom = router.dom();
            if let Some(btn) = dom.by_id("btn") {
                let weak = router.downgrade();
                dom.on(
                    &btn,
                    crate::dom::EventKind::Click,
                    handler(move || {
                        let weak = weak.clone();
                        async move {
                            if let Some(router) = weak.upgrade() {
                                let _ = router.navigate_to(LOGIN_VIEW, Params::new());
                            }
                        }
                    }),
                );
            }
        }

        fn cleanup(&self) {
            self.cleaned.set(self.cleaned.get() + 1);
        }
    }

    #[test]
    fn test_missing_root() {
        let dom = Rc::new(MemoryDom::without_root());
        let err = Router::new(dom, &RouterConfig::default()).err();
        assert_eq!(err, Some(RouterError::MissingRoot("root".into())));
    }

    #[test]
    fn test_navigate_updates_state_and_fragment() {
        let dom = Rc::new(MemoryDom::new());
        let router = router(&dom);

        router
            .navigate_to(DASHBOARD_VIEW, Params::new().with("who", "alice"))
            .unwrap();

        assert_eq!(router.current_view().as_deref(), Some(DASHBOARD_VIEW));
        assert_eq!(router.current_params().get_str("who"), Some("alice"));
        assert_eq!(dom.fragment(), DASHBOARD_VIEW);
        assert_eq!(title(&dom), "dashboard:alice");
    }

    #[test]
    fn test_unknown_view_leaves_everything_unchanged() {
        let dom = Rc::new(MemoryDom::new());
        let router = router(&dom);
        router.navigate_to(LOGIN_VIEW, Params::new()).unwrap();
        let before = router.state();
        let html = dom.inner_html(&dom.by_id("root").unwrap());

        let err = router.navigate_to("profile", Params::new()).unwrap_err();

        assert_eq!(err, RouterError::ViewNotFound("profile".into()));
        assert_eq!(router.state(), before);
        assert_eq!(dom.inner_html(&dom.by_id("root").unwrap()), html);
        assert_eq!(dom.fragment(), LOGIN_VIEW);
    }

    #[test]
    fn test_register_view_overwrites() {
        let dom = Rc::new(MemoryDom::new());
        let router = router(&dom);
        router.register_view(LOGIN_VIEW, page("login2"));
        router.navigate_to(LOGIN_VIEW, Params::new()).unwrap();
        assert_eq!(title(&dom), "login2:-");
    }

    #[tokio::test]
    async fn test_attach_and_cleanup_lifecycle() {
        let dom = Rc::new(MemoryDom::new());
        let router = router(&dom);
        let view = Counting::default();
        let attached = view.attached.clone();
        let cleaned = view.cleaned.clone();
        router.register("counting", view);

        router.navigate_to("counting", Params::new()).unwrap();
        router.navigate_to("counting", Params::new()).unwrap();
        assert_eq!(attached.get(), 2);
        assert_eq!(cleaned.get(), 1);

        assert!(dom.click_id("btn").await);
        assert_eq!(router.current_view().as_deref(), Some(LOGIN_VIEW));
        assert_eq!(cleaned.get(), 2);
    }

    #[test]
    fn test_init_uses_fragment_or_default() {
        let dom = Rc::new(MemoryDom::new().with_fragment("#dashboard"));
        router(&dom).init(None);
        assert_eq!(title(&dom), "dashboard:-");

        let dom = Rc::new(MemoryDom::new());
        let r = router(&dom);
        r.init(None);
        assert_eq!(r.current_view().as_deref(), Some(LOGIN_VIEW));

        let dom = Rc::new(MemoryDom::new().with_fragment("#nowhere"));
        let r = router(&dom);
        r.init(None);
        assert_eq!(r.current_view().as_deref(), Some(LOGIN_VIEW));
        assert_eq!(dom.fragment(), LOGIN_VIEW);
    }

    #[tokio::test]
    async fn test_fragment_change_navigates() {
        let dom = Rc::new(MemoryDom::new());
        let r = router(&dom);
        r.init(None);

        dom.change_fragment("dashboard").await;
        assert_eq!(r.current_view().as_deref(), Some(DASHBOARD_VIEW));

        dom.change_fragment("").await;
        assert_eq!(r.current_view().as_deref(), Some(LOGIN_VIEW));

        dom.change_fragment("nowhere").await;
        assert_eq!(r.current_view().as_deref(), Some(LOGIN_VIEW));
    }

    #[tokio::test]
    async fn test_auth_changes_force_navigation() {
        let dom = Rc::new(MemoryDom::new());
        let r = router(&dom);
        let identity = Rc::new(MemoryIdentity::new());
        r.init(Some(identity.clone()));
        assert_eq!(r.current_view().as_deref(), Some(LOGIN_VIEW));

        identity.create_account("alice@x.io", "secret1").await.unwrap();
        assert_eq!(r.current_view().as_deref(), Some(DASHBOARD_VIEW));
        let user: User = r.current_params().get("user").unwrap();
        assert_eq!(user.username, "alice");

        identity.sign_out().await.unwrap();
        assert_eq!(r.current_view().as_deref(), Some(LOGIN_VIEW));
    }

    #[tokio::test]
    async fn test_signed_in_user_on_reload_lands_on_dashboard() {
        let identity = Rc::new(MemoryIdentity::new());
        identity.create_account("bob@x.io", "secret1").await.unwrap();

        let dom = Rc::new(MemoryDom::new().with_fragment("dashboard"));
        let r = router(&dom);
        r.init(Some(identity.clone()));

        assert_eq!(r.current_view().as_deref(), Some(DASHBOARD_VIEW));
        let user: User = r.current_params().get("user").unwrap();
        assert_eq!(user.email, "bob@x.io");
    }

    #[test]
    fn test_router_does_not_keep_itself_alive() {
        let dom = Rc::new(MemoryDom::new());
        let r = router(&dom);
        r.init(None);
        let weak = r.downgrade();
        drop(r);
        assert!(weak.upgrade().is_none());
    }
}
