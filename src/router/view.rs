//! View trait

use tracing::debug;

use super::{Params, Router};
use crate::dom::Dom;
use crate::markup::Markup;

/// A routable screen.
///
/// `render` must be pure: no platform calls, no DOM access. `attach` runs
/// after the rendered markup is mounted and the router state is updated, so
/// it can read `router.current_params()`. It may run many times against
/// fresh content and must tolerate missing elements.
pub trait View<D: Dom> {
    fn render(&self, params: &Params) -> Markup;

    fn attach(&self, _router: &Router<D>) {
        debug!("View has no listeners to attach");
    }

    /// Called when the router navigates away from this view
    fn cleanup(&self) {}
}

/// Render-only view built from a function
pub struct RenderFn<F>(pub F);

impl<D, F> View<D> for RenderFn<F>
where
    D: Dom,
    F: Fn(&Params) -> Markup,
{
    fn render(&self, params: &Params) -> Markup {
        (self.0)(params)
    }
}
