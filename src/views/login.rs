//! Login / Register View
//!
//! One form serving both modes. The active mode lives in the toggle
//! button's `data-mode` attribute, so the rendered DOM is the only place
//! that knows it.

use std::rc::Rc;
use tracing::{debug, error, info};

use crate::config::AuthConfig;
use crate::dom::{handler, Dom, EventKind};
use crate::markup::{el, Element, Markup};
use crate::models::{
    is_valid_email, is_valid_password, is_valid_username_charset, is_valid_username_length, User,
    USERNAME_MAX_LEN, USERNAME_MIN_LEN,
};
use crate::router::{Params, Router, View, WeakRouter, DASHBOARD_VIEW};
use crate::services::AuthService;

pub const AUTH_TITLE_ID: &str = "auth-title";
pub const AUTH_FORM_ID: &str = "auth-form";
pub const USERNAME_FIELD_ID: &str = "username-field";
pub const USERNAME_ID: &str = "username";
pub const EMAIL_ID: &str = "email";
pub const PASSWORD_ID: &str = "password";
pub const SUBMIT_ID: &str = "auth-submit-btn";
pub const TOGGLE_TEXT_ID: &str = "auth-toggle-text";
pub const TOGGLE_ID: &str = "auth-toggle-btn";
pub const ERROR_ID: &str = "auth-error";
pub const SUCCESS_ID: &str = "auth-success";

const HIDDEN_CLASS: &str = "hidden";
const PROCESSING_LABEL: &str = "Processing...";

/// Which form the login view is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Login => "login",
            AuthMode::Register => "register",
        }
    }

    /// Anything other than "register" reads as login
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("register") => AuthMode::Register,
            _ => AuthMode::Login,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AuthMode::Login => "Welcome Back",
            AuthMode::Register => "Create Account",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            AuthMode::Login => "Login",
            AuthMode::Register => "Register",
        }
    }

    pub fn toggle_prompt(&self) -> &'static str {
        match self {
            AuthMode::Login => "Don't have an account?",
            AuthMode::Register => "Already have an account?",
        }
    }

    /// Label of the control that switches to the other mode
    pub fn toggle_label(&self) -> &'static str {
        self.toggled().submit_label()
    }

    fn password_placeholder(&self) -> &'static str {
        match self {
            AuthMode::Login => "Enter your password",
            AuthMode::Register => "Create a password",
        }
    }

    fn password_autocomplete(&self) -> &'static str {
        match self {
            AuthMode::Login => "current-password",
            AuthMode::Register => "new-password",
        }
    }
}

fn labelled(id: &str, label: &str, input: Element) -> Element {
    el("div")
        .child(el("label").attr("for", id).class("form-label").text(label))
        .child(input)
}

fn banner(id: &str, class: &str) -> Element {
    el("div")
        .id(id)
        .class("auth-message")
        .class(class)
        .attr("style", "display: none;")
}

/// Render the login form. `params.mode` selects "login" (default) or
/// "register".
pub fn render_login_view(params: &Params) -> Markup {
    let mode = AuthMode::parse(params.get_str("mode"));
    let is_login = mode == AuthMode::Login;

    let form = el("form")
        .id(AUTH_FORM_ID)
        .class("auth-form")
        .child(
            labelled(
                USERNAME_ID,
                "Username",
                el("input")
                    .attr("type", "text")
                    .id(USERNAME_ID)
                    .attr("name", "username")
                    .attr("placeholder", "Choose a username")
                    .attr("autocomplete", "username")
                    .flag_if(is_login, "disabled"),
            )
            .id(USERNAME_FIELD_ID)
            .class_if(is_login, HIDDEN_CLASS),
        )
        .child(labelled(
            EMAIL_ID,
            "Email",
            el("input")
                .attr("type", "email")
                .id(EMAIL_ID)
                .attr("name", "email")
                .attr("placeholder", "name@example.com")
                .attr("autocomplete", "email")
                .flag("required"),
        ))
        .child(labelled(
            PASSWORD_ID,
            "Password",
            el("input")
                .attr("type", "password")
                .id(PASSWORD_ID)
                .attr("name", "password")
                .attr("placeholder", mode.password_placeholder())
                .attr("autocomplete", mode.password_autocomplete())
                .flag("required")
                .attr("minlength", "6"),
        ))
        .child(
            el("button")
                .attr("type", "submit")
                .id(SUBMIT_ID)
                .class("btn-primary")
                .text(mode.submit_label()),
        );

    let toggle = el("div")
        .class("auth-toggle")
        .child(el("span").id(TOGGLE_TEXT_ID).text(mode.toggle_prompt()))
        .child(
            el("button")
                .attr("type", "button")
                .id(TOGGLE_ID)
                .class("btn-ghost")
                .attr("data-mode", mode.as_str())
                .text(mode.toggle_label()),
        );

    el("div")
        .class("auth-container")
        .child(
            el("div")
                .class("card auth-card")
                .child(el("h1").class("auth-title").id(AUTH_TITLE_ID).text(mode.title()))
                .child(form)
                .child(toggle)
                .child(banner(ERROR_ID, "auth-error"))
                .child(banner(SUCCESS_ID, "auth-success")),
        )
        .into()
}

/// Mode recorded on the toggle control; login when the control is absent
pub fn current_auth_mode<D: Dom>(dom: &D) -> AuthMode {
    let mode = dom.by_id(TOGGLE_ID).and_then(|toggle| dom.data(&toggle, "mode"));
    AuthMode::parse(mode.as_deref())
}

fn apply_auth_mode<D: Dom>(dom: &D, mode: AuthMode) {
    let is_login = mode == AuthMode::Login;

    if let Some(title) = dom.by_id(AUTH_TITLE_ID) {
        dom.set_text(&title, mode.title());
    }
    if let Some(field) = dom.by_id(USERNAME_FIELD_ID) {
        if is_login {
            dom.add_class(&field, HIDDEN_CLASS);
        } else {
            dom.remove_class(&field, HIDDEN_CLASS);
        }
    }
    if let Some(username) = dom.by_id(USERNAME_ID) {
        dom.set_disabled(&username, is_login);
    }
    if let Some(password) = dom.by_id(PASSWORD_ID) {
        dom.set_attr(&password, "placeholder", mode.password_placeholder());
        dom.set_attr(&password, "autocomplete", mode.password_autocomplete());
    }
    if let Some(submit) = dom.by_id(SUBMIT_ID) {
        dom.set_text(&submit, mode.submit_label());
    }
    if let Some(prompt) = dom.by_id(TOGGLE_TEXT_ID) {
        dom.set_text(&prompt, mode.toggle_prompt());
    }
    if let Some(toggle) = dom.by_id(TOGGLE_ID) {
        dom.set_text(&toggle, mode.toggle_label());
        dom.set_data(&toggle, "mode", mode.as_str());
    }
}

/// Switch the form to the other mode. Returns the new mode, or `None`
/// when the form is not mounted.
pub fn toggle_auth_mode<D: Dom>(dom: &D) -> Option<AuthMode> {
    dom.by_id(TOGGLE_ID)?;
    let mode = current_auth_mode(dom).toggled();
    apply_auth_mode(dom, mode);
    clear_auth_messages(dom);
    debug!("Auth mode: {}", mode.as_str());
    Some(mode)
}

/// Show a banner and hide it after `hide_after_ms`. A newer message
/// restarts the countdown.
fn show_banner<D: Dom>(dom: &Rc<D>, id: &str, message: &str, hide_after_ms: u32) {
    let Some(node) = dom.by_id(id) else {
        return;
    };

    let seq = dom
        .data(&node, "seq")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    let seq = seq.to_string();

    dom.set_text(&node, message);
    dom.set_style(&node, "display", "block");
    dom.set_data(&node, "seq", &seq);

    let dom_for_timer = Rc::clone(dom);
    dom.set_timeout(
        hide_after_ms,
        Box::new(move || {
            if dom_for_timer.data(&node, "seq").as_deref() == Some(seq.as_str()) {
                dom_for_timer.set_style(&node, "display", "none");
            }
        }),
    );
}

pub fn show_auth_error<D: Dom>(dom: &Rc<D>, message: &str, hide_after_ms: u32) {
    show_banner(dom, ERROR_ID, message, hide_after_ms);
}

pub fn show_auth_success<D: Dom>(dom: &Rc<D>, message: &str, hide_after_ms: u32) {
    show_banner(dom, SUCCESS_ID, message, hide_after_ms);
}

pub fn clear_auth_messages<D: Dom>(dom: &D) {
    for id in [ERROR_ID, SUCCESS_ID] {
        if let Some(node) = dom.by_id(id) {
            dom.set_style(&node, "display", "none");
            dom.set_text(&node, "");
        }
    }
}

/// Values typed into the auth form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthFormData {
    pub email: String,
    pub password: String,
    pub username: String,
}

pub fn get_auth_form_data<D: Dom>(dom: &D) -> AuthFormData {
    let value = |id: &str| dom.by_id(id).map(|n| dom.value(&n)).unwrap_or_default();
    AuthFormData {
        email: value(EMAIL_ID),
        password: value(PASSWORD_ID),
        username: value(USERNAME_ID),
    }
}

/// Empty the inputs and hide both banners
pub fn reset_auth_form<D: Dom>(dom: &D) {
    for id in [USERNAME_ID, EMAIL_ID, PASSWORD_ID] {
        if let Some(node) = dom.by_id(id) {
            dom.set_value(&node, "");
        }
    }
    clear_auth_messages(dom);
}

/// Outcome of client-side validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: Vec<String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_auth_form(data: &AuthFormData, mode: AuthMode) -> Validation {
    let mut errors = Vec::new();

    if data.email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !is_valid_email(&data.email) {
        errors.push("Please enter a valid email address".to_string());
    }

    if data.password.is_empty() {
        errors.push("Password is required".to_string());
    } else if !is_valid_password(&data.password) {
        errors.push("Password must be at least 6 characters".to_string());
    }

    if mode == AuthMode::Register {
        if data.username.is_empty() {
            errors.push("Username is required".to_string());
        } else if !is_valid_username_length(&data.username) {
            if data.username.chars().count() < USERNAME_MIN_LEN {
                errors.push(format!("Username must be at least {} characters", USERNAME_MIN_LEN));
            } else {
                errors.push(format!("Username must be at most {} characters", USERNAME_MAX_LEN));
            }
        } else if !is_valid_username_charset(&data.username) {
            errors.push("Username can only contain letters, numbers, and underscores".to_string());
        }
    }

    Validation { errors }
}

/// The login view with its toggle and submit listeners
pub struct LoginView {
    auth: Rc<AuthService>,
    settings: AuthConfig,
}

impl LoginView {
    pub fn new(auth: Rc<AuthService>, settings: AuthConfig) -> Self {
        Self { auth, settings }
    }
}

impl<D: Dom> View<D> for LoginView {
    fn render(&self, params: &Params) -> Markup {
        render_login_view(params)
    }

    fn attach(&self, router: &Router<D>) {
        let dom = router.dom();

        if let Some(toggle) = dom.by_id(TOGGLE_ID) {
            let weak = router.downgrade();
            dom.on(
                &toggle,
                EventKind::Click,
                handler(move || {
                    if let Some(router) = weak.upgrade() {
                        toggle_auth_mode(&**router.dom());
                    }
                    async {}
                }),
            );
        }

        if let Some(form) = dom.by_id(AUTH_FORM_ID) {
            let weak = router.downgrade();
            let auth = Rc::clone(&self.auth);
            let settings = self.settings.clone();
            dom.on(
                &form,
                EventKind::Submit,
                handler(move || submit(weak.clone(), Rc::clone(&auth), settings.clone())),
            );
        }

        if let Some(notice) = router.current_params().get_str("notice") {
            show_auth_success(dom, notice, self.settings.success_banner_ms);
        }
    }
}

async fn submit<D: Dom>(router: WeakRouter<D>, auth: Rc<AuthService>, settings: AuthConfig) {
    let Some(router) = router.upgrade() else {
        return;
    };
    let dom = Rc::clone(router.dom());

    let submit_btn = dom.by_id(SUBMIT_ID);
    if submit_btn.as_ref().is_some_and(|btn| dom.is_disabled(btn)) {
        debug!("Ignoring submit while a request is in flight");
        return;
    }

    let mode = current_auth_mode(&*dom);
    let data = get_auth_form_data(&*dom);
    let validation = validate_auth_form(&data, mode);
    if !validation.is_valid() {
        dom.alert(&validation.errors.join("\n"));
        return;
    }

    clear_auth_messages(&*dom);
    let original_label = submit_btn.as_ref().map(|btn| dom.text(btn));
    if let Some(btn) = &submit_btn {
        dom.set_text(btn, PROCESSING_LABEL);
        dom.set_disabled(btn, true);
    }

    let result = match mode {
        AuthMode::Login => {
            info!("Attempting login");
            auth.login_user(&data.email, &data.password).await
        }
        AuthMode::Register => {
            info!("Attempting registration");
            auth.register_user(&data.email, &data.password, &data.username)
                .await
        }
    };

    match result {
        Ok(user) => {
            info!(uid = %user.uid, "Auth successful");
            let params = Params::new().with("user", User::from_identity(&user));
            let _ = router.navigate_to(DASHBOARD_VIEW, params);
        }
        Err(e) => {
            if let (Some(btn), Some(label)) = (&submit_btn, &original_label) {
                dom.set_text(btn, label);
                dom.set_disabled(btn, false);
            }

            if e.is_rejection() {
                debug!("Auth rejected: {}", e);
                show_auth_error(&dom, &e.user_message(), settings.error_banner_ms);
            } else {
                error!("Unexpected auth error: {}", e);
                dom.alert(&format!("Auth failed: {}", e.user_message()));
            }
        }
    }
}
