//! Views
//!
//! The login/register form and the dashboard. Render functions are pure;
//! the view types bind listeners after the router mounts them.

mod actions;
mod dashboard;
mod login;

pub use actions::{CapabilityError, ChatActions, PendingChatActions};
pub use dashboard::{
    render_dashboard_view, render_section_content, update_dashboard_section,
    update_presence_text, update_profile_panel, DashboardView, Section, CREATE_ROOM_ID,
    FRIEND_ITEM_CLASS, LOGGED_OUT_NOTICE, LOGOUT_ID, MAIN_CONTENT_CLASS, NAV_ITEM_CLASS,
    ROOM_ITEM_CLASS, SAVE_SETTINGS_ID, SECTION_TITLE_ID, SETTINGS_BIO_ID, SETTINGS_EMAIL_ID,
    SETTINGS_FORM_ID, SETTINGS_STATUS_ID, SETTINGS_USERNAME_ID,
};
pub use login::{
    clear_auth_messages, current_auth_mode, get_auth_form_data, render_login_view,
    reset_auth_form, show_auth_error, show_auth_success, toggle_auth_mode, validate_auth_form,
    AuthFormData, AuthMode, LoginView, Validation, AUTH_FORM_ID, AUTH_TITLE_ID, EMAIL_ID,
    ERROR_ID, PASSWORD_ID, SUBMIT_ID, SUCCESS_ID, TOGGLE_ID, TOGGLE_TEXT_ID, USERNAME_FIELD_ID,
    USERNAME_ID,
};
