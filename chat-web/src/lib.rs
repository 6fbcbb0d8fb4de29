//! Chat App browser shell
//!
//! Loads the embedded configuration, installs console logging, and starts
//! the client against the page's `#root` element.

pub mod dom;
pub mod logging;

use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use chat_client::{App, AppConfig, Platform};
use dom::WebDom;

/// Configuration compiled into the bundle
const EMBEDDED_CONFIG: &str = include_str!("../chat.toml");

thread_local! {
    // listeners only hold weak router handles; this keeps the app alive
    static APP: RefCell<Option<App<WebDom>>> = const { RefCell::new(None) };
}

/// Overrides captured from the build environment
fn build_override(key: &str) -> Option<String> {
    let value = match key {
        "CHAT_BACKEND" => option_env!("CHAT_BACKEND"),
        "CHAT_FIREBASE_API_KEY" => option_env!("CHAT_FIREBASE_API_KEY"),
        "CHAT_FIREBASE_AUTH_DOMAIN" => option_env!("CHAT_FIREBASE_AUTH_DOMAIN"),
        "CHAT_FIREBASE_PROJECT_ID" => option_env!("CHAT_FIREBASE_PROJECT_ID"),
        "CHAT_FIREBASE_APP_ID" => option_env!("CHAT_FIREBASE_APP_ID"),
        "CHAT_LOG_LEVEL" => option_env!("CHAT_LOG_LEVEL"),
        "CHAT_SIGN_OUT_ON_LOGOUT" => option_env!("CHAT_SIGN_OUT_ON_LOGOUT"),
        _ => None,
    };
    value.map(String::from)
}

pub fn load_config() -> Result<AppConfig, Box<dyn Error>> {
    let mut config = AppConfig::from_toml_str(EMBEDDED_CONFIG)?;
    config.apply_overrides(build_override);
    Ok(config)
}

/// Start the client. Calling it again replaces the running app.
pub fn start() -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    logging::init(&config.logging.level);

    tracing::info!("Chat App v{}", env!("CARGO_PKG_VERSION"));

    let dom = WebDom::new().ok_or("no browser window or document")?;
    let platform = Platform::from_config(&config)?;
    let app = App::start(Rc::new(dom), &config, platform)?;

    APP.with(|slot| *slot.borrow_mut() = Some(app));
    Ok(())
}
