//! # Chat App
//!
//! Core of a single-page chat client: a fragment-based router, the login
//! and dashboard views, and the auth and user-profile services that sit on
//! an external identity platform and document store.
//!
//! The core never touches a real browser. Views render to a [`markup`] tree
//! and bind listeners through the [`dom::Dom`] trait; the `chat-web` crate
//! implements that trait over `web-sys`, and [`dom::MemoryDom`] implements it
//! in-process for tests.
//!
//! ## Modules
//!
//! - [`router`]: view registry, navigation and the fragment/auth listeners
//! - [`views`]: login/register form and dashboard
//! - [`services`]: registration, login, logout and profile documents
//! - [`platform`]: identity and document-store ports with hosted and
//!   in-memory adapters
//! - [`config`]: TOML configuration with build-time overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use chat_client::{App, AppConfig, MemoryDom, Platform};
//!
//! let config = AppConfig::from_toml_str("[backend]\nkind = \"memory\"").unwrap();
//! let platform = Platform::from_config(&config).unwrap();
//! let app = App::start(Rc::new(MemoryDom::new()), &config, platform).unwrap();
//!
//! assert_eq!(app.router().current_view().as_deref(), Some("login"));
//! ```

pub mod app;
pub mod config;
pub mod dom;
pub mod markup;
pub mod models;
pub mod platform;
pub mod router;
pub mod services;
pub mod views;

// Re-export top-level types for convenience
pub use app::{App, AppError, Platform};

pub use config::{
    generate_default_config, AppConfig, AuthConfig, BackendKind, ConfigError, FirebaseConfig,
    LoggingConfig, RouterConfig,
};

pub use dom::{handler, Dom, EventKind, Handler, MemoryDom};

pub use markup::{el, Markup};

pub use models::{User, UserStatus};

pub use platform::{
    AuthUser, DocPath, DocumentStore, ErrorCode, FieldValue, Fields, IdentityProvider,
    PlatformError, PlatformResult,
};

pub use router::{Params, Router, RouterError, View, DASHBOARD_VIEW, LOGIN_VIEW};

pub use services::{AuthError, AuthService, UserService, UserServiceError};

pub use views::{ChatActions, DashboardView, LoginView, PendingChatActions, Section};
