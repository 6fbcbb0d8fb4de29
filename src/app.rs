//! Application wiring
//!
//! Builds the platform adapters from configuration, the two services on top
//! of them, and a router with the login and dashboard views registered.

use std::rc::Rc;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, BackendKind, ConfigError, FirebaseConfig};
use crate::dom::Dom;
use crate::platform::firebase::{FirebaseIdentity, FirestoreStore, TokenSource};
use crate::platform::memory::{MemoryIdentity, MemoryStore};
use crate::platform::{DocumentStore, IdentityProvider};
use crate::router::{Router, RouterError, DASHBOARD_VIEW, LOGIN_VIEW};
use crate::services::{AuthService, UserService};
use crate::views::{ChatActions, DashboardView, LoginView, PendingChatActions};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// The identity provider and document store the services run against
#[derive(Clone)]
pub struct Platform {
    pub identity: Rc<dyn IdentityProvider>,
    pub store: Rc<dyn DocumentStore>,
}

impl Platform {
    pub fn in_memory() -> Self {
        Self {
            identity: Rc::new(MemoryIdentity::new()),
            store: Rc::new(MemoryStore::new()),
        }
    }

    /// Hosted adapters; the store authenticates with the identity session
    pub fn firebase(config: &FirebaseConfig) -> Self {
        let identity = Rc::new(FirebaseIdentity::new(config.clone()));
        let tokens: Rc<dyn TokenSource> = identity.clone();
        Self {
            identity,
            store: Rc::new(FirestoreStore::new(config.clone(), tokens)),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        let platform = match config.backend.kind {
            BackendKind::Firebase => {
                info!(project = %config.firebase.project_id, "Using hosted backend");
                Self::firebase(&config.firebase)
            }
            BackendKind::Memory => {
                info!("Using in-memory backend");
                Self::in_memory()
            }
        };
        Ok(platform)
    }
}

/// A running client
pub struct App<D: Dom> {
    router: Router<D>,
    auth: Rc<AuthService>,
    users: Rc<UserService>,
}

impl<D: Dom> App<D> {
    /// Wire everything and show the first view
    pub fn start(dom: Rc<D>, config: &AppConfig, platform: Platform) -> Result<Self, AppError> {
        Self::start_with_actions(dom, config, platform, Rc::new(PendingChatActions))
    }

    pub fn start_with_actions(
        dom: Rc<D>,
        config: &AppConfig,
        platform: Platform,
        actions: Rc<dyn ChatActions>,
    ) -> Result<Self, AppError> {
        let users = Rc::new(UserService::new(platform.store));
        let auth = Rc::new(AuthService::new(
            Rc::clone(&platform.identity),
            Rc::clone(&users),
        ));

        let router = Router::new(dom, &config.router)?;
        router.register(
            LOGIN_VIEW,
            LoginView::new(Rc::clone(&auth), config.auth.clone()),
        );
        router.register(
            DASHBOARD_VIEW,
            DashboardView::new(
                Rc::clone(&auth),
                Rc::clone(&users),
                actions,
                config.auth.sign_out_on_logout,
            ),
        );

        router.init(Some(platform.identity));
        info!("Chat client started");

        Ok(Self {
            router,
            auth,
            users,
        })
    }

    pub fn router(&self) -> &Router<D> {
        &self.router
    }

    pub fn auth(&self) -> &Rc<AuthService> {
        &self.auth
    }

    pub fn users(&self) -> &Rc<UserService> {
        &self.users
    }
}
