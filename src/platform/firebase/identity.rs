//! Identity Toolkit client
//!
//! Keeps the session (ID token, refresh token, expiry) in memory and
//! refreshes the ID token through the Secure Token API shortly before it
//! expires. Sessions are not persisted across page loads.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tracing::{debug, info};

use super::{identity_error, read_failure, TokenSource};
use crate::config::FirebaseConfig;
use crate::platform::{
    AuthListener, AuthStateHub, AuthUser, IdentityProfileUpdate, IdentityProvider, PlatformError,
    PlatformResult, Subscription,
};

/// Refresh this long before the token actually expires
const REFRESH_MARGIN_SECS: i64 = 60;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Session {
    user: AuthUser,
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
    return_secure_token: bool,
}

/// Shared shape of `signUp`, `signInWithPassword` and `update` responses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    display_name: Option<String>,
    #[serde(alias = "profilePicture")]
    photo_url: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

impl AccountResponse {
    fn user(&self) -> AuthUser {
        AuthUser {
            uid: self.local_id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone().filter(|n| !n.is_empty()),
            photo_url: self.photo_url.clone().filter(|p| !p.is_empty()),
        }
    }

    fn into_session(self, now: DateTime<Utc>) -> PlatformResult<Session> {
        let user = self.user();
        let id_token = self
            .id_token
            .ok_or_else(|| PlatformError::Malformed("response has no idToken".into()))?;
        let refresh_token = self
            .refresh_token
            .ok_or_else(|| PlatformError::Malformed("response has no refreshToken".into()))?;

        Ok(Session {
            user,
            id_token,
            refresh_token,
            expires_at: now + Duration::seconds(parse_expires_in(self.expires_in.as_deref())),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

fn parse_expires_in(value: Option<&str>) -> i64 {
    value
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
}

/// Identity provider backed by the Identity Toolkit REST API
pub struct FirebaseIdentity {
    client: Client,
    config: FirebaseConfig,
    session: RefCell<Option<Session>>,
    hub: AuthStateHub,
}

impl FirebaseIdentity {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            session: RefCell::new(None),
            hub: AuthStateHub::new(),
        }
    }

    fn accounts_url(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.config.identity_url.trim_end_matches('/'),
            method,
            urlencoding::encode(&self.config.api_key)
        )
    }

    fn token_url(&self) -> String {
        format!(
            "{}/token?key={}",
            self.config.token_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.api_key)
        )
    }

    async fn post_accounts<B: Serialize>(&self, method: &str, body: &B) -> PlatformResult<AccountResponse> {
        let response = self
            .client
            .post(self.accounts_url(method))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(read_failure(response, identity_error).await);
        }

        Ok(response.json().await?)
    }

    async fn password_call(&self, method: &str, email: &str, password: &str) -> PlatformResult<AuthUser> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let session = self
            .post_accounts(method, &request)
            .await?
            .into_session(Utc::now())?;
        let user = session.user.clone();

        *self.session.borrow_mut() = Some(session);
        self.hub.notify(Some(&user));
        Ok(user)
    }

    /// Exchange the refresh token for a new ID token when the current one
    /// is about to expire
    async fn refresh_if_needed(&self) -> PlatformResult<()> {
        let refresh_token = {
            let session = self.session.borrow();
            match session.as_ref() {
                Some(s) if s.needs_refresh(Utc::now()) => s.refresh_token.clone(),
                Some(_) => return Ok(()),
                None => return Err(PlatformError::NotSignedIn),
            }
        };

        debug!("Refreshing ID token");

        let response = self
            .client
            .post(self.token_url())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(read_failure(response, identity_error).await);
        }

        let token: TokenResponse = response.json().await?;

        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.id_token = token.id_token;
            session.refresh_token = token.refresh_token;
            session.expires_at =
                Utc::now() + Duration::seconds(parse_expires_in(token.expires_in.as_deref()));
        }

        Ok(())
    }
}

#[async_trait(?Send)]
impl IdentityProvider for FirebaseIdentity {
    async fn create_account(&self, email: &str, password: &str) -> PlatformResult<AuthUser> {
        let user = self.password_call("signUp", email, password).await?;
        info!(uid = %user.uid, "Account created");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> PlatformResult<AuthUser> {
        let user = self.password_call("signInWithPassword", email, password).await?;
        info!(uid = %user.uid, "Signed in");
        Ok(user)
    }

    async fn sign_out(&self) -> PlatformResult<()> {
        let had_session = self.session.borrow_mut().take().is_some();
        if had_session {
            self.hub.notify(None);
        }
        Ok(())
    }

    async fn update_profile(&self, update: &IdentityProfileUpdate) -> PlatformResult<AuthUser> {
        self.refresh_if_needed().await?;

        let id_token = self
            .session
            .borrow()
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or(PlatformError::NotSignedIn)?;

        let request = UpdateRequest {
            id_token: &id_token,
            display_name: update.display_name.as_deref(),
            photo_url: update.photo_url.as_deref(),
            return_secure_token: true,
        };
        let response = self.post_accounts("update", &request).await?;

        let mut session = self.session.borrow_mut();
        let session = session.as_mut().ok_or(PlatformError::NotSignedIn)?;

        let mut user = response.user();
        if user.email.is_empty() {
            user.email = session.user.email.clone();
        }
        session.user = user.clone();
        if let (Some(id_token), Some(refresh_token)) = (response.id_token, response.refresh_token) {
            session.id_token = id_token;
            session.refresh_token = refresh_token;
            session.expires_at =
                Utc::now() + Duration::seconds(parse_expires_in(response.expires_in.as_deref()));
        }

        Ok(user)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription {
        let current = self.current_user();
        self.hub.subscribe(listener, current.as_ref())
    }
}

#[async_trait(?Send)]
impl TokenSource for FirebaseIdentity {
    async fn id_token(&self) -> PlatformResult<Option<String>> {
        if self.session.borrow().is_none() {
            return Ok(None);
        }
        self.refresh_if_needed().await?;
        Ok(self.session.borrow().as_ref().map(|s| s.id_token.clone()))
    }
}
