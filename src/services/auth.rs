//! Auth service
//!
//! Account operations on the identity provider, mirrored into the user's
//! profile document (presence and timestamps).

use std::rc::Rc;
use tracing::{info, warn};

use super::{AuthError, NewProfile, UserService, DEFAULT_BIO};
use crate::models::UserStatus;
use crate::platform::{AuthUser, IdentityProfileUpdate, IdentityProvider};

pub type AuthResult<T> = Result<T, AuthError>;

/// Generated avatar for a username
pub fn avatar_url(username: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random",
        urlencoding::encode(username)
    )
}

pub struct AuthService {
    identity: Rc<dyn IdentityProvider>,
    users: Rc<UserService>,
}

impl AuthService {
    pub fn new(identity: Rc<dyn IdentityProvider>, users: Rc<UserService>) -> Self {
        Self { identity, users }
    }

    pub fn identity(&self) -> &Rc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.identity.current_user()
    }

    /// Create the account, set its display name and avatar, then write the
    /// profile document
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> AuthResult<AuthUser> {
        let account = self
            .identity
            .create_account(email, password)
            .await
            .map_err(AuthError::from_registration)?;

        let photo_url = avatar_url(username);
        let user = self
            .identity
            .update_profile(&IdentityProfileUpdate {
                display_name: Some(username.to_string()),
                photo_url: Some(photo_url.clone()),
            })
            .await
            .map_err(AuthError::from_registration)?;

        self.users
            .create_user_profile(NewProfile {
                uid: account.uid.clone(),
                username: username.to_string(),
                email: email.to_string(),
                photo_url,
                bio: DEFAULT_BIO.to_string(),
                status: UserStatus::Online,
            })
            .await?;

        info!(uid = %user.uid, "Registered user {}", username);
        Ok(user)
    }

    /// Sign in and mark the profile online
    pub async fn login_user(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let user = self
            .identity
            .sign_in(email, password)
            .await
            .map_err(AuthError::from_login)?;

        if let Err(e) = self.users.update_user_status(&user.uid, UserStatus::Online).await {
            warn!(uid = %user.uid, "Could not mark user online: {}", e);
        }

        info!(uid = %user.uid, "User logged in");
        Ok(user)
    }

    /// Mark the profile offline, then end the session
    pub async fn logout_user(&self) -> AuthResult<()> {
        if let Some(user) = self.identity.current_user() {
            if let Err(e) = self.users.update_user_status(&user.uid, UserStatus::Offline).await {
                warn!(uid = %user.uid, "Could not mark user offline: {}", e);
            }
        }

        self.identity
            .sign_out()
            .await
            .map_err(AuthError::from_platform)?;

        info!("User logged out");
        Ok(())
    }
}
