//! Session storage for logged-in principals.
//!
//! The cookie carries an opaque session id; the principal lives in the store.
//! `SessionRegistry` enforces one live session per account: each login gets a
//! fresh login id and older sessions of the same account stop validating.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_sessions::{
    Expiry, Session, SessionManagerLayer, SessionStore,
    cookie::{SameSite, time::Duration},
};
use uuid::Uuid;

use crate::models::Role;

use super::auth::AuthUser;

pub const SESSION_COOKIE_NAME: &str = "JSESSIONID";

pub mod keys {
    pub const PRINCIPAL: &str = "principal";
}

/// What the session store keeps for an authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub login_id: Uuid,
}

impl SessionPrincipal {
    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            user_id: self.account_id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Current login id per account.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    logins: Arc<RwLock<HashMap<Uuid, Uuid>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new login for `account_id`, superseding any earlier one.
    pub async fn begin(&self, account_id: Uuid) -> Uuid {
        let login_id = Uuid::new_v4();
        let previous = self.logins.write().await.insert(account_id, login_id);
        if previous.is_some() {
            tracing::info!(%account_id, "previous session superseded by new login");
        }
        login_id
    }

    pub async fn is_current(&self, account_id: Uuid, login_id: Uuid) -> bool {
        self.logins
            .read()
            .await
            .get(&account_id)
            .is_some_and(|current| *current == login_id)
    }

    /// Forget `login_id` if it is still the current login of the account.
    pub async fn end(&self, account_id: Uuid, login_id: Uuid) {
        let mut logins = self.logins.write().await;
        if logins.get(&account_id) == Some(&login_id) {
            logins.remove(&account_id);
        }
    }

    /// Invalidate whatever session the account holds.
    pub async fn revoke(&self, account_id: Uuid) -> bool {
        self.logins.write().await.remove(&account_id).is_some()
    }
}

/// Session layer with the cookie settings shared by every store.
pub fn session_layer<S>(store: S, secure_cookie: bool, idle_minutes: i64) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(idle_minutes)))
        .with_secure(secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Bind `user` to the session after a successful login.
pub async fn start_session(
    session: &Session,
    registry: &SessionRegistry,
    user: &AuthUser,
) -> Result<(), tower_sessions::session::Error> {
    // New id on privilege change.
    session.cycle_id().await?;
    let login_id = registry.begin(user.user_id).await;
    let principal = SessionPrincipal {
        account_id: user.user_id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        login_id,
    };
    session.insert(keys::PRINCIPAL, principal).await
}

/// The session's principal, if it is still the account's current login.
pub async fn current_principal(
    session: &Session,
    registry: &SessionRegistry,
) -> Option<SessionPrincipal> {
    let principal: SessionPrincipal = session.get(keys::PRINCIPAL).await.ok().flatten()?;
    if registry
        .is_current(principal.account_id, principal.login_id)
        .await
    {
        Some(principal)
    } else {
        tracing::debug!(account_id = %principal.account_id, "stale session rejected");
        None
    }
}

/// Drop the session and its registry entry.
pub async fn end_session(
    session: &Session,
    registry: &SessionRegistry,
) -> Result<Option<SessionPrincipal>, tower_sessions::session::Error> {
    let principal: Option<SessionPrincipal> = session.get(keys::PRINCIPAL).await?;
    if let Some(principal) = &principal {
        registry.end(principal.account_id, principal.login_id).await;
    }
    session.flush().await?;
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_login_supersedes_the_previous_one() {
        let registry = SessionRegistry::new();
        let account = Uuid::new_v4();

        let first = registry.begin(account).await;
        assert!(registry.is_current(account, first).await);

        let second = registry.begin(account).await;
        assert!(!registry.is_current(account, first).await);
        assert!(registry.is_current(account, second).await);
    }

    #[tokio::test]
    async fn ending_a_stale_login_keeps_the_current_one() {
        let registry = SessionRegistry::new();
        let account = Uuid::new_v4();
        let stale = registry.begin(account).await;
        let current = registry.begin(account).await;

        registry.end(account, stale).await;
        assert!(registry.is_current(account, current).await);

        registry.end(account, current).await;
        assert!(!registry.is_current(account, current).await);
    }

    #[tokio::test]
    async fn revoke_reports_whether_a_session_existed() {
        let registry = SessionRegistry::new();
        let account = Uuid::new_v4();
        assert!(!registry.revoke(account).await);

        let login = registry.begin(account).await;
        assert!(registry.revoke(account).await);
        assert!(!registry.is_current(account, login).await);
    }

    #[tokio::test]
    async fn logins_are_tracked_per_account() {
        let registry = SessionRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let login_a = registry.begin(a).await;
        let login_b = registry.begin(b).await;
        assert!(registry.is_current(a, login_a).await);
        assert!(registry.is_current(b, login_b).await);
        assert!(!registry.is_current(a, login_b).await);
    }
}
