use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, Set};
use uuid::Uuid;

use crate::{
    entity::activity_logs::{ActiveModel as ActivityActive, Model as ActivityModel},
    error::AppResult,
    middleware::auth::AuthUser,
};

/// Client details captured from the incoming request for the activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        // First hop of X-Forwarded-For is the original client.
        let ip_address = header("x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .or_else(|| header("x-real-ip"))
            .map(str::to_string);

        Self {
            ip_address,
            user_agent: header("user-agent").map(str::to_string),
        }
    }
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Who performed an action and from where.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub actor_id: Option<Uuid>,
    pub meta: RequestMeta,
}

impl AuditContext {
    pub fn new(actor_id: Option<Uuid>, meta: RequestMeta) -> Self {
        Self { actor_id, meta }
    }

    /// Context for a request made by an authenticated account.
    pub fn for_user(user: &AuthUser, meta: RequestMeta) -> Self {
        Self::new(Some(user.user_id), meta)
    }

    /// Context for work that is not triggered by a request (seeding, jobs).
    pub fn system() -> Self {
        Self::default()
    }

    /// Same request metadata, attributed to another account.
    pub fn acting_as(&self, actor_id: Uuid) -> Self {
        Self {
            actor_id: Some(actor_id),
            meta: self.meta.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub action: &'static str,
    pub description: String,
    pub entity_type: Option<&'static str>,
    pub entity_id: Option<Uuid>,
}

impl NewActivity {
    pub fn on(
        action: &'static str,
        description: impl Into<String>,
        entity_type: &'static str,
        entity_id: Uuid,
    ) -> Self {
        Self {
            action,
            description: description.into(),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
        }
    }
}

/// Append one activity log row on `conn`.
///
/// Callers pass their open transaction so a failed log write rolls back the
/// change it describes.
pub async fn log_activity<C>(
    conn: &C,
    ctx: &AuditContext,
    activity: NewActivity,
) -> AppResult<ActivityModel>
where
    C: ConnectionTrait,
{
    let row = ActivityActive {
        id: Set(Uuid::new_v4()),
        account_id: Set(ctx.actor_id),
        action: Set(activity.action.to_string()),
        description: Set(activity.description),
        entity_type: Set(activity.entity_type.map(str::to_string)),
        entity_id: Set(activity.entity_id),
        ip_address: Set(ctx.meta.ip_address.clone()),
        user_agent: Set(ctx.meta.user_agent.clone()),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    tracing::debug!(action = %row.action, entity_id = ?row.entity_id, "activity logged");
    Ok(row)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));

        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn falls_back_to_real_ip_and_tolerates_missing_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("10.0.0.9"));
        assert_eq!(meta.user_agent, None);

        assert_eq!(RequestMeta::from_headers(&HeaderMap::new()), RequestMeta::default());
    }

    #[test]
    fn acting_as_keeps_request_metadata() {
        let ctx = AuditContext::new(
            None,
            RequestMeta {
                ip_address: Some("1.2.3.4".into()),
                user_agent: None,
            },
        );
        let id = Uuid::new_v4();
        let acting = ctx.acting_as(id);
        assert_eq!(acting.actor_id, Some(id));
        assert_eq!(acting.meta, ctx.meta);
    }
}
