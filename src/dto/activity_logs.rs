use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{accounts::Model as AccountModel, activity_logs::Model as ActivityModel};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogDto {
    pub id: Uuid,
    pub action: String,
    pub description: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl From<(ActivityModel, Option<AccountModel>)> for ActivityLogDto {
    fn from((log, actor): (ActivityModel, Option<AccountModel>)) -> Self {
        let (user_name, user_email) = match actor {
            Some(actor) => (Some(actor.name), Some(actor.email)),
            None => (None, None),
        };
        Self {
            id: log.id,
            action: log.action,
            description: log.description,
            entity_type: log.entity_type,
            entity_id: log.entity_id,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            created_at: log.created_at.with_timezone(&Utc),
            user_name,
            user_email,
        }
    }
}
