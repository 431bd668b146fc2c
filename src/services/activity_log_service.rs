use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    dto::activity_logs::ActivityLogDto,
    entity::{
        accounts::Entity as Accounts,
        activity_logs::{Column as ActivityCol, Entity as ActivityLogs},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::account_service::find_account,
    state::AppState,
};

/// Newest entries first.
pub async fn list_activity_logs(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<ActivityLogDto>>> {
    ensure_admin(user)?;
    fetch_page(state, None, pagination).await
}

/// Entries performed by one account. Unknown accounts are a 404, not an
/// empty page.
pub async fn list_activity_logs_for_account(
    state: &AppState,
    user: &AuthUser,
    account_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<ActivityLogDto>>> {
    ensure_admin(user)?;
    find_account(&state.orm, account_id).await?;
    fetch_page(state, Some(account_id), pagination).await
}

async fn fetch_page(
    state: &AppState,
    account_id: Option<Uuid>,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<ActivityLogDto>>> {
    let (page, limit, offset) = pagination.normalize();

    let mut finder = ActivityLogs::find();
    if let Some(account_id) = account_id {
        finder = finder.filter(ActivityCol::AccountId.eq(account_id));
    }
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .find_also_related(Accounts)
        .order_by_desc(ActivityCol::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ActivityLogDto::from)
        .collect();

    Ok(ApiResponse::success(
        "Activity logs",
        items,
        Some(Meta::new(page, limit, total)),
    ))
}
