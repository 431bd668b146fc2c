use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditContext, NewActivity, log_activity},
    dto::{admin::DashboardStats, users::UserDto},
    entity::{
        accounts::{ActiveModel as AccountActive, Column as AccountCol, Entity as Accounts},
        shop_profiles::{Column as ShopCol, Entity as ShopProfiles},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Role,
    response::{ApiResponse, Meta},
    services::account_service::{lock_account, parse_role, touch},
    state::AppState,
};

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;
    let total_users = Accounts::find().count(&state.orm).await?;
    let total_shops = ShopProfiles::find().count(&state.orm).await?;
    let pending_shops = ShopProfiles::find()
        .inner_join(Accounts)
        .filter(ShopCol::IsApproved.eq(false))
        .filter(AccountCol::IsActive.eq(true))
        .count(&state.orm)
        .await?;

    let stats = DashboardStats {
        total_users,
        total_shops,
        pending_shops,
    };
    Ok(ApiResponse::success("Dashboard stats", stats, Some(Meta::empty())))
}

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Vec<UserDto>>> {
    ensure_admin(user)?;
    let users = Accounts::find()
        .order_by_desc(AccountCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(UserDto::from)
        .collect();
    Ok(ApiResponse::list("Users", users))
}

pub async fn list_users_by_role(
    state: &AppState,
    user: &AuthUser,
    role: Role,
) -> AppResult<ApiResponse<Vec<UserDto>>> {
    ensure_admin(user)?;
    let users = Accounts::find()
        .filter(AccountCol::Role.eq(role.as_str()))
        .order_by_desc(AccountCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(UserDto::from)
        .collect();
    Ok(ApiResponse::list(format!("{role} users"), users))
}

/// Deactivate any account and drop its live session.
pub async fn deactivate_user(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
) -> AppResult<ApiResponse<UserDto>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest(
            "administrators cannot deactivate themselves".into(),
        ));
    }

    let txn = state.orm.begin().await?;
    let account = lock_account(&txn, id).await?;
    let role = parse_role(&account)?;

    let mut active: AccountActive = account.into();
    active.is_active = Set(false);
    touch(&mut active);
    let account = active.update(&txn).await?;

    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "USER_DEACTIVATED",
            format!("{role} account deactivated: {}", account.email),
            "USER",
            id,
        ),
    )
    .await?;
    txn.commit().await?;

    let had_session = state.sessions.revoke(id).await;
    tracing::info!(user_id = %id, admin_id = %user.user_id, had_session, "user deactivated");
    Ok(ApiResponse::success(
        "User deactivated",
        UserDto::from(account),
        Some(Meta::empty()),
    ))
}
