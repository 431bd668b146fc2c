use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    audit::{AuditContext, RequestMeta},
    dto::{
        activity_logs::ActivityLogDto,
        admin::DashboardStats,
        customers::{CustomerDto, CustomerListQuery, RecordOrderRequest},
        shops::{ShopDto, ShopRatingRequest, ShopUpdateRequest},
        users::UserDto,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Role,
    response::ApiResponse,
    routes::params::Pagination,
    services::{activity_log_service, admin_service, customer_service, shop_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/shops", get(list_shops))
        .route("/shops/pending", get(list_pending_shops))
        .route("/shops/{id}", get(get_shop).put(update_shop))
        .route("/shops/{id}/approve", post(approve_shop))
        .route("/shops/{id}/reject", post(reject_shop))
        .route("/shops/{id}/rating", put(update_shop_rating))
        .route("/shops/{id}/orders", post(record_shop_order))
        .route("/customers", get(list_customers))
        .route("/customers/{id}", get(get_customer))
        .route("/customers/{id}/deactivate", post(deactivate_customer))
        .route("/customers/{id}/orders", post(record_customer_order))
        .route("/activity-logs", get(list_activity_logs))
        .route("/activity-logs/user/{id}", get(list_user_activity_logs))
        .route("/users", get(list_users))
        .route("/users/role/{role}", get(list_users_by_role))
        .route("/users/{id}/deactivate", post(deactivate_user))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard/stats",
    responses(
        (status = 200, description = "Account and shop counters", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = admin_service::dashboard_stats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/shops",
    responses(
        (status = 200, description = "All shops", body = ApiResponse<Vec<ShopDto>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_shops(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<ShopDto>>>> {
    let resp = shop_service::list_shops(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/shops/pending",
    responses(
        (status = 200, description = "Shops awaiting approval", body = ApiResponse<Vec<ShopDto>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_pending_shops(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<ShopDto>>>> {
    let resp = shop_service::list_pending_shops(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/shops/{id}",
    params(("id" = Uuid, Path, description = "Shop account ID")),
    responses(
        (status = 200, description = "Shop found", body = ApiResponse<ShopDto>),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn get_shop(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ShopDto>>> {
    let resp = shop_service::get_shop(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/shops/{id}/approve",
    params(("id" = Uuid, Path, description = "Shop account ID")),
    responses(
        (status = 200, description = "Shop approved", body = ApiResponse<ShopDto>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Shop is not pending"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn approve_shop(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ShopDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp = shop_service::approve_shop(&state, &user, &ctx, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/shops/{id}/reject",
    params(("id" = Uuid, Path, description = "Shop account ID")),
    responses(
        (status = 200, description = "Shop rejected", body = ApiResponse<ShopDto>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Shop is not pending"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn reject_shop(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ShopDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp = shop_service::reject_shop(&state, &user, &ctx, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/shops/{id}",
    params(("id" = Uuid, Path, description = "Shop account ID")),
    request_body = ShopUpdateRequest,
    responses(
        (status = 200, description = "Shop updated", body = ApiResponse<ShopDto>),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn update_shop(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShopUpdateRequest>,
) -> AppResult<Json<ApiResponse<ShopDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp = shop_service::update_shop(&state, &user, &ctx, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/shops/{id}/rating",
    params(("id" = Uuid, Path, description = "Shop account ID")),
    request_body = ShopRatingRequest,
    responses(
        (status = 200, description = "Rating stored, rounded to two decimals", body = ApiResponse<ShopDto>),
        (status = 400, description = "Rating outside 0..5"),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn update_shop_rating(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShopRatingRequest>,
) -> AppResult<Json<ApiResponse<ShopDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp = shop_service::update_shop_rating(&state, &user, &ctx, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/shops/{id}/orders",
    params(("id" = Uuid, Path, description = "Shop account ID")),
    responses(
        (status = 200, description = "Order counted", body = ApiResponse<ShopDto>),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn record_shop_order(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ShopDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp = shop_service::increment_shop_orders(&state, &user, &ctx, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Customers", body = ApiResponse<Vec<CustomerDto>>),
        (status = 404, description = "No customer with that email"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CustomerListQuery>,
) -> AppResult<Json<ApiResponse<Vec<CustomerDto>>>> {
    let resp = customer_service::list_customers(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer account ID")),
    responses(
        (status = 200, description = "Customer found", body = ApiResponse<CustomerDto>),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerDto>>> {
    let resp = customer_service::get_customer(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/customers/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Customer account ID")),
    responses(
        (status = 200, description = "Customer deactivated", body = ApiResponse<CustomerDto>),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn deactivate_customer(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp = customer_service::deactivate_customer(&state, &user, &ctx, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/customers/{id}/orders",
    params(("id" = Uuid, Path, description = "Customer account ID")),
    request_body = RecordOrderRequest,
    responses(
        (status = 200, description = "Order folded into the customer's totals", body = ApiResponse<CustomerDto>),
        (status = 400, description = "Amount must be positive"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order belongs to another customer"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn record_customer_order(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordOrderRequest>,
) -> AppResult<Json<ApiResponse<CustomerDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp = customer_service::update_customer_stats(&state, &user, &ctx, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/activity-logs",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Activity log, newest first", body = ApiResponse<Vec<ActivityLogDto>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_activity_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Vec<ActivityLogDto>>>> {
    let resp = activity_log_service::list_activity_logs(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/activity-logs/user/{id}",
    params(
        ("id" = Uuid, Path, description = "Acting account ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Activity of one account", body = ApiResponse<Vec<ActivityLogDto>>),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_user_activity_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Vec<ActivityLogDto>>>> {
    let resp =
        activity_log_service::list_activity_logs_for_account(&state, &user, id, pagination)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All accounts", body = ApiResponse<Vec<UserDto>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<UserDto>>>> {
    let resp = admin_service::list_users(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/role/{role}",
    params(("role" = Role, Path, description = "ADMIN, SHOP or CUSTOMER")),
    responses(
        (status = 200, description = "Accounts holding the role", body = ApiResponse<Vec<UserDto>>),
        (status = 400, description = "Unknown role"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_users_by_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(role): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<UserDto>>>> {
    let role = role.parse::<Role>()?;
    let resp = admin_service::list_users_by_role(&state, &user, role).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deactivated"),
        (status = 400, description = "Cannot deactivate yourself"),
        (status = 404, description = "Not Found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let ctx = AuditContext::for_user(&user, meta);
    admin_service::deactivate_user(&state, &user, &ctx, id).await?;
    Ok(StatusCode::OK)
}
