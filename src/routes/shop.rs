use axum::{Json, Router, extract::State, routing::get};

use crate::{
    audit::{AuditContext, RequestMeta},
    dto::shops::{ShopDto, ShopUpdateRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::shop_service,
    state::AppState,
};

/// The logged-in shop's own profile, mounted under `/api/shop`.
pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(own_profile).put(update_own_profile))
}

#[utoipa::path(
    get,
    path = "/api/shop/profile",
    responses(
        (status = 200, description = "Own shop", body = ApiResponse<ShopDto>),
        (status = 403, description = "Not a shop account")
    ),
    security(("session_cookie" = [])),
    tag = "Shop"
)]
pub async fn own_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ShopDto>>> {
    let resp = shop_service::get_shop(&state, &user, user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/shop/profile",
    request_body = ShopUpdateRequest,
    responses(
        (status = 200, description = "Own shop updated", body = ApiResponse<ShopDto>),
        (status = 400, description = "Invalid update")
    ),
    security(("session_cookie" = [])),
    tag = "Shop"
)]
pub async fn update_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Json(payload): Json<ShopUpdateRequest>,
) -> AppResult<Json<ApiResponse<ShopDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp = shop_service::update_shop(&state, &user, &ctx, user.user_id, payload).await?;
    Ok(Json(resp))
}
