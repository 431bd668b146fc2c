//! Account diagnostics. Only mounted when `DEBUG_ROUTES_ENABLED` is set, and
//! only reachable by administrators.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::auth::{CheckPasswordQuery, CheckPasswordResponse, UserExistsQuery, UserExistsResponse},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/debug/user-exists", get(user_exists))
        .route("/debug/check-password", get(check_password))
}

#[utoipa::path(
    get,
    path = "/debug/user-exists",
    params(UserExistsQuery),
    responses(
        (status = 200, description = "Whether an account uses the email", body = ApiResponse<UserExistsResponse>)
    ),
    security(("session_cookie" = [])),
    tag = "Debug"
)]
pub async fn user_exists(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserExistsQuery>,
) -> AppResult<Json<ApiResponse<UserExistsResponse>>> {
    ensure_admin(&user)?;
    tracing::warn!(admin_id = %user.user_id, email = %query.email, "debug user lookup");
    let data = auth_service::user_exists(&state, &query.email).await?;
    Ok(Json(ApiResponse::success("User lookup", data, Some(Meta::empty()))))
}

#[utoipa::path(
    get,
    path = "/debug/check-password",
    params(CheckPasswordQuery),
    responses(
        (status = 200, description = "Whether the password matches the stored credential", body = ApiResponse<CheckPasswordResponse>)
    ),
    security(("session_cookie" = [])),
    tag = "Debug"
)]
pub async fn check_password(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CheckPasswordQuery>,
) -> AppResult<Json<ApiResponse<CheckPasswordResponse>>> {
    ensure_admin(&user)?;
    tracing::warn!(admin_id = %user.user_id, email = %query.email, "debug password check");
    let data = auth_service::check_password(&state, &query.email, &query.raw_password).await?;
    Ok(Json(ApiResponse::success(
        "Password check",
        data,
        Some(Meta::empty()),
    )))
}
