use axum::{Json, Router, extract::State, routing::get};

use crate::{
    audit::{AuditContext, RequestMeta},
    dto::customers::{CustomerDto, CustomerUpdateRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::customer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(own_profile).put(update_own_profile))
}

#[utoipa::path(
    get,
    path = "/api/customer/profile",
    responses(
        (status = 200, description = "Own customer record", body = ApiResponse<CustomerDto>),
        (status = 403, description = "Not a customer account")
    ),
    security(("session_cookie" = [])),
    tag = "Customer"
)]
pub async fn own_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CustomerDto>>> {
    let resp = customer_service::get_customer(&state, &user, user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/customer/profile",
    request_body = CustomerUpdateRequest,
    responses(
        (status = 200, description = "Own customer record updated", body = ApiResponse<CustomerDto>),
        (status = 400, description = "Invalid update")
    ),
    security(("session_cookie" = [])),
    tag = "Customer"
)]
pub async fn update_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Json(payload): Json<CustomerUpdateRequest>,
) -> AppResult<Json<ApiResponse<CustomerDto>>> {
    let ctx = AuditContext::for_user(&user, meta);
    let resp =
        customer_service::update_customer(&state, &user, &ctx, user.user_id, payload).await?;
    Ok(Json(resp))
}
