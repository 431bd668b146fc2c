use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::{
    audit::{AuditContext, RequestMeta},
    dto::{
        auth::{RegisterCustomerRequest, RegisterShopRequest},
        customers::CustomerDto,
        shops::ShopDto,
    },
    error::AppResult,
    response::ApiResponse,
    services::{customer_service, shop_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register/shop", post(register_shop))
        .route("/register/customer", post(register_customer))
}

#[utoipa::path(
    post,
    path = "/register/shop",
    request_body = RegisterShopRequest,
    responses(
        (status = 201, description = "Shop registered, pending approval", body = ApiResponse<ShopDto>),
        (status = 400, description = "Invalid registration"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Registration"
)]
pub async fn register_shop(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<RegisterShopRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ShopDto>>)> {
    let ctx = AuditContext::new(None, meta);
    let resp = shop_service::register_shop(&state, &ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/register/customer",
    request_body = RegisterCustomerRequest,
    responses(
        (status = 201, description = "Customer registered", body = ApiResponse<CustomerDto>),
        (status = 400, description = "Invalid registration"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Registration"
)]
pub async fn register_customer(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<RegisterCustomerRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CustomerDto>>)> {
    let ctx = AuditContext::new(None, meta);
    let resp = customer_service::register_customer(&state, &ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
