use axum::{
    Form, Json, Router,
    extract::{Query, State},
    response::Redirect,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit::{AuditContext, RequestMeta},
    dto::auth::{DashboardDto, LoginForm, PrincipalDto, normalize_email},
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, LOGIN_PATH},
        session::{end_session, start_session},
    },
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

const LOGIN_FAILED: &str = "/login?error=true";
const LOGGED_OUT: &str = "/login?logout=true";
const AFTER_LOGIN: &str = "/dashboard";

/// Form login, logout and the landing pages outside `/api`.
pub fn web_router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to(AFTER_LOGIN) }))
        .route(LOGIN_PATH, get(login_page))
        .route("/perform_login", axum::routing::post(perform_login))
        .route("/logout", get(logout).post(logout))
        .route("/dashboard", get(dashboard))
}

/// Mounted under `/api/auth`.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginPageQuery {
    pub error: Option<bool>,
    pub logout: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPageData {
    pub login_url: String,
    pub error: bool,
    pub logged_out: bool,
}

#[utoipa::path(
    get,
    path = "/login",
    params(LoginPageQuery),
    responses(
        (status = 200, description = "Login form state", body = ApiResponse<LoginPageData>)
    ),
    tag = "Auth"
)]
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Json<ApiResponse<LoginPageData>> {
    let data = LoginPageData {
        login_url: "/perform_login".to_string(),
        error: query.error.unwrap_or(false),
        logged_out: query.logout.unwrap_or(false),
    };
    Json(ApiResponse::success("Login", data, Some(Meta::empty())))
}

#[utoipa::path(
    post,
    path = "/perform_login",
    request_body(content = String, content_type = "application/x-www-form-urlencoded",
        description = "email (or username) and password"),
    responses(
        (status = 303, description = "Redirect to /dashboard, or /login?error=true on failure")
    ),
    tag = "Auth"
)]
pub async fn perform_login(
    State(state): State<AppState>,
    session: Session,
    meta: RequestMeta,
    Form(form): Form<LoginForm>,
) -> AppResult<Redirect> {
    let user = match auth_service::authenticate(&state, &form.email, &form.password).await {
        Ok(user) => user,
        Err(AppError::InvalidCredentials) => {
            tracing::warn!(
                email = %normalize_email(&form.email),
                ip = ?meta.ip_address,
                "login failed"
            );
            return Ok(Redirect::to(LOGIN_FAILED));
        }
        Err(err) => return Err(err),
    };

    start_session(&session, &state.sessions, &user).await?;
    auth_service::record_login(&state, &AuditContext::for_user(&user, meta), &user).await;
    tracing::info!(user_id = %user.user_id, role = %user.role, "login succeeded");
    Ok(Redirect::to(AFTER_LOGIN))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to /login?logout=true")
    ),
    tag = "Auth"
)]
pub async fn logout(State(state): State<AppState>, session: Session) -> AppResult<Redirect> {
    if let Some(principal) = end_session(&session, &state.sessions).await? {
        tracing::info!(user_id = %principal.account_id, "logged out");
    }
    Ok(Redirect::to(LOGGED_OUT))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Principal and the home page of its role", body = ApiResponse<DashboardDto>)
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn dashboard(user: AuthUser) -> Json<ApiResponse<DashboardDto>> {
    let data = DashboardDto {
        principal: PrincipalDto::from(&user),
        home_path: user.role.home_path().to_string(),
    };
    Json(ApiResponse::success("Dashboard", data, Some(Meta::empty())))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current principal", body = ApiResponse<PrincipalDto>),
        (status = 401, description = "Not logged in")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn me(user: AuthUser) -> Json<ApiResponse<PrincipalDto>> {
    Json(ApiResponse::success(
        "Current user",
        PrincipalDto::from(&user),
        Some(Meta::empty()),
    ))
}
