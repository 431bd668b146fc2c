use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode, header},
    response::Response,
    routing::{get, post},
};
use marketplace_api::{
    middleware::{
        auth::AuthUser,
        secured,
        session::{SessionRegistry, session_layer, start_session},
    },
    models::Role,
    password::PlainTextEncoder,
    routes::build_router,
    state::AppState,
};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};
use uuid::Uuid;

#[derive(Deserialize)]
struct LoginAs {
    id: Uuid,
    role: Role,
}

// Stands in for the credential check: binds the requested principal.
async fn login_as(
    State(registry): State<SessionRegistry>,
    session: Session,
    Query(q): Query<LoginAs>,
) -> StatusCode {
    let user = AuthUser {
        user_id: q.id,
        email: format!("{}@example.com", q.role.as_str().to_lowercase()),
        name: q.role.to_string(),
        role: q.role,
    };
    match start_session(&session, &registry, &user).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn whoami(user: AuthUser) -> String {
    format!("{}:{}", user.role, user.user_id)
}

fn stub_app(registry: &SessionRegistry) -> Router {
    let routes = Router::new()
        .route("/perform_login", post(login_as))
        .route("/health", get(|| async { "ok" }))
        .route("/api/public/shops", get(|| async { "shops" }))
        .route("/admin/dashboard", get(whoami))
        .route("/api/admin/ping", get(whoami))
        .route("/api/shop/ping", get(whoami))
        .route("/api/customer/ping", get(whoami))
        .route("/debug/user-exists", get(whoami))
        .route("/api/auth/me", get(whoami));
    secured(
        routes,
        registry.clone(),
        session_layer(MemoryStore::default(), false, 30),
    )
    .with_state(registry.clone())
}

async fn login(app: &Router, id: Uuid, role: Role) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/perform_login?id={id}&role={role}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    session_cookie(&response)
}

fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("JSESSIONID="), "{set_cookie}");
    assert!(set_cookie.contains("HttpOnly"), "{set_cookie}");
    assert!(set_cookie.contains("SameSite=Lax"), "{set_cookie}");
    set_cookie.split(';').next().unwrap().to_string()
}

async fn get_with(app: &Router, path: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::get(path);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn public_paths_admit_anonymous_requests() {
    let app = stub_app(&SessionRegistry::new());
    for path in ["/health", "/api/public/shops"] {
        let response = get_with(&app, path, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn anonymous_api_calls_get_401_and_pages_redirect() {
    let app = stub_app(&SessionRegistry::new());

    let response = get_with(&app, "/api/admin/ping", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_with(&app, "/admin/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    let response = get_with(&app, "/debug/user-exists", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn role_paths_admit_only_their_role() {
    let app = stub_app(&SessionRegistry::new());
    let shop_id = Uuid::new_v4();
    let cookie = login(&app, shop_id, Role::Shop).await;

    let response = get_with(&app, "/api/shop/ping", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, format!("SHOP:{shop_id}"));

    for path in ["/api/admin/ping", "/api/customer/ping", "/admin/dashboard", "/debug/user-exists"] {
        let response = get_with(&app, path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{path}");
    }

    let response = get_with(&app, "/api/auth/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admins_reach_admin_and_debug_paths() {
    let app = stub_app(&SessionRegistry::new());
    let cookie = login(&app, Uuid::new_v4(), Role::Admin).await;

    for path in ["/api/admin/ping", "/admin/dashboard", "/debug/user-exists"] {
        let response = get_with(&app, path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
    let response = get_with(&app, "/api/shop/ping", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn second_login_supersedes_the_first_session() {
    let app = stub_app(&SessionRegistry::new());
    let id = Uuid::new_v4();
    let first = login(&app, id, Role::Customer).await;
    let second = login(&app, id, Role::Customer).await;
    assert_ne!(first, second);

    let response = get_with(&app, "/api/customer/ping", Some(&first)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_with(&app, "/api/customer/ping", Some(&second)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn revoked_accounts_lose_their_session() {
    let registry = SessionRegistry::new();
    let app = stub_app(&registry);
    let id = Uuid::new_v4();
    let cookie = login(&app, id, Role::Shop).await;

    assert!(registry.revoke(id).await);
    let response = get_with(&app, "/api/shop/ping", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// The real router; the pool is lazy and none of these requests reach it.
fn real_app(debug_routes: bool) -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://postgres@127.0.0.1:1/unused")
        .unwrap();
    let state = AppState::new(&pool, Arc::new(PlainTextEncoder));
    build_router(
        state,
        session_layer(MemoryStore::default(), false, 30),
        debug_routes,
    )
}

#[tokio::test]
async fn application_router_applies_the_gate() {
    let app = real_app(false);

    let response = get_with(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_with(&app, "/login?error=true", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("\"error\":true"));

    for path in [
        "/api/admin/dashboard/stats",
        "/api/admin/shops/pending",
        "/api/auth/me",
        "/api/shop/profile",
    ] {
        let response = get_with(&app, path, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let response = get_with(&app, "/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn logout_without_a_session_still_redirects() {
    let app = real_app(false);
    let response = app
        .oneshot(Request::post("/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?logout=true"
    );
}

#[tokio::test]
async fn docs_are_served_without_a_session() {
    let app = real_app(true);
    let response = get_with(&app, "/docs", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
