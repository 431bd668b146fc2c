//! Path-based role gate and the `AuthUser` extractor.
//!
//! The gate runs inside the session layer. It maps the request path to the
//! access it needs, checks the session principal against that, and on success
//! leaves an [`AuthUser`] in the request extensions for handlers to pick up.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{error::AppError, models::Role};

use super::session::{SessionRegistry, current_principal};

pub const LOGIN_PATH: &str = "/login";

/// Exact public paths.
const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/login",
    "/perform_login",
    "/logout",
    "/register",
    "/register/shop",
    "/register/customer",
    "/error",
    "/favicon.ico",
    "/health",
];

/// Public path prefixes; everything below them is public too.
const PUBLIC_PREFIXES: &[&str] = &[
    "/css",
    "/js",
    "/images",
    "/.well-known",
    "/webjars",
    "/api/public",
    "/docs",
];

const ROLE_PREFIXES: &[(&str, Role)] = &[
    ("/admin", Role::Admin),
    ("/shop", Role::Shop),
    ("/customer", Role::Customer),
    ("/api/admin", Role::Admin),
    ("/api/shop", Role::Shop),
    ("/api/customer", Role::Customer),
    ("/debug", Role::Admin),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Role(Role),
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Unauthenticated,
    Forbidden,
}

/// `true` if `path` is `prefix` itself or lies below it.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn required_access(path: &str) -> Access {
    if PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| under(path, p)) {
        return Access::Public;
    }
    ROLE_PREFIXES
        .iter()
        .find(|(prefix, _)| under(path, prefix))
        .map_or(Access::Authenticated, |(_, role)| Access::Role(*role))
}

pub fn authorize(access: Access, role: Option<Role>) -> Decision {
    match (access, role) {
        (Access::Public, _) => Decision::Permit,
        (_, None) => Decision::Unauthenticated,
        (Access::Authenticated, Some(_)) => Decision::Permit,
        (Access::Role(required), Some(held)) if required == held => Decision::Permit,
        (Access::Role(_), Some(_)) => Decision::Forbidden,
    }
}

/// The authenticated account behind the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Middleware enforcing [`required_access`] for every request.
pub async fn auth_gate(
    State(registry): State<SessionRegistry>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let principal = current_principal(&session, &registry).await;
    let access = required_access(&path);

    match authorize(access, principal.as_ref().map(|p| p.role)) {
        Decision::Permit => {
            if let Some(principal) = principal {
                request.extensions_mut().insert(principal.to_auth_user());
            }
            next.run(request).await
        }
        Decision::Unauthenticated => {
            tracing::debug!(%path, "unauthenticated request");
            if under(&path, "/api") {
                AppError::Unauthorized.into_response()
            } else {
                Redirect::to(LOGIN_PATH).into_response()
            }
        }
        Decision::Forbidden => {
            tracing::warn!(
                %path,
                role = ?principal.as_ref().map(|p| p.role),
                required = ?access,
                "role check failed"
            );
            AppError::Forbidden.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_need_nothing() {
        for path in [
            "/",
            "/login",
            "/perform_login",
            "/register/shop",
            "/register/customer",
            "/css/site.css",
            "/js/app.js",
            "/images/logo.png",
            "/favicon.ico",
            "/api/public/shops",
            "/.well-known/security.txt",
            "/health",
        ] {
            assert_eq!(required_access(path), Access::Public, "{path}");
        }
    }

    #[test]
    fn role_prefixes_map_to_roles() {
        assert_eq!(required_access("/admin"), Access::Role(Role::Admin));
        assert_eq!(required_access("/admin/users"), Access::Role(Role::Admin));
        assert_eq!(
            required_access("/api/admin/shops/pending"),
            Access::Role(Role::Admin)
        );
        assert_eq!(required_access("/shop/orders"), Access::Role(Role::Shop));
        assert_eq!(required_access("/api/shop/profile"), Access::Role(Role::Shop));
        assert_eq!(
            required_access("/customer/cart"),
            Access::Role(Role::Customer)
        );
        assert_eq!(
            required_access("/api/customer/profile"),
            Access::Role(Role::Customer)
        );
    }

    #[test]
    fn debug_namespace_is_admin_only() {
        assert_eq!(
            required_access("/debug/check-password"),
            Access::Role(Role::Admin)
        );
    }

    #[test]
    fn prefixes_match_whole_segments() {
        assert_eq!(required_access("/administrator"), Access::Authenticated);
        assert_eq!(required_access("/shopping"), Access::Authenticated);
        assert_eq!(required_access("/cssx"), Access::Authenticated);
        assert_eq!(required_access("/api/adminx"), Access::Authenticated);
    }

    #[test]
    fn unmatched_paths_need_any_session() {
        assert_eq!(required_access("/dashboard"), Access::Authenticated);
        assert_eq!(required_access("/api/auth/me"), Access::Authenticated);
    }

    #[test]
    fn public_access_ignores_principal() {
        assert_eq!(authorize(Access::Public, None), Decision::Permit);
        assert_eq!(authorize(Access::Public, Some(Role::Shop)), Decision::Permit);
    }

    #[test]
    fn anonymous_requests_are_unauthenticated_elsewhere() {
        assert_eq!(
            authorize(Access::Authenticated, None),
            Decision::Unauthenticated
        );
        assert_eq!(
            authorize(Access::Role(Role::Admin), None),
            Decision::Unauthenticated
        );
    }

    #[test]
    fn roles_must_match_exactly() {
        for required in Role::ALL {
            for held in Role::ALL {
                let expected = if required == held {
                    Decision::Permit
                } else {
                    Decision::Forbidden
                };
                assert_eq!(
                    authorize(Access::Role(required), Some(held)),
                    expected,
                    "{held} on {required} path"
                );
            }
            assert_eq!(
                authorize(Access::Authenticated, Some(required)),
                Decision::Permit
            );
        }
    }

    #[test]
    fn ensure_admin_rejects_other_roles() {
        let mut user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "a@example.com".into(),
            name: "A".into(),
            role: Role::Admin,
        };
        assert!(ensure_admin(&user).is_ok());
        user.role = Role::Customer;
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
    }
}
