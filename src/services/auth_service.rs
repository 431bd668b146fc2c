use crate::{
    audit::{AuditContext, NewActivity, log_activity},
    dto::auth::{CheckPasswordResponse, UserExistsResponse, normalize_email},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    services::account_service::{find_account_by_email, parse_role},
    state::AppState,
};

/// Verify an email/password pair.
///
/// Unknown email, wrong password and a deactivated account all come back as
/// `InvalidCredentials` so the caller cannot tell them apart.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> AppResult<AuthUser> {
    let email = normalize_email(email);
    let Some(account) = find_account_by_email(&state.orm, &email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !state.passwords.matches(password, &account.password_hash) {
        return Err(AppError::InvalidCredentials);
    }
    if !account.is_active {
        tracing::debug!(user_id = %account.id, "login attempt on inactive account");
        return Err(AppError::InvalidCredentials);
    }

    Ok(AuthUser {
        user_id: account.id,
        role: parse_role(&account)?,
        email: account.email,
        name: account.name,
    })
}

/// Best-effort `USER_LOGIN` entry; a failed write never blocks the login.
pub async fn record_login(state: &AppState, ctx: &AuditContext, user: &AuthUser) {
    let activity = NewActivity::on(
        "USER_LOGIN",
        format!("{} logged in", user.email),
        "USER",
        user.user_id,
    );
    if let Err(err) = log_activity(&state.orm, &ctx.acting_as(user.user_id), activity).await {
        tracing::warn!(error = %err, "audit log failed");
    }
}

pub async fn user_exists(state: &AppState, email: &str) -> AppResult<UserExistsResponse> {
    let email = normalize_email(email);
    let account = find_account_by_email(&state.orm, &email).await?;
    Ok(UserExistsResponse {
        exists: account.is_some(),
        id: account.as_ref().map(|a| a.id),
        role: account.as_ref().map(|a| a.role.clone()),
        active: account.as_ref().map(|a| a.is_active),
        email,
    })
}

pub async fn check_password(
    state: &AppState,
    email: &str,
    raw_password: &str,
) -> AppResult<CheckPasswordResponse> {
    let email = normalize_email(email);
    let account = find_account_by_email(&state.orm, &email).await?;
    let password_matches = account
        .as_ref()
        .is_some_and(|a| state.passwords.matches(raw_password, &a.password_hash));
    Ok(CheckPasswordResponse {
        exists: account.is_some(),
        password_matches,
        role: account.as_ref().map(|a| a.role.clone()),
        active: account.as_ref().map(|a| a.is_active),
        email,
    })
}
