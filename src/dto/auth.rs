use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Role,
};

const MIN_PASSWORD_LEN: usize = 6;

/// Form body posted to `/perform_login`.
#[derive(Deserialize, Debug)]
pub struct LoginForm {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterShopRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub shop_name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub preferred_payment_method: Option<String>,
}

/// Credentials shared by both registration forms, checked and normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Credentials {
    pub fn parse(email: &str, password: &str, name: &str) -> AppResult<Self> {
        let email = normalize_email(email);
        if email.len() < 3 || !email.contains('@') {
            return Err(AppError::BadRequest("a valid email is required".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".into()));
        }
        Ok(Self {
            email,
            password: password.to_string(),
            name: name.to_string(),
        })
    }
}

/// Emails are compared trimmed and lower-cased everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalDto {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&AuthUser> for PrincipalDto {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.user_id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub principal: PrincipalDto,
    pub home_path: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserExistsQuery {
    pub email: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CheckPasswordQuery {
    pub email: String,
    pub raw_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserExistsResponse {
    pub email: String,
    pub exists: bool,
    pub id: Option<Uuid>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckPasswordResponse {
    pub email: String,
    pub exists: bool,
    pub password_matches: bool,
    pub role: Option<String>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_normalised() {
        let creds = Credentials::parse("  Bob@Example.COM ", "hunter22", " Bob ").unwrap();
        assert_eq!(creds.email, "bob@example.com");
        assert_eq!(creds.name, "Bob");
        assert_eq!(creds.password, "hunter22");
    }

    #[test]
    fn credentials_reject_bad_input() {
        assert!(Credentials::parse("not-an-email", "hunter22", "Bob").is_err());
        assert!(Credentials::parse("bob@example.com", "short", "Bob").is_err());
        assert!(Credentials::parse("bob@example.com", "hunter22", "  ").is_err());
    }

    #[test]
    fn login_form_accepts_username_alias() {
        let form: LoginForm =
            serde_json::from_str(r#"{"username":"a@b.c","password":"pw"}"#).unwrap();
        assert_eq!(form.email, "a@b.c");
    }
}
