use std::{env, str::FromStr};

/// Which password comparator the login flow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordEncoding {
    Argon2,
    /// Stores and compares raw passwords. Development only.
    PlainText,
}

impl FromStr for PasswordEncoding {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "argon2" => Ok(Self::Argon2),
            "plaintext" | "plain" | "noop" => Ok(Self::PlainText),
            other => Err(anyhow::anyhow!("unknown PASSWORD_ENCODER `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub password_encoding: PasswordEncoding,
    pub debug_routes: bool,
    pub session_secure_cookie: bool,
    pub session_idle_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let password_encoding = match env::var("PASSWORD_ENCODER") {
            Ok(value) => value.parse()?,
            Err(_) => PasswordEncoding::Argon2,
        };
        let debug_routes = env_flag("DEBUG_ROUTES_ENABLED");
        let session_secure_cookie = env_flag("SESSION_SECURE_COOKIE");
        let session_idle_minutes = env::var("SESSION_IDLE_MINUTES")
            .ok()
            .and_then(|m| m.parse::<i64>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(30);
        Ok(Self {
            port,
            database_url,
            host,
            password_encoding,
            debug_routes,
            session_secure_cookie,
            session_idle_minutes,
        })
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|v| parse_flag(&v)).unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_encoding_parses_known_names() {
        assert_eq!(
            "argon2".parse::<PasswordEncoding>().unwrap(),
            PasswordEncoding::Argon2
        );
        assert_eq!(
            " PlainText ".parse::<PasswordEncoding>().unwrap(),
            PasswordEncoding::PlainText
        );
        assert!("bcrypt".parse::<PasswordEncoding>().is_err());
    }

    #[test]
    fn flags_accept_common_truthy_values() {
        for v in ["1", "true", "TRUE", "yes", "on"] {
            assert!(parse_flag(v), "{v} should be truthy");
        }
        for v in ["0", "false", "", "nope"] {
            assert!(!parse_flag(v), "{v} should be falsy");
        }
    }
}
