use std::{fmt::Debug, sync::Arc};

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::{
    config::PasswordEncoding,
    error::{AppError, AppResult},
};

/// Turns raw passwords into stored credentials and checks them again at login.
pub trait PasswordEncoder: Debug + Send + Sync {
    fn encode(&self, raw: &str) -> AppResult<String>;

    fn matches(&self, raw: &str, encoded: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Encoder;

impl PasswordEncoder for Argon2Encoder {
    fn encode(&self, raw: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
            .to_string();
        Ok(hash)
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(encoded) else {
            tracing::warn!("stored password is not a valid argon2 hash");
            return false;
        };
        Argon2::default()
            .verify_password(raw.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Stores passwords verbatim. Never enable outside local development.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextEncoder;

impl PasswordEncoder for PlainTextEncoder {
    fn encode(&self, raw: &str) -> AppResult<String> {
        Ok(raw.to_string())
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        raw == encoded
    }
}

pub fn encoder_for(encoding: PasswordEncoding) -> Arc<dyn PasswordEncoder> {
    match encoding {
        PasswordEncoding::Argon2 => Arc::new(Argon2Encoder),
        PasswordEncoding::PlainText => {
            tracing::warn!("PASSWORD_ENCODER=plaintext: passwords are stored unhashed");
            Arc::new(PlainTextEncoder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon2_round_trips_and_rejects_wrong_password() {
        let encoder = Argon2Encoder;
        let hash = encoder.encode("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(hash.starts_with("$argon2"));
        assert!(encoder.matches("s3cret", &hash));
        assert!(!encoder.matches("S3cret", &hash));
    }

    #[test]
    fn argon2_salts_every_hash() {
        let encoder = Argon2Encoder;
        let a = encoder.encode("same").unwrap();
        let b = encoder.encode("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn argon2_refuses_garbage_hashes() {
        assert!(!Argon2Encoder.matches("plain", "plain"));
    }

    #[test]
    fn plaintext_compares_verbatim() {
        let encoder = PlainTextEncoder;
        let stored = encoder.encode("pw").unwrap();
        assert_eq!(stored, "pw");
        assert!(encoder.matches("pw", &stored));
        assert!(!encoder.matches("pw ", &stored));
    }
}
