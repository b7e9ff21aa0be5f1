//! Password hashing for stored credentials. The hash is the only form the
//! rest of the system ever sees or persists.

use argon2::{Argon2, Params};
use base64::{DecodeError, Engine, display::Base64Display, prelude::BASE64_STANDARD};
use std::{
    fmt::{Debug, Formatter},
    str::FromStr,
};
use thiserror::Error;

pub const PASSWORD_SALT_LEN: usize = 16;
pub const PASSWORD_HASH_LEN: usize = Params::DEFAULT_OUTPUT_LEN;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(argon2::Error);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum PasswordHashDecodeError {
    #[error("Not enough parts separated by ':'")]
    NotEnoughParts,
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The length of the salt part is incorrect")]
    InvalidSaltLength,
    #[error("The length of the hash part is incorrect")]
    InvalidHashLength,
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PasswordHash {
    salt: [u8; PASSWORD_SALT_LEN],
    hash: [u8; PASSWORD_HASH_LEN],
}

impl PasswordHash {
    pub fn new(password: &str) -> Result<Self, PasswordHashError> {
        let salt = rand::random();

        Self::with_salt(password, salt)
    }

    fn with_salt(password: &str, salt: [u8; PASSWORD_SALT_LEN]) -> Result<Self, PasswordHashError> {
        let argon2 = Argon2::default();

        let mut hash = [0; PASSWORD_HASH_LEN];
        argon2
            .hash_password_into(password.as_bytes(), &salt, &mut hash)
            .map_err(PasswordHashError)?;

        Ok(Self { salt, hash })
    }

    pub fn verify(&self, password: &str) -> Result<bool, PasswordHashError> {
        let candidate = Self::with_salt(password, self.salt)?;

        Ok(candidate.hash == self.hash)
    }

    /// Storable form: `base64(salt):base64(hash)`.
    #[must_use]
    pub fn encode(&self) -> String {
        let encoded_salt = Base64Display::new(&self.salt, &BASE64_STANDARD);
        let encoded_hash = Base64Display::new(&self.hash, &BASE64_STANDARD);

        format!("{encoded_salt}:{encoded_hash}")
    }
}

impl FromStr for PasswordHash {
    type Err = PasswordHashDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ':');

        let salt_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;
        let hash_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;

        let salt = BASE64_STANDARD
            .decode(salt_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidSaltLength)?;
        let hash = BASE64_STANDARD
            .decode(hash_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidHashLength)?;

        Ok(Self { salt, hash })
    }
}

impl Debug for PasswordHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHash")
            .field("salt", &"[redacted]")
            .field("hash", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{PasswordHash, PasswordHashDecodeError};
    use std::str::FromStr;

    #[test]
    fn hash_verifies_the_original_password_only() {
        let hash = PasswordHash::new("password123").unwrap();

        assert!(hash.verify("password123").unwrap());
        assert!(!hash.verify("password124").unwrap());
    }

    #[test]
    fn hash_round_trips_through_its_encoded_form() {
        let hash = PasswordHash::new("hunter2").unwrap();
        let decoded = PasswordHash::from_str(&hash.encode()).unwrap();

        assert_eq!(decoded, hash);
        assert!(decoded.verify("hunter2").unwrap());
    }

    #[test]
    fn malformed_encodings_are_rejected() {
        assert_eq!(
            PasswordHash::from_str("AAAA"),
            Err(PasswordHashDecodeError::NotEnoughParts)
        );
        assert_eq!(
            PasswordHash::from_str("AAAA:AAAA"),
            Err(PasswordHashDecodeError::InvalidSaltLength)
        );
    }

    #[test]
    fn debug_does_not_leak_material() {
        let hash = PasswordHash::new("secret").unwrap();
        let debug = format!("{hash:?}");

        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains(&hash.encode()));
    }
}
