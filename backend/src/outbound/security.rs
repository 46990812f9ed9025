//! Argon2id password hashing.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::domain::ports::{CredentialHashError, CredentialHasher};

const SALT_LEN: usize = 16;

/// Hashes passwords into PHC strings with Argon2id default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2CredentialHasher;

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialHashError> {
        let mut salt_bytes = Zeroizing::new([0_u8; SALT_LEN]);
        rand::thread_rng().fill_bytes(salt_bytes.as_mut());
        let salt = SaltString::encode_b64(salt_bytes.as_ref())
            .map_err(|err| CredentialHashError::hashing(err.to_string()))?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialHashError::hashing(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}
