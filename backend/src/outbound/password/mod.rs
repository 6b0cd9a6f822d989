//! Argon2id password hashing.
//!
//! Hashes are stored in PHC string form so the parameters and salt travel
//! with the hash and older hashes keep verifying after a cost change.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

const SALT_LEN: usize = 16;

/// [`PasswordHasher`] backed by Argon2id.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Hasher with explicit memory (KiB) and iteration costs.
    ///
    /// ```
    /// use courses_backend::domain::ports::PasswordHasher;
    /// use courses_backend::outbound::password::Argon2PasswordHasher;
    ///
    /// let hasher = Argon2PasswordHasher::with_cost(8, 1).unwrap();
    /// let hash = hasher.hash("secret").unwrap();
    /// assert!(hasher.verify("secret", &hash));
    /// ```
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, PasswordHashError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|err| PasswordHashError::config(err.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let mut bytes = [0_u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        let salt =
            SaltString::encode_b64(&bytes).map_err(|err| PasswordHashError::hash(err.to_string()))?;
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .is_ok_and(|parsed| self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}
