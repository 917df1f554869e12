//! Password hashing and token-secret primitives
//!
//! Pure functions plus database operations only. No HTTP framework
//! dependencies here; cookie and header handling live in the server
//! crate.
//!
//! Passwords are stored as SHA-256 over `salt || password`, with a
//! per-user random hex salt. The token-signing secret lives in the
//! settings table and is generated on first use.

use rand::Rng;
use sha2::{Digest, Sha256};

#[cfg(feature = "sqlx")]
use crate::Result;
#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

/// Generate a random 16-byte hex salt
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex_encode(&bytes)
}

/// Hash a password with the given salt
///
/// Returns 64 lowercase hex characters.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Constant-shape comparison of a candidate password against stored hash/salt
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    let calculated = hash_password(password, salt);

    // Compare every byte; do not short-circuit on first mismatch
    if calculated.len() != stored_hash.len() {
        return false;
    }
    calculated
        .bytes()
        .zip(stored_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Load the token-signing secret from the settings table
///
/// Key: `token_secret`. Generated and stored on first access so that
/// issued tokens survive restarts.
#[cfg(feature = "sqlx")]
pub async fn load_token_secret(db: &SqlitePool) -> Result<String> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'token_secret'")
            .fetch_optional(db)
            .await?;

    match result {
        Some((value,)) => Ok(value),
        None => initialize_token_secret(db).await,
    }
}

/// Generate and store a fresh token-signing secret
#[cfg(feature = "sqlx")]
pub async fn initialize_token_secret(db: &SqlitePool) -> Result<String> {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    let secret = hex_encode(&bytes);

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('token_secret', ?)")
        .bind(&secret)
        .execute(db)
        .await?;

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_is_hex_and_unique() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_deterministic_per_salt() {
        let salt = "aabbccdd";
        let h1 = hash_password("secret", salt);
        let h2 = hash_password("secret", salt);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        // Different salt changes the hash
        let h3 = hash_password("secret", "11223344");
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_verify_password_round_trip() {
        let salt = generate_salt();
        let hash = hash_password("open sesame", &salt);

        assert!(verify_password("open sesame", &salt, &hash));
        assert!(!verify_password("open sesam", &salt, &hash));
        assert!(!verify_password("open sesame", &salt, "deadbeef"));
    }
}
