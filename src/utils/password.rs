//! Password hashing.
//!
//! Stored format: `<hex salt>$<hex mac>` where the MAC is HMAC-SHA256 keyed
//! by the server password pepper over `salt || password`. Verification uses
//! the constant-time comparison from `hmac`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;
use crate::utils::token_generator::{SALT_LENGTH_BYTES, random_bytes};
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Hashes `password` with a fresh random salt.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system RNG fails.
pub fn hash_password(pepper: &str, password: &str) -> Result<String, AppError> {
    let salt = random_bytes::<SALT_LENGTH_BYTES>()?;
    let mac = keyed_mac(pepper, &salt, password)?;
    Ok(format!(
        "{}${}",
        hex::encode(salt),
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Checks `password` against a value produced by [`hash_password`].
///
/// Malformed stored values never verify.
pub fn verify_password(pepper: &str, password: &str, stored: &str) -> bool {
    let Some((salt_hex, mac_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(mac_hex)) else {
        return false;
    };

    match keyed_mac(pepper, &salt, password) {
        Ok(mac) => mac.verify_slice(&expected).is_ok(),
        Err(_) => false,
    }
}

fn keyed_mac(pepper: &str, salt: &[u8], password: &str) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(pepper.as_bytes())
        .map_err(|_| AppError::internal("Invalid password pepper", json!({})))?;
    mac.update(salt);
    mac.update(password.as_bytes());
    Ok(mac)
}
