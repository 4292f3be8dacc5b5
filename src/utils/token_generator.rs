//! Random token and salt generation.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Random bytes in a bearer token before encoding.
const TOKEN_LENGTH_BYTES: usize = 32;

/// Random bytes in a password salt.
pub const SALT_LENGTH_BYTES: usize = 16;

/// Generates a bearer token: 32 bytes from the OS RNG, URL-safe base64
/// without padding (43 characters).
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system RNG fails.
pub fn generate_token() -> Result<String, AppError> {
    let buffer = random_bytes::<TOKEN_LENGTH_BYTES>()?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Fills an `N`-byte array from the OS RNG.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system RNG fails.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], AppError> {
    let mut buffer = [0u8; N];
    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;
    Ok(buffer)
}
