//! Password material for binding roles.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::{ProvisionError, ProvisionResult};

pub const DEFAULT_PASSWORD_BYTES: usize = 16;
pub const MIN_PASSWORD_BYTES: usize = 8;

/// Draw `byte_len` bytes from the operating system CSPRNG and encode them
/// as URL-safe base64 (no padding), so the result can sit in a connection
/// URL's userinfo untouched.
///
/// A failing random source is an error; there is no weaker fallback.
pub fn generate_password(byte_len: usize) -> ProvisionResult<String> {
    if byte_len < MIN_PASSWORD_BYTES {
        return Err(ProvisionError::InvalidConfig(format!(
            "password length {byte_len} is below the minimum of {MIN_PASSWORD_BYTES} bytes"
        )));
    }

    let mut buf = vec![0u8; byte_len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| ProvisionError::Random(e.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(&buf))
}
