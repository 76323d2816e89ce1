//! Challenge-response authentication hash.
//!
//! When the server requires a password, its Hello frame carries a random
//! `salt` and `challenge`.  The client proves it knows the password without
//! sending it:
//!
//! ```text
//! secret = base64( sha256( password ++ salt ) )
//! auth   = base64( sha256( secret ++ challenge ) )
//! ```
//!
//! Both base64 steps use the standard alphabet with padding, and the
//! concatenations are plain UTF-8 string joins.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Computes the authentication string sent in the Identify frame.
pub fn compute_auth_token(password: &str, salt: &str, challenge: &str) -> String {
    let secret = sha256_b64(&[password.as_bytes(), salt.as_bytes()]);
    sha256_b64(&[secret.as_bytes(), challenge.as_bytes()])
}

fn sha256_b64(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    STANDARD.encode(hasher.finalize())
}
