//! User authentication and stateless session tokens.
//!
//! Credentials live in a plain text users file (`username:password` per
//! line). Sessions are stateless: a signed token carries the username and an
//! expiry, so the server keeps no session table and restarts never log
//! anyone out.
//!
//! Token wire format, URL-safe base64 without padding:
//!
//! ```text
//! b64url(username ":" exp_unix) "." b64url(hmac_sha256(secret, payload))
//! ```
//!
//! Verification treats every malformed input (bad base64, missing dot,
//! bogus expiry, wrong signature) as "no session", never as an error that
//! could leak why a token was rejected.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Default session lifetime: 14 days.
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 14);

/// An authenticated user. Only the name; the password never travels past
/// [`authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

/// Parse the users file into `(username, password)` pairs.
///
/// Blank lines and `#` comments are ignored, as is any line without a `:`
/// or with an empty user or password. A missing file is an empty user set,
/// not an error; the operator simply has not provisioned anyone yet.
fn parse_users_file(users_file: &Path) -> Vec<(String, String)> {
    let Ok(contents) = std::fs::read_to_string(users_file) else {
        return Vec::new();
    };

    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(user, pass)| (user.trim().to_string(), pass.trim().to_string()))
        .filter(|(user, pass)| !user.is_empty() && !pass.is_empty())
        .collect()
}

/// Check a username/password pair against the users file.
///
/// The comparison goes through fixed-length digests so timing does not
/// short-circuit on the first differing byte of the raw strings.
pub fn authenticate(users_file: &Path, username: &str, password: &str) -> Option<User> {
    let users = parse_users_file(users_file);
    let expected = users
        .iter()
        .find(|(user, _)| user == username)
        .map(|(_, pass)| pass)?;

    if Sha256::digest(expected.as_bytes()) != Sha256::digest(password.as_bytes()) {
        return None;
    }
    Some(User {
        username: username.to_string(),
    })
}

fn sign(secret: &str, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Mint a signed session token for `username`, valid for `ttl`.
pub fn create_session_token(secret: &str, username: &str, ttl: Duration) -> String {
    let exp = unix_now() + ttl.as_secs();
    let payload = format!("{username}:{exp}");
    let sig = sign(secret, payload.as_bytes());
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload.as_bytes()),
        URL_SAFE_NO_PAD.encode(sig)
    )
}

/// Verify a session token and return its user, or `None` for anything
/// expired, tampered with, or malformed.
pub fn verify_session_token(secret: &str, token: &str) -> Option<User> {
    let (payload_b64, sig_b64) = token.split_once('.')?;
    let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let sig = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(&payload);
    mac.verify_slice(&sig).ok()?;

    let decoded = String::from_utf8(payload).ok()?;
    let (username, exp) = decoded.rsplit_once(':')?;
    let exp: u64 = exp.parse().ok()?;
    if exp < unix_now() || username.is_empty() {
        return None;
    }
    Some(User {
        username: username.to_string(),
    })
}
