use anyhow::{Result, anyhow};
use hyper::Request;
use hyper::header::{HeaderMap, HeaderValue};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::time::Duration;
use tracing::{debug, warn};

use shared::types::{AccountType, JwtClaims};

use crate::database::accounts::{Account, get_account_by_id};

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| {
        debug!("Retrieved header: {}", name);
        s.to_string()
    })
}

/// Extract cookie value by name
pub fn get_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                let name = parts.next()?.trim();
                let value = parts.next()?.trim();
                if name == cookie_name {
                    debug!("Cookie found: {}", cookie_name);
                    Some(value.to_string())
                } else {
                    None
                }
            })
        })
}

/// Set a cookie with options
pub fn set_cookie(
    name: &str,
    value: &str,
    max_age: Option<Duration>,
    path: Option<&str>,
    http_only: bool,
    secure: bool,
) -> Result<HeaderValue> {
    let mut cookie = format!("{}={}", name, value);

    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", age.as_secs()));
    }

    if let Some(p) = path {
        cookie.push_str(&format!("; Path={}", p));
    }

    if http_only {
        cookie.push_str("; HttpOnly");
    }

    if secure {
        cookie.push_str("; Secure");
    }

    // Lax rather than Strict: the verification link arrives from the mail
    // client and must carry the cookie on the top-level navigation.
    cookie.push_str("; SameSite=Lax");

    debug!("Setting cookie: {}", name);

    HeaderValue::from_str(&cookie).map_err(|e| {
        warn!("Failed to create cookie header for {}: {}", name, e);
        anyhow!("Invalid cookie value: {}", e)
    })
}

/// Create the persistent `token` cookie carrying the JWT.
pub fn create_token_cookie(token: &str, max_age: Duration) -> Result<HeaderValue> {
    debug!("Creating token cookie with max_age: {:?}", max_age);
    set_cookie("token", token, Some(max_age), Some("/"), true, false)
}

/// Delete the `token` cookie by setting it to expire
pub fn delete_token_cookie() -> Result<HeaderValue> {
    debug!("Deleting token cookie");
    set_cookie("token", "", Some(Duration::from_secs(0)), Some("/"), true, false)
}

/// Why a token failed to decode.  Expiry is reported separately so clients
/// can distinguish "log in again" from "this token was never valid".
#[derive(Debug, PartialEq)]
pub enum TokenError {
    Missing,
    Expired,
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Missing => "No authentication token",
            Self::Expired => "Token expired",
            Self::Invalid => "Invalid token",
        };
        write!(f, "{}", s)
    }
}

/// Sign a JWT for the account.  Stateless: nothing is written to the
/// database, and nothing can revoke the token before `exp`.
pub fn issue_jwt(
    account_id: i64,
    login_key: &str,
    account_type: AccountType,
    secret: &str,
    expiry_secs: u64,
) -> Result<String> {
    let iat = crate::database::utils::get_timestamp() as usize;
    let claims = JwtClaims {
        sub: login_key.to_string(),
        account_id,
        account_type,
        exp: iat + expiry_secs as usize,
        iat,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("Failed to sign JWT: {}", e))
}

/// Decode and verify a JWT string (signature + expiry, zero DB reads).
pub fn decode_jwt(token: &str, secret: &str) -> std::result::Result<JwtClaims, TokenError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

/// Extract the JWT from the `token` cookie and verify it.  The cookie is the
/// only supported carrier.
pub fn decode_jwt_claims(
    req: &Request<hyper::body::Incoming>,
    secret: &str,
) -> std::result::Result<JwtClaims, TokenError> {
    let token = get_cookie(req.headers(), "token").ok_or(TokenError::Missing)?;
    decode_jwt(&token, secret)
}

/// Why the gate refused a request.  Token trouble and a vanished account
/// are kept apart: the router answers 401 for the former and 404 for the
/// latter.
#[derive(Debug)]
pub enum AuthError {
    Token(TokenError),
    /// The signature checked out but the account row is gone.
    AccountGone,
    Database(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(e) => write!(f, "{}", e),
            Self::AccountGone => write!(f, "Account no longer exists"),
            Self::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

/// Resolve verified claims back to a live account row.
///
/// The DB lookup catches tokens whose account was deleted after issue; a
/// valid signature alone does not prove the principal still exists.
pub async fn resolve_account(
    claims: &JwtClaims,
    state: &crate::AppState,
) -> std::result::Result<Account, AuthError> {
    get_account_by_id(&state.db, claims.account_id)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?
        .ok_or(AuthError::AccountGone)
}

/// Full authorization gate: verified claims plus a live account row.
pub async fn authorize(
    req: &Request<hyper::body::Incoming>,
    state: &crate::AppState,
) -> std::result::Result<Account, AuthError> {
    let claims = decode_jwt_claims(req, &state.jwt_secret).map_err(AuthError::Token)?;
    let account = resolve_account(&claims, state).await?;

    debug!("Authorized account:{} ({})", account.id, claims.sub);
    Ok(account)
}
