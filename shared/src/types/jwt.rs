use serde::{Deserialize, Serialize};

/// Which partition of the accounts collection a token belongs to.
///
/// Students log in with a registration id, admins with a username.  The two
/// share one table; the gate uses this flag to know which lookup to run when
/// it resolves the token back to an account row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Student,
    Admin,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Claims embedded in every session JWT issued by the server.
///
/// The token is self-contained: verifying the HMAC signature and the `exp`
/// claim requires **zero DB reads**.  The authorization gate additionally
/// re-resolves the account row by `account_id` so that a deleted account
/// stops authenticating even before its token expires.
///
/// There is no server-side revocation list — logout only deletes the cookie
/// on the client, and a token issued before logout stays cryptographically
/// valid until `exp`.  This is intentional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Standard JWT subject — the login key (reg_id or username).
    pub sub: String,

    /// Numeric account ID (matches `accounts.id`).
    pub account_id: i64,

    /// Which lookup the gate runs when resolving this token.
    pub account_type: AccountType,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: usize,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: usize,
}
