use serde::{Deserialize, Serialize};

/// Student login request data
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub reg_id: String,
    pub password: String,
}

/// Admin login request data
#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginData {
    pub username: String,
    pub password: String,
}

/// Login response codes.
///
/// `PendingVerification` is a first-class success-shaped outcome, not an
/// error: the credentials were correct but the account has not confirmed its
/// email yet, so no token is issued.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Success {
        account_id: i64,
        reg_id: String,
        email: Option<String>,
        expires_in: u64,
        message: String,
    },
    PendingVerification {
        reg_id: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Error codes for login
#[derive(Debug)]
pub enum LoginError {
    /// Password hash comparison failed.  Kept distinct from `NotFound`;
    /// the HTTP layer maps them to the 400 / 404 split existing clients
    /// key their UI flow on.
    InvalidCredentials,
    NotFound,
    MissingField(String),
    DatabaseError,
    InternalError,
}

impl LoginError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::NotFound => "NOT_FOUND",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Password is incorrect".to_string(),
            Self::NotFound => "Account not found".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> LoginResponse {
        LoginResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.to_code(), self.to_message())
    }
}
