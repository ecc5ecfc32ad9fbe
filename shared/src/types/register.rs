use serde::{Deserialize, Serialize};

/// Student signup request data
#[derive(Debug, Clone, Deserialize)]
pub struct SignupData {
    pub reg_id: String,
    pub email: String,
    pub password: String,
}

/// Admin signup request data
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSignupData {
    pub username: String,
    pub password: String,
}

/// Signup response codes
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignupResponse {
    Success {
        account_id: i64,
        login_key: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Error codes for signup
#[derive(Debug)]
pub enum SignupError {
    RegIdTaken,
    EmailTaken,
    UsernameTaken,
    WeakPassword,
    MissingField(String),
    DatabaseError,
    InternalError,
}

impl SignupError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::RegIdTaken => "REG_ID_TAKEN",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::RegIdTaken => "Reg Id already exists".to_string(),
            Self::EmailTaken => "Email already exists".to_string(),
            Self::UsernameTaken => "Username already exists".to_string(),
            Self::WeakPassword => "Password must be at least 8 characters".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> SignupResponse {
        SignupResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}

impl std::fmt::Display for SignupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.to_code(), self.to_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_data_deserializes_from_json() {
        let json = r#"{"reg_id":"S101","email":"a@x.com","password":"longenough"}"#;
        let d: SignupData = serde_json::from_str(json).unwrap();
        assert_eq!(d.reg_id, "S101");
        assert_eq!(d.email, "a@x.com");
    }

    #[test]
    fn conflict_codes_are_distinct() {
        assert_ne!(
            SignupError::RegIdTaken.to_code(),
            SignupError::EmailTaken.to_code()
        );
    }

    #[test]
    fn missing_field_message_names_the_field() {
        let e = SignupError::MissingField("email".into());
        assert!(e.to_message().contains("email"));
    }
}
