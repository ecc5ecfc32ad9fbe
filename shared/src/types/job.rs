use serde::{Deserialize, Serialize};

/// A job posting as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub id: i64,
    pub job_uid: String,
    pub company: String,
    pub logo: Option<String>,
    pub role: String,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Account ids of everyone who applied.
    pub applicants: Vec<i64>,
}

/// Request data for creating a posting.  `admin_key` is the poster's login
/// key; the server checks the account's role before accepting.
#[derive(Debug, Clone, Deserialize)]
pub struct NewJobData {
    pub admin_key: String,
    pub company: String,
    #[serde(default)]
    pub logo: Option<String>,
    pub role: String,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request data for applying to a posting.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyData {
    pub account_id: i64,
    pub job_id: i64,
}

/// Error codes for the job endpoints
#[derive(Debug)]
pub enum JobError {
    JobNotFound,
    AccountNotFound,
    /// The (account, job) pair already exists — never silently deduplicated.
    AlreadyApplied,
    NotAuthorized,
    MissingField(String),
    DatabaseError,
}

impl JobError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::JobNotFound => "JOB_NOT_FOUND",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::AlreadyApplied => "ALREADY_APPLIED",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::JobNotFound => "Job not found".to_string(),
            Self::AccountNotFound => "Account not found".to_string(),
            Self::AlreadyApplied => "You have already applied for this job".to_string(),
            Self::NotAuthorized => "Not an admin".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::DatabaseError => "Database error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> super::json_error::ErrorResponse {
        super::json_error::ErrorResponse::new(self.to_code(), &self.to_message())
    }
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.to_code(), self.to_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_data_deserializes() {
        let d: ApplyData = serde_json::from_str(r#"{"account_id":3,"job_id":7}"#).unwrap();
        assert_eq!(d.account_id, 3);
        assert_eq!(d.job_id, 7);
    }

    #[test]
    fn new_job_optional_fields_default_to_none() {
        let json = r#"{"admin_key":"tpo","company":"Acme","role":"SDE"}"#;
        let d: NewJobData = serde_json::from_str(json).unwrap();
        assert!(d.salary.is_none());
        assert!(d.logo.is_none());
    }

    #[test]
    fn already_applied_has_its_own_code() {
        assert_eq!(JobError::AlreadyApplied.to_code(), "ALREADY_APPLIED");
    }
}
