use serde::{Deserialize, Serialize};

/// A detail record as stored and as returned to clients — always the full
/// post-merge state.
///
/// Exists 1:1 with an account and is meaningless without it; the server
/// creates an empty one inside the same transaction as the account row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub account_id: i64,
    pub fullname: Option<String>,
    pub phone: Option<i64>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub postal_code: Option<i64>,
    /// Organizational branch — used by admin details only.
    pub branch: Option<String>,
    /// Blob-store path of the profile picture, if any.
    pub profilepic: Option<String>,
}

/// A partial update to a detail record.
///
/// Every field is optional: `Some(v)` overwrites the stored field, `None`
/// (i.e. the key was absent from the request) leaves it untouched.  Numeric
/// fields go through `Option<i64>` so an explicit `0` is a real value,
/// distinct from omission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailPatch {
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub phone: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub postal_code: Option<i64>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub profilepic: Option<String>,
}

impl DetailPatch {
    /// Merge this patch into `record`, overwriting exactly the fields that
    /// are present.  Pure overwrite semantics: applying the same patch twice
    /// leaves the record in the same state as applying it once.
    pub fn apply(&self, record: &mut DetailRecord) {
        if let Some(ref v) = self.fullname {
            record.fullname = Some(v.clone());
        }
        if let Some(v) = self.phone {
            record.phone = Some(v);
        }
        if let Some(ref v) = self.address {
            record.address = Some(v.clone());
        }
        if let Some(ref v) = self.gender {
            record.gender = Some(v.clone());
        }
        if let Some(v) = self.postal_code {
            record.postal_code = Some(v);
        }
        if let Some(ref v) = self.branch {
            record.branch = Some(v.clone());
        }
        if let Some(ref v) = self.profilepic {
            record.profilepic = Some(v.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fullname.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.gender.is_none()
            && self.postal_code.is_none()
            && self.branch.is_none()
            && self.profilepic.is_none()
    }
}

/// Detail response codes
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetailResponse {
    Success {
        detail: DetailRecord,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Error codes for detail reads and upserts
#[derive(Debug)]
pub enum DetailError {
    OwnerNotFound,
    DetailNotFound,
    /// Password confirmation failed for a password-gated upsert.
    InvalidPassword,
    MissingField(String),
    /// Blob upload or delete failed — distinct from validation so the
    /// caller can retry just the attachment step.
    StorageFailure,
    DatabaseError,
    InternalError,
}

impl DetailError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::OwnerNotFound => "OWNER_NOT_FOUND",
            Self::DetailNotFound => "DETAIL_NOT_FOUND",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::OwnerNotFound => "Account not found".to_string(),
            Self::DetailNotFound => "Details not found".to_string(),
            Self::InvalidPassword => "Invalid password".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::StorageFailure => "Failed to store attachment".to_string(),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> DetailResponse {
        DetailResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}

impl std::fmt::Display for DetailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.to_code(), self.to_message())
    }
}
