use serde::{Deserialize, Serialize};

/// Uniform error body for endpoints that have no richer response enum of
/// their own (jobs, ad-hoc 404s).  `status` is always `"error"` so clients
/// can branch on it before looking at the code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    /// Stable machine-readable code, e.g. `"ALREADY_APPLIED"`.
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}
