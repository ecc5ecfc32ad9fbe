use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the API with credentials.  Matched exactly
    /// against the incoming `Origin` header.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_token_expiry")]
    pub token_expiry_minutes: u64,
    /// HMAC key used to sign and verify session JWTs.
    ///
    /// Prefer loading this via the `JWT_SECRET` environment variable.  This
    /// config field is the fallback for deployments that cannot inject env
    /// vars at runtime (e.g. certain container setups).
    ///
    /// **Minimum length:** 32 characters.
    /// Rotating the secret invalidates every outstanding session token, so
    /// it is read exactly once at startup.
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Base URL the verification link is built from, e.g.
    /// `https://portal.example.com/verify`.
    #[serde(default = "default_verification_base_url")]
    pub verification_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory profile pictures are written to.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default = "default_database")]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default = "default_mail")]
    pub mail: MailConfig,
    #[serde(default = "default_storage")]
    pub storage: StorageConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"0.0.0.0:3000"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

impl AuthConfig {
    /// Token expiry converted to seconds — convenience for cookie `Max-Age`
    /// and the JWT `exp` claim.
    pub fn token_expiry_secs(&self) -> u64 {
        self.token_expiry_minutes * 60
    }

    /// Resolve the JWT secret with `JWT_SECRET` env-var taking priority over
    /// the config file field.
    ///
    /// Returns `None` when neither source is set (the server startup code
    /// treats this as a hard error).
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.clone())
            .filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_port() -> u16 {
    3000
}

pub fn default_db_path() -> String {
    "portal.db".to_string()
}

pub fn default_token_expiry() -> u64 {
    // 24 hours
    1440
}

fn default_mail_from() -> String {
    "noreply@localhost".to_string()
}

fn default_verification_base_url() -> String {
    "http://localhost:3000/verify".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_database() -> DatabaseConfig {
    DatabaseConfig {
        path: default_db_path(),
    }
}

fn default_mail() -> MailConfig {
    MailConfig {
        from: default_mail_from(),
        verification_base_url: default_verification_base_url(),
    }
}

fn default_storage() -> StorageConfig {
    StorageConfig {
        upload_dir: default_upload_dir(),
    }
}
