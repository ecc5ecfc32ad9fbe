pub mod detail;
pub mod job;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod register;
pub mod server_config;

pub use self::detail::{DetailError, DetailPatch, DetailRecord, DetailResponse};
pub use self::job::{ApplyData, JobError, JobView, NewJobData};
pub use self::json_error::ErrorResponse;
pub use self::jwt::{AccountType, JwtClaims};
pub use self::login::{AdminLoginData, LoginData, LoginError, LoginResponse};
pub use self::register::{AdminSignupData, SignupData, SignupError, SignupResponse};
pub use self::server_config::{AppConfig, AuthConfig, ConfigError, ServerConfig};
