use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{error, info, warn};

use shared::types::{AccountType, AdminLoginData, LoginData, LoginError, LoginResponse};

use crate::AppState;
use crate::database::accounts;
use crate::database::utils::verify_password;
use crate::handlers::http::utils::headers::{create_token_cookie, issue_jwt};
use crate::handlers::http::utils::json_response::deliver_serialized_json;

/// A login that passed credential checks, plus the signed token to hand out.
pub struct LoginSuccess {
    pub account_id: i64,
    pub login_key: String,
    pub email: Option<String>,
    pub token: String,
}

/// What a login attempt produced.  Pending verification is not an error:
/// the password was right, but no token is issued until the email is
/// confirmed.
pub enum LoginOutcome {
    Ok(LoginSuccess),
    PendingVerification { login_key: String },
}

/// Main student login handler
pub async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing login request");

    let login_data = match parse_login_body(req).await {
        Ok(data) => data,
        Err(login_error) => {
            warn!("Login parsing failed: {:?}", login_error.to_code());
            return deliver_serialized_json(&login_error.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    if let Err(login_error) = validate_login(&login_data) {
        warn!("Login validation failed: {:?}", login_error.to_code());
        return deliver_serialized_json(&login_error.to_response(), StatusCode::BAD_REQUEST);
    }

    match attempt_login(&login_data, &state).await {
        Ok(outcome) => deliver_login_outcome(outcome, &state),
        Err(login_error) => {
            warn!("Login failed: {:?}", login_error.to_code());
            deliver_serialized_json(&login_error.to_response(), error_status(&login_error))
        }
    }
}

/// Main admin login handler
pub async fn handle_admin_login(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing admin login request");

    let login_data = match parse_admin_login_body(req).await {
        Ok(data) => data,
        Err(login_error) => {
            warn!("Admin login parsing failed: {:?}", login_error.to_code());
            return deliver_serialized_json(&login_error.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    match attempt_admin_login(&login_data, &state).await {
        Ok(outcome) => deliver_login_outcome(outcome, &state),
        Err(login_error) => {
            warn!("Admin login failed: {:?}", login_error.to_code());
            deliver_serialized_json(&login_error.to_response(), error_status(&login_error))
        }
    }
}

// Unknown account and wrong password map to different statuses.  This
// mirrors what existing clients key their UI flow on, so it stays even
// though it leaks key existence.
fn error_status(err: &LoginError) -> StatusCode {
    match err {
        LoginError::NotFound => StatusCode::NOT_FOUND,
        LoginError::InvalidCredentials | LoginError::MissingField(_) => StatusCode::BAD_REQUEST,
        LoginError::DatabaseError | LoginError::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn deliver_login_outcome(
    outcome: LoginOutcome,
    state: &AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match outcome {
        LoginOutcome::Ok(success) => {
            let expiry_secs = state.config.auth.token_expiry_secs();
            let cookie = create_token_cookie(&success.token, Duration::from_secs(expiry_secs))
                .context("Failed to create token cookie")?;

            let response_data = LoginResponse::Success {
                account_id: success.account_id,
                reg_id: success.login_key,
                email: success.email,
                expires_in: expiry_secs,
                message: "Login successful".to_string(),
            };

            let json =
                serde_json::to_string(&response_data).context("Failed to serialize response")?;

            let response = Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .header("set-cookie", cookie)
                .body(crate::handlers::http::utils::json_response::full(json))
                .context("Failed to build response")?;

            Ok(response)
        }
        LoginOutcome::PendingVerification { login_key } => {
            let response_data = LoginResponse::PendingVerification {
                reg_id: login_key,
                message: "Please verify your email before logging in".to_string(),
            };
            deliver_serialized_json(&response_data, StatusCode::OK)
        }
    }
}

/// Parse student login JSON body
async fn parse_login_body(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<LoginData, LoginError> {
    let body = req
        .collect()
        .await
        .map_err(|_| LoginError::InternalError)?
        .to_bytes();

    serde_json::from_slice::<LoginData>(&body)
        .map_err(|_| LoginError::MissingField("reg_id or password".to_string()))
}

/// Parse admin login JSON body
async fn parse_admin_login_body(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<AdminLoginData, LoginError> {
    let body = req
        .collect()
        .await
        .map_err(|_| LoginError::InternalError)?
        .to_bytes();

    serde_json::from_slice::<AdminLoginData>(&body)
        .map_err(|_| LoginError::MissingField("username or password".to_string()))
}

/// Validate login data
fn validate_login(data: &LoginData) -> std::result::Result<(), LoginError> {
    if data.reg_id.is_empty() {
        return Err(LoginError::MissingField("reg_id".to_string()));
    }

    if data.password.is_empty() {
        return Err(LoginError::MissingField("password".to_string()));
    }

    Ok(())
}

/// Attempt to log in a student against the database
pub async fn attempt_login(
    data: &LoginData,
    state: &AppState,
) -> std::result::Result<LoginOutcome, LoginError> {
    info!("Attempting login for reg_id: {}", data.reg_id);

    let account = accounts::get_account_by_reg_id(&state.db, data.reg_id.clone())
        .await
        .map_err(|e| {
            error!("Database error getting account: {}", e);
            LoginError::DatabaseError
        })?
        .ok_or_else(|| {
            warn!("Account not found: {}", data.reg_id);
            LoginError::NotFound
        })?;

    let password_valid =
        verify_password(&account.password_hash, &data.password).map_err(|e| {
            error!("Password verification error: {}", e);
            LoginError::InternalError
        })?;

    if !password_valid {
        warn!("Invalid password for reg_id: {}", data.reg_id);
        return Err(LoginError::InvalidCredentials);
    }

    if !account.verified {
        info!("Unverified account tried to log in: {}", data.reg_id);
        return Ok(LoginOutcome::PendingVerification {
            login_key: data.reg_id.clone(),
        });
    }

    let token = issue_jwt(
        account.id,
        &data.reg_id,
        AccountType::Student,
        &state.jwt_secret,
        state.config.auth.token_expiry_secs(),
    )
    .map_err(|e| {
        error!("Failed to sign token: {}", e);
        LoginError::InternalError
    })?;

    info!("Login successful: {} (ID: {})", data.reg_id, account.id);

    Ok(LoginOutcome::Ok(LoginSuccess {
        account_id: account.id,
        login_key: data.reg_id.clone(),
        email: account.email,
        token,
    }))
}

/// Attempt to log in an admin against the database
pub async fn attempt_admin_login(
    data: &AdminLoginData,
    state: &AppState,
) -> std::result::Result<LoginOutcome, LoginError> {
    info!("Attempting admin login for username: {}", data.username);

    if data.username.is_empty() {
        return Err(LoginError::MissingField("username".to_string()));
    }
    if data.password.is_empty() {
        return Err(LoginError::MissingField("password".to_string()));
    }

    let account = accounts::get_account_by_username(&state.db, data.username.clone())
        .await
        .map_err(|e| {
            error!("Database error getting admin account: {}", e);
            LoginError::DatabaseError
        })?
        .ok_or_else(|| {
            warn!("Admin account not found: {}", data.username);
            LoginError::NotFound
        })?;

    let password_valid =
        verify_password(&account.password_hash, &data.password).map_err(|e| {
            error!("Password verification error: {}", e);
            LoginError::InternalError
        })?;

    if !password_valid {
        warn!("Invalid password for admin: {}", data.username);
        return Err(LoginError::InvalidCredentials);
    }

    let token = issue_jwt(
        account.id,
        &data.username,
        AccountType::Admin,
        &state.jwt_secret,
        state.config.auth.token_expiry_secs(),
    )
    .map_err(|e| {
        error!("Failed to sign token: {}", e);
        LoginError::InternalError
    })?;

    info!(
        "Admin login successful: {} (ID: {})",
        data.username, account.id
    );

    Ok(LoginOutcome::Ok(LoginSuccess {
        account_id: account.id,
        login_key: data.username.clone(),
        email: account.email,
        token,
    }))
}
