use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use tracing::{error, info, warn};

use shared::types::{AccountType, AdminSignupData, SignupData, SignupError, SignupResponse};

use crate::AppState;
use crate::database::accounts::{self, NewAccount};
use crate::database::utils;
use crate::handlers::http::utils::json_response::deliver_serialized_json;

/// Main student signup handler
pub async fn handle_signup(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing signup request");

    let signup_data = match parse_signup_body(req).await {
        Ok(data) => data,
        Err(signup_error) => {
            warn!("Signup parsing failed: {:?}", signup_error.to_code());
            return deliver_serialized_json(&signup_error.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    if let Err(signup_error) = validate_signup(&signup_data) {
        warn!("Signup validation failed: {:?}", signup_error.to_code());
        return deliver_serialized_json(&signup_error.to_response(), StatusCode::BAD_REQUEST);
    }

    match attempt_signup(&signup_data, &state).await {
        Ok(response_data) => deliver_serialized_json(&response_data, StatusCode::CREATED),
        Err(signup_error) => {
            warn!("Signup failed: {:?}", signup_error.to_code());
            deliver_serialized_json(&signup_error.to_response(), StatusCode::BAD_REQUEST)
        }
    }
}

/// Main admin signup handler
pub async fn handle_admin_signup(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing admin signup request");

    let signup_data = match parse_admin_signup_body(req).await {
        Ok(data) => data,
        Err(signup_error) => {
            warn!("Admin signup parsing failed: {:?}", signup_error.to_code());
            return deliver_serialized_json(&signup_error.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    match attempt_admin_signup(&signup_data, &state).await {
        Ok(response_data) => deliver_serialized_json(&response_data, StatusCode::CREATED),
        Err(signup_error) => {
            warn!("Admin signup failed: {:?}", signup_error.to_code());
            deliver_serialized_json(&signup_error.to_response(), StatusCode::BAD_REQUEST)
        }
    }
}

/// Parse student signup JSON body
async fn parse_signup_body(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<SignupData, SignupError> {
    let body = req
        .collect()
        .await
        .map_err(|_| SignupError::InternalError)?
        .to_bytes();

    serde_json::from_slice::<SignupData>(&body)
        .map_err(|_| SignupError::MissingField("reg_id, email or password".to_string()))
}

/// Parse admin signup JSON body
async fn parse_admin_signup_body(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<AdminSignupData, SignupError> {
    let body = req
        .collect()
        .await
        .map_err(|_| SignupError::InternalError)?
        .to_bytes();

    serde_json::from_slice::<AdminSignupData>(&body)
        .map_err(|_| SignupError::MissingField("username or password".to_string()))
}

/// Validate signup data
fn validate_signup(data: &SignupData) -> std::result::Result<(), SignupError> {
    if data.reg_id.trim().is_empty() {
        return Err(SignupError::MissingField("reg_id".to_string()));
    }

    if !utils::is_valid_email(&data.email) {
        return Err(SignupError::MissingField("email".to_string()));
    }

    if !utils::is_strong_password(&data.password) {
        return Err(SignupError::WeakPassword);
    }

    Ok(())
}

/// Create the student account and its empty detail row, then queue the
/// verification mail.  Account creation is transactional; a failed mail send
/// does not undo it, the token stays stored for a later resend.
pub async fn attempt_signup(
    data: &SignupData,
    state: &AppState,
) -> std::result::Result<SignupResponse, SignupError> {
    info!("Attempting signup for reg_id: {}", data.reg_id);

    if accounts::reg_id_exists(&state.db, data.reg_id.clone())
        .await
        .map_err(|e| {
            error!("Database error checking reg_id: {}", e);
            SignupError::DatabaseError
        })?
    {
        return Err(SignupError::RegIdTaken);
    }

    if accounts::email_exists(&state.db, data.email.clone())
        .await
        .map_err(|e| {
            error!("Database error checking email: {}", e);
            SignupError::DatabaseError
        })?
    {
        return Err(SignupError::EmailTaken);
    }

    let password_hash = utils::hash_password(&data.password).map_err(|e| {
        error!("Password hashing error: {}", e);
        SignupError::InternalError
    })?;

    let verification_token = utils::generate_verification_token();

    let account_id = accounts::create_account_with_detail(
        &state.db,
        NewAccount {
            account_type: AccountType::Student,
            reg_id: Some(data.reg_id.clone()),
            username: None,
            email: Some(data.email.clone()),
            password_hash,
            verification_token: Some(verification_token.clone()),
        },
    )
    .await
    .map_err(|e| {
        error!("Failed to create account: {}", e);
        // The existence checks above race with concurrent signups; the
        // UNIQUE constraint is the authority and lands here.
        SignupError::RegIdTaken
    })?;

    if let Err(e) = state
        .mailer
        .send_verification(&data.email, &data.reg_id, &verification_token)
        .await
    {
        warn!("Verification mail failed for {}: {}", data.reg_id, e);
    }

    info!("Signup successful: {} (ID: {})", data.reg_id, account_id);

    Ok(SignupResponse::Success {
        account_id,
        login_key: data.reg_id.clone(),
        message: "Account created. Check your email to verify.".to_string(),
    })
}

/// Create an admin account.  Admins skip email verification entirely.
pub async fn attempt_admin_signup(
    data: &AdminSignupData,
    state: &AppState,
) -> std::result::Result<SignupResponse, SignupError> {
    info!("Attempting admin signup for username: {}", data.username);

    if data.username.trim().is_empty() {
        return Err(SignupError::MissingField("username".to_string()));
    }

    if !utils::is_strong_password(&data.password) {
        return Err(SignupError::WeakPassword);
    }

    if accounts::username_exists(&state.db, data.username.clone())
        .await
        .map_err(|e| {
            error!("Database error checking username: {}", e);
            SignupError::DatabaseError
        })?
    {
        return Err(SignupError::UsernameTaken);
    }

    let password_hash = utils::hash_password(&data.password).map_err(|e| {
        error!("Password hashing error: {}", e);
        SignupError::InternalError
    })?;

    let account_id = accounts::create_account_with_detail(
        &state.db,
        NewAccount {
            account_type: AccountType::Admin,
            reg_id: None,
            username: Some(data.username.clone()),
            email: None,
            password_hash,
            verification_token: None,
        },
    )
    .await
    .map_err(|e| {
        error!("Failed to create admin account: {}", e);
        SignupError::UsernameTaken
    })?;

    info!(
        "Admin signup successful: {} (ID: {})",
        data.username, account_id
    );

    Ok(SignupResponse::Success {
        account_id,
        login_key: data.username.clone(),
        message: "Admin account created".to_string(),
    })
}
