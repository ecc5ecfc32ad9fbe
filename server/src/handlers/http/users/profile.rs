use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use tracing::{error, info, warn};

use crate::AppState;
use crate::database::accounts::{self, Account};
use crate::database::jobs;
use crate::database::utils::{is_valid_email, verify_password};
use crate::handlers::http::utils::json_response::{deliver_error_json, deliver_success_json};

/// Public view of an account: everything a profile page needs, never the
/// hash.
fn public_profile(account: &Account, applied_jobs: Vec<i64>) -> serde_json::Value {
    serde_json::json!({
        "account_id": account.id,
        "account_type": account.account_type.as_str(),
        "login_key": account.login_key(),
        "email": account.email,
        "role": account.role,
        "verified": account.verified,
        "applied_jobs": applied_jobs,
    })
}

fn query_param(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect::<HashMap<String, String>>()
        .remove(name)
}

/// Handle GET /users?reg_id= — public student profile
pub async fn handle_get_profile(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let reg_id = match query_param(&req, "reg_id") {
        Some(id) if !id.is_empty() => id,
        _ => {
            return deliver_error_json(
                "MISSING_FIELD",
                "Missing required field: reg_id",
                StatusCode::BAD_REQUEST,
            );
        }
    };

    match lookup_profile(&reg_id, &state).await {
        Ok(body) => deliver_success_json(Some(body)),
        Err(resp) => resp,
    }
}

pub async fn lookup_profile(
    reg_id: &str,
    state: &AppState,
) -> std::result::Result<serde_json::Value, Result<Response<BoxBody<Bytes, Infallible>>>> {
    let account = accounts::get_account_by_reg_id(&state.db, reg_id.to_string())
        .await
        .map_err(|e| {
            error!("Database error getting profile: {}", e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        })?
        .ok_or_else(|| {
            deliver_error_json("NOT_FOUND", "Account not found", StatusCode::NOT_FOUND)
        })?;

    let applied = jobs::applied_jobs_for(&state.db, account.id)
        .await
        .unwrap_or_default();

    Ok(public_profile(&account, applied))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileData {
    pub reg_id: String,
    pub password: String,
    pub email: String,
}

/// Handle POST /users — password-confirmed email update.
pub async fn handle_update_profile(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing profile update request");

    let body = req.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    let data: UpdateProfileData = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(_) => {
            return deliver_error_json(
                "MISSING_FIELD",
                "Missing required field: reg_id, password or email",
                StatusCode::BAD_REQUEST,
            );
        }
    };

    match attempt_update_profile(&data, &state).await {
        Ok(body) => deliver_success_json(Some(body)),
        Err(resp) => resp,
    }
}

pub async fn attempt_update_profile(
    data: &UpdateProfileData,
    state: &AppState,
) -> std::result::Result<serde_json::Value, Result<Response<BoxBody<Bytes, Infallible>>>> {
    if !is_valid_email(&data.email) {
        return Err(deliver_error_json(
            "MISSING_FIELD",
            "Invalid email",
            StatusCode::BAD_REQUEST,
        ));
    }

    let account = confirm_password(&data.reg_id, &data.password, state).await?;

    accounts::update_email(&state.db, account.id, data.email.clone())
        .await
        .map_err(|e| {
            error!("Database error updating email: {}", e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        })?;

    info!("Profile updated for reg_id: {}", data.reg_id);

    Ok(serde_json::json!({
        "account_id": account.id,
        "reg_id": data.reg_id,
        "email": data.email,
    }))
}

/// Resolve an account by reg_id and confirm the supplied password.
///
/// Shared by every password-confirmed mutation on student routes.  The
/// 404 / 403 split between unknown key and wrong password is deliberate.
pub async fn confirm_password(
    reg_id: &str,
    password: &str,
    state: &AppState,
) -> std::result::Result<Account, Result<Response<BoxBody<Bytes, Infallible>>>> {
    let account = accounts::get_account_by_reg_id(&state.db, reg_id.to_string())
        .await
        .map_err(|e| {
            error!("Database error resolving account: {}", e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        })?
        .ok_or_else(|| {
            warn!("Password-confirmed op on unknown reg_id: {}", reg_id);
            deliver_error_json("NOT_FOUND", "Account not found", StatusCode::NOT_FOUND)
        })?;

    let valid = verify_password(&account.password_hash, password).map_err(|e| {
        error!("Password verification error: {}", e);
        deliver_error_json(
            "INTERNAL_ERROR",
            "An internal error occurred",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    })?;

    if !valid {
        warn!("Wrong password for reg_id: {}", reg_id);
        return Err(deliver_error_json(
            "INVALID_PASSWORD",
            "Invalid password",
            StatusCode::FORBIDDEN,
        ));
    }

    Ok(account)
}
