use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::convert::Infallible;
use tracing::{error, info, warn};

use crate::AppState;
use crate::database::accounts;
use crate::handlers::http::utils::json_response::{deliver_error_json, deliver_success_json};

#[derive(Debug, Deserialize)]
struct VerifyBody {
    token: String,
}

/// Handle POST /auth/verify/:reg_id — consume the emailed token and flip
/// the account to verified.  Idempotence is one-way: a consumed token never
/// works again, but `verified` never reverts either.
pub async fn handle_verify(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let reg_id = match req.uri().path().split('/').nth(3) {
        Some(seg) if !seg.is_empty() => seg.to_string(),
        _ => {
            return deliver_error_json(
                "MISSING_FIELD",
                "Missing reg_id in path",
                StatusCode::BAD_REQUEST,
            );
        }
    };

    info!("Processing verification for reg_id: {}", reg_id);

    let body = req.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    let token = match serde_json::from_slice::<VerifyBody>(&body) {
        Ok(b) => b.token,
        Err(_) => {
            warn!("Verification body missing token for {}", reg_id);
            return deliver_error_json(
                "MISSING_FIELD",
                "Missing required field: token",
                StatusCode::BAD_REQUEST,
            );
        }
    };

    match attempt_verify(&reg_id, &token, &state).await {
        Ok(true) => deliver_success_json(Some(serde_json::json!({
            "reg_id": reg_id,
            "verified": true,
        }))),
        Ok(false) => deliver_error_json(
            "INVALID_TOKEN",
            "Verification token is invalid or already used",
            StatusCode::BAD_REQUEST,
        ),
        Err(resp) => resp,
    }
}

pub async fn attempt_verify(
    reg_id: &str,
    token: &str,
    state: &AppState,
) -> std::result::Result<bool, Result<Response<BoxBody<Bytes, Infallible>>>> {
    let exists = accounts::reg_id_exists(&state.db, reg_id.to_string())
        .await
        .map_err(|e| {
            error!("Database error checking reg_id: {}", e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        })?;

    if !exists {
        return Err(deliver_error_json(
            "NOT_FOUND",
            "Account not found",
            StatusCode::NOT_FOUND,
        ));
    }

    accounts::consume_verification_token(&state.db, reg_id.to_string(), token.to_string())
        .await
        .map_err(|e| {
            error!("Database error consuming token: {}", e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        })
}
