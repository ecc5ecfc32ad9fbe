use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use tracing::{error, info, warn};

use shared::types::{DetailError, DetailPatch, DetailRecord, DetailResponse};

use crate::AppState;
use crate::database::{accounts, details};
use crate::database::utils::verify_password;
use crate::handlers::http::utils::json_response::{
    deliver_error_json, deliver_serialized_json, deliver_success_json,
};

fn query_param(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect::<HashMap<String, String>>()
        .remove(name)
}

fn error_status(err: &DetailError) -> StatusCode {
    match err {
        DetailError::OwnerNotFound | DetailError::DetailNotFound => StatusCode::NOT_FOUND,
        DetailError::InvalidPassword => StatusCode::FORBIDDEN,
        DetailError::MissingField(_) => StatusCode::BAD_REQUEST,
        DetailError::StorageFailure
        | DetailError::DatabaseError
        | DetailError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handle GET /admin?username= — public admin profile.
pub async fn handle_get_admin(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let username = match query_param(&req, "username") {
        Some(u) if !u.is_empty() => u,
        _ => {
            return deliver_error_json(
                "MISSING_FIELD",
                "Missing required field: username",
                StatusCode::BAD_REQUEST,
            );
        }
    };

    match accounts::get_account_by_username(&state.db, username.clone()).await {
        Ok(Some(account)) => deliver_success_json(Some(serde_json::json!({
            "account_id": account.id,
            "username": username,
            "role": account.role,
        }))),
        Ok(None) => deliver_error_json("NOT_FOUND", "Account not found", StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Database error getting admin: {}", e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// Handle GET /admin/details?username= — admin detail record.
pub async fn handle_get_admin_details(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let username = match query_param(&req, "username") {
        Some(u) if !u.is_empty() => u,
        _ => {
            let err = DetailError::MissingField("username".to_string());
            return deliver_serialized_json(&err.to_response(), error_status(&err));
        }
    };

    match fetch_admin_details(&username, &state).await {
        Ok(detail) => deliver_serialized_json(
            &DetailResponse::Success {
                detail,
                message: "Details fetched".to_string(),
            },
            StatusCode::OK,
        ),
        Err(err) => deliver_serialized_json(&err.to_response(), error_status(&err)),
    }
}

pub async fn fetch_admin_details(
    username: &str,
    state: &AppState,
) -> std::result::Result<DetailRecord, DetailError> {
    let account = accounts::get_account_by_username(&state.db, username.to_string())
        .await
        .map_err(|e| {
            error!("Database error resolving admin: {}", e);
            DetailError::DatabaseError
        })?
        .ok_or(DetailError::OwnerNotFound)?;

    details::get_detail(&state.db, account.id)
        .await
        .map_err(|e| {
            error!("Database error fetching admin details: {}", e);
            DetailError::DatabaseError
        })?
        .ok_or(DetailError::DetailNotFound)
}

/// Password-confirmed admin detail upsert (POST /admin).  Same merge
/// machinery as the student path; admins mostly touch branch and phone.
#[derive(Debug, Deserialize)]
pub struct AdminUpsertData {
    pub username: String,
    pub password: String,
    #[serde(flatten)]
    pub patch: DetailPatch,
}

pub async fn handle_upsert_admin_details(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing admin detail upsert request");

    let body = req.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    let data: AdminUpsertData = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(_) => {
            let err = DetailError::MissingField("username or password".to_string());
            return deliver_serialized_json(&err.to_response(), error_status(&err));
        }
    };

    match attempt_upsert_admin_details(&data, &state).await {
        Ok(detail) => deliver_serialized_json(
            &DetailResponse::Success {
                detail,
                message: "Details updated".to_string(),
            },
            StatusCode::OK,
        ),
        Err(err) => {
            warn!("Admin detail upsert failed: {}", err.to_code());
            deliver_serialized_json(&err.to_response(), error_status(&err))
        }
    }
}

pub async fn attempt_upsert_admin_details(
    data: &AdminUpsertData,
    state: &AppState,
) -> std::result::Result<DetailRecord, DetailError> {
    if data.username.is_empty() {
        return Err(DetailError::MissingField("username".to_string()));
    }
    if data.password.is_empty() {
        return Err(DetailError::MissingField("password".to_string()));
    }

    let account = accounts::get_account_by_username(&state.db, data.username.clone())
        .await
        .map_err(|e| {
            error!("Database error resolving admin: {}", e);
            DetailError::DatabaseError
        })?
        .ok_or(DetailError::OwnerNotFound)?;

    let valid = verify_password(&account.password_hash, &data.password).map_err(|e| {
        error!("Password verification error: {}", e);
        DetailError::InternalError
    })?;

    if !valid {
        return Err(DetailError::InvalidPassword);
    }

    let merged = details::upsert_detail(&state.db, account.id, data.patch.clone())
        .await
        .map_err(|e| {
            error!("Database error upserting admin details: {}", e);
            DetailError::DatabaseError
        })?
        .ok_or(DetailError::InternalError)?;

    info!("Admin details upserted for username: {}", data.username);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_password_maps_to_forbidden() {
        assert_eq!(
            error_status(&DetailError::InvalidPassword),
            StatusCode::FORBIDDEN
        );
    }
}
