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
use crate::database::accounts;
use crate::database::details;
use crate::database::utils::verify_password;
use crate::handlers::http::utils::json_response::deliver_serialized_json;

/// Password-confirmed upsert request.  The patch fields ride alongside the
/// credentials in the same JSON object; absent fields stay untouched.
#[derive(Debug, Deserialize)]
pub struct UpsertDetailData {
    pub reg_id: String,
    pub password: String,
    #[serde(flatten)]
    pub patch: DetailPatch,
}

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

/// Handle GET /users/details?reg_id= — fetch the detail record.
pub async fn handle_get_details(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let reg_id = match query_param(&req, "reg_id") {
        Some(id) if !id.is_empty() => id,
        _ => {
            let err = DetailError::MissingField("reg_id".to_string());
            return deliver_serialized_json(&err.to_response(), error_status(&err));
        }
    };

    match fetch_details(&reg_id, &state).await {
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

pub async fn fetch_details(
    reg_id: &str,
    state: &AppState,
) -> std::result::Result<DetailRecord, DetailError> {
    let account = accounts::get_account_by_reg_id(&state.db, reg_id.to_string())
        .await
        .map_err(|e| {
            error!("Database error resolving account: {}", e);
            DetailError::DatabaseError
        })?
        .ok_or(DetailError::OwnerNotFound)?;

    details::get_detail(&state.db, account.id)
        .await
        .map_err(|e| {
            error!("Database error fetching details: {}", e);
            DetailError::DatabaseError
        })?
        .ok_or(DetailError::DetailNotFound)
}

/// Handle POST /users/details — password-confirmed partial upsert.
pub async fn handle_upsert_details(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing detail upsert request");

    let body = req.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    let data: UpsertDetailData = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(_) => {
            let err = DetailError::MissingField("reg_id or password".to_string());
            return deliver_serialized_json(&err.to_response(), error_status(&err));
        }
    };

    match attempt_upsert_details(&data, &state).await {
        Ok(detail) => deliver_serialized_json(
            &DetailResponse::Success {
                detail,
                message: "Details updated".to_string(),
            },
            StatusCode::OK,
        ),
        Err(err) => {
            warn!("Detail upsert failed: {}", err.to_code());
            deliver_serialized_json(&err.to_response(), error_status(&err))
        }
    }
}

/// Confirm the password, then merge the patch into the stored record.
/// Returns the full post-merge record so the client never has to re-fetch.
pub async fn attempt_upsert_details(
    data: &UpsertDetailData,
    state: &AppState,
) -> std::result::Result<DetailRecord, DetailError> {
    if data.reg_id.is_empty() {
        return Err(DetailError::MissingField("reg_id".to_string()));
    }
    if data.password.is_empty() {
        return Err(DetailError::MissingField("password".to_string()));
    }

    let account = accounts::get_account_by_reg_id(&state.db, data.reg_id.clone())
        .await
        .map_err(|e| {
            error!("Database error resolving account: {}", e);
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
            error!("Database error upserting details: {}", e);
            DetailError::DatabaseError
        })?
        .ok_or(DetailError::InternalError)?;

    info!("Details upserted for reg_id: {}", data.reg_id);
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
        assert_eq!(
            error_status(&DetailError::OwnerNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&DetailError::MissingField("reg_id".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
