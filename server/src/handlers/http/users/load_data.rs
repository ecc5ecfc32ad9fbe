use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::convert::Infallible;
use tracing::error;

use crate::AppState;
use crate::database::{accounts, details, jobs};
use crate::handlers::http::utils::json_response::{deliver_error_json, deliver_success_json};

#[derive(Debug, Deserialize)]
struct LoadDataBody {
    reg_id: String,
}

/// Handle POST /users/loadData — one round-trip for the dashboard: profile,
/// detail record, and applied-job ids together.
pub async fn handle_load_data(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let body = req.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    let reg_id = match serde_json::from_slice::<LoadDataBody>(&body) {
        Ok(b) if !b.reg_id.is_empty() => b.reg_id,
        _ => {
            return deliver_error_json(
                "MISSING_FIELD",
                "Missing required field: reg_id",
                StatusCode::BAD_REQUEST,
            );
        }
    };

    let account = match accounts::get_account_by_reg_id(&state.db, reg_id.clone()).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return deliver_error_json("NOT_FOUND", "Account not found", StatusCode::NOT_FOUND);
        }
        Err(e) => {
            error!("Database error loading data: {}", e);
            return deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };

    let detail = details::get_detail(&state.db, account.id)
        .await
        .unwrap_or(None);
    let applied = jobs::applied_jobs_for(&state.db, account.id)
        .await
        .unwrap_or_default();

    deliver_success_json(Some(serde_json::json!({
        "profile": {
            "account_id": account.id,
            "reg_id": reg_id,
            "email": account.email,
            "role": account.role,
            "verified": account.verified,
        },
        "detail": detail,
        "applied_jobs": applied,
    })))
}
