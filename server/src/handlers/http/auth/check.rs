use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use tracing::debug;

use crate::AppState;
use crate::database::accounts::Account;
use crate::handlers::http::utils::json_response::deliver_serialized_json;

/// Handle GET /auth/check — return the identity the gate resolved.
///
/// The router has already decoded the token and loaded the account; this
/// handler only shapes the response.  The hash never leaves the server.
pub async fn handle_check(
    _req: Request<hyper::body::Incoming>,
    _state: AppState,
    account: Account,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    debug!("Auth check for account:{}", account.id);

    let body = serde_json::json!({
        "status": "success",
        "data": {
            "account_id": account.id,
            "account_type": account.account_type.as_str(),
            "login_key": account.login_key(),
            "email": account.email,
            "role": account.role,
            "verified": account.verified,
        }
    });

    deliver_serialized_json(&body, StatusCode::OK)
}
