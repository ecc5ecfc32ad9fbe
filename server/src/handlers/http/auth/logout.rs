use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use tracing::info;

use crate::AppState;
use crate::handlers::http::utils::headers::delete_token_cookie;
use crate::handlers::http::utils::json_response::full;

/// Handle POST /auth/logout — clear the token cookie.
///
/// The JWT itself stays valid until `exp`; logout only removes it from the
/// browser.  Nothing to look up, so no auth gate.
pub async fn handle_logout(
    _req: Request<hyper::body::Incoming>,
    _state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing logout request");

    let cookie = delete_token_cookie().context("Failed to build logout cookie")?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .header("set-cookie", cookie)
        .body(full(r#"{"status":"success","message":"Logged out"}"#))
        .context("Failed to build logout response")?;

    Ok(response)
}
