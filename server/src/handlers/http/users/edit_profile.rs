use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use tracing::{error, info, warn};

use shared::types::{DetailError, DetailPatch, DetailResponse};

use crate::AppState;
use crate::database::{accounts, details};
use crate::database::utils::verify_password;
use crate::handlers::http::utils::json_response::deliver_serialized_json;

/// Parsed multipart edit: the text fields plus at most one uploaded picture.
pub struct EditProfileData {
    pub password: String,
    pub fields: HashMap<String, String>,
    pub picture: Option<(String, Vec<u8>)>,
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

/// Handle PUT /users/editProfile/:reg_id — multipart profile edit with an
/// optional picture upload.
pub async fn handle_edit_profile(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let reg_id = match req.uri().path().split('/').nth(3) {
        Some(seg) if !seg.is_empty() => seg.to_string(),
        _ => {
            let err = DetailError::MissingField("reg_id".to_string());
            return deliver_serialized_json(&err.to_response(), error_status(&err));
        }
    };

    info!("Processing profile edit for reg_id: {}", reg_id);

    let data = match parse_multipart(req).await {
        Ok(data) => data,
        Err(err) => {
            warn!("Multipart parsing failed: {}", err.to_code());
            return deliver_serialized_json(&err.to_response(), error_status(&err));
        }
    };

    match attempt_edit_profile(&reg_id, data, &state).await {
        Ok(detail) => deliver_serialized_json(
            &DetailResponse::Success {
                detail,
                message: "Profile updated".to_string(),
            },
            StatusCode::OK,
        ),
        Err(err) => {
            warn!("Profile edit failed: {}", err.to_code());
            deliver_serialized_json(&err.to_response(), error_status(&err))
        }
    }
}

/// Pull the boundary out of the content-type and walk the multipart fields.
async fn parse_multipart(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<EditProfileData, DetailError> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(DetailError::MissingField("content-type".to_string()))?;

    let boundary = multer::parse_boundary(&content_type)
        .map_err(|_| DetailError::MissingField("multipart boundary".to_string()))?;

    let stream = req.into_body().into_data_stream();
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = HashMap::new();
    let mut picture = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Multipart field error: {}", e);
        DetailError::InternalError
    })? {
        let name = match field.name() {
            Some(n) => n.to_string(),
            None => continue,
        };

        if name == "profilepic" {
            let filename = field
                .file_name()
                .unwrap_or("profilepic.bin")
                .to_string();
            let bytes = field.bytes().await.map_err(|e| {
                warn!("Failed to read picture bytes: {}", e);
                DetailError::InternalError
            })?;
            if !bytes.is_empty() {
                picture = Some((filename, bytes.to_vec()));
            }
        } else {
            let text = field.text().await.map_err(|e| {
                warn!("Failed to read field {}: {}", name, e);
                DetailError::InternalError
            })?;
            fields.insert(name, text);
        }
    }

    let password = fields
        .remove("password")
        .ok_or(DetailError::MissingField("password".to_string()))?;

    Ok(EditProfileData {
        password,
        fields,
        picture,
    })
}

/// Build a DetailPatch from the multipart text fields.  Empty strings count
/// as omitted, matching how browsers submit untouched form inputs.
fn patch_from_fields(fields: &HashMap<String, String>) -> DetailPatch {
    let text = |name: &str| {
        fields
            .get(name)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };
    let number = |name: &str| fields.get(name).and_then(|v| v.parse::<i64>().ok());

    DetailPatch {
        fullname: text("fullname"),
        phone: number("phone"),
        address: text("address"),
        gender: text("gender"),
        postal_code: number("postal_code"),
        branch: text("branch"),
        profilepic: None,
    }
}

/// Confirm the password, store the new picture (if any), swap the stored
/// path, merge the text fields, and finally delete the replaced blob.
///
/// Ordering matters: upload before swap before delete-old, so a crash at any
/// point leaves a readable picture.  A failed delete of the old blob is
/// logged and ignored.
pub async fn attempt_edit_profile(
    reg_id: &str,
    data: EditProfileData,
    state: &AppState,
) -> std::result::Result<shared::types::DetailRecord, DetailError> {
    let account = accounts::get_account_by_reg_id(&state.db, reg_id.to_string())
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

    if let Some((filename, bytes)) = &data.picture {
        let new_path = state.blob.store(filename, bytes).await.map_err(|e| {
            error!("Blob store failed: {}", e);
            DetailError::StorageFailure
        })?;

        let old_path = details::swap_profilepic(&state.db, account.id, new_path)
            .await
            .map_err(|e| {
                error!("Database error swapping picture: {}", e);
                DetailError::DatabaseError
            })?;

        if let Some(old) = old_path {
            if let Err(e) = state.blob.delete(&old).await {
                warn!("Failed to delete replaced picture {}: {}", old, e);
            }
        }
    }

    let patch = patch_from_fields(&data.fields);

    let merged = details::upsert_detail(&state.db, account.id, patch)
        .await
        .map_err(|e| {
            error!("Database error upserting details: {}", e);
            DetailError::DatabaseError
        })?
        .ok_or(DetailError::InternalError)?;

    info!("Profile edit complete for reg_id: {}", reg_id);
    Ok(merged)
}
