use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use tracing::{error, info, warn};

use shared::types::{ApplyData, JobError, JobView, NewJobData};

use crate::AppState;
use crate::database::{accounts, jobs};
use crate::handlers::http::utils::json_response::{deliver_serialized_json, deliver_success_json};

fn error_status(err: &JobError) -> StatusCode {
    match err {
        JobError::JobNotFound | JobError::AccountNotFound => StatusCode::NOT_FOUND,
        JobError::AlreadyApplied | JobError::MissingField(_) => StatusCode::BAD_REQUEST,
        JobError::NotAuthorized => StatusCode::UNAUTHORIZED,
        JobError::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handle GET /jobs — full listing with applicant ids.
pub async fn handle_list_jobs(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match jobs::list_jobs(&state.db).await {
        Ok(listing) => deliver_success_json(Some(listing)),
        Err(e) => {
            error!("Database error listing jobs: {}", e);
            deliver_serialized_json(
                &JobError::DatabaseError.to_response(),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// Handle POST /jobs/apply — record an application, rejecting duplicates.
pub async fn handle_apply(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let body = req.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    let data: ApplyData = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(_) => {
            let err = JobError::MissingField("account_id or job_id".to_string());
            return deliver_serialized_json(&err.to_response(), error_status(&err));
        }
    };

    match attempt_apply(&data, &state).await {
        Ok(()) => deliver_success_json(Some(serde_json::json!({
            "account_id": data.account_id,
            "job_id": data.job_id,
            "message": "Application recorded",
        }))),
        Err(err) => {
            warn!("Job apply failed: {}", err.to_code());
            deliver_serialized_json(&err.to_response(), error_status(&err))
        }
    }
}

pub async fn attempt_apply(
    data: &ApplyData,
    state: &AppState,
) -> std::result::Result<(), JobError> {
    info!(
        "Attempting application account:{} job:{}",
        data.account_id, data.job_id
    );

    let account_exists = accounts::get_account_by_id(&state.db, data.account_id)
        .await
        .map_err(|e| {
            error!("Database error checking account: {}", e);
            JobError::DatabaseError
        })?
        .is_some();
    if !account_exists {
        return Err(JobError::AccountNotFound);
    }

    if !jobs::job_exists(&state.db, data.job_id).await.map_err(|e| {
        error!("Database error checking job: {}", e);
        JobError::DatabaseError
    })? {
        return Err(JobError::JobNotFound);
    }

    match jobs::apply_to_job(&state.db, data.account_id, data.job_id)
        .await
        .map_err(|e| {
            error!("Database error applying: {}", e);
            JobError::DatabaseError
        })? {
        jobs::ApplyOutcome::Applied => Ok(()),
        jobs::ApplyOutcome::AlreadyApplied => Err(JobError::AlreadyApplied),
    }
}

/// Handle POST /jobs/add — create a posting.  The admin_key field must name
/// an admin account whose role is `"admin"`; anything else gets 401.
pub async fn handle_add_job(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let body = req.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    let data: NewJobData = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(_) => {
            let err = JobError::MissingField("company or role".to_string());
            return deliver_serialized_json(&err.to_response(), error_status(&err));
        }
    };

    match attempt_add_job(&data, &state).await {
        Ok(job) => deliver_serialized_json(
            &serde_json::json!({
                "status": "success",
                "data": job,
            }),
            StatusCode::CREATED,
        ),
        Err(err) => {
            warn!("Job add failed: {}", err.to_code());
            deliver_serialized_json(&err.to_response(), error_status(&err))
        }
    }
}

pub async fn attempt_add_job(
    data: &NewJobData,
    state: &AppState,
) -> std::result::Result<JobView, JobError> {
    if data.company.trim().is_empty() {
        return Err(JobError::MissingField("company".to_string()));
    }
    if data.role.trim().is_empty() {
        return Err(JobError::MissingField("role".to_string()));
    }

    // Existence is not enough: the poster's role must be "admin".  A
    // demoted account keeps its login but loses posting rights.
    let poster = accounts::get_account_by_username(&state.db, data.admin_key.clone())
        .await
        .map_err(|e| {
            error!("Database error checking admin: {}", e);
            JobError::DatabaseError
        })?;

    match poster {
        Some(account) if account.role == "admin" => {}
        _ => {
            warn!("Job add refused for non-admin key: {}", data.admin_key);
            return Err(JobError::NotAuthorized);
        }
    }

    let (id, job_uid) = jobs::add_job(
        &state.db,
        data.company.clone(),
        data.logo.clone(),
        data.role.clone(),
        data.salary.clone(),
        data.location.clone(),
        data.description.clone(),
    )
    .await
    .map_err(|e| {
        error!("Database error adding job: {}", e);
        JobError::DatabaseError
    })?;

    Ok(JobView {
        id,
        job_uid,
        company: data.company.clone(),
        logo: data.logo.clone(),
        role: data.role.clone(),
        salary: data.salary.clone(),
        location: data.location.clone(),
        description: data.description.clone(),
        applicants: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_admin_poster_gets_401() {
        assert_eq!(
            error_status(&JobError::NotAuthorized),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn duplicate_apply_is_a_bad_request() {
        assert_eq!(
            error_status(&JobError::AlreadyApplied),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(error_status(&JobError::JobNotFound), StatusCode::NOT_FOUND);
    }
}
