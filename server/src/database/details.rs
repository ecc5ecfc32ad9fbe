use tokio_rusqlite::{Connection, OptionalExtension, Result, params, rusqlite};
use tracing::info;

use shared::types::{DetailPatch, DetailRecord};

fn row_to_detail(row: &rusqlite::Row) -> rusqlite::Result<DetailRecord> {
    Ok(DetailRecord {
        account_id: row.get(0)?,
        fullname: row.get(1)?,
        phone: row.get(2)?,
        address: row.get(3)?,
        gender: row.get(4)?,
        postal_code: row.get(5)?,
        branch: row.get(6)?,
        profilepic: row.get(7)?,
    })
}

const DETAIL_COLS: &str =
    "account_id, fullname, phone, address, gender, postal_code, branch, profilepic";

/// Get the detail record for an account
pub async fn get_detail(conn: &Connection, account_id: i64) -> Result<Option<DetailRecord>> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {DETAIL_COLS} FROM details WHERE account_id = ?1"
        ))?;
        let detail = stmt
            .query_row(params![account_id], row_to_detail)
            .optional()?;
        Ok(detail)
    })
    .await
}

/// Merge a partial patch into the account's detail row and return the
/// post-merge record.
///
/// Read, merge, and write happen inside one transaction on the single
/// writer connection, so two concurrent patches serialize and each merges
/// against the row the previous one left behind.  Absent patch fields
/// never touch stored values.  Creates the row first if signup somehow
/// left none behind.
pub async fn upsert_detail(
    conn: &Connection,
    account_id: i64,
    patch: DetailPatch,
) -> Result<Option<DetailRecord>> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let tx = conn.transaction()?;

        let existing = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {DETAIL_COLS} FROM details WHERE account_id = ?1"
            ))?;
            stmt.query_row(params![account_id], row_to_detail).optional()?
        };

        let mut record = match existing {
            Some(record) => record,
            None => {
                // Lazy creation path for rows that predate transactional
                // signup.
                tx.execute(
                    "INSERT INTO details (account_id) VALUES (?1)",
                    params![account_id],
                )?;
                DetailRecord {
                    account_id,
                    ..Default::default()
                }
            }
        };

        patch.apply(&mut record);

        tx.execute(
            "UPDATE details
             SET fullname = ?1, phone = ?2, address = ?3, gender = ?4,
                 postal_code = ?5, branch = ?6, profilepic = ?7
             WHERE account_id = ?8",
            params![
                record.fullname,
                record.phone,
                record.address,
                record.gender,
                record.postal_code,
                record.branch,
                record.profilepic,
                account_id,
            ],
        )?;

        tx.commit()?;
        info!("Detail upserted! account:{}", account_id);

        Ok(Some(record))
    })
    .await
}

/// Replace just the stored profile-picture path, returning the previous one
/// so the caller can delete the old blob after the swap.
pub async fn swap_profilepic(
    conn: &Connection,
    account_id: i64,
    new_path: String,
) -> Result<Option<String>> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let tx = conn.transaction()?;

        let old: Option<Option<String>> = tx
            .query_row(
                "SELECT profilepic FROM details WHERE account_id = ?1",
                params![account_id],
                |row| row.get(0),
            )
            .optional()?;

        tx.execute(
            "UPDATE details SET profilepic = ?1 WHERE account_id = ?2",
            params![new_path, account_id],
        )?;

        tx.commit()?;
        Ok(old.flatten())
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

    async fn seeded() -> (Connection, i64) {
        let conn = open_in_memory().await.unwrap();
        let id = create_account_with_detail(
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
        (conn, id)
    }

    fn patch(json: &str) -> DetailPatch {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn partial_patch_preserves_unmentioned_fields() {
        let (conn, id) = seeded().await;

        upsert_detail(&conn, id, patch(r#"{"fullname":"Asha","phone":9998887776}"#))
            .await
            .unwrap();
        let after = upsert_detail(&conn, id, patch(r#"{"address":"12 MG Road"}"#))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(after.fullname.as_deref(), Some("Asha"));
        assert_eq!(after.phone, Some(9998887776));
        assert_eq!(after.address.as_deref(), Some("12 MG Road"));
    }

    #[tokio::test]
    async fn same_patch_twice_is_idempotent() {
        let (conn, id) = seeded().await;
        let p = patch(r#"{"fullname":"Asha","gender":"female"}"#);

        let once = upsert_detail(&conn, id, p.clone()).await.unwrap().unwrap();
        let twice = upsert_detail(&conn, id, p).await.unwrap().unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn returned_record_matches_stored_row() {
        let (conn, id) = seeded().await;

        let returned = upsert_detail(&conn, id, patch(r#"{"postal_code":560001}"#))
            .await
            .unwrap()
            .unwrap();
        let stored = get_detail(&conn, id).await.unwrap().unwrap();
        assert_eq!(returned, stored);
    }

    #[tokio::test]
    async fn swap_profilepic_returns_previous_path() {
        let (conn, id) = seeded().await;

        let old = swap_profilepic(&conn, id, "uploads/a.png".into())
            .await
            .unwrap();
        assert_eq!(old, None);

        let old = swap_profilepic(&conn, id, "uploads/b.png".into())
            .await
            .unwrap();
        assert_eq!(old.as_deref(), Some("uploads/a.png"));

        let detail = get_detail(&conn, id).await.unwrap().unwrap();
        assert_eq!(detail.profilepic.as_deref(), Some("uploads/b.png"));
    }
}
