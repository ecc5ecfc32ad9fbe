use tokio_rusqlite::{Connection, OptionalExtension, Result, params, rusqlite};
use tracing::info;

use shared::types::AccountType;

use crate::database::utils;

/// A resolved account row.
///
/// `password_hash` stays inside the server; response bodies are built
/// field-by-field and never serialize this struct directly.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub account_type: AccountType,
    pub reg_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub verified: bool,
    pub created_at: i64,
}

impl Account {
    /// The key this account logs in with: reg_id for students, username for
    /// admins.
    pub fn login_key(&self) -> &str {
        self.reg_id
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account_type: AccountType,
    pub reg_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    /// Single-use email-verification token, students only.
    pub verification_token: Option<String>,
}

fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
    let type_str: String = row.get(1)?;
    Ok(Account {
        id: row.get(0)?,
        account_type: AccountType::from_str(&type_str).unwrap_or(AccountType::Student),
        reg_id: row.get(2)?,
        username: row.get(3)?,
        email: row.get(4)?,
        password_hash: row.get(5)?,
        role: row.get(6)?,
        verified: row.get::<_, i64>(7)? != 0,
        created_at: row.get(8)?,
    })
}

const ACCOUNT_COLS: &str =
    "id, account_type, reg_id, username, email, password_hash, role, verified, created_at";

/// Create an account together with its empty detail row in one transaction.
///
/// Either both rows exist afterwards or neither does — callers can never
/// observe an account without a companion detail.
pub async fn create_account_with_detail(conn: &Connection, new: NewAccount) -> Result<i64> {
    let created_at = utils::get_timestamp();

    // Role follows the partition at creation; job posting checks it later.
    let role = match new.account_type {
        AccountType::Admin => "admin",
        AccountType::Student => "user",
    };

    conn.call(move |conn: &mut rusqlite::Connection| {
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO accounts
                (account_type, reg_id, username, email, password_hash, role, verification_token, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.account_type.as_str(),
                new.reg_id,
                new.username,
                new.email,
                new.password_hash,
                role,
                new.verification_token,
                created_at,
            ],
        )?;
        let account_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO details (account_id) VALUES (?1)",
            params![account_id],
        )?;

        tx.commit()?;
        info!("New account created! id:{}", account_id);

        Ok(account_id)
    })
    .await
}

/// Check if a student reg_id exists
pub async fn reg_id_exists(conn: &Connection, reg_id: String) -> Result<bool> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM accounts WHERE reg_id = ?1")?;
        let count: i64 = stmt.query_row(params![reg_id], |row: &rusqlite::Row| row.get(0))?;
        Ok(count > 0)
    })
    .await
}

/// Check if an admin username exists
pub async fn username_exists(conn: &Connection, username: String) -> Result<bool> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM accounts WHERE username = ?1")?;
        let count: i64 = stmt.query_row(params![username], |row: &rusqlite::Row| row.get(0))?;
        Ok(count > 0)
    })
    .await
}

/// Check if email exists
pub async fn email_exists(conn: &Connection, email: String) -> Result<bool> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM accounts WHERE email = ?1")?;
        let count: i64 = stmt.query_row(params![email], |row: &rusqlite::Row| row.get(0))?;
        Ok(count > 0)
    })
    .await
}

/// Get account by ID
pub async fn get_account_by_id(conn: &Connection, account_id: i64) -> Result<Option<Account>> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE id = ?1"
        ))?;
        let account = stmt
            .query_row(params![account_id], row_to_account)
            .optional()?;
        Ok(account)
    })
    .await
}

/// Get a student account by reg_id
pub async fn get_account_by_reg_id(conn: &Connection, reg_id: String) -> Result<Option<Account>> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE reg_id = ?1"
        ))?;
        let account = stmt.query_row(params![reg_id], row_to_account).optional()?;
        Ok(account)
    })
    .await
}

/// Get an admin account by username
pub async fn get_account_by_username(
    conn: &Connection,
    username: String,
) -> Result<Option<Account>> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE username = ?1 AND account_type = 'admin'"
        ))?;
        let account = stmt
            .query_row(params![username], row_to_account)
            .optional()?;
        Ok(account)
    })
    .await
}

/// Resolve an account by its login key, whichever partition it lives in.
pub async fn get_account_by_login_key(conn: &Connection, key: String) -> Result<Option<Account>> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE reg_id = ?1 OR username = ?1"
        ))?;
        let account = stmt.query_row(params![key], row_to_account).optional()?;
        Ok(account)
    })
    .await
}

/// Mark a student verified and clear the single-use token.
///
/// The token is matched inside the UPDATE so a stale or wrong token changes
/// nothing; the returned flag tells the caller whether the transition
/// happened.  verified only ever moves false → true.
pub async fn consume_verification_token(
    conn: &Connection,
    reg_id: String,
    token: String,
) -> Result<bool> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        let changed = conn.execute(
            "UPDATE accounts
             SET verified = 1, verification_token = NULL
             WHERE reg_id = ?1 AND verification_token = ?2",
            params![reg_id, token],
        )?;
        if changed > 0 {
            info!("Account verified! reg_id:{}", reg_id);
        }
        Ok(changed > 0)
    })
    .await
}

/// Update email on a password-confirmed profile edit.
pub async fn update_email(conn: &Connection, account_id: i64, email: String) -> Result<()> {
    conn.call(move |conn: &mut rusqlite::Connection| {
        conn.execute(
            "UPDATE accounts SET email = ?1 WHERE id = ?2",
            params![email, account_id],
        )?;
        info!("Email updated! account:{}", account_id);
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::open_in_memory;
    use crate::database::utils::hash_password;

    fn student(reg_id: &str, email: &str) -> NewAccount {
        NewAccount {
            account_type: AccountType::Student,
            reg_id: Some(reg_id.to_string()),
            username: None,
            email: Some(email.to_string()),
            password_hash: hash_password("longenough").unwrap(),
            verification_token: Some("tok123".to_string()),
        }
    }

    #[tokio::test]
    async fn account_and_detail_created_together() {
        let conn = open_in_memory().await.unwrap();
        let id = create_account_with_detail(&conn, student("S101", "a@x.com"))
            .await
            .unwrap();

        let detail = crate::database::details::get_detail(&conn, id)
            .await
            .unwrap();
        assert!(detail.is_some(), "empty detail row must exist after signup");
    }

    #[tokio::test]
    async fn duplicate_reg_id_rejected_and_no_second_account() {
        let conn = open_in_memory().await.unwrap();
        create_account_with_detail(&conn, student("S101", "a@x.com"))
            .await
            .unwrap();

        let second = create_account_with_detail(&conn, student("S101", "b@x.com")).await;
        assert!(second.is_err());

        // Still exactly one account with that key.
        let acct = get_account_by_reg_id(&conn, "S101".into()).await.unwrap();
        assert!(acct.is_some());
        assert!(reg_id_exists(&conn, "S101".into()).await.unwrap());
        assert!(!email_exists(&conn, "b@x.com".into()).await.unwrap());
    }

    #[tokio::test]
    async fn failed_creation_leaves_no_orphan_detail() {
        let conn = open_in_memory().await.unwrap();
        let first = create_account_with_detail(&conn, student("S101", "a@x.com"))
            .await
            .unwrap();
        let _ = create_account_with_detail(&conn, student("S101", "b@x.com")).await;

        // Only the first account's detail row exists.
        let count: i64 = conn
            .call(|c: &mut rusqlite::Connection| {
                Ok::<_, rusqlite::Error>(c.query_row("SELECT COUNT(*) FROM details", [], |r| r.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        let detail = crate::database::details::get_detail(&conn, first)
            .await
            .unwrap();
        assert_eq!(detail.unwrap().account_id, first);
    }

    #[tokio::test]
    async fn verification_token_is_single_use() {
        let conn = open_in_memory().await.unwrap();
        create_account_with_detail(&conn, student("S101", "a@x.com"))
            .await
            .unwrap();

        assert!(
            !consume_verification_token(&conn, "S101".into(), "wrong".into())
                .await
                .unwrap()
        );
        assert!(
            consume_verification_token(&conn, "S101".into(), "tok123".into())
                .await
                .unwrap()
        );
        // Already consumed.
        assert!(
            !consume_verification_token(&conn, "S101".into(), "tok123".into())
                .await
                .unwrap()
        );

        let acct = get_account_by_reg_id(&conn, "S101".into())
            .await
            .unwrap()
            .unwrap();
        assert!(acct.verified);
    }

    #[tokio::test]
    async fn login_key_resolves_both_partitions() {
        let conn = open_in_memory().await.unwrap();
        create_account_with_detail(&conn, student("S101", "a@x.com"))
            .await
            .unwrap();
        create_account_with_detail(
            &conn,
            NewAccount {
                account_type: AccountType::Admin,
                reg_id: None,
                username: Some("tpo".into()),
                email: None,
                password_hash: hash_password("adminpass1").unwrap(),
                verification_token: None,
            },
        )
        .await
        .unwrap();

        let s = get_account_by_login_key(&conn, "S101".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(s.account_type, AccountType::Student);

        let a = get_account_by_login_key(&conn, "tpo".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a.account_type, AccountType::Admin);
        assert_eq!(a.login_key(), "tpo");
        assert_eq!(a.role, "admin");
        assert_eq!(s.role, "user");
    }
}
