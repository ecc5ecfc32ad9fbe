use tokio_rusqlite::{Connection, Result, rusqlite};
use tracing::info;

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration arm in `run_migrations`.
const SCHEMA_VERSION: u32 = 1;

/// Initialize the database schema and run any pending migrations.
pub async fn create_tables(conn: &Connection) -> Result<()> {
    create_schema(conn).await?;
    run_migrations(conn).await?;
    Ok(())
}

/// Create all tables for a brand-new database (version 1 schema).
async fn create_schema(conn: &Connection) -> Result<()> {
    conn.call(|conn: &mut rusqlite::Connection| {
        // Accounts table — one row per principal, partitioned by
        // account_type ('student' | 'admin').  Students log in with reg_id,
        // admins with username; each login key is unique in its column and
        // SQLite treats the NULLs of the other partition as distinct.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                account_type       TEXT    NOT NULL,
                reg_id             TEXT    UNIQUE,
                username           TEXT    UNIQUE,
                email              TEXT    UNIQUE,
                password_hash      TEXT    NOT NULL,
                role               TEXT    NOT NULL DEFAULT 'user',
                verified           INTEGER NOT NULL DEFAULT 0,
                verification_token TEXT,
                created_at         INTEGER NOT NULL
            )",
            [],
        )?;

        // Details table — 1:1 with accounts.  The UNIQUE owner reference
        // plus the FK mean a detail can never exist without its account;
        // creation happens inside the same transaction as the account row.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS details (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id  INTEGER NOT NULL UNIQUE,
                fullname    TEXT,
                phone       INTEGER,
                address     TEXT,
                gender      TEXT,
                postal_code INTEGER,
                branch      TEXT,
                profilepic  TEXT,
                FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
            )",
            [],
        )?;

        // Jobs table — job_uid is the public random-hex identifier.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS jobs (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                job_uid     TEXT    NOT NULL UNIQUE,
                company     TEXT    NOT NULL,
                logo        TEXT,
                role        TEXT    NOT NULL,
                salary      TEXT,
                location    TEXT,
                description TEXT,
                created_at  INTEGER NOT NULL
            )",
            [],
        )?;

        // Applications table — the UNIQUE pair is the duplicate-apply
        // guard: a given (account, job) can appear at most once.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS applications (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                job_id     INTEGER NOT NULL,
                applied_at INTEGER NOT NULL,
                FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE,
                FOREIGN KEY (job_id)     REFERENCES jobs(id)     ON DELETE CASCADE,
                UNIQUE(account_id, job_id)
            )",
            [],
        )?;

        // --- Indexes --------------------------------------------------------
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_accounts_reg_id       ON accounts(reg_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_accounts_username     ON accounts(username)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_accounts_email        ON accounts(email)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_details_account       ON details(account_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_applications_job      ON applications(job_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_applications_account  ON applications(account_id)",
            [],
        )?;

        Ok(())
    })
    .await
}

/// Apply any schema migrations required to reach `SCHEMA_VERSION`.
///
/// Uses `PRAGMA user_version` as the migration counter.  Each migration arm
/// must be idempotent — safe to run on a DB that was created at any earlier
/// version.
async fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version: u32 = conn
        .call(|conn: &mut rusqlite::Connection| {
            let v: u32 = conn
                .query_row("PRAGMA user_version", [], |r| r.get(0))
                .unwrap_or(0);
            Ok(v)
        })
        .await?;

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Database schema at version {}; target version {}. Running migrations…",
        current_version, SCHEMA_VERSION
    );

    // Add future migration arms here:
    // if current_version < 2 { ... }

    // Stamp only after every arm ran: an interrupted migration leaves the
    // old version in place and is retried on the next startup.
    conn.call(|conn: &mut rusqlite::Connection| {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    })
    .await?;

    Ok(())
}

/// Open or create the database and ensure the schema is up to date.
pub async fn open_database(path: &str) -> Result<Connection> {
    let conn = Connection::open(path).await?;
    enable_foreign_keys(&conn).await?;
    create_tables(&conn).await?;
    Ok(conn)
}

/// Open a throwaway in-memory database — used by tests.
pub async fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().await?;
    enable_foreign_keys(&conn).await?;
    create_tables(&conn).await?;
    Ok(conn)
}

async fn enable_foreign_keys(conn: &Connection) -> Result<()> {
    conn.call(|conn: &mut rusqlite::Connection| {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    })
    .await
}
