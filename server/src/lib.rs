use std::sync::Arc;

use tokio_rusqlite::Connection;

use shared::types::AppConfig;

pub mod database;
pub mod handlers;
pub mod mail;
pub mod storage;

use mail::Mailer;
use storage::LocalBlobStore;

/// Shared per-request state.  Cheap to clone: the SQLite handle is itself a
/// channel to the single writer thread, and everything else is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: Connection,
    pub config: Arc<AppConfig>,
    /// Resolved at startup (env `JWT_SECRET` wins over config).
    pub jwt_secret: String,
    pub blob: LocalBlobStore,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        db: Connection,
        config: Arc<AppConfig>,
        jwt_secret: String,
        blob: LocalBlobStore,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            config,
            jwt_secret,
            blob,
            mailer,
        }
    }
}
