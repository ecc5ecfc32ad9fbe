use std::sync::Arc;

use clap::Parser;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpListener;

use anyhow::{Context, Result};
use tracing::{error, info};

use server::AppState;
use server::database::create::open_database;
use server::handlers::http::routes::build_api_router;
use server::mail::LogMailer;
use server::storage::LocalBlobStore;
use shared::config::load_config;

#[derive(Parser, Debug)]
#[command(name = "portal-server", about = "Job portal backend")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = load_config(&args.config).context("Failed to load configuration")?;
    let jwt_secret = config
        .auth
        .resolved_jwt_secret()
        .context("JWT secret missing after validation")?;

    let db = open_database(&config.database.path)
        .await
        .context("Failed to open database")?;
    info!("Database ready at {}", config.database.path);

    let blob = LocalBlobStore::new(&config.storage.upload_dir);
    blob.init().await.context("Failed to prepare upload dir")?;

    let mailer = Arc::new(LogMailer::new(config.mail.clone()));

    let addr = config.server.addr();
    let state = AppState::new(db, Arc::new(config), jwt_secret, blob, mailer);
    let router = Arc::new(build_api_router());

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    loop {
        let (stream, peer) = listener.accept().await.context("Accept failed")?;
        let io = TokioIo::new(stream);
        let state = state.clone();
        let router = router.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                let router = router.clone();
                async move { router.route(req, state).await }
            });

            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, service)
                .await
            {
                error!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}
