//! Property management background worker: sweeps expired server sessions.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use pmaas_application::SessionService;
use pmaas_core::{AppError, AppResult};
use pmaas_infrastructure::PostgresSessionRepository;
use sqlx::postgres::PgPoolOptions;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    worker_id: String,
    cleanup_interval_secs: u64,
    run_once: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let run_once = env::args().nth(1).as_deref() == Some("once");
    let config = WorkerConfig::from_lookup(run_once, |name| env::var(name).ok())?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;
    let session_service = SessionService::new(Arc::new(PostgresSessionRepository::new(pool)));

    if config.run_once {
        let removed = session_service.cleanup_expired_sessions().await?;
        info!(worker_id = %config.worker_id, removed, "expired sessions removed");
        return Ok(());
    }

    info!(
        worker_id = %config.worker_id,
        cleanup_interval_secs = config.cleanup_interval_secs,
        "pmaas-worker started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(config.cleanup_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match session_service.cleanup_expired_sessions().await {
            Ok(0) => debug!(worker_id = %config.worker_id, "no expired sessions"),
            Ok(removed) => {
                info!(worker_id = %config.worker_id, removed, "expired sessions removed");
            }
            Err(error) => {
                warn!(
                    worker_id = %config.worker_id,
                    error = %error,
                    "failed to remove expired sessions"
                );
            }
        }
    }
}

impl WorkerConfig {
    fn from_lookup(run_once: bool, lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;
        let worker_id = lookup("WORKER_ID")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("worker-{}", std::process::id()));

        let cleanup_interval_secs = match lookup("SESSION_CLEANUP_INTERVAL_SECS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid SESSION_CLEANUP_INTERVAL_SECS value '{value}': {error}"
                ))
            })?,
            None => 300,
        };
        if cleanup_interval_secs == 0 {
            return Err(AppError::Validation(
                "SESSION_CLEANUP_INTERVAL_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            worker_id,
            cleanup_interval_secs,
            run_once,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
