//! Analysis worker: claims pending jobs from Postgres and runs the
//! pipeline against them until shut down.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mealscan_core::config::PipelineConfig;
use mealscan_core::ports::PersistenceStore;
use mealscan_db::repositories::job_repo::JobRepo;
use mealscan_db::PgStore;
use mealscan_events::EventBus;
use mealscan_pipeline::{AnalysisService, MatchEngine, PipelineRunner};
use mealscan_providers::{HttpNutritionProvider, HttpTranslator, HttpVisionExtractor};

/// Pause between queue polls when no job is pending.
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Pool size for the worker; one connection per concurrent concern
/// (claim, results, cache) plus headroom.
const DB_POOL_SIZE: u32 = 5;

/// PROCESSING jobs untouched for this long are treated as stranded by
/// a dead worker and put back in the queue at startup.
const STALE_CLAIM_THRESHOLD: Duration = Duration::from_secs(10 * 60);

fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{key} must be set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mealscan_worker=debug,mealscan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PipelineConfig::from_env();

    let pool = mealscan_db::connect(&require_env("DATABASE_URL")?, DB_POOL_SIZE).await?;
    mealscan_db::run_migrations(&pool).await?;
    mealscan_db::health_check(&pool).await?;

    let requeued = JobRepo::requeue_stale(&pool, STALE_CLAIM_THRESHOLD).await?;
    if requeued > 0 {
        tracing::warn!(requeued, "returned stranded processing jobs to the queue");
    }

    let store = Arc::new(PgStore::new(pool));

    let vision = Arc::new(HttpVisionExtractor::new(
        require_env("MEALSCAN_VISION_URL")?,
        config.provider_timeout,
    )?);
    let nutrition = Arc::new(HttpNutritionProvider::new(
        require_env("MEALSCAN_NUTRITION_URL")?,
        config.provider_timeout,
    )?);
    let translator = Arc::new(HttpTranslator::new(
        require_env("MEALSCAN_TRANSLATE_URL")?,
        config.provider_timeout,
    )?);

    // The Postgres store doubles as the local food corpus and the
    // shared match cache.
    let matcher = MatchEngine::new(store.clone(), nutrition, store.clone(), config.clone());
    let runner = PipelineRunner::new(vision, translator, matcher, config);
    let service = AnalysisService::new(store.clone(), runner, Arc::new(EventBus::default()));

    tracing::info!("worker started, polling for analysis jobs");

    // The signal flips a watch channel instead of racing the claim
    // query in a select: a claim that commits PENDING → PROCESSING on
    // the server must not be cancelled mid-flight, or the job would
    // strand in PROCESSING with no executor.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    loop {
        if *shutdown_rx.borrow() {
            tracing::info!("shutdown signal received, stopping");
            break;
        }
        match store.claim_next_pending().await {
            Ok(Some(job)) => {
                let job_id = job.id;
                // execute() records FAILED and publishes the event;
                // the worker only logs and moves on.
                if let Err(e) = service.execute(job).await {
                    tracing::error!(job_id, error = %e, "job failed");
                }
            }
            Ok(None) => idle(&mut shutdown_rx).await,
            Err(e) => {
                tracing::error!(error = %e, "claim failed, backing off");
                idle(&mut shutdown_rx).await;
            }
        }
    }

    Ok(())
}

/// Sleep out the poll interval, waking early on shutdown.
async fn idle(shutdown_rx: &mut tokio::sync::watch::Receiver<bool>) {
    tokio::select! {
        _ = shutdown_rx.changed() => {}
        _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
    }
}
