//! Port implementations over Postgres.
//!
//! [`PgStore`] is the single adapter handed to the pipeline in
//! production: it implements the persistence, cache and local-search
//! ports over one shared pool.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use mealscan_core::error::CoreError;
use mealscan_core::job::{AnalysisInput, AnalysisJob, JobStatus, NewJob};
use mealscan_core::ports::{Cache, LocalFoodSearch, PersistenceStore, SearchHit};
use mealscan_core::snapshot::{AnalysisSnapshot, StoredSnapshot};
use mealscan_core::types::DbId;

use crate::repositories::cache_repo::CacheRepo;
use crate::repositories::food_repo::FoodRepo;
use crate::repositories::job_repo::JobRepo;
use crate::repositories::result_repo::ResultRepo;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn pg_err(context: &str, e: sqlx::Error) -> CoreError {
    CoreError::Persistence(format!("{context}: {e}"))
}

#[async_trait]
impl PersistenceStore for PgStore {
    async fn create_job(&self, new_job: &NewJob) -> Result<AnalysisJob, CoreError> {
        JobRepo::create(&self.pool, new_job)
            .await
            .map_err(|e| pg_err("create job", e))?
            .into_job()
    }

    async fn find_job(&self, job_id: DbId) -> Result<Option<AnalysisJob>, CoreError> {
        JobRepo::find_by_id(&self.pool, job_id)
            .await
            .map_err(|e| pg_err("find job", e))?
            .map(|row| row.into_job())
            .transpose()
    }

    async fn find_active_duplicate(
        &self,
        input: &AnalysisInput,
        locale: &str,
    ) -> Result<Option<AnalysisJob>, CoreError> {
        JobRepo::find_active_duplicate(&self.pool, input, locale)
            .await
            .map_err(|e| pg_err("find duplicate", e))?
            .map(|row| row.into_job())
            .transpose()
    }

    async fn claim_next_pending(&self) -> Result<Option<AnalysisJob>, CoreError> {
        JobRepo::claim_next_pending(&self.pool)
            .await
            .map_err(|e| pg_err("claim next", e))?
            .map(|row| row.into_job())
            .transpose()
    }

    async fn claim_for_processing(&self, job_id: DbId) -> Result<bool, CoreError> {
        JobRepo::claim_for_processing(&self.pool, job_id)
            .await
            .map_err(|e| pg_err("claim job", e))
    }

    async fn update_job_status(&self, job_id: DbId, status: JobStatus) -> Result<(), CoreError> {
        let updated = JobRepo::update_status(&self.pool, job_id, status)
            .await
            .map_err(|e| pg_err("update status", e))?;
        if !updated {
            return Err(CoreError::NotFound {
                entity: "analysis job",
                id: job_id,
            });
        }
        Ok(())
    }

    async fn append_result(
        &self,
        job_id: DbId,
        snapshot: &AnalysisSnapshot,
    ) -> Result<StoredSnapshot, CoreError> {
        ResultRepo::append(&self.pool, job_id, snapshot)
            .await
            .map_err(|e| pg_err("append result", e))?
            .into_stored()
    }

    async fn latest_result(&self, job_id: DbId) -> Result<Option<StoredSnapshot>, CoreError> {
        ResultRepo::latest_for_job(&self.pool, job_id)
            .await
            .map_err(|e| pg_err("latest result", e))?
            .map(|row| row.into_stored())
            .transpose()
    }
}

#[async_trait]
impl Cache for PgStore {
    async fn get(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, CoreError> {
        CacheRepo::get(&self.pool, namespace, key)
            .await
            .map_err(|e| pg_err("cache get", e))
    }

    async fn put(
        &self,
        namespace: &str,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CoreError> {
        CacheRepo::put(&self.pool, namespace, key, value, ttl)
            .await
            .map_err(|e| pg_err("cache put", e))
    }
}

#[async_trait]
impl LocalFoodSearch for PgStore {
    async fn search(&self, normalized_name: &str) -> Result<Option<SearchHit>, CoreError> {
        Ok(FoodRepo::best_match(&self.pool, normalized_name)
            .await
            .map_err(|e| pg_err("food search", e))?
            .map(|row| row.into_hit()))
    }
}
