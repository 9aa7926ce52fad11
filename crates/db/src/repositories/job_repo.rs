//! Repository for the `analysis_jobs` table.
//!
//! Status transitions go through `JobStatus` ids only; no literal
//! status numbers appear in queries.

use std::time::Duration;

use sqlx::PgPool;

use mealscan_core::job::{AnalysisInput, JobStatus, NewJob};
use mealscan_core::types::DbId;

use crate::models::job::JobRow;

/// Column list for `analysis_jobs` queries.
const COLUMNS: &str = "id, status_id, input_kind, input_ref, locale, created_at";

/// Queue operations for analysis jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new pending job.
    pub async fn create(pool: &PgPool, new_job: &NewJob) -> Result<JobRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO analysis_jobs (status_id, input_kind, input_ref, locale) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(JobStatus::Pending.id())
            .bind(new_job.input.kind().as_str())
            .bind(new_job.input.as_ref_str())
            .bind(&new_job.locale)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, job_id: DbId) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM analysis_jobs WHERE id = $1");
        sqlx::query_as::<_, JobRow>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Oldest pending or processing job with the same input and locale.
    pub async fn find_active_duplicate(
        pool: &PgPool,
        input: &AnalysisInput,
        locale: &str,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM analysis_jobs \
             WHERE input_kind = $1 AND input_ref = $2 AND locale = $3 \
               AND status_id IN ($4, $5) \
             ORDER BY created_at ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(input.kind().as_str())
            .bind(input.as_ref_str())
            .bind(locale)
            .bind(JobStatus::Pending.id())
            .bind(JobStatus::Processing.id())
            .fetch_optional(pool)
            .await
    }

    /// Atomically claim the oldest pending job.
    ///
    /// `FOR UPDATE SKIP LOCKED` keeps concurrent workers from claiming
    /// the same row.
    pub async fn claim_next_pending(pool: &PgPool) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!(
            "UPDATE analysis_jobs \
             SET status_id = $1, updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM analysis_jobs \
                 WHERE status_id = $2 \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(JobStatus::Processing.id())
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Transition one specific job PENDING → PROCESSING. Returns whether
    /// this call won the claim.
    pub async fn claim_for_processing(pool: &PgPool, job_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE analysis_jobs \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(job_id)
        .bind(JobStatus::Processing.id())
        .bind(JobStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Return PROCESSING jobs that have not progressed within the
    /// threshold to PENDING. Recovers claims stranded by a worker that
    /// died between claiming and finishing.
    pub async fn requeue_stale(pool: &PgPool, older_than: Duration) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE analysis_jobs \
             SET status_id = $1, updated_at = NOW() \
             WHERE status_id = $2 \
               AND updated_at < NOW() - make_interval(secs => $3)",
        )
        .bind(JobStatus::Pending.id())
        .bind(JobStatus::Processing.id())
        .bind(older_than.as_secs_f64())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_status(
        pool: &PgPool,
        job_id: DbId,
        status: JobStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE analysis_jobs SET status_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .bind(status.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
