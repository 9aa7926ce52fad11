//! Repository for the append-only `analysis_results` table.

use rand::distr::Alphanumeric;
use rand::Rng;
use sqlx::types::Json;
use sqlx::PgPool;

use mealscan_core::snapshot::AnalysisSnapshot;
use mealscan_core::types::DbId;

use crate::models::result::ResultRow;

/// Column list for `analysis_results` queries.
const COLUMNS: &str = "\
    id, job_id, public_token, locale, dish_name, original_dish_name, \
    items, totals, health_score, findings, is_suspicious, needs_review, \
    created_at";

/// Length of generated public tokens.
const TOKEN_LEN: usize = 24;

/// Insert retries on a public-token collision before giving up.
const TOKEN_ATTEMPTS: u32 = 3;

/// History operations for analysis result snapshots.
pub struct ResultRepo;

impl ResultRepo {
    /// Append a snapshot. Rows are immutable once written; re-analysis
    /// appends a new row rather than updating this one.
    ///
    /// Token collisions are retried with a fresh token a bounded number
    /// of times; at 24 alphanumeric characters a collision is a sign of
    /// something badly wrong, not bad luck, so the last error surfaces.
    pub async fn append(
        pool: &PgPool,
        job_id: DbId,
        snapshot: &AnalysisSnapshot,
    ) -> Result<ResultRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO analysis_results \
                 (job_id, public_token, locale, dish_name, original_dish_name, \
                  items, totals, health_score, findings, is_suspicious, needs_review) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            let token = generate_token();
            let result = sqlx::query_as::<_, ResultRow>(&query)
                .bind(job_id)
                .bind(&token)
                .bind(&snapshot.locale)
                .bind(&snapshot.dish_name)
                .bind(&snapshot.original_dish_name)
                .bind(Json(&snapshot.items))
                .bind(Json(&snapshot.totals))
                .bind(Json(&snapshot.health_score))
                .bind(Json(&snapshot.findings))
                .bind(snapshot.is_suspicious)
                .bind(snapshot.needs_review)
                .fetch_one(pool)
                .await;

            match result {
                Ok(row) => return Ok(row),
                Err(e) if attempt < TOKEN_ATTEMPTS && is_token_collision(&e) => {
                    tracing::warn!(job_id, attempt, "public token collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Newest snapshot for a job.
    pub async fn latest_for_job(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Option<ResultRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM analysis_results \
             WHERE job_id = $1 \
             ORDER BY id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, ResultRow>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Full history for a job, oldest first.
    pub async fn history_for_job(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<ResultRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM analysis_results WHERE job_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, ResultRow>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Share-link lookup by opaque token.
    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<ResultRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM analysis_results WHERE public_token = $1");
        sqlx::query_as::<_, ResultRow>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn is_token_collision(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db
            .constraint()
            .is_some_and(|c| c.contains("public_token")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_alphanumeric_and_sized() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }
}
