//! Repository for the `cache_entries` TTL key-value table.

use std::time::Duration;

use sqlx::PgPool;

/// TTL cache operations, namespaced per concern.
pub struct CacheRepo;

impl CacheRepo {
    /// Live value for the key, or `None` when absent or expired.
    /// Expired rows are left for [`CacheRepo::purge_expired`].
    pub async fn get(
        pool: &PgPool,
        namespace: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM cache_entries \
             WHERE namespace = $1 AND key = $2 AND expires_at > NOW()",
        )
        .bind(namespace)
        .bind(key)
        .fetch_optional(pool)
        .await
    }

    /// Upsert a value with a fresh TTL.
    pub async fn put(
        pool: &PgPool,
        namespace: &str,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO cache_entries (namespace, key, value, expires_at) \
             VALUES ($1, $2, $3, NOW() + make_interval(secs => $4)) \
             ON CONFLICT (namespace, key) DO UPDATE \
                 SET value = EXCLUDED.value, \
                     expires_at = EXCLUDED.expires_at, \
                     created_at = NOW()",
        )
        .bind(namespace)
        .bind(key)
        .bind(value)
        .bind(ttl.as_secs_f64())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete expired rows; returns how many were removed.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
