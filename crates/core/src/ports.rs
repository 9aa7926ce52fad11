//! Collaborator ports.
//!
//! The pipeline talks to every external system through these traits:
//! the vision/extraction step, the remote nutrition provider, the local
//! full-text corpus, the translation service, the shared TTL cache and
//! the persistence layer. Production implementations live in the
//! `providers` and `db` crates; the pipeline's integration tests use
//! in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::job::{AnalysisInput, AnalysisJob, JobStatus, NewJob};
use crate::nutrients::NutrientsPer100g;
use crate::snapshot::{AnalysisSnapshot, StoredSnapshot};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Collaborator DTOs
// ---------------------------------------------------------------------------

/// One candidate emitted by the vision/extraction step: a name, a
/// portion estimate and rough absolute macros for that portion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCandidate {
    pub name: String,
    pub portion_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// A remote nutrition-provider hit. Carries a provider-assigned
/// identity, which is why provider results are always preferred over
/// vision estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFood {
    pub provider_id: String,
    pub per_100g: NutrientsPer100g,
    pub confidence: f64,
}

/// A ranked row from the local full-text corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    pub per_100g: NutrientsPer100g,
    /// Full-text relevance rank; compared against the configured
    /// acceptance threshold.
    pub rank: f64,
}

// ---------------------------------------------------------------------------
// Lookup collaborators
// ---------------------------------------------------------------------------

/// The upstream extraction black box: image bytes or free text in,
/// ordered food candidates out.
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    async fn extract(
        &self,
        input: &AnalysisInput,
        locale: &str,
    ) -> Result<Vec<FoodCandidate>, CoreError>;
}

/// Remote nutrition database lookup by normalized name.
#[async_trait]
pub trait NutritionProvider: Send + Sync {
    /// `Ok(None)` means "not found"; transport failures surface as
    /// `ProviderUnavailable` and are treated as misses by the cascade.
    async fn lookup(
        &self,
        normalized_name: &str,
        locale: &str,
    ) -> Result<Option<ProviderFood>, CoreError>;
}

/// Local full-text search over the nutrition corpus.
#[async_trait]
pub trait LocalFoodSearch: Send + Sync {
    /// Best hit for the normalized name, if any.
    async fn search(&self, normalized_name: &str) -> Result<Option<SearchHit>, CoreError>;
}

/// Best-effort text translation for dish-name localization.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_locale: &str) -> Result<String, CoreError>;
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Shared TTL-bounded key-value store. Safe under concurrent access;
/// no cross-key transactional guarantee.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, CoreError>;

    async fn put(
        &self,
        namespace: &str,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Persistence contract for jobs and append-only result history.
///
/// Each operation is individually atomic; there are no multi-job
/// transactions. Snapshots are never updated in place.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn create_job(&self, new_job: &NewJob) -> Result<AnalysisJob, CoreError>;

    async fn find_job(&self, job_id: DbId) -> Result<Option<AnalysisJob>, CoreError>;

    /// A pending or processing job with the same input and locale, used
    /// to de-duplicate at the submission boundary.
    async fn find_active_duplicate(
        &self,
        input: &AnalysisInput,
        locale: &str,
    ) -> Result<Option<AnalysisJob>, CoreError>;

    /// Atomically claim the oldest pending job for processing.
    /// At-most-one concurrent execution per job id.
    async fn claim_next_pending(&self) -> Result<Option<AnalysisJob>, CoreError>;

    /// Transition one specific job PENDING → PROCESSING. Returns
    /// `false` when the job was already past PENDING, in which case the
    /// caller must treat the invocation as a no-op.
    async fn claim_for_processing(&self, job_id: DbId) -> Result<bool, CoreError>;

    async fn update_job_status(&self, job_id: DbId, status: JobStatus)
        -> Result<(), CoreError>;

    /// Append a snapshot to the job's history and return its storage
    /// identity. Never overwrites an existing snapshot.
    async fn append_result(
        &self,
        job_id: DbId,
        snapshot: &AnalysisSnapshot,
    ) -> Result<StoredSnapshot, CoreError>;

    /// The most recently created snapshot for the job, if any.
    async fn latest_result(&self, job_id: DbId) -> Result<Option<StoredSnapshot>, CoreError>;
}
