//! Public service facade over the pipeline.
//!
//! Exposes the five core operations — submit, status, result, manual
//! reanalysis, original re-run — plus the worker entry points. All
//! persistence flows through the [`PersistenceStore`] port; snapshots
//! are appended, never updated in place.

use std::sync::Arc;

use serde::Deserialize;
use validator::Validate;

use mealscan_core::error::CoreError;
use mealscan_core::job::{AnalysisInput, AnalysisJob, InputKind, JobStatus, NewJob};
use mealscan_core::ports::PersistenceStore;
use mealscan_core::reconcile::{merge_manual_edits, ItemEdit};
use mealscan_core::snapshot::StoredSnapshot;
use mealscan_core::types::DbId;
use mealscan_events::{AnalysisEvent, EventBus};

use crate::runner::PipelineRunner;

/// Submission DTO.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitRequest {
    pub input_kind: InputKind,
    /// Image URL or free-text meal description, depending on the kind.
    #[validate(length(min = 1, max = 2048))]
    pub input_ref: String,
    /// BCP-47-ish language code, e.g. `"en"`, `"ru"`.
    #[validate(length(min = 2, max = 8))]
    pub locale: String,
}

impl SubmitRequest {
    fn into_new_job(self) -> Result<NewJob, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        if self.input_kind == InputKind::Image
            && !(self.input_ref.starts_with("http://") || self.input_ref.starts_with("https://"))
        {
            return Err(CoreError::Validation(
                "image submissions require an http(s) URL".into(),
            ));
        }

        Ok(NewJob {
            input: AnalysisInput::from_parts(self.input_kind, self.input_ref),
            locale: self.locale,
        })
    }
}

/// The pipeline's public surface.
pub struct AnalysisService {
    store: Arc<dyn PersistenceStore>,
    runner: PipelineRunner,
    bus: Arc<EventBus>,
}

impl AnalysisService {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        runner: PipelineRunner,
        bus: Arc<EventBus>,
    ) -> Self {
        Self { store, runner, bus }
    }

    // -----------------------------------------------------------------
    // Submission & queries
    // -----------------------------------------------------------------

    /// Validate and create a new analysis job.
    ///
    /// Submission is the de-duplication boundary: an identical input
    /// that is already pending or processing returns the existing job
    /// instead of enqueueing a second execution.
    pub async fn submit(&self, request: SubmitRequest) -> Result<AnalysisJob, CoreError> {
        let new_job = request.into_new_job()?;

        if let Some(existing) = self
            .store
            .find_active_duplicate(&new_job.input, &new_job.locale)
            .await?
        {
            tracing::info!(job_id = existing.id, "duplicate submission, reusing active job");
            return Ok(existing);
        }

        let job = self.store.create_job(&new_job).await?;
        tracing::info!(job_id = job.id, kind = ?job.input.kind(), "job submitted");
        self.bus
            .publish(AnalysisEvent::new(AnalysisEvent::JOB_SUBMITTED).with_job(job.id));
        Ok(job)
    }

    pub async fn get_status(&self, job_id: DbId) -> Result<JobStatus, CoreError> {
        Ok(self.require_job(job_id).await?.status)
    }

    /// Current status plus the newest snapshot, when one exists.
    pub async fn get_result(
        &self,
        job_id: DbId,
    ) -> Result<(JobStatus, Option<StoredSnapshot>), CoreError> {
        let job = self.require_job(job_id).await?;
        let snapshot = self.store.latest_result(job_id).await?;
        Ok((job.status, snapshot))
    }

    // -----------------------------------------------------------------
    // Worker entry points
    // -----------------------------------------------------------------

    /// Claim and execute one specific pending job.
    ///
    /// No-ops (without error) when the job has already been claimed:
    /// the queue contract is at-most-one execution per job id, and a
    /// second invocation must not re-run the pipeline.
    pub async fn process_job(&self, job_id: DbId) -> Result<(), CoreError> {
        let job = self.require_job(job_id).await?;

        if !self.store.claim_for_processing(job_id).await? {
            tracing::warn!(job_id, status = ?job.status, "job already claimed, skipping");
            return Ok(());
        }

        self.execute(job).await
    }

    /// Execute an already-claimed job (status must be PROCESSING).
    ///
    /// Used by the worker loop, which claims via
    /// `PersistenceStore::claim_next_pending`.
    pub async fn execute(&self, job: AnalysisJob) -> Result<(), CoreError> {
        let job_id = job.id;
        tracing::info!(job_id, locale = %job.locale, "analysis started");

        match self.runner.analyze(&job.input, &job.locale).await {
            Ok(snapshot) => {
                let stored = match self.store.append_result(job_id, &snapshot).await {
                    Ok(stored) => stored,
                    Err(e) => return self.fail_job(job_id, e).await,
                };
                if let Err(e) = self
                    .store
                    .update_job_status(job_id, JobStatus::Completed)
                    .await
                {
                    return self.fail_job(job_id, e).await;
                }
                tracing::info!(
                    job_id,
                    snapshot_id = stored.id,
                    items = stored.snapshot.items.len(),
                    score = stored.snapshot.health_score.score,
                    "analysis completed",
                );
                self.bus.publish(
                    AnalysisEvent::new(AnalysisEvent::ANALYSIS_COMPLETED)
                        .with_job(job_id)
                        .with_payload(serde_json::json!({ "snapshot_id": stored.id })),
                );
                Ok(())
            }
            Err(e) => self.fail_job(job_id, e).await,
        }
    }

    // -----------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------

    /// Merge user-supplied edits into the latest snapshot and append a
    /// new, internally consistent one.
    pub async fn manual_reanalyze(
        &self,
        job_id: DbId,
        edits: Vec<ItemEdit>,
    ) -> Result<StoredSnapshot, CoreError> {
        let job = self.require_job(job_id).await?;
        let prior = self
            .store
            .latest_result(job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "analysis result",
                id: job_id,
            })?;

        let merged = merge_manual_edits(&prior.snapshot.items, &edits)?;
        let snapshot = self.runner.assemble(merged, &job.locale).await;
        let stored = self.store.append_result(job_id, &snapshot).await?;

        tracing::info!(job_id, snapshot_id = stored.id, "manual reanalysis appended");
        self.bus.publish(
            AnalysisEvent::new(AnalysisEvent::RESULT_RECONCILED)
                .with_job(job_id)
                .with_payload(serde_json::json!({
                    "snapshot_id": stored.id,
                    "mode": "manual_edit",
                })),
        );
        Ok(stored)
    }

    /// Re-run the full pipeline against the job's stored original
    /// input, discarding the prior item list entirely.
    pub async fn reanalyze_original(&self, job_id: DbId) -> Result<StoredSnapshot, CoreError> {
        let job = self.require_job(job_id).await?;

        let snapshot = self.runner.analyze(&job.input, &job.locale).await?;
        let stored = self.store.append_result(job_id, &snapshot).await?;

        tracing::info!(job_id, snapshot_id = stored.id, "original-input rerun appended");
        self.bus.publish(
            AnalysisEvent::new(AnalysisEvent::RESULT_RECONCILED)
                .with_job(job_id)
                .with_payload(serde_json::json!({
                    "snapshot_id": stored.id,
                    "mode": "original_rerun",
                })),
        );
        Ok(stored)
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    async fn require_job(&self, job_id: DbId) -> Result<AnalysisJob, CoreError> {
        self.store
            .find_job(job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "analysis job",
                id: job_id,
            })
    }

    /// Mark the job FAILED (best effort) and surface the original error.
    async fn fail_job(&self, job_id: DbId, error: CoreError) -> Result<(), CoreError> {
        tracing::error!(job_id, error = %error, "analysis failed");
        if let Err(status_err) = self
            .store
            .update_job_status(job_id, JobStatus::Failed)
            .await
        {
            tracing::error!(job_id, error = %status_err, "failed to record FAILED status");
        }
        self.bus.publish(
            AnalysisEvent::new(AnalysisEvent::ANALYSIS_FAILED)
                .with_job(job_id)
                .with_payload(serde_json::json!({ "error": error.to_string() })),
        );
        Err(error)
    }
}
