//! Row model for the `analysis_jobs` table.

use sqlx::FromRow;

use mealscan_core::error::CoreError;
use mealscan_core::job::{AnalysisInput, AnalysisJob, InputKind, JobStatus, StatusId};
use mealscan_core::types::{DbId, Timestamp};

/// A row from `analysis_jobs`.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: DbId,
    pub status_id: StatusId,
    pub input_kind: String,
    pub input_ref: String,
    pub locale: String,
    pub created_at: Timestamp,
}

impl JobRow {
    /// Convert into the domain job, rejecting rows with values outside
    /// the known enums (which would indicate schema drift).
    pub fn into_job(self) -> Result<AnalysisJob, CoreError> {
        let status = JobStatus::from_id(self.status_id).ok_or_else(|| {
            CoreError::Persistence(format!(
                "job {}: unknown status id {}",
                self.id, self.status_id
            ))
        })?;
        let kind = InputKind::from_str_opt(&self.input_kind).ok_or_else(|| {
            CoreError::Persistence(format!(
                "job {}: unknown input kind {:?}",
                self.id, self.input_kind
            ))
        })?;

        Ok(AnalysisJob {
            id: self.id,
            status,
            input: AnalysisInput::from_parts(kind, self.input_ref),
            locale: self.locale,
            created_at: self.created_at,
        })
    }
}
