//! Analysis job entity and lifecycle status.
//!
//! Status variants map 1-based onto the `job_statuses` lookup table
//! seed data, following the SMALLINT-lookup-table convention used
//! across the schema.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Analysis job lifecycle status.
///
/// A job transitions PENDING → PROCESSING → {COMPLETED, FAILED} exactly
/// once, driven by the worker. Reconciliation never changes job status;
/// it only appends result snapshots.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending = 1,
    Processing = 2,
    Completed = 3,
    Failed = 4,
}

impl JobStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a database status ID back to the enum. `None` for unknown ids.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Processing),
            3 => Some(Self::Completed),
            4 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<JobStatus> for StatusId {
    fn from(value: JobStatus) -> Self {
        value as StatusId
    }
}

/// What kind of original input a job carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Image,
    Text,
}

impl InputKind {
    /// Stable string form stored in the `input_kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// The original input a job was submitted with. Kept on the job so an
/// original-input re-run can re-interpret it from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisInput {
    /// URL of the submitted photo.
    ImageUrl(String),
    /// Free-text meal description.
    TextQuery(String),
}

impl AnalysisInput {
    pub fn kind(&self) -> InputKind {
        match self {
            Self::ImageUrl(_) => InputKind::Image,
            Self::TextQuery(_) => InputKind::Text,
        }
    }

    /// The raw reference string stored in the `input_ref` column.
    pub fn as_ref_str(&self) -> &str {
        match self {
            Self::ImageUrl(s) | Self::TextQuery(s) => s,
        }
    }

    pub fn from_parts(kind: InputKind, input_ref: String) -> Self {
        match kind {
            InputKind::Image => Self::ImageUrl(input_ref),
            InputKind::Text => Self::TextQuery(input_ref),
        }
    }
}

/// A row from the `analysis_jobs` table, in domain form.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisJob {
    pub id: DbId,
    pub status: JobStatus,
    pub input: AnalysisInput,
    pub locale: String,
    pub created_at: Timestamp,
}

/// Fields needed to create a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub input: AnalysisInput,
    pub locale: String,
}
