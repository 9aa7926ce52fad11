//! Reconciliation pipeline: matching cascade, full-run orchestration
//! and the public service facade.
//!
//! The crate is wired entirely through the collaborator ports defined
//! in `mealscan_core::ports`; production binaries plug in the reqwest
//! clients from `mealscan-providers` and the Postgres store from
//! `mealscan-db`, tests plug in fakes.

pub mod matcher;
pub mod memory_cache;
pub mod runner;
pub mod service;

pub use matcher::{CachedMatch, MatchEngine};
pub use memory_cache::MemoryCache;
pub use runner::PipelineRunner;
pub use service::{AnalysisService, SubmitRequest};
