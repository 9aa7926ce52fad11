//! Domain logic for the nutrition analysis reconciliation pipeline.
//!
//! Everything in this crate is side-effect free: the normalizer,
//! aggregator, health scorer, sanity checker and manual-edit merge are
//! pure functions over the domain types, and the collaborator ports in
//! [`ports`] are the only seams through which I/O enters the pipeline.

pub mod aggregate;
pub mod config;
pub mod dish_name;
pub mod error;
pub mod health_score;
pub mod i18n;
pub mod job;
pub mod normalize;
pub mod nutrients;
pub mod ports;
pub mod reconcile;
pub mod sanity;
pub mod snapshot;
pub mod types;
