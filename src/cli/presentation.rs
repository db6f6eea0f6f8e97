//! CLI presentation: text and json formatters per command family.

mod artefact;
mod dataset;
mod shared;
mod trial;

pub use artefact::{format_hash_result, format_init_result, format_ledger, format_restore_result};
pub use dataset::{format_dependency_digest, format_extract_outcome, format_sync_outcome};
pub use trial::{format_launched_trial, format_trials};
