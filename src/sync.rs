//! Reconciliation driving: artifact records, uploads, one pass, and the
//! poll loop around it.

pub mod artifact;
pub mod daemon;
pub mod pass;
pub mod upload;

pub use artifact::ArtifactRecord;
pub use daemon::{CycleOutcome, SyncDaemon};
pub use pass::{PassReport, ReconciliationPass};
pub use upload::UploadDriver;
