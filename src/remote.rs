//! Remote dashboard server: API contract, HTTP transport, folder cache and
//! the folder reconciler built on top of them.

pub mod cache;
pub mod contract;
pub mod http;
pub mod reconcile;

pub use cache::{FolderCache, FolderRef};
pub use contract::{CreatedFolder, DashboardUpsert, RemoteApi, RemoteFolder};
pub use http::{GrafanaClient, RemoteAuth};
pub use reconcile::{FolderReconciler, ReconcileError, RootOutcome};
