//! Dashsync: Git-to-Grafana Dashboard Reconciliation
//!
//! Keeps a remote dashboard server's folder hierarchy and dashboards in step
//! with a tree of JSON definitions in a git repository. Folder paths are
//! derived from the file layout, reconciled with query-before-create
//! semantics, and only dashboards whose content changed are uploaded.

pub mod change;
pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod remote;
pub mod source;
pub mod sync;
pub mod tree;
pub mod types;
