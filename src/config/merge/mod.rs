//! Config composition: merge policy plus the service applying it.

pub mod merge_policy;
pub mod service;
