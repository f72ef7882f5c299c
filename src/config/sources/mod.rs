//! Configuration sources, one module per layer.

pub mod environment;
pub mod file;
pub mod legacy;
