//! Integration tests for the dashboard sync engine

mod cli_parse;
mod grafana_client;
mod health_endpoint;
mod support;
mod sync_pipeline;
