//! Integration tests for Contact-Miner
//!
//! These tests use wiremock to serve sites and drive fetchers, discovery,
//! the pipeline and whole batch runs end-to-end.

mod common;
mod discovery_tests;
mod pipeline_tests;
mod run_tests;
