//! Integration tests for Leadscout
//!
//! These tests run full crawls against wiremock servers, with a virtual clock
//! and stub collaborators so they are fast and deterministic.

mod common;
mod crawl_tests;
mod pipeline_tests;
mod search_tests;
