//! Integration tests for Sumi-Harvest
//!
//! These tests use wiremock to create mock HTTP servers and run the scrape
//! walks end-to-end.

mod common;
mod job_tests;
mod politeness_tests;
mod walk_tests;
