//! Integration tests for docharvest
//!
//! These tests use wiremock to stand in for a documentation site and drive
//! the whole crawl loop end-to-end, checking the files it leaves behind.

mod auth_tests;
mod crawl_tests;
mod support;
