//! Unit tests for the nodemend CLI
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod repair_service;
