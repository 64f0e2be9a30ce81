//! End-to-end integration tests for Logbook.
//!
//! These tests exercise the full stack over real sockets:
//! - Server startup and graceful shutdown
//! - The typed client against every route
//! - Alert delivery to a webhook receiver
//! - API-key auth and rate limiting
//! - File-backed storage across restarts

#![cfg(test)]
