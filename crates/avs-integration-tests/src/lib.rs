//! Integration test crate for the AVS operator.
//!
//! This crate has no library code; it only contains integration tests
//! that run whole commit-reveal rounds across the workspace crates against
//! an in-process pool, aggregator and AVS manager.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p avs-integration-tests
//! ```
