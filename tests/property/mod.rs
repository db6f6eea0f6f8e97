//! Property-based tests for determinism guarantees
