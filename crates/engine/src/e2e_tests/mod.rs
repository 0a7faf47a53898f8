//! Backend E2E tests.
//!
//! These drive complete play-throughs using:
//! - The in-memory store behind the real repositories
//! - A scripted narrator and scripted dice
//! - Complete App construction with all use cases
//!
//! # Running E2E Tests
//!
//! ```bash
//! cargo test -p questline-engine --lib e2e_tests
//! ```
