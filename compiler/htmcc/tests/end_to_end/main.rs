//! End-to-end tests: translate a document, build it with the system C
//! compiler, load it, and run it against a capturing backend.
//!
//! Every test that needs a compiler skips itself when `cc` is not
//! available.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

mod abi;
mod pages;
mod query;
mod util;
