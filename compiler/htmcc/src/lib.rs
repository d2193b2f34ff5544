//! htmc driver library.
//!
//! Ties the translator ([`htmc_translate`]) and the runtime ([`htmc_rt`])
//! together:
//!
//! ```text
//! page.htmc ──translate──► page.c ──CcDriver──► page.so ──Artifact──► htmc_main(table)
//! ```
//!
//! - [`pipeline`]: one function per stage, plus [`PipelineError`]
//! - [`cc`]: the C toolchain driver
//! - [`loader`]: `dlopen`-based artifact loading
//! - [`fscache`]: mtime comparisons for skipping rebuilds
//! - [`cgi`]: the CGI request mode
//! - [`cli`], [`logging`]: command-line front end

pub mod cc;
pub mod cgi;
pub mod cli;
pub mod fscache;
pub mod loader;
pub mod logging;
pub mod pipeline;

pub use cc::{BuildError, CcConfig, CcDriver};
pub use loader::{run_artifact, Artifact, LoadError};
pub use pipeline::PipelineError;
