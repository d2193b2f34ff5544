//! Shared helpers for the end-to-end tests.

use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

use htmc_rt::{DebugBackend, ProductionBackend, RequestContext};
use htmcc::pipeline::{self, PipelineError};
use htmcc::CcDriver;
use tempfile::TempDir;

/// Returns `true` if the configured C compiler can be started.
pub fn have_cc() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let driver = CcDriver::from_env();
        Command::new(&driver.config().compiler)
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    })
}

/// Skip the current test when no compiler is available.
macro_rules! require_cc {
    () => {
        if !$crate::util::have_cc() {
            eprintln!("skipping: no C compiler available");
            return;
        }
    };
}
pub(crate) use require_cc;

/// A document written into its own scratch directory.
pub struct Page {
    pub dir: TempDir,
    pub source: PathBuf,
}

impl Page {
    pub fn new(name: &str, contents: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join(name);
        std::fs::write(&source, contents).unwrap();
        Self { dir, source }
    }

    pub fn artifact(&self) -> PathBuf {
        self.dir.path().join(pipeline::artifact_name(&self.source))
    }

    pub fn build(&self) -> Result<PathBuf, PipelineError> {
        let artifact = self.artifact();
        pipeline::build_file(&CcDriver::from_env(), &self.source, &artifact)?;
        Ok(artifact)
    }

    /// Build and run with the debug backend, returning status and output.
    pub fn run_debug(&self, context: RequestContext) -> (i32, String) {
        let artifact = self.build().unwrap();
        let (status, backend) =
            pipeline::run_shared(&artifact, DebugBackend::with_writer(Vec::new()), context)
                .unwrap();
        (status, String::from_utf8(backend.into_writer()).unwrap())
    }

    /// Build and run with the production backend.
    pub fn run_production(&self, context: RequestContext) -> (i32, String) {
        let artifact = self.build().unwrap();
        let (status, backend) = pipeline::run_shared(
            &artifact,
            ProductionBackend::with_writer(Vec::new()),
            context,
        )
        .unwrap();
        (status, String::from_utf8(backend.into_writer()).unwrap())
    }
}
