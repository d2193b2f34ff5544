//! CGI mode: serve one request for the document named by the web server.
//!
//! The document path comes from `PATH_TRANSLATED`, or from `PATH_INFO`
//! relative to the working directory. The artifact is rebuilt only when the
//! document is newer than it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use htmc_rt::{ProductionBackend, RequestContext};

use crate::cc::CcDriver;
use crate::fscache;
use crate::pipeline::{self, PipelineError};

/// Build directory used when `-o` is not given.
pub const DEFAULT_BUILD_DIR: &str = "./tmp";

/// Response header written before any page output.
pub const CONTENT_TYPE_HEADER: &str = "Content-type: text/html\n\n";

/// Resolve the requested document from CGI variables.
pub fn document_path(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf, PipelineError> {
    if let Some(path) = lookup("PATH_TRANSLATED").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    match lookup("PATH_INFO") {
        Some(info) if !info.trim_start_matches('/').is_empty() => {
            Ok(PathBuf::from(info.trim_start_matches('/')))
        }
        _ => Err(PipelineError::Cgi(
            "no document requested (PATH_TRANSLATED and PATH_INFO are unset)".to_string(),
        )),
    }
}

/// Make sure the artifact for `document` in `build_dir` is current,
/// building it if needed. Returns the artifact path.
pub fn prepare(driver: &CcDriver, document: &Path, build_dir: &Path) -> Result<PathBuf, PipelineError> {
    std::fs::metadata(document).map_err(|e| PipelineError::io(document, e))?;
    std::fs::create_dir_all(build_dir).map_err(|e| PipelineError::io(build_dir, e))?;

    let artifact = build_dir.join(pipeline::artifact_name(document));
    if fscache::is_fresh(document, &artifact) {
        tracing::debug!(artifact = %artifact.display(), "artifact up to date");
    } else {
        pipeline::build_file(driver, document, &artifact)?;
    }
    Ok(artifact)
}

/// Serve the request described by the process environment.
///
/// Returns the entry point's status.
pub fn serve(driver: &CcDriver, build_dir: Option<&Path>) -> Result<i32, PipelineError> {
    let document = document_path(|key| std::env::var(key).ok())?;
    let build_dir = build_dir.unwrap_or_else(|| Path::new(DEFAULT_BUILD_DIR));
    let artifact = prepare(driver, &document, build_dir)?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(CONTENT_TYPE_HEADER.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| PipelineError::Cgi(format!("cannot write response header: {e}")))?;
    drop(stdout);

    let (status, _) = pipeline::run_shared(&artifact, ProductionBackend::new(), RequestContext::from_env())?;
    Ok(status)
}
