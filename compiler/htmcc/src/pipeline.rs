//! The translate → compile → load → run pipeline, one function per stage.

use std::io;
use std::path::{Path, PathBuf};

use htmc_rt::{Backend, CapabilityTable, RequestContext};
use htmc_translate::{TranslateError, TranslateStats};

use crate::cc::{BuildError, CcDriver};
use crate::loader::{self, LoadError};

/// Everything that can stop a pipeline run. Each variant is one diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),

    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("input file required but not provided")]
    MissingInput,

    #[error("{0}")]
    Cgi(String),
}

impl PipelineError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Translate the hybrid document `src` into C at `dst`.
///
/// On failure `dst` is removed so no stale translation survives.
#[tracing::instrument(level = "debug", skip_all, fields(src = %src.display(), dst = %dst.display()))]
pub fn translate_file(src: &Path, dst: &Path) -> Result<TranslateStats, PipelineError> {
    let source = std::fs::File::open(src).map_err(|e| PipelineError::io(src, e))?;
    let mut out = Vec::new();
    let result = htmc_translate::translate(io::BufReader::new(source), &mut out);

    let stats = match result {
        Ok(stats) => stats,
        Err(err) => {
            if dst.exists() {
                if let Err(e) = std::fs::remove_file(dst) {
                    tracing::warn!(%e, path = %dst.display(), "could not remove stale output");
                }
            }
            return Err(err.into());
        }
    };

    std::fs::write(dst, out).map_err(|e| PipelineError::io(dst, e))?;
    tracing::debug!(?stats, "translated");
    Ok(stats)
}

/// Compile translated C at `src` into the shared object `dst`.
pub fn compile_file(driver: &CcDriver, src: &Path, dst: &Path) -> Result<(), PipelineError> {
    if !src.is_file() {
        return Err(PipelineError::io(src, io::ErrorKind::NotFound.into()));
    }
    driver.compile(src, dst)?;
    Ok(())
}

/// Translate and compile `src` into `dst`.
///
/// The C file goes in the driver's runtime directory, so files beside `dst`
/// are never overwritten.
pub fn build_file(driver: &CcDriver, src: &Path, dst: &Path) -> Result<(), PipelineError> {
    let rt = driver.runtime_dir_for(dst);
    std::fs::create_dir_all(&rt).map_err(|e| PipelineError::io(&rt, e))?;
    let c_file = driver.intermediate_path(dst, "c");
    tracing::debug!(c_file = %c_file.display(), "intermediate translation");
    translate_file(src, &c_file)?;
    compile_file(driver, &c_file, dst)
}

/// Load `artifact` and run it against a fresh table for `backend`.
///
/// Returns the entry point's status and the backend, whose output and
/// arena state reflect the run.
pub fn run_shared<B: Backend>(
    artifact: &Path,
    backend: B,
    context: RequestContext,
) -> Result<(i32, B), PipelineError> {
    let mut table = CapabilityTable::new(backend, context);
    let status = loader::run_artifact(artifact, &mut *table)?;
    Ok((status, table.into_backend()))
}

/// Build `src` inside `build_dir` and run the result.
pub fn build_and_run<B: Backend>(
    driver: &CcDriver,
    src: &Path,
    build_dir: &Path,
    backend: B,
    context: RequestContext,
) -> Result<(i32, B), PipelineError> {
    let artifact = build_dir.join(artifact_name(src));
    build_file(driver, src, &artifact)?;
    run_shared(&artifact, backend, context)
}

/// Shared-object file name for `src`: its path with separators flattened.
///
/// `pages/index.htmc` becomes `pages_index.htmc.so`, so documents with the
/// same file name in different directories never share an artifact.
pub fn artifact_name(src: &Path) -> String {
    let flat: String = src
        .to_string_lossy()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{flat}.so")
}

#[cfg(test)]
mod tests;
