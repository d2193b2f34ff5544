//! C toolchain driver.
//!
//! Turns a translated C file into a loadable shared object that carries its
//! own copy of the htmc glue:
//!
//! ```text
//! page.c ──cc -c──► page.o ─┐
//!                           ├─cc -shared──► page.so
//! libhtmc.c ──cc -c──► libhtmc.o ┘
//! ```
//!
//! The glue sources are written into a runtime directory (by default
//! `.htmc-rt` next to the output) so the include path is always valid, even
//! for an installed binary with no source tree around it. Intermediate
//! `.c` and `.o` files for an output live there too, never beside it.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use htmc_rt::glue;

use crate::fscache;

/// Compiler used when neither `HTMC_CC` nor `CC` is set.
pub const DEFAULT_COMPILER: &str = "cc";

/// Name of the runtime directory created next to build outputs.
pub const RUNTIME_DIR_NAME: &str = ".htmc-rt";

/// Intermediate file stem when the output path has no file name.
const DEFAULT_STEM: &str = "htmc-out";

// --- Error Types ---

/// Error type for toolchain operations.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The compiler executable could not be started.
    #[error("C compiler '{tool}' not found")]
    ToolNotFound { tool: String },

    /// A toolchain step exited unsuccessfully.
    #[error("{}", FailedDisplay { tool, exit_code: *exit_code, stderr, command })]
    Failed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
        command: String,
    },

    /// Reading or writing build files failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

struct FailedDisplay<'a> {
    tool: &'a str,
    exit_code: Option<i32>,
    stderr: &'a str,
    command: &'a str,
}

impl fmt::Display for FailedDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' failed", self.tool)?;
        if let Some(code) = self.exit_code {
            write!(f, " (exit code {code})")?;
        }
        if !self.stderr.is_empty() {
            write!(f, "\n\nCompiler stderr:\n{}", self.stderr.trim_end())?;
        }
        write!(f, "\n\nCommand: {}", self.command)
    }
}

impl BuildError {
    /// Exit status of the failing tool, if it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => *exit_code,
            Self::ToolNotFound { .. } | Self::Io { .. } => None,
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// --- Configuration ---

/// Toolchain settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcConfig {
    /// Compiler and linker driver program.
    pub compiler: OsString,
    /// Extra flags passed to every step.
    pub extra_flags: Vec<String>,
    /// Optimization flag for compile steps.
    pub opt_level: String,
    /// Where the glue is written; `None` means next to the output.
    pub runtime_dir: Option<PathBuf>,
}

impl Default for CcConfig {
    fn default() -> Self {
        Self {
            compiler: OsString::from(DEFAULT_COMPILER),
            extra_flags: Vec::new(),
            opt_level: "-O2".to_string(),
            runtime_dir: None,
        }
    }
}

impl CcConfig {
    /// Read `HTMC_CC` (else `CC`) and `HTMC_CFLAGS` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut config = Self::default();
        if let Some(cc) = lookup("HTMC_CC")
            .or_else(|| lookup("CC"))
            .filter(|cc| !cc.is_empty())
        {
            config.compiler = cc;
        }
        if let Some(flags) = lookup("HTMC_CFLAGS") {
            config.extra_flags = merge_flags(&config.extra_flags, &flags.to_string_lossy());
        }
        config
    }

    #[must_use]
    pub fn with_runtime_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.runtime_dir = Some(dir.into());
        self
    }
}

/// Append whitespace-separated `extra` flags not already in `existing`.
pub fn merge_flags(existing: &[String], extra: &str) -> Vec<String> {
    let mut merged = existing.to_vec();
    for flag in extra.split_whitespace() {
        if !merged.iter().any(|f| f == flag) {
            merged.push(flag.to_string());
        }
    }
    merged
}

// --- Driver ---

/// Drives the C compiler through the compile and link steps.
#[derive(Debug, Clone, Default)]
pub struct CcDriver {
    config: CcConfig,
}

impl CcDriver {
    pub fn new(config: CcConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(CcConfig::from_env())
    }

    pub fn config(&self) -> &CcConfig {
        &self.config
    }

    /// Runtime directory used when building `dst`.
    pub fn runtime_dir_for(&self, dst: &Path) -> PathBuf {
        match &self.config.runtime_dir {
            Some(dir) => dir.clone(),
            None => parent_dir(dst).join(RUNTIME_DIR_NAME),
        }
    }

    /// Path of an intermediate file for `dst`, inside its runtime directory.
    ///
    /// `site/page.so` with extension `c` maps to `site/.htmc-rt/page.c`.
    pub fn intermediate_path(&self, dst: &Path, extension: &str) -> PathBuf {
        let name = dst.file_name().unwrap_or(OsStr::new(DEFAULT_STEM));
        self.runtime_dir_for(dst).join(name).with_extension(extension)
    }

    /// Compile translated C at `src` into the shared object `dst`.
    #[tracing::instrument(level = "debug", skip_all, fields(src = %src.display(), dst = %dst.display()))]
    pub fn compile(&self, src: &Path, dst: &Path) -> Result<(), BuildError> {
        let rt = self.runtime_dir_for(dst);
        materialize_runtime(&rt)?;

        let glue_src = rt.join(glue::SOURCE_PATH);
        let glue_obj = glue_src.with_extension("o");
        if fscache::is_fresh(&glue_src, &glue_obj) {
            tracing::debug!(obj = %glue_obj.display(), "glue object up to date");
        } else {
            self.run(&mut self.object_command(&glue_src, &glue_obj, &rt))?;
        }

        let obj = self.intermediate_path(dst, "o");
        self.run(&mut self.object_command(src, &obj, &rt))?;
        let linked = self.run(&mut self.link_command(&[&obj, &glue_obj], dst));

        if let Err(err) = std::fs::remove_file(&obj) {
            tracing::debug!(%err, obj = %obj.display(), "could not remove object file");
        }
        linked
    }

    fn object_command(&self, src: &Path, obj: &Path, rt: &Path) -> Command {
        let mut cmd = Command::new(&self.config.compiler);
        cmd.arg(&self.config.opt_level)
            .arg("-fPIC")
            .arg(format!("-I{}", rt.join(glue::INCLUDE_DIR).display()))
            .args(&self.config.extra_flags)
            .arg("-c")
            .arg(src)
            .arg("-o")
            .arg(obj);
        cmd
    }

    fn link_command(&self, objects: &[&Path], dst: &Path) -> Command {
        let mut cmd = Command::new(&self.config.compiler);
        cmd.arg("-shared")
            .args(&self.config.extra_flags)
            .arg("-o")
            .arg(dst)
            .args(objects);
        cmd
    }

    fn run(&self, cmd: &mut Command) -> Result<(), BuildError> {
        let tool = self.config.compiler.to_string_lossy().into_owned();
        tracing::debug!(command = ?cmd, "running");

        let output: Output = cmd.output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                BuildError::ToolNotFound { tool: tool.clone() }
            } else {
                BuildError::io(Path::new(&self.config.compiler), e)
            }
        })?;

        if output.status.success() {
            return Ok(());
        }

        Err(BuildError::Failed {
            tool,
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            command: format!("{cmd:?}"),
        })
    }
}

/// Write the glue header and source into `rt`, touching only files whose
/// content differs.
pub fn materialize_runtime(rt: &Path) -> Result<(), BuildError> {
    write_if_changed(&rt.join(glue::HEADER_PATH), glue::LIBHTMC_H)?;
    write_if_changed(&rt.join(glue::SOURCE_PATH), glue::LIBHTMC_C)
}

fn write_if_changed(path: &Path, contents: &str) -> Result<(), BuildError> {
    if std::fs::read(path).is_ok_and(|existing| existing == contents.as_bytes()) {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
    }
    tracing::debug!(path = %path.display(), "writing runtime file");
    std::fs::write(path, contents).map_err(|e| BuildError::io(path, e))
}

/// Directory containing `path`, `.` for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
