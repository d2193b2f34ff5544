//! htmc command-line driver.
//!
//! With a command, works on one input file. Without one, serves a single
//! CGI request.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use htmc_rt::{DebugBackend, RequestContext};
use htmcc::cli::{self, Command, Options};
use htmcc::logging::{self, LogLevel};
use htmcc::pipeline::{self, PipelineError};
use htmcc::{cgi, CcDriver};

fn main() -> ExitCode {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("Use -h for usage information.");
            return ExitCode::FAILURE;
        }
    };

    // In CGI mode stdout is the response, so stay quiet by default.
    let cgi_mode = options.command.is_none();
    let default_level = if cgi_mode { LogLevel::Error } else { LogLevel::Info };
    logging::init(options.log_level.unwrap_or(default_level));

    if !options.no_splash && !cgi_mode {
        eprintln!("{}", cli::splash());
    }

    match dispatch(&options) {
        Ok(status) => exit_code(status),
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(options: &Options) -> Result<i32, PipelineError> {
    let driver = CcDriver::from_env();

    let Some(command) = options.command else {
        return cgi::serve(&driver, options.output.as_deref());
    };

    match command {
        Command::Help => print!("{}", cli::HELP),
        Command::License => print!("{}", cli::LICENSE),
        Command::Version => println!("{}", cli::version_line()),
        Command::Translate => {
            let (input, output) = input_output(options)?;
            let stats = pipeline::translate_file(input, &output)?;
            tracing::info!(
                output = %output.display(),
                code_spans = stats.code_spans,
                "translated"
            );
        }
        Command::Compile => {
            let (input, output) = input_output(options)?;
            pipeline::compile_file(&driver, input, &output)?;
            tracing::info!(output = %output.display(), "compiled");
        }
        Command::Build => {
            let (input, output) = input_output(options)?;
            pipeline::build_file(&driver, input, &output)?;
            tracing::info!(output = %output.display(), "built");
        }
        Command::LoadShared => {
            let input = input(options)?;
            let (status, _) =
                pipeline::run_shared(input, DebugBackend::new(), RequestContext::from_env())?;
            return Ok(status);
        }
        Command::Run => {
            let input = input(options)?;
            return run(&driver, input, options.output.as_deref());
        }
    }

    Ok(0)
}

fn run(driver: &CcDriver, input: &Path, build_dir: Option<&Path>) -> Result<i32, PipelineError> {
    let context = RequestContext::from_env();
    if let Some(dir) = build_dir {
        std::fs::create_dir_all(dir).map_err(|e| PipelineError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let (status, _) = pipeline::build_and_run(driver, input, dir, DebugBackend::new(), context)?;
        return Ok(status);
    }

    let scratch = tempfile::tempdir().map_err(|e| PipelineError::Io {
        path: std::env::temp_dir(),
        source: e,
    })?;
    let (status, _) =
        pipeline::build_and_run(driver, input, scratch.path(), DebugBackend::new(), context)?;
    Ok(status)
}

fn input(options: &Options) -> Result<&Path, PipelineError> {
    options.input.as_deref().ok_or(PipelineError::MissingInput)
}

fn input_output(options: &Options) -> Result<(&Path, PathBuf), PipelineError> {
    let input = input(options)?;
    let output = options
        .output_for(input)
        .ok_or(PipelineError::MissingInput)?;
    Ok((input, output))
}

/// Process exit code for an entry point status, truncated like a C `exit`.
fn exit_code(status: i32) -> ExitCode {
    ExitCode::from(u8::try_from(status & 0xff).unwrap_or(u8::MAX))
}
