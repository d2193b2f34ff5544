//! Command-line parsing and fixed CLI text.
//!
//! Arguments are a mix of optional flags, at most one command, and at most
//! one input file:
//!
//! ```text
//! htmc [-ns] [-o <path>] [-ll <level>] [<command>] [<input>]
//! ```
//!
//! With no command, `htmc` runs in CGI mode.

use std::path::{Path, PathBuf};

use crate::logging::{LogLevel, UnknownLogLevel};

/// Mutually exclusive commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    License,
    Version,
    Translate,
    Compile,
    Build,
    LoadShared,
    Run,
}

/// `(short, long, command)` spellings.
const COMMANDS: &[(&str, &str, Command)] = &[
    ("-h", "--help", Command::Help),
    ("-l", "--license", Command::License),
    ("-v", "--version", Command::Version),
    ("-t", "--translate", Command::Translate),
    ("-c", "--compile", Command::Compile),
    ("-b", "--build", Command::Build),
    ("-s", "--load-shared", Command::LoadShared),
    ("-r", "--run", Command::Run),
];

impl Command {
    fn from_flag(arg: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(short, long, _)| arg == *short || arg == *long)
            .map(|(_, _, command)| *command)
    }

    /// Long spelling, for diagnostics.
    pub fn flag(self) -> &'static str {
        COMMANDS
            .iter()
            .find(|(_, _, command)| *command == self)
            .map_or("", |(_, long, _)| *long)
    }

    /// Returns `true` if the command operates on an input file.
    pub fn needs_input(self) -> bool {
        matches!(
            self,
            Self::Translate | Self::Compile | Self::Build | Self::LoadShared | Self::Run
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CliError {
    #[error("more than one mutually exclusive option specified ({first} and {second})")]
    ConflictingCommands {
        first: &'static str,
        second: &'static str,
    },

    #[error("multiple {0} flags are not supported")]
    RepeatedOption(&'static str),

    #[error("expected value after {0}")]
    MissingValue(&'static str),

    #[error(transparent)]
    BadLogLevel(#[from] UnknownLogLevel),

    #[error("too many input files")]
    TooManyInputs,
}

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub command: Option<Command>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub no_splash: bool,
}

impl Options {
    /// Parse arguments, not including the program name.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-ns" | "--no-splash" => options.no_splash = true,
                "-o" | "--output-path" => {
                    if options.output.is_some() {
                        return Err(CliError::RepeatedOption("output"));
                    }
                    let value = args.next().ok_or(CliError::MissingValue("output flag"))?;
                    options.output = Some(PathBuf::from(value));
                }
                "-ll" | "--log-level" => {
                    if options.log_level.is_some() {
                        return Err(CliError::RepeatedOption("log level"));
                    }
                    let value = args.next().ok_or(CliError::MissingValue("log level flag"))?;
                    options.log_level = Some(value.parse()?);
                }
                other => {
                    if let Some(command) = Command::from_flag(other) {
                        if let Some(first) = options.command {
                            return Err(CliError::ConflictingCommands {
                                first: first.flag(),
                                second: command.flag(),
                            });
                        }
                        options.command = Some(command);
                    } else if options.input.is_some() {
                        return Err(CliError::TooManyInputs);
                    } else {
                        options.input = Some(PathBuf::from(other));
                    }
                }
            }
        }

        Ok(options)
    }

    /// `-o` if given, else the command's default output for `input`.
    pub fn output_for(&self, input: &Path) -> Option<PathBuf> {
        self.output
            .clone()
            .or_else(|| self.command.and_then(|command| default_output(command, input)))
    }
}

/// Default output path of a command: `.c` for translate, `.so` for compile
/// and build. Other commands write no file.
pub fn default_output(command: Command, input: &Path) -> Option<PathBuf> {
    match command {
        Command::Translate => Some(input.with_extension("c")),
        Command::Compile | Command::Build => Some(input.with_extension("so")),
        _ => None,
    }
}

// ── Text ────────────────────────────────────────────────────────────────

pub const HELP: &str = "\
Usage: htmc [<flag(s)>] [<option>] [<argument(s)>]

Optional flags:
    -ns, --no-splash                                  Disable the program info splash text
    -o,  --output-path {<file>|<path>}                Set the output file or directory
    -ll, --log-level  {all|info|warning|error|off}    Set the log level

Mutually exclusive options:
    -h, --help           Display this message
    -l, --license        Display the MIT license
    -v, --version        Display the htmc version string
    -t, --translate      Translate an htmc source file into a C source file
    -c, --compile        Compile a C source file into an htmc shared object
    -b, --build          Build a shared object from an htmc source file
    -s, --load-shared    Load and run an htmc shared object
    -r, --run            Build and run an htmc source file

Environment variables:
    QUERY_STRING       Query parameters (CGI and CLI mode)
    REQUEST_METHOD     HTTP method (CGI and CLI mode)
    CONTENT_LENGTH     Length of the request body (CGI and CLI mode)
    CONTENT_TYPE       HTTP type of the request body (CGI and CLI mode)
    REQUEST_BODY       Contents of the request body (CLI mode)
    PATH_TRANSLATED    Path of the target file (CGI mode)
    PATH_INFO          Fallback for PATH_TRANSLATED (CGI mode)
    HTMC_CC, CC        C compiler used to build shared objects
    HTMC_CFLAGS        Extra flags passed to the C compiler
    RUST_LOG           Log filter, overrides --log-level

Example: translate `test.htmc` to `pagegen.c` without printing the splash text
    $ htmc -ns -t test.htmc -o pagegen.c

If no option is specified, the program will launch in CGI mode.
This allows other programs to call htmc for on-demand execution.
";

pub const LICENSE: &str = "\
MIT License

Copyright (c) 2024 Alessandro Salerno

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
";

pub fn version_line() -> String {
    format!("htmc version {}", env!("CARGO_PKG_VERSION"))
}

pub fn splash() -> String {
    format!(
        "{}\nCopyright (c) 2024 Alessandro Salerno\n\
         This software is under MIT license. Use -l option for more information.\n",
        version_line()
    )
}
