//! scent CLI binary entry point.
//!
//! ## Usage
//!
//! ```bash
//! # Index two packages into SCENTTAGS, skipping test directories
//! scent index src/pkg_a src/pkg_b -x tests
//!
//! # Update an existing tags file in place
//! scent index src/pkg_a -i SCENTTAGS -o SCENTTAGS
//!
//! # Complete at a cursor position using the nearest tags file
//! scent query --at src/pkg_a/mod.py:14:8
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use pyscent::cli::{run_index, run_query};
use pyscent::error::ScentResult;

// ============================================================================
// CLI Structure
// ============================================================================

/// Static-analysis autocompletion for Python sources.
///
/// Scent indexes Python packages into a tags file and answers completion
/// queries against it, without importing any of the analyzed code.
#[derive(Parser, Debug)]
#[command(name = "scent", version, about = "Static-analysis autocompletion for Python sources")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze packages recursively and write a tags file.
    Index {
        /// Packages or single files to analyze.
        #[arg(required = true)]
        packages: Vec<PathBuf>,

        /// Directory name to skip while walking (repeatable).
        #[arg(short = 'x', long = "exclude", value_name = "NAME")]
        exclude: Vec<String>,

        /// File to write the tags to.
        #[arg(short, long, default_value = "SCENTTAGS")]
        output: PathBuf,

        /// Preexisting tags file to update.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print elapsed time when done.
        #[arg(short, long)]
        timing: bool,
    },
    /// Complete at a cursor position and print candidates as JSON.
    Query {
        /// Cursor position as path:line:col (1-based line, 0-based column).
        #[arg(long)]
        at: String,

        /// Explicit tags file (default: discovered upward from the file).
        #[arg(long)]
        tags: Option<PathBuf>,

        /// Matching strategy for the typed base.
        #[arg(long, default_value = "case-insensitive")]
        matcher: String,

        /// Do not fold the file's current contents into the index first.
        #[arg(long)]
        no_update: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scent: {err}");
            ExitCode::from(err.error_code().code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> ScentResult<()> {
    match cli.command {
        Command::Index {
            packages,
            exclude,
            output,
            input,
            timing,
        } => run_index(&packages, &exclude, &output, input.as_deref(), timing),
        Command::Query {
            at,
            tags,
            matcher,
            no_update,
        } => {
            let json = run_query(&at, tags.as_deref(), &matcher, !no_update)?;
            println!("{json}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn index_defaults_to_scenttags_output() {
            let cli = Cli::try_parse_from(["scent", "index", "src/pkg"]).unwrap();
            match cli.command {
                Command::Index {
                    packages,
                    exclude,
                    output,
                    input,
                    timing,
                } => {
                    assert_eq!(packages, vec![PathBuf::from("src/pkg")]);
                    assert!(exclude.is_empty());
                    assert_eq!(output, PathBuf::from("SCENTTAGS"));
                    assert!(input.is_none());
                    assert!(!timing);
                }
                _ => panic!("expected Index"),
            }
        }

        #[test]
        fn index_requires_at_least_one_package() {
            assert!(Cli::try_parse_from(["scent", "index"]).is_err());
        }

        #[test]
        fn exclusions_accumulate_across_flags() {
            let cli = Cli::try_parse_from([
                "scent", "index", "pkg", "-x", "tests", "-x", ".svn", "-o", "TAGS", "-t",
            ])
            .unwrap();
            match cli.command {
                Command::Index {
                    exclude,
                    output,
                    timing,
                    ..
                } => {
                    assert_eq!(exclude, vec!["tests", ".svn"]);
                    assert_eq!(output, PathBuf::from("TAGS"));
                    assert!(timing);
                }
                _ => panic!("expected Index"),
            }
        }

        #[test]
        fn query_defaults_to_updating_from_the_buffer() {
            let cli =
                Cli::try_parse_from(["scent", "query", "--at", "src/mod.py:3:10"]).unwrap();
            match cli.command {
                Command::Query {
                    at,
                    tags,
                    matcher,
                    no_update,
                } => {
                    assert_eq!(at, "src/mod.py:3:10");
                    assert!(tags.is_none());
                    assert_eq!(matcher, "case-insensitive");
                    assert!(!no_update);
                }
                _ => panic!("expected Query"),
            }
        }

        #[test]
        fn query_requires_a_location() {
            assert!(Cli::try_parse_from(["scent", "query"]).is_err());
        }
    }
}
