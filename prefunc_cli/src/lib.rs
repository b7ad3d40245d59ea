use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Unroll templated lines across working directories into plain output files.",
	long_about = "prefunc is a line-oriented preprocessor for datapack style projects.\n\nEvery \
	              directory under `data/` whose name starts with `~` is a working directory. Its \
	              files may declare variables with `#! def` directives and reference them as \
	              `<name>`; each templated line is unrolled once per value. The result is \
	              written to the same directory without the `~`.\n\nQuick start:\n  prefunc \
	              init    Create a config file and a sample working directory\n  prefunc build   \
	              Expand every working directory\n  prefunc check   Verify the build output is \
	              up to date\n  prefunc vars    Show the global variables of each working \
	              directory"
)]
pub struct PrefuncCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output. Sets the log level to `debug` unless `RUST_LOG`
	/// is set.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize prefunc in a project.
	///
	/// Creates `prefunc.toml` with the default settings and a sample working
	/// directory at `data/~example`. Existing files are left untouched.
	Init,
	/// Expand every working directory into its build directory.
	///
	/// Global declarations (`#! def *name = ...`) are collected from every
	/// file of a working directory first, then each file is expanded and
	/// written next to the working directory without the `~` prefix. Files
	/// with other extensions are copied through unchanged.
	Build {
		/// Print what would be written without touching the disk.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Watch for file changes and rebuild automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Check that the build directories are up to date.
	///
	/// Expands every working directory in memory and compares the result
	/// with the files on disk. Exits with status 1 if anything is stale.
	Check {
		/// Show a unified diff for each stale file.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for check results.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List the global variables of every working directory.
	Vars {
		/// Output format for the variable listing.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
