use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;
use std::time::Instant;

use clap::Parser;
use owo_colors::OwoColorize;
use prefunc_cli::Commands;
use prefunc_cli::OutputFormat;
use prefunc_cli::PrefuncCli;
use prefunc_core::AnyEmptyResult;
use prefunc_core::BuildDiagnostic;
use prefunc_core::DiagnosticKind;
use prefunc_core::PrefuncError;
use prefunc_core::config::CONFIG_FILE_CANDIDATES;
use prefunc_core::project::BuildPlan;
use prefunc_core::project::ProjectContext;
use prefunc_core::project::check_build;
use prefunc_core::project::load_project;
use prefunc_core::project::plan_build;
use prefunc_core::project::write_build;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

const SAMPLE_CONFIG: &str = r##"# prefunc configuration

# Folder holding the working directories.
data_dir = "data"

# Files with these extensions are expanded. Everything else is copied as is.
extensions = ["mcfunction", "prefunc"]

# Lines starting with this marker are directives.
marker = "#!"

# Directories under `data_dir` starting with this prefix are working directories.
working_dir_marker = "~"

# Placeholders that cannot be resolved either drop the line ("fail-line") or
# are replaced by the variable name ("literal").
missing = "fail-line"

# Remove each build directory before writing it again.
clean = true

# [exclude]
# patterns = ["*.bak", "drafts/"]
"##;

const SAMPLE_FUNCTION: &str = "#! def *mob = zombie, skeleton, creeper\n#! def id:color = 1:red, \
                               2:green\nsay <mob>\nteam modify team<id> color <color>\n";

fn main() {
	let args = PrefuncCli::parse();

	// Respect NO_COLOR env var, --no-color flag and non-terminal output.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Build { dry_run, watch }) => run_build(&args, dry_run, watch),
		Some(Commands::Check { diff, format }) => run_check(&args, diff, format),
		Some(Commands::Vars { format }) => run_vars(&args, format),
		None => {
			eprintln!("No subcommand specified. Run `prefunc --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Render core errors through miette for error codes and help text.
		match e.downcast::<PrefuncError>() {
			Ok(prefunc_err) => {
				let report: miette::Report = (*prefunc_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Diagnostics are rendered by the CLI itself, so logging stays quiet unless
/// `--verbose` or `RUST_LOG` asks for it.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "off" }));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.init();
}

fn resolve_root(args: &PrefuncCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_init(args: &PrefuncCli) -> AnyEmptyResult {
	let root = resolve_root(args);
	let existing_config = CONFIG_FILE_CANDIDATES
		.iter()
		.map(|candidate| root.join(candidate))
		.find(|path| path.is_file());

	if let Some(path) = &existing_config {
		println!("Config file already exists: {}", path.display());
	} else {
		std::fs::write(root.join("prefunc.toml"), SAMPLE_CONFIG)?;
		println!("Created prefunc.toml");
	}

	let ctx = load_project(&root)?;
	let sample_dir = ctx
		.data_root()
		.join(format!("{}example", ctx.config.working_dir_marker));
	let sample_path = sample_dir.join("hello.mcfunction");

	if sample_dir.exists() {
		println!(
			"Sample working directory already exists: {}",
			make_relative(&sample_dir, &root)
		);
		return Ok(());
	}

	std::fs::create_dir_all(&sample_dir)?;
	std::fs::write(&sample_path, SAMPLE_FUNCTION)?;
	println!("Created {}", make_relative(&sample_path, &root));

	println!();
	println!("Next steps:");
	println!(
		"  1. Edit {} or add files next to it",
		make_relative(&sample_path, &root)
	);
	println!("  2. Run `prefunc build` to expand every working directory");
	println!("  3. Run `prefunc check` in CI to verify the build output");

	Ok(())
}

fn run_build(args: &PrefuncCli, dry_run: bool, watch: bool) -> AnyEmptyResult {
	// Run the initial build.
	run_build_once(args, dry_run)?;

	if !watch || dry_run {
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let root = resolve_root(args);
	let ctx = load_project(&root)?;
	let data_root = ctx.data_root();
	let working_dir_marker = ctx.config.working_dir_marker.clone();
	let (tx, rx) = mpsc::channel();

	let watched_root = data_root.clone();
	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				// Build directories live next to working directories, so only
				// events below a working directory trigger a rebuild.
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) && event
					.paths
					.iter()
					.any(|path| is_source_path(path, &watched_root, &working_dir_marker))
				{
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&data_root, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, rebuilding...");
		if let Err(e) = run_build_once(args, false) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn is_source_path(path: &Path, data_root: &Path, working_dir_marker: &str) -> bool {
	path.strip_prefix(data_root)
		.ok()
		.and_then(|relative| relative.components().next())
		.and_then(|first| first.as_os_str().to_str())
		.is_some_and(|name| name.starts_with(working_dir_marker))
}

fn run_build_once(args: &PrefuncCli, dry_run: bool) -> AnyEmptyResult {
	let started = Instant::now();
	let root = resolve_root(args);
	let ctx = load_project(&root)?;
	let plan = plan_build(&ctx)?;

	print_diagnostics(&plan.diagnostics, &root);
	warn_if_empty(&plan, &ctx);

	if dry_run {
		println!(
			"Dry run: would write {} file(s) and copy {} file(s):",
			plan.output_count(),
			plan.copy_count()
		);
		for dir in &plan.working_dirs {
			if plan.clean && dir.dir.build.is_dir() {
				println!("  wipe {}", make_relative(&dir.dir.build, &root));
			}
			for output in &dir.outputs {
				println!("  write {}", make_relative(&output.path, &root));
			}
			for copy in &dir.copies {
				println!("  copy {}", make_relative(&copy.destination, &root));
			}
		}
		return Ok(());
	}

	let report = write_build(&plan);
	for wiped in &report.wiped {
		println!("Wiped directory: {}", make_relative(wiped, &root));
	}
	print_diagnostics(&report.failures, &root);

	println!(
		"Wrote {} file(s) and copied {} file(s) in {} working director{}.",
		report.written.len(),
		report.copied.len(),
		plan.working_dirs.len(),
		if plan.working_dirs.len() == 1 { "y" } else { "ies" }
	);

	if args.verbose {
		for path in report.written.iter().chain(&report.copied) {
			println!("  {}", make_relative(path, &root));
		}
	}

	if !report.is_ok() {
		return Err(format!("{} file(s) could not be written", report.failures.len()).into());
	}

	println!("Build finished in {} ms.", started.elapsed().as_millis());

	Ok(())
}

fn warn_if_empty(plan: &BuildPlan, ctx: &ProjectContext) {
	if plan.working_dirs.is_empty() {
		eprintln!(
			"{} no working directories found in {}. Create a directory starting with `{}`.",
			colored!("warning:", yellow),
			ctx.config.data_dir.display(),
			ctx.config.working_dir_marker
		);
	}
}

fn run_check(args: &PrefuncCli, show_diff: bool, format: OutputFormat) -> AnyEmptyResult {
	let root = resolve_root(args);
	let ctx = load_project(&root)?;
	let plan = plan_build(&ctx)?;
	let result = check_build(&plan);

	if format == OutputFormat::Json {
		let stale: Vec<serde_json::Value> = result
			.stale
			.iter()
			.map(|entry| {
				serde_json::json!({
					"source": make_relative(&entry.source, &root),
					"path": make_relative(&entry.path, &root),
					"missing": entry.current.is_none(),
				})
			})
			.collect();
		let stale_copies: Vec<serde_json::Value> = result
			.stale_copies
			.iter()
			.map(|copy| {
				serde_json::json!({
					"source": make_relative(&copy.source, &root),
					"path": make_relative(&copy.destination, &root),
				})
			})
			.collect();
		let diagnostics = plan
			.diagnostics
			.iter()
			.map(|diag| diagnostic_to_json(diag, &root))
			.collect::<Result<Vec<_>, _>>()?;
		let output = serde_json::json!({
			"ok": result.is_ok(),
			"stale": stale,
			"stale_copies": stale_copies,
			"diagnostics": diagnostics,
		});
		println!("{output}");
	} else {
		print_diagnostics(&plan.diagnostics, &root);
		warn_if_empty(&plan, &ctx);

		if result.is_ok() {
			println!("Check passed: all build files are up to date.");
			return Ok(());
		}

		eprintln!("Check failed.");
		for entry in &result.stale {
			let rel = make_relative(&entry.path, &root);
			let state = if entry.current.is_none() {
				"missing"
			} else {
				"out of date"
			};
			eprintln!("  {rel} ({state})");

			if show_diff {
				print_diff(entry.current.as_deref().unwrap_or_default(), &entry.expected);
			}
		}
		for copy in &result.stale_copies {
			eprintln!(
				"  {} (copy out of date)",
				make_relative(&copy.destination, &root)
			);
		}

		eprintln!();
		eprintln!(
			"{} file(s) are out of date. Run `prefunc build` to fix.",
			result.stale.len() + result.stale_copies.len()
		);
	}

	if !result.is_ok() {
		process::exit(1);
	}

	Ok(())
}

fn run_vars(args: &PrefuncCli, format: OutputFormat) -> AnyEmptyResult {
	let root = resolve_root(args);
	let ctx = load_project(&root)?;
	let plan = plan_build(&ctx)?;

	if format == OutputFormat::Json {
		let dirs: Vec<serde_json::Value> = plan
			.working_dirs
			.iter()
			.map(|dir| {
				serde_json::json!({
					"name": dir.dir.name,
					"source": make_relative(&dir.dir.source, &root),
					"build": make_relative(&dir.dir.build, &root),
					"variables": dir.globals,
				})
			})
			.collect();
		println!("{}", serde_json::Value::Array(dirs));
		return Ok(());
	}

	warn_if_empty(&plan, &ctx);

	for dir in &plan.working_dirs {
		println!("{}", colored!(make_relative(&dir.dir.source, &root), bold));
		if dir.globals.is_empty() {
			println!("  (no global variables)");
		}
		for variable in dir.globals.values() {
			println!(
				"  {} ({}) = {}",
				variable.name,
				variable.cardinality(),
				variable.values.join(", ")
			);
		}
	}

	Ok(())
}

fn print_diagnostics(diagnostics: &[BuildDiagnostic], root: &Path) {
	for diag in diagnostics {
		let rel = make_relative(&diag.file, root);
		let report = diagnostic_to_report(diag, &rel);
		eprintln!("{report:?}");
	}
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
		if change.missing_newline() {
			eprintln!();
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

fn diagnostic_location(diag: &BuildDiagnostic, rel_path: &str) -> String {
	if diag.line == 0 {
		rel_path.to_string()
	} else {
		format!("{rel_path}:{}", diag.line)
	}
}

fn diagnostic_to_json(
	diag: &BuildDiagnostic,
	root: &Path,
) -> Result<serde_json::Value, serde_json::Error> {
	Ok(serde_json::json!({
		"file": make_relative(&diag.file, root),
		"line": diag.line,
		"error": diag.is_error(),
		"message": diag.message(),
		"detail": serde_json::to_value(&diag.kind)?,
	}))
}

/// Convert a `BuildDiagnostic` into a `miette::Report` with severity, error
/// code and help text for terminal display.
fn diagnostic_to_report(diag: &BuildDiagnostic, rel_path: &str) -> miette::Report {
	let location = diagnostic_location(diag, rel_path);
	let severity = if diag.is_error() {
		miette::Severity::Error
	} else {
		miette::Severity::Warning
	};

	let message = format!("[{location}] {}", diag.message());
	let help: String = match &diag.kind {
		DiagnosticKind::InvalidDeclaration { .. } => {
			"declarations look like `#! def name = a, b` or `#! def *x:y = 1:a, 2:b`; the \
			 declaration was skipped"
				.to_string()
		}
		DiagnosticKind::UndefinedVariable { name } => {
			format!(
				"declare it with `#! def {name} = ...` in this file or `#! def *{name} = ...` \
				 anywhere in the working directory"
			)
		}
		DiagnosticKind::MissingValue { name, .. } => {
			format!(
				"give `{name}` as many values as the line's first variable, or set `missing = \
				 \"literal\"` in prefunc.toml"
			)
		}
		DiagnosticKind::Io { .. } => {
			"check that the path exists, is readable UTF-8 text and that you have permission to \
			 write the build directory"
				.to_string()
		}
		DiagnosticKind::BuildDirConflict { .. } => {
			"rename the working directory so that its name starts with the marker only once"
				.to_string()
		}
		_ => "run with `--verbose` for more details".to_string(),
	};
	let code = match &diag.kind {
		DiagnosticKind::InvalidDeclaration { .. } => "prefunc::invalid_declaration",
		DiagnosticKind::UndefinedVariable { .. } => "prefunc::undefined_variable",
		DiagnosticKind::MissingValue { .. } => "prefunc::missing_value",
		DiagnosticKind::Io { .. } => "prefunc::io_error",
		DiagnosticKind::BuildDirConflict { .. } => "prefunc::build_dir_conflict",
		_ => "prefunc::diagnostic",
	};

	let diag_value = miette::MietteDiagnostic::new(message)
		.with_code(code)
		.with_help(help)
		.with_severity(severity);
	miette::Report::new(diag_value)
}
