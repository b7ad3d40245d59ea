use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::PrefuncError;
use crate::PrefuncResult;
use crate::config::PrefuncConfig;
use crate::diagnostics::BuildDiagnostic;
use crate::diagnostics::DiagnosticKind;
use crate::engine::ExpandOptions;
use crate::engine::build_globals;
use crate::engine::render_file;
use crate::scope::VariableScope;

/// A project root together with its loaded configuration.
#[derive(Debug, Clone)]
pub struct ProjectContext {
	/// The directory holding `prefunc.toml` (or the directory the build was
	/// started from when there is no config file).
	pub root: PathBuf,
	pub config: PrefuncConfig,
}

impl ProjectContext {
	pub fn new(root: impl Into<PathBuf>, config: PrefuncConfig) -> Self {
		Self {
			root: root.into(),
			config,
		}
	}

	/// Absolute path of the folder holding the working directories.
	pub fn data_root(&self) -> PathBuf {
		self.root.join(&self.config.data_dir)
	}

	pub fn expand_options(&self) -> ExpandOptions {
		ExpandOptions {
			marker: self.config.marker.clone(),
			missing: self.config.missing,
		}
	}
}

/// Load the project config at `root`, falling back to defaults.
pub fn load_project(root: &Path) -> PrefuncResult<ProjectContext> {
	let config = PrefuncConfig::load_or_default(root)?;
	Ok(ProjectContext::new(root, config))
}

/// A working directory and the build directory it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkingDir {
	/// Directory name without the working directory marker.
	pub name: String,
	/// The `~name` directory holding the sources.
	pub source: PathBuf,
	/// The `name` directory receiving the output.
	pub build: PathBuf,
}

/// An expanded file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
	pub source: PathBuf,
	pub path: PathBuf,
	pub content: String,
}

/// A file outside the extension allow-list, copied as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
	pub source: PathBuf,
	pub destination: PathBuf,
}

/// Everything computed for one working directory.
#[derive(Debug, Clone)]
pub struct WorkingDirPlan {
	pub dir: WorkingDir,
	/// The directory's global scope, applied in sorted file order.
	pub globals: VariableScope,
	pub outputs: Vec<OutputFile>,
	pub copies: Vec<CopyEntry>,
}

/// The in-memory result of building a project. Nothing has been written yet;
/// see [`write_build`] and [`check_build`].
#[derive(Debug, Clone)]
pub struct BuildPlan {
	pub working_dirs: Vec<WorkingDirPlan>,
	pub diagnostics: Vec<BuildDiagnostic>,
	/// Whether build directories are wiped before writing.
	pub clean: bool,
}

impl BuildPlan {
	pub fn outputs(&self) -> impl Iterator<Item = &OutputFile> {
		self.working_dirs.iter().flat_map(|dir| dir.outputs.iter())
	}

	pub fn copies(&self) -> impl Iterator<Item = &CopyEntry> {
		self.working_dirs.iter().flat_map(|dir| dir.copies.iter())
	}

	pub fn output_count(&self) -> usize {
		self.working_dirs.iter().map(|dir| dir.outputs.len()).sum()
	}

	pub fn copy_count(&self) -> usize {
		self.working_dirs.iter().map(|dir| dir.copies.len()).sum()
	}

	pub fn has_errors(&self) -> bool {
		self.diagnostics.iter().any(BuildDiagnostic::is_error)
	}

	/// Find the planned output produced from `source`.
	pub fn output_for(&self, source: &Path) -> Option<&OutputFile> {
		self.outputs().find(|output| output.source == source)
	}
}

/// List the working directories directly under `data_root`, sorted by name.
pub fn find_working_dirs(data_root: &Path, marker: &str) -> PrefuncResult<Vec<WorkingDir>> {
	if !data_root.is_dir() {
		return Err(PrefuncError::MissingDataDir {
			path: data_root.display().to_string(),
		});
	}

	let mut dirs = Vec::new();
	for entry in std::fs::read_dir(data_root)? {
		let path = entry?.path();
		if !path.is_dir() {
			continue;
		}

		let Some(name) = path
			.file_name()
			.and_then(|name| name.to_str())
			.and_then(|name| name.strip_prefix(marker))
		else {
			continue;
		};

		if name.is_empty() {
			continue;
		}

		dirs.push(WorkingDir {
			name: name.to_string(),
			build: data_root.join(name),
			source: path.clone(),
		});
	}

	dirs.sort_by(|a, b| a.source.cmp(&b.source));
	Ok(dirs)
}

/// Compute the output path of `file`: its path below `data_root` with the
/// working directory marker removed from the start of every segment.
pub fn output_path(data_root: &Path, file: &Path, marker: &str) -> PathBuf {
	let Ok(relative) = file.strip_prefix(data_root) else {
		return file.to_path_buf();
	};

	let mut output = data_root.to_path_buf();
	for component in relative.components() {
		match component {
			Component::Normal(segment) => {
				match segment.to_str().and_then(|s| s.strip_prefix(marker)) {
					Some(stripped) if !stripped.is_empty() => output.push(stripped),
					_ => output.push(segment),
				}
			}
			other => output.push(other.as_os_str()),
		}
	}

	output
}

/// Build every working directory of the project in memory.
pub fn plan_build(ctx: &ProjectContext) -> PrefuncResult<BuildPlan> {
	let data_root = ctx.data_root();
	let working_dirs = find_working_dirs(&data_root, &ctx.config.working_dir_marker)?;
	let exclude = build_exclude_matcher(&ctx.root, &ctx.config.exclude.patterns)?;

	if working_dirs.is_empty() {
		tracing::warn!(
			data_root = %data_root.display(),
			"no working directories found; create a directory starting with `{}`",
			ctx.config.working_dir_marker
		);
	}

	let mut plans = Vec::with_capacity(working_dirs.len());
	let mut diagnostics = Vec::new();

	for dir in working_dirs {
		if let Some(diagnostic) = build_dir_conflict(&dir, &ctx.config.working_dir_marker) {
			diagnostic.log();
			diagnostics.push(diagnostic);
			continue;
		}

		// A working directory that cannot be walked is reported and skipped so
		// its build directory is left alone.
		let files = match collect_files(&dir.source, &exclude) {
			Ok(files) => files,
			Err(error) => {
				let diagnostic = BuildDiagnostic::new(
					&dir.source,
					0,
					DiagnosticKind::Io {
						message: error.to_string(),
					},
				);
				diagnostic.log();
				diagnostics.push(diagnostic);
				continue;
			}
		};

		let (plan, dir_diagnostics) = plan_working_dir(ctx, dir, &files);
		plans.push(plan);
		diagnostics.extend(dir_diagnostics);
	}

	Ok(BuildPlan {
		working_dirs: plans,
		diagnostics,
		clean: ctx.config.clean,
	})
}

/// A working directory named with the marker twice, e.g. `~~a`, would build
/// into `~a`, which is itself a working directory. Wiping it would delete
/// sources, so such directories are refused.
fn build_dir_conflict(dir: &WorkingDir, marker: &str) -> Option<BuildDiagnostic> {
	if !dir.name.starts_with(marker) {
		return None;
	}

	Some(BuildDiagnostic::new(
		&dir.source,
		0,
		DiagnosticKind::BuildDirConflict {
			build: dir.build.display().to_string(),
		},
	))
}

/// Run both passes over one working directory. `files` must be sorted; the
/// output follows the same order. A file that cannot be read is reported and
/// left out without affecting its siblings.
pub fn plan_working_dir(
	ctx: &ProjectContext,
	dir: WorkingDir,
	files: &[PathBuf],
) -> (WorkingDirPlan, Vec<BuildDiagnostic>) {
	let data_root = ctx.data_root();
	let marker = &ctx.config.working_dir_marker;
	let options = ctx.expand_options();
	let mut diagnostics = Vec::new();
	let mut copies = Vec::new();
	let mut sources = Vec::new();

	tracing::info!(dir = %dir.source.display(), files = files.len(), "building working directory");

	for file in files {
		if !ctx.config.is_eligible(file) {
			copies.push(CopyEntry {
				source: file.clone(),
				destination: output_path(&data_root, file, marker),
			});
			continue;
		}

		match std::fs::read_to_string(file) {
			Ok(content) => sources.push((file.clone(), content)),
			Err(error) => {
				let diagnostic = BuildDiagnostic::io(file, &error);
				diagnostic.log();
				diagnostics.push(diagnostic);
			}
		}
	}

	let (globals, global_diagnostics) = build_globals(
		sources
			.iter()
			.map(|(path, content)| (path.as_path(), content.as_str())),
		&options.marker,
	);
	diagnostics.extend(global_diagnostics);
	tracing::debug!(count = globals.len(), "collected global variables");

	let mut outputs = Vec::with_capacity(sources.len());
	for (file, content) in sources {
		tracing::debug!(file = %file.display(), "expanding");
		let (rendered, file_diagnostics) = render_file(&content, &file, &globals, &options);
		diagnostics.extend(file_diagnostics);
		outputs.push(OutputFile {
			path: output_path(&data_root, &file, marker),
			source: file,
			content: rendered,
		});
	}

	let plan = WorkingDirPlan {
		dir,
		globals,
		outputs,
		copies,
	};

	(plan, diagnostics)
}

/// The outcome of writing a build plan to disk.
#[derive(Debug, Default)]
pub struct WriteReport {
	/// Build directories removed before writing.
	pub wiped: Vec<PathBuf>,
	/// Expanded files written.
	pub written: Vec<PathBuf>,
	/// Files copied through unchanged.
	pub copied: Vec<PathBuf>,
	/// Files that could not be written or copied.
	pub failures: Vec<BuildDiagnostic>,
}

impl WriteReport {
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Write a build plan to disk. Parent directories are created as needed.
/// A failure on one file is recorded and the remaining files are still
/// written.
pub fn write_build(plan: &BuildPlan) -> WriteReport {
	let mut report = WriteReport::default();

	for dir in &plan.working_dirs {
		if plan.clean && dir.dir.build.is_dir() {
			match std::fs::remove_dir_all(&dir.dir.build) {
				Ok(()) => {
					tracing::info!(dir = %dir.dir.build.display(), "wiped build directory");
					report.wiped.push(dir.dir.build.clone());
				}
				Err(error) => {
					let diagnostic = BuildDiagnostic::io(&dir.dir.build, &error);
					diagnostic.log();
					report.failures.push(diagnostic);
				}
			}
		}

		for output in &dir.outputs {
			match write_file(&output.path, &output.content) {
				Ok(()) => report.written.push(output.path.clone()),
				Err(error) => {
					let diagnostic = BuildDiagnostic::io(&output.path, &error);
					diagnostic.log();
					report.failures.push(diagnostic);
				}
			}
		}

		for copy in &dir.copies {
			match copy_file(&copy.source, &copy.destination) {
				Ok(()) => report.copied.push(copy.destination.clone()),
				Err(error) => {
					let diagnostic = BuildDiagnostic::io(&copy.source, &error);
					diagnostic.log();
					report.failures.push(diagnostic);
				}
			}
		}
	}

	report
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

fn copy_file(source: &Path, destination: &Path) -> std::io::Result<()> {
	if let Some(parent) = destination.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::copy(source, destination).map(|_| ())
}

/// A planned output that differs from what is on disk.
#[derive(Debug, Clone)]
pub struct StaleOutput {
	pub source: PathBuf,
	pub path: PathBuf,
	/// Current file content, or `None` when the file does not exist.
	pub current: Option<String>,
	pub expected: String,
}

/// Result of comparing a build plan against the build directories.
#[derive(Debug, Default)]
pub struct CheckResult {
	pub stale: Vec<StaleOutput>,
	/// Copied files whose destination is missing or differs.
	pub stale_copies: Vec<CopyEntry>,
}

impl CheckResult {
	/// Returns true if every output is up to date.
	pub fn is_ok(&self) -> bool {
		self.stale.is_empty() && self.stale_copies.is_empty()
	}
}

/// Compare the planned outputs with the files currently on disk.
pub fn check_build(plan: &BuildPlan) -> CheckResult {
	let mut result = CheckResult::default();

	for output in plan.outputs() {
		let current = std::fs::read_to_string(&output.path).ok();
		if current.as_deref() != Some(output.content.as_str()) {
			result.stale.push(StaleOutput {
				source: output.source.clone(),
				path: output.path.clone(),
				current,
				expected: output.content.clone(),
			});
		}
	}

	for copy in plan.copies() {
		let same = match (std::fs::read(&copy.source), std::fs::read(&copy.destination)) {
			(Ok(source), Ok(destination)) => source == destination,
			_ => false,
		};
		if !same {
			result.stale_copies.push(copy.clone());
		}
	}

	result
}

/// Build a `Gitignore` matcher from the `[exclude]` patterns in
/// `prefunc.toml`.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> PrefuncResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			PrefuncError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| PrefuncError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Collect every file below `dir`, sorted by path. Hidden entries and paths
/// matched by `exclude` are skipped. A symlink pointing back at one of its
/// own ancestors is a cycle; several links to the same directory are not.
pub fn collect_files(dir: &Path, exclude: &Gitignore) -> PrefuncResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut ancestors = Vec::new();

	walk_dir(dir, &mut files, exclude, &mut ancestors)?;
	// Sort for deterministic ordering.
	files.sort();
	Ok(files)
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	exclude: &Gitignore,
	ancestors: &mut Vec<PathBuf>,
) -> PrefuncResult<()> {
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if ancestors.contains(&canonical) {
		return Err(PrefuncError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}
	ancestors.push(canonical);

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		if path
			.file_name()
			.and_then(|n| n.to_str())
			.is_some_and(|name| name.starts_with('.'))
		{
			continue;
		}

		let is_dir = path.is_dir();
		if exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(&path, files, exclude, ancestors)?;
		} else {
			files.push(path);
		}
	}

	ancestors.pop();
	Ok(())
}
