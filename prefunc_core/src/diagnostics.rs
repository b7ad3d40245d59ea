use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

/// The kind of problem found while building a working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum DiagnosticKind {
	/// A `def` directive could not be decoded. The declaration is skipped and
	/// the rest of the file is still processed.
	InvalidDeclaration { reason: String },
	/// A placeholder names a variable that exists in neither the local nor
	/// the global scope. The templated line produces no output.
	UndefinedVariable { name: String },
	/// A placeholder variable has fewer values than the line's cardinality
	/// variable. The templated line produces no output.
	MissingValue {
		name: String,
		index: usize,
		cardinality: usize,
	},
	/// Reading, writing or copying the file failed. Nothing is emitted for it.
	Io { message: String },
	/// The working directory would build into another working directory. It
	/// is skipped entirely.
	BuildDirConflict { build: String },
}

/// A diagnostic tied to a file and line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDiagnostic {
	pub file: PathBuf,
	/// 1-indexed line number, or `0` when the diagnostic concerns the whole
	/// file.
	pub line: usize,
	#[serde(flatten)]
	pub kind: DiagnosticKind,
}

impl BuildDiagnostic {
	pub fn new(file: impl Into<PathBuf>, line: usize, kind: DiagnosticKind) -> Self {
		Self {
			file: file.into(),
			line,
			kind,
		}
	}

	pub fn io(file: &Path, error: &std::io::Error) -> Self {
		Self::new(
			file,
			0,
			DiagnosticKind::Io {
				message: error.to_string(),
			},
		)
	}

	/// Invalid declarations are recoverable. Everything else drops output.
	pub fn is_error(&self) -> bool {
		!matches!(self.kind, DiagnosticKind::InvalidDeclaration { .. })
	}

	/// Human-readable message for this diagnostic.
	pub fn message(&self) -> String {
		match &self.kind {
			DiagnosticKind::InvalidDeclaration { reason } => {
				format!("invalid variable declaration: {reason}")
			}
			DiagnosticKind::UndefinedVariable { name } => {
				format!("variable `{name}` is not defined")
			}
			DiagnosticKind::MissingValue {
				name,
				index,
				cardinality,
			} => {
				format!(
					"variable `{name}` has no value at index {index} (line unrolls into \
					 {cardinality} lines)"
				)
			}
			DiagnosticKind::Io { message } => format!("i/o failure: {message}"),
			DiagnosticKind::BuildDirConflict { build } => {
				format!("build directory `{build}` would be a working directory itself")
			}
		}
	}

	/// Emit the diagnostic through `tracing`.
	pub(crate) fn log(&self) {
		if self.is_error() {
			tracing::error!(
				file = %self.file.display(),
				line = self.line,
				"{}",
				self.message()
			);
		} else {
			tracing::warn!(
				file = %self.file.display(),
				line = self.line,
				"{}",
				self.message()
			);
		}
	}
}
