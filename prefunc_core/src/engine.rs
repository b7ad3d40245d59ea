use std::path::Path;

use crate::config::MissingPolicy;
use crate::diagnostics::BuildDiagnostic;
use crate::diagnostics::DiagnosticKind;
use crate::parser::Directive;
use crate::parser::is_directive;
use crate::parser::parse_directive;
use crate::placeholder::Placeholder;
use crate::placeholder::scan_placeholders;
use crate::scope::GlobalScopeBuilder;
use crate::scope::Resolution;
use crate::scope::ScopeChain;
use crate::scope::VariableScope;

/// Options for expanding a single file.
#[derive(Debug, Clone)]
pub struct ExpandOptions {
	/// Directive marker, e.g. `#!`.
	pub marker: String,
	/// Policy for placeholders that cannot be resolved.
	pub missing: MissingPolicy,
}

impl Default for ExpandOptions {
	fn default() -> Self {
		Self {
			marker: crate::config::DEFAULT_MARKER.to_string(),
			missing: MissingPolicy::default(),
		}
	}
}

/// The result of expanding one file.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
	/// Output lines in order, before assembly.
	pub lines: Vec<String>,
	/// The file's local declarations, last binding per name.
	pub locals: VariableScope,
	/// Problems found in this file. Each one has already been logged.
	pub diagnostics: Vec<BuildDiagnostic>,
}

/// Split file content into lines. Only `\n` separates lines so that joining
/// the result with `\n` reproduces the input byte for byte.
pub fn split_lines(content: &str) -> impl Iterator<Item = &str> {
	content.split('\n')
}

/// First pass: record every global declaration of `content` into `builder`.
/// Invalid global declarations are returned as diagnostics. Local
/// declarations are ignored here.
pub fn collect_globals(
	content: &str,
	file: &Path,
	marker: &str,
	builder: &mut GlobalScopeBuilder,
) -> Vec<BuildDiagnostic> {
	let mut diagnostics = Vec::new();

	for (index, line) in split_lines(content).enumerate() {
		match parse_directive(line, marker) {
			Some(Directive::Declaration(declaration)) if declaration.global => {
				builder.push(file, index + 1, declaration);
			}
			Some(Directive::Invalid {
				global: true,
				error,
			}) => {
				let diagnostic = BuildDiagnostic::new(
					file,
					index + 1,
					DiagnosticKind::InvalidDeclaration {
						reason: error.to_string(),
					},
				);
				diagnostic.log();
				diagnostics.push(diagnostic);
			}
			_ => {}
		}
	}

	diagnostics
}

/// Collect the local declarations of one file into a single scope. A name
/// declared twice keeps its last binding. Invalid local declarations are
/// returned as diagnostics; global ones belong to [`collect_globals`].
pub fn collect_locals(
	content: &str,
	file: &Path,
	marker: &str,
) -> (VariableScope, Vec<BuildDiagnostic>) {
	let mut locals = VariableScope::new();
	let mut diagnostics = Vec::new();

	for (index, line) in split_lines(content).enumerate() {
		match parse_directive(line, marker) {
			Some(Directive::Declaration(declaration)) if !declaration.global => {
				locals.declare_all(declaration);
			}
			Some(Directive::Invalid {
				global: false,
				error,
			}) => {
				let diagnostic = BuildDiagnostic::new(
					file,
					index + 1,
					DiagnosticKind::InvalidDeclaration {
						reason: error.to_string(),
					},
				);
				diagnostic.log();
				diagnostics.push(diagnostic);
			}
			_ => {}
		}
	}

	(locals, diagnostics)
}

/// Second pass: expand one file against its working directory's global
/// scope.
///
/// The file's local declarations are gathered first, so a local binding
/// applies to every line of the file regardless of where it is declared.
/// Directive lines are then dropped, lines without placeholders pass through
/// untouched and templated lines are replaced by one generated line per
/// value of their first placeholder's variable.
pub fn expand(
	content: &str,
	file: &Path,
	globals: &VariableScope,
	options: &ExpandOptions,
) -> Expansion {
	let (locals, diagnostics) = collect_locals(content, file, &options.marker);
	let mut expansion = Expansion {
		lines: Vec::new(),
		locals,
		diagnostics,
	};

	for (index, line) in split_lines(content).enumerate() {
		if is_directive(line, &options.marker) {
			continue;
		}

		let placeholders = scan_placeholders(line);
		if placeholders.is_empty() {
			expansion.lines.push(line.to_string());
			continue;
		}

		let scope = ScopeChain::new(&expansion.locals, globals);
		match unroll_line(line, &placeholders, scope, options) {
			Ok(generated) => expansion.lines.extend(generated),
			Err(kind) => {
				expansion.push_diagnostic(BuildDiagnostic::new(file, index + 1, kind));
			}
		}
	}

	expansion
}

impl Expansion {
	fn push_diagnostic(&mut self, diagnostic: BuildDiagnostic) {
		diagnostic.log();
		self.diagnostics.push(diagnostic);
	}
}

/// Unroll one templated line. The cardinality of the first placeholder's
/// variable decides how many lines are generated.
pub fn unroll_line(
	line: &str,
	placeholders: &[Placeholder<'_>],
	scope: ScopeChain<'_>,
	options: &ExpandOptions,
) -> Result<Vec<String>, DiagnosticKind> {
	let Some(first) = placeholders.first() else {
		return Ok(vec![line.to_string()]);
	};

	let Some(count) = scope.cardinality_of(first.name) else {
		return Err(DiagnosticKind::UndefinedVariable {
			name: first.name.to_string(),
		});
	};

	let mut generated = Vec::with_capacity(count);
	for index in 0..count {
		let mut output = String::with_capacity(line.len());
		let mut cursor = 0;

		for placeholder in placeholders {
			output.push_str(&line[cursor..placeholder.span.start]);
			match scope.value_at(placeholder.name, index) {
				Resolution::Found(value) => output.push_str(value),
				Resolution::Missing => {
					match options.missing {
						MissingPolicy::Literal => output.push_str(placeholder.name),
						MissingPolicy::FailLine => {
							return Err(missing_kind(scope, placeholder.name, index, count));
						}
					}
				}
			}
			cursor = placeholder.span.end;
		}

		output.push_str(&line[cursor..]);
		generated.push(finish_generated_line(&output, &options.marker));
	}

	Ok(generated)
}

fn missing_kind(scope: ScopeChain<'_>, name: &str, index: usize, count: usize) -> DiagnosticKind {
	if scope.resolve(name).is_some() {
		DiagnosticKind::MissingValue {
			name: name.to_string(),
			index,
			cardinality: count,
		}
	} else {
		DiagnosticKind::UndefinedVariable {
			name: name.to_string(),
		}
	}
}

/// Strip a residual directive marker from a generated line and trim it.
fn finish_generated_line(line: &str, marker: &str) -> String {
	let trimmed = line.trim();
	trimmed
		.strip_prefix(marker)
		.map_or(trimmed, str::trim)
		.to_string()
}

/// Drop any line that still starts with the directive marker and join the
/// rest with `\n`.
pub fn assemble(lines: &[String], marker: &str) -> String {
	lines
		.iter()
		.filter(|line| !is_directive(line, marker))
		.map(String::as_str)
		.collect::<Vec<_>>()
		.join("\n")
}

/// Expand and assemble one file in a single call.
pub fn render_file(
	content: &str,
	file: &Path,
	globals: &VariableScope,
	options: &ExpandOptions,
) -> (String, Vec<BuildDiagnostic>) {
	let expansion = expand(content, file, globals, options);
	let output = assemble(&expansion.lines, &options.marker);
	(output, expansion.diagnostics)
}

/// Build the global scope for a set of files held in memory. Files may be
/// given in any order; see [`GlobalScopeBuilder`].
pub fn build_globals<'a>(
	files: impl IntoIterator<Item = (&'a Path, &'a str)>,
	marker: &str,
) -> (VariableScope, Vec<BuildDiagnostic>) {
	let mut builder = GlobalScopeBuilder::new();
	let mut diagnostics = Vec::new();

	for (file, content) in files {
		diagnostics.extend(collect_globals(content, file, marker, &mut builder));
	}

	(builder.build(), diagnostics)
}
