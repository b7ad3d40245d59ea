use serde::Serialize;
use thiserror::Error;

use crate::lexer::tokenize;
use crate::scope::Variable;
use crate::tokens::Token;
use crate::tokens::tokens_to_string;

/// A successfully parsed `def` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
	/// Whether the declaration carried the `*` marker and is visible to every
	/// file of the working directory.
	pub global: bool,
	/// One variable per declared name, in declaration order. All of them have
	/// the same cardinality.
	pub variables: Vec<Variable>,
}

/// A classified directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
	/// `M def [*] names = rows`
	Declaration(Declaration),
	/// A `def` directive that could not be decoded. `global` records whether
	/// the `*` marker was seen so each build pass only reports its own
	/// declarations.
	Invalid {
		global: bool,
		error: DeclarationError,
	},
	/// Any other marker line. These are comments and are dropped silently.
	Other,
}

/// Why a declaration could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[non_exhaustive]
pub enum DeclarationError {
	#[error("expected `=` after the variable name list")]
	MissingAssignment,
	#[error("missing variable name before `=`")]
	EmptyName,
	#[error("invalid variable name `{0}`")]
	InvalidName(String),
	#[error("variable `{0}` is declared twice in the same directive")]
	DuplicateName(String),
	#[error("declaration has no values after `=`")]
	EmptyValues,
	#[error("value group {row} has {got} component(s) but {expected} name(s) were declared")]
	ComponentMismatch {
		/// 1-indexed position of the offending value group.
		row: usize,
		expected: usize,
		got: usize,
	},
}

/// Returns true when the trimmed line starts with the directive marker.
pub fn is_directive(line: &str, marker: &str) -> bool {
	line.trim_start().starts_with(marker)
}

/// Parse a single source line. Returns `None` when the line is not a
/// directive at all.
pub fn parse_directive(line: &str, marker: &str) -> Option<Directive> {
	let body = line.trim_start().strip_prefix(marker)?;
	Some(parse_directive_body(body))
}

/// Parse the text following the directive marker.
pub fn parse_directive_body(body: &str) -> Directive {
	let tokens = tokenize(body);
	let mut rest = skip_whitespace(&tokens);

	let Some((Token::Def, after_def)) = rest.split_first() else {
		return Directive::Other;
	};

	// `def` must be followed by whitespace, `*` or nothing at all; anything
	// else means the keyword was only a prefix, e.g. `#!default`.
	rest = after_def;
	if rest
		.first()
		.is_some_and(|token| !token.is_whitespace() && token != &Token::Global)
	{
		return Directive::Other;
	}

	rest = skip_whitespace(rest);
	let global = rest.first() == Some(&Token::Global);
	if global {
		rest = &rest[1..];
	}

	match parse_bindings(rest) {
		Ok(variables) => Directive::Declaration(Declaration { global, variables }),
		Err(error) => Directive::Invalid { global, error },
	}
}

fn skip_whitespace(tokens: &[Token]) -> &[Token] {
	let start = tokens
		.iter()
		.position(|token| !token.is_whitespace())
		.unwrap_or(tokens.len());
	&tokens[start..]
}

/// Decode `names = rows` into transposed variables.
fn parse_bindings(tokens: &[Token]) -> Result<Vec<Variable>, DeclarationError> {
	let Some(assign) = tokens.iter().position(|token| token == &Token::Assign) else {
		return Err(DeclarationError::MissingAssignment);
	};

	let names = parse_names(&tokens[..assign])?;
	let rows = parse_rows(&tokens[assign + 1..])?;

	let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); names.len()];
	for (index, row) in rows.into_iter().enumerate() {
		if row.len() != names.len() {
			return Err(DeclarationError::ComponentMismatch {
				row: index + 1,
				expected: names.len(),
				got: row.len(),
			});
		}

		for (column, value) in columns.iter_mut().zip(row) {
			column.push(value);
		}
	}

	Ok(names
		.into_iter()
		.zip(columns)
		.map(|(name, values)| Variable::new(name, values))
		.collect())
}

fn parse_names(tokens: &[Token]) -> Result<Vec<String>, DeclarationError> {
	let text = tokens_to_string(tokens);
	if text.trim().is_empty() {
		return Err(DeclarationError::EmptyName);
	}

	let mut names: Vec<String> = Vec::new();
	for name in text.split(':').map(str::trim) {
		if name.is_empty() {
			return Err(DeclarationError::EmptyName);
		}
		if !is_valid_name(name) {
			return Err(DeclarationError::InvalidName(name.to_string()));
		}
		if names.iter().any(|existing| existing == name) {
			return Err(DeclarationError::DuplicateName(name.to_string()));
		}
		names.push(name.to_string());
	}

	Ok(names)
}

/// Split the value section on `,` into rows and each row on `:` into
/// trimmed components. Every other token, including further `=` and `*`, is
/// value text.
fn parse_rows(tokens: &[Token]) -> Result<Vec<Vec<String>>, DeclarationError> {
	if tokens.iter().all(Token::is_whitespace) {
		return Err(DeclarationError::EmptyValues);
	}

	let mut rows = Vec::new();
	let mut row = Vec::new();
	let mut component = String::new();

	for token in tokens {
		match token {
			Token::Comma => {
				row.push(component.trim().to_string());
				rows.push(std::mem::take(&mut row));
				component.clear();
			}
			Token::Colon => {
				row.push(component.trim().to_string());
				component.clear();
			}
			other => component.push_str(&other.to_string()),
		}
	}

	row.push(component.trim().to_string());
	rows.push(row);

	Ok(rows)
}

/// Variable names are ASCII letters, digits, `_`, `-` and `.`.
pub fn is_valid_name(name: &str) -> bool {
	!name.is_empty() && name.bytes().all(is_name_byte)
}

pub(crate) fn is_name_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.')
}
