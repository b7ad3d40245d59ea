use std::ops::Range;

use crate::parser::is_name_byte;

/// A `<name>` reference inside a content line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
	/// The referenced variable name, without the angle brackets.
	pub name: &'a str,
	/// Byte range of the whole `<name>` span in the line.
	pub span: Range<usize>,
}

/// Find every placeholder in `line`, in lexical order. A `<` that is not
/// followed by a valid name and a closing `>` is ordinary text, so `a < b`
/// and `<<x>` (which yields `<x>` at offset 1) behave as expected.
pub fn scan_placeholders(line: &str) -> Vec<Placeholder<'_>> {
	let bytes = line.as_bytes();
	let mut placeholders = Vec::new();
	let mut cursor = 0;

	while cursor < bytes.len() {
		if bytes[cursor] != b'<' {
			cursor += 1;
			continue;
		}

		let name_start = cursor + 1;
		let name_end = bytes[name_start..]
			.iter()
			.position(|byte| !is_name_byte(*byte))
			.map_or(bytes.len(), |offset| name_start + offset);

		if name_end > name_start && bytes.get(name_end) == Some(&b'>') {
			placeholders.push(Placeholder {
				name: &line[name_start..name_end],
				span: cursor..name_end + 1,
			});
			cursor = name_end + 1;
		} else {
			cursor += 1;
		}
	}

	placeholders
}
