use std::collections::BTreeMap;
use std::path::PathBuf;

use derive_more::Deref;
use serde::Serialize;

use crate::parser::Declaration;

/// A variable name bound to an ordered sequence of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
	pub name: String,
	pub values: Vec<String>,
}

impl Variable {
	pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
		Self {
			name: name.into(),
			values,
		}
	}

	/// The number of values this variable holds. A templated line whose first
	/// placeholder references this variable unrolls into this many lines.
	pub fn cardinality(&self) -> usize {
		self.values.len()
	}

	pub fn value(&self, index: usize) -> Option<&str> {
		self.values.get(index).map(String::as_str)
	}
}

/// A table of variables keyed by name. Declaring an existing name replaces
/// the previous binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize)]
#[serde(transparent)]
pub struct VariableScope(BTreeMap<String, Variable>);

impl VariableScope {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or overwrite a variable. Returns the binding it replaced.
	pub fn declare(&mut self, variable: Variable) -> Option<Variable> {
		self.0.insert(variable.name.clone(), variable)
	}

	/// Declare every variable produced by a single declaration line.
	pub fn declare_all(&mut self, declaration: Declaration) {
		for variable in declaration.variables {
			self.declare(variable);
		}
	}
}

/// The outcome of looking up a single placeholder value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
	Found(&'a str),
	Missing,
}

/// Local-then-global view over the two scopes visible while expanding one
/// file.
#[derive(Debug, Clone, Copy)]
pub struct ScopeChain<'a> {
	local: &'a VariableScope,
	global: &'a VariableScope,
}

impl<'a> ScopeChain<'a> {
	pub fn new(local: &'a VariableScope, global: &'a VariableScope) -> Self {
		Self { local, global }
	}

	pub fn resolve(&self, name: &str) -> Option<&'a Variable> {
		self.local.get(name).or_else(|| self.global.get(name))
	}

	pub fn cardinality_of(&self, name: &str) -> Option<usize> {
		self.resolve(name).map(Variable::cardinality)
	}

	/// Look up the `index`-th value of `name`. Missing covers both an unknown
	/// name and an index beyond the variable's cardinality.
	pub fn value_at(&self, name: &str, index: usize) -> Resolution<'a> {
		match self.resolve(name).and_then(|variable| variable.value(index)) {
			Some(value) => Resolution::Found(value),
			None => Resolution::Missing,
		}
	}
}

/// A global declaration together with where it was found.
#[derive(Debug, Clone)]
pub struct GlobalDeclaration {
	pub file: PathBuf,
	/// 1-indexed line number.
	pub line: usize,
	pub declaration: Declaration,
}

/// Collects global declarations from every file of a working directory and
/// applies them in a fixed order: by file path, then by line. When two files
/// declare the same name, the one whose path sorts last wins regardless of
/// the order in which the files were scanned.
#[derive(Debug, Default)]
pub struct GlobalScopeBuilder {
	entries: Vec<GlobalDeclaration>,
}

impl GlobalScopeBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, file: impl Into<PathBuf>, line: usize, declaration: Declaration) {
		self.entries.push(GlobalDeclaration {
			file: file.into(),
			line,
			declaration,
		});
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn build(mut self) -> VariableScope {
		self.entries
			.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));

		let mut scope = VariableScope::new();
		for entry in self.entries {
			scope.declare_all(entry.declaration);
		}

		scope
	}
}
