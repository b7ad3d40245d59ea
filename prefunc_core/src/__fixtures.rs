use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::Declaration;
use crate::Variable;
use crate::VariableScope;

pub fn variable(name: &str, values: &[&str]) -> Variable {
	Variable::new(name, values.iter().map(ToString::to_string).collect())
}

pub fn scope(variables: &[Variable]) -> VariableScope {
	let mut scope = VariableScope::new();
	for variable in variables {
		scope.declare(variable.clone());
	}
	scope
}

pub fn declaration(global: bool, variables: &[Variable]) -> Declaration {
	Declaration {
		global,
		variables: variables.to_vec(),
	}
}

/// A temporary project with a `data` folder.
pub struct TestProject {
	pub dir: TempDir,
}

impl TestProject {
	pub fn new() -> Self {
		let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
		std::fs::create_dir_all(dir.path().join("data"))
			.unwrap_or_else(|e| panic!("create data dir: {e}"));
		Self { dir }
	}

	pub fn root(&self) -> &Path {
		self.dir.path()
	}

	pub fn data(&self) -> PathBuf {
		self.root().join("data")
	}

	/// Write `content` to `relative` below the project root.
	pub fn write(&self, relative: &str, content: &str) -> PathBuf {
		let path = self.root().join(relative);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create parent: {e}"));
		}
		std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {relative}: {e}"));
		path
	}

	pub fn read(&self, relative: &str) -> String {
		std::fs::read_to_string(self.root().join(relative))
			.unwrap_or_else(|e| panic!("read {relative}: {e}"))
	}

	pub fn exists(&self, relative: &str) -> bool {
		self.root().join(relative).exists()
	}
}
