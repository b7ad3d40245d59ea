use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::PrefuncError;
use crate::PrefuncResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["prefunc.toml", ".prefunc.toml", ".config/prefunc.toml"];

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MARKER: &str = "#!";
pub const DEFAULT_WORKING_DIR_MARKER: &str = "~";
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["mcfunction", "prefunc"];

/// What to do when a placeholder other than the line's first one cannot be
/// resolved for some index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingPolicy {
	/// Report the line and emit none of its generated lines.
	#[default]
	FailLine,
	/// Substitute the bare variable name.
	Literal,
}

/// Configuration loaded from a `prefunc.toml` file.
///
/// ```toml
/// data_dir = "data"
/// extensions = ["mcfunction", "prefunc"]
/// marker = "#!"
/// working_dir_marker = "~"
/// missing = "fail-line"
/// clean = true
///
/// [exclude]
/// patterns = ["*.bak", "drafts/"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PrefuncConfig {
	/// Folder, relative to the project root, holding the working directories.
	#[serde(default = "default_data_dir")]
	pub data_dir: PathBuf,
	/// File extensions (without the dot) processed by the engine. Files with
	/// other extensions are copied through unchanged.
	#[serde(default = "default_extensions")]
	pub extensions: Vec<String>,
	/// Directive marker.
	#[serde(default = "default_marker")]
	pub marker: String,
	/// Working directory marker.
	#[serde(default = "default_working_dir_marker")]
	pub working_dir_marker: String,
	/// Policy for placeholders that cannot be resolved.
	#[serde(default)]
	pub missing: MissingPolicy,
	/// Remove each build directory before writing it again.
	#[serde(default = "default_clean")]
	pub clean: bool,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
}

/// Configuration for excluding files and directories from the build.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns relative to the project root, e.g.
	/// `"*.bak"` or `"drafts/"`. Excluded files are neither processed nor
	/// copied.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_data_dir() -> PathBuf {
	PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_extensions() -> Vec<String> {
	DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
}

fn default_marker() -> String {
	DEFAULT_MARKER.to_string()
}

fn default_working_dir_marker() -> String {
	DEFAULT_WORKING_DIR_MARKER.to_string()
}

fn default_clean() -> bool {
	true
}

impl Default for PrefuncConfig {
	fn default() -> Self {
		Self {
			data_dir: default_data_dir(),
			extensions: default_extensions(),
			marker: default_marker(),
			working_dir_marker: default_working_dir_marker(),
			missing: MissingPolicy::default(),
			clean: default_clean(),
			exclude: ExcludeConfig::default(),
		}
	}
}

impl PrefuncConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> PrefuncResult<Option<PrefuncConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	/// Load the discovered config, falling back to defaults.
	pub fn load_or_default(root: &Path) -> PrefuncResult<PrefuncConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	/// Parse and validate config file content.
	pub fn parse(content: &str) -> PrefuncResult<PrefuncConfig> {
		let config: PrefuncConfig =
			toml::from_str(content).map_err(|e| PrefuncError::ConfigParse(e.to_string()))?;
		config.validate()?;

		Ok(config)
	}

	pub fn validate(&self) -> PrefuncResult<()> {
		if self.marker.trim().is_empty() {
			return Err(PrefuncError::InvalidConfig {
				key: "marker".to_string(),
				reason: "the directive marker cannot be empty".to_string(),
			});
		}

		if self.working_dir_marker.is_empty()
			|| self.working_dir_marker.contains(['/', '\\'])
		{
			return Err(PrefuncError::InvalidConfig {
				key: "working_dir_marker".to_string(),
				reason: "expected a non-empty prefix without path separators".to_string(),
			});
		}

		if let Some(extension) = self.extensions.iter().find(|ext| ext.starts_with('.')) {
			return Err(PrefuncError::InvalidConfig {
				key: "extensions".to_string(),
				reason: format!("write `{}` without the leading dot", &extension[1..]),
			});
		}

		Ok(())
	}

	/// Whether the engine expands this file rather than copying it.
	pub fn is_eligible(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
	}
}
