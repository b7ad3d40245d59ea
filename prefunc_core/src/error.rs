use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum PrefuncError {
	#[error(transparent)]
	#[diagnostic(code(prefunc::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(prefunc::config_parse),
		help("check that prefunc.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("invalid config value for `{key}`: {reason}")]
	#[diagnostic(code(prefunc::invalid_config))]
	InvalidConfig { key: String, reason: String },

	#[error("data folder couldn't be found at `{path}`")]
	#[diagnostic(
		code(prefunc::missing_data_dir),
		help("create the folder or set `data_dir` in prefunc.toml")
	)]
	MissingDataDir { path: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(prefunc::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

pub type PrefuncResult<T> = Result<T, PrefuncError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
