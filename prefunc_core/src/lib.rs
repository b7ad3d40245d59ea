//! `prefunc_core` is the engine behind [prefunc](https://github.com/ifiokjr/prefunc), a
//! directory-scoped preprocessor that unrolls templated lines into plain
//! output files.
//!
//! ## Syntax
//!
//! ```text
//! #! def *mob = zombie, skeleton, creeper
//! #! def id:color = 1:red, 2:green
//! say <mob>
//! team <id> color <color>
//! ```
//!
//! builds into
//!
//! ```text
//! say zombie
//! say skeleton
//! say creeper
//! team 1 color red
//! team 2 color green
//! ```
//!
//! A declaration marked with `*` is global to its working directory; without
//! it the variables are local to the declaring file and shadow globals of the
//! same name. A templated line unrolls once per value of the variable named
//! by its first placeholder.
//!
//! ## Processing Pipeline
//!
//! ```text
//! data/~pack/**
//!   → Project driver (finds `~` working directories, lists files in sorted order)
//!   → Global pass (collects `def *` declarations of every file into one scope)
//!   → Expander (per file: local declarations, placeholder resolution, unrolling)
//!   → Assembler (drops marker lines, joins with `\n`)
//!   → data/pack/**
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `prefunc.toml`.
//! - [`project`]: Working directory discovery, file walking, build planning,
//!   writing and checking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prefunc_core::project::load_project;
//! use prefunc_core::project::plan_build;
//! use prefunc_core::project::write_build;
//! use std::path::Path;
//!
//! let ctx = load_project(Path::new(".")).unwrap();
//! let plan = plan_build(&ctx).unwrap();
//! let report = write_build(&plan);
//! println!("{} file(s) written", report.written.len());
//! ```

pub use diagnostics::*;
pub use engine::*;
pub use error::*;
pub use parser::*;
pub use placeholder::*;
pub use scope::*;

pub mod config;
mod diagnostics;
mod engine;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
mod parser;
mod placeholder;
pub mod project;
mod scope;
pub(crate) mod tokens;

#[cfg(test)]
mod __fixtures;
