//! Requirement file reconciliation
//!
//! Compiles declaration files (`base.in`) into locked files (`base.txt`),
//! checks that every package resolves to one version and variant across all
//! locked files, and rewrites the locked files with the comments from their
//! declarations.

pub mod compile;
pub use compile::{CompileStatus, Compiler, PipCompile};

pub mod domain;
pub use domain::{Config, Issue, MetadataTable, ParsedLine, Requirement, ValidationReport};

pub mod pipeline;
pub use pipeline::{Outcome, Reconciler};

/// Filesystem access to requirement files.
pub mod storage;
pub use storage::{GeneratorCredit, Layout, Session};

/// The name this tool credits itself with in regenerated files.
pub const TOOL_NAME: &str = "reqsync";
