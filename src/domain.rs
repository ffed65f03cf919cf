//! Domain models for requirement reconciliation.
//!
//! This module contains the line parser, the cross-file metadata table, the
//! consistency checks run over it, and the project configuration.

/// Line-level parsing of requirement files.
pub mod line;
pub use line::{FileTable, ParsedLine, Record, Requirement};

mod config;
pub use config::Config;

pub mod metadata;
pub use metadata::{Extensions, FileKind, MetadataTable, Occurrence, PackageMetadata};

pub mod validate;
pub use validate::{Conflict, Issue, Severity, ValidationReport, validate};
