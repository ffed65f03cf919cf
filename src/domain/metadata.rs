//! Cross-file package metadata.
//!
//! The [`MetadataTable`] accumulates every occurrence of every package name
//! across all ingested files, in encounter order.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::domain::line::Requirement;

/// Which side of a requirement set a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// A human-authored declaration file (`.in`).
    Declaration,
    /// A compiler-generated locked file (`.txt`).
    Locked,
}

/// The file extensions used to tell declaration files from locked files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions {
    /// Extension of declaration files, without the leading dot.
    pub declaration: String,
    /// Extension of locked files, without the leading dot.
    pub locked: String,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            declaration: "in".to_string(),
            locked: "txt".to_string(),
        }
    }
}

impl Extensions {
    /// Classifies a file by its suffix.
    ///
    /// Returns `None` for files that are neither declaration nor locked files.
    #[must_use]
    pub fn kind_of(&self, path: &Path) -> Option<FileKind> {
        let name = path.to_string_lossy();
        if name.ends_with(&format!(".{}", self.declaration)) {
            Some(FileKind::Declaration)
        } else if name.ends_with(&format!(".{}", self.locked)) {
            Some(FileKind::Locked)
        } else {
            None
        }
    }
}

/// A single occurrence of a package in some file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// The extras qualifier at this occurrence.
    pub variant: String,
    /// The version constraint at this occurrence (operator and value).
    pub version: String,
    /// The trailing comment at this occurrence.
    pub comment: String,
    /// The 1-based line number.
    pub line_number: usize,
    /// The file containing the occurrence.
    pub path: PathBuf,
}

/// Everything known about one package name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    occurrences: Vec<Occurrence>,
    trimmed_input_comments: Vec<String>,
}

impl PackageMetadata {
    /// All occurrences, in encounter order.
    #[must_use]
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// The deduplicated, non-empty declaration-file comments.
    ///
    /// Empty until the table has been validated.
    #[must_use]
    pub fn trimmed_input_comments(&self) -> &[String] {
        &self.trimmed_input_comments
    }

    pub(crate) fn set_trimmed_input_comments(&mut self, comments: Vec<String>) {
        self.trimmed_input_comments = comments;
    }

    /// Occurrences in files of the given kind, in encounter order.
    pub fn occurrences_in<'a>(
        &'a self,
        kind: FileKind,
        extensions: &'a Extensions,
    ) -> impl Iterator<Item = &'a Occurrence> + 'a {
        self.occurrences
            .iter()
            .filter(move |occurrence| extensions.kind_of(&occurrence.path) == Some(kind))
    }
}

/// Package metadata keyed by requirement name.
///
/// Iteration is in lexicographic name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    packages: BTreeMap<String, PackageMetadata>,
}

impl MetadataTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an occurrence of `requirement`, read from `path` at
    /// `line_number`.
    pub fn record(&mut self, requirement: &Requirement, line_number: usize, path: &Path) {
        self.packages
            .entry(requirement.name.clone())
            .or_default()
            .occurrences
            .push(Occurrence {
                variant: requirement.variant.clone(),
                version: requirement.version(),
                comment: requirement.comment.clone(),
                line_number,
                path: path.to_path_buf(),
            });
    }

    /// Looks up a package by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageMetadata> {
        self.packages.get(name)
    }

    /// Iterates over packages in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageMetadata)> {
        self.packages
            .iter()
            .map(|(name, metadata)| (name.as_str(), metadata))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut PackageMetadata)> {
        self.packages
            .iter_mut()
            .map(|(name, metadata)| (name.as_str(), metadata))
    }

    /// The number of distinct package names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no package has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::line::ParsedLine;

    fn record_line(table: &mut MetadataTable, line: &str, line_number: usize, path: &str) {
        let parsed = ParsedLine::parse(line);
        let requirement = parsed.as_requirement().unwrap();
        table.record(requirement, line_number, Path::new(path));
    }

    #[test]
    fn occurrences_keep_encounter_order() {
        let mut table = MetadataTable::new();
        record_line(&mut table, "foo==1.0  # first", 1, "base.in");
        record_line(&mut table, "foo[x]==1.1", 4, "base.txt");

        let foo = table.get("foo").unwrap();
        let versions: Vec<_> = foo.occurrences().iter().map(|o| o.version.as_str()).collect();
        assert_eq!(versions, ["==1.0", "==1.1"]);
        assert_eq!(foo.occurrences()[0].comment, "first");
        assert_eq!(foo.occurrences()[1].variant, "x");
        assert_eq!(foo.occurrences()[1].line_number, 4);
    }

    #[test]
    fn iteration_is_sorted_by_name() {
        let mut table = MetadataTable::new();
        record_line(&mut table, "zeta", 1, "a.in");
        record_line(&mut table, "alpha", 2, "a.in");
        record_line(&mut table, "mu", 3, "a.in");

        let names: Vec<_> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["alpha", "mu", "zeta"]);
    }

    #[test]
    fn occurrences_are_partitioned_by_file_kind() {
        let extensions = Extensions::default();
        let mut table = MetadataTable::new();
        record_line(&mut table, "foo", 1, "dir/base.in");
        record_line(&mut table, "foo==1.0", 1, "dir/base.txt");
        record_line(&mut table, "foo==1.0", 1, "dir/notes.md");

        let foo = table.get("foo").unwrap();
        assert_eq!(foo.occurrences_in(FileKind::Declaration, &extensions).count(), 1);
        assert_eq!(foo.occurrences_in(FileKind::Locked, &extensions).count(), 1);
    }

    #[test]
    fn extensions_classify_by_suffix() {
        let extensions = Extensions::default();

        assert_eq!(
            extensions.kind_of(Path::new("requirements/dev.in")),
            Some(FileKind::Declaration)
        );
        assert_eq!(
            extensions.kind_of(Path::new("requirements/dev.txt")),
            Some(FileKind::Locked)
        );
        assert_eq!(extensions.kind_of(Path::new("requirements/dev")), None);
    }
}
