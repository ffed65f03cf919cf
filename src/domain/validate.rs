//! Consistency checks over the aggregated metadata table.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::metadata::{Extensions, FileKind, MetadataTable, Occurrence};

/// Problems detected while reconciling requirement files.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Issue {
    /// The same package name appears more than once within a single file.
    #[error("requirement '{name}' already seen in {} (line {line_number})", path.display())]
    DuplicateRequirementInFile {
        /// The repeated package name.
        name: String,
        /// The file containing the duplicate.
        path: PathBuf,
        /// The line of the repeated occurrence.
        line_number: usize,
    },

    /// A package resolves to more than one version across locked files.
    #[error("'{name}' resolves to {} different versions: {}", versions.len(), versions.join(", "))]
    ConflictingResolvedVersion {
        /// The package name.
        name: String,
        /// The distinct locked versions, in first-seen order.
        versions: Vec<String>,
    },

    /// A package appears with more than one extras qualifier across locked
    /// files.
    #[error("'{name}' appears with {} different variants: {}", variants.len(), variants.join(", "))]
    ConflictingVariant {
        /// The package name.
        name: String,
        /// The distinct locked variants, in first-seen order.
        variants: Vec<String>,
    },
}

impl Issue {
    /// How seriously this issue affects the run.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::DuplicateRequirementInFile { .. } | Self::ConflictingResolvedVersion { .. } => {
                Severity::Error
            }
            Self::ConflictingVariant { .. } => Severity::Warning,
        }
    }
}

/// Whether an issue fails the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, but the run still succeeds.
    Warning,
    /// The run fails.
    Error,
}

/// A package whose locked occurrences disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// The package name.
    pub name: String,
    /// Distinct locked versions, in first-seen order.
    pub versions: Vec<String>,
    /// Distinct locked variants, in first-seen order.
    pub variants: Vec<String>,
    /// Every occurrence of the package, for inspection.
    pub occurrences: Vec<Occurrence>,
}

impl Conflict {
    /// An error if versions disagree, otherwise a warning.
    #[must_use]
    pub fn severity(&self) -> Severity {
        if self.versions.len() > 1 {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    /// The issues this conflict represents, errors first.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        if self.versions.len() > 1 {
            issues.push(Issue::ConflictingResolvedVersion {
                name: self.name.clone(),
                versions: self.versions.clone(),
            });
        }
        if self.variants.len() > 1 {
            issues.push(Issue::ConflictingVariant {
                name: self.name.clone(),
                variants: self.variants.clone(),
            });
        }
        issues
    }
}

/// The outcome of validating a metadata table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Conflicting packages, in name order.
    pub conflicts: Vec<Conflict>,
}

impl ValidationReport {
    /// Whether any package resolves to more than one version.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Conflicts that fail the run.
    pub fn errors(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts
            .iter()
            .filter(|conflict| conflict.severity() == Severity::Error)
    }

    /// Conflicts that are only reported.
    pub fn warnings(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts
            .iter()
            .filter(|conflict| conflict.severity() == Severity::Warning)
    }
}

/// Checks every package for version and variant agreement across locked
/// files, and stores the deduplicated declaration-file comments on each
/// package for regeneration.
///
/// Packages are processed in lexicographic order so diagnostics are
/// reproducible.
pub fn validate(metadata: &mut MetadataTable, extensions: &Extensions) -> ValidationReport {
    tracing::info!("Merging and validating metadata for {} packages", metadata.len());

    let mut report = ValidationReport::default();

    for (name, package) in metadata.iter_mut() {
        let variants = dedup(
            package
                .occurrences_in(FileKind::Locked, extensions)
                .map(|occurrence| occurrence.variant.as_str()),
        );
        let versions = dedup(
            package
                .occurrences_in(FileKind::Locked, extensions)
                .map(|occurrence| occurrence.version.as_str()),
        );
        let comments = dedup(
            package
                .occurrences_in(FileKind::Declaration, extensions)
                .map(|occurrence| occurrence.comment.as_str())
                .filter(|comment| !comment.is_empty()),
        );

        if versions.len() > 1 || variants.len() > 1 {
            let conflict = Conflict {
                name: name.to_string(),
                versions,
                variants,
                occurrences: package.occurrences().to_vec(),
            };
            log_conflict(&conflict);
            report.conflicts.push(conflict);
        }

        package.set_trimmed_input_comments(comments);
    }

    report
}

/// Logs the raw per-occurrence sequences of a conflict at debug level.
fn log_conflict(conflict: &Conflict) {
    let paths: Vec<_> = conflict
        .occurrences
        .iter()
        .map(|o| o.path.display().to_string())
        .collect();
    let variants: Vec<_> = conflict.occurrences.iter().map(|o| &o.variant).collect();
    let versions: Vec<_> = conflict.occurrences.iter().map(|o| &o.version).collect();
    let comments: Vec<_> = conflict.occurrences.iter().map(|o| &o.comment).collect();

    for issue in conflict.issues() {
        tracing::debug!(
            package = %conflict.name,
            severity = ?issue.severity(),
            cver = conflict.versions.len(),
            cvar = conflict.variants.len(),
            "{issue}: files={paths:?} variants={variants:?} versions={versions:?} comments={comments:?}"
        );
    }
}

/// Removes repeated values, keeping the first occurrence of each.
fn dedup<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for value in values {
        if !unique.iter().any(|seen| seen == value) {
            unique.push(value.to_string());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        path::Path,
        sync::{Arc, Mutex},
    };

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::domain::line::ParsedLine;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logged_at(level: tracing::Level, metadata: &mut MetadataTable) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(level)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            validate(metadata, &Extensions::default());
        });
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn table(lines: &[(&str, &str)]) -> MetadataTable {
        let mut table = MetadataTable::new();
        for (line_number, (path, line)) in lines.iter().enumerate() {
            let parsed = ParsedLine::parse(line);
            table.record(parsed.as_requirement().unwrap(), line_number + 1, Path::new(path));
        }
        table
    }

    #[test]
    fn conflicting_versions_are_errors() {
        let mut metadata = table(&[("a.txt", "bar==2.0"), ("b.txt", "bar==2.1")]);

        let report = validate(&mut metadata, &Extensions::default());

        assert!(report.has_errors());
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].versions, ["==2.0", "==2.1"]);
        assert_eq!(
            report.conflicts[0].issues(),
            [Issue::ConflictingResolvedVersion {
                name: "bar".to_string(),
                versions: vec!["==2.0".to_string(), "==2.1".to_string()],
            }]
        );
    }

    #[test]
    fn conflicting_variants_are_warnings() {
        let mut metadata = table(&[("a.txt", "bar[x]==2.0"), ("b.txt", "bar[y]==2.0")]);

        let report = validate(&mut metadata, &Extensions::default());

        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.conflicts[0].severity(), Severity::Warning);
        assert_eq!(report.conflicts[0].variants, ["x", "y"]);
    }

    #[test]
    fn declaration_versions_do_not_conflict() {
        let mut metadata = table(&[
            ("a.in", "bar>=1.0"),
            ("a.txt", "bar==2.0"),
            ("b.in", "bar"),
            ("b.txt", "bar==2.0"),
        ]);

        let report = validate(&mut metadata, &Extensions::default());

        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn input_comments_are_deduplicated_in_order() {
        let mut metadata = table(&[
            ("a.in", "foo  # retry logic"),
            ("b.in", "foo"),
            ("c.in", "foo  # retry logic"),
            ("d.in", "foo  # pinned for CVE"),
            ("a.txt", "foo==1.0  # locked comments are ignored"),
        ]);

        validate(&mut metadata, &Extensions::default());

        assert_eq!(
            metadata.get("foo").unwrap().trimmed_input_comments(),
            ["retry logic", "pinned for CVE"]
        );
    }

    #[test]
    fn conflicts_are_reported_in_name_order() {
        let mut metadata = table(&[
            ("a.txt", "zed==1"),
            ("b.txt", "zed==2"),
            ("a.txt", "abc==1"),
            ("b.txt", "abc==2"),
        ]);

        let report = validate(&mut metadata, &Extensions::default());

        let names: Vec<_> = report.conflicts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["abc", "zed"]);
    }

    #[test]
    fn both_conflicts_yield_two_issues() {
        let mut metadata = table(&[("a.txt", "bar[x]==2.0"), ("b.txt", "bar[y]==2.1")]);

        let report = validate(&mut metadata, &Extensions::default());
        let issues = report.conflicts[0].issues();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity(), Severity::Error);
        assert_eq!(issues[1].severity(), Severity::Warning);
    }

    #[test]
    fn conflicts_are_not_logged_at_default_verbosity() {
        let mut metadata = table(&[("a.txt", "bar[x]==2.0"), ("b.txt", "bar[y]==2.1")]);

        assert!(logged_at(tracing::Level::WARN, &mut metadata).is_empty());
    }

    #[test]
    fn conflicts_are_logged_for_inspection_at_debug() {
        let mut metadata = table(&[("a.txt", "bar==2.0"), ("b.txt", "bar==2.1")]);

        let logs = logged_at(tracing::Level::DEBUG, &mut metadata);

        assert!(logs.contains("'bar' resolves to 2 different versions: ==2.0, ==2.1"));
        assert!(logs.contains(r#"files=["a.txt", "b.txt"]"#));
    }
}
