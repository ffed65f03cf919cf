//! Line-level parsing of requirement files.
//!
//! Every line of a declaration or locked file becomes exactly one
//! [`ParsedLine`]: either a [`Requirement`] declaration or an opaque line that
//! is echoed back verbatim when the file is regenerated.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

/// Splits a requirement part at the first version-comparison token.
///
/// The lazy prefix finds the leftmost token position; at that position the
/// alternation prefers the longest operator (`>=` before `>`).
static VERSION_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)(~=|===|==|!=|<=|>=|<|>|;)(.*)$")
        .expect("Invalid regex pattern for version operator")
});

/// Matches a trailing `[extras]` suffix, spanning the first `[` to the final `]`.
static VARIANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\[]*)\[(.*)\]$").expect("Invalid regex pattern for variant")
});

/// A single requirement declaration, such as `baz[extra]>=3.0  # note`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requirement {
    /// The package name, without extras.
    pub name: String,

    /// The content of the optional `[...]` extras qualifier.
    pub variant: String,

    /// The version-comparison operator, e.g. `==`, or empty if unconstrained.
    pub version_op: String,

    /// The version value following the operator.
    pub version_val: String,

    /// The trailing comment, without the leading `#`.
    pub comment: String,

    /// The trailing comment as written, from its first `#` on.
    pub raw_comment: String,
}

impl Requirement {
    /// The version constraint as written: operator followed by value.
    ///
    /// Empty if the requirement is unconstrained.
    #[must_use]
    pub fn version(&self) -> String {
        format!("{}{}", self.version_op, self.version_val)
    }

    /// The requirement without its comment, e.g. `baz[extra]>=3.0`.
    #[must_use]
    pub fn specifier(&self) -> String {
        if self.variant.is_empty() {
            format!("{}{}", self.name, self.version())
        } else {
            format!("{}[{}]{}", self.name, self.variant, self.version())
        }
    }

    fn parse(line: &str) -> Self {
        let (requirement_part, raw_comment) = line
            .find('#')
            .map_or((line, ""), |index| line.split_at(index));
        let comment = raw_comment.strip_prefix('#').unwrap_or(raw_comment);

        let requirement_part = requirement_part.trim();

        let (candidate, version_op, version_val) = match VERSION_OPERATOR.captures(requirement_part)
        {
            Some(captures) => (
                captures.get(1).map_or("", |m| m.as_str()).trim(),
                captures[2].to_string(),
                captures[3].trim().to_string(),
            ),
            None => (requirement_part, String::new(), String::new()),
        };

        let (name, variant) = match VARIANT.captures(candidate) {
            Some(captures) => (captures[1].trim().to_string(), captures[2].trim().to_string()),
            None => (candidate.to_string(), String::new()),
        };

        Self {
            name,
            variant,
            version_op,
            version_val,
            comment: comment.trim().to_string(),
            raw_comment: raw_comment.trim().to_string(),
        }
    }
}

/// One line of a requirement file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A requirement declaration.
    Requirement(Requirement),

    /// Anything else: blank lines, comments, and `-` directives.
    Opaque(String),
}

impl ParsedLine {
    /// Classifies and decomposes a single raw line.
    ///
    /// Lines that start with an alphabetic character (after trimming) are
    /// requirement declarations. Everything else is opaque and kept as the
    /// trimmed text.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.chars().next() {
            Some(first) if first.is_alphabetic() => Self::Requirement(Requirement::parse(line)),
            _ => Self::Opaque(line.to_string()),
        }
    }

    /// Returns the requirement, if this line declares one.
    #[must_use]
    pub const fn as_requirement(&self) -> Option<&Requirement> {
        match self {
            Self::Requirement(requirement) => Some(requirement),
            Self::Opaque(_) => None,
        }
    }
}

impl fmt::Display for ParsedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement(requirement) => {
                write!(f, "{}", requirement.specifier())?;
                if !requirement.raw_comment.is_empty() {
                    write!(f, "  {}", requirement.raw_comment)?;
                }
                Ok(())
            }
            Self::Opaque(text) => f.write_str(text),
        }
    }
}

/// A parsed line together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The 1-based line number in the source file.
    pub line_number: usize,

    /// The file the line was read from.
    pub path: PathBuf,

    /// The parsed content.
    pub line: ParsedLine,
}

impl Record {
    /// Creates a record for a line read from `path`.
    #[must_use]
    pub fn new(line_number: usize, path: &Path, line: ParsedLine) -> Self {
        Self {
            line_number,
            path: path.to_path_buf(),
            line,
        }
    }
}

/// The ordered records of each ingested file, keyed by requirement-set name.
pub type FileTable = BTreeMap<String, Vec<Record>>;
