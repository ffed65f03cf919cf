//! Rewriting locked files from their ingested records.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{
    TOOL_NAME,
    domain::{FileTable, MetadataTable, ParsedLine, Record, Requirement},
    storage::{FileError, layout::file_path},
};

/// Recognizes the compiler's "generated by" comment and credits this tool
/// instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCredit {
    signature: String,
    replacement: String,
}

impl GeneratorCredit {
    /// Matches lines of the form `#    <compile_command> ...`.
    #[must_use]
    pub fn new(compile_command: &str) -> Self {
        Self {
            signature: format!("#    {compile_command} "),
            replacement: format!("#    {TOOL_NAME}  # --help for options"),
        }
    }

    /// The canonical credit line.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    fn apply<'a>(&'a self, text: &'a str) -> &'a str {
        if text.starts_with(&self.signature) {
            &self.replacement
        } else {
            text
        }
    }
}

impl Default for GeneratorCredit {
    fn default() -> Self {
        Self::new("pip-compile")
    }
}

/// Overwrites `<directory>/<set_name>.<extension>` with the canonical form of
/// the records ingested for `set_name`.
///
/// # Errors
///
/// Returns an error if the set was never ingested or the file cannot be
/// written.
pub fn regenerate(
    directory: &Path,
    set_name: &str,
    extension: &str,
    files: &FileTable,
    metadata: &MetadataTable,
    credit: &GeneratorCredit,
) -> Result<(), FileError> {
    let path = file_path(directory, set_name, extension);
    tracing::info!("Regenerating {}", path.display());

    let records = files.get(set_name).ok_or_else(|| FileError::NotIngested {
        set_name: set_name.to_string(),
    })?;

    let write = || -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&path)?);
        write_records(&mut writer, records, metadata, credit)?;
        writer.flush()
    };

    write().map_err(|source| FileError::Write {
        path: path.clone(),
        source,
    })
}

/// Writes one canonical line per record, each terminated by `\n`.
pub(crate) fn write_records<W: Write>(
    writer: &mut W,
    records: &[Record],
    metadata: &MetadataTable,
    credit: &GeneratorCredit,
) -> io::Result<()> {
    for record in records {
        writeln!(writer, "{}", render(&record.line, metadata, credit))?;
    }
    Ok(())
}

/// Renders a single parsed line in canonical form.
///
/// Requirement lines carry their own comment, as written, followed by the
/// package's deduplicated declaration-file comments.
#[must_use]
pub fn render(line: &ParsedLine, metadata: &MetadataTable, credit: &GeneratorCredit) -> String {
    match line {
        ParsedLine::Opaque(text) => credit.apply(text).to_string(),
        ParsedLine::Requirement(requirement) => {
            let inherited = metadata
                .get(&requirement.name)
                .map_or(&[][..], |package| package.trimmed_input_comments());
            render_requirement(requirement, inherited)
        }
    }
}

fn render_requirement(requirement: &Requirement, inherited: &[String]) -> String {
    let comments: Vec<String> = std::iter::once(requirement.raw_comment.clone())
        .filter(|comment| !comment.is_empty())
        .chain(inherited.iter().map(|comment| format!("# {comment}")))
        .collect();

    let specifier = requirement.specifier();
    if comments.is_empty() {
        specifier
    } else {
        format!("{specifier}  {}", comments.join("  "))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::*;
    use crate::domain::{Extensions, validate};

    fn regenerate_text(declaration: &str, locked: &str) -> String {
        let mut metadata = MetadataTable::new();
        crate::storage::ingest::read_records(
            declaration.as_bytes(),
            Path::new("base.in"),
            &mut metadata,
        )
        .unwrap();
        let (records, _) = crate::storage::ingest::read_records(
            locked.as_bytes(),
            Path::new("base.txt"),
            &mut metadata,
        )
        .unwrap();
        validate(&mut metadata, &Extensions::default());

        let mut output = Vec::new();
        write_records(&mut output, &records, &metadata, &GeneratorCredit::default()).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn declaration_comments_are_carried_into_locked_file() {
        let output = regenerate_text("foo==1.2.3  # pinned\n", "foo==1.2.3\n");

        assert_eq!(output, "foo==1.2.3  # pinned\n");
    }

    #[test]
    fn own_comment_comes_before_inherited_comments() {
        let output = regenerate_text(
            "foo  # retry logic\n",
            "foo[fast]==2.0  # via bar\n",
        );

        assert_eq!(output, "foo[fast]==2.0  # via bar  # retry logic\n");
    }

    #[test]
    fn own_comment_is_written_as_is() {
        let output = regenerate_text(
            "foo  #retry logic\n",
            "foo==1.0  #pinned\npkg[a][b]==1.0  ## double\n",
        );

        assert_eq!(
            output,
            "foo==1.0  #pinned  # retry logic\npkg[a][b]==1.0  ## double\n"
        );
    }

    #[test]
    fn canonical_locked_file_round_trips() {
        let locked = "\
#
# This file is autogenerated
#
--index-url https://pypi.example.com/simple

certifi==2024.2.2
requests[socks]==2.31.0  # pinned upstream
urllib3==2.2.1
# via requests
";

        assert_eq!(regenerate_text("", locked), locked);
    }

    #[test]
    fn opaque_lines_are_trimmed() {
        let output = regenerate_text("", "urllib3==2.2.1\n    # via requests\n");

        assert_eq!(output, "urllib3==2.2.1\n# via requests\n");
    }

    #[test]
    fn compiler_credit_line_is_rewritten() {
        let locked = "#    pip-compile --output-file=base.txt base.in\nfoo==1.0\n";

        let output = regenerate_text("", locked);

        assert_eq!(output, "#    reqsync  # --help for options\nfoo==1.0\n");
    }

    #[test]
    fn other_comment_lines_are_not_rewritten() {
        let credit = GeneratorCredit::new("pip-compile");
        let metadata = MetadataTable::new();

        for text in ["# pip-compile base.in", "#    pip-compile", "#    uv pip compile x"] {
            let line = ParsedLine::Opaque(text.to_string());
            assert_eq!(render(&line, &metadata, &credit), text);
        }
    }

    #[test]
    fn regenerate_overwrites_target_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("base.txt");
        fs::write(&path, "stale contents\nthat will be replaced\n").unwrap();

        let mut files = FileTable::new();
        files.insert(
            "base".to_string(),
            vec![Record::new(1, &path, ParsedLine::parse("foo==1.0"))],
        );

        regenerate(
            tmp.path(),
            "base",
            "txt",
            &files,
            &MetadataTable::new(),
            &GeneratorCredit::default(),
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "foo==1.0\n");
    }

    #[test]
    fn regenerating_unknown_set_fails() {
        let result = regenerate(
            &PathBuf::from("."),
            "unknown",
            "txt",
            &FileTable::new(),
            &MetadataTable::new(),
            &GeneratorCredit::default(),
        );

        assert!(matches!(result, Err(FileError::NotIngested { .. })));
    }
}
