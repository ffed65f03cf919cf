//! Reading requirement files into the file and metadata tables.

use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{
    domain::{FileTable, Issue, MetadataTable, ParsedLine, Record},
    storage::{FileError, layout::file_path},
};

/// Reads `<directory>/<set_name>.<extension>` into `files[set_name]` and
/// folds every requirement it declares into `metadata`.
///
/// Returns the duplicate-requirement issues found in the file. Duplicates are
/// still recorded in both tables.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn ingest(
    directory: &Path,
    set_name: &str,
    extension: &str,
    files: &mut FileTable,
    metadata: &mut MetadataTable,
) -> Result<Vec<Issue>, FileError> {
    let path = file_path(directory, set_name, extension);
    tracing::info!("Parsing {}", path.display());

    let file = File::open(&path).map_err(|source| FileError::Read {
        path: path.clone(),
        source,
    })?;

    let (records, duplicates) =
        read_records(BufReader::new(file), &path, metadata).map_err(|source| {
            FileError::Read {
                path: path.clone(),
                source,
            }
        })?;

    files.insert(set_name.to_string(), records);
    Ok(duplicates)
}

/// Parses every line of `reader`, attributing records to `path`.
pub(crate) fn read_records<R: BufRead>(
    reader: R,
    path: &Path,
    metadata: &mut MetadataTable,
) -> std::io::Result<(Vec<Record>, Vec<Issue>)> {
    let mut records = Vec::new();
    let mut duplicates = Vec::new();
    let mut seen = HashSet::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let parsed = ParsedLine::parse(&line?);

        if let ParsedLine::Requirement(requirement) = &parsed {
            if !seen.insert(requirement.name.clone()) {
                let issue = Issue::DuplicateRequirementInFile {
                    name: requirement.name.clone(),
                    path: path.to_path_buf(),
                    line_number,
                };
                tracing::debug!("{issue}");
                duplicates.push(issue);
            }
            metadata.record(requirement, line_number, path);
        }

        records.push(Record::new(line_number, path, parsed));
    }

    Ok((records, duplicates))
}
