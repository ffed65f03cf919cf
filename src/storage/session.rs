//! A single reconciliation run.
//!
//! The [`Session`] owns everything one run accumulates: the records of every
//! declaration and locked file, the cross-file metadata table, and the
//! duplicate issues found while ingesting. Nothing outlives the session, so
//! separate runs cannot observe each other's state.

use crate::{
    domain::{FileTable, Issue, MetadataTable, ValidationReport, validate},
    storage::{FileError, GeneratorCredit, Layout, ingest, regenerate},
};

/// The state of one ingest, validate, regenerate run.
#[derive(Debug)]
pub struct Session {
    layout: Layout,
    declarations: FileTable,
    locked: FileTable,
    metadata: MetadataTable,
    duplicates: Vec<Issue>,
}

impl Session {
    /// Starts an empty session over the given layout.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            declarations: FileTable::new(),
            locked: FileTable::new(),
            metadata: MetadataTable::new(),
            duplicates: Vec::new(),
        }
    }

    /// Ingests the declaration file and then the locked file of a set.
    ///
    /// Returns `true` if either file declares a package more than once.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read.
    pub fn ingest_set(&mut self, set_name: &str) -> Result<bool, FileError> {
        let extensions = self.layout.extensions().clone();

        let mut duplicates = ingest(
            self.layout.source_root(),
            set_name,
            &extensions.declaration,
            &mut self.declarations,
            &mut self.metadata,
        )?;
        duplicates.extend(ingest(
            self.layout.target_root(),
            set_name,
            &extensions.locked,
            &mut self.locked,
            &mut self.metadata,
        )?);

        let found = !duplicates.is_empty();
        self.duplicates.extend(duplicates);
        Ok(found)
    }

    /// Validates everything ingested so far.
    ///
    /// This also computes the comments that regeneration carries forward, so
    /// it must run before [`Session::regenerate_set`].
    pub fn validate(&mut self) -> ValidationReport {
        validate(&mut self.metadata, self.layout.extensions())
    }

    /// Rewrites the locked file of a set.
    ///
    /// # Errors
    ///
    /// Returns an error if the set was not ingested or its locked file cannot
    /// be written.
    pub fn regenerate_set(&self, set_name: &str, credit: &GeneratorCredit) -> Result<(), FileError> {
        regenerate(
            self.layout.target_root(),
            set_name,
            &self.layout.extensions().locked,
            &self.locked,
            &self.metadata,
            credit,
        )
    }

    /// The layout this session reads from and writes to.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The aggregated package metadata.
    #[must_use]
    pub const fn metadata(&self) -> &MetadataTable {
        &self.metadata
    }

    /// Records of every ingested declaration file.
    #[must_use]
    pub const fn declarations(&self) -> &FileTable {
        &self.declarations
    }

    /// Records of every ingested locked file.
    #[must_use]
    pub const fn locked(&self) -> &FileTable {
        &self.locked
    }

    /// Duplicate requirements found while ingesting.
    #[must_use]
    pub fn duplicates(&self) -> &[Issue] {
        &self.duplicates
    }
}
