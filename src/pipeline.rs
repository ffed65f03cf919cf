//! The full reconciliation batch: compile, ingest, validate, regenerate.

use std::{fs, io};

use crate::{
    compile::{CompileError, CompileStatus, Compiler},
    domain::{Issue, ValidationReport},
    storage::{FileError, GeneratorCredit, Layout, Session},
};

/// Fatal errors that stop a run before it completes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A requirement file could not be read or written.
    #[error(transparent)]
    File(#[from] FileError),

    /// The compiler could not be started.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The target directory could not be prepared.
    #[error("failed to prepare target for '{set_name}'")]
    Prepare {
        /// The requirement-set name.
        set_name: String,
        /// The underlying I/O error.
        source: io::Error,
    },
}

/// Everything a completed run found.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Sets whose compiler run reported failure.
    pub compile_failures: Vec<(String, CompileStatus)>,
    /// Packages declared twice within one file.
    pub duplicates: Vec<Issue>,
    /// Cross-file version and variant conflicts.
    pub report: ValidationReport,
    /// Sets whose locked file was rewritten.
    pub regenerated: Vec<String>,
    /// The number of distinct packages seen.
    pub packages: usize,
}

impl Outcome {
    /// Whether anything in the run failed.
    ///
    /// Variant conflicts alone never fail a run.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.compile_failures.is_empty() || !self.duplicates.is_empty() || self.report.has_errors()
    }
}

/// Drives a reconciliation run over a list of requirement sets.
#[derive(Debug)]
pub struct Reconciler {
    layout: Layout,
    credit: GeneratorCredit,
    regenerate: bool,
}

impl Reconciler {
    /// Creates a reconciler that rewrites locked files when done.
    #[must_use]
    pub fn new(layout: Layout, credit: GeneratorCredit) -> Self {
        Self {
            layout,
            credit,
            regenerate: true,
        }
    }

    /// Whether to rewrite locked files after validation.
    #[must_use]
    pub const fn regenerate(mut self, regenerate: bool) -> Self {
        self.regenerate = regenerate;
        self
    }

    /// Runs the batch.
    ///
    /// For each set in order, the compiler (if any) runs first, then the
    /// declaration and locked files are ingested. Validation runs once over
    /// all sets, after which every locked file is regenerated. Conflicts and
    /// compiler failures never stop the batch; they are collected in the
    /// returned [`Outcome`].
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or written, or if the
    /// compiler cannot be started.
    pub fn run(
        &self,
        set_names: &[String],
        compiler: Option<&dyn Compiler>,
    ) -> Result<Outcome, Error> {
        let mut session = Session::new(self.layout.clone());
        let mut outcome = Outcome::default();

        for set_name in set_names {
            if let Some(compiler) = compiler {
                self.prepare_target(set_name)?;
                let status = compiler.compile(
                    &self.layout.declaration_path(set_name),
                    &self.layout.locked_path(set_name),
                )?;
                if !status.is_success() {
                    outcome.compile_failures.push((set_name.clone(), status));
                }
            }
            session.ingest_set(set_name)?;
        }

        outcome.duplicates = session.duplicates().to_vec();
        outcome.report = session.validate();
        outcome.packages = session.metadata().len();

        if self.regenerate {
            for set_name in set_names {
                session.regenerate_set(set_name, &self.credit)?;
                outcome.regenerated.push(set_name.clone());
            }
        }

        Ok(outcome)
    }

    /// Creates the target directory and seeds it with the existing locked
    /// file, when locked files are written outside the source root.
    fn prepare_target(&self, set_name: &str) -> Result<(), Error> {
        if !self.layout.is_split() {
            return Ok(());
        }

        let prepare = || -> io::Result<()> {
            let target = self.layout.locked_path(set_name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let existing = self.layout.source_locked_path(set_name);
            if existing.is_file() {
                tracing::info!("Copying {} -> {}", existing.display(), target.display());
                fs::copy(&existing, &target)?;
            }
            Ok(())
        };

        prepare().map_err(|source| Error::Prepare {
            set_name: set_name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::Path};

    use super::*;
    use crate::domain::Extensions;

    /// Writes a canned locked file instead of resolving anything.
    struct FakeCompiler {
        output: &'static str,
        status: CompileStatus,
        calls: RefCell<Vec<String>>,
    }

    impl Compiler for FakeCompiler {
        fn compile(&self, declaration: &Path, locked: &Path) -> Result<CompileStatus, CompileError> {
            self.calls
                .borrow_mut()
                .push(declaration.display().to_string());
            fs::write(locked, self.output).unwrap();
            Ok(self.status)
        }
    }

    #[test]
    fn compiles_each_set_before_ingesting() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("base.in"), "foo  # pinned\n").unwrap();
        let compiler = FakeCompiler {
            output: "#    pip-compile base.in\nfoo==1.0\n",
            status: CompileStatus::Success,
            calls: RefCell::default(),
        };
        let layout = Layout::in_place(tmp.path().to_path_buf(), Extensions::default());

        let outcome = Reconciler::new(layout, GeneratorCredit::default())
            .run(&["base".to_string()], Some(&compiler))
            .unwrap();

        assert!(!outcome.has_errors());
        assert_eq!(compiler.calls.borrow().len(), 1);
        assert_eq!(
            fs::read_to_string(tmp.path().join("base.txt")).unwrap(),
            "#    reqsync  # --help for options\nfoo==1.0  # pinned\n"
        );
    }

    #[test]
    fn compiler_failure_fails_the_run_but_not_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("base.in"), "foo\n").unwrap();
        let compiler = FakeCompiler {
            output: "foo==1.0\n",
            status: CompileStatus::Failed(Some(2)),
            calls: RefCell::default(),
        };
        let layout = Layout::in_place(tmp.path().to_path_buf(), Extensions::default());

        let outcome = Reconciler::new(layout, GeneratorCredit::default())
            .run(&["base".to_string()], Some(&compiler))
            .unwrap();

        assert!(outcome.has_errors());
        assert_eq!(outcome.regenerated, ["base"]);
    }

    #[test]
    fn split_layout_seeds_target_with_existing_locked_file() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("src");
        let target = tmp.path().join("out");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("base.in"), "foo\n").unwrap();
        fs::write(source.join("base.txt"), "foo==0.9\n").unwrap();
        let layout = Layout::new(source, target.clone(), Extensions::default());
        let reconciler = Reconciler::new(layout, GeneratorCredit::default());

        reconciler.prepare_target("base").unwrap();

        assert_eq!(
            fs::read_to_string(target.join("base.txt")).unwrap(),
            "foo==0.9\n"
        );
    }

    #[test]
    fn dry_run_leaves_locked_files_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("base.in"), "foo  # pinned\n").unwrap();
        fs::write(tmp.path().join("base.txt"), "foo==1.0\n").unwrap();
        let layout = Layout::in_place(tmp.path().to_path_buf(), Extensions::default());

        let outcome = Reconciler::new(layout, GeneratorCredit::default())
            .regenerate(false)
            .run(&["base".to_string()], None)
            .unwrap();

        assert!(outcome.regenerated.is_empty());
        assert_eq!(
            fs::read_to_string(tmp.path().join("base.txt")).unwrap(),
            "foo==1.0\n"
        );
    }
}
