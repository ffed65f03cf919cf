//! Producing locked files with an external compiler.
//!
//! The reconciliation engine never resolves versions itself. Instead it asks
//! a [`Compiler`] to turn each declaration file into a locked file, and only
//! ingests the locked file once that step has finished.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    io,
    path::Path,
    process::{Command, ExitStatus},
};

/// Turns a declaration file into a locked file.
pub trait Compiler {
    /// Compiles `declaration` into `locked`.
    ///
    /// A compiler that runs but reports failure is not an error: the status
    /// is returned so the caller can fold it into the overall outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the compiler could not be run at all.
    fn compile(&self, declaration: &Path, locked: &Path) -> Result<CompileStatus, CompileError>;
}

/// How a compiler run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    /// The compiler exited successfully.
    Success,
    /// The compiler exited with a non-zero code, or was killed by a signal.
    Failed(Option<i32>),
}

impl CompileStatus {
    /// Whether the compiler succeeded.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ExitStatus> for CompileStatus {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failed(status.code())
        }
    }
}

/// The compiler could not be run.
#[derive(Debug, thiserror::Error)]
#[error("failed to run '{command}'")]
pub struct CompileError {
    command: String,
    source: io::Error,
}

/// Runs `pip-compile` (or a compatible command) as a subprocess.
///
/// The command line is
/// `<program> --output-file <locked> <declaration> <extra args...>`, and the
/// subprocess inherits this process's standard streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipCompile {
    program: String,
    extra_args: Vec<String>,
    environment: BTreeMap<String, String>,
}

impl PipCompile {
    /// Creates a compiler that runs `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            environment: BTreeMap::new(),
        }
    }

    /// Appends arguments passed after the file arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    /// Overrides environment variables for the subprocess.
    #[must_use]
    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment.extend(environment);
        self
    }

    /// The program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments appended after the file arguments.
    #[must_use]
    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    /// The full argument list for compiling `declaration` into `locked`.
    #[must_use]
    pub fn args(&self, declaration: &Path, locked: &Path) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("--output-file"),
            locked.as_os_str().to_os_string(),
            declaration.as_os_str().to_os_string(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

impl Compiler for PipCompile {
    fn compile(&self, declaration: &Path, locked: &Path) -> Result<CompileStatus, CompileError> {
        let args = self.args(declaration, locked);
        tracing::info!("Executing {} {:?}", self.program, args);

        let status = Command::new(&self.program)
            .args(&args)
            .envs(&self.environment)
            .status()
            .map_err(|source| CompileError {
                command: self.program.clone(),
                source,
            })?;

        let status = CompileStatus::from(status);
        if !status.is_success() {
            tracing::warn!(
                "{} exited with {status:?} for {}",
                self.program,
                declaration.display()
            );
        }
        Ok(status)
    }
}
