use std::{io, path::PathBuf};

/// Reading requirement files.
pub mod ingest;
pub mod layout;
/// Writing canonical locked files.
pub mod regenerate;
mod session;

pub use ingest::ingest;
pub use layout::{Layout, discover_set_names};
pub use regenerate::{GeneratorCredit, regenerate};
pub use session::Session;

/// Errors reading or writing requirement files.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// A requirement file could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A locked file could not be written.
    #[error("failed to write {}", path.display())]
    Write {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A set was regenerated before being ingested.
    #[error("requirement set '{set_name}' has not been ingested")]
    NotIngested {
        /// The requirement-set name.
        set_name: String,
    },
}
