//! Where the files of each requirement set live.
//!
//! A requirement set `base` is the pair `<source>/base.in` (declaration) and
//! `<target>/base.txt` (locked). The source and target roots are usually the
//! same directory.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::domain::Extensions;

/// Resolves requirement-set names to declaration and locked file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    source_root: PathBuf,
    target_root: PathBuf,
    extensions: Extensions,
}

impl Layout {
    /// Creates a layout with separate source and target roots.
    #[must_use]
    pub const fn new(source_root: PathBuf, target_root: PathBuf, extensions: Extensions) -> Self {
        Self {
            source_root,
            target_root,
            extensions,
        }
    }

    /// Creates a layout where locked files sit next to their declarations.
    #[must_use]
    pub fn in_place(root: PathBuf, extensions: Extensions) -> Self {
        Self::new(root.clone(), root, extensions)
    }

    /// The directory holding declaration files.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// The directory holding locked files.
    #[must_use]
    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// The configured file extensions.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Whether locked files are written somewhere other than the source root.
    #[must_use]
    pub fn is_split(&self) -> bool {
        self.source_root != self.target_root
    }

    /// The declaration file of a set, e.g. `<source>/base.in`.
    #[must_use]
    pub fn declaration_path(&self, set_name: &str) -> PathBuf {
        file_path(&self.source_root, set_name, &self.extensions.declaration)
    }

    /// The locked file of a set, e.g. `<target>/base.txt`.
    #[must_use]
    pub fn locked_path(&self, set_name: &str) -> PathBuf {
        file_path(&self.target_root, set_name, &self.extensions.locked)
    }

    /// A locked file that already exists under the source root.
    ///
    /// When the roots are split this is copied to the target before
    /// compiling, so the compiler can keep existing pins.
    #[must_use]
    pub fn source_locked_path(&self, set_name: &str) -> PathBuf {
        file_path(&self.source_root, set_name, &self.extensions.locked)
    }
}

/// Builds `<directory>/<set_name>.<extension>`.
///
/// Unlike [`Path::with_extension`], any dots already in the set name are kept.
#[must_use]
pub fn file_path(directory: &Path, set_name: &str, extension: &str) -> PathBuf {
    let mut path = directory.join(set_name).into_os_string();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

/// Finds declaration files below `root`, returning their set names relative to
/// the root, sorted.
///
/// Hidden directories (such as `.git` or `.venv`) are skipped.
#[must_use]
pub fn discover_set_names(root: &Path, extension: &str) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension() == Some(OsStr::new(extension)))
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            Some(relative.with_extension("").to_string_lossy().into_owned())
        })
        .collect();
    names.sort();
    names
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}
