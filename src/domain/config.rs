use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::metadata::Extensions;

/// Configuration for reconciling a project's requirement sets.
///
/// Stored as TOML in `.reqsync.toml` at the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The requirement sets to reconcile.
    ///
    /// Entries may be bare set names (`base`) or file names (`base.in`);
    /// see [`Config::set_names`].
    requirements: Vec<String>,

    /// Package index URL handed to the compiler as `--index-url`.
    pub index_url: Option<String>,

    /// Alternative output root for locked files.
    ///
    /// Only used when the alternative target is requested on the command
    /// line; otherwise locked files are written next to their declarations.
    pub target_root: Option<PathBuf>,

    /// The command that compiles a declaration file into a locked file.
    compile_command: String,

    /// Environment overrides applied when running the compiler.
    environment: BTreeMap<String, String>,

    /// Extension of declaration files.
    declaration_extension: String,

    /// Extension of locked files.
    locked_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            requirements: Vec::new(),
            index_url: None,
            target_root: None,
            compile_command: default_compile_command(),
            environment: default_environment(),
            declaration_extension: default_declaration_extension(),
            locked_extension: default_locked_extension(),
        }
    }
}

impl Config {
    /// The file name of the configuration file, relative to the project root.
    pub const FILE_NAME: &'static str = ".reqsync.toml";

    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The raw `requirements` entries, as configured.
    #[must_use]
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Replaces the configured requirement entries.
    pub fn set_requirements(&mut self, requirements: Vec<String>) {
        self.requirements = requirements;
    }

    /// The requirement-set names.
    ///
    /// A declaration or locked extension is stripped and repeated names are
    /// dropped, keeping the first occurrence, so `["base.in", "base.txt",
    /// "dev"]` yields `["base", "dev"]`. Other dots are part of the name:
    /// `py3.11` stays `py3.11`.
    #[must_use]
    pub fn set_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.requirements {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let name = [&self.declaration_extension, &self.locked_extension]
                .into_iter()
                .find_map(|extension| {
                    entry
                        .strip_suffix(extension.as_str())
                        .and_then(|stem| stem.strip_suffix('.'))
                })
                .unwrap_or(entry)
                .to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// The compiler command.
    #[must_use]
    pub fn compile_command(&self) -> &str {
        &self.compile_command
    }

    /// Environment overrides for the compiler.
    #[must_use]
    pub const fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// The declaration and locked file extensions.
    #[must_use]
    pub fn extensions(&self) -> Extensions {
        Extensions {
            declaration: self.declaration_extension.clone(),
            locked: self.locked_extension.clone(),
        }
    }
}

fn default_compile_command() -> String {
    "pip-compile".to_string()
}

fn default_environment() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("LANG".to_string(), "C.UTF-8".to_string()),
        ("LC_ALL".to_string(), "C.UTF-8".to_string()),
    ])
}

fn default_declaration_extension() -> String {
    "in".to_string()
}

fn default_locked_extension() -> String {
    "txt".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        requirements: Vec<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        index_url: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_root: Option<PathBuf>,

        #[serde(default = "default_compile_command")]
        compile_command: String,

        #[serde(default = "default_environment")]
        environment: BTreeMap<String, String>,

        #[serde(default = "default_declaration_extension")]
        declaration_extension: String,

        #[serde(default = "default_locked_extension")]
        locked_extension: String,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                requirements,
                index_url,
                target_root,
                compile_command,
                environment,
                declaration_extension,
                locked_extension,
            } => Self {
                requirements,
                index_url,
                target_root,
                compile_command,
                environment,
                declaration_extension,
                locked_extension,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        let Config {
            requirements,
            index_url,
            target_root,
            compile_command,
            environment,
            declaration_extension,
            locked_extension,
        } = config;
        Self::V1 {
            requirements,
            index_url,
            target_root,
            compile_command,
            environment,
            declaration_extension,
            locked_extension,
        }
    }
}
