//! Static asset suffix list.
//!
//! The list lives in a plain text file, one suffix per line. It is read once at
//! startup into an [`ExtensionSet`] which is never mutated afterwards.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Suffixes written when the list file does not exist yet.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".jpg", ".jpeg", ".png", ".svg", ".webp", ".html", ".htm", ".txt", ".md",
    ".pdf",
];

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("failed to create extension list {path}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("failed to read extension list {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

/// Immutable set of file suffixes that mark a request path as a static asset.
#[derive(Debug, Clone, Default)]
pub struct ExtensionSet {
    suffixes: HashSet<String>,
}

impl ExtensionSet {
    /// Build a set from an iterator of suffixes. Empty entries are skipped.
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(Into::into)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Load the suffix list from `path`, writing the default list first if
    /// the file is missing.
    pub fn load_or_bootstrap(path: &Path) -> Result<Self, ExtensionError> {
        if !path.exists() {
            write_default_list(path)?;
            tracing::info!(path = %path.display(), "Created default static extension list");
        }

        let content = fs::read_to_string(path).map_err(|source| ExtensionError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::parse(&content))
    }

    /// Parse list content: one suffix per line, blank lines ignored.
    pub fn parse(content: &str) -> Self {
        Self::new(content.lines().map(|line| line.trim_end_matches('\r')))
    }

    /// True iff `path` ends with one of the suffixes. Case-sensitive.
    pub fn is_static_asset(&self, path: &str) -> bool {
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }

    pub fn len(&self) -> usize {
        self.suffixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }
}

fn write_default_list(path: &Path) -> Result<(), ExtensionError> {
    let mut content = String::new();
    for ext in DEFAULT_EXTENSIONS {
        content.push_str(ext);
        content.push('\n');
    }
    fs::write(path, content).map_err(|source| ExtensionError::Create {
        path: path.to_path_buf(),
        source,
    })
}
