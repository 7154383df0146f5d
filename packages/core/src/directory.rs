//! Symbolic root directories.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A symbolic, sandboxed location that relative paths are resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Directory {
    /// User-visible documents.
    Documents,
    /// Private application data.
    Data,
    /// Application support files that are not user-visible.
    Library,
    /// Disposable cached data.
    Cache,
    /// The operating system's temporary directory.
    Temporary,
}

impl Directory {
    pub const ALL: [Directory; 5] = [
        Directory::Documents,
        Directory::Data,
        Directory::Library,
        Directory::Cache,
        Directory::Temporary,
    ];

    /// Wire name, as used in query strings and environment variables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Directory::Documents => "DOCUMENTS",
            Directory::Data => "DATA",
            Directory::Library => "LIBRARY",
            Directory::Cache => "CACHE",
            Directory::Temporary => "TEMPORARY",
        }
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where each `Directory` lives on this machine.
///
/// Directories without an entry cannot be written to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryRoots {
    roots: BTreeMap<Directory, PathBuf>,
}

impl DirectoryRoots {
    /// An empty mapping; only fully-qualified paths resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform defaults, with app-private roots scoped under `app_id`.
    pub fn platform(app_id: &str) -> Self {
        let mut roots = Self::new();
        if let Some(dir) = dirs::document_dir() {
            roots.insert(Directory::Documents, dir);
        }
        if let Some(dir) = dirs::data_dir() {
            roots.insert(Directory::Data, dir.join(app_id));
        }
        if let Some(dir) = dirs::data_local_dir() {
            roots.insert(Directory::Library, dir.join(app_id));
        }
        if let Some(dir) = dirs::cache_dir() {
            roots.insert(Directory::Cache, dir.join(app_id));
        }
        roots.insert(Directory::Temporary, std::env::temp_dir());
        roots
    }

    /// Set (or replace) the root for one directory.
    pub fn with_root(mut self, directory: Directory, root: impl Into<PathBuf>) -> Self {
        self.insert(directory, root.into());
        self
    }

    pub fn insert(&mut self, directory: Directory, root: PathBuf) {
        self.roots.insert(directory, root);
    }

    pub fn get(&self, directory: Directory) -> Option<&Path> {
        self.roots.get(&directory).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Directory, &Path)> {
        self.roots.iter().map(|(d, p)| (*d, p.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_wire_names() {
        for directory in Directory::ALL {
            let json = serde_json::to_value(directory).unwrap();
            assert_eq!(json, serde_json::Value::String(directory.as_str().to_string()));
        }
        let parsed: Directory = serde_json::from_str("\"TEMPORARY\"").unwrap();
        assert_eq!(parsed, Directory::Temporary);
    }

    #[test]
    fn with_root_overrides() {
        let roots = DirectoryRoots::new()
            .with_root(Directory::Data, "/a")
            .with_root(Directory::Data, "/b");
        assert_eq!(roots.get(Directory::Data), Some(Path::new("/b")));
        assert_eq!(roots.get(Directory::Cache), None);
    }

    #[test]
    fn platform_roots_are_app_scoped() {
        let roots = DirectoryRoots::platform("com.example.app");
        assert_eq!(
            roots.get(Directory::Temporary),
            Some(std::env::temp_dir().as_path())
        );
        if let Some(data) = roots.get(Directory::Data) {
            assert!(data.ends_with("com.example.app"));
        }
    }
}
