use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_VERSION: &str = "0.0.0";

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// A single distributable unit: what gets bundled and what it needs at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub packages: Vec<String>,
    #[serde(default)]
    pub include_package_data: bool,
    #[serde(default)]
    pub dependencies: Vec<Requirement>,
}

/// A runtime dependency, `name[extras] specifier ; marker`.
///
/// Serialized as its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    pub specifier: Option<String>,
    pub marker: Option<String>,
}

/// One file that will be placed in the distribution archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path inside the archive, relative to the distribution root, `/`-separated.
    pub archive_path: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Bundle {
    pub entries: Vec<FileEntry>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub file_name: String,
    pub path: String,
    pub files: Vec<String>,
    pub size_bytes: u64,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub resolved: Vec<String>,
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
