use crate::config::cli::LocalStorage;
use crate::core::descriptor::check_layout;
use crate::domain::model::{Artifact, Bundle, FileEntry, Manifest};
use crate::domain::ports::{Packager, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::{FileOptions, ZipWriter};

/// Extensions counted as code; everything else is package data.
pub const CODE_EXTENSIONS: &[&str] = &["py"];

const SKIPPED_DIRS: &[&str] = &["__pycache__"];
const SKIPPED_EXTENSIONS: &[&str] = &["pyc", "pyo"];

/// Builds a zip distribution from the package directories a manifest declares.
pub struct DistPipeline<S: Storage> {
    manifest: Manifest,
    root: PathBuf,
    source: LocalStorage,
    output: S,
}

impl<S: Storage> DistPipeline<S> {
    pub fn new(manifest: Manifest, root: impl Into<PathBuf>, output: S) -> Self {
        let root = root.into();
        Self {
            manifest,
            source: LocalStorage::new(root.display().to_string()),
            root,
            output,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.manifest.dist_stem())
    }

    fn relative(&self, path: &Path) -> Result<String> {
        let rel = path
            .strip_prefix(&self.root)
            .map_err(|e| std::io::Error::other(format!("{}: {}", path.display(), e)))?;
        Ok(rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }

    fn wants_file(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if SKIPPED_EXTENSIONS.contains(&ext) {
            return false;
        }
        CODE_EXTENSIONS.contains(&ext) || self.manifest.include_package_data
    }

    /// Files of one package directory. Nested directories that are packages
    /// themselves belong to their own manifest entry and are not descended into.
    /// Symlinks are followed; a broken link or unreadable directory fails the walk.
    fn package_files(&self, dir: &Path) -> Result<(Vec<PathBuf>, usize)> {
        let mut files = Vec::new();
        let mut skipped = 0;

        let walker = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !SKIPPED_DIRS.contains(&&*name) && !e.path().join("__init__.py").is_file()
            });

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path_is_symlink() {
                tracing::debug!("  following link {}", entry.path().display());
            }
            if self.wants_file(entry.path()) {
                files.push(entry.into_path());
            } else {
                skipped += 1;
            }
        }
        Ok((files, skipped))
    }

    fn pkg_info(&self) -> String {
        let mut info = format!(
            "Metadata-Version: 2.1\nName: {}\nVersion: {}\n",
            self.manifest.name, self.manifest.version
        );
        for requirement in &self.manifest.dependencies {
            info.push_str(&format!("Requires-Dist: {}\n", requirement));
        }
        info
    }
}

#[async_trait]
impl<S: Storage> Packager for DistPipeline<S> {
    async fn collect(&self) -> Result<Bundle> {
        tracing::info!(
            "📂 Collecting {} package(s) from {}",
            self.manifest.packages.len(),
            self.root.display()
        );
        let dirs = check_layout(&self.manifest, &self.root)?;

        let mut entries = Vec::new();
        let mut skipped = 0;
        for dir in dirs {
            let (files, dir_skipped) = self.package_files(&dir)?;
            skipped += dir_skipped;
            for path in files {
                let archive_path = self.relative(&path)?;
                let contents = self.source.read_file(&archive_path).await?;
                tracing::debug!("  + {} ({} bytes)", archive_path, contents.len());
                entries.push(FileEntry {
                    archive_path,
                    contents,
                });
            }
        }

        if !self.manifest.include_package_data && skipped > 0 {
            tracing::info!(
                "🗂️ Skipped {} data file(s); set include_package_data to bundle them",
                skipped
            );
        }
        Ok(Bundle { entries, skipped })
    }

    async fn assemble(&self, bundle: Bundle) -> Result<Bundle> {
        let stem = self.manifest.dist_stem();

        // BTreeMap keeps archive order stable and drops repeats
        let mut by_path: BTreeMap<String, Vec<u8>> = bundle
            .entries
            .into_iter()
            .map(|e| (format!("{}/{}", stem, e.archive_path), e.contents))
            .collect();
        by_path.insert(format!("{}/PKG-INFO", stem), self.pkg_info().into_bytes());

        let entries = by_path
            .into_iter()
            .map(|(archive_path, contents)| FileEntry {
                archive_path,
                contents,
            })
            .collect::<Vec<_>>();

        tracing::info!("🔧 Assembled {} archive entries", entries.len());
        Ok(Bundle {
            entries,
            skipped: bundle.skipped,
        })
    }

    async fn write(&self, bundle: Bundle) -> Result<Artifact> {
        let file_name = self.archive_name();

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for entry in &bundle.entries {
                zip.start_file::<_, ()>(entry.archive_path.as_str(), FileOptions::default())?;
                zip.write_all(&entry.contents)?;
            }
            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        self.output.write_file(&file_name, &zip_data).await?;
        let path = self.output.location(&file_name);
        tracing::info!("💾 Wrote {} ({} bytes)", path, zip_data.len());

        Ok(Artifact {
            file_name,
            path,
            files: bundle.entries.into_iter().map(|e| e.archive_path).collect(),
            size_bytes: zip_data.len() as u64,
            built_at: chrono::Utc::now(),
        })
    }
}
