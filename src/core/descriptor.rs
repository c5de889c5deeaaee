use crate::domain::model::Manifest;
use crate::utils::error::{ManifestError, Result};
use crate::utils::validation::{
    validate_distribution_name, validate_module_path, validate_version, Validate,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

impl Manifest {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ManifestError::ParseError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// `<name>-<version>`, the archive stem and its top-level directory.
    pub fn dist_stem(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

impl Validate for Manifest {
    fn validate(&self) -> Result<()> {
        validate_distribution_name("name", &self.name)?;
        validate_version("version", &self.version)?;

        if self.packages.is_empty() {
            return Err(ManifestError::InvalidField {
                field: "packages".to_string(),
                value: String::new(),
                reason: "At least one package must be listed".to_string(),
            });
        }

        let mut seen_packages = HashSet::new();
        for package in &self.packages {
            validate_module_path("packages", package)?;
            if !seen_packages.insert(package.as_str()) {
                return Err(ManifestError::InvalidField {
                    field: "packages".to_string(),
                    value: package.clone(),
                    reason: "Package listed more than once".to_string(),
                });
            }
        }

        let mut seen_dependencies = HashSet::new();
        for requirement in &self.dependencies {
            if !seen_dependencies.insert(requirement.normalized_name()) {
                return Err(ManifestError::DuplicateDependency {
                    name: requirement.normalized_name(),
                });
            }
        }

        Ok(())
    }
}

/// Directory a dotted package maps to under `root`.
pub fn package_dir(root: &Path, package: &str) -> PathBuf {
    package.split('.').fold(root.to_path_buf(), |dir, seg| dir.join(seg))
}

/// Every declared package must exist as a directory under `root`.
pub fn check_layout(manifest: &Manifest, root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::with_capacity(manifest.packages.len());
    for package in &manifest.packages {
        let dir = package_dir(root, package);
        if !dir.is_dir() {
            return Err(ManifestError::MissingPackage {
                package: package.clone(),
                path: dir.display().to_string(),
            });
        }
        dirs.push(dir);
    }
    Ok(dirs)
}

#[derive(Debug, Clone)]
pub struct DescriptorReport {
    pub manifest: Manifest,
    pub root: PathBuf,
    pub package_dirs: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Full check of a manifest against the tree it describes.
pub fn inspect(manifest: &Manifest, root: &Path) -> Result<DescriptorReport> {
    manifest.validate()?;
    let package_dirs = check_layout(manifest, root)?;

    let mut warnings = Vec::new();
    for (package, dir) in manifest.packages.iter().zip(&package_dirs) {
        if !dir.join("__init__.py").is_file() {
            warnings.push(format!(
                "package '{}' has no __init__.py and will be treated as a namespace package",
                package
            ));
        }
    }
    for requirement in manifest.dependencies.iter().filter(|r| !r.is_pinned()) {
        warnings.push(format!(
            "dependency '{}' has no version specifier",
            requirement.name
        ));
    }

    for warning in &warnings {
        tracing::warn!("⚠️ {}", warning);
    }

    Ok(DescriptorReport {
        manifest: manifest.clone(),
        root: root.to_path_buf(),
        package_dirs,
        warnings,
    })
}
