use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Registry request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("Manifest parse error in {field}: {message}")]
    ParseError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate dependency: {name}")]
    DuplicateDependency { name: String },

    #[error("Declared package '{package}' not found at {path}")]
    MissingPackage { package: String, path: String },

    #[error("Unknown profile '{name}' (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("No profile selected and no default_profile set (available: {available})")]
    ProfileNotSelected { available: String },

    #[error("Registry returned unexpected status {status} for {name}")]
    RegistryError { name: String, status: u16 },

    #[error("Unresolved dependencies: {}", .names.join(", "))]
    UnresolvedDependencies { names: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ManifestError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Manifest,
    Layout,
    Registry,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ManifestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ManifestError::ParseError { .. }
            | ManifestError::InvalidField { .. }
            | ManifestError::DuplicateDependency { .. }
            | ManifestError::UnknownProfile { .. }
            | ManifestError::ProfileNotSelected { .. }
            | ManifestError::TomlSerializeError(_)
            | ManifestError::SerializationError(_) => ErrorCategory::Manifest,
            ManifestError::MissingPackage { .. } => ErrorCategory::Layout,
            ManifestError::HttpError(_)
            | ManifestError::RegistryError { .. }
            | ManifestError::UnresolvedDependencies { .. } => ErrorCategory::Registry,
            ManifestError::IoError(_) | ManifestError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Manifest | ErrorCategory::Layout => ErrorSeverity::High,
            ErrorCategory::Registry => match self {
                // 依賴無法解析屬於清單內容問題
                ManifestError::UnresolvedDependencies { .. } => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ManifestError::ParseError { .. } => {
                "Check the manifest file is valid TOML with a [profiles.<name>] table".to_string()
            }
            ManifestError::InvalidField { field, .. } => {
                format!("Fix the value of '{}' in the selected profile", field)
            }
            ManifestError::DuplicateDependency { name } => {
                format!("Remove the repeated entry for '{}' from dependencies", name)
            }
            ManifestError::MissingPackage { package, .. } => format!(
                "Create the package directory for '{}' or remove it from packages (check --root)",
                package
            ),
            ManifestError::UnknownProfile { available, .. }
            | ManifestError::ProfileNotSelected { available } => format!(
                "Pass --profile or set PKGDESC_PROFILE to one of: {}",
                available
            ),
            ManifestError::HttpError(_) | ManifestError::RegistryError { .. } => {
                "Check network access or point --registry-url at a reachable index".to_string()
            }
            ManifestError::UnresolvedDependencies { .. } => {
                "Check the spelling of the dependency names against the registry".to_string()
            }
            ManifestError::IoError(_) | ManifestError::ZipError(_) => {
                "Check file permissions and available disk space".to_string()
            }
            ManifestError::SerializationError(_) | ManifestError::TomlSerializeError(_) => {
                "Report this as a bug together with the manifest file".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Manifest => format!("Manifest is invalid: {}", self),
            ErrorCategory::Layout => format!("Package layout does not match manifest: {}", self),
            ErrorCategory::Registry => format!("Dependency resolution failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// 依嚴重程度決定 CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}
