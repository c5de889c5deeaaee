use crate::domain::model::Manifest;
use crate::utils::error::{ManifestError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_MANIFEST_FILE: &str = "pkgdesc.toml";
pub const PROFILE_ENV_VAR: &str = "PKGDESC_PROFILE";

/// 清單檔案：一個或多個互斥的 profile，每次只選用其中一個
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    pub profiles: BTreeMap<String, Manifest>,
}

/// How a profile ended up selected, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Flag,
    Environment,
    Default,
    OnlyProfile,
}

#[derive(Debug, Clone, Copy)]
pub struct SelectedProfile<'a> {
    pub name: &'a str,
    pub manifest: &'a Manifest,
    pub source: SelectionSource,
}

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"))
}

impl ManifestFile {
    /// 從 TOML 檔案載入清單
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ManifestError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析清單
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        let file: Self =
            toml::from_str(&processed_content).map_err(|e| ManifestError::ParseError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        if file.profiles.is_empty() {
            return Err(ManifestError::ParseError {
                field: "profiles".to_string(),
                message: "at least one [profiles.<name>] table is required".to_string(),
            });
        }

        Ok(file)
    }

    /// 替換環境變數 (例如 ${APP_NAME})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_re()
            .replace_all(content, |caps: &regex::Captures<'_>| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    fn available(&self) -> String {
        self.profile_names().join(", ")
    }

    /// Picks the profile: explicit request, then `PKGDESC_PROFILE`, then
    /// `default_profile`, then the only profile if there is just one.
    pub fn select(&self, requested: Option<&str>) -> Result<SelectedProfile<'_>> {
        let from_env = std::env::var(PROFILE_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty());
        self.select_with_env(requested, from_env.as_deref())
    }

    pub fn select_with_env(
        &self,
        requested: Option<&str>,
        from_env: Option<&str>,
    ) -> Result<SelectedProfile<'_>> {
        let (wanted, source) = if let Some(name) = requested {
            (name, SelectionSource::Flag)
        } else if let Some(name) = from_env {
            (name, SelectionSource::Environment)
        } else if let Some(name) = self.default_profile.as_deref() {
            (name, SelectionSource::Default)
        } else if self.profiles.len() == 1 {
            let (name, manifest) = self
                .profiles
                .iter()
                .next()
                .ok_or_else(|| ManifestError::ProfileNotSelected {
                    available: self.available(),
                })?;
            return Ok(SelectedProfile {
                name,
                manifest,
                source: SelectionSource::OnlyProfile,
            });
        } else {
            return Err(ManifestError::ProfileNotSelected {
                available: self.available(),
            });
        };

        let (name, manifest) =
            self.profiles
                .get_key_value(wanted)
                .ok_or_else(|| ManifestError::UnknownProfile {
                    name: wanted.to_string(),
                    available: self.available(),
                })?;

        tracing::debug!("Selected profile '{}' via {:?}", name, source);
        Ok(SelectedProfile {
            name,
            manifest,
            source,
        })
    }
}

impl Validate for ManifestFile {
    /// Every profile must be valid on its own; they are never merged.
    fn validate(&self) -> Result<()> {
        if let Some(default) = &self.default_profile {
            if !self.profiles.contains_key(default) {
                return Err(ManifestError::UnknownProfile {
                    name: default.clone(),
                    available: self.available(),
                });
            }
        }
        for manifest in self.profiles.values() {
            manifest.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_PROFILES: &str = r#"
default_profile = "paralympic_app"

[profiles.paralympic_app]
name = "paralympic_app"
packages = ["paralympic_app"]
include_package_data = true
dependencies = ["flask", "flask-sqlalchemy"]

[profiles.iris_app]
name = "iris_app"
packages = ["iris_app"]
include_package_data = true
dependencies = ["flask", "pandas", "sklearn"]
"#;

    #[test]
    fn test_parse_profiles() {
        let file = ManifestFile::from_toml_str(TWO_PROFILES).unwrap();

        assert_eq!(file.profile_names(), vec!["iris_app", "paralympic_app"]);
        let paralympic = &file.profiles["paralympic_app"];
        assert_eq!(paralympic.packages, vec!["paralympic_app"]);
        assert!(paralympic.include_package_data);
        assert_eq!(paralympic.version, "0.0.0");
        assert_eq!(paralympic.dependencies.len(), 2);
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_selection_order() {
        let file = ManifestFile::from_toml_str(TWO_PROFILES).unwrap();

        let selected = file.select_with_env(None, None).unwrap();
        assert_eq!(selected.name, "paralympic_app");
        assert_eq!(selected.source, SelectionSource::Default);

        let selected = file.select_with_env(None, Some("iris_app")).unwrap();
        assert_eq!(selected.name, "iris_app");
        assert_eq!(selected.source, SelectionSource::Environment);

        let selected = file
            .select_with_env(Some("paralympic_app"), Some("iris_app"))
            .unwrap();
        assert_eq!(selected.name, "paralympic_app");
        assert_eq!(selected.source, SelectionSource::Flag);
    }

    #[test]
    fn test_unknown_profile_lists_available() {
        let file = ManifestFile::from_toml_str(TWO_PROFILES).unwrap();
        match file.select_with_env(Some("mnist_app"), None) {
            Err(ManifestError::UnknownProfile { name, available }) => {
                assert_eq!(name, "mnist_app");
                assert_eq!(available, "iris_app, paralympic_app");
            }
            other => panic!("unexpected: {:?}", other.map(|s| s.name)),
        }
    }

    #[test]
    fn test_single_profile_needs_no_default() {
        let file = ManifestFile::from_toml_str(
            r#"
[profiles.only]
name = "only"
packages = ["only"]
"#,
        )
        .unwrap();
        let selected = file.select_with_env(None, None).unwrap();
        assert_eq!(selected.name, "only");
        assert_eq!(selected.source, SelectionSource::OnlyProfile);
        assert!(!selected.manifest.include_package_data);
    }

    #[test]
    fn test_ambiguous_without_default() {
        let content = TWO_PROFILES.replace("default_profile = \"paralympic_app\"", "");
        let file = ManifestFile::from_toml_str(&content).unwrap();
        assert!(matches!(
            file.select_with_env(None, None),
            Err(ManifestError::ProfileNotSelected { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_unknown_fields() {
        assert!(ManifestFile::from_toml_str("[profiles]\n").is_err());
        assert!(ManifestFile::from_toml_str(
            r#"
[profiles.a]
name = "a"
packages = ["a"]
install_requires = ["flask"]
"#
        )
        .is_err());
    }

    #[test]
    fn test_dangling_default_fails_validation() {
        let content = TWO_PROFILES.replace(
            "default_profile = \"paralympic_app\"",
            "default_profile = \"gone\"",
        );
        let file = ManifestFile::from_toml_str(&content).unwrap();
        assert!(matches!(
            file.validate(),
            Err(ManifestError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PKGDESC_TEST_APP_NAME", "paralympic_app");

        let file = ManifestFile::from_toml_str(
            r#"
[profiles.app]
name = "${PKGDESC_TEST_APP_NAME}"
packages = ["${PKGDESC_TEST_APP_NAME}"]
dependencies = ["${PKGDESC_TEST_UNSET_VAR}"]
"#,
        );
        std::env::remove_var("PKGDESC_TEST_APP_NAME");

        // unset variables stay verbatim and then fail requirement parsing
        assert!(file.is_err());

        std::env::set_var("PKGDESC_TEST_APP_NAME2", "paralympic_app");
        let file = ManifestFile::from_toml_str(
            r#"
[profiles.app]
name = "${PKGDESC_TEST_APP_NAME2}"
packages = ["${PKGDESC_TEST_APP_NAME2}"]
"#,
        )
        .unwrap();
        std::env::remove_var("PKGDESC_TEST_APP_NAME2");
        assert_eq!(file.profiles["app"].name, "paralympic_app");
    }

    #[test]
    fn test_file_round_trip() {
        let file = ManifestFile::from_toml_str(TWO_PROFILES).unwrap();
        let serialized = file.to_toml_string().unwrap();
        let reparsed = ManifestFile::from_toml_str(&serialized).unwrap();
        assert_eq!(file, reparsed);
    }

    #[test]
    fn test_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(TWO_PROFILES.as_bytes()).unwrap();

        let file = ManifestFile::from_file(temp_file.path()).unwrap();
        assert_eq!(file.profiles.len(), 2);
    }
}
