use crate::utils::error::{ManifestError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> ManifestError {
    ManifestError::InvalidField {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn distribution_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("valid regex")
    })
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9.+!_-]*[A-Za-z0-9])?$").expect("valid regex")
    })
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

/// PEP 503 normalization: lowercase, runs of `-`, `_` and `.` become a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
                in_separator = true;
            }
        } else {
            out.push(ch.to_ascii_lowercase());
            in_separator = false;
        }
    }
    out
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, url_str, format!("Invalid URL format: {}", e))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            &value.to_string(),
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Distribution and dependency names: alphanumeric at both ends, `.`, `_`, `-` inside.
pub fn validate_distribution_name(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    if value.contains(['/', '\\', '\0']) {
        return Err(invalid(
            field_name,
            value,
            "Name cannot contain path separators",
        ));
    }

    if !distribution_name_re().is_match(value) {
        return Err(invalid(
            field_name,
            value,
            "Name must start and end with a letter or digit and contain only letters, digits, '.', '_' or '-'",
        ));
    }
    Ok(())
}

/// Release version in PEP 440 characters. It ends up in file names and
/// `PKG-INFO` headers, so separators and whitespace are rejected.
pub fn validate_version(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    if !version_re().is_match(value) {
        return Err(invalid(
            field_name,
            value,
            "Version must start and end with a letter or digit and contain only letters, digits, '.', '+', '!', '_' or '-'",
        ));
    }
    Ok(())
}

/// Dotted module path such as `paralympic_app.views`.
pub fn validate_module_path(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    for segment in value.split('.') {
        if !identifier_re().is_match(segment) {
            return Err(invalid(
                field_name,
                value,
                format!("'{}' is not a valid module identifier", segment),
            ));
        }
    }
    Ok(())
}
