//! Dependency strings in the PEP 508 subset used by `install_requires`:
//! `name[extra,...] specifier ; marker`. Direct URL references are rejected.

use crate::domain::model::Requirement;
use crate::utils::error::{ManifestError, Result};
use crate::utils::validation::{normalize_name, validate_distribution_name};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const FIELD: &str = "dependencies";

// Longest operators first so `===` is not read as `==`.
const OPERATORS: [&str; 8] = ["===", "~=", "==", "!=", "<=", ">=", "<", ">"];

fn invalid(value: &str, reason: impl Into<String>) -> ManifestError {
    ManifestError::InvalidField {
        field: FIELD.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn clause_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9.*+!_-]+$").expect("valid regex"))
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')
}

impl Requirement {
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(invalid(input, "Dependency cannot be empty"));
        }

        let (head, marker) = match raw.split_once(';') {
            Some((head, marker)) => {
                let marker = marker.trim();
                if marker.is_empty() {
                    return Err(invalid(raw, "Environment marker after ';' is empty"));
                }
                if marker.chars().any(char::is_control) {
                    return Err(invalid(raw, "Environment marker contains control characters"));
                }
                (head.trim(), Some(marker.to_string()))
            }
            None => (raw, None),
        };

        let name_end = head.find(|c: char| !is_name_char(c)).unwrap_or(head.len());
        let name = &head[..name_end];
        validate_distribution_name(FIELD, name)?;

        let mut rest = head[name_end..].trim_start();

        let mut extras = Vec::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket
                .find(']')
                .ok_or_else(|| invalid(raw, "Unclosed '[' in extras"))?;
            for extra in after_bracket[..close].split(',') {
                let extra = extra.trim();
                if extra.is_empty() {
                    continue;
                }
                validate_distribution_name(FIELD, extra)?;
                extras.push(extra.to_string());
            }
            rest = after_bracket[close + 1..].trim_start();
        }

        if rest.starts_with('@') {
            return Err(invalid(raw, "Direct URL references are not supported"));
        }

        if let Some(inner) = rest.strip_prefix('(') {
            rest = inner
                .strip_suffix(')')
                .ok_or_else(|| invalid(raw, "Unclosed '(' in version specifier"))?
                .trim();
        }

        let specifier = if rest.is_empty() {
            None
        } else {
            Some(parse_specifier(raw, rest)?)
        };

        Ok(Self {
            name: name.to_string(),
            extras,
            specifier,
            marker,
        })
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn is_pinned(&self) -> bool {
        self.specifier.is_some()
    }
}

fn parse_specifier(raw: &str, spec: &str) -> Result<String> {
    let mut clauses = Vec::new();
    for clause in spec.split(',') {
        let clause = clause.trim();
        let op = OPERATORS
            .iter()
            .find(|op| clause.starts_with(**op))
            .ok_or_else(|| {
                invalid(
                    raw,
                    format!(
                        "'{}' must start with one of {}",
                        clause,
                        OPERATORS.join(" ")
                    ),
                )
            })?;
        let version = clause[op.len()..].trim();
        if !clause_version_re().is_match(version) {
            return Err(invalid(raw, format!("'{}' has no valid version", clause)));
        }
        clauses.push(format!("{}{}", op, version));
    }
    Ok(clauses.join(","))
}

impl FromStr for Requirement {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(spec) = &self.specifier {
            f.write_str(spec)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Requirement::parse(&raw).map_err(serde::de::Error::custom)
    }
}
