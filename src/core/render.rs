//! Renders a manifest into the native form a packaging tool reads.

use crate::domain::model::Manifest;
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Format {
    Toml,
    Json,
    #[cfg_attr(feature = "cli", value(alias = "setup.py"))]
    SetupPy,
    #[cfg_attr(feature = "cli", value(alias = "pyproject.toml"))]
    Pyproject,
}

pub fn render(manifest: &Manifest, format: Format) -> Result<String> {
    match format {
        Format::Toml => manifest.to_toml_string(),
        Format::Json => Ok(serde_json::to_string_pretty(manifest)? + "\n"),
        Format::SetupPy => render_setup_py(manifest),
        Format::Pyproject => render_pyproject(manifest),
    }
}

// JSON string literals are valid Python string literals for these values.
fn py_str(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn py_list<I, S>(items: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted = items
        .into_iter()
        .map(|item| py_str(item.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("[{}]", quoted.join(", ")))
}

fn render_setup_py(manifest: &Manifest) -> Result<String> {
    let requires: Vec<String> = manifest.dependencies.iter().map(|r| r.to_string()).collect();

    Ok(format!(
        "from setuptools import setup\n\n\
         setup(\n    \
         name={},\n    \
         version={},\n    \
         packages={},\n    \
         include_package_data={},\n    \
         install_requires={},\n\
         )\n",
        py_str(&manifest.name)?,
        py_str(&manifest.version)?,
        py_list(&manifest.packages)?,
        if manifest.include_package_data { "True" } else { "False" },
        py_list(&requires)?,
    ))
}

#[derive(Serialize)]
struct Pyproject<'a> {
    #[serde(rename = "build-system")]
    build_system: BuildSystem,
    project: Project<'a>,
    tool: Tool<'a>,
}

#[derive(Serialize)]
struct BuildSystem {
    requires: Vec<&'static str>,
    #[serde(rename = "build-backend")]
    build_backend: &'static str,
}

#[derive(Serialize)]
struct Project<'a> {
    name: &'a str,
    version: &'a str,
    dependencies: Vec<String>,
}

#[derive(Serialize)]
struct Tool<'a> {
    setuptools: SetuptoolsTable<'a>,
}

#[derive(Serialize)]
struct SetuptoolsTable<'a> {
    packages: &'a [String],
    #[serde(rename = "include-package-data")]
    include_package_data: bool,
}

fn render_pyproject(manifest: &Manifest) -> Result<String> {
    let doc = Pyproject {
        build_system: BuildSystem {
            requires: vec!["setuptools>=61"],
            build_backend: "setuptools.build_meta",
        },
        project: Project {
            name: &manifest.name,
            version: &manifest.version,
            dependencies: manifest.dependencies.iter().map(|r| r.to_string()).collect(),
        },
        tool: Tool {
            setuptools: SetuptoolsTable {
                packages: &manifest.packages,
                include_package_data: manifest.include_package_data,
            },
        },
    };
    Ok(toml::to_string(&doc)?)
}
