use anyhow::Result;
use httpmock::prelude::*;
use pkgdesc::core::descriptor::inspect;
use pkgdesc::core::registry::{resolve_all, HttpRegistry};
use pkgdesc::core::render::{render, Format};
use pkgdesc::utils::validation::Validate;
use pkgdesc::{BuildEngine, DistPipeline, LocalStorage, ManifestError, ManifestFile};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const MANIFEST: &str = r#"
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

fn write(root: &Path, rel: &str, contents: &str) -> Result<()> {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap())?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// 建立兩個應用程式的目錄結構
fn project_tree() -> Result<TempDir> {
    let root = TempDir::new()?;
    write(root.path(), "pkgdesc.toml", MANIFEST)?;
    write(root.path(), "paralympic_app/__init__.py", "")?;
    write(root.path(), "paralympic_app/routes.py", "")?;
    write(root.path(), "paralympic_app/static/style.css", "body {}")?;
    write(root.path(), "iris_app/__init__.py", "")?;
    write(root.path(), "iris_app/model.pkl", "pickle")?;
    Ok(root)
}

fn mock_registry(server: &MockServer, known: &[&str]) {
    for name in known {
        let path = format!("/pypi/{}/json", name);
        server.mock(|when, then| {
            when.method(GET).path(path);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"info": {"name": name}}));
        });
    }
}

/// paralympic_app 的依賴可解析時應能成功建置
#[tokio::test]
async fn test_paralympic_profile_builds() -> Result<()> {
    let project = project_tree()?;
    let file = ManifestFile::from_file(project.path().join("pkgdesc.toml"))?;
    file.validate()?;

    let selected = file.select_with_env(None, None)?;
    assert_eq!(selected.name, "paralympic_app");
    let manifest = selected.manifest.clone();

    let server = MockServer::start();
    mock_registry(&server, &["flask", "flask-sqlalchemy"]);
    let registry = Arc::new(HttpRegistry::new(&server.base_url())?);
    let resolution = resolve_all(registry, &manifest, 2).await?;
    assert!(resolution.is_complete());
    assert_eq!(resolution.resolved, vec!["flask", "flask-sqlalchemy"]);

    let report = inspect(&manifest, project.path())?;
    assert!(report.warnings.iter().all(|w| !w.contains("__init__.py")));

    let out_dir = project.path().join("dist");
    let storage = LocalStorage::new(out_dir.display().to_string());
    let engine = BuildEngine::new(DistPipeline::new(manifest, project.path(), storage));
    let artifact = engine.run().await?;

    assert_eq!(artifact.file_name, "paralympic_app-0.0.0.zip");
    let data = std::fs::read(out_dir.join("paralympic_app-0.0.0.zip"))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data))?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    assert!(names.contains(&"paralympic_app-0.0.0/paralympic_app/static/style.css".to_string()));
    assert!(names.iter().all(|n| !n.contains("iris_app")));

    let mut pkg_info = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("paralympic_app-0.0.0/PKG-INFO")?,
        &mut pkg_info,
    )?;
    assert!(pkg_info.contains("Requires-Dist: flask\n"));
    assert!(pkg_info.contains("Requires-Dist: flask-sqlalchemy\n"));
    Ok(())
}

/// iris_app 是互斥的替代設定，需獨立驗證
#[tokio::test]
async fn test_iris_profile_validates_independently() -> Result<()> {
    let project = project_tree()?;
    let file = ManifestFile::from_file(project.path().join("pkgdesc.toml"))?;

    let selected = file.select_with_env(None, Some("iris_app"))?;
    let manifest = selected.manifest;
    assert_eq!(manifest.name, "iris_app");
    assert_eq!(manifest.dependencies.len(), 3);
    assert!(manifest
        .dependencies
        .iter()
        .all(|d| d.name != "flask-sqlalchemy"));

    let report = inspect(manifest, project.path())?;
    assert_eq!(report.package_dirs, vec![project.path().join("iris_app")]);

    // removing the other app's directory does not affect this profile
    std::fs::remove_dir_all(project.path().join("paralympic_app"))?;
    assert!(inspect(manifest, project.path()).is_ok());

    let paralympic = file.select_with_env(Some("paralympic_app"), None)?.manifest;
    assert!(matches!(
        inspect(paralympic, project.path()),
        Err(ManifestError::MissingPackage { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_unresolvable_dependency_reported() -> Result<()> {
    let file = ManifestFile::from_toml_str(MANIFEST)?;
    let manifest = file.select_with_env(Some("iris_app"), None)?.manifest;

    let server = MockServer::start();
    mock_registry(&server, &["flask", "pandas"]);
    let sklearn = server.mock(|when, then| {
        when.method(GET).path("/pypi/sklearn/json");
        then.status(404);
    });

    let registry = Arc::new(HttpRegistry::new(&server.base_url())?);
    let resolution = resolve_all(registry, manifest, 3).await?;

    sklearn.assert();
    assert_eq!(resolution.resolved, vec!["flask", "pandas"]);
    assert_eq!(resolution.missing, vec!["sklearn"]);
    Ok(())
}

#[test]
fn test_rendered_setup_py_matches_profile() -> Result<()> {
    let file = ManifestFile::from_toml_str(MANIFEST)?;
    let manifest = file.select_with_env(None, None)?.manifest;

    let setup_py = render(manifest, Format::SetupPy)?;
    assert!(setup_py.contains("name=\"paralympic_app\","));
    assert!(setup_py.contains("packages=[\"paralympic_app\"],"));
    assert!(setup_py.contains("include_package_data=True,"));
    assert!(setup_py.contains("install_requires=[\"flask\", \"flask-sqlalchemy\"],"));
    Ok(())
}

#[test]
fn test_manifest_round_trip_through_every_profile() -> Result<()> {
    let file = ManifestFile::from_toml_str(MANIFEST)?;
    for name in file.profile_names() {
        let manifest = file.select_with_env(Some(name), None)?.manifest;
        let reparsed = pkgdesc::Manifest::from_toml_str(&manifest.to_toml_string()?)?;
        assert_eq!(&reparsed, manifest);
    }
    Ok(())
}
