use crate::domain::model::{Manifest, Resolution};
use crate::domain::ports::Registry;
use crate::utils::error::{ManifestError, Result};
use crate::utils::validation::{normalize_name, validate_positive_number, validate_url};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_REGISTRY_URL: &str = "https://pypi.org";
pub const REGISTRY_ENV_VAR: &str = "PKGDESC_REGISTRY_URL";
pub const DEFAULT_CONCURRENCY: usize = 5;

/// PyPI-compatible JSON API: `GET {base}/pypi/{name}/json`.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRegistry {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("registry_url", base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("pkgdesc/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn exists(&self, name: &str) -> Result<bool> {
        let url = format!("{}/pypi/{}/json", self.base_url, name);
        tracing::debug!("Registry lookup: {}", url);

        let response = self.client.get(&url).send().await?;
        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(ManifestError::RegistryError {
                name: name.to_string(),
                status,
            }),
        }
    }
}

/// Fixed set of known names, for offline checks.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    names: HashSet<String>,
}

impl StaticRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| normalize_name(n.as_ref()))
                .collect(),
        }
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.names.contains(name))
    }
}

/// Looks up every dependency, at most `concurrency` at a time.
/// Results keep the manifest's dependency order.
pub async fn resolve_all<R>(
    registry: Arc<R>,
    manifest: &Manifest,
    concurrency: usize,
) -> Result<Resolution>
where
    R: Registry + 'static,
{
    validate_positive_number("concurrency", concurrency, 1)?;

    let semaphore = Arc::new(Semaphore::new(concurrency));
    // JoinSet aborts every lookup still running when it is dropped on error
    let mut lookups = JoinSet::new();

    for (index, requirement) in manifest.dependencies.iter().enumerate() {
        let name = requirement.normalized_name();
        let registry = registry.clone();
        let semaphore = semaphore.clone();

        lookups.spawn(async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| std::io::Error::other("Semaphore closed"))?;
            let found = registry.exists(&name).await?;
            Ok::<(usize, String, bool), ManifestError>((index, name, found))
        });
    }

    let mut outcomes: Vec<Option<(String, bool)>> = vec![None; manifest.dependencies.len()];
    while let Some(joined) = lookups.join_next().await {
        let (index, name, found) = joined.map_err(std::io::Error::other)??;
        outcomes[index] = Some((name, found));
    }

    let mut resolution = Resolution::default();
    for (name, found) in outcomes.into_iter().flatten() {
        if found {
            tracing::debug!("✅ {} resolved", name);
            resolution.resolved.push(name);
        } else {
            tracing::warn!("❌ {} not found in registry", name);
            resolution.missing.push(name);
        }
    }

    tracing::info!(
        "📦 Resolved {}/{} dependencies of {}",
        resolution.resolved.len(),
        manifest.dependencies.len(),
        manifest.name
    );
    Ok(resolution)
}
