use crate::domain::model::{Artifact, Bundle};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Where a relative path written through this storage ends up.
    fn location(&self, path: &str) -> String;
}

/// Index used to resolve dependency names.
#[async_trait]
pub trait Registry: Send + Sync {
    /// `name` is already PEP 503 normalized.
    async fn exists(&self, name: &str) -> Result<bool>;
}

#[async_trait]
pub trait Packager: Send + Sync {
    async fn collect(&self) -> Result<Bundle>;
    async fn assemble(&self, bundle: Bundle) -> Result<Bundle>;
    async fn write(&self, bundle: Bundle) -> Result<Artifact>;
}
