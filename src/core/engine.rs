use crate::domain::model::{Artifact, Bundle};
use crate::domain::ports::Packager;
use crate::utils::error::Result;
use std::time::Instant;

pub struct BuildEngine<P: Packager> {
    packager: P,
}

impl<P: Packager> BuildEngine<P> {
    pub fn new(packager: P) -> Self {
        Self { packager }
    }

    /// Collect and assemble without writing anything.
    pub async fn plan(&self) -> Result<Bundle> {
        let started = Instant::now();
        let bundle = self.packager.collect().await?;
        tracing::debug!("collect took {:?}", started.elapsed());

        let started = Instant::now();
        let bundle = self.packager.assemble(bundle).await?;
        tracing::debug!("assemble took {:?}", started.elapsed());
        Ok(bundle)
    }

    pub async fn run(&self) -> Result<Artifact> {
        tracing::info!("🚀 Starting distribution build");
        let total = Instant::now();

        let bundle = self.plan().await?;

        let started = Instant::now();
        let artifact = self.packager.write(bundle).await?;
        tracing::debug!("write took {:?}", started.elapsed());

        tracing::info!(
            "✅ Built {} with {} files in {:?}",
            artifact.file_name,
            artifact.files.len(),
            total.elapsed()
        );
        Ok(artifact)
    }
}
