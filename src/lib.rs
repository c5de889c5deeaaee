pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use config::cli::LocalStorage;
pub use config::manifest_file::{ManifestFile, SelectedProfile, SelectionSource};
pub use core::{engine::BuildEngine, pipeline::DistPipeline};
pub use domain::model::{Artifact, Manifest, Requirement, Resolution};
pub use utils::error::{ManifestError, Result};
