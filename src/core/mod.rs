pub mod descriptor;
pub mod engine;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod requirement;

pub use crate::domain::model::{Artifact, Bundle, FileEntry, Manifest, Requirement, Resolution};
pub use crate::domain::ports::{Packager, Registry, Storage};
pub use crate::utils::error::Result;
