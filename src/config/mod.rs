pub mod cli;
pub mod manifest_file;

#[cfg(feature = "cli")]
pub use args::{CliConfig, Command};

#[cfg(feature = "cli")]
mod args {
    use super::manifest_file::DEFAULT_MANIFEST_FILE;
    use crate::core::registry::{DEFAULT_CONCURRENCY, DEFAULT_REGISTRY_URL, REGISTRY_ENV_VAR};
    use crate::core::render::Format;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_path, validate_positive_number, validate_url, Validate};
    use clap::{Parser, Subcommand};
    use std::path::{Path, PathBuf};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "pkgdesc")]
    #[command(about = "Validate, render and build distribution manifests")]
    pub struct CliConfig {
        /// Path to the manifest file
        #[arg(short, long, global = true, default_value = DEFAULT_MANIFEST_FILE)]
        pub config: String,

        /// Profile to use (overrides PKGDESC_PROFILE and default_profile)
        #[arg(short, long, global = true)]
        pub profile: Option<String>,

        /// Enable verbose output
        #[arg(short, long, global = true)]
        pub verbose: bool,

        /// Emit logs as JSON lines
        #[arg(long, global = true)]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// List the profiles in the manifest file
        Profiles,

        /// Check field rules and that every package exists on disk
        Validate {
            /// Directory packages are resolved against (default: the manifest's directory)
            #[arg(long)]
            root: Option<String>,
        },

        /// Print the selected manifest
        Show,

        /// Render the selected manifest for a packaging tool
        Render {
            #[arg(short, long, value_enum, default_value = "setup-py")]
            format: Format,

            /// Write to a file instead of stdout
            #[arg(short, long)]
            out: Option<String>,
        },

        /// Check every dependency against a package registry
        Resolve {
            /// Registry base URL (default: PKGDESC_REGISTRY_URL or https://pypi.org)
            #[arg(long)]
            registry_url: Option<String>,

            /// Resolve against this list of names instead of a registry
            #[arg(long, value_delimiter = ',')]
            offline: Vec<String>,

            #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
            concurrency: usize,
        },

        /// Build a zip distribution of the selected manifest
        Build {
            #[arg(long)]
            root: Option<String>,

            #[arg(long, default_value = "dist")]
            out_dir: String,

            /// Show what would be bundled without writing the archive
            #[arg(long)]
            dry_run: bool,
        },
    }

    impl CliConfig {
        /// Packages are resolved relative to the manifest file unless `--root` is given.
        pub fn manifest_root(&self, root: Option<&str>) -> PathBuf {
            match root {
                Some(root) => PathBuf::from(root),
                None => Path::new(&self.config)
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
            }
        }

        pub fn registry_url(&self) -> String {
            let flag = match &self.command {
                Command::Resolve { registry_url, .. } => registry_url.clone(),
                _ => None,
            };
            flag.or_else(|| std::env::var(REGISTRY_ENV_VAR).ok())
                .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string())
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("config", &self.config)?;
            match &self.command {
                Command::Resolve {
                    concurrency,
                    offline,
                    ..
                } => {
                    validate_positive_number("concurrency", *concurrency, 1)?;
                    if offline.is_empty() {
                        validate_url("registry_url", &self.registry_url())?;
                    }
                }
                Command::Build { out_dir, root, .. } => {
                    validate_path("out_dir", out_dir)?;
                    if let Some(root) = root {
                        validate_path("root", root)?;
                    }
                }
                Command::Validate { root: Some(root) } => validate_path("root", root)?,
                Command::Render { out: Some(out), .. } => validate_path("out", out)?,
                _ => {}
            }
            Ok(())
        }
    }

}
