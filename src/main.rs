use clap::Parser;
use pkgdesc::config::manifest_file::ManifestFile;
use pkgdesc::core::descriptor::inspect;
use pkgdesc::core::registry::{resolve_all, HttpRegistry, StaticRegistry};
use pkgdesc::core::render::render;
use pkgdesc::utils::error::ManifestError;
use pkgdesc::utils::{logger, validation::Validate};
use pkgdesc::{BuildEngine, CliConfig, Command, DistPipeline, LocalStorage, Manifest, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("CLI config: {:?}", config);

    // 驗證參數
    if let Err(e) = config.validate() {
        fail(&e);
    }

    if let Err(e) = run(&config).await {
        fail(&e);
    }
}

fn fail(e: &ManifestError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

async fn run(config: &CliConfig) -> Result<()> {
    tracing::info!("📁 Loading manifest from: {}", config.config);
    let file = ManifestFile::from_file(&config.config)?;

    if let Command::Profiles = config.command {
        let selected = file
            .select(config.profile.as_deref())
            .ok()
            .map(|s| s.name.to_string());
        for name in file.profile_names() {
            let marker = if selected.as_deref() == Some(name) { "*" } else { " " };
            println!("{} {}", marker, name);
        }
        return Ok(());
    }

    let selected = file.select(config.profile.as_deref())?;
    tracing::info!(
        "🎯 Using profile '{}' (selected by {:?})",
        selected.name,
        selected.source
    );
    let manifest = selected.manifest;

    match &config.command {
        Command::Profiles => {}
        Command::Validate { root } => {
            file.validate()?;
            let root = config.manifest_root(root.as_deref());
            let report = inspect(manifest, &root)?;
            println!(
                "✅ {} is valid ({} package(s) found under {})",
                manifest.name,
                report.package_dirs.len(),
                report.root.display()
            );
            for warning in &report.warnings {
                println!("⚠️ {}", warning);
            }
        }
        Command::Show => {
            manifest.validate()?;
            display_manifest(selected.name, manifest);
        }
        Command::Render { format, out } => {
            manifest.validate()?;
            let rendered = render(manifest, *format)?;
            match out {
                Some(path) => {
                    std::fs::write(path, rendered)?;
                    tracing::info!("📝 Rendered {:?} to {}", format, path);
                }
                None => print!("{}", rendered),
            }
        }
        Command::Resolve {
            offline,
            concurrency,
            ..
        } => {
            manifest.validate()?;
            let resolution = if offline.is_empty() {
                let registry = HttpRegistry::new(&config.registry_url())?;
                tracing::info!("🌐 Resolving against {}", registry.base_url());
                resolve_all(Arc::new(registry), manifest, *concurrency).await?
            } else {
                tracing::info!("📴 Resolving offline against {} names", offline.len());
                resolve_all(Arc::new(StaticRegistry::new(offline)), manifest, *concurrency)
                    .await?
            };

            for name in &resolution.resolved {
                println!("✅ {}", name);
            }
            for name in &resolution.missing {
                println!("❌ {}", name);
            }
            if !resolution.is_complete() {
                return Err(ManifestError::UnresolvedDependencies {
                    names: resolution.missing,
                });
            }
        }
        Command::Build {
            root,
            out_dir,
            dry_run,
        } => {
            manifest.validate()?;
            let root = config.manifest_root(root.as_deref());
            let storage = LocalStorage::new(out_dir.clone());
            let pipeline = DistPipeline::new(manifest.clone(), root, storage);
            let archive_name = pipeline.archive_name();
            let engine = BuildEngine::new(pipeline);

            if *dry_run {
                tracing::info!("🔍 DRY RUN MODE - archive will not be written");
                let bundle = engine.plan().await?;
                println!("📦 {} would contain:", archive_name);
                for entry in &bundle.entries {
                    println!("  {} ({} bytes)", entry.archive_path, entry.contents.len());
                }
                if bundle.skipped > 0 {
                    println!("  ({} file(s) skipped)", bundle.skipped);
                }
            } else {
                let artifact = engine.run().await?;
                println!("✅ Built {}", artifact.path);
                println!("📁 {} files, {} bytes", artifact.files.len(), artifact.size_bytes);
            }
        }
    }

    Ok(())
}

fn display_manifest(profile: &str, manifest: &Manifest) {
    println!("📋 Profile: {}", profile);
    println!("  Name: {}", manifest.name);
    println!("  Version: {}", manifest.version);
    println!("  Packages: {}", manifest.packages.join(", "));
    println!("  Include package data: {}", manifest.include_package_data);
    if manifest.dependencies.is_empty() {
        println!("  Dependencies: (none)");
    } else {
        println!("  Dependencies:");
        for requirement in &manifest.dependencies {
            println!("    - {}", requirement);
        }
    }
}
