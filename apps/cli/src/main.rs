//! curse2mcu CLI entry point.

use anyhow::Context;
use clap::Parser;
use importer::{
    ConsoleProgressReporter, ImportConfig, ImportConfigBuilder, ImportError, Importer, IntoProgressCallback,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Convert a CurseForge modpack into an MCUpdater ServerPack descriptor
#[derive(Parser, Debug)]
#[command(name = "curse2mcu")]
#[command(version)]
struct Cli {
    /// CurseForge pack archive (.zip containing manifest.json)
    #[arg(value_parser = existing_file)]
    pack: PathBuf,

    /// Where to write the ServerPack XML
    #[arg(short, long, default_value = "serverpack.xml")]
    out: PathBuf,

    /// Download url lookup template with {project} and {file} placeholders
    #[arg(long)]
    lookup_url: Option<String>,

    /// Directory receiving the repackaged overrides zip
    #[arg(long)]
    artifact_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("'{}' is not a file", value))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "import failed");
            eprintln!("Error: {:#}", e);
            if is_input_error(&e) {
                eprintln!("Hint: PACK must be a CurseForge modpack export with manifest.json at its root");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(ImportConfig::from_env(), &cli);
    let importer = Importer::new(config)
        .context("invalid configuration")?
        .with_progress(ConsoleProgressReporter.into_callback());

    let report = importer
        .import_package(&cli.pack, &cli.out)
        .await
        .with_context(|| format!("failed to convert {}", cli.pack.display()))?;

    println!(
        "Wrote {} ({} modules, {} loaders)",
        report.output.display(),
        report.module_count(),
        report.pack.server.loaders.len()
    );
    if let Some(overrides) = &report.overrides {
        println!(
            "Upload {} and fix its URL in {} before distributing",
            overrides.archive_path.display(),
            report.output.display()
        );
    }
    Ok(())
}

fn is_input_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ImportError>()
        .is_some_and(ImportError::is_input_error)
}

/// Flags take precedence over the environment
fn build_config(base: ImportConfig, cli: &Cli) -> ImportConfig {
    let mut builder = ImportConfigBuilder::from_config(base);
    if let Some(template) = &cli.lookup_url {
        builder = builder.lookup_url_template(template.clone());
    }
    if let Some(dir) = &cli.artifact_dir {
        builder = builder.artifact_dir(dir.clone());
    }
    builder.build()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "curse2mcu",
            "Cargo.toml",
            "--lookup-url",
            "http://localhost/{project}/{file}",
            "--artifact-dir",
            "dist",
        ]);
        let config = build_config(ImportConfig::default(), &cli);
        assert_eq!(config.lookup_url_template, "http://localhost/{project}/{file}");
        assert_eq!(config.artifact_dir, PathBuf::from("dist"));
        assert_eq!(cli.out, PathBuf::from("serverpack.xml"));
    }

    #[test]
    fn test_input_errors_are_recognized_through_context() {
        let input = anyhow::Error::new(ImportError::NoManifestFound {
            path: PathBuf::from("pack.zip"),
            entries: 0,
        })
        .context("failed to convert pack.zip");
        assert!(is_input_error(&input));

        let config = anyhow::Error::new(ImportError::Configuration {
            field: "server_id".to_string(),
            message: "empty".to_string(),
        });
        assert!(!is_input_error(&config));
        assert!(!is_input_error(&anyhow::anyhow!("plain")));
    }

    #[test]
    fn test_missing_pack_is_usage_error() {
        let result = Cli::try_parse_from(["curse2mcu", "does-not-exist.zip"]);
        assert!(result.is_err());
    }
}
