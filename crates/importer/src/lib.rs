//! CurseForge to MCUpdater importer
//!
//! This library converts a CurseForge modpack archive into an MCUpdater
//! `ServerPack` XML descriptor. Every mod in the pack manifest is resolved
//! to a download url, fetched once to record its size and MD5, and
//! enriched from its embedded `META-INF/mods.toml` when possible. The
//! pack's overrides directory is repackaged into a standalone zip that is
//! referenced as an extract-in-root module.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use importer::{ImportConfig, Importer, IntoProgressCallback, ConsoleProgressReporter};
//! use std::path::Path;
//!
//! # async fn example() -> importer::Result<()> {
//! let importer = Importer::new(ImportConfig::from_env())?
//!     .with_progress(ConsoleProgressReporter.into_callback());
//!
//! let report = importer
//!     .import_package(Path::new("pack.zip"), Path::new("serverpack.xml"))
//!     .await?;
//! println!("wrote {} modules", report.module_count());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod overrides;
pub mod pipeline;
pub mod progress;
pub mod resolver;
pub mod serializer;
pub mod workspace;

// Re-export commonly used types for convenience
pub use archive::{ArchiveEntry, PackArchive};
pub use config::{ImportConfig, ImportConfigBuilder};
pub use error::{FileOperation, ImportError, Result};
pub use manifest::{CurseFile, CurseManifest, Module, ServerPack};
pub use overrides::{ExtractionSummary, OverridePackage};
pub use pipeline::{ImportReport, ImportStage, Importer, SkippedLoader};
pub use progress::{
    ConsoleProgressReporter, EntryOutcome, IntoProgressCallback, ProgressCallback, ProgressEvent,
    ProgressReporter,
};
pub use resolver::{CurseResolver, ModResolver};
pub use workspace::Workspace;
