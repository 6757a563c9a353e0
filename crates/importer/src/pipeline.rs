//! End-to-end conversion of a CurseForge pack into a ServerPack descriptor
//!
//! The run moves through [`ImportStage`]s in order. Any error ends the run
//! in `Failed`; the descriptor is only written once every earlier stage
//! succeeded, so a failed run leaves no output file behind.

use crate::archive::PackArchive;
use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::manifest::{CurseManifest, Loader, MAIN_CLASS, MANIFEST_ENTRY, Module, Server, ServerPack};
use crate::overrides::{self, OverridePackage};
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::resolver::{CurseResolver, ModResolver};
use crate::serializer;
use crate::workspace::Workspace;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The only loader family MCUpdater descriptors are generated for
const SUPPORTED_LOADER: &str = "forge";

/// Stages of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Init,
    ManifestLoaded,
    HeaderBuilt,
    ModulesResolved,
    OverridesHandled,
    Serialized,
    Done,
    Failed,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Init => "init",
            ImportStage::ManifestLoaded => "manifest loaded",
            ImportStage::HeaderBuilt => "header built",
            ImportStage::ModulesResolved => "modules resolved",
            ImportStage::OverridesHandled => "overrides handled",
            ImportStage::Serialized => "serialized",
            ImportStage::Done => "done",
            ImportStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A manifest loader entry that did not make it into the descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLoader {
    pub id: String,
    pub reason: String,
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub output: PathBuf,
    pub bytes_written: usize,
    pub pack: ServerPack,
    pub skipped_loaders: Vec<SkippedLoader>,
    pub overrides: Option<OverridePackage>,
}

impl ImportReport {
    pub fn module_count(&self) -> usize {
        self.pack.server.modules.len()
    }
}

pub struct Importer {
    config: ImportConfig,
    resolver: Box<dyn ModResolver>,
    progress: Option<ProgressCallback>,
}

impl Importer {
    /// Importer resolving mods through the configured CurseForge endpoint
    pub fn new(config: ImportConfig) -> Result<Self> {
        config.validate()?;
        let resolver = CurseResolver::new(config.clone())?;
        Ok(Self::with_resolver(config, Box::new(resolver)))
    }

    pub fn with_resolver(config: ImportConfig, resolver: Box<dyn ModResolver>) -> Self {
        Self {
            config,
            resolver,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Convert the pack at `input` and write the descriptor to `output`
    pub async fn import_package(&self, input: &Path, output: &Path) -> Result<ImportReport> {
        let mut stage = ImportStage::Init;
        match self.run(input, output, &mut stage).await {
            Ok(report) => {
                info!(
                    "Import of {} finished with {} modules",
                    input.display(),
                    report.module_count()
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    stage = %stage,
                    category = e.category(),
                    "Import of {} failed: {}",
                    input.display(),
                    e
                );
                advance(&mut stage, ImportStage::Failed);
                Err(e)
            }
        }
    }

    async fn run(&self, input: &Path, output: &Path, stage: &mut ImportStage) -> Result<ImportReport> {
        let workspace = Workspace::init(&self.config.workspace_root)?;

        let mut archive = PackArchive::open(input)?;
        let manifest = load_manifest(&mut archive)?;
        if let Some(prefix) = manifest.overrides_dir() {
            overrides::archive_stem(prefix)?;
        }
        self.emit(ProgressEvent::ManifestLoaded {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            mods: manifest.files.len(),
        });
        advance(stage, ImportStage::ManifestLoaded);

        let (loaders, skipped_loaders) = build_loaders(&manifest);
        for skipped in &skipped_loaders {
            self.emit(ProgressEvent::LoaderSkipped {
                id: skipped.id.clone(),
                reason: skipped.reason.clone(),
            });
        }
        let mut server = Server {
            id: self.config.server_id.clone(),
            name: manifest.name.clone(),
            version: manifest.minecraft.version.clone(),
            revision: manifest.version.clone(),
            main_class: MAIN_CLASS.to_string(),
            loaders,
            modules: Vec::with_capacity(manifest.files.len() + 1),
        };
        advance(stage, ImportStage::HeaderBuilt);

        info!("Processing {} mods...", manifest.files.len());
        server.modules = self.resolve_modules(&manifest, &workspace).await?;
        advance(stage, ImportStage::ModulesResolved);

        let overrides = match manifest.overrides_dir() {
            Some(prefix) => {
                let package = overrides::repackage(
                    &mut archive,
                    prefix,
                    &workspace,
                    &self.config.artifact_dir,
                    self.progress.as_ref(),
                )
                .await?;
                server.modules.push(package.module.clone());
                Some(package)
            }
            None => None,
        };
        advance(stage, ImportStage::OverridesHandled);

        let pack = ServerPack::new(server);
        let bytes_written = serializer::write_to(&pack, output).await?;
        self.emit(ProgressEvent::DescriptorWritten {
            path: output.display().to_string(),
            bytes: bytes_written,
        });
        advance(stage, ImportStage::Serialized);

        if let Some(package) = &overrides {
            warn!(
                "{} must be uploaded and its URL in {} corrected before distributing the pack",
                package.archive_path.display(),
                output.display()
            );
        }
        advance(stage, ImportStage::Done);

        Ok(ImportReport {
            output: output.to_path_buf(),
            bytes_written,
            pack,
            skipped_loaders,
            overrides,
        })
    }

    /// Resolve every manifest file in order; the first failure aborts
    async fn resolve_modules(&self, manifest: &CurseManifest, workspace: &Workspace) -> Result<Vec<Module>> {
        let total = manifest.files.len();
        let mut modules = Vec::with_capacity(total);
        for (index, file) in manifest.files.iter().enumerate() {
            let module = self.resolver.resolve_module(file, workspace).await?;
            self.emit(ProgressEvent::ModuleResolved {
                index,
                total,
                name: module.name.clone(),
                size: module.size,
            });
            modules.push(module);
        }
        Ok(modules)
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }
}

fn advance(stage: &mut ImportStage, next: ImportStage) {
    info!("Import stage: {} -> {}", stage, next);
    *stage = next;
}

/// Read and parse the root `manifest.json` of an opened pack
pub fn load_manifest(archive: &mut PackArchive) -> Result<CurseManifest> {
    let entry = match archive.find_entry(MANIFEST_ENTRY)? {
        Some(entry) => entry,
        None => {
            return Err(ImportError::NoManifestFound {
                path: archive.path().to_path_buf(),
                entries: archive.len(),
            });
        }
    };
    info!("Found manifest file in {}", archive.path().display());

    let data = archive.read_entry(&entry)?;
    CurseManifest::from_slice(&data).map_err(|source| ImportError::InvalidManifest {
        path: archive.path().to_path_buf(),
        source,
    })
}

/// Translate manifest loaders into descriptor loaders.
///
/// `loadOrder` is the entry's position in the manifest list. Entries that
/// are not `forge-<version>` are returned as skipped instead.
pub fn build_loaders(manifest: &CurseManifest) -> (Vec<Loader>, Vec<SkippedLoader>) {
    let mut loaders = Vec::new();
    let mut skipped = Vec::new();

    for (index, loader) in manifest.minecraft.mod_loaders.iter().enumerate() {
        let (family, version) = match loader.split_id() {
            Some(parts) => parts,
            None => {
                debug!("Failed to parse mod loader {:?}, skipping", loader.id);
                skipped.push(SkippedLoader {
                    id: loader.id.clone(),
                    reason: "expected <family>-<version>".to_string(),
                });
                continue;
            }
        };
        if family != SUPPORTED_LOADER {
            debug!("Got unsupported mod loader type {:?}, skipping", family);
            skipped.push(SkippedLoader {
                id: loader.id.clone(),
                reason: format!("unsupported loader family '{}'", family),
            });
            continue;
        }
        if loader.primary && index != 0 {
            warn!("'primary' mod loader {:?} is not listed first", loader.id);
        }
        loaders.push(Loader {
            loader_type: "Forge".to_string(),
            version: format!("{}-{}", manifest.minecraft.version, version),
            load_order: index,
        });
    }

    (loaders, skipped)
}
