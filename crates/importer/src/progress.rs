//! Progress tracking and reporting for import runs

use std::sync::Arc;
use tracing::{info, warn};

/// Progress callback for import operations
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted while a pack is converted
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    ManifestLoaded {
        name: String,
        version: String,
        mods: usize,
    },
    LoaderSkipped {
        id: String,
        reason: String,
    },
    ModuleResolved {
        index: usize,
        total: usize,
        name: String,
        size: u64,
    },
    OverrideEntry {
        path: String,
        outcome: EntryOutcome,
    },
    OverridesPackaged {
        path: String,
        files: usize,
        failed: usize,
        size: u64,
    },
    DescriptorWritten {
        path: String,
        bytes: usize,
    },
}

/// Result of copying one entry out of the overrides directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Extracted { bytes: u64 },
    /// Entry had no usable relative path (empty or escaping the prefix)
    Skipped,
    Failed { reason: String },
}

/// Trait for progress reporting with more granular control
pub trait ProgressReporter: Send + Sync {
    fn on_manifest_loaded(&self, _name: &str, _version: &str, _mods: usize) {}
    fn on_loader_skipped(&self, _id: &str, _reason: &str) {}
    fn on_module_resolved(&self, _index: usize, _total: usize, _name: &str, _size: u64) {}
    fn on_override_entry(&self, _path: &str, _outcome: &EntryOutcome) {}
    fn on_overrides_packaged(&self, _path: &str, _files: usize, _failed: usize, _size: u64) {}
    fn on_descriptor_written(&self, _path: &str, _bytes: usize) {}
}

/// Extension trait to convert ProgressReporter to ProgressCallback
pub trait IntoProgressCallback {
    fn into_callback(self) -> ProgressCallback;
}

impl<T: ProgressReporter + 'static> IntoProgressCallback for T {
    fn into_callback(self) -> ProgressCallback {
        Arc::new(move |event| match event {
            ProgressEvent::ManifestLoaded { name, version, mods } => {
                self.on_manifest_loaded(&name, &version, mods);
            }
            ProgressEvent::LoaderSkipped { id, reason } => {
                self.on_loader_skipped(&id, &reason);
            }
            ProgressEvent::ModuleResolved { index, total, name, size } => {
                self.on_module_resolved(index, total, &name, size);
            }
            ProgressEvent::OverrideEntry { path, outcome } => {
                self.on_override_entry(&path, &outcome);
            }
            ProgressEvent::OverridesPackaged { path, files, failed, size } => {
                self.on_overrides_packaged(&path, files, failed, size);
            }
            ProgressEvent::DescriptorWritten { path, bytes } => {
                self.on_descriptor_written(&path, bytes);
            }
        })
    }
}

/// Reports progress through `tracing`
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter;

impl ProgressReporter for ConsoleProgressReporter {
    fn on_manifest_loaded(&self, name: &str, version: &str, mods: usize) {
        info!("Pack '{}' {} references {} mods", name, version, mods);
    }

    fn on_loader_skipped(&self, id: &str, reason: &str) {
        warn!("Skipping mod loader {:?}: {}", id, reason);
    }

    fn on_module_resolved(&self, index: usize, total: usize, name: &str, size: u64) {
        info!("[{}/{}] {} ({} bytes)", index + 1, total, name, size);
    }

    fn on_override_entry(&self, path: &str, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Extracted { .. } => {}
            EntryOutcome::Skipped => warn!("Skipped override entry {}", path),
            EntryOutcome::Failed { reason } => warn!("Failed to extract override {}: {}", path, reason),
        }
    }

    fn on_overrides_packaged(&self, path: &str, files: usize, failed: usize, size: u64) {
        info!("Packaged {} override files into {} ({} bytes, {} failed)", files, path, size, failed);
    }

    fn on_descriptor_written(&self, path: &str, bytes: usize) {
        info!("Wrote {} bytes to {}", bytes, path);
    }
}
