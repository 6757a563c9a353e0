//! Repackaging of a pack's overrides directory
//!
//! Entries under `<prefix>/` are copied into a staging directory, then the
//! staging tree is zipped into `<artifact_dir>/<prefix>.zip`. Size and MD5
//! are taken from the finished file on disk, never from the writer.

use crate::archive::{ArchiveEntry, PackArchive};
use crate::error::{FileOperation, ImportError, Result};
use crate::hash::digest_file;
use crate::manifest::{ModType, Module, Required, SIDE_BOTH};
use crate::progress::{EntryOutcome, ProgressCallback, ProgressEvent};
use crate::workspace::Workspace;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Extensions of files that are already compressed containers
const STORED_EXTENSIONS: &[&str] = &["zip", "jar"];

/// Per-entry tallies of an overrides extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub extracted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl ExtractionSummary {
    fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Extracted { bytes } => {
                self.extracted += 1;
                self.bytes += bytes;
            }
            EntryOutcome::Skipped => self.skipped += 1,
            EntryOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// The repackaged overrides archive and the module describing it
#[derive(Debug, Clone)]
pub struct OverridePackage {
    pub module: Module,
    pub archive_path: PathBuf,
    pub summary: ExtractionSummary,
}

/// Name of the archive produced for `prefix`, taken from its last component.
/// Prefixes that are absolute or contain `..` are rejected.
pub fn archive_stem(prefix: &str) -> Result<String> {
    safe_relative_path(prefix)
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ImportError::InvalidOverrides {
            prefix: prefix.to_string(),
        })
}

/// Copy `<prefix>/...` out of the pack and zip it up as `<stem>.zip`, where
/// `stem` is the prefix's last path component
pub async fn repackage(
    archive: &mut PackArchive,
    prefix: &str,
    workspace: &Workspace,
    artifact_dir: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<OverridePackage> {
    let stem = archive_stem(prefix)?;
    let staging = workspace.temp_dir("overrides")?;
    let summary = extract_prefix(archive, prefix, staging.path(), progress)?;
    info!(
        "Extracted {} override files ({} skipped, {} failed)",
        summary.extracted, summary.skipped, summary.failed
    );
    if summary.extracted == 0 {
        warn!("No files extracted from '{}/', the overrides archive will be empty", prefix);
    }

    let archive_path = artifact_dir.join(format!("{}.zip", stem));
    let files = write_archive(staging.path(), &archive_path)?;
    drop(staging);

    let (size, md5) = digest_file(&archive_path).await?;
    let absolute = std::fs::canonicalize(&archive_path)
        .map_err(|e| ImportError::fs(&archive_path, FileOperation::Metadata, e))?;
    let url = file_url(&absolute);
    info!("Wrote {} ({} files, {} bytes), reference it as {}", archive_path.display(), files, size, url);

    if let Some(callback) = progress {
        callback(ProgressEvent::OverridesPackaged {
            path: archive_path.display().to_string(),
            files,
            failed: summary.failed,
            size,
        });
    }

    Ok(OverridePackage {
        module: Module {
            name: prefix.to_string(),
            id: format!("curse2mcu_{}", stem),
            side: SIDE_BOTH.to_string(),
            urls: vec![url],
            mod_path: None,
            size,
            required: Required::new(true),
            mod_type: ModType::extract_in_root(),
            md5,
        },
        archive_path,
        summary,
    })
}

/// Copy every file entry under `prefix/` into `dest`, keeping relative paths.
/// Individual entry failures are counted, not returned.
pub fn extract_prefix(
    archive: &mut PackArchive,
    prefix: &str,
    dest: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<ExtractionSummary> {
    let dir_prefix = format!("{}/", prefix);
    let mut summary = ExtractionSummary::default();

    for entry in archive.entries()? {
        if entry.is_dir {
            continue;
        }
        let relative = match entry.name.strip_prefix(&dir_prefix) {
            Some(relative) => relative.to_string(),
            None => continue,
        };
        let outcome = extract_entry(archive, &entry, &relative, dest);
        match &outcome {
            EntryOutcome::Extracted { bytes } => debug!("Extracted {} ({} bytes)", relative, bytes),
            EntryOutcome::Skipped => debug!("Skipping override entry with unusable path {:?}", entry.name),
            EntryOutcome::Failed { reason } => debug!("Failed to extract {}: {}", entry.name, reason),
        }
        summary.record(&outcome);
        if let Some(callback) = progress {
            callback(ProgressEvent::OverrideEntry { path: relative, outcome });
        }
    }

    Ok(summary)
}

fn extract_entry(archive: &mut PackArchive, entry: &ArchiveEntry, relative: &str, dest: &Path) -> EntryOutcome {
    let target = match safe_relative_path(relative) {
        Some(path) => dest.join(path),
        None => return EntryOutcome::Skipped,
    };
    let data = match archive.read_entry(entry) {
        Ok(data) => data,
        Err(e) => return EntryOutcome::Failed { reason: e.to_string() },
    };
    let written = target
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| std::fs::write(&target, &data));
    match written {
        Ok(()) => EntryOutcome::Extracted { bytes: data.len() as u64 },
        Err(e) => EntryOutcome::Failed { reason: e.to_string() },
    }
}

/// Relative path with only normal components, or `None` if it would
/// escape the staging root or is empty
fn safe_relative_path(relative: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if path.as_os_str().is_empty() { None } else { Some(path) }
}

/// Zip every regular file under `root` into `output`, returning the file count.
/// The archive is finished and synced before returning.
pub fn write_archive(root: &Path, output: &Path) -> Result<usize> {
    let file = File::create(output).map_err(|e| ImportError::fs(output, FileOperation::Create, e))?;
    let mut writer = ZipWriter::new(file);
    let mut count = 0;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            ImportError::fs(path, FileOperation::Read, io::Error::other(e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = archive_name(root, entry.path());
        writer
            .start_file(name.as_str(), options_for(entry.path()))
            .map_err(|source| ImportError::ArchiveWrite {
                path: output.to_path_buf(),
                source,
            })?;
        let mut source = File::open(entry.path())
            .map_err(|e| ImportError::fs(entry.path(), FileOperation::Read, e))?;
        io::copy(&mut source, &mut writer).map_err(|e| ImportError::fs(output, FileOperation::Write, e))?;
        count += 1;
    }

    let mut file = writer.finish().map_err(|source| ImportError::ArchiveWrite {
        path: output.to_path_buf(),
        source,
    })?;
    file.flush()
        .and_then(|_| file.sync_all())
        .map_err(|e| ImportError::fs(output, FileOperation::Write, e))?;
    Ok(count)
}

/// `/` separated path of `path` relative to `root`
fn archive_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn options_for(path: &Path) -> SimpleFileOptions {
    let stored = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| STORED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)));
    let method = if stored {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    SimpleFileOptions::default().compression_method(method)
}

fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}
