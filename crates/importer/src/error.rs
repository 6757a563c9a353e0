//! Error types for the import pipeline
//!
//! Every fatal condition carries the entity it failed on (archive path, URL,
//! project/file ids) so the top level can report it without extra context.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an import run
#[derive(Error, Debug)]
pub enum ImportError {
    /// The input file could not be opened as a zip archive
    #[error("'{path}' is not a readable zip archive")]
    NotAnArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive has no root-level manifest.json
    #[error("no manifest.json found among {entries} entries of '{path}', this is probably not a CurseForge pack")]
    NoManifestFound { path: PathBuf, entries: usize },

    /// manifest.json is not structurally valid
    #[error("manifest.json in '{path}' is not a valid CurseForge manifest")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest's overrides directory is not a plain relative path
    #[error("overrides directory '{prefix}' must be a relative path inside the pack")]
    InvalidOverrides { prefix: String },

    /// The download-url lookup for a mod failed
    #[error("failed to look up download url for project {project_id} file {file_id} at '{url}'")]
    LookupFailed {
        project_id: u32,
        file_id: u32,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The artifact download failed
    #[error("failed to download '{url}'")]
    DownloadFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A downloaded artifact could not be opened as an archive
    #[error("downloaded artifact from '{url}' is not a readable jar/zip")]
    InvalidArtifact {
        url: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Reading an entry from an already opened archive failed
    #[error("failed to read entry '{entry}' from '{path}'")]
    ArchiveRead {
        path: PathBuf,
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Creating or finalizing an output archive failed
    #[error("failed to write archive '{path}'")]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// File system I/O errors with file context
    #[error("{operation} '{path}' failed")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor could not be rendered to XML
    #[error("failed to render ServerPack xml: {message}")]
    Serialize { message: String },

    /// The rendered descriptor could not be written
    #[error("failed to write output xml to '{path}'")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("invalid configuration for {field}: {message}")]
    Configuration { field: String, message: String },
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
    Create,
    CreateDir,
    Metadata,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
            FileOperation::CreateDir => write!(f, "creating directory"),
            FileOperation::Metadata => write!(f, "reading metadata of"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

impl ImportError {
    /// Shorthand for a [`ImportError::FileSystem`] error
    pub fn fs(path: impl Into<PathBuf>, operation: FileOperation, source: std::io::Error) -> Self {
        ImportError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ImportError::NotAnArchive { .. } => "not_an_archive",
            ImportError::NoManifestFound { .. } => "no_manifest",
            ImportError::InvalidManifest { .. } => "invalid_manifest",
            ImportError::InvalidOverrides { .. } => "invalid_overrides",
            ImportError::LookupFailed { .. } => "lookup_failed",
            ImportError::DownloadFailed { .. } => "download_failed",
            ImportError::InvalidArtifact { .. } => "invalid_artifact",
            ImportError::ArchiveRead { .. } => "archive_read",
            ImportError::ArchiveWrite { .. } => "archive_write",
            ImportError::FileSystem { .. } => "file_system",
            ImportError::Serialize { .. } => "serialize",
            ImportError::OutputWrite { .. } => "output_write",
            ImportError::Configuration { .. } => "configuration",
        }
    }

    /// True when the input itself is unusable, as opposed to a network or disk failure
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ImportError::NotAnArchive { .. }
                | ImportError::NoManifestFound { .. }
                | ImportError::InvalidManifest { .. }
                | ImportError::InvalidOverrides { .. }
        )
    }
}
