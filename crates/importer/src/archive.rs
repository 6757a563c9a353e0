//! Read-only random access to a zip archive
//!
//! Used for the modpack archive itself and for downloaded mod jars.

use crate::error::{ImportError, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

/// Upper bound on the buffer reserved up front for an entry. The declared
/// size comes from the central directory and is not trusted.
const READ_CAPACITY_LIMIT: u64 = 1024 * 1024;

/// An entry of an open archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    index: usize,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

pub struct PackArchive {
    path: PathBuf,
    inner: ZipArchive<File>,
}

impl PackArchive {
    /// Open `path` as a zip archive
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| ImportError::NotAnArchive {
            path: path.clone(),
            source: ZipError::Io(e),
        })?;
        let inner = ZipArchive::new(file).map_err(|source| ImportError::NotAnArchive {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Look up an entry by its exact name
    pub fn find_entry(&mut self, name: &str) -> Result<Option<ArchiveEntry>> {
        let index = match self.inner.index_for_name(name) {
            Some(index) => index,
            None => return Ok(None),
        };
        self.entry_at(index).map(Some)
    }

    /// All entries in central directory order
    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        (0..self.inner.len()).map(|index| self.entry_at(index)).collect()
    }

    /// Decompressed bytes of an entry
    pub fn read_entry(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let path = &self.path;
        let read_error = |source: ZipError| ImportError::ArchiveRead {
            path: path.clone(),
            entry: entry.name.clone(),
            source,
        };
        let mut file = self.inner.by_index(entry.index).map_err(read_error)?;
        let mut buf = Vec::with_capacity(entry.size.min(READ_CAPACITY_LIMIT) as usize);
        file.read_to_end(&mut buf)
            .map_err(|e| read_error(ZipError::Io(e)))?;
        Ok(buf)
    }

    fn entry_at(&mut self, index: usize) -> Result<ArchiveEntry> {
        let file = match self.inner.by_index_raw(index) {
            Ok(file) => file,
            Err(source) => {
                return Err(ImportError::ArchiveRead {
                    path: self.path.clone(),
                    entry: format!("#{}", index),
                    source,
                });
            }
        };
        Ok(ArchiveEntry {
            index,
            name: file.name().to_string(),
            is_dir: file.is_dir(),
            size: file.size(),
        })
    }
}

impl std::fmt::Debug for PackArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackArchive")
            .field("path", &self.path)
            .field("entries", &self.inner.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;

    /// Write a zip at `path` containing `(name, bytes)` pairs; names ending
    /// in `/` become directory entries.
    pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    /// Same as [`write_zip`] but into memory
    pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// A single stored entry whose central directory claims `declared`
    /// uncompressed bytes through a zip64 extra field
    pub fn zip_with_declared_size(name: &str, data: &[u8], declared: u64) -> Vec<u8> {
        let crc = crc32(data);
        let mut extra = Vec::new();
        extra.extend_from_slice(&1u16.to_le_bytes());
        extra.extend_from_slice(&16u16.to_le_bytes());
        extra.extend_from_slice(&declared.to_le_bytes());
        extra.extend_from_slice(&(data.len() as u64).to_le_bytes());

        let mut out = Vec::new();
        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&0u16.to_le_bytes()); // stored
        out.extend_from_slice(&0u16.to_le_bytes()); // time
        out.extend_from_slice(&0x21u16.to_le_bytes()); // date
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&extra);
        out.extend_from_slice(data);

        let central_offset = out.len() as u32;
        out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes()); // version made by
        out.extend_from_slice(&45u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0x21u16.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // comment
        out.extend_from_slice(&0u16.to_le_bytes()); // disk
        out.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        out.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        out.extend_from_slice(&0u32.to_le_bytes()); // local header offset
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&extra);
        let central_size = out.len() as u32 - central_offset;

        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&central_size.to_le_bytes());
        out.extend_from_slice(&central_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    fn crc32(data: &[u8]) -> u32 {
        let mut crc = !0u32;
        for byte in data {
            crc ^= u32::from(*byte);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }
}
