//! MD5 digests as recorded in ServerPack `MD5` elements

use crate::error::{FileOperation, ImportError, Result};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Lowercase hex MD5 of an in-memory buffer
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(md5::compute(data).0)
}

/// Size and lowercase hex MD5 of a file as it currently exists on disk
pub async fn digest_file<P: AsRef<Path>>(file_path: P) -> Result<(u64, String)> {
    let path = file_path.as_ref();
    let mut file = fs::File::open(path)
        .await
        .map_err(|e| ImportError::fs(path, FileOperation::Read, e))?;
    let mut context = md5::Context::new();
    let mut size = 0u64;

    const BUFFER_SIZE: usize = 64 * 1024;
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .await
            .map_err(|e| ImportError::fs(path, FileOperation::Read, e))?;
        if bytes_read == 0 {
            break;
        }
        context.consume(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok((size, hex::encode(context.compute().0)))
}
