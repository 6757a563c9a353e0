//! Renders a [`ServerPack`] to XML

use crate::error::{ImportError, Result};
use crate::manifest::ServerPack;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Declaration written before the document element
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

const ROOT_ELEMENT: &str = "ServerPack";

/// Render the descriptor as a complete, tab indented XML document
pub fn render(pack: &ServerPack) -> Result<String> {
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some(ROOT_ELEMENT))
        .map_err(|e| ImportError::Serialize { message: e.to_string() })?;
    serializer.indent('\t', 1);
    pack.serialize(serializer)
        .map_err(|e| ImportError::Serialize { message: e.to_string() })?;

    let mut document = String::with_capacity(XML_HEADER.len() + body.len() + 1);
    document.push_str(XML_HEADER);
    document.push_str(&body);
    document.push('\n');
    Ok(document)
}

/// Render and write the descriptor to `path`, returning the bytes written
pub async fn write_to(pack: &ServerPack, path: &Path) -> Result<usize> {
    let document = render(pack)?;
    tokio::fs::write(path, document.as_bytes())
        .await
        .map_err(|source| ImportError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Successfully wrote {} bytes to {}", document.len(), path.display());
    Ok(document.len())
}
