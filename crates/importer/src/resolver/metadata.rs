//! Best-effort mod identity from an embedded `META-INF/mods.toml`
//!
//! Nothing in here is fatal. A jar without the file, with a file that is
//! not valid TOML, or with fields of the wrong type simply yields no
//! enrichment.

use crate::archive::PackArchive;
use toml::Value;

/// Location of the Forge mod descriptor inside a mod jar
pub const MODS_TOML_ENTRY: &str = "META-INF/mods.toml";

/// Larger descriptors are not read
pub const MAX_MODS_TOML_SIZE: u64 = 256 * 1024;

/// Identity fields taken from the first `[[mods]]` table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModMetadata {
    pub mod_id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOutcome {
    Found(ModMetadata),
    Missing,
    Unreadable { reason: String },
}

/// Parse mods.toml text and pick out `mods[0].modId` / `mods[0].displayName`
pub fn parse_mods_toml(text: &str) -> Result<ModMetadata, toml::de::Error> {
    let document: toml::Table = toml::from_str(text)?;
    let first = document
        .get("mods")
        .and_then(Value::as_array)
        .and_then(|mods| mods.first())
        .and_then(Value::as_table);

    let field = |key: &str| {
        first
            .and_then(|table| table.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    Ok(ModMetadata {
        mod_id: field("modId"),
        display_name: field("displayName"),
    })
}

/// Look for and parse the embedded descriptor of an opened jar
pub fn read_metadata(jar: &mut PackArchive) -> MetadataOutcome {
    if jar.is_empty() {
        return MetadataOutcome::Missing;
    }
    let entry = match jar.find_entry(MODS_TOML_ENTRY) {
        Ok(Some(entry)) => entry,
        Ok(None) => return MetadataOutcome::Missing,
        Err(e) => return MetadataOutcome::Unreadable { reason: e.to_string() },
    };
    if entry.size > MAX_MODS_TOML_SIZE {
        return MetadataOutcome::Unreadable {
            reason: format!("{} declares {} bytes, limit is {}", MODS_TOML_ENTRY, entry.size, MAX_MODS_TOML_SIZE),
        };
    }
    let bytes = match jar.read_entry(&entry) {
        Ok(bytes) => bytes,
        Err(e) => return MetadataOutcome::Unreadable { reason: e.to_string() },
    };
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => return MetadataOutcome::Unreadable { reason: e.to_string() },
    };
    match parse_mods_toml(&text) {
        Ok(metadata) => MetadataOutcome::Found(metadata),
        Err(e) => MetadataOutcome::Unreadable { reason: e.to_string() },
    }
}
