//! CurseForge `manifest.json` model

use serde::Deserialize;

/// Name of the manifest entry at the root of a CurseForge pack
pub const MANIFEST_ENTRY: &str = "manifest.json";

/// Raw manifest JSON structure as it appears in the pack
#[derive(Debug, Clone, Deserialize)]
pub struct CurseManifest {
    pub minecraft: MinecraftInfo,
    #[serde(rename = "manifestType", default)]
    pub manifest_type: String,
    #[serde(rename = "manifestVersion", default)]
    pub manifest_version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub files: Vec<CurseFile>,
    /// Directory inside the pack holding local files; empty means none
    #[serde(default)]
    pub overrides: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinecraftInfo {
    pub version: String,
    #[serde(rename = "modLoaders", default)]
    pub mod_loaders: Vec<ModLoader>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModLoader {
    pub id: String,
    #[serde(default)]
    pub primary: bool,
}

impl ModLoader {
    /// Split `forge-14.23.5.2847` into `("forge", "14.23.5.2847")`.
    /// Returns `None` unless the id has exactly two `-` separated parts.
    pub fn split_id(&self) -> Option<(&str, &str)> {
        let mut parts = self.id.split('-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(family), Some(version), None) => Some((family, version)),
            _ => None,
        }
    }
}

/// One mod reference in the manifest's `files` list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CurseFile {
    #[serde(rename = "projectID")]
    pub project_id: u32,
    #[serde(rename = "fileID")]
    pub file_id: u32,
    #[serde(default)]
    pub required: bool,
}

impl CurseManifest {
    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// The overrides directory, if the pack declares one
    pub fn overrides_dir(&self) -> Option<&str> {
        let dir = self.overrides.trim_matches('/');
        if dir.is_empty() { None } else { Some(dir) }
    }
}
