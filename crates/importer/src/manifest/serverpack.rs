//! MCUpdater `ServerPack` descriptor model
//!
//! Field names prefixed with `@` render as XML attributes and `$text` as
//! element content. Field order is render order.

use serde::Serialize;

/// `version` attribute of the root `ServerPack` element
pub const SERVER_PACK_SCHEMA_VERSION: &str = "3.4";
/// Launch class for Forge on the legacy launchwrapper
pub const MAIN_CLASS: &str = "net.minecraft.launchwrapper.Launch";
/// Modules are installed on both client and server
pub const SIDE_BOTH: &str = "BOTH";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "ServerPack")]
pub struct ServerPack {
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "Server")]
    pub server: Server,
}

impl ServerPack {
    pub fn new(server: Server) -> Self {
        Self {
            version: SERVER_PACK_SCHEMA_VERSION.to_string(),
            server,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Server {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name")]
    pub name: String,
    /// Minecraft version
    #[serde(rename = "@version")]
    pub version: String,
    /// Pack version
    #[serde(rename = "@revision")]
    pub revision: String,
    #[serde(rename = "@mainClass")]
    pub main_class: String,
    #[serde(rename = "Loader", default)]
    pub loaders: Vec<Loader>,
    #[serde(rename = "Module", default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loader {
    #[serde(rename = "@type")]
    pub loader_type: String,
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@loadOrder")]
    pub load_order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@side")]
    pub side: String,
    #[serde(rename = "URL")]
    pub urls: Vec<String>,
    #[serde(rename = "ModPath", skip_serializing_if = "Option::is_none")]
    pub mod_path: Option<String>,
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "Required")]
    pub required: Required,
    #[serde(rename = "ModType")]
    pub mod_type: ModType,
    #[serde(rename = "MD5")]
    pub md5: String,
}

impl Module {
    pub fn kind(&self) -> ModKind {
        self.mod_type.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Required {
    #[serde(rename = "@isDefault")]
    pub is_default: bool,
    #[serde(rename = "$text")]
    pub value: bool,
}

impl Required {
    pub fn new(value: bool) -> Self {
        Self { is_default: true, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModType {
    /// Extract into the instance root instead of the mods directory
    #[serde(rename = "@inRoot", skip_serializing_if = "Option::is_none")]
    pub in_root: Option<bool>,
    #[serde(rename = "$text")]
    pub kind: ModKind,
}

impl ModType {
    pub fn regular() -> Self {
        Self { in_root: None, kind: ModKind::Regular }
    }

    pub fn extract_in_root() -> Self {
        Self { in_root: Some(true), kind: ModKind::Extract }
    }
}

/// How the updater installs a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModKind {
    /// Placed as-is, usually into `mods/`
    Regular,
    /// Unpacked on install
    Extract,
}
