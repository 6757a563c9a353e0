//! Typed shapes of the input manifest and the output descriptor
//!
//! Both submodules are plain data. Behaviour lives in the resolver,
//! the overrides repackager and the pipeline.

pub mod curse;
pub mod serverpack;

pub use curse::{CurseFile, CurseManifest, MANIFEST_ENTRY, MinecraftInfo, ModLoader};
pub use serverpack::{
    Loader, MAIN_CLASS, ModKind, ModType, Module, Required, SERVER_PACK_SCHEMA_VERSION, SIDE_BOTH,
    Server, ServerPack,
};
