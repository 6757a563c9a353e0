//! Resolution of manifest mod references into ServerPack modules
//!
//! Each reference costs two requests: one to the lookup endpoint for the
//! download url, one for the artifact itself. There is no retry; the first
//! failure surfaces to the caller.

pub mod metadata;

pub use metadata::{MODS_TOML_ENTRY, MetadataOutcome, ModMetadata};

use crate::archive::PackArchive;
use crate::config::ImportConfig;
use crate::error::{FileOperation, ImportError, Result};
use crate::hash::md5_hex;
use crate::manifest::{CurseFile, ModType, Module, Required, SIDE_BOTH};
use crate::workspace::Workspace;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info_span, warn, Instrument};

/// Turns a manifest file reference into a module record
#[async_trait]
pub trait ModResolver: Send + Sync {
    async fn resolve_module(&self, file: &CurseFile, workspace: &Workspace) -> Result<Module>;
}

/// A downloaded artifact held in the workspace. The file is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct FetchedArtifact {
    file: NamedTempFile,
    pub size: u64,
    pub md5: String,
}

impl FetchedArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Resolver backed by the CurseForge download-url endpoint
pub struct CurseResolver {
    client: Client,
    config: ImportConfig,
}

impl CurseResolver {
    pub fn new(config: ImportConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ImportError::Configuration {
            field: "http_client".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { client, config })
    }

    /// Ask the lookup endpoint where a file can be downloaded from.
    /// The response body is the url.
    pub async fn resolve_download_url(&self, project_id: u32, file_id: u32) -> Result<String> {
        let lookup_url = self.config.lookup_url(project_id, file_id);
        debug!("Requesting download url from {}", lookup_url);

        let lookup_failed = |source: reqwest::Error| ImportError::LookupFailed {
            project_id,
            file_id,
            url: lookup_url.clone(),
            source,
        };
        let response = self
            .client
            .get(&lookup_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(lookup_failed)?;
        response.text().await.map_err(lookup_failed)
    }

    /// Download `url` into a workspace temp file, returning its size and MD5
    pub async fn fetch_artifact(&self, url: &str, workspace: &Workspace) -> Result<FetchedArtifact> {
        let download_failed = |source: reqwest::Error| ImportError::DownloadFailed {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(download_failed)?;
        let body = response.bytes().await.map_err(download_failed)?;

        let file = workspace.temp_file("dl")?;
        tokio::fs::write(file.path(), &body)
            .await
            .map_err(|e| ImportError::fs(file.path(), FileOperation::Write, e))?;

        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(FetchedArtifact {
            file,
            size: body.len() as u64,
            md5: md5_hex(&body),
        })
    }
}

#[async_trait]
impl ModResolver for CurseResolver {
    async fn resolve_module(&self, file: &CurseFile, workspace: &Workspace) -> Result<Module> {
        async move {
            let url = self.resolve_download_url(file.project_id, file.file_id).await?;
            let artifact = self.fetch_artifact(&url, workspace).await?;

            let mut jar = PackArchive::open(artifact.path()).map_err(|e| match e {
                ImportError::NotAnArchive { source, .. } => ImportError::InvalidArtifact {
                    url: url.clone(),
                    source,
                },
                other => other,
            })?;

            let file_name = url_file_name(&url);
            let mut name = file_name.clone();
            let mut id = fallback_id(file.project_id);

            match metadata::read_metadata(&mut jar) {
                MetadataOutcome::Found(found) => {
                    if let Some(mod_id) = found.mod_id {
                        id = mod_id;
                    }
                    if let Some(display_name) = found.display_name {
                        name = display_name;
                    }
                }
                MetadataOutcome::Missing => {
                    debug!("No {} in {}, using fallback name and id", MODS_TOML_ENTRY, file_name);
                }
                MetadataOutcome::Unreadable { reason } => {
                    warn!("Ignoring unreadable {} in {}: {}", MODS_TOML_ENTRY, file_name, reason);
                }
            }

            Ok(Module {
                name,
                id,
                side: SIDE_BOTH.to_string(),
                mod_path: Some(format!("mods/{}", file_name)),
                urls: vec![url],
                size: artifact.size,
                required: Required::new(file.required),
                mod_type: ModType::regular(),
                md5: artifact.md5.clone(),
            })
        }
        .instrument(info_span!("resolve_module", project = file.project_id, file = file.file_id))
        .await
    }
}

/// Identifier used when a jar carries no usable mod id
pub fn fallback_id(project_id: u32) -> String {
    format!("curse_{}", project_id)
}

/// Final path segment of a url, as served
pub fn url_file_name(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(str::to_string)
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| {
            url.trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(url)
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::{zip_bytes, zip_with_declared_size};
    use crate::config::ImportConfigBuilder;
    use tempfile::tempdir;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const MODS_TOML: &[u8] = b"[[mods]]\nmodId = \"foo\"\ndisplayName = \"Foo Mod\"\n";

    fn resolver_for(server: &MockServer) -> CurseResolver {
        let config = ImportConfigBuilder::new()
            .lookup_url_template(format!("{}/api/v2/addon/{{project}}/file/{{file}}/download-url", server.uri()))
            .build();
        CurseResolver::new(config).unwrap()
    }

    async fn mount_mod(server: &MockServer, project: u32, file: u32, jar_name: &str, jar: Vec<u8>) -> String {
        let download_url = format!("{}/files/{}/{}", server.uri(), file, jar_name);
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/addon/{}/file/{}/download-url", project, file)))
            .respond_with(ResponseTemplate::new(200).set_body_string(download_url.clone()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/files/{}/{}", file, jar_name)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(jar))
            .mount(server)
            .await;
        download_url
    }

    #[test]
    fn test_url_file_name() {
        assert_eq!(url_file_name("https://edge.forgecdn.net/files/2840/540/jei-4.15.jar"), "jei-4.15.jar");
        assert_eq!(url_file_name("https://example.com/a/b%20c.jar?x=1"), "b%20c.jar");
        assert_eq!(url_file_name("not a url/at all.jar"), "at all.jar");
        assert_eq!(fallback_id(32274), "curse_32274");
    }

    #[tokio::test]
    async fn test_resolve_download_url_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/addon/1/file/2/download-url"))
            .respond_with(ResponseTemplate::new(200).set_body_string("https://cdn.example.com/files/foo.jar"))
            .mount(&server)
            .await;

        let url = resolver_for(&server).resolve_download_url(1, 2).await.unwrap();
        assert_eq!(url, "https://cdn.example.com/files/foo.jar");
    }

    #[tokio::test]
    async fn test_resolve_download_url_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/addon/1/file/2/download-url"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        match resolver_for(&server).resolve_download_url(1, 2).await {
            Err(ImportError::LookupFailed { project_id, file_id, url, .. }) => {
                assert_eq!((project_id, file_id), (1, 2));
                assert!(url.ends_with("/api/v2/addon/1/file/2/download-url"));
            }
            other => panic!("Expected LookupFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_artifact_digest_and_cleanup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/data.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Hello, World!".to_vec()))
            .mount(&server)
            .await;

        let root = tempdir().unwrap();
        let workspace = Workspace::init(root.path()).unwrap();
        let artifact = resolver_for(&server)
            .fetch_artifact(&format!("{}/files/data.bin", server.uri()), &workspace)
            .await
            .unwrap();

        assert_eq!(artifact.size, 13);
        assert_eq!(artifact.md5, "65a8e27d8879283831b664bd8b7f0ad4");
        let stored = artifact.path().to_path_buf();
        assert_eq!(std::fs::read(&stored).unwrap(), b"Hello, World!");

        drop(artifact);
        assert!(!stored.exists());
    }

    #[tokio::test]
    async fn test_fetch_artifact_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/gone.jar"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let root = tempdir().unwrap();
        let workspace = Workspace::init(root.path()).unwrap();
        let url = format!("{}/files/gone.jar", server.uri());
        match resolver_for(&server).fetch_artifact(&url, &workspace).await {
            Err(ImportError::DownloadFailed { url: failed, .. }) => assert_eq!(failed, url),
            other => panic!("Expected DownloadFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_module_without_metadata_uses_fallbacks() {
        let server = MockServer::start().await;
        let jar = zip_bytes(&[("foo/Foo.class", b"\xca\xfe\xba\xbe")]);
        let expected_md5 = md5_hex(&jar);
        let expected_size = jar.len() as u64;
        let download_url = mount_mod(&server, 42, 7, "plain-1.0.jar", jar).await;

        let root = tempdir().unwrap();
        let workspace = Workspace::init(root.path()).unwrap();
        let file = CurseFile { project_id: 42, file_id: 7, required: true };
        let module = resolver_for(&server).resolve_module(&file, &workspace).await.unwrap();

        assert_eq!(module.id, "curse_42");
        assert_eq!(module.name, "plain-1.0.jar");
        assert_eq!(module.urls, vec![download_url]);
        assert_eq!(module.mod_path.as_deref(), Some("mods/plain-1.0.jar"));
        assert_eq!(module.size, expected_size);
        assert_eq!(module.md5, expected_md5);
        assert_eq!(module.side, "BOTH");
        assert_eq!(module.required, Required::new(true));
        assert_eq!(module.mod_type, ModType::regular());
    }

    #[tokio::test]
    async fn test_resolve_module_with_metadata() {
        let server = MockServer::start().await;
        let jar = zip_bytes(&[(MODS_TOML_ENTRY, MODS_TOML)]);
        mount_mod(&server, 1, 2, "foo-1.0.jar", jar).await;

        let root = tempdir().unwrap();
        let workspace = Workspace::init(root.path()).unwrap();
        let file = CurseFile { project_id: 1, file_id: 2, required: false };
        let module = resolver_for(&server).resolve_module(&file, &workspace).await.unwrap();

        assert_eq!(module.id, "foo");
        assert_eq!(module.name, "Foo Mod");
        assert_eq!(module.mod_path.as_deref(), Some("mods/foo-1.0.jar"));
        assert!(!module.required.value);
    }

    #[tokio::test]
    async fn test_resolve_module_malformed_metadata_is_not_fatal() {
        let server = MockServer::start().await;
        let jar = zip_bytes(&[(MODS_TOML_ENTRY, b"[[mods]\nmodId = ")]);
        mount_mod(&server, 5, 6, "broken.jar", jar).await;

        let root = tempdir().unwrap();
        let workspace = Workspace::init(root.path()).unwrap();
        let file = CurseFile { project_id: 5, file_id: 6, required: true };
        let module = resolver_for(&server).resolve_module(&file, &workspace).await.unwrap();

        assert_eq!(module.id, "curse_5");
        assert_eq!(module.name, "broken.jar");
    }

    #[tokio::test]
    async fn test_resolve_module_oversized_metadata_falls_back() {
        let server = MockServer::start().await;
        let jar = zip_with_declared_size(MODS_TOML_ENTRY, MODS_TOML, 1 << 60);
        mount_mod(&server, 11, 12, "huge.jar", jar).await;

        let root = tempdir().unwrap();
        let workspace = Workspace::init(root.path()).unwrap();
        let file = CurseFile { project_id: 11, file_id: 12, required: true };
        let module = resolver_for(&server).resolve_module(&file, &workspace).await.unwrap();

        assert_eq!(module.id, "curse_11");
        assert_eq!(module.name, "huge.jar");
        assert_eq!(std::fs::read_dir(workspace.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_module_non_archive_artifact_is_fatal() {
        let server = MockServer::start().await;
        mount_mod(&server, 8, 9, "page.html", b"<html>not a jar</html>".to_vec()).await;

        let root = tempdir().unwrap();
        let workspace = Workspace::init(root.path()).unwrap();
        let file = CurseFile { project_id: 8, file_id: 9, required: true };
        let result = resolver_for(&server).resolve_module(&file, &workspace).await;

        assert!(matches!(result, Err(ImportError::InvalidArtifact { .. })));
        // the downloaded file is gone even though resolution failed
        assert_eq!(std::fs::read_dir(workspace.path()).unwrap().count(), 0);
    }
}
