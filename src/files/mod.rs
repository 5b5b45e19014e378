use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::StorageConfig, storage::StorageClient};

pub mod handlers;
pub mod intents;
pub mod reconcile;
pub mod services;
pub mod sweep;
pub mod upload;

/// Lifetime of URLs handed out by `list_for_owner`.
pub const SIGNED_URL_TTL_SECS: u64 = 60 * 60;

const KEY_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// An object attached to an entity. The key is authoritative; the url is for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub key: String,
    pub url: String,
}

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct FileGateway {
    client: Arc<dyn StorageClient>,
    public_base: String,
    prefixes: Vec<String>,
}

impl FileGateway {
    pub fn new(client: Arc<dyn StorageClient>, cfg: &StorageConfig) -> Self {
        Self {
            client,
            public_base: cfg.public_base_url.clone(),
            prefixes: cfg.recognized_prefixes(),
        }
    }

    pub fn key_for(owner: Uuid, filename: &str) -> String {
        format!("{owner}/{filename}")
    }

    pub fn url_for(&self, key: &str) -> String {
        let path = key
            .split('/')
            .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.public_base, path)
    }

    /// Recovers the storage key from a public URL, or `None` for foreign URLs.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let bare = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
        let rest = self
            .prefixes
            .iter()
            .find_map(|prefix| bare.strip_prefix(prefix.as_str()))?;
        let key = percent_decode_str(rest).decode_utf8().ok()?;
        if key.is_empty() {
            return None;
        }
        Some(key.into_owned())
    }

    /// Writes under `{owner}/{filename}`. Same name, same key: the old object is overwritten.
    pub async fn store(
        &self,
        owner: Uuid,
        filename: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<StoredFile> {
        let key = Self::key_for(owner, filename);
        self.client
            .put_object(&key, body, content_type)
            .await
            .with_context(|| format!("store {key}"))?;
        let url = self.url_for(&key);
        debug!(%owner, %key, "file stored");
        Ok(StoredFile { key, url })
    }

    pub async fn list_for_owner(&self, owner: Uuid) -> anyhow::Result<Vec<String>> {
        let keys = self.client.list_keys(&format!("{owner}/")).await?;
        if keys.is_empty() {
            debug!(%owner, "no stored files");
            return Ok(Vec::new());
        }
        let mut urls = Vec::with_capacity(keys.len());
        for key in keys {
            urls.push(self.client.presign_get(&key, SIGNED_URL_TTL_SECS).await?);
        }
        Ok(urls)
    }

    /// Deletes the object behind `url`. Unrecognized URLs are a logged no-op (`Ok(false)`).
    pub async fn remove(&self, url: &str) -> anyhow::Result<bool> {
        let Some(key) = self.key_from_url(url) else {
            warn!(url, "file url matches no storage domain; nothing deleted");
            return Ok(false);
        };
        self.remove_key(&key).await?;
        Ok(true)
    }

    pub async fn remove_key(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object(key)
            .await
            .with_context(|| format!("remove {key}"))?;
        debug!(key, "file removed");
        Ok(())
    }
}

/// Owner segment of a key produced by `FileGateway::key_for`.
pub fn owner_of_key(key: &str) -> Option<Uuid> {
    key.split_once('/')
        .and_then(|(owner, _)| Uuid::parse_str(owner).ok())
}

/// Collision-free object name that keeps a readable tail of the client's filename.
pub fn unique_name(filename: &str) -> String {
    format!("{}-{}", Uuid::new_v4().simple(), sanitize_filename(filename))
}

fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, Call, RecordingStorage};

    fn gateway() -> (FileGateway, Arc<RecordingStorage>) {
        let storage = Arc::new(RecordingStorage::default());
        let gw = FileGateway::new(storage.clone(), &test_config().storage);
        (gw, storage)
    }

    #[test]
    fn url_round_trips_to_key() {
        let (gw, _) = gateway();
        let owner = Uuid::new_v4();
        let key = FileGateway::key_for(owner, "final transcript.pdf");
        let url = gw.url_for(&key);
        assert!(url.ends_with("final%20transcript.pdf"));
        assert_eq!(gw.key_from_url(&url).as_deref(), Some(key.as_str()));
    }

    #[test]
    fn key_from_url_accepts_regionless_aws_domain_and_signed_urls() {
        let (gw, _) = gateway();
        assert_eq!(
            gw.key_from_url("https://folio-test.s3.amazonaws.com/abc/cv.pdf").as_deref(),
            Some("abc/cv.pdf")
        );
        assert_eq!(
            gw.key_from_url(
                "https://folio-test.s3.eu-west-1.amazonaws.com/abc/cv.pdf?X-Amz-Expires=3600"
            )
            .as_deref(),
            Some("abc/cv.pdf")
        );
        assert_eq!(gw.key_from_url("https://cdn.example.com/abc/cv.pdf"), None);
        assert_eq!(gw.key_from_url("https://folio-test.s3.amazonaws.com/"), None);
    }

    #[tokio::test]
    async fn remove_of_foreign_url_is_a_noop() {
        let (gw, storage) = gateway();
        let removed = gw.remove("https://elsewhere.example/some/key.pdf").await.unwrap();
        assert!(!removed);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn remove_propagates_delete_failure_for_recognized_key() {
        let (gw, storage) = gateway();
        storage.fail_deletes(true);
        let url = gw.url_for("owner/doc.pdf");
        assert!(gw.remove(&url).await.is_err());
        assert_eq!(storage.calls(), vec![Call::Delete("owner/doc.pdf".into())]);
    }

    #[tokio::test]
    async fn list_for_owner_with_no_objects_is_empty() {
        let (gw, _) = gateway();
        let urls = gw.list_for_owner(Uuid::new_v4()).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn list_for_owner_signs_only_that_owners_objects() {
        let (gw, _) = gateway();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        gw.store(me, "a.pdf", Bytes::from_static(b"a"), "application/pdf").await.unwrap();
        gw.store(me, "b.png", Bytes::from_static(b"b"), "image/png").await.unwrap();
        gw.store(other, "c.pdf", Bytes::from_static(b"c"), "application/pdf").await.unwrap();

        let urls = gw.list_for_owner(me).await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.iter().all(|u| u.contains(&me.to_string())));
        assert!(urls.iter().all(|u| u.contains("expires=3600")));
    }

    #[test]
    fn unique_names_are_sanitized_and_distinct() {
        let a = unique_name("../My CV (final).pdf");
        let b = unique_name("../My CV (final).pdf");
        assert_ne!(a, b);
        assert!(a.ends_with("-My_CV__final_.pdf"));
        assert!(unique_name("...").ends_with("-file"));
    }

    #[test]
    fn owner_is_parsed_from_key() {
        let owner = Uuid::new_v4();
        assert_eq!(owner_of_key(&FileGateway::key_for(owner, "x.pdf")), Some(owner));
        assert_eq!(owner_of_key("not-a-uuid/x.pdf"), None);
    }
}
