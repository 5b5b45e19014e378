//! Per-slot file reconciliation for entity create/edit/delete.
//!
//! Every storage side effect is preceded by an intent record. Delete intents are
//! completed as soon as the object is gone; attach intents only once the owning
//! entity has been persisted (`settle`), so an upload whose entity never lands
//! is eventually purged by the sweep.

use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    intents::IntentKind,
    unique_name, FileGateway, IncomingFile, StoredFile,
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// What a mutation asks for one single-file slot.
#[derive(Debug, Clone)]
pub enum SlotChange {
    Keep,
    Remove,
    Replace(IncomingFile),
}

impl SlotChange {
    /// A supplied file wins over the remove flag.
    pub fn from_parts(file: Option<IncomingFile>, remove: bool) -> Self {
        match (file, remove) {
            (None, true) => SlotChange::Remove,
            (Some(file), _) => SlotChange::Replace(file),
            (None, false) => SlotChange::Keep,
        }
    }
}

pub struct Reconciler<'a> {
    state: &'a AppState,
    owner: Uuid,
    attached: Vec<Uuid>,
}

impl<'a> Reconciler<'a> {
    pub fn new(state: &'a AppState, owner: Uuid) -> Self {
        Self {
            state,
            owner,
            attached: Vec::new(),
        }
    }

    pub async fn slot(
        &mut self,
        current: Option<&StoredFile>,
        change: SlotChange,
    ) -> ApiResult<Option<StoredFile>> {
        match change {
            SlotChange::Keep => Ok(current.cloned()),
            SlotChange::Remove => {
                if let Some(old) = current {
                    self.release(&old.key).await?;
                }
                Ok(None)
            }
            SlotChange::Replace(file) => {
                if let Some(old) = current {
                    match self.release(&old.key).await {
                        Ok(()) => {}
                        Err(ApiError::Storage(e)) => {
                            warn!(key = %old.key, error = ?e, "superseded file not deleted; left for sweep");
                        }
                        Err(e) => return Err(e),
                    }
                }
                self.attach(file).await.map(Some)
            }
        }
    }

    /// Drops the files whose URL is listed in `remove_urls`, then appends `added`.
    pub async fn list(
        &mut self,
        current: &[StoredFile],
        remove_urls: &[String],
        added: Vec<IncomingFile>,
    ) -> ApiResult<Vec<StoredFile>> {
        let mut files = Vec::with_capacity(current.len() + added.len());
        for file in current {
            if remove_urls.iter().any(|url| url.trim() == file.url) {
                self.release(&file.key).await?;
            } else {
                files.push(file.clone());
            }
        }
        for url in remove_urls {
            if !current.iter().any(|f| f.url == url.trim()) {
                debug!(%url, "removal requested for a file not attached; ignored");
            }
        }
        for file in added {
            files.push(self.attach(file).await?);
        }
        Ok(files)
    }

    /// Deletes one object under a delete intent.
    pub async fn release(&self, key: &str) -> ApiResult<()> {
        let intent = self
            .state
            .intents
            .record(IntentKind::Delete, key)
            .await
            .map_err(ApiError::Persistence)?;
        self.state
            .files
            .remove_key(key)
            .await
            .map_err(ApiError::Storage)?;
        if let Err(e) = self.state.intents.complete(intent).await {
            warn!(%key, error = ?e, "delete intent left pending");
        }
        Ok(())
    }

    async fn attach(&mut self, file: IncomingFile) -> ApiResult<StoredFile> {
        let name = unique_name(&file.filename);
        let key = FileGateway::key_for(self.owner, &name);
        let intent = self
            .state
            .intents
            .record(IntentKind::Attach, &key)
            .await
            .map_err(ApiError::Persistence)?;
        let stored = self
            .state
            .files
            .store(self.owner, &name, file.body, &file.content_type)
            .await
            .map_err(ApiError::Storage)?;
        self.attached.push(intent);
        Ok(stored)
    }

    /// Marks every upload of this reconciliation as owned by a persisted entity.
    pub async fn settle(self) {
        for intent in self.attached {
            if let Err(e) = self.state.intents.complete(intent).await {
                warn!(%intent, error = ?e, "attach intent left pending");
            }
        }
    }
}
