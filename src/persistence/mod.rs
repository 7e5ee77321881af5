//! Maps the store's save and load intents onto the backend's upsert and retrieve calls.
//!
//! Nothing here retries. A failed call leaves the store as it was (a failed
//! save keeps it dirty), and the error is handed back to the caller.

use crate::api::{StoredFable, UpsertRequest};
use crate::builder::BuilderStore;
use crate::error::ApiError;
use crate::fable::FableId;
use async_trait::async_trait;
use tracing::{info, warn};

/// Remote create-or-update and load-by-id of fables.
#[async_trait]
pub trait FableRepository: Send + Sync {
    /// Creates a fable when `request.fable_id` is `None`, updates it in place otherwise.
    async fn upsert(&self, request: UpsertRequest) -> Result<FableId, ApiError>;

    async fn retrieve(&self, fable_id: &str) -> Result<StoredFable, ApiError>;
}

/// What the store looked like when a save was started.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub revision: u64,
    pub generation: u64,
    pub request: UpsertRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The saved document is the current one; the store is clean.
    Saved { fable_id: FableId },
    /// The fable was edited or renamed while saving. The id is recorded but the store stays dirty.
    SavedOutdated { fable_id: FableId },
    /// The fable was replaced while saving; the store was left alone.
    Discarded { fable_id: FableId },
}

impl SaveOutcome {
    pub fn fable_id(&self) -> &str {
        match self {
            SaveOutcome::Saved { fable_id }
            | SaveOutcome::SavedOutdated { fable_id }
            | SaveOutcome::Discarded { fable_id } => fable_id,
        }
    }
}

pub struct PersistenceBridge;

impl PersistenceBridge {
    /// Captures the current document, id and name as an upsert request.
    pub fn prepare_save(store: &BuilderStore, tags: Vec<String>) -> SaveTicket {
        SaveTicket {
            revision: store.revision(),
            generation: store.generation(),
            request: UpsertRequest {
                fable_id: store.fable_id().map(str::to_string),
                name: store.fable_name().to_string(),
                tags,
                fable: store.document().clone(),
            },
        }
    }

    /// Applies the backend's answer to a save started with [`Self::prepare_save`].
    pub fn finish_save(
        store: &mut BuilderStore,
        ticket: SaveTicket,
        result: Result<FableId, ApiError>,
    ) -> Result<SaveOutcome, ApiError> {
        let fable_id = result.inspect_err(|e| {
            warn!(error = %e, fable_id = ?ticket.request.fable_id, "Saving fable failed");
        })?;

        if store.generation() != ticket.generation {
            warn!(fable_id = %fable_id, "Fable was replaced while saving; ignoring save result");
            return Ok(SaveOutcome::Discarded { fable_id });
        }
        if store.revision() != ticket.revision {
            info!(fable_id = %fable_id, "Saved fable, but it was edited meanwhile");
            store.mark_saved_outdated(fable_id.clone());
            return Ok(SaveOutcome::SavedOutdated { fable_id });
        }

        info!(fable_id = %fable_id, name = %ticket.request.name, "Saved fable");
        store.mark_saved(fable_id.clone(), ticket.request.name);
        Ok(SaveOutcome::Saved { fable_id })
    }

    /// Saves the current fable: creates it on first save, updates it afterwards.
    pub async fn save<R: FableRepository + ?Sized>(
        store: &mut BuilderStore,
        repository: &R,
        tags: Vec<String>,
    ) -> Result<SaveOutcome, ApiError> {
        let ticket = Self::prepare_save(store, tags);
        let result = repository.upsert(ticket.request.clone()).await;
        Self::finish_save(store, ticket, result)
    }

    /// Loads a stored fable into the store. On any error the store is untouched.
    pub async fn load<R: FableRepository + ?Sized>(
        store: &mut BuilderStore,
        repository: &R,
        fable_id: &str,
    ) -> Result<(), ApiError> {
        let stored = repository.retrieve(fable_id).await.inspect_err(|e| {
            warn!(fable_id, error = %e, "Loading fable failed");
        })?;

        info!(fable_id, blocks = stored.fable.len(), "Loaded fable");
        if stored.name.is_empty() {
            let name = store.fable_name().to_string();
            store.load_fable(stored.fable, Some(stored.fable_id), name);
        } else {
            store.load_fable(stored.fable, Some(stored.fable_id), stored.name);
        }
        Ok(())
    }
}
