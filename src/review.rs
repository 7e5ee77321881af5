use crate::api::ApiClient;
use crate::builder::{BuilderStep, BuilderStore};
use crate::error::ApiError;
use crate::fable::FableDocument;
use crate::validation::ValidationStatus;
use tracing::info;

/// Whether the fable in `store` may be submitted.
///
/// Requires the review step and a non-empty fable. A validation verdict that
/// is still unknown does not block submission; a known invalid one does, and
/// so does a verdict for an older version of the document.
pub fn can_submit(store: &BuilderStore, status: &ValidationStatus) -> bool {
    let verdict_is_current = status
        .validated_version
        .is_none_or(|version| version == store.version());
    store.step() == BuilderStep::Review
        && !store.document().is_empty()
        && verdict_is_current
        && status.is_valid().unwrap_or(true)
}

/// Compiles `fable` remotely and returns the backend's job description untouched.
pub async fn compile(client: &ApiClient, fable: &FableDocument) -> Result<serde_json::Value, ApiError> {
    let compiled = client.compile_fable(fable).await?;
    info!(blocks = fable.len(), "Compiled fable");
    Ok(compiled)
}
