use crate::fable::{
    BlockFactoryId, BlockId, BlockState, FableDocument, FableId, ValidationState,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Body of the expand endpoint's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionResponse {
    pub global_errors: Vec<String>,
    pub block_errors: AHashMap<BlockId, Vec<String>>,
    pub possible_sources: Vec<BlockFactoryId>,
    #[serde(default)]
    pub possible_expansions: AHashMap<BlockId, Vec<BlockFactoryId>>,
}

impl ExpansionResponse {
    /// Annotates every block of the validated fable with its errors and expansions.
    ///
    /// Entries for blocks that are not in `fable` are ignored; an empty block id
    /// means the response is malformed.
    pub fn into_state(mut self, fable: &FableDocument) -> Result<ValidationState, String> {
        if self.block_errors.contains_key("") || self.possible_expansions.contains_key("") {
            return Err("response references an empty block id".to_string());
        }

        let block_states: AHashMap<BlockId, BlockState> = fable
            .blocks
            .keys()
            .map(|block_id| {
                let errors = self.block_errors.remove(block_id).unwrap_or_default();
                let possible_expansions = self
                    .possible_expansions
                    .remove(block_id)
                    .unwrap_or_default();
                let state = BlockState {
                    has_errors: !errors.is_empty(),
                    errors,
                    possible_expansions,
                };
                (block_id.clone(), state)
            })
            .collect();

        let is_valid =
            self.global_errors.is_empty() && block_states.values().all(|state| !state.has_errors);

        Ok(ValidationState {
            is_valid,
            global_errors: self.global_errors,
            possible_sources: self.possible_sources,
            block_states,
        })
    }
}

/// Create-or-update request. Without `fable_id` the backend creates a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fable_id: Option<FableId>,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub fable: FableDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertResponse {
    pub fable_id: FableId,
}

/// A persisted fable as returned by the retrieve endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFable {
    pub fable_id: FableId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub fable: FableDocument,
}
