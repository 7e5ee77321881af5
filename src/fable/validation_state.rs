use super::definition::{BlockFactoryId, BlockId};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Per-block verdict of the remote validator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockState {
    pub has_errors: bool,
    pub errors: Vec<String>,
    /// Factories that could consume this block's output.
    pub possible_expansions: Vec<BlockFactoryId>,
}

/// The validator's annotation of a whole fable. Never edited by the user;
/// it is replaced each time the document is validated again.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationState {
    pub is_valid: bool,
    pub global_errors: Vec<String>,
    /// Source factories that may be added to the fable.
    pub possible_sources: Vec<BlockFactoryId>,
    pub block_states: AHashMap<BlockId, BlockState>,
}

impl ValidationState {
    pub fn block(&self, block_id: &str) -> Option<&BlockState> {
        self.block_states.get(block_id)
    }

    pub fn error_count(&self) -> usize {
        self.global_errors.len()
            + self
                .block_states
                .values()
                .map(|state| state.errors.len())
                .sum::<usize>()
    }

    /// Whether any block in the fable can be extended with `factory_id`.
    pub fn can_expand_with(&self, factory_id: &BlockFactoryId) -> bool {
        self.block_states
            .values()
            .any(|state| state.possible_expansions.contains(factory_id))
    }
}
