use crate::error::FableFileError;
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

/// Identifier of a block inside a single fable.
pub type BlockId = String;

/// Identifier assigned by the backend once a fable has been persisted.
pub type FableId = String;

/// Points at a catalogue entry: the plugin that ships the factory and the factory's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockFactoryId {
    pub plugin: String,
    pub factory: String,
}

impl BlockFactoryId {
    pub fn new(plugin: impl Into<String>, factory: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            factory: factory.into(),
        }
    }
}

impl fmt::Display for BlockFactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plugin, self.factory)
    }
}

/// A single configured block of a fable.
///
/// `input_ids` maps an input slot name to the id of the block feeding it.
/// An empty string marks an unconnected slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInstance {
    pub factory_id: BlockFactoryId,
    #[serde(default)]
    pub configuration_values: AHashMap<String, String>,
    #[serde(default)]
    pub input_ids: AHashMap<String, BlockId>,
}

impl BlockInstance {
    pub fn new(factory_id: BlockFactoryId) -> Self {
        Self {
            factory_id,
            configuration_values: AHashMap::new(),
            input_ids: AHashMap::new(),
        }
    }

    /// Connected inputs as `(input_name, source_block_id)`, sorted by input name.
    pub fn connected_inputs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.input_ids
            .iter()
            .filter(|(_, source)| !source.is_empty())
            .map(|(input, source)| (input.as_str(), source.as_str()))
            .sorted()
    }

    pub fn source_for(&self, input: &str) -> Option<&str> {
        self.input_ids
            .get(input)
            .map(String::as_str)
            .filter(|source| !source.is_empty())
    }
}

/// The serialized forecast pipeline: a map of block id to block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FableDocument {
    #[serde(default)]
    pub blocks: AHashMap<BlockId, BlockInstance>,
}

impl FableDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn get(&self, block_id: &str) -> Option<&BlockInstance> {
        self.blocks.get(block_id)
    }

    pub fn contains(&self, block_id: &str) -> bool {
        self.blocks.contains_key(block_id)
    }

    /// Blocks in id order. Every projection iterates this way so output is stable.
    pub fn sorted_blocks(&self) -> impl Iterator<Item = (&BlockId, &BlockInstance)> {
        self.blocks.iter().sorted_by(|(a, _), (b, _)| a.cmp(b))
    }

    /// Number of non-empty `input_ids` entries across all blocks.
    pub fn connection_count(&self) -> usize {
        self.blocks
            .values()
            .map(|block| block.connected_inputs().count())
            .sum()
    }

    /// Parses a fable from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, FableFileError> {
        serde_json::from_str(json).map_err(|e| FableFileError::Parse(e.to_string()))
    }

    /// Loads a fable from a JSON file on disk.
    pub fn from_file(path: &str) -> Result<Self, FableFileError> {
        let content = fs::read_to_string(path).map_err(|e| FableFileError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }

    /// Pretty JSON with keys in sorted order, so exports diff cleanly.
    pub fn to_json_pretty(&self) -> Result<String, FableFileError> {
        // serde_json's own map is ordered, unlike the block map.
        let value =
            serde_json::to_value(self).map_err(|e| FableFileError::Serialize(e.to_string()))?;
        serde_json::to_string_pretty(&value).map_err(|e| FableFileError::Serialize(e.to_string()))
    }

    /// Writes the fable to a JSON file.
    pub fn save(&self, path: &str) -> Result<(), FableFileError> {
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|e| FableFileError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}
