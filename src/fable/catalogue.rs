use super::definition::BlockFactoryId;
use super::value::{ConfigValue, ValueType};
use crate::error::{BuilderError, FableFileError};
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

/// Block category. The order of the variants is the order of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Source,
    Transform,
    Product,
    Sink,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Source => "source",
            BlockKind::Transform => "transform",
            BlockKind::Product => "product",
            BlockKind::Sink => "sink",
        }
    }

    /// The node type a graph canvas renders a block of this kind with.
    pub fn node_type(&self) -> &'static str {
        match self {
            BlockKind::Source => "sourceBlock",
            BlockKind::Transform => "transformBlock",
            BlockKind::Product => "productBlock",
            BlockKind::Sink => "sinkBlock",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes one configurable setting of a factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationOption {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub value_type: String,
}

impl ConfigurationOption {
    pub fn value_type(&self) -> ValueType {
        ValueType::parse(&self.value_type)
    }
}

/// A block template: what a block of this factory looks like and what it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockFactory {
    pub kind: BlockKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub configuration_options: AHashMap<String, ConfigurationOption>,
    #[serde(default)]
    pub inputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PluginFactories {
    #[serde(default)]
    pub factories: AHashMap<String, BlockFactory>,
}

/// Every factory offered by the installed plugins, keyed by plugin id.
/// Read-only for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockFactoryCatalogue {
    pub plugins: AHashMap<String, PluginFactories>,
}

impl BlockFactoryCatalogue {
    pub fn get(&self, factory_id: &BlockFactoryId) -> Option<&BlockFactory> {
        self.plugins
            .get(&factory_id.plugin)
            .and_then(|plugin| plugin.factories.get(&factory_id.factory))
    }

    pub fn require(&self, factory_id: &BlockFactoryId) -> Result<&BlockFactory, BuilderError> {
        self.get(factory_id)
            .ok_or_else(|| BuilderError::UnknownFactory {
                plugin: factory_id.plugin.clone(),
                factory: factory_id.factory.clone(),
            })
    }

    /// All factories, sorted by plugin and factory name.
    pub fn factories(&self) -> impl Iterator<Item = (BlockFactoryId, &BlockFactory)> {
        self.plugins
            .iter()
            .flat_map(|(plugin, entry)| {
                entry
                    .factories
                    .iter()
                    .map(move |(name, factory)| (BlockFactoryId::new(plugin, name), factory))
            })
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
    }

    pub fn len(&self) -> usize {
        self.plugins.values().map(|p| p.factories.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses a raw user entry for `option` of the given factory into a typed value.
    pub fn parse_option_value(
        &self,
        factory_id: &BlockFactoryId,
        option: &str,
        raw: &str,
    ) -> Result<ConfigValue, BuilderError> {
        let factory = self.require(factory_id)?;
        let descriptor = factory.configuration_options.get(option).ok_or_else(|| {
            BuilderError::UnknownOption {
                factory: factory_id.to_string(),
                option: option.to_string(),
            }
        })?;
        ConfigValue::parse(option, raw, &descriptor.value_type())
    }

    pub fn from_json_str(json: &str) -> Result<Self, FableFileError> {
        serde_json::from_str(json).map_err(|e| FableFileError::Parse(e.to_string()))
    }

    pub fn from_file(path: &str) -> Result<Self, FableFileError> {
        let content = fs::read_to_string(path).map_err(|e| FableFileError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }
}
