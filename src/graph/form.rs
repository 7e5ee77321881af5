use crate::fable::{BlockFactoryCatalogue, BlockFactoryId, BlockId, BlockKind, FableDocument, ValueType};
use itertools::Itertools;
use serde::Serialize;

/// A configuration field as shown on the form canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub key: String,
    pub title: String,
    pub description: String,
    pub value_type: String,
    /// Current value, `None` when the block has no entry for this option.
    pub value: Option<String>,
}

impl FormField {
    pub fn parsed_type(&self) -> ValueType {
        ValueType::parse(&self.value_type)
    }
}

/// An input slot and the block currently feeding it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormInput {
    pub name: String,
    pub source: Option<BlockId>,
    /// `false` for connections on a slot the factory does not declare.
    pub declared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSection {
    pub block_id: BlockId,
    pub kind: BlockKind,
    pub title: String,
    pub factory: BlockFactoryId,
    pub fields: Vec<FormField>,
    pub inputs: Vec<FormInput>,
}

/// Projects the fable for the form canvas: one section per resolvable block,
/// in pipeline order (sources first, sinks last) and then by id.
pub fn fable_to_form(fable: &FableDocument, catalogue: &BlockFactoryCatalogue) -> Vec<FormSection> {
    fable
        .sorted_blocks()
        .filter_map(|(block_id, block)| {
            let factory = catalogue.get(&block.factory_id)?;

            let fields = factory
                .configuration_options
                .iter()
                .sorted_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(key, option)| FormField {
                    key: key.clone(),
                    title: option.title.clone(),
                    description: option.description.clone(),
                    value_type: option.value_type.clone(),
                    value: block.configuration_values.get(key).cloned(),
                })
                .collect();

            let mut inputs: Vec<FormInput> = factory
                .inputs
                .iter()
                .map(|name| FormInput {
                    name: name.clone(),
                    source: block.source_for(name).map(str::to_string),
                    declared: true,
                })
                .collect();
            inputs.extend(
                block
                    .connected_inputs()
                    .filter(|(name, _)| !factory.inputs.iter().any(|declared| declared.as_str() == *name))
                    .map(|(name, source)| FormInput {
                        name: name.to_string(),
                        source: Some(source.to_string()),
                        declared: false,
                    }),
            );

            Some(FormSection {
                block_id: block_id.clone(),
                kind: factory.kind,
                title: factory.title.clone(),
                factory: block.factory_id.clone(),
                fields,
                inputs,
            })
        })
        .sorted_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.block_id.cmp(&b.block_id)))
        .collect()
}
