use crate::fable::{BlockFactoryCatalogue, BlockFactoryId, BlockKind, FableDocument, ValidationState};
use serde::Serialize;

/// One factory as offered by the block palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub factory_id: BlockFactoryId,
    pub kind: BlockKind,
    pub title: String,
    /// Whether the factory fits the current fable according to the validator.
    pub available: bool,
}

/// Lists every catalogue factory, sorted by kind and then by id.
///
/// With no validation verdict, or an empty fable, everything is available.
/// Otherwise sources follow `possible_sources` and every other kind needs
/// some block of the fable to list it among its expansions.
pub fn available_factories(
    catalogue: &BlockFactoryCatalogue,
    validation: Option<&ValidationState>,
    document: &FableDocument,
) -> Vec<PaletteEntry> {
    let verdict = validation.filter(|_| !document.is_empty());

    let mut entries: Vec<PaletteEntry> = catalogue
        .factories()
        .map(|(factory_id, factory)| {
            let available = match verdict {
                None => true,
                Some(state) if factory.kind == BlockKind::Source => {
                    state.possible_sources.contains(&factory_id)
                }
                Some(state) => state.can_expand_with(&factory_id),
            };
            PaletteEntry {
                title: factory.title.clone(),
                kind: factory.kind,
                factory_id,
                available,
            }
        })
        .collect();
    entries.sort_by(|a, b| (a.kind, &a.factory_id).cmp(&(b.kind, &b.factory_id)));
    entries
}
