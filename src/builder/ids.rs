use crate::fable::{BlockFactory, FableDocument};
use uuid::Uuid;

/// Generates a block id that does not collide with any block in `document`.
///
/// Ids read as `<kind>_<8 hex chars>`, e.g. `source_1a2b3c4d`. A collision is
/// retried with a new random suffix, falling back to a full uuid.
pub(crate) fn fresh_block_id(document: &FableDocument, factory: &BlockFactory) -> String {
    for _ in 0..8 {
        let suffix = Uuid::new_v4().simple().to_string();
        let candidate = format!("{}_{}", factory.kind.as_str(), &suffix[..8]);
        if !document.contains(&candidate) {
            return candidate;
        }
    }
    loop {
        let candidate = format!("{}_{}", factory.kind.as_str(), Uuid::new_v4().simple());
        if !document.contains(&candidate) {
            return candidate;
        }
    }
}
