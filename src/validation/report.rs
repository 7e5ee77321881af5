use crate::fable::{BlockFactoryId, FableDocument, ValidationState};
use itertools::Itertools;

/// Formats validation results into human-readable text.
pub struct ValidationReport;

impl ValidationReport {
    /// Summarises `state`; block lines name the block's factory when `fable` is given.
    pub fn format(state: &ValidationState, fable: Option<&FableDocument>) -> String {
        let mut lines = Vec::new();
        if state.is_valid {
            lines.push("Fable is valid".to_string());
        } else {
            let count = state.error_count();
            lines.push(format!(
                "Fable is invalid ({} problem{})",
                count,
                if count == 1 { "" } else { "s" }
            ));
        }

        for error in &state.global_errors {
            lines.push(format!("  - {}", error));
        }

        for (block_id, block_state) in state
            .block_states
            .iter()
            .filter(|(_, s)| s.has_errors)
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
        {
            let factory = fable
                .and_then(|f| f.get(block_id))
                .map(|block| format!(" ({})", block.factory_id))
                .unwrap_or_default();
            lines.push(format!("  {}{}:", block_id, factory));
            for error in &block_state.errors {
                lines.push(format!("    - {}", error));
            }
        }

        if !state.possible_sources.is_empty() {
            lines.push(format!(
                "Possible sources: {}",
                Self::format_factories(&state.possible_sources)
            ));
        }
        lines.join("\n")
    }

    fn format_factories(factories: &[BlockFactoryId]) -> String {
        factories.iter().sorted().map(|f| f.to_string()).join(", ")
    }
}
