//! Prelude module for convenient imports
//!
//! Re-exports the types most builder front-ends need, so a single
//! `use fable_builder::prelude::*;` covers editing, projecting, validating and saving.

// Document model
pub use crate::fable::{
    BlockFactory, BlockFactoryCatalogue, BlockFactoryId, BlockId, BlockInstance, BlockKind,
    ConfigValue, FableDocument, FableId, IntoFable, ValidationState, ValueType,
};

// Editing
pub use crate::builder::{
    BuilderMode, BuilderStep, BuilderStore, DocumentSnapshot, EdgeStyle, ViewState,
};
pub use crate::config::BuilderConfig;

// Projections
pub use crate::graph::{
    FableGraph, GraphEdge, GraphNode, LayoutDirection, LayoutOptions, fable_to_form,
    fable_to_graph, layout_nodes,
};

// Backend
pub use crate::api::{ApiClient, ClientConfig};
pub use crate::persistence::{FableRepository, PersistenceBridge, SaveOutcome};
pub use crate::validation::{
    DEFAULT_DEBOUNCE, FableValidator, ValidationReport, ValidationStatus, ValidationWorker,
};

// Error types
pub use crate::error::{ApiError, BuilderError, FableFileError};

// Result type alias for convenience
pub type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;
