use super::ids::fresh_block_id;
use super::session::{BuilderMode, BuilderStep, EdgeStyle, ViewState};
use crate::error::BuilderError;
use crate::fable::{
    BlockFactory, BlockFactoryCatalogue, BlockFactoryId, BlockId, BlockInstance, ConfigValue,
    FableDocument, FableId,
};
use crate::graph::LayoutDirection;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Name given to a fable that has not been named yet.
pub const DEFAULT_FABLE_NAME: &str = "Untitled Fable";

/// The document as of one version, published after every document change.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub version: u64,
    pub document: Arc<FableDocument>,
}

/// The single source of truth for the fable being edited and the builder's UI state.
///
/// Every document change goes through a named operation, bumps `version` and
/// publishes a [`DocumentSnapshot`] to subscribers. Operations that refer to
/// an unknown block return [`BuilderError::UnknownBlock`] and change nothing.
#[derive(Debug)]
pub struct BuilderStore {
    document: FableDocument,
    fable_id: Option<FableId>,
    fable_name: String,
    default_name: String,
    is_dirty: bool,
    selected_block_id: Option<BlockId>,
    step: BuilderStep,
    view: ViewState,
    last_saved_at: Option<DateTime<Utc>>,
    version: u64,
    generation: u64,
    revision: u64,
    snapshots: watch::Sender<DocumentSnapshot>,
}

impl Default for BuilderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BuilderStore {
    pub fn new() -> Self {
        Self::with_default_name(DEFAULT_FABLE_NAME)
    }

    /// Creates an empty store whose unnamed fables are called `default_name`.
    pub fn with_default_name(default_name: impl Into<String>) -> Self {
        let default_name = default_name.into();
        let (snapshots, _) = watch::channel(DocumentSnapshot {
            version: 0,
            document: Arc::new(FableDocument::new()),
        });
        Self {
            document: FableDocument::new(),
            fable_id: None,
            fable_name: default_name.clone(),
            default_name,
            is_dirty: false,
            selected_block_id: None,
            step: BuilderStep::Edit,
            view: ViewState::default(),
            last_saved_at: None,
            version: 0,
            generation: 0,
            revision: 0,
            snapshots,
        }
    }

    // --- Accessors ---

    pub fn document(&self) -> &FableDocument {
        &self.document
    }

    pub fn fable_id(&self) -> Option<&str> {
        self.fable_id.as_deref()
    }

    pub fn fable_name(&self) -> &str {
        &self.fable_name
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn selected_block_id(&self) -> Option<&str> {
        self.selected_block_id.as_deref()
    }

    pub fn step(&self) -> BuilderStep {
        self.step
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Monotonic counter bumped on every document change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Bumped each time the document is replaced wholesale (load, import, new fable).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bumped on every change that makes the store dirty, including renames
    /// and [`Self::mark_dirty`], which leave `version` alone.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receives a snapshot after every document change. The receiver observes
    /// `changed()` once the store is dropped.
    pub fn subscribe(&self) -> watch::Receiver<DocumentSnapshot> {
        self.snapshots.subscribe()
    }

    // --- Document operations ---

    /// Replaces the document wholesale. Used for loading, importing and resetting.
    pub fn set_fable(&mut self, document: FableDocument, fable_id: Option<FableId>) {
        debug!(
            blocks = document.len(),
            fable_id = ?fable_id,
            "Replacing fable document"
        );
        self.document = document;
        self.fable_id = fable_id;
        self.selected_block_id = None;
        self.generation += 1;
        self.document_changed(false);
        self.is_dirty = false;
    }

    /// `set_fable` plus the fable's stored name. Leaves the store clean.
    pub fn load_fable(
        &mut self,
        document: FableDocument,
        fable_id: Option<FableId>,
        fable_name: impl Into<String>,
    ) {
        self.set_fable(document, fable_id);
        self.fable_name = fable_name.into();
    }

    /// Starts over with an empty, unnamed fable on the edit step.
    pub fn new_fable(&mut self) {
        self.set_fable(FableDocument::new(), None);
        self.fable_name = self.default_name.clone();
        self.step = BuilderStep::Edit;
        self.last_saved_at = None;
    }

    /// Inserts an unconfigured block of the given factory and selects it.
    pub fn add_block(&mut self, factory_id: BlockFactoryId, factory: &BlockFactory) -> BlockId {
        let block_id = fresh_block_id(&self.document, factory);
        debug!(block_id = %block_id, factory = %factory_id, "Adding block");
        self.document
            .blocks
            .insert(block_id.clone(), BlockInstance::new(factory_id));
        self.selected_block_id = Some(block_id.clone());
        self.document_changed(true);
        block_id
    }

    /// Deletes a block and disconnects every input that pointed at it.
    ///
    /// Downstream blocks are kept. Clearing the selection is up to the caller.
    pub fn remove_block(&mut self, block_id: &str) -> Result<BlockInstance, BuilderError> {
        let removed = self
            .document
            .blocks
            .remove(block_id)
            .ok_or_else(|| unknown_block(block_id))?;

        let mut disconnected = 0;
        for block in self.document.blocks.values_mut() {
            for source in block.input_ids.values_mut() {
                if *source == block_id {
                    source.clear();
                    disconnected += 1;
                }
            }
        }
        debug!(block_id, disconnected, "Removed block");
        self.document_changed(true);
        Ok(removed)
    }

    pub fn update_block_config(
        &mut self,
        block_id: &str,
        option: &str,
        value: ConfigValue,
    ) -> Result<(), BuilderError> {
        let block = self.block_mut(block_id)?;
        block
            .configuration_values
            .insert(option.to_string(), value.to_string());
        debug!(block_id, option, "Updated block configuration");
        self.document_changed(true);
        Ok(())
    }

    /// Parses `raw` against the option's declared type, then stores it.
    pub fn update_block_config_raw(
        &mut self,
        block_id: &str,
        option: &str,
        raw: &str,
        catalogue: &BlockFactoryCatalogue,
    ) -> Result<(), BuilderError> {
        let factory_id = self
            .document
            .get(block_id)
            .map(|block| block.factory_id.clone())
            .ok_or_else(|| unknown_block(block_id))?;
        let value = catalogue.parse_option_value(&factory_id, option, raw)?;
        self.update_block_config(block_id, option, value)
    }

    /// Feeds `input` of `target` from `source`. Compatibility is the validator's concern.
    pub fn connect_blocks(
        &mut self,
        target: &str,
        input: &str,
        source: &str,
    ) -> Result<(), BuilderError> {
        let block = self.block_mut(target)?;
        block.input_ids.insert(input.to_string(), source.to_string());
        debug!(target_block = target, input, source_block = source, "Connected blocks");
        self.document_changed(true);
        Ok(())
    }

    pub fn disconnect_block(&mut self, target: &str, input: &str) -> Result<(), BuilderError> {
        let block = self.block_mut(target)?;
        block.input_ids.insert(input.to_string(), String::new());
        debug!(target_block = target, input, "Disconnected input");
        self.document_changed(true);
        Ok(())
    }

    pub fn set_fable_name(&mut self, name: impl Into<String>) {
        self.fable_name = name.into();
        self.touch();
    }

    pub fn mark_dirty(&mut self) {
        self.touch();
    }

    /// Records a successful save. Only call this once the backend has confirmed it.
    pub fn mark_saved(&mut self, fable_id: FableId, fable_name: impl Into<String>) {
        self.fable_id = Some(fable_id);
        self.fable_name = fable_name.into();
        self.is_dirty = false;
        self.last_saved_at = Some(Utc::now());
    }

    /// Records the id of a save whose fable has been edited or renamed since.
    /// The current name is kept and the store stays dirty.
    pub(crate) fn mark_saved_outdated(&mut self, fable_id: FableId) {
        self.fable_id = Some(fable_id);
        self.last_saved_at = Some(Utc::now());
    }

    // --- UI state ---

    pub fn select_block(&mut self, block_id: Option<&str>) -> Result<(), BuilderError> {
        if let Some(id) = block_id {
            if !self.document.contains(id) {
                return Err(unknown_block(id));
            }
        }
        self.selected_block_id = block_id.map(str::to_string);
        Ok(())
    }

    pub fn set_step(&mut self, step: BuilderStep) {
        self.step = step;
    }

    pub fn set_mode(&mut self, mode: BuilderMode) {
        self.view.mode = mode;
    }

    pub fn set_layout_direction(&mut self, direction: LayoutDirection) {
        self.view.layout_direction = direction;
    }

    pub fn set_auto_layout(&mut self, enabled: bool) {
        self.view.auto_layout = enabled;
    }

    pub fn set_edge_style(&mut self, style: EdgeStyle) {
        self.view.edge_style = style;
    }

    pub fn set_nodes_locked(&mut self, locked: bool) {
        self.view.nodes_locked = locked;
    }

    pub fn set_palette_open(&mut self, open: bool) {
        self.view.palette_open = open;
    }

    pub fn set_config_panel_open(&mut self, open: bool) {
        self.view.config_panel_open = open;
    }

    fn block_mut(&mut self, block_id: &str) -> Result<&mut BlockInstance, BuilderError> {
        self.document
            .blocks
            .get_mut(block_id)
            .ok_or_else(|| unknown_block(block_id))
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.is_dirty = true;
    }

    fn document_changed(&mut self, dirty: bool) {
        self.version += 1;
        if dirty {
            self.touch();
        }
        self.snapshots.send_replace(DocumentSnapshot {
            version: self.version,
            document: Arc::new(self.document.clone()),
        });
    }
}

fn unknown_block(block_id: &str) -> BuilderError {
    warn!(block_id, "Operation on a block that is not in the fable");
    BuilderError::UnknownBlock(block_id.to_string())
}
