//! Tests for the builder store: document operations, dirty tracking and snapshots.
mod common;
use ahash::AHashSet;
use common::*;
use fable_builder::prelude::*;

#[test]
fn test_new_store_is_empty_and_clean() {
    let store = BuilderStore::new();
    assert!(store.document().is_empty());
    assert!(!store.is_dirty());
    assert_eq!(store.fable_id(), None);
    assert_eq!(store.fable_name(), "Untitled Fable");
    assert_eq!(store.step(), BuilderStep::Edit);
    assert_eq!(store.version(), 0);
    assert_eq!(store.view(), &ViewState::default());
    assert!(store.last_saved_at().is_none());
}

#[test]
fn test_add_block_inserts_selects_and_marks_dirty() {
    let catalogue = catalogue();
    let mut store = BuilderStore::new();

    let block_id = add(&mut store, &catalogue, source_id());

    assert!(block_id.starts_with("source_"));
    let block = store.document().get(&block_id).expect("block was added");
    assert_eq!(block.factory_id, source_id());
    assert!(block.configuration_values.is_empty());
    assert!(block.input_ids.is_empty());
    assert_eq!(store.selected_block_id(), Some(block_id.as_str()));
    assert!(store.is_dirty());
    assert_eq!(store.version(), 1);
}

#[test]
fn test_block_ids_never_collide() {
    let catalogue = catalogue();
    let mut store = BuilderStore::new();
    let mut seen = AHashSet::new();

    for i in 0..500 {
        let factory = if i % 2 == 0 { sink_id() } else { transform_id() };
        let block_id = add(&mut store, &catalogue, factory);
        assert!(seen.insert(block_id), "duplicate block id after {} adds", i);
    }
    assert_eq!(store.document().len(), 500);
}

#[test]
fn test_remove_block_clears_references() {
    let catalogue = catalogue();
    let mut store = BuilderStore::new();
    let source = add(&mut store, &catalogue, source_id());
    let stats = add(&mut store, &catalogue, transform_id());
    let sink = add(&mut store, &catalogue, sink_id());
    store.connect_blocks(&stats, "dataset", &source).unwrap();
    store.connect_blocks(&sink, "dataset", &stats).unwrap();

    let removed = store.remove_block(&source).unwrap();
    assert_eq!(removed.factory_id, source_id());

    assert!(!store.document().contains(&source));
    for (_, block) in store.document().sorted_blocks() {
        assert!(block.input_ids.values().all(|id| id != &source));
    }
    // Downstream blocks survive, only their link is cut.
    let stats_block = store.document().get(&stats).unwrap();
    assert_eq!(stats_block.input_ids.get("dataset").map(String::as_str), Some(""));
    assert_eq!(stats_block.source_for("dataset"), None);
    assert_eq!(store.document().get(&sink).unwrap().source_for("dataset"), Some(stats.as_str()));
}

#[test]
fn test_unknown_block_is_rejected_without_changes() {
    let catalogue = catalogue();
    let (mut store, _, sink) = source_to_sink(&catalogue);
    let before = store.document().clone();
    let version = store.version();

    assert_eq!(
        store.remove_block("nope"),
        Err(BuilderError::UnknownBlock("nope".to_string()))
    );
    assert!(matches!(
        store.connect_blocks("nope", "dataset", &sink),
        Err(BuilderError::UnknownBlock(_))
    ));
    assert!(store.disconnect_block("nope", "dataset").is_err());
    assert!(store
        .update_block_config("nope", "path", ConfigValue::Text("/tmp".to_string()))
        .is_err());
    assert!(store.select_block(Some("nope")).is_err());

    assert_eq!(store.document(), &before);
    assert_eq!(store.version(), version);
    assert_eq!(store.selected_block_id(), Some(sink.as_str()));
}

#[test]
fn test_connect_and_disconnect() {
    let catalogue = catalogue();
    let (mut store, source, sink) = source_to_sink(&catalogue);
    assert_eq!(store.document().connection_count(), 1);
    assert_eq!(
        store.document().get(&sink).unwrap().source_for("dataset"),
        Some(source.as_str())
    );

    store.disconnect_block(&sink, "dataset").unwrap();
    assert_eq!(store.document().connection_count(), 0);
    assert!(store.document().get(&sink).unwrap().input_ids.contains_key("dataset"));
}

#[test]
fn test_update_block_config_stores_wire_string() {
    let catalogue = catalogue();
    let mut store = BuilderStore::new();
    let source = add(&mut store, &catalogue, source_id());

    store
        .update_block_config_raw(&source, "date", " 2024-03-01 ", &catalogue)
        .unwrap();
    store
        .update_block_config_raw(&source, "source", "mars", &catalogue)
        .unwrap();

    let values = &store.document().get(&source).unwrap().configuration_values;
    assert_eq!(values.get("date").map(String::as_str), Some("2024-03-01"));
    assert_eq!(values.get("source").map(String::as_str), Some("mars"));
}

#[test]
fn test_update_block_config_rejects_bad_values() {
    let catalogue = catalogue();
    let mut store = BuilderStore::new();
    let source = add(&mut store, &catalogue, source_id());
    let version = store.version();

    let err = store
        .update_block_config_raw(&source, "source", "fdb", &catalogue)
        .unwrap_err();
    assert!(matches!(err, BuilderError::InvalidValue { ref option, .. } if option == "source"));

    let err = store
        .update_block_config_raw(&source, "resolution", "0.25", &catalogue)
        .unwrap_err();
    assert!(matches!(err, BuilderError::UnknownOption { .. }));

    assert!(store.document().get(&source).unwrap().configuration_values.is_empty());
    assert_eq!(store.version(), version);
}

#[test]
fn test_clearing_a_value_is_allowed() {
    let catalogue = catalogue();
    let mut store = BuilderStore::new();
    let source = add(&mut store, &catalogue, source_id());
    store
        .update_block_config_raw(&source, "date", "2024-03-01", &catalogue)
        .unwrap();

    store
        .update_block_config_raw(&source, "date", "", &catalogue)
        .unwrap();

    let values = &store.document().get(&source).unwrap().configuration_values;
    assert_eq!(values.get("date").map(String::as_str), Some(""));
}

#[test]
fn test_set_fable_resets_selection_and_dirty() {
    let catalogue = catalogue();
    let (mut store, _, _) = source_to_sink(&catalogue);
    assert!(store.is_dirty());
    assert!(store.selected_block_id().is_some());
    let generation = store.generation();

    store.set_fable(diamond_fable(), Some("fable-7".to_string()));

    assert_eq!(store.document(), &diamond_fable());
    assert_eq!(store.fable_id(), Some("fable-7"));
    assert_eq!(store.selected_block_id(), None);
    assert!(!store.is_dirty());
    assert_eq!(store.generation(), generation + 1);
}

#[test]
fn test_set_fable_is_idempotent() {
    let mut store = BuilderStore::new();
    store.set_fable(diamond_fable(), None);
    let first = store.document().clone();

    store.set_fable(diamond_fable(), None);

    assert_eq!(store.document(), &first);
    assert!(!store.is_dirty());
    assert_eq!(store.selected_block_id(), None);
}

#[test]
fn test_load_and_new_fable() {
    let mut store = BuilderStore::with_default_name("Scratch");
    assert_eq!(store.fable_name(), "Scratch");

    store.load_fable(diamond_fable(), Some("fable-3".to_string()), "Ensemble maps");
    assert_eq!(store.fable_name(), "Ensemble maps");
    assert!(!store.is_dirty());

    store.set_step(BuilderStep::Review);
    store.new_fable();
    assert!(store.document().is_empty());
    assert_eq!(store.fable_id(), None);
    assert_eq!(store.fable_name(), "Scratch");
    assert_eq!(store.step(), BuilderStep::Edit);
    assert!(!store.is_dirty());
}

#[test]
fn test_name_and_save_bookkeeping() {
    let mut store = BuilderStore::new();
    store.set_fable_name("Wind gusts");
    assert!(store.is_dirty());
    assert_eq!(store.version(), 0);
    assert_eq!(store.revision(), 1);

    store.mark_saved("fable-1".to_string(), "Wind gusts");
    assert!(!store.is_dirty());
    assert_eq!(store.fable_id(), Some("fable-1"));
    assert!(store.last_saved_at().is_some());

    store.mark_dirty();
    assert!(store.is_dirty());
    assert_eq!(store.revision(), 2);
}

#[test]
fn test_view_flags_do_not_touch_the_document() {
    let catalogue = catalogue();
    let (mut store, _, _) = source_to_sink(&catalogue);
    store.mark_saved("fable-1".to_string(), "Saved");
    let version = store.version();

    store.set_mode(BuilderMode::Form);
    store.set_layout_direction(LayoutDirection::TopToBottom);
    store.set_auto_layout(false);
    store.set_edge_style(EdgeStyle::SmoothStep);
    store.set_nodes_locked(true);
    store.set_palette_open(false);
    store.set_config_panel_open(false);
    store.set_step(BuilderStep::Review);
    store.select_block(None).unwrap();

    let view = store.view();
    assert_eq!(view.mode, BuilderMode::Form);
    assert_eq!(view.layout_direction, LayoutDirection::TopToBottom);
    assert!(!view.auto_layout);
    assert_eq!(view.edge_style, EdgeStyle::SmoothStep);
    assert!(view.nodes_locked);
    assert!(!view.palette_open);
    assert!(!view.config_panel_open);
    assert_eq!(store.version(), version);
    assert!(!store.is_dirty());
}

#[test]
fn test_snapshots_follow_document_changes() {
    let catalogue = catalogue();
    let mut store = BuilderStore::new();
    let mut snapshots = store.subscribe();

    let source = add(&mut store, &catalogue, source_id());
    assert!(snapshots.has_changed().unwrap());
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.version, store.version());
    assert!(snapshot.document.contains(&source));

    // UI-only changes publish nothing.
    store.set_mode(BuilderMode::Form);
    store.select_block(Some(source.as_str())).unwrap();
    assert!(!snapshots.has_changed().unwrap());

    store.remove_block(&source).unwrap();
    assert!(snapshots.has_changed().unwrap());
    assert!(snapshots.borrow().document.is_empty());
    assert_eq!(store.snapshot().version, store.version());
}

#[test]
fn test_lone_source_can_reach_review() {
    let catalogue = catalogue();
    let mut store = BuilderStore::new();
    add(&mut store, &catalogue, source_id());

    store.set_step(BuilderStep::Review);

    assert_eq!(store.step(), BuilderStep::Review);
    store.set_step(BuilderStep::Edit);
    assert_eq!(store.step(), BuilderStep::Edit);
}

#[test]
fn test_store_from_config() {
    let config = BuilderConfig {
        default_fable_name: "Draft".to_string(),
        ..BuilderConfig::default()
    };
    let store = config.new_store();
    assert_eq!(store.fable_name(), "Draft");
}
