//! # fable-builder - Client Core for Forecast Pipeline Builders
//!
//! **fable-builder** holds everything a forecast-pipeline builder needs below its views.
//! A *fable* is a directed graph of blocks (sources, transforms, products, sinks) produced
//! by factories from a remote catalogue. This crate edits fables, projects them for graph
//! and form canvases, keeps them validated against the backend, and saves them.
//!
//! ## Core Workflow
//!
//! 1.  **Fetch the catalogue**: `ApiClient::catalogue` loads the available block factories once.
//! 2.  **Edit**: `BuilderStore` owns the fable. Every change goes through a named operation and
//!     publishes a versioned snapshot.
//! 3.  **Validate**: a `ValidationWorker` listens to those snapshots, debounces bursts of edits and
//!     keeps the latest `ValidationStatus` for the current version only.
//! 4.  **Render**: `fable_to_graph` and `layout_nodes` produce canvas nodes and edges;
//!     `fable_to_form` produces the form view.
//! 5.  **Save**: `PersistenceBridge::save` creates the fable remotely on first save and updates it
//!     afterwards.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fable_builder::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Arc::new(ApiClient::new(ClientConfig::from_env())?);
//!     let catalogue = client.catalogue().await?.clone();
//!
//!     let mut store = BuilderStore::new();
//!     let mut validation = ValidationWorker::spawn(client.clone(), store.subscribe(), DEFAULT_DEBOUNCE);
//!
//!     let source_id = BlockFactoryId::new("ecmwf", "ekdSource");
//!     let sink_id = BlockFactoryId::new("ecmwf", "zarrSink");
//!     let source = store.add_block(source_id.clone(), catalogue.require(&source_id)?);
//!     let sink = store.add_block(sink_id.clone(), catalogue.require(&sink_id)?);
//!     store.connect_blocks(&sink, "dataset", &source)?;
//!
//!     let version = store.version();
//!     let status = validation
//!         .wait_for(|s| s.validated_version == Some(version))
//!         .await;
//!     if let Some(state) = status.and_then(|s| s.state) {
//!         println!("{}", ValidationReport::format(&state, Some(store.document())));
//!     }
//!
//!     let graph = fable_to_graph(store.document(), &catalogue);
//!     let nodes = layout_nodes(&graph.nodes, &graph.edges, &LayoutOptions::default());
//!     println!("{} nodes laid out", nodes.len());
//!
//!     store.set_fable_name("Temperature to zarr");
//!     let outcome = PersistenceBridge::save(&mut store, client.as_ref(), vec![]).await?;
//!     println!("Saved as {}", outcome.fable_id());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod builder;
pub mod config;
pub mod error;
pub mod fable;
pub mod graph;
pub mod palette;
pub mod persistence;
pub mod prelude;
pub mod review;
pub mod validation;
