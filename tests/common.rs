//! Common test utilities: a small catalogue, store builders and in-memory backends.
use ahash::AHashMap;
use async_trait::async_trait;
use fable_builder::api::{StoredFable, UpsertRequest};
use fable_builder::persistence::FableRepository;
use fable_builder::prelude::*;
use fable_builder::fable::BlockState;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Two plugins: a full source -> transform -> product/sink chain from `ecmwf`
/// and a second source from `anemoi`.
#[allow(dead_code)]
pub const CATALOGUE_JSON: &str = r#"
{
  "ecmwf": {
    "factories": {
      "ekdSource": {
        "kind": "source",
        "title": "Earthkit Data Source",
        "description": "Fetches fields from MARS or open data",
        "configuration_options": {
          "source": { "title": "Source", "value_type": "enum[mars,ecmwf-open-data]" },
          "date": { "title": "Date", "value_type": "date-iso8601" },
          "expver": { "title": "Experiment Version", "value_type": "str" }
        },
        "inputs": []
      },
      "ensembleStatistics": {
        "kind": "transform",
        "title": "Ensemble Statistics",
        "configuration_options": {
          "statistic": { "title": "Statistic", "value_type": "enum[mean,std]" },
          "members": { "title": "Members", "value_type": "int" }
        },
        "inputs": ["dataset"]
      },
      "temperatureMap": {
        "kind": "product",
        "title": "Temperature Map",
        "inputs": ["dataset"]
      },
      "zarrSink": {
        "kind": "sink",
        "title": "Zarr Sink",
        "configuration_options": {
          "path": { "title": "Path", "value_type": "str" }
        },
        "inputs": ["dataset"]
      }
    }
  },
  "anemoi": {
    "factories": {
      "anemoiSource": {
        "kind": "source",
        "title": "Anemoi Inference",
        "configuration_options": {
          "lead_time": { "title": "Lead Time", "value_type": "int" }
        }
      }
    }
  }
}
"#;

/// Routes the crate's logs through the test harness. `RUST_LOG` picks the level.
#[allow(dead_code)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fable_builder=debug")),
        )
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn catalogue() -> BlockFactoryCatalogue {
    BlockFactoryCatalogue::from_json_str(CATALOGUE_JSON).expect("fixture catalogue parses")
}

#[allow(dead_code)]
pub fn source_id() -> BlockFactoryId {
    BlockFactoryId::new("ecmwf", "ekdSource")
}

#[allow(dead_code)]
pub fn transform_id() -> BlockFactoryId {
    BlockFactoryId::new("ecmwf", "ensembleStatistics")
}

#[allow(dead_code)]
pub fn product_id() -> BlockFactoryId {
    BlockFactoryId::new("ecmwf", "temperatureMap")
}

#[allow(dead_code)]
pub fn sink_id() -> BlockFactoryId {
    BlockFactoryId::new("ecmwf", "zarrSink")
}

#[allow(dead_code)]
pub fn anemoi_source_id() -> BlockFactoryId {
    BlockFactoryId::new("anemoi", "anemoiSource")
}

/// Adds a block of `factory_id` to `store`, looking the factory up in `catalogue`.
#[allow(dead_code)]
pub fn add(store: &mut BuilderStore, catalogue: &BlockFactoryCatalogue, factory_id: BlockFactoryId) -> BlockId {
    let factory = catalogue.require(&factory_id).expect("factory is in the fixture catalogue");
    store.add_block(factory_id, factory)
}

/// A store holding `source -> sink`. Returns the store and both block ids.
#[allow(dead_code)]
pub fn source_to_sink(catalogue: &BlockFactoryCatalogue) -> (BuilderStore, BlockId, BlockId) {
    let mut store = BuilderStore::new();
    let source = add(&mut store, catalogue, source_id());
    let sink = add(&mut store, catalogue, sink_id());
    store
        .connect_blocks(&sink, "dataset", &source)
        .expect("sink exists");
    (store, source, sink)
}

/// A document built by hand, with fixed ids: `src -> stats -> sink` plus `src -> map`.
#[allow(dead_code)]
pub fn diamond_fable() -> FableDocument {
    let mut fable = FableDocument::new();
    fable
        .blocks
        .insert("src".to_string(), BlockInstance::new(source_id()));
    for (id, factory) in [("stats", transform_id()), ("map", product_id())] {
        let mut block = BlockInstance::new(factory);
        block
            .input_ids
            .insert("dataset".to_string(), "src".to_string());
        fable.blocks.insert(id.to_string(), block);
    }
    let mut sink = BlockInstance::new(sink_id());
    sink.input_ids
        .insert("dataset".to_string(), "stats".to_string());
    fable.blocks.insert("sink".to_string(), sink);
    fable
}

/// A validator with simple local rules: a fable needs a sink, and every
/// declared input must be connected. Counts calls and can be slowed down or
/// made to fail.
#[allow(dead_code)]
pub struct RuleValidator {
    catalogue: BlockFactoryCatalogue,
    delay: Duration,
    calls: AtomicUsize,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl RuleValidator {
    pub fn new(catalogue: BlockFactoryCatalogue) -> Self {
        Self {
            catalogue,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Every call takes `delay` of (tokio) time before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn check(&self, fable: &FableDocument) -> ValidationState {
        let mut global_errors = Vec::new();
        let has_sink = fable.blocks.values().any(|block| {
            self.catalogue
                .get(&block.factory_id)
                .is_some_and(|factory| factory.kind == BlockKind::Sink)
        });
        if !has_sink {
            global_errors.push("Fable has no sink".to_string());
        }

        let expansions: Vec<BlockFactoryId> = self
            .catalogue
            .factories()
            .filter(|(_, factory)| factory.kind != BlockKind::Source)
            .map(|(id, _)| id)
            .collect();

        let mut block_states = AHashMap::new();
        for (block_id, block) in &fable.blocks {
            let mut state = BlockState::default();
            match self.catalogue.get(&block.factory_id) {
                None => state
                    .errors
                    .push(format!("Unknown factory {}", block.factory_id)),
                Some(factory) => {
                    for input in &factory.inputs {
                        if block.source_for(input).is_none() {
                            state.errors.push(format!("Input '{}' is not connected", input));
                        }
                    }
                    if factory.kind != BlockKind::Sink {
                        state.possible_expansions = expansions.clone();
                    }
                }
            }
            state.has_errors = !state.errors.is_empty();
            block_states.insert(block_id.clone(), state);
        }

        let is_valid =
            global_errors.is_empty() && block_states.values().all(|s: &BlockState| !s.has_errors);
        ValidationState {
            is_valid,
            global_errors,
            possible_sources: self
                .catalogue
                .factories()
                .filter(|(_, factory)| factory.kind == BlockKind::Source)
                .map(|(id, _)| id)
                .collect(),
            block_states,
        }
    }
}

#[async_trait]
impl FableValidator for RuleValidator {
    async fn expand(&self, fable: &FableDocument) -> Result<ValidationState, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Transport {
                url: "memory://expand".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.check(fable))
    }
}

/// Keeps stored fables in a map; ids are `fable-1`, `fable-2`, ...
#[allow(dead_code)]
#[derive(Default)]
pub struct InMemoryRepository {
    fables: Mutex<AHashMap<FableId, StoredFable>>,
    next_id: AtomicUsize,
    upserts: AtomicUsize,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn get(&self, fable_id: &str) -> Option<StoredFable> {
        self.fables.lock().unwrap().get(fable_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.fables.lock().unwrap().len()
    }

    pub fn insert(&self, stored: StoredFable) {
        self.fables
            .lock()
            .unwrap()
            .insert(stored.fable_id.clone(), stored);
    }
}

#[async_trait]
impl FableRepository for InMemoryRepository {
    async fn upsert(&self, request: UpsertRequest) -> Result<FableId, ApiError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                url: "memory://upsert".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let mut fables = self.fables.lock().unwrap();
        let fable_id = match request.fable_id {
            Some(id) if fables.contains_key(&id) => id,
            Some(id) => return Err(ApiError::NotFound(id)),
            None => format!("fable-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
        };
        fables.insert(
            fable_id.clone(),
            StoredFable {
                fable_id: fable_id.clone(),
                name: request.name,
                tags: request.tags,
                fable: request.fable,
            },
        );
        Ok(fable_id)
    }

    async fn retrieve(&self, fable_id: &str) -> Result<StoredFable, ApiError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Timeout("memory://retrieve".to_string()));
        }
        self.get(fable_id)
            .ok_or_else(|| ApiError::NotFound(fable_id.to_string()))
    }
}
