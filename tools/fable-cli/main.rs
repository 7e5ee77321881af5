use clap::{Parser, Subcommand, ValueEnum};
use fable_builder::graph::unresolved_blocks;
use fable_builder::persistence::FableRepository;
use fable_builder::prelude::*;
use fable_builder::review;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionCli {
    Lr,
    Tb,
}

impl From<DirectionCli> for LayoutDirection {
    fn from(direction: DirectionCli) -> Self {
        match direction {
            DirectionCli::Lr => LayoutDirection::LeftToRight,
            DirectionCli::Tb => LayoutDirection::TopToBottom,
        }
    }
}

/// Inspect, lay out, validate and store forecast pipeline fables
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON builder config providing client, layout and validation settings
    #[arg(long, global = true)]
    config: Option<String>,

    /// Backend base URL, overriding the config file and FABLE_API_URL
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarise a fable file against a local catalogue
    Inspect {
        fable: String,
        #[arg(long)]
        catalogue: String,
    },
    /// Print laid-out graph nodes and edges as JSON
    Layout {
        fable: String,
        #[arg(long)]
        catalogue: String,
        /// Defaults to the config file's layout direction
        #[arg(long, value_enum)]
        direction: Option<DirectionCli>,
    },
    /// Print the form view of a fable as JSON
    Form {
        fable: String,
        #[arg(long)]
        catalogue: String,
    },
    /// Validate a fable with the backend
    Validate { fable: String },
    /// Compile a fable with the backend and print the result
    Compile { fable: String },
    /// Create or update a stored fable
    Save {
        fable: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Download a stored fable
    Fetch {
        id: String,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List the backend's block catalogue
    Catalogue,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Command::Inspect { fable, catalogue } => {
            let (fable, catalogue) = load_local(&fable, &catalogue);
            run_inspect(&fable, &catalogue);
        }
        Command::Layout {
            fable,
            catalogue,
            direction,
        } => {
            let (fable, catalogue) = load_local(&fable, &catalogue);
            let mut options = config.layout.clone();
            if let Some(direction) = direction {
                options.direction = direction.into();
            }
            let graph = fable_to_graph(&fable, &catalogue);
            let nodes = layout_nodes(&graph.nodes, &graph.edges, &options);
            print_json(&FableGraph {
                nodes,
                edges: graph.edges,
            });
        }
        Command::Form { fable, catalogue } => {
            let (fable, catalogue) = load_local(&fable, &catalogue);
            print_json(&fable_to_form(&fable, &catalogue));
        }
        Command::Validate { fable } => {
            let fable = load_fable(&fable);
            if fable.is_empty() {
                println!("Fable is empty, nothing to validate");
                return;
            }
            let client = Arc::new(connect(&config, cli.url));
            let mut store = config.new_store();
            store.set_fable(fable, None);
            let version = store.version();

            let mut handle = config.spawn_validation(client, &store);
            let status = handle
                .wait_for(|s| s.validated_version == Some(version) || s.last_error.is_some())
                .await
                .unwrap_or_else(|| exit_with_error("Validation stopped unexpectedly"));
            if let Some(e) = status.last_error {
                exit_with_error(&format!("Validation request failed: {}", e));
            }
            if let Some(state) = status.state {
                println!("{}", ValidationReport::format(&state, Some(store.document())));
            }
        }
        Command::Compile { fable } => {
            let fable = load_fable(&fable);
            let client = connect(&config, cli.url);
            let compiled = review::compile(&client, &fable)
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
            print_json(&compiled);
        }
        Command::Save {
            fable,
            name,
            id,
            tags,
        } => {
            let fable = load_fable(&fable);
            let client = connect(&config, cli.url);
            let mut store = config.new_store();
            store.load_fable(fable, id, name);
            let outcome = PersistenceBridge::save(&mut store, &client, tags)
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Save failed: {}", e)));
            println!("Saved '{}' as {}", store.fable_name(), outcome.fable_id());
        }
        Command::Fetch { id, output } => {
            let client = connect(&config, cli.url);
            let stored = client
                .retrieve(&id)
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Fetch failed: {}", e)));
            match output {
                Some(path) => {
                    stored.fable.save(&path).unwrap_or_else(|e| {
                        exit_with_error(&format!("Failed to write '{}': {}", path, e))
                    });
                    println!(
                        "Wrote '{}' ({} blocks) to {}",
                        stored.name,
                        stored.fable.len(),
                        path
                    );
                }
                None => print_json(&stored),
            }
        }
        Command::Catalogue => {
            let client = connect(&config, cli.url);
            let catalogue = client
                .fetch_catalogue()
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Catalogue request failed: {}", e)));
            for (factory_id, factory) in catalogue.factories() {
                println!(
                    "{:<10} {:<40} {}",
                    factory.kind.as_str(),
                    factory_id.to_string(),
                    factory.title
                );
            }
        }
    }

    tracing::debug!(elapsed = ?start.elapsed(), "Command finished");
}

fn run_inspect(fable: &FableDocument, catalogue: &BlockFactoryCatalogue) {
    println!("--- Fable Summary ---");
    println!("Blocks:       {}", fable.len());
    println!("Connections:  {}", fable.connection_count());

    for (block_id, block) in fable.sorted_blocks() {
        let kind = catalogue
            .get(&block.factory_id)
            .map(|factory| factory.kind.as_str())
            .unwrap_or("?");
        println!("  {:<24} {:<10} {}", block_id, kind, block.factory_id);
        for (input, source) in block.connected_inputs() {
            println!("      {} <- {}", input, source);
        }
    }

    let unresolved = unresolved_blocks(fable, catalogue);
    if !unresolved.is_empty() {
        println!("\nBlocks with factories missing from the catalogue:");
        for block_id in unresolved {
            println!("  -> {}", block_id);
        }
    }
}

fn load_fable(path: &str) -> FableDocument {
    FableDocument::from_file(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load fable '{}': {}", path, e)))
}

fn load_local(fable_path: &str, catalogue_path: &str) -> (FableDocument, BlockFactoryCatalogue) {
    let catalogue = BlockFactoryCatalogue::from_file(catalogue_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to load catalogue '{}': {}",
            catalogue_path, e
        ))
    });
    (load_fable(fable_path), catalogue)
}

fn load_config(path: Option<&str>) -> BuilderConfig {
    match path {
        Some(path) => BuilderConfig::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load config '{}': {}", path, e))
        }),
        None => BuilderConfig::default(),
    }
}

/// Client settings from the config file, then the environment, then `--url`.
fn connect(builder_config: &BuilderConfig, url: Option<String>) -> ApiClient {
    let mut config = builder_config.client.clone().with_env_overrides();
    if let Some(url) = url {
        config.base_url = url;
    }
    ApiClient::new(config)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to create client: {}", e)))
}

fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render JSON: {}", e)));
    println!("{}", json);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
