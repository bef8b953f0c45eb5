//! Socialgraph CLI: ingest posts, inspect the graph and find communities
//!
//! Works on the embedded graph. With `--data-dir` (or `storage.data_path`) the graph
//! is loaded from and checkpointed to RocksDB; otherwise it lives only for the
//! duration of the command.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{ContentArrangement, Table};
use socialgraph::client::{GraphReadClient, PostFilter};
use socialgraph::config::{self, AppConfig, CONFIG_ENV, DATA_ENV};
use socialgraph::{
    extract_entities, extract_query_terms, extract_topics, EmbeddedGraphClient, IngestPipeline,
    IngestReport, NetworkGraph,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "socialgraph", version, about = "Social graph ingestion and community detection")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// RocksDB data directory (overrides storage.data_path)
    #[arg(long, global = true, env = DATA_ENV)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum Network {
    /// Authors linked to the communities they posted in
    Authors,
    /// Authors linked by INTERACTS_WITH
    Interactions,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a JSON-lines file of posts
    Ingest {
        path: PathBuf,

        /// Clear the graph first
        #[arg(long)]
        reset: bool,

        #[arg(long)]
        batch_size: Option<usize>,

        #[arg(long)]
        workers: Option<usize>,
    },
    /// Detect communities with Louvain
    Communities {
        #[arg(long, value_enum, default_value = "authors")]
        network: Network,

        /// Authors to include in the authors network
        #[arg(long, default_value_t = 1000)]
        limit: usize,

        /// Shuffle node order with this seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Node and edge counts, top communities and topics
    Stats {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Extract topics from text
    Topics {
        text: String,

        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Extract URLs, hashtags and mentions from text
    Entities { text: String },
    /// Find posts relevant to a question
    Search {
        query: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_path = Some(dir.clone());
    }
    config::init_tracing(&config.logging.filter);

    let format = &cli.format;
    match cli.command {
        Commands::Ingest {
            path,
            reset,
            batch_size,
            workers,
        } => {
            config.ingest.reset |= reset;
            if let Some(n) = batch_size {
                config.ingest.batch_size = n;
            }
            if let Some(n) = workers {
                config.ingest.workers = n;
            }
            config.validate()?;
            run_ingest(&config, &path, format).await
        }
        Commands::Communities {
            network,
            limit,
            seed,
        } => {
            if seed.is_some() {
                config.community.seed = seed;
            }
            config.validate()?;
            run_communities(&config, network, limit, format).await
        }
        Commands::Stats { limit } => run_stats(&config, limit, format).await,
        Commands::Topics { text, k } => {
            let k = k.unwrap_or(config.ingest.topic_count);
            let topics = extract_topics(&text, k);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&topics)?),
                _ => print_rows(
                    format,
                    &["rank", "topic"],
                    topics
                        .iter()
                        .enumerate()
                        .map(|(i, t)| vec![(i + 1).to_string(), t.clone()])
                        .collect(),
                ),
            }
            Ok(())
        }
        Commands::Entities { text } => {
            let entities = extract_entities(&text);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entities)?),
                _ => print_rows(
                    format,
                    &["type", "value"],
                    entities
                        .iter()
                        .map(|e| vec![e.kind.to_string(), e.value.clone()])
                        .collect(),
                ),
            }
            Ok(())
        }
        Commands::Search { query, limit } => run_search(&config, &query, limit, format).await,
    }
}

fn open_client(config: &AppConfig) -> Result<EmbeddedGraphClient> {
    match &config.storage.data_path {
        Some(path) => EmbeddedGraphClient::open(path)
            .with_context(|| format!("opening graph at {}", path.display())),
        None => Ok(EmbeddedGraphClient::new()),
    }
}

/// Client for read-only commands
fn open_existing(config: &AppConfig) -> Result<EmbeddedGraphClient> {
    if config.storage.data_path.is_none() {
        warn!("No data directory configured, reading an empty in-memory graph");
    }
    open_client(config)
}

async fn run_ingest(config: &AppConfig, path: &Path, format: &OutputFormat) -> Result<()> {
    let client = Arc::new(open_client(config)?);
    let pipeline = IngestPipeline::new(client.clone(), config.ingest.clone());

    let cancel = pipeline.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current batch");
            cancel.cancel();
        }
    });

    let report = match pipeline.ingest_path(path).await {
        Ok(report) => report,
        Err(err) => {
            if err.store_usable() {
                match client.checkpoint().await {
                    Ok(true) => info!("Checkpoint of committed records written"),
                    Ok(false) => {}
                    Err(checkpoint_err) => warn!(error = %checkpoint_err, "Checkpoint failed"),
                }
            }
            print_report(err.report(), format)?;
            return Err(err).context("ingestion failed");
        }
    };

    if client.checkpoint().await? {
        info!("Checkpoint written");
    }
    print_report(&report, format)
}

fn print_report(report: &IngestReport, format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    let rows = [
        ("processed", report.processed.to_string()),
        ("skipped", report.skipped.to_string()),
        ("parse_errors", report.parse_errors.to_string()),
        ("validation_errors", report.validation_errors.to_string()),
        ("store_errors", report.store_errors.to_string()),
        ("batches", report.batches.to_string()),
        ("cancelled", report.cancelled.to_string()),
    ];
    print_rows(
        format,
        &["metric", "value"],
        rows.into_iter().map(|(k, v)| vec![k.to_string(), v]).collect(),
    );
    Ok(())
}

async fn run_communities(
    config: &AppConfig,
    network: Network,
    limit: usize,
    format: &OutputFormat,
) -> Result<()> {
    let client = open_existing(config)?;
    let graph = match network {
        Network::Authors => {
            let rows = client.author_communities(&PostFilter::default(), limit).await?;
            NetworkGraph::from_author_communities(&rows)
        }
        Network::Interactions => NetworkGraph::from_interactions(&client.interactions().await?),
    };

    let labels = graph.detect_communities(&config.community.louvain())?;
    let graph = graph.with_communities(&labels);
    let count = labels.values().collect::<HashSet<_>>().len();
    info!(nodes = graph.nodes.len(), communities = count, "Communities detected");

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    let mut nodes: Vec<_> = graph.nodes.iter().collect();
    nodes.sort_by(|a, b| a.community.cmp(&b.community).then_with(|| a.id.cmp(&b.id)));
    print_rows(
        format,
        &["node", "group", "community"],
        nodes
            .iter()
            .map(|n| {
                vec![
                    n.id.clone(),
                    n.group.to_string(),
                    n.community.map(|c| c.to_string()).unwrap_or_default(),
                ]
            })
            .collect(),
    );
    if let OutputFormat::Table = format {
        println!("{} node(s) in {} communities", nodes.len(), count);
    }
    Ok(())
}

async fn run_stats(config: &AppConfig, limit: usize, format: &OutputFormat) -> Result<()> {
    let client = open_existing(config)?;
    let filter = PostFilter::default();
    let stats = client.stats().await?;
    let communities = client.community_post_counts(&filter, limit).await?;
    let topics = client.topic_mentions(&filter, limit).await?;

    if let OutputFormat::Json = format {
        let json = serde_json::json!({
            "stats": stats,
            "communities": communities,
            "topics": topics,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    let mut counts = vec![
        vec!["nodes".to_string(), "*".to_string(), stats.total_nodes.to_string()],
        vec!["edges".to_string(), "*".to_string(), stats.total_edges.to_string()],
    ];
    counts.extend(
        stats
            .nodes
            .iter()
            .map(|(label, n)| vec!["nodes".to_string(), label.clone(), n.to_string()]),
    );
    counts.extend(
        stats
            .edges
            .iter()
            .map(|(relation, n)| vec!["edges".to_string(), relation.clone(), n.to_string()]),
    );
    print_rows(format, &["kind", "name", "count"], counts);
    print_rows(
        format,
        &["community", "posts"],
        communities
            .iter()
            .map(|c| vec![c.name.clone(), c.count.to_string()])
            .collect(),
    );
    print_rows(
        format,
        &["topic", "mentions"],
        topics
            .iter()
            .map(|t| vec![t.name.clone(), t.count.to_string()])
            .collect(),
    );
    Ok(())
}

async fn run_search(config: &AppConfig, query: &str, limit: usize, format: &OutputFormat) -> Result<()> {
    let client = open_existing(config)?;
    let terms = extract_query_terms(query);
    let posts = client.search_posts(&terms, limit).await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }
    print_rows(
        format,
        &["id", "score", "community", "author", "title"],
        posts
            .iter()
            .map(|p| {
                vec![
                    p.id.clone(),
                    p.score.to_string(),
                    p.subreddit.clone().unwrap_or_default(),
                    p.author.clone().unwrap_or_default(),
                    p.title.clone(),
                ]
            })
            .collect(),
    );
    Ok(())
}

/// Print rows as a table or CSV
fn print_rows(format: &OutputFormat, header: &[&str], rows: Vec<Vec<String>>) {
    match format {
        OutputFormat::Csv => {
            println!("{}", header.join(","));
            for row in &rows {
                let cells: Vec<String> = row.iter().map(|v| format_csv_value(v)).collect();
                println!("{}", cells.join(","));
            }
        }
        _ => {
            if rows.is_empty() {
                println!("(no results)");
                return;
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(header);

            let count = rows.len();
            for row in rows {
                table.add_row(row);
            }

            println!("{}", table);
            println!("{} row(s)", count);
        }
    }
}

fn format_csv_value(v: &str) -> String {
    if v.contains(',') || v.contains('"') || v.contains('\n') {
        format!("\"{}\"", v.replace('"', "\"\""))
    } else {
        v.to_string()
    }
}
