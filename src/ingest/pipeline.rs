//! Batched ingestion pipeline
//!
//! ```text
//! lines ──parse──▶ batch (batch_size) ──buffer_unordered(workers)──▶ graph client
//!                                         │
//!                                         ├─ Post
//!                                         ├─ POSTED_IN / AUTHORED_BY
//!                                         ├─ DISCUSSES / CONTAINS
//!                                         └─ INTERACTS_WITH (via InteractionIndex)
//! ```
//!
//! Batches run one after another; records inside a batch run concurrently (records
//! repeating a post id excepted) and rely on every client write being an idempotent
//! upsert. A transient store error skips its record, a fatal one aborts the run once
//! the in-flight batch has drained.

use futures::stream::{self, Stream, StreamExt};
use indexmap::IndexMap;
use serde::Serialize;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::interactions::InteractionIndex;
use super::record::{parse_line, RecordError};
use crate::client::{ClientError, ClientResult, GraphReadClient, GraphUpsertClient};
use crate::config::IngestConfig;
use crate::extract::extract_features;
use crate::schema::{NodeRef, PostRecord, Relation};

/// Shared flag requesting a run stop at the next batch boundary
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts for one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records fully written
    pub processed: usize,
    /// `parse_errors + validation_errors + store_errors`
    pub skipped: usize,
    pub parse_errors: usize,
    pub validation_errors: usize,
    pub store_errors: usize,
    pub batches: usize,
    pub cancelled: bool,
}

impl IngestReport {
    fn record_rejected(&mut self, err: &RecordError) {
        if err.is_parse() {
            self.parse_errors += 1;
        } else {
            self.validation_errors += 1;
        }
        self.skipped += 1;
    }

    fn record_store_error(&mut self) {
        self.store_errors += 1;
        self.skipped += 1;
    }
}

/// A run that could not complete. Both variants carry the work done so far.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Ingestion aborted, graph store failed: {source}")]
    Fatal {
        #[source]
        source: ClientError,
        report: IngestReport,
    },

    #[error("Ingestion aborted, cannot read input: {source}")]
    Input {
        #[source]
        source: io::Error,
        report: IngestReport,
    },
}

impl IngestError {
    pub fn report(&self) -> &IngestReport {
        match self {
            IngestError::Fatal { report, .. } | IngestError::Input { report, .. } => report,
        }
    }

    /// Whether the graph client still accepts writes, so the committed part of the
    /// run can be checkpointed
    pub fn store_usable(&self) -> bool {
        match self {
            IngestError::Fatal { source, .. } => !source.is_fatal(),
            IngestError::Input { .. } => true,
        }
    }
}

/// Drives a graph client from a stream of JSON lines
pub struct IngestPipeline<C> {
    client: Arc<C>,
    config: IngestConfig,
    cancel: CancellationFlag,
}

impl<C> IngestPipeline<C>
where
    C: GraphUpsertClient + GraphReadClient,
{
    pub fn new(client: Arc<C>, config: IngestConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancellationFlag::new(),
        }
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest a newline-delimited JSON file
    pub async fn ingest_path(&self, path: impl AsRef<Path>) -> Result<IngestReport, IngestError> {
        let file = tokio::fs::File::open(path.as_ref())
            .await
            .map_err(|source| IngestError::Input {
                source,
                report: IngestReport::default(),
            })?;
        self.ingest_reader(BufReader::new(file)).await
    }

    pub async fn ingest_reader<R>(&self, reader: R) -> Result<IngestReport, IngestError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.ingest_lines(LinesStream::new(reader.lines())).await
    }

    /// Ingest a stream of lines, one JSON record per line
    pub async fn ingest_lines<S>(&self, lines: S) -> Result<IngestReport, IngestError>
    where
        S: Stream<Item = io::Result<String>>,
    {
        let run_id = Uuid::new_v4();
        self.run(lines)
            .instrument(info_span!("ingest", run = %run_id))
            .await
    }

    async fn run<S>(&self, lines: S) -> Result<IngestReport, IngestError>
    where
        S: Stream<Item = io::Result<String>>,
    {
        let mut report = IngestReport::default();
        info!(
            batch_size = self.config.batch_size,
            workers = self.config.workers,
            reset = self.config.reset,
            "Starting ingestion"
        );

        let index = match self.prepare().await {
            Ok(index) => index,
            Err(source) => {
                error!(error = %source, "Cannot prepare graph for ingestion");
                return Err(IngestError::Fatal { source, report });
            }
        };

        let batch_size = self.config.batch_size.max(1);
        let workers = self.config.workers.max(1);
        let mut lines = std::pin::pin!(lines);
        let mut exhausted = false;

        while !exhausted {
            if self.cancel.is_cancelled() {
                info!(batches = report.batches, "Ingestion cancelled");
                report.cancelled = true;
                break;
            }

            let mut batch = Vec::with_capacity(batch_size);
            while batch.len() < batch_size {
                let Some(line) = lines.next().await else {
                    exhausted = true;
                    break;
                };
                let line = match line {
                    Ok(line) => line,
                    Err(source) => {
                        error!(error = %source, "Input stream failed");
                        return Err(IngestError::Input { source, report });
                    }
                };
                match parse_line(&line) {
                    Ok(Some(post)) => batch.push(post),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(error = %err, "Skipping record");
                        report.record_rejected(&err);
                    }
                }
            }

            if batch.is_empty() {
                continue;
            }

            // Records sharing a post id run in input order so the last one wins
            let mut chains: IndexMap<String, Vec<PostRecord>> = IndexMap::new();
            for post in batch {
                chains.entry(post.id.clone()).or_default().push(post);
            }

            let outcomes: Vec<Vec<(String, ClientResult<()>)>> = stream::iter(chains.into_values())
                .map(|chain| {
                    let index = &index;
                    async move {
                        let mut outcomes = Vec::with_capacity(chain.len());
                        for post in chain {
                            let outcome = self.process_record(&post, index).await;
                            outcomes.push((post.id, outcome));
                        }
                        outcomes
                    }
                })
                .buffer_unordered(workers)
                .collect()
                .await;

            let mut fatal = None;
            for (post_id, outcome) in outcomes.into_iter().flatten() {
                match outcome {
                    Ok(()) => report.processed += 1,
                    Err(err) if err.is_fatal() => {
                        report.record_store_error();
                        fatal.get_or_insert(err);
                    }
                    Err(err) => {
                        warn!(post = %post_id, error = %err, "Skipping record after store error");
                        report.record_store_error();
                    }
                }
            }
            report.batches += 1;

            if let Some(source) = fatal {
                error!(
                    error = %source,
                    processed = report.processed,
                    batches = report.batches,
                    "Graph store failed, aborting ingestion"
                );
                return Err(IngestError::Fatal { source, report });
            }

            info!(
                batch = report.batches,
                processed = report.processed,
                skipped = report.skipped,
                "Batch complete"
            );
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            batches = report.batches,
            "Ingestion finished"
        );
        Ok(report)
    }

    /// Reset if asked, establish constraints and seed the interaction index
    async fn prepare(&self) -> ClientResult<InteractionIndex> {
        if self.config.reset {
            self.client.reset_all().await?;
        }
        self.client.ensure_constraints().await?;
        let members = self.client.community_authors().await?;
        debug!(communities = members.len(), "Seeded interaction index");
        Ok(InteractionIndex::seeded(members))
    }

    /// Write one post and everything hanging off it. Nodes are written before the
    /// edges that reference them.
    async fn process_record(&self, post: &PostRecord, index: &InteractionIndex) -> ClientResult<()> {
        let client = &self.client;
        let post_ref = NodeRef::post(post.id.as_str());

        client.upsert_post(post).await?;

        if let Some(community) = &post.subreddit {
            client
                .upsert_edge_from_key(&post_ref, Relation::PostedIn, &NodeRef::subreddit(community.as_str()))
                .await?;
        }

        let author = post
            .author
            .as_deref()
            .filter(|author| *author != self.config.deleted_author);
        if let Some(author) = author {
            client
                .upsert_edge_from_key(&post_ref, Relation::AuthoredBy, &NodeRef::author(author))
                .await?;
        }

        if post.has_text() {
            let features = extract_features(&post.text(), self.config.topic_count);
            for topic in &features.topics {
                client
                    .upsert_edge_from_key(&post_ref, Relation::Discusses, &NodeRef::topic(topic.as_str()))
                    .await?;
            }
            for entity in &features.entities {
                client
                    .upsert_edge_from_key(&post_ref, Relation::Contains, &NodeRef::from_entity(entity))
                    .await?;
            }
        }

        if let (Some(community), Some(author)) = (&post.subreddit, author) {
            let others = index.register(community, author).await;
            for other in &others {
                client.upsert_interaction(author, other).await?;
            }
            index.commit(community, author).await;
            if !others.is_empty() {
                debug!(author, community = %community, pairs = others.len(), "Derived interactions");
            }
        }

        debug!(post = %post.id, "Committed record");
        Ok(())
    }
}
