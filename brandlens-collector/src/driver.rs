//! Collection driver
//!
//! Walks the query battery in source order, one request at a time: skip
//! anything already checkpointed, run the rest through the retry
//! controller, flush the checkpoint after every processed query, and pace
//! requests to stay under steady-state rate limits.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use brandlens_core::{CompletionEndpoint, QueryRecord, ResponseRecord};
use tracing::{debug, error, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::error::CollectError;
use crate::retry::{run_with_retry, RetryOutcome, RetryPolicy};

/// Configuration for a collection run
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub retry: RetryPolicy,
    /// Fixed sleep between processed queries, independent of retry backoff
    pub pacing: Duration,
    /// Run the endpoint liveness probe before the main loop
    pub probe_on_start: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            pacing: Duration::from_secs(1),
            probe_on_start: true,
        }
    }
}

/// What a run accomplished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Queries answered this run
    pub completed: usize,
    /// Queries recorded with an `ERROR:` marker this run
    pub failed: usize,
    /// Queries already present in the checkpoint
    pub skipped: usize,
}

/// Sequential collection driver for one provider
pub struct CollectionDriver {
    endpoint: Arc<dyn CompletionEndpoint>,
    store: CheckpointStore,
    config: CollectorConfig,
}

impl CollectionDriver {
    pub fn new(
        endpoint: Arc<dyn CompletionEndpoint>,
        store: CheckpointStore,
        config: CollectorConfig,
    ) -> Self {
        Self {
            endpoint,
            store,
            config,
        }
    }

    /// Collect responses for every query not yet checkpointed.
    ///
    /// On an aborting failure the checkpoint holds everything completed so
    /// far and a re-invocation resumes where this run stopped.
    pub async fn run(&self, queries: &[QueryRecord]) -> Result<CollectionSummary, CollectError> {
        let provider = self.endpoint.provider();
        let mut results = self.store.load()?;

        let known: HashSet<&str> = queries.iter().map(|q| q.query_id.as_str()).collect();
        for id in results.keys().filter(|id| !known.contains(id.as_str())) {
            warn!(
                "Checkpoint row {} has no matching query in the battery; keeping it",
                id
            );
        }

        if self.config.probe_on_start {
            if let Err(err) = self.endpoint.probe().await {
                error!("{} liveness probe failed: {}", provider, err.message);
                error!(
                    "Likely causes: expired or invalid API key, exhausted quota or billing, \
                     or the API not enabled for this credential"
                );
                return Err(CollectError::Precondition {
                    provider,
                    message: err.message,
                });
            }
            info!("{} liveness probe ok", provider);
        }

        let mut summary = CollectionSummary::default();

        for query in queries {
            if results.contains_key(&query.query_id) {
                debug!(query_id = %query.query_id, "Already collected, skipping");
                summary.skipped += 1;
                continue;
            }

            info!(query_id = %query.query_id, topic = %query.topic, "Collecting");

            let outcome = run_with_retry(
                self.endpoint.as_ref(),
                query,
                &self.config.retry,
                results.len(),
            )
            .await;

            match outcome {
                RetryOutcome::Completed(text) => {
                    results.insert(
                        query.query_id.clone(),
                        ResponseRecord::completed(query, &text),
                    );
                    summary.completed += 1;
                }
                RetryOutcome::GaveUp(message) => {
                    warn!(
                        query_id = %query.query_id,
                        "Giving up on this query, recording error row: {}",
                        message
                    );
                    results.insert(
                        query.query_id.clone(),
                        ResponseRecord::failed(query, &message),
                    );
                    summary.failed += 1;
                }
                RetryOutcome::Aborted(err) => {
                    self.store.save(&results)?;
                    error!(
                        "Stopping the {} run on query {}: {}. Progress is saved; rerun to resume.",
                        provider, query.query_id, err
                    );
                    return Err(err);
                }
            }

            self.store.save(&results)?;
            tokio::time::sleep(self.config.pacing).await;
        }

        // Already saved incrementally; one more save keeps the final state
        // durable even if the loop body never ran.
        self.store.save(&results)?;

        info!(
            "{} collection done: {} collected, {} failed, {} skipped ({} rows total)",
            provider,
            summary.completed,
            summary.failed,
            summary.skipped,
            results.len()
        );

        Ok(summary)
    }
}
