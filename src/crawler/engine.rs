//! Crawl engine: worker pool, job queue and result collector
//!
//! Seed URLs enter the job queue; each worker claims a URL in the visited
//! set, waits for the shared rate limiter, fetches, parses, hands the page to
//! the result queue and feeds discovered links back into the job queue. A
//! single collector drains the result queue into the page store.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::limiter::RateLimiter;
use crate::crawler::page::FetchedPage;
use crate::crawler::parser::parse_page;
use crate::crawler::queue::{QueueClosed, WorkQueue};
use crate::crawler::stats::{CrawlStats, CrawlSummary};
use crate::state::{EngineState, VisitedSet};
use crate::storage::PageStore;
use crate::url::normalize_url;
use crate::{CrawlError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Sizing of an engine's worker pool, throttle and queues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of worker tasks
    pub worker_count: usize,
    /// Global fetch budget shared by every worker
    pub requests_per_second: u32,
    /// Capacity of both the job queue and the result queue
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for EngineConfig {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            worker_count: config.workers,
            requests_per_second: config.requests_per_second,
            queue_capacity: config.queue_capacity,
        }
    }
}

/// State shared by the engine, its workers and every `JobSender`
struct Pipeline {
    jobs: WorkQueue<String>,
    results: WorkQueue<FetchedPage>,
    visited: VisitedSet,
    limiter: RateLimiter,
    stats: CrawlStats,
    fetcher: Arc<dyn Fetcher>,
}

impl Pipeline {
    async fn add_job(&self, url: &str) -> Result<()> {
        let normalized = match normalize_url(url) {
            Ok(normalized) => normalized,
            Err(e) => {
                self.stats.record_rejected();
                return Err(e.into());
            }
        };

        match self.jobs.push(String::from(normalized)).await {
            Ok(()) => {
                self.stats.record_enqueued();
                Ok(())
            }
            Err(QueueClosed) => {
                self.stats.record_rejected();
                Err(CrawlError::QueueClosed)
            }
        }
    }

    fn close(&self) {
        self.jobs.close();
        self.results.close();
    }
}

/// Cloneable handle for submitting jobs from other tasks
#[derive(Clone)]
pub struct JobSender {
    pipeline: Arc<Pipeline>,
}

impl JobSender {
    /// Normalizes `url` and enqueues it; see [`CrawlEngine::add_job`]
    pub async fn add_job(&self, url: &str) -> Result<()> {
        self.pipeline.add_job(url).await
    }
}

/// A bounded pool of crawl workers feeding one page store
///
/// Lifecycle: `new` (Idle) → `start` (Running) → `stop` (Draining, then
/// Stopped). Nothing survives the engine: the visited set, the limiter and
/// the counters all belong to this instance.
pub struct CrawlEngine {
    config: EngineConfig,
    pipeline: Arc<Pipeline>,
    store: Arc<dyn PageStore>,
    state: EngineState,
    workers: Vec<JoinHandle<()>>,
    collector: Option<JoinHandle<()>>,
}

impl CrawlEngine {
    pub fn new(config: EngineConfig, fetcher: Arc<dyn Fetcher>, store: Arc<dyn PageStore>) -> Self {
        let config = EngineConfig {
            worker_count: config.worker_count.max(1),
            ..config
        };

        let pipeline = Pipeline {
            jobs: WorkQueue::new(config.queue_capacity),
            results: WorkQueue::new(config.queue_capacity),
            visited: VisitedSet::new(),
            limiter: RateLimiter::new(config.requests_per_second),
            stats: CrawlStats::default(),
            fetcher,
        };

        Self {
            config,
            pipeline: Arc::new(pipeline),
            store,
            state: EngineState::Idle,
            workers: Vec::new(),
            collector: None,
        }
    }

    /// Spawns the workers and the collector, then enqueues the seeds
    ///
    /// `cancel` is the crawl's ambient token: cancelling it interrupts
    /// rate-limit waits and in-flight fetches and makes workers exit.
    ///
    /// Must be called at most once. Invalid seeds are logged and skipped.
    pub async fn start<I, S>(&mut self, cancel: CancellationToken, seeds: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        debug_assert_eq!(
            self.state,
            EngineState::Idle,
            "CrawlEngine::start called more than once"
        );
        self.set_state(EngineState::Running);

        tracing::info!(
            "Starting crawl engine: {} workers, {} requests/sec",
            self.config.worker_count,
            self.config.requests_per_second
        );

        for id in 0..self.config.worker_count {
            let pipeline = Arc::clone(&self.pipeline);
            let cancel = cancel.clone();
            self.workers
                .push(tokio::spawn(run_worker(id, pipeline, cancel)));
        }

        let pipeline = Arc::clone(&self.pipeline);
        let store = Arc::clone(&self.store);
        self.collector = Some(tokio::spawn(run_collector(pipeline, store)));

        for seed in seeds {
            let seed = seed.as_ref();
            if let Err(e) = self.pipeline.add_job(seed).await {
                tracing::warn!("Rejected seed {}: {}", seed, e);
            }
        }
    }

    /// Normalizes `url` and enqueues it
    ///
    /// Waits while the job queue is full. Fails with
    /// [`CrawlError::QueueClosed`] once `stop` has closed intake, and with
    /// [`CrawlError::Url`] if the URL is malformed or not http(s).
    pub async fn add_job(&self, url: &str) -> Result<()> {
        self.pipeline.add_job(url).await
    }

    /// Returns a handle that can enqueue jobs from other tasks
    pub fn job_sender(&self) -> JobSender {
        JobSender {
            pipeline: Arc::clone(&self.pipeline),
        }
    }

    /// Closes intake and waits until every produced page has been stored
    ///
    /// Workers finish the jobs already buffered; links they discover are
    /// rejected. The ambient token is left untouched. Stopping an engine
    /// that was never started just marks it stopped.
    pub async fn stop(&mut self) -> CrawlSummary {
        match self.state {
            EngineState::Stopped => return self.stats(),
            EngineState::Idle => {
                self.pipeline.close();
                self.set_state(EngineState::Stopped);
                return self.stats();
            }
            EngineState::Running => self.set_state(EngineState::Draining),
            EngineState::Draining => {}
        }

        tracing::info!("Stopping crawl engine, draining queued jobs");
        self.pipeline.jobs.close();

        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        self.pipeline.results.close();
        if let Some(handle) = self.collector.take() {
            if let Err(e) = handle.await {
                tracing::error!("Collector task failed: {}", e);
            }
        }

        self.set_state(EngineState::Stopped);

        let summary = self.stats();
        tracing::info!(
            "Crawl engine stopped: {} pages fetched, {} stored, {} fetch failures",
            summary.pages_fetched,
            summary.pages_stored,
            summary.fetch_failures
        );
        summary
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Live snapshot of the engine's counters
    pub fn stats(&self) -> CrawlSummary {
        self.pipeline.stats.snapshot()
    }

    /// Number of distinct URLs claimed by workers so far
    pub fn visited_count(&self) -> usize {
        self.pipeline.visited.len()
    }

    fn set_state(&mut self, next: EngineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid engine transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("Engine state {} -> {}", self.state, next);
        self.state = next;
    }
}

impl Drop for CrawlEngine {
    fn drop(&mut self) {
        // Lets detached tasks run out instead of waiting on queues forever
        self.pipeline.close();
    }
}

async fn run_worker(id: usize, pipeline: Arc<Pipeline>, cancel: CancellationToken) {
    tracing::debug!(worker = id, "Worker started");

    while let Some(url) = pipeline.jobs.pop().await {
        if !pipeline.visited.add_if_absent(&url) {
            tracing::trace!(worker = id, "Already visited: {}", url);
            pipeline.stats.record_duplicate();
            continue;
        }

        if pipeline.limiter.acquire(&cancel).await.is_err() {
            tracing::debug!(worker = id, "Cancelled while waiting for rate limiter");
            break;
        }

        tracing::debug!(worker = id, "Fetching {}", url);
        let response = match pipeline.fetcher.fetch_page(&cancel, &url).await {
            Ok(response) => response,
            Err(FetchError::Cancelled) => {
                tracing::debug!(worker = id, "Cancelled while fetching {}", url);
                break;
            }
            Err(e) => {
                tracing::warn!(worker = id, "Failed to fetch {}: {}", url, e);
                pipeline.stats.record_fetch_failure();
                continue;
            }
        };
        pipeline.stats.record_fetched();

        // Links resolve against where the body came from, not what was asked for
        let base = match Url::parse(&response.final_url) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!(
                    worker = id,
                    "Cannot use {} as a base URL: {}",
                    response.final_url,
                    e
                );
                continue;
            }
        };
        if response.final_url != url {
            tracing::debug!(worker = id, "{} redirected to {}", url, response.final_url);
        }
        let parsed = parse_page(&base, &response.body);
        drop(response);

        let page = FetchedPage {
            url,
            title: parsed.title,
            body: parsed.body,
        };
        if pipeline.results.push(page).await.is_err() {
            tracing::warn!(worker = id, "Result queue closed, worker exiting");
            break;
        }

        pipeline.stats.record_links(parsed.links.len());
        for link in parsed.links {
            match pipeline.add_job(&link).await {
                Ok(()) => {}
                Err(CrawlError::QueueClosed) => {
                    tracing::debug!(worker = id, "Job queue closed, dropping remaining links");
                    break;
                }
                Err(e) => tracing::debug!(worker = id, "Skipping link {}: {}", link, e),
            }
        }
    }

    tracing::debug!(worker = id, "Worker finished");
}

async fn run_collector(pipeline: Arc<Pipeline>, store: Arc<dyn PageStore>) {
    let start_time = Instant::now();
    let mut stored: u64 = 0;

    while let Some(page) = pipeline.results.pop().await {
        match store.store_page(&page).await {
            Ok(id) => {
                pipeline.stats.record_stored();
                stored += 1;
                tracing::debug!("Stored {} as page {}", page.url, id);

                // Progress reporting every 10 pages
                if stored % 10 == 0 {
                    let rate = stored as f64 / start_time.elapsed().as_secs_f64();
                    tracing::info!(
                        "Progress: {} pages stored, {} URLs visited, {:.2} pages/sec",
                        stored,
                        pipeline.visited.len(),
                        rate
                    );
                }
            }
            Err(e) => {
                pipeline.stats.record_store_failure();
                tracing::warn!("Failed to store {}: {}", page.url, e);
            }
        }
    }

    tracing::debug!("Collector finished after {} pages", stored);
}
