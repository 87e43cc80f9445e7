use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::domain::PageTarget;
use crate::feed::FeedEmitter;
use crate::runner::{process_target, TargetRun};
use crate::scraper::Scraper;
use crate::store::Store;

/// Targets run one at a time unless more workers are requested.
pub const DEFAULT_WORKERS: usize = 1;

pub struct ParallelRunner {
    scraper: Arc<dyn Scraper>,
    store: Arc<dyn Store + Send + Sync>,
    emitter: Arc<FeedEmitter>,
    feeds_dir: PathBuf,
    semaphore: Arc<Semaphore>,
}

impl ParallelRunner {
    pub fn with_workers(
        scraper: Arc<dyn Scraper>,
        store: Arc<dyn Store + Send + Sync>,
        emitter: Arc<FeedEmitter>,
        feeds_dir: PathBuf,
        workers: usize,
    ) -> Self {
        Self {
            scraper,
            store,
            emitter,
            feeds_dir,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Process every target; results keep the input order.
    pub async fn run_all(&self, targets: Vec<PageTarget>) -> Vec<TargetRun> {
        let mut handles = Vec::new();

        for target in targets {
            let scraper = self.scraper.clone();
            let store = self.store.clone();
            let emitter = self.emitter.clone();
            let feeds_dir = self.feeds_dir.clone();
            let semaphore = self.semaphore.clone();

            let handle = tokio::spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                process_target(
                    scraper.as_ref(),
                    store.as_ref(),
                    &emitter,
                    &feeds_dir,
                    &target,
                )
                .await
            });

            handles.push(handle);
        }

        let mut results = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(run) => results.push(run),
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        results
    }
}
