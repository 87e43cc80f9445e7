use std::sync::Arc;

use crate::config::Config;
use crate::feed::FeedEmitter;
use crate::runner::ParallelRunner;
use crate::scraper::{ChromeScraper, Scraper};
use crate::store::{JsonStore, Store};
use crate::video::{DisabledResolver, VideoResolver, YtDlpResolver};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn Store + Send + Sync>,
    pub scraper: Arc<dyn Scraper>,
    pub emitter: Arc<FeedEmitter>,
    pub runner: ParallelRunner,
}

impl AppContext {
    pub fn with_workers(config: Config, workers: usize) -> Self {
        let resolver: Arc<dyn VideoResolver> = if config.video.enabled {
            Arc::new(YtDlpResolver::new(config.video.clone()))
        } else {
            Arc::new(DisabledResolver)
        };

        let scraper: Arc<dyn Scraper> = Arc::new(
            ChromeScraper::new(config.scraper.clone(), resolver)
                .with_debug_root(config.output.debug_dir.clone()),
        );

        Self::with_scraper(config, scraper, workers)
    }

    /// Build a context around any scraper implementation.
    pub fn with_scraper(config: Config, scraper: Arc<dyn Scraper>, workers: usize) -> Self {
        let store: Arc<dyn Store + Send + Sync> = Arc::new(JsonStore::new(&config.output.cache_dir));
        let emitter = Arc::new(FeedEmitter::new(config.feed.clone()));
        let runner = ParallelRunner::with_workers(
            scraper.clone(),
            store.clone(),
            emitter.clone(),
            config.output.feeds_dir.clone(),
            workers,
        );

        Self {
            config,
            store,
            scraper,
            emitter,
            runner,
        }
    }
}
