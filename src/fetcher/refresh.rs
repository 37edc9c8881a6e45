use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::app::Result;
use crate::config::FeedConfig;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::Store;

pub const DEFAULT_WORKERS: usize = 10;

/// Fans feed fetches out over a bounded worker pool.
///
/// Each feed is fetched, parsed, and reconciled in isolation; a failing
/// feed surfaces as its own error entry and never blocks the others.
pub struct Refresher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl Refresher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers)),
        }
    }

    pub async fn refresh_all<S: Store + Send + Sync + 'static>(
        &self,
        feeds: Vec<FeedConfig>,
        store: Arc<S>,
        normalizer: &Normalizer,
    ) -> Vec<(String, Result<usize>)> {
        let mut handles = Vec::new();

        for feed in feeds {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let store = store.clone();
            let normalizer = normalizer.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("Semaphore closed");

                let result = refresh_feed(&fetcher, &feed, &store, &normalizer).await;
                (feed.name, result)
            });

            handles.push(handle);
        }

        let mut results = Vec::new();
        for outcome in join_all(handles).await {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        results
    }
}

async fn refresh_feed<S: Store>(
    fetcher: &Arc<dyn Fetcher + Send + Sync>,
    feed: &FeedConfig,
    store: &Arc<S>,
    normalizer: &Normalizer,
) -> Result<usize> {
    let body = fetcher.fetch(&feed.url).await?;
    let (_meta, articles) = normalizer.normalize(&feed.name, &body)?;

    let new_count = store.upsert_articles(&articles)?;
    tracing::info!("Added {} new articles from {}", new_count, feed.name);

    Ok(new_count)
}
