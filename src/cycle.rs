//! One fetch, dedupe, score, persist pass.
//!
//! The updated snapshot is assembled in memory and written once at the end,
//! so a cycle that fails anywhere leaves the database exactly as it was.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dedup::merge;
use crate::error::CycleError;
use crate::rss::FeedSource;
use crate::scoring::Scorer;
use crate::store::{Snapshot, Store, StoredArticle};
use crate::{SCORE_THRESHOLD, TARGET_LLM_REQUEST};

/// How far back the first cycle looks when no cutoff has been stored.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cutoff: DateTime<Utc>,
    pub fetched: usize,
    pub merged: usize,
    pub score_failures: usize,
    pub qualified: usize,
    pub last_fetch_time: Option<String>,
}

/// The stored cutoff, or `now` minus the default lookback when it is absent or unparseable.
pub fn compute_cutoff(snapshot: &Snapshot, now: DateTime<Utc>) -> DateTime<Utc> {
    snapshot
        .last_fetch()
        .unwrap_or_else(|| now - ChronoDuration::hours(DEFAULT_LOOKBACK_HOURS))
}

pub struct CycleRunner {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn FeedSource>,
    scorer: Arc<dyn Scorer>,
    sources: Vec<String>,
}

impl CycleRunner {
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: Arc<dyn FeedSource>,
        scorer: Arc<dyn Scorer>,
        sources: Vec<String>,
    ) -> Self {
        CycleRunner {
            store,
            fetcher,
            scorer,
            sources,
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run a cycle as if the current time were `now`.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        let mut snapshot = self.store.load_snapshot().await.map_err(CycleError::Load)?;
        let cutoff = compute_cutoff(&snapshot, now);
        debug!("Cycle cutoff {} over {} sources", cutoff.to_rfc3339(), self.sources.len());

        // Sources are independent; merging waits for all of them.
        let per_source = join_all(
            self.sources
                .iter()
                .map(|url| self.fetcher.fetch(url, cutoff)),
        )
        .await;
        let fetched: usize = per_source.iter().map(Vec::len).sum();

        let merged = merge(per_source);
        let latest_seen = merged.iter().map(|item| item.published_at).max();
        let merged_count = merged.len();

        let mut score_failures = 0;
        let mut qualifying = Vec::new();
        for item in merged {
            let score = match self.scorer.score(&item.title, &item.summary).await {
                Ok(score) => score,
                Err(err) => {
                    warn!(target: TARGET_LLM_REQUEST, "Scoring failed for {:?}, treating as 0: {}", item.title, err);
                    score_failures += 1;
                    0
                }
            };
            if score > SCORE_THRESHOLD {
                info!(target: TARGET_LLM_REQUEST, "Qualified ({}): {}", score, item.title);
                qualifying.push(StoredArticle::from_item(item, score));
            }
        }

        let qualified = qualifying.len();
        snapshot.articles.extend(qualifying);
        if let Some(latest) = latest_seen {
            snapshot.last_fetch_time = Some(latest.to_rfc3339());
        }

        self.store
            .save_snapshot(&snapshot)
            .await
            .map_err(CycleError::Persist)?;

        Ok(CycleReport {
            cutoff,
            fetched,
            merged: merged_count,
            score_failures,
            qualified,
            last_fetch_time: snapshot.last_fetch_time,
        })
    }
}
