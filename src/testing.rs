//! In-memory fakes for the store, feed and scorer boundaries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{ScoreError, StoreError};
use crate::item::Item;
use crate::rss::{filter_fresh, FeedEntry, FeedSource};
use crate::scoring::Scorer;
use crate::store::{RunState, Snapshot, Store};

#[derive(Default)]
pub struct MemoryStore {
    pub snapshot: Mutex<Snapshot>,
    /// Scripted switch readings; the last one repeats once the queue drains.
    pub run_states: Mutex<VecDeque<Result<RunState, String>>>,
    pub last_run_state: Mutex<RunState>,
    pub fail_load: Mutex<bool>,
    pub fail_save: Mutex<bool>,
    pub saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        MemoryStore {
            snapshot: Mutex::new(snapshot),
            ..Default::default()
        }
    }

    pub fn script(&self, readings: Vec<Result<bool, &str>>) {
        let mut queue = self.run_states.lock().unwrap();
        for reading in readings {
            queue.push_back(
                reading
                    .map(|is_running| RunState { is_running })
                    .map_err(str::to_string),
            );
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_run_state(&self) -> Result<RunState, StoreError> {
        let next = self.run_states.lock().unwrap().pop_front();
        match next {
            Some(Ok(state)) => {
                *self.last_run_state.lock().unwrap() = state;
                Ok(state)
            }
            Some(Err(msg)) => Err(StoreError::Unavailable(msg)),
            None => Ok(*self.last_run_state.lock().unwrap()),
        }
    }

    async fn save_run_state(&self, state: RunState) -> Result<(), StoreError> {
        *self.last_run_state.lock().unwrap() = state;
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Snapshot, StoreError> {
        if *self.fail_load.lock().unwrap() {
            return Err(StoreError::Unavailable("load refused".to_string()));
        }
        Ok(self.snapshot())
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if *self.fail_save.lock().unwrap() {
            return Err(StoreError::Unavailable("save refused".to_string()));
        }
        *self.snapshot.lock().unwrap() = snapshot.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Serves fixed entries per URL through the real freshness filter.
#[derive(Default)]
pub struct StaticSource {
    pub feeds: HashMap<String, Vec<FeedEntry>>,
    pub cutoffs: Mutex<Vec<DateTime<Utc>>>,
}

impl StaticSource {
    pub fn with_feed(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
        self.feeds.insert(url.to_string(), entries);
        self
    }

    pub fn cutoffs(&self) -> Vec<DateTime<Utc>> {
        self.cutoffs.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch(&self, url: &str, cutoff: DateTime<Utc>) -> Vec<Item> {
        self.cutoffs.lock().unwrap().push(cutoff);
        let entries = self.feeds.get(url).cloned().unwrap_or_default();
        filter_fresh(entries, cutoff, url)
    }
}

/// Scores by title; unknown titles score zero, listed failures error out.
#[derive(Default)]
pub struct TableScorer {
    pub scores: HashMap<String, u8>,
    pub failures: Vec<String>,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl TableScorer {
    pub fn with_score(mut self, title: &str, score: u8) -> Self {
        self.scores.insert(title.to_string(), score);
        self
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failures.push(title.to_string());
        self
    }

    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scorer for TableScorer {
    async fn score(&self, title: &str, summary: &str) -> Result<u8, ScoreError> {
        self.seen
            .lock()
            .unwrap()
            .push((title.to_string(), summary.to_string()));
        if self.failures.iter().any(|t| t == title) {
            return Err(ScoreError::InvalidOutput("I think this is relevant".to_string()));
        }
        Ok(self.scores.get(title).copied().unwrap_or(0))
    }
}

pub fn entry(title: &str, link: &str, summary: &str, pub_date: Option<DateTime<Utc>>) -> FeedEntry {
    FeedEntry {
        title: title.to_string(),
        link: link.to_string(),
        summary: summary.to_string(),
        pub_date: pub_date.map(|d| d.to_rfc3339()),
    }
}
