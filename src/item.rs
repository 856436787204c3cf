use chrono::{DateTime, Utc};

/// A feed entry that has passed date parsing and the freshness cutoff.
///
/// Items live for a single cycle; only qualifying ones are turned into
/// [`crate::store::StoredArticle`] records.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    /// Feed URL the item was fetched from.
    pub source: String,
}

impl Item {
    /// Deduplication key: the link when present, otherwise the title.
    pub fn identity(&self) -> &str {
        if self.link.is_empty() {
            &self.title
        } else {
            &self.link
        }
    }
}
