//! Feed parsing for RSS and Atom payloads.
//!
//! Both vocabularies are normalized onto [`FeedEntry`] here so nothing
//! downstream needs to know which one a source speaks.

use feed_rs::model::Entry;
use feed_rs::parser;
use std::io::Cursor;
use tracing::{debug, warn};

use super::types::FeedEntry;
use super::util::{clean_summary, cleanup_xml, parse_date};
use crate::TARGET_WEB_REQUEST;

/// Parse a raw feed payload into entries.
///
/// Malformed input yields an empty list. Entries without a title are dropped.
pub fn parse_feed(body: &[u8]) -> Vec<FeedEntry> {
    let feed = match feed_parser().parse(Cursor::new(body)) {
        Ok(feed) => feed,
        Err(first_err) => {
            let text = String::from_utf8_lossy(body);
            let cleaned = cleanup_xml(&text);
            if !(cleaned.contains("<rss") || cleaned.contains("<feed") || cleaned.contains("<rdf"))
            {
                warn!(target: TARGET_WEB_REQUEST, "Payload is not RSS or Atom: {}", first_err);
                return Vec::new();
            }

            match feed_parser().parse(Cursor::new(cleaned.as_bytes())) {
                Ok(feed) => {
                    debug!(target: TARGET_WEB_REQUEST, "Feed parsed after XML cleanup");
                    feed
                }
                Err(second_err) => {
                    warn!(
                        target: TARGET_WEB_REQUEST,
                        "Failed to parse feed even after cleanup. First error: {}. Second error: {}",
                        first_err,
                        second_err
                    );
                    return Vec::new();
                }
            }
        }
    };

    let total = feed.entries.len();
    let entries: Vec<FeedEntry> = feed.entries.into_iter().filter_map(normalize_entry).collect();
    if entries.len() < total {
        debug!(target: TARGET_WEB_REQUEST, "Dropped {} untitled entries", total - entries.len());
    }
    entries
}

/// feed-rs parser using our date rules, so offset-less timestamps read as UTC.
fn feed_parser() -> parser::Parser {
    parser::Builder::new().timestamp_parser(parse_date).build()
}

fn normalize_entry(entry: Entry) -> Option<FeedEntry> {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    // Atom entries may carry several links; the alternate one points at the article.
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();

    let raw_summary = entry
        .summary
        .map(|s| s.content)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    let pub_date = entry.published.or(entry.updated).map(|d| d.to_rfc3339());

    Some(FeedEntry {
        title,
        link,
        summary: clean_summary(&raw_summary),
        pub_date,
    })
}
