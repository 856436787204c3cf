//! Feed retrieval for newsgate.
//!
//! This module handles fetching feed payloads, normalizing RSS and Atom
//! entries onto one schema, and filtering them against the freshness cutoff.

mod client;
mod fetcher;
mod parser;
mod types;
mod util;

pub use self::types::*;

pub use self::fetcher::{filter_fresh, FeedFetcher, FeedSource};

pub use self::client::*;
pub use self::parser::*;
pub use self::util::*;
