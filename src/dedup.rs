use std::collections::HashMap;
use tracing::debug;

use crate::item::Item;

/// Merge per-source lists into one set keyed by [`Item::identity`].
///
/// On a collision the later `published_at` wins; on an exact tie the
/// first-seen item is kept. The result is in first-seen key order, but
/// callers should treat it as a set.
pub fn merge(lists: Vec<Vec<Item>>) -> Vec<Item> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Item> = Vec::new();
    let mut collisions = 0usize;

    for item in lists.into_iter().flatten() {
        match index.get(item.identity()) {
            Some(&pos) => {
                collisions += 1;
                if item.published_at > merged[pos].published_at {
                    merged[pos] = item;
                }
            }
            None => {
                index.insert(item.identity().to_string(), merged.len());
                merged.push(item);
            }
        }
    }

    if collisions > 0 {
        debug!("Merged {} duplicate items", collisions);
    }
    merged
}
