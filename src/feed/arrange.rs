//! Feed ordering policy
//!
//! Splits the combined records into an optional smallest-first head and a
//! tail that is shuffled in groups of consecutive records.

use rand::seq::SliceRandom;
use rand::Rng;

use super::ImageRecord;

/// Order records for display
///
/// With `head_size > 0` the records are stable-sorted by size (unknown sizes
/// last) and the first `head_size` are emitted unshuffled. The rest is cut
/// into groups of `pair_size` in their current order, the groups are
/// shuffled, and each group keeps its internal order.
pub fn arrange<R: Rng + ?Sized>(
    mut records: Vec<ImageRecord>,
    pair_size: usize,
    head_size: usize,
    rng: &mut R,
) -> Vec<String> {
    let tail = if head_size > 0 {
        records.sort_by_key(|r| r.sort_key());
        let split = head_size.min(records.len());
        records.split_off(split)
    } else {
        std::mem::take(&mut records)
    };
    let head = records;

    let mut groups = group(tail, pair_size);
    groups.shuffle(rng);

    head.into_iter()
        .chain(groups.into_iter().flatten())
        .map(|r| r.url)
        .collect()
}

/// Cut a sequence into consecutive runs of `size`, keeping a short last run
pub fn group<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut groups = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size);
    for item in items {
        current.push(item);
        if current.len() == size {
            groups.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}
