//! Identifier deduplication.

use crate::record::{IdKey, Record};
use std::collections::HashSet;

/// Removes records whose identifier already appeared earlier in `records`.
///
/// The first occurrence of each id wins; later ones are dropped, not
/// merged. Relative order of the survivors is preserved. Returns the
/// survivors and the number of dropped records.
#[must_use]
pub fn dedup_first_wins(records: Vec<Record>) -> (Vec<Record>, usize) {
    let total = records.len();
    let mut seen: HashSet<IdKey> = HashSet::with_capacity(total);

    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| seen.insert(record.id_key()))
        .collect();

    let dropped = total - kept.len();
    (kept, dropped)
}

/// Counts records that share an identifier with an earlier record.
#[must_use]
pub fn count_duplicates(records: &[Record]) -> usize {
    let mut seen: HashSet<IdKey> = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter(|record| !seen.insert(record.id_key()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(values: Value) -> Vec<Record> {
        crate::record::records_from_value(values).unwrap()
    }

    #[test]
    fn first_occurrence_wins() {
        let (kept, dropped) = dedup_first_wins(records(json!([
            {"id": 1, "a": "x"},
            {"id": 1, "a": "y"}
        ])));
        assert_eq!(dropped, 1);
        assert_eq!(kept, records(json!([{"id": 1, "a": "x"}])));
    }

    #[test]
    fn order_is_preserved() {
        let (kept, _) = dedup_first_wins(records(json!([
            {"id": 3}, {"id": 1}, {"id": 3}, {"id": 2}, {"id": 1}
        ])));
        let ids: Vec<i64> = kept.iter().filter_map(|r| r.id()).map(|id| id.as_i64()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn missing_ids_collapse_to_first() {
        let (kept, dropped) = dedup_first_wins(records(json!([
            {"name": "a"}, {"id": null, "name": "b"}, {"id": 4}
        ])));
        assert_eq!(dropped, 1);
        assert_eq!(kept[0].get("name"), Some(&json!("a")));
    }

    #[test]
    fn string_and_integer_ids_differ() {
        let (kept, dropped) = dedup_first_wins(records(json!([{"id": 1}, {"id": "1"}])));
        assert_eq!(dropped, 0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn whole_float_ids_match_integers() {
        let (kept, dropped) = dedup_first_wins(records(json!([
            {"id": 1, "name": "a"}, {"id": 1.0, "name": "b"}
        ])));
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].get("name"), Some(&json!("a")));
    }

    #[test]
    fn dedup_is_idempotent() {
        let input = records(json!([{"id": 1}, {"id": 2}, {"id": 1}, {"id": 2}]));
        let (once, _) = dedup_first_wins(input);
        let (twice, dropped) = dedup_first_wins(once.clone());
        assert_eq!(once, twice);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn count_matches_dropped() {
        let input = records(json!([{"id": 1}, {"id": 1}, {"id": 1}, {"id": 2}]));
        assert_eq!(count_duplicates(&input), 2);
        assert_eq!(dedup_first_wins(input).1, 2);
        assert_eq!(count_duplicates(&[]), 0);
    }
}
