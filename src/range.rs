use serde_json::Value;

use crate::coerce::parse_line;
use crate::schema::RangeAggregate;

const PAIRS: &[(&str, &str)] = &[("price_label_1", "price_1"), ("price_label_2", "price_2")];

/// Fold label/value row-pairs into an open/high/low/last aggregate.
///
/// Labels are matched case-insensitively by substring; a slot is written
/// only while still unset, so the first row claiming a bucket wins and later
/// conflicting rows are ignored. Rows without a recognized label contribute
/// nothing.
pub fn reduce_range_rows(rows: &[Value]) -> RangeAggregate {
    let mut out = RangeAggregate::default();
    for row in rows {
        for (label_key, value_key) in PAIRS {
            let Some(label) = row.get(*label_key).and_then(Value::as_str) else {
                continue;
            };
            let Some(value) = row.get(*value_key).and_then(parse_line) else {
                continue;
            };
            let lowered = label.to_ascii_lowercase();
            if lowered.contains("open") && out.open.is_none() {
                out.open = Some(value.clone());
            }
            if lowered.contains("high") && out.high.is_none() {
                out.high = Some(value.clone());
            }
            if lowered.contains("low") && out.low.is_none() {
                out.low = Some(value.clone());
            }
            if lowered.contains("last") && out.last.is_none() {
                out.last = Some(value.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(raw: Value) -> Vec<Value> {
        raw.as_array().expect("rows fixture is an array").clone()
    }

    #[test]
    fn fills_all_four_buckets() {
        let rows = rows(json!([
            { "price_label_1": "Open", "price_1": "-3.5", "price_label_2": "High", "price_2": "-2.5" },
            { "price_label_1": "Low", "price_1": "-6", "price_label_2": "Last", "price_2": "-4.5" }
        ]));
        let agg = reduce_range_rows(&rows);
        assert_eq!(agg.open.and_then(|n| n.as_f64()), Some(-3.5));
        assert_eq!(agg.high.and_then(|n| n.as_f64()), Some(-2.5));
        assert_eq!(agg.low.and_then(|n| n.as_i64()), Some(-6));
        assert_eq!(agg.last.and_then(|n| n.as_f64()), Some(-4.5));
    }

    #[test]
    fn first_writer_wins_on_conflicting_open_rows() {
        let rows = rows(json!([
            { "price_label_1": "Open", "price_1": "-150" },
            { "price_label_1": "Open", "price_1": "-170" }
        ]));
        let agg = reduce_range_rows(&rows);
        assert_eq!(agg.open.and_then(|n| n.as_i64()), Some(-150));
    }

    #[test]
    fn unrecognized_labels_and_missing_values_are_skipped() {
        let rows = rows(json!([
            { "price_label_1": "Consensus", "price_1": "55" },
            { "price_label_1": "Open" },
            { "price_label_1": "Open", "price_1": "bad" },
            { "price_label_1": "Open", "price_1": "-110" }
        ]));
        let agg = reduce_range_rows(&rows);
        assert_eq!(agg.open.and_then(|n| n.as_i64()), Some(-110));
        assert_eq!(agg.high, None);
        assert_eq!(agg.low, None);
        assert_eq!(agg.last, None);
    }

    #[test]
    fn reordering_is_stable_when_buckets_do_not_conflict() {
        let a = rows(json!([
            { "price_label_1": "Open", "price_1": "210" },
            { "price_label_1": "Last", "price_1": "225" }
        ]));
        let mut b = a.clone();
        b.reverse();
        assert_eq!(reduce_range_rows(&a), reduce_range_rows(&b));
    }
}
