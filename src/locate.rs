use serde_json::Value;

use crate::coerce::to_identifier;

/// One hop in a document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// A section resolved somewhere inside the raw document. Absence is modeled
/// as `Option::None` by the locator, never as an error.
#[derive(Debug, Clone)]
pub struct LocatedSection<'a> {
    pub path: Vec<PathStep>,
    pub value: &'a Value,
}

/// Structural signature used by the last-resort shape search when no key in
/// the whole document matches the section name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// Rows carrying a timestamp-like column plus at least two value columns.
    History,
    /// Rows carrying a `price_label_1`/`price_1` pair.
    Range,
}

/// Resolve a logical section against a drifting document, in three tiers,
/// stopping at the first hit:
///
/// 1. exact known path `sections[<name>][<domain_key>]`
/// 2. mirrored fallback `raw[<domain_key>].data.sections[<name>][<domain_key>]`
/// 3. structural search over the whole graph: first array (pre-order,
///    document key order) whose immediate key contains every token of the
///    section name; failing that, the first array matching `shape`.
///
/// A tier-1/2 hit only counts when the value there is an array or object;
/// a scalar at a known path is treated as drift and the search continues.
pub fn locate<'a>(
    document: &'a Value,
    name: &str,
    domain_key: &str,
    shape: Option<RowShape>,
) -> Option<LocatedSection<'a>> {
    if let Some(found) = lookup_path(document, &["sections", name, domain_key]) {
        return Some(found);
    }
    if let Some(found) = lookup_path(document, &["raw", domain_key, "data", "sections", name, domain_key]) {
        return Some(found);
    }

    let tokens = name_tokens(name);
    let mut path = Vec::new();
    if let Some(found) = search_by_key(document, &tokens, &mut path) {
        return Some(found);
    }
    if let Some(shape) = shape {
        let mut path = Vec::new();
        return search_by_shape(document, shape, &mut path);
    }
    None
}

/// Render a path for diagnostics, e.g. `raw.moneylinemovement.data[2]`.
pub fn path_string(path: &[PathStep]) -> String {
    let mut out = String::new();
    for step in path {
        match step {
            PathStep::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathStep::Index(idx) => {
                out.push('[');
                out.push_str(&idx.to_string());
                out.push(']');
            }
        }
    }
    out
}

fn lookup_path<'a>(document: &'a Value, keys: &[&str]) -> Option<LocatedSection<'a>> {
    let mut current = document;
    let mut path = Vec::with_capacity(keys.len());
    for key in keys {
        current = current.get(*key)?;
        path.push(PathStep::Key((*key).to_string()));
    }
    if current.is_array() || current.is_object() {
        Some(LocatedSection {
            path,
            value: current,
        })
    } else {
        None
    }
}

fn name_tokens(name: &str) -> Vec<String> {
    to_identifier(name)
        .split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn key_matches(key: &str, tokens: &[String]) -> bool {
    let id = to_identifier(key);
    !tokens.is_empty() && tokens.iter().all(|t| id.contains(t.as_str()))
}

fn search_by_key<'a>(
    value: &'a Value,
    tokens: &[String],
    path: &mut Vec<PathStep>,
) -> Option<LocatedSection<'a>> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(PathStep::Key(key.clone()));
                if child.is_array() && key_matches(key, tokens) {
                    let found = LocatedSection {
                        path: path.clone(),
                        value: child,
                    };
                    path.pop();
                    return Some(found);
                }
                if let Some(found) = search_by_key(child, tokens, path) {
                    path.pop();
                    return Some(found);
                }
                path.pop();
            }
            None
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                path.push(PathStep::Index(idx));
                if let Some(found) = search_by_key(child, tokens, path) {
                    path.pop();
                    return Some(found);
                }
                path.pop();
            }
            None
        }
        _ => None,
    }
}

fn search_by_shape<'a>(
    value: &'a Value,
    shape: RowShape,
    path: &mut Vec<PathStep>,
) -> Option<LocatedSection<'a>> {
    if value.is_array() && array_matches_shape(value, shape) {
        return Some(LocatedSection {
            path: path.clone(),
            value,
        });
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(PathStep::Key(key.clone()));
                if let Some(found) = search_by_shape(child, shape, path) {
                    path.pop();
                    return Some(found);
                }
                path.pop();
            }
            None
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                path.push(PathStep::Index(idx));
                if let Some(found) = search_by_shape(child, shape, path) {
                    path.pop();
                    return Some(found);
                }
                path.pop();
            }
            None
        }
        _ => None,
    }
}

fn array_matches_shape(value: &Value, shape: RowShape) -> bool {
    let Some(rows) = value.as_array() else {
        return false;
    };
    let Some(first) = rows.iter().find_map(Value::as_object) else {
        return false;
    };
    match shape {
        RowShape::History => {
            let has_timestamp = first.keys().any(|k| {
                let id = to_identifier(k);
                id == "time_stamp" || id == "timestamp"
            });
            let value_columns = first
                .keys()
                .filter(|k| {
                    let id = to_identifier(k);
                    id != "time_stamp" && id != "timestamp" && id != "label"
                })
                .count();
            has_timestamp && value_columns >= 2
        }
        RowShape::Range => first.contains_key("price_label_1") && first.contains_key("price_1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_path_wins_over_mirror() {
        let doc = json!({
            "sections": { "Money Line History": { "moneylinemovement": [ { "a": 1 } ] } },
            "raw": { "moneylinemovement": { "data": { "sections": {
                "Money Line History": { "moneylinemovement": [ { "b": 2 } ] }
            } } } }
        });
        let found = locate(&doc, "Money Line History", "moneylinemovement", None).expect("located");
        assert_eq!(found.value, &json!([ { "a": 1 } ]));
        assert_eq!(path_string(&found.path), "sections.Money Line History.moneylinemovement");
    }

    #[test]
    fn mirror_path_used_when_exact_missing() {
        let doc = json!({
            "raw": { "moneylinemovement": { "data": { "sections": {
                "Money Line History": { "moneylinemovement": [ { "b": 2 } ] }
            } } } }
        });
        let found = locate(&doc, "Money Line History", "moneylinemovement", None).expect("located");
        assert_eq!(found.value, &json!([ { "b": 2 } ]));
    }

    #[test]
    fn scalar_at_known_path_is_drift_not_a_hit() {
        let doc = json!({
            "sections": { "Money Line History": { "moneylinemovement": "gone" } },
            "nested": { "moneyLineHistory": [ { "b": 2 } ] }
        });
        let found = locate(&doc, "Money Line History", "moneylinemovement", None).expect("located");
        assert_eq!(found.value, &json!([ { "b": 2 } ]));
    }

    #[test]
    fn key_token_search_is_case_and_punctuation_insensitive() {
        let doc = json!({
            "odds": { "Money-Line HISTORY rows": [ { "b": 2 } ] }
        });
        let found = locate(&doc, "Money Line History", "moneylinemovement", None).expect("located");
        assert_eq!(path_string(&found.path), "odds.Money-Line HISTORY rows");
    }

    #[test]
    fn key_search_returns_first_in_preorder() {
        let doc = json!({
            "first": { "money line history": [ { "a": 1 } ] },
            "second": { "money line history": [ { "b": 2 } ] }
        });
        let found = locate(&doc, "Money Line History", "moneylinemovement", None).expect("located");
        assert_eq!(found.value, &json!([ { "a": 1 } ]));
    }

    #[test]
    fn shape_search_finds_history_rows_without_matching_keys() {
        let doc = json!({
            "misc": { "xyz": [
                { "time stamp": "Current", "BUF": "-160", "TB": "140" }
            ] }
        });
        let found =
            locate(&doc, "Money Line History", "moneylinemovement", Some(RowShape::History))
                .expect("located");
        assert_eq!(path_string(&found.path), "misc.xyz");
    }

    #[test]
    fn shape_search_finds_range_rows() {
        let doc = json!({
            "blob": [ { "price_label_1": "Open", "price_1": "-110" } ]
        });
        let found = locate(&doc, "Money Line Analysis", "moneylineanalysis", Some(RowShape::Range))
            .expect("located");
        assert_eq!(path_string(&found.path), "blob");
    }

    #[test]
    fn absence_is_none() {
        let doc = json!({ "unrelated": { "stuff": 3 } });
        assert!(locate(&doc, "Money Line History", "moneylinemovement", Some(RowShape::History)).is_none());
    }
}
