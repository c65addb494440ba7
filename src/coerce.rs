use chrono::{Datelike, NaiveDate, Utc};
use serde_json::{Number, Value};

/// A label paired with the UTC timestamp it resolved to, when it resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedLabel {
    pub label: String,
    pub timestamp: Option<String>,
}

/// A normalized stat value: a number (or preserved raw text) plus an
/// optional rank pulled out of `"(#N)"` suffixes.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatValue {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parse an American-odds style value: numbers pass through, strings are
/// trimmed and read as signed integers (`"+233"` -> 233). Anything else is
/// `None`, never an error.
pub fn parse_money(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => parse_int_str(s),
        _ => None,
    }
}

/// Parse a spread/total style value. Same contract as [`parse_money`] but
/// fractional lines (`"-3.5"`, `"47.5"`) are accepted; integral results stay
/// integers so they serialize without a trailing `.0`.
pub fn parse_line(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => parse_number_str(s),
        _ => None,
    }
}

pub(crate) fn parse_int_str(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    trimmed.parse::<i64>().ok().map(Number::from)
}

pub(crate) fn parse_number_str(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Parse a stat cell in one of the vendor shapes, tried in order:
/// `"NN.NN% (#R)"`, `"NN.NN (#R)"`, `"NN.NN%"`, bare number. Percent forms
/// are scaled into [0, 1]. Strings that match none of the shapes and fail a
/// plain numeric parse are preserved verbatim under `value`, so downstream
/// consumers can see the data was never normalized.
pub fn parse_stat(value: &Value) -> Option<StatValue> {
    match value {
        Value::Number(n) => Some(StatValue {
            value: Value::Number(n.clone()),
            rank: None,
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Some((lead, rank)) = split_rank(trimmed) {
                if let Some(v) = numeric_part(lead) {
                    return Some(StatValue {
                        value: v,
                        rank: Some(rank),
                    });
                }
            }
            if let Some(v) = numeric_part(trimmed) {
                return Some(StatValue {
                    value: v,
                    rank: None,
                });
            }
            Some(StatValue {
                value: Value::String(trimmed.to_string()),
                rank: None,
            })
        }
        _ => None,
    }
}

/// Split `"36.52% (#24)"` into its leading value text and the rank.
fn split_rank(raw: &str) -> Option<(&str, u32)> {
    let open = raw.rfind("(#")?;
    let close = raw[open..].find(')')? + open;
    let rank = raw[open + 2..close].trim().parse::<u32>().ok()?;
    Some((raw[..open].trim(), rank))
}

fn numeric_part(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Some(pct) = trimmed.strip_suffix('%') {
        let v = pct.trim().parse::<f64>().ok()? / 100.0;
        return Number::from_f64(v).map(Value::Number);
    }
    parse_number_str(trimmed).map(Value::Number)
}

/// Resolve a movement-row label into a UTC ISO-8601 timestamp.
///
/// ISO-prefixed labels pass through unchanged. Otherwise two vendor grammars
/// are tried: `"Mon D H:MM AM/PM"` and `"MM/DD HH:MM AM/PM"`, with the year
/// taken from `season_year` (current UTC year when absent or implausible).
/// Labels matching neither grammar ("Current", marker tokens) keep
/// `timestamp: None`; that is expected data, not an error.
pub fn parse_timestamp_label(label: &str, season_year: Option<i32>) -> TimedLabel {
    let trimmed = label.trim();
    if is_iso_prefixed(trimmed) {
        return TimedLabel {
            label: trimmed.to_string(),
            timestamp: Some(trimmed.to_string()),
        };
    }
    let year = season_year
        .filter(|y| (1900..=2100).contains(y))
        .unwrap_or_else(|| Utc::now().year());
    let timestamp = parse_month_name_label(trimmed, year).or_else(|| parse_slash_label(trimmed, year));
    TimedLabel {
        label: trimmed.to_string(),
        timestamp,
    }
}

fn is_iso_prefixed(raw: &str) -> bool {
    let b = raw.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}

fn month_number(token: &str) -> Option<u32> {
    let lowered = token.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| lowered.starts_with(m))
        .map(|idx| idx as u32 + 1)
}

fn parse_month_name_label(raw: &str, year: i32) -> Option<String> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() != 4 {
        return None;
    }
    let month = month_number(parts[0])?;
    let day = parts[1].parse::<u32>().ok()?;
    let (hour, minute) = parse_clock(parts[2], parts[3])?;
    format_utc(year, month, day, hour, minute)
}

fn parse_slash_label(raw: &str, year: i32) -> Option<String> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() != 3 {
        return None;
    }
    let (m, d) = parts[0].split_once('/')?;
    let month = m.parse::<u32>().ok()?;
    let day = d.parse::<u32>().ok()?;
    let (hour, minute) = parse_clock(parts[1], parts[2])?;
    format_utc(year, month, day, hour, minute)
}

fn parse_clock(time: &str, meridiem: &str) -> Option<(u32, u32)> {
    let (h, m) = time.split_once(':')?;
    let mut hour = h.parse::<u32>().ok()?;
    let minute = m.parse::<u32>().ok()?;
    if hour == 0 || hour > 12 || minute > 59 {
        return None;
    }
    match meridiem.to_ascii_uppercase().as_str() {
        "PM" => {
            if hour != 12 {
                hour += 12;
            }
        }
        "AM" => {
            if hour == 12 {
                hour = 0;
            }
        }
        _ => return None,
    }
    Some((hour, minute))
}

fn format_utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<String> {
    // Rejects impossible dates (Feb 30) before formatting.
    NaiveDate::from_ymd_opt(year, month, day)?;
    Some(format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:00Z"
    ))
}

/// Normalize an injury status string to one of the canonical tokens, by
/// substring in priority order. Unmatched input is returned uppercased.
pub fn normalize_status(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if upper.contains("PROBABLE") {
        return "PROBABLE".to_string();
    }
    if upper.contains("QUESTIONABLE") {
        return "QUESTIONABLE".to_string();
    }
    if upper == "IR" || upper.contains("I-R") || upper.contains("INJURED RESERVE") {
        return "I-R".to_string();
    }
    if upper.contains("OUT") {
        return "OUT".to_string();
    }
    upper
}

/// Turn free-text vendor labels into stable map keys: lowercase, punctuation
/// stripped, whitespace runs collapsed to single underscores. Every
/// stringly-typed key comparison in the crate goes through this.
pub fn to_identifier(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_money_reads_signed_integer_strings() {
        assert_eq!(parse_money(&json!("+233")).and_then(|n| n.as_i64()), Some(233));
        assert_eq!(parse_money(&json!("-267")).and_then(|n| n.as_i64()), Some(-267));
        assert_eq!(parse_money(&json!(" 140 ")).and_then(|n| n.as_i64()), Some(140));
        assert_eq!(parse_money(&json!(-110)).and_then(|n| n.as_i64()), Some(-110));
    }

    #[test]
    fn parse_money_rejects_junk() {
        assert_eq!(parse_money(&json!("")), None);
        assert_eq!(parse_money(&json!("even")), None);
        assert_eq!(parse_money(&json!(null)), None);
        assert_eq!(parse_money(&json!([1, 2])), None);
    }

    #[test]
    fn parse_line_accepts_fractions() {
        let n = parse_line(&json!("-3.5")).expect("fraction");
        assert_eq!(n.as_f64(), Some(-3.5));
        // integral strings stay integers
        let n = parse_line(&json!("+7")).expect("integer");
        assert!(n.is_i64());
        assert_eq!(n.as_i64(), Some(7));
    }

    #[test]
    fn parse_stat_percent_with_rank() {
        let stat = parse_stat(&json!("36.52% (#24)")).expect("stat");
        let v = stat.value.as_f64().expect("number");
        assert!((v - 0.3652).abs() < 1e-12);
        assert_eq!(stat.rank, Some(24));
    }

    #[test]
    fn parse_stat_plain_with_rank() {
        let stat = parse_stat(&json!("24.4 (#11)")).expect("stat");
        assert_eq!(stat.value.as_f64(), Some(24.4));
        assert_eq!(stat.rank, Some(11));
    }

    #[test]
    fn parse_stat_percent_only() {
        let stat = parse_stat(&json!("36.52%")).expect("stat");
        let v = stat.value.as_f64().expect("number");
        assert!((v - 0.3652).abs() < 1e-12);
        assert_eq!(stat.rank, None);
    }

    #[test]
    fn parse_stat_preserves_unparseable_text() {
        let stat = parse_stat(&json!("N/A")).expect("stat");
        assert_eq!(stat.value, json!("N/A"));
        assert_eq!(stat.rank, None);
    }

    #[test]
    fn timestamp_month_name_grammar() {
        let timed = parse_timestamp_label("Nov 16 12:18 PM", Some(2021));
        assert_eq!(timed.timestamp.as_deref(), Some("2021-11-16T12:18:00Z"));
        assert_eq!(timed.label, "Nov 16 12:18 PM");
    }

    #[test]
    fn timestamp_slash_grammar() {
        let timed = parse_timestamp_label("11/16 09:05 AM", Some(2021));
        assert_eq!(timed.timestamp.as_deref(), Some("2021-11-16T09:05:00Z"));
    }

    #[test]
    fn timestamp_twelve_hour_edges() {
        let noon = parse_timestamp_label("Jan 2 12:00 PM", Some(2022));
        assert_eq!(noon.timestamp.as_deref(), Some("2022-01-02T12:00:00Z"));
        let midnight = parse_timestamp_label("Jan 2 12:00 AM", Some(2022));
        assert_eq!(midnight.timestamp.as_deref(), Some("2022-01-02T00:00:00Z"));
        let evening = parse_timestamp_label("Jan 2 7:30 PM", Some(2022));
        assert_eq!(evening.timestamp.as_deref(), Some("2022-01-02T19:30:00Z"));
    }

    #[test]
    fn timestamp_iso_prefix_passes_through() {
        let timed = parse_timestamp_label("2021-11-16T12:18:00Z", Some(1999));
        assert_eq!(timed.timestamp.as_deref(), Some("2021-11-16T12:18:00Z"));
    }

    #[test]
    fn timestamp_marker_labels_stay_unresolved() {
        let timed = parse_timestamp_label("Current", Some(2021));
        assert_eq!(timed.label, "Current");
        assert_eq!(timed.timestamp, None);
    }

    #[test]
    fn timestamp_rejects_impossible_dates() {
        let timed = parse_timestamp_label("Feb 30 1:00 PM", Some(2021));
        assert_eq!(timed.timestamp, None);
    }

    #[test]
    fn status_substring_priority() {
        assert_eq!(normalize_status("Questionable (ankle)"), "QUESTIONABLE");
        assert_eq!(normalize_status("probable"), "PROBABLE");
        assert_eq!(normalize_status("Out for season"), "OUT");
        assert_eq!(normalize_status("Injured Reserve"), "I-R");
        assert_eq!(normalize_status("ir"), "I-R");
        assert_eq!(normalize_status("day-to-day"), "DAY-TO-DAY");
    }

    #[test]
    fn identifier_normalization() {
        assert_eq!(to_identifier("Money Line History"), "money_line_history");
        assert_eq!(to_identifier("Pts/Gm (Off.)"), "pts_gm_off");
        assert_eq!(to_identifier("  Time   Stamp "), "time_stamp");
        assert_eq!(to_identifier("ATS%"), "ats");
    }
}
