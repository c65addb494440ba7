use serde_json::{Map, Number, Value};

use crate::coerce::{parse_line, parse_money, parse_timestamp_label, to_identifier};
use crate::schema::{CurrentValue, MovementPoint, MovementSeries, TeamContext};

/// Columns that never carry a side's value.
const RESERVED_COLUMNS: &[&str] = &["time_stamp", "timestamp", "label"];

/// Vendor sentinel rows that are bookkeeping, not observations.
const MARKER_LABELS: &[&str] = &["historic_line_movement", "line_movement"];

/// How the two value columns of a series are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// American moneyline odds: signed integers only.
    Moneyline,
    /// Spread/total lines: fractional values allowed.
    Line,
}

/// The two columns a series binds its sides to. Decided once from the first
/// qualifying row and reused for the whole array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnBinding {
    pub home: String,
    pub away: String,
    pub heuristic: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SeriesExtraction {
    pub series: MovementSeries,
    /// True when the columns were inferred positionally rather than matched
    /// to the context abbreviations; home/away may be swapped.
    pub heuristic_columns: bool,
}

/// Turn a located history array into an ordered movement series and resolve
/// its current value.
///
/// Marker rows are skipped, rows with neither side parseable are dropped,
/// one-sided rows are kept (continuity beats bilateral completeness). The
/// current value comes from the row labeled `"current"` when present,
/// otherwise from the first kept row.
pub fn extract_series(rows: &[Value], context: &TeamContext, kind: ValueKind) -> SeriesExtraction {
    let Some(binding) = bind_columns(rows, context, RESERVED_COLUMNS) else {
        return SeriesExtraction::default();
    };
    let parse: fn(&Value) -> Option<Number> = match kind {
        ValueKind::Moneyline => parse_money,
        ValueKind::Line => parse_line,
    };

    let mut history = Vec::new();
    let mut current: Option<CurrentValue> = None;
    for row in rows {
        let Some(obj) = row.as_object() else {
            continue;
        };
        let label = row_label(obj);
        if label.as_deref().is_some_and(is_marker_label) {
            continue;
        }
        let home = get_ci(obj, &binding.home).and_then(parse);
        let away = get_ci(obj, &binding.away).and_then(parse);
        if home.is_none() && away.is_none() {
            continue;
        }
        if current.is_none() && label.as_deref().is_some_and(|l| l.eq_ignore_ascii_case("current")) {
            current = Some(CurrentValue {
                home: home.clone(),
                away: away.clone(),
            });
        }
        let timed = label
            .as_deref()
            .map(|l| parse_timestamp_label(l, context.season_year));
        history.push(MovementPoint {
            timestamp: timed.as_ref().and_then(|t| t.timestamp.clone()),
            label: timed.map(|t| t.label),
            home,
            away,
        });
    }

    let current = current
        .or_else(|| {
            history.first().map(|point| CurrentValue {
                home: point.home.clone(),
                away: point.away.clone(),
            })
        })
        .unwrap_or_default();

    SeriesExtraction {
        series: MovementSeries { current, history },
        heuristic_columns: binding.heuristic,
    }
}

/// Bind the two value columns of a row array to home/away roles.
///
/// An exact (case-insensitive) match of both context abbreviations in the
/// first data row wins. Otherwise the first row with two or more
/// non-reserved columns decides positionally: first column away, second
/// home. Positional binding is reported back as heuristic.
pub(crate) fn bind_columns(
    rows: &[Value],
    context: &TeamContext,
    reserved: &[&str],
) -> Option<ColumnBinding> {
    let first = rows.iter().find_map(Value::as_object)?;
    let home_key = first.keys().find(|k| k.eq_ignore_ascii_case(&context.home_abbr));
    let away_key = first.keys().find(|k| k.eq_ignore_ascii_case(&context.away_abbr));
    if let (Some(home), Some(away)) = (home_key, away_key) {
        return Some(ColumnBinding {
            home: home.clone(),
            away: away.clone(),
            heuristic: false,
        });
    }

    for row in rows {
        let Some(obj) = row.as_object() else {
            continue;
        };
        let open: Vec<&String> = obj
            .keys()
            .filter(|k| !reserved.contains(&to_identifier(k).as_str()))
            .collect();
        if open.len() >= 2 {
            return Some(ColumnBinding {
                away: open[0].clone(),
                home: open[1].clone(),
                heuristic: true,
            });
        }
    }
    None
}

/// First present of `time stamp` / `timestamp` / `label`, in that order.
fn row_label(obj: &Map<String, Value>) -> Option<String> {
    for wanted in RESERVED_COLUMNS {
        let found = obj
            .iter()
            .find(|(k, _)| to_identifier(k) == **wanted)
            .map(|(_, v)| v);
        if let Some(value) = found {
            // the first present column decides, even when it holds a
            // non-string
            return value.as_str().map(|s| s.trim().to_string());
        }
    }
    None
}

fn is_marker_label(label: &str) -> bool {
    MARKER_LABELS.contains(&to_identifier(label).as_str())
}

pub(crate) fn get_ci<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key)
        .or_else(|| obj.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
}
