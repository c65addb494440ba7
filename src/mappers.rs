use serde_json::{Map, Value};

use crate::coerce::{
    StatValue, normalize_status, parse_number_str, parse_stat, parse_timestamp_label, to_identifier,
};
use crate::locate::{RowShape, locate, path_string};
use crate::range::reduce_range_rows;
use crate::schema::{
    Diagnostic, InjuryEntry, InjuryReport, MovementSeries, RangeAggregate, TeamContext, TeamRows,
    TeamTable,
};
use crate::series::{ValueKind, bind_columns, extract_series, get_ci};

/// Columns that label a stat row rather than carry a team's value.
const TABLE_RESERVED: &[&str] = &["title", "stat", "name", "label", "category", "rank"];

/// Keys whose string values get resolved into timestamps during generic row
/// normalization.
const TIMESTAMP_KEYS: &[&str] = &["time_stamp", "timestamp", "date", "game_date"];

fn warn(diagnostics: &mut Vec<Diagnostic>, section: &str, message: impl Into<String>) {
    diagnostics.push(Diagnostic {
        section: section.to_string(),
        message: message.into(),
    });
}

/// Movement-series sections (moneyline, point spread, over/under history).
pub fn map_movement(
    document: &Value,
    context: &TeamContext,
    section: &str,
    domain_key: &str,
    kind: ValueKind,
    diagnostics: &mut Vec<Diagnostic>,
) -> MovementSeries {
    let Some(found) = locate(document, section, domain_key, Some(RowShape::History)) else {
        warn(
            diagnostics,
            domain_key,
            format!("section \"{section}\" not located, empty series emitted"),
        );
        return MovementSeries::default();
    };
    let Some(rows) = found.value.as_array() else {
        warn(
            diagnostics,
            domain_key,
            format!("value at {} is not an array", path_string(&found.path)),
        );
        return MovementSeries::default();
    };
    let extraction = extract_series(rows, context, kind);
    if extraction.heuristic_columns {
        warn(
            diagnostics,
            domain_key,
            "column roles inferred positionally, home/away may be swapped",
        );
    }
    if extraction.series.history.is_empty() && !rows.is_empty() {
        warn(diagnostics, domain_key, "no usable rows in history array");
    }
    extraction.series
}

/// Range sections (moneyline / point spread / over-under analysis).
pub fn map_range(
    document: &Value,
    section: &str,
    domain_key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> RangeAggregate {
    let Some(found) = locate(document, section, domain_key, Some(RowShape::Range)) else {
        warn(
            diagnostics,
            domain_key,
            format!("section \"{section}\" not located, empty range emitted"),
        );
        return RangeAggregate::default();
    };
    let Some(rows) = found.value.as_array() else {
        warn(
            diagnostics,
            domain_key,
            format!("value at {} is not an array", path_string(&found.path)),
        );
        return RangeAggregate::default();
    };
    reduce_range_rows(rows)
}

/// Two-sided stat tables (efficiency stats, matchup stats, power ratings).
pub fn map_team_table(
    document: &Value,
    context: &TeamContext,
    section: &str,
    domain_key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> TeamTable {
    let Some(found) = locate(document, section, domain_key, None) else {
        warn(
            diagnostics,
            domain_key,
            format!("section \"{section}\" not located, empty table emitted"),
        );
        return TeamTable::default();
    };
    match found.value {
        Value::Array(rows) => table_from_rows(rows, context, domain_key, diagnostics),
        Value::Object(map) => table_from_sides(map, context, domain_key, diagnostics),
        _ => {
            warn(
                diagnostics,
                domain_key,
                format!("value at {} has no usable shape", path_string(&found.path)),
            );
            TeamTable::default()
        }
    }
}

fn table_from_rows(
    rows: &[Value],
    context: &TeamContext,
    domain_key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> TeamTable {
    let Some(binding) = bind_columns(rows, context, TABLE_RESERVED) else {
        warn(diagnostics, domain_key, "no team value columns recognized");
        return TeamTable::default();
    };
    if binding.heuristic {
        warn(
            diagnostics,
            domain_key,
            "team columns inferred positionally, home/away may be swapped",
        );
    }

    let mut table = TeamTable::default();
    let mut unlabeled = 0usize;
    for row in rows {
        let Some(obj) = row.as_object() else {
            continue;
        };
        let Some(label) = table_row_label(obj) else {
            unlabeled += 1;
            continue;
        };
        let id = to_identifier(&label);
        if id.is_empty() {
            unlabeled += 1;
            continue;
        }
        if let Some(value) = get_ci(obj, &binding.home) {
            table.home.entry(id.clone()).or_insert_with(|| stat_cell(value));
        }
        if let Some(value) = get_ci(obj, &binding.away) {
            table.away.entry(id).or_insert_with(|| stat_cell(value));
        }
    }
    if unlabeled > 0 {
        warn(
            diagnostics,
            domain_key,
            format!("{unlabeled} stat rows without a label skipped"),
        );
    }
    table
}

fn table_from_sides(
    map: &Map<String, Value>,
    context: &TeamContext,
    domain_key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> TeamTable {
    let home = side_entry(map, &context.home_abbr, "home");
    let away = side_entry(map, &context.away_abbr, "away");
    if home.is_none() && away.is_none() {
        warn(diagnostics, domain_key, "no home/away keyed entries found");
        return TeamTable::default();
    }

    let mut table = TeamTable::default();
    if let Some(obj) = home.and_then(Value::as_object) {
        for (key, value) in obj {
            table.home.entry(to_identifier(key)).or_insert_with(|| stat_cell(value));
        }
    }
    if let Some(obj) = away.and_then(Value::as_object) {
        for (key, value) in obj {
            table.away.entry(to_identifier(key)).or_insert_with(|| stat_cell(value));
        }
    }
    table
}

/// Two-sided row lists (dual game log, situational trends, stat splits).
pub fn map_team_rows(
    document: &Value,
    context: &TeamContext,
    section: &str,
    domain_key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> TeamRows {
    let Some(found) = locate(document, section, domain_key, None) else {
        warn(
            diagnostics,
            domain_key,
            format!("section \"{section}\" not located, empty rows emitted"),
        );
        return TeamRows::default();
    };
    match found.value {
        Value::Object(map) => {
            let out = TeamRows {
                home: side_rows(map, &context.home_abbr, "home", context.season_year),
                away: side_rows(map, &context.away_abbr, "away", context.season_year),
            };
            if out.home.is_empty() && out.away.is_empty() {
                warn(diagnostics, domain_key, "no home/away keyed rows found");
            }
            out
        }
        Value::Array(rows) => split_rows_by_team(rows, context, domain_key, diagnostics),
        _ => {
            warn(
                diagnostics,
                domain_key,
                format!("value at {} has no usable shape", path_string(&found.path)),
            );
            TeamRows::default()
        }
    }
}

fn side_rows(
    map: &Map<String, Value>,
    abbr: &str,
    role: &str,
    season_year: Option<i32>,
) -> Vec<Value> {
    side_entry(map, abbr, role)
        .and_then(Value::as_array)
        .map(|rows| rows.iter().map(|row| normalize_row(row, season_year)).collect())
        .unwrap_or_default()
}

fn split_rows_by_team(
    rows: &[Value],
    context: &TeamContext,
    domain_key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> TeamRows {
    let mut out = TeamRows::default();
    let mut unattributed = 0usize;
    for row in rows {
        let Some(obj) = row.as_object() else {
            unattributed += 1;
            continue;
        };
        match row_side(obj, context) {
            Some(Side::Home) => out.home.push(normalize_row(row, context.season_year)),
            Some(Side::Away) => out.away.push(normalize_row(row, context.season_year)),
            None => unattributed += 1,
        }
    }
    if unattributed > 0 {
        warn(
            diagnostics,
            domain_key,
            format!("{unattributed} rows named neither team and were dropped"),
        );
    }
    out
}

/// Flat row-list sections (head to head, similar games).
pub fn map_rows(
    document: &Value,
    context: &TeamContext,
    section: &str,
    domain_key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Value> {
    let Some(found) = locate(document, section, domain_key, None) else {
        warn(
            diagnostics,
            domain_key,
            format!("section \"{section}\" not located, empty list emitted"),
        );
        return Vec::new();
    };
    let Some(rows) = found.value.as_array() else {
        warn(
            diagnostics,
            domain_key,
            format!("value at {} is not an array", path_string(&found.path)),
        );
        return Vec::new();
    };
    rows.iter().map(|row| normalize_row(row, context.season_year)).collect()
}

/// Single-object sections (game overview, travel analysis).
pub fn map_object(
    document: &Value,
    context: &TeamContext,
    section: &str,
    domain_key: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Map<String, Value> {
    let Some(found) = locate(document, section, domain_key, None) else {
        warn(
            diagnostics,
            domain_key,
            format!("section \"{section}\" not located, empty object emitted"),
        );
        return Map::new();
    };
    // Some captures wrap the summary object in a one-element array.
    let value = match found.value {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    };
    match normalize_row(value, context.season_year) {
        Value::Object(map) => map,
        _ => {
            warn(
                diagnostics,
                domain_key,
                format!("value at {} is not an object", path_string(&found.path)),
            );
            Map::new()
        }
    }
}

/// Injury report: two-sided lists of typed entries with normalized status.
pub fn map_injuries(
    document: &Value,
    context: &TeamContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> InjuryReport {
    let domain_key = "injuryreport";
    let Some(found) = locate(document, "Injury Report", domain_key, None) else {
        warn(
            diagnostics,
            domain_key,
            "section \"Injury Report\" not located, empty report emitted",
        );
        return InjuryReport::default();
    };
    match found.value {
        Value::Object(map) => {
            let report = InjuryReport {
                home: injury_side(map, &context.home_abbr, "home", context.season_year),
                away: injury_side(map, &context.away_abbr, "away", context.season_year),
            };
            if report.home.is_empty() && report.away.is_empty() {
                warn(diagnostics, domain_key, "no home/away keyed injury rows found");
            }
            report
        }
        Value::Array(rows) => {
            let mut report = InjuryReport::default();
            let mut unattributed = 0usize;
            for row in rows {
                let Some(obj) = row.as_object() else {
                    unattributed += 1;
                    continue;
                };
                match row_side(obj, context) {
                    Some(Side::Home) => report.home.push(injury_entry(obj, context.season_year)),
                    Some(Side::Away) => report.away.push(injury_entry(obj, context.season_year)),
                    None => unattributed += 1,
                }
            }
            if unattributed > 0 {
                warn(
                    diagnostics,
                    domain_key,
                    format!("{unattributed} injury rows named neither team and were dropped"),
                );
            }
            report
        }
        _ => {
            warn(
                diagnostics,
                domain_key,
                format!("value at {} has no usable shape", path_string(&found.path)),
            );
            InjuryReport::default()
        }
    }
}

fn injury_side(
    map: &Map<String, Value>,
    abbr: &str,
    role: &str,
    season_year: Option<i32>,
) -> Vec<InjuryEntry> {
    side_entry(map, abbr, role)
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_object)
                .map(|obj| injury_entry(obj, season_year))
                .collect()
        })
        .unwrap_or_default()
}

fn injury_entry(obj: &Map<String, Value>, season_year: Option<i32>) -> InjuryEntry {
    let date = pick_string(obj, &["date", "updated", "report_date", "game_date"]).map(|s| {
        let timed = parse_timestamp_label(&s, season_year);
        timed.timestamp.unwrap_or(timed.label)
    });
    InjuryEntry {
        player: pick_string(obj, &["player", "player_name", "name"]),
        position: pick_string(obj, &["position", "pos"]),
        status: pick_string(obj, &["status", "injury_status", "designation"])
            .map(|s| normalize_status(&s)),
        note: pick_string(obj, &["note", "comment", "injury", "details", "description"]),
        date,
    }
}

// ---------------------------------------------------------------------------
// Shared row/object normalization
// ---------------------------------------------------------------------------

/// Recursively normalize a row of unknown layout: keys through
/// `to_identifier` (first occurrence wins on collisions), numeric-looking
/// strings to numbers, timestamp-ish keys through the label grammars.
pub fn normalize_row(value: &Value, season_year: Option<i32>) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                let id = to_identifier(key);
                let normalized = if TIMESTAMP_KEYS.contains(&id.as_str()) && child.is_string() {
                    match child.as_str() {
                        Some(s) => {
                            let timed = parse_timestamp_label(s, season_year);
                            Value::String(timed.timestamp.unwrap_or(timed.label))
                        }
                        None => Value::Null,
                    }
                } else {
                    normalize_row(child, season_year)
                };
                out.entry(id).or_insert(normalized);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items.iter().map(|item| normalize_row(item, season_year)).collect(),
        ),
        Value::String(s) => normalize_scalar(s),
        other => other.clone(),
    }
}

fn normalize_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match parse_number_str(trimmed) {
        Some(n) => Value::Number(n),
        None => Value::String(trimmed.to_string()),
    }
}

fn stat_cell(value: &Value) -> Value {
    match parse_stat(value) {
        Some(stat) => stat_to_value(stat),
        None => Value::Null,
    }
}

fn stat_to_value(stat: StatValue) -> Value {
    let mut obj = Map::new();
    obj.insert("value".to_string(), stat.value);
    if let Some(rank) = stat.rank {
        obj.insert("rank".to_string(), Value::from(rank));
    }
    Value::Object(obj)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

fn row_side(obj: &Map<String, Value>, context: &TeamContext) -> Option<Side> {
    for wanted in &["team", "team_abbr", "abbr", "side"] {
        let Some(value) = obj
            .iter()
            .find(|(k, _)| to_identifier(k) == *wanted)
            .map(|(_, v)| v)
        else {
            continue;
        };
        let Some(s) = value.as_str() else {
            continue;
        };
        let s = s.trim();
        if s.eq_ignore_ascii_case(&context.home_abbr) || s.eq_ignore_ascii_case("home") {
            return Some(Side::Home);
        }
        if s.eq_ignore_ascii_case(&context.away_abbr) || s.eq_ignore_ascii_case("away") {
            return Some(Side::Away);
        }
    }
    None
}

fn side_entry<'a>(map: &'a Map<String, Value>, abbr: &str, role: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(abbr) || to_identifier(k) == role)
        .map(|(_, v)| v)
}

fn table_row_label(obj: &Map<String, Value>) -> Option<String> {
    for wanted in &["title", "stat", "name", "label", "category"] {
        let found = obj
            .iter()
            .find(|(k, _)| to_identifier(k) == *wanted)
            .and_then(|(_, v)| v.as_str());
        if let Some(s) = found {
            let s = s.trim();
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}

fn pick_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    for wanted in keys {
        let Some(value) = obj
            .iter()
            .find(|(k, _)| to_identifier(k) == *wanted)
            .map(|(_, v)| v)
        else {
            continue;
        };
        match value {
            Value::String(s) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Value::Number(n) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}
