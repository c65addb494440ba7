use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Immutable matchup context supplied once per conversion. Used to bind
/// team-keyed columns to home/away roles and to resolve year-less labels.
#[derive(Debug, Clone)]
pub struct TeamContext {
    pub home_abbr: String,
    pub away_abbr: String,
    pub season_year: Option<i32>,
}

impl TeamContext {
    pub fn new(home_abbr: impl Into<String>, away_abbr: impl Into<String>, season_year: Option<i32>) -> Self {
        Self {
            home_abbr: home_abbr.into(),
            away_abbr: away_abbr.into(),
            season_year,
        }
    }
}

/// One non-fatal warning recorded while compiling. Order of appearance is
/// preserved; nothing in this channel ever aborts a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub section: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub home: String,
    pub away: String,
    pub seasonyear: Option<i32>,
    pub schemaversion: &'static str,
}

/// The resolved "as of now" value of a movement series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentValue {
    pub home: Option<Number>,
    pub away: Option<Number>,
}

/// One observation in a movement series. At least one side is always
/// present; rows with neither are dropped during extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementPoint {
    pub timestamp: Option<String>,
    pub label: Option<String>,
    pub home: Option<Number>,
    pub away: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovementSeries {
    pub current: CurrentValue,
    pub history: Vec<MovementPoint>,
}

/// Open/high/low/last summary of a line. Each slot is written at most once,
/// first writer wins; slots never observed stay null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeAggregate {
    pub open: Option<Number>,
    pub high: Option<Number>,
    pub low: Option<Number>,
    pub last: Option<Number>,
}

/// Identifier-keyed stat map per side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamTable {
    pub home: Map<String, Value>,
    pub away: Map<String, Value>,
}

/// Normalized row lists per side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamRows {
    pub home: Vec<Value>,
    pub away: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InjuryEntry {
    pub player: Option<String>,
    pub position: Option<String>,
    pub status: Option<String>,
    pub note: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InjuryReport {
    pub home: Vec<InjuryEntry>,
    pub away: Vec<InjuryEntry>,
}

/// The canonical output document. Every key is always present; sections the
/// source document never provided serialize as their empty defaults.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledDocument {
    pub meta: Meta,
    pub dualgamelog: TeamRows,
    pub efficiencystats: TeamTable,
    pub headtohead: Vec<Value>,
    pub injuryreport: InjuryReport,
    pub matchupstats: TeamTable,
    pub moneylineanalysis: RangeAggregate,
    pub moneylinemovement: MovementSeries,
    pub overunderanalysis: RangeAggregate,
    pub overunderlinemovement: MovementSeries,
    pub overview: Map<String, Value>,
    pub pointspreadanalysis: RangeAggregate,
    pub pointspreadlinemovement: MovementSeries,
    pub powerratings: TeamTable,
    pub similargamesanalysis: Vec<Value>,
    pub situationaltrends: TeamRows,
    pub statsplits: TeamRows,
    pub travelanalysis: Map<String, Value>,
}
