use serde_json::Value;
use thiserror::Error;

use crate::mappers;
use crate::schema::{CompiledDocument, Diagnostic, Meta, TeamContext};
use crate::series::ValueKind;

pub const SCHEMA_VERSION: &str = "v1";

/// Fatal conversion errors. Everything else degrades into defaults plus a
/// [`Diagnostic`] entry and never aborts the conversion.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("input root must be a JSON object, got {got}")]
    RootNotObject { got: &'static str },
    #[error("team context field {field} is missing or empty")]
    MissingTeam { field: &'static str },
}

/// A finished conversion: the canonical document plus every warning recorded
/// along the way, in order.
#[derive(Debug)]
pub struct Conversion {
    pub document: CompiledDocument,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile a raw vendor matchup document into the canonical v1 schema.
///
/// Pure and re-entrant: the input is never mutated, all state lives in the
/// returned [`Conversion`]. Every canonical top-level key is present in the
/// output regardless of what the source provided; sections that could not be
/// located or read come back as their documented empty defaults with a
/// matching diagnostic.
pub fn convert(document: &Value, context: &TeamContext) -> Result<Conversion, CompileError> {
    if !document.is_object() {
        return Err(CompileError::RootNotObject {
            got: value_kind(document),
        });
    }
    if context.home_abbr.trim().is_empty() {
        return Err(CompileError::MissingTeam { field: "home_abbr" });
    }
    if context.away_abbr.trim().is_empty() {
        return Err(CompileError::MissingTeam { field: "away_abbr" });
    }

    let mut diagnostics = Vec::new();
    // Mapper order is fixed; struct expression fields evaluate in writing
    // order, which keeps the diagnostics sequence stable across runs.
    let compiled = CompiledDocument {
        meta: Meta {
            home: context.home_abbr.clone(),
            away: context.away_abbr.clone(),
            seasonyear: context.season_year,
            schemaversion: SCHEMA_VERSION,
        },
        dualgamelog: mappers::map_team_rows(
            document,
            context,
            "Dual Game Log",
            "dualgamelog",
            &mut diagnostics,
        ),
        efficiencystats: mappers::map_team_table(
            document,
            context,
            "Efficiency Stats",
            "efficiencystats",
            &mut diagnostics,
        ),
        headtohead: mappers::map_rows(
            document,
            context,
            "Head To Head",
            "headtohead",
            &mut diagnostics,
        ),
        injuryreport: mappers::map_injuries(document, context, &mut diagnostics),
        matchupstats: mappers::map_team_table(
            document,
            context,
            "Matchup Stats",
            "matchupstats",
            &mut diagnostics,
        ),
        moneylineanalysis: mappers::map_range(
            document,
            "Money Line Analysis",
            "moneylineanalysis",
            &mut diagnostics,
        ),
        moneylinemovement: mappers::map_movement(
            document,
            context,
            "Money Line History",
            "moneylinemovement",
            ValueKind::Moneyline,
            &mut diagnostics,
        ),
        overunderanalysis: mappers::map_range(
            document,
            "Over/Under Analysis",
            "overunderanalysis",
            &mut diagnostics,
        ),
        overunderlinemovement: mappers::map_movement(
            document,
            context,
            "Over/Under History",
            "overunderlinemovement",
            ValueKind::Line,
            &mut diagnostics,
        ),
        overview: mappers::map_object(
            document,
            context,
            "Game Overview",
            "overview",
            &mut diagnostics,
        ),
        pointspreadanalysis: mappers::map_range(
            document,
            "Point Spread Analysis",
            "pointspreadanalysis",
            &mut diagnostics,
        ),
        pointspreadlinemovement: mappers::map_movement(
            document,
            context,
            "Point Spread History",
            "pointspreadlinemovement",
            ValueKind::Line,
            &mut diagnostics,
        ),
        powerratings: mappers::map_team_table(
            document,
            context,
            "Power Ratings",
            "powerratings",
            &mut diagnostics,
        ),
        similargamesanalysis: mappers::map_rows(
            document,
            context,
            "Similar Games Analysis",
            "similargamesanalysis",
            &mut diagnostics,
        ),
        situationaltrends: mappers::map_team_rows(
            document,
            context,
            "Situational Trends",
            "situationaltrends",
            &mut diagnostics,
        ),
        statsplits: mappers::map_team_rows(
            document,
            context,
            "Stat Splits",
            "statsplits",
            &mut diagnostics,
        ),
        travelanalysis: mappers::map_object(
            document,
            context,
            "Travel Analysis",
            "travelanalysis",
            &mut diagnostics,
        ),
    };

    Ok(Conversion {
        document: compiled,
        diagnostics,
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
