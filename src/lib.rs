pub mod coerce;
pub mod compile;
pub mod locate;
pub mod mappers;
pub mod range;
pub mod schema;
pub mod series;

pub use compile::{CompileError, Conversion, convert};
pub use schema::{CompiledDocument, Diagnostic, TeamContext};
