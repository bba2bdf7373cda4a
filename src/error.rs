use thiserror::Error;

use crate::cp::SolveStatus;
use crate::models::Violation;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {}", join_messages(.0.iter().map(|e| e.message.as_str())))]
    Validation(Vec<ValidationError>),

    #[error("No feasible schedule exists for the given jobs and constraints")]
    Infeasible,

    #[error("Optimization not successful with status {0}")]
    SolverUnsuccessful(SolveStatus),

    #[error("Model not fitted yet")]
    NotFitted,

    #[error("Schedule time {0} is outside the representable calendar range")]
    TimeOutOfRange(i64),

    #[error("Solver returned an invalid schedule: {}", join_messages(.0.iter().map(|v| v.message.as_str())))]
    InvalidSchedule(Vec<Violation>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_messages<'a>(messages: impl Iterator<Item = &'a str>) -> String {
    messages.collect::<Vec<_>>().join("; ")
}
