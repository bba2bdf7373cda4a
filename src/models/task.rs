//! Task (operation) model.
//!
//! A task is the smallest schedulable unit of work. It belongs to exactly
//! one job, runs on exactly one machine and has a fixed duration. Start and
//! end times stay empty until a solver assigns them.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2

use serde::{Deserialize, Serialize};

/// A single processing step of a job.
///
/// # Time Representation
/// Durations and times are integers in an abstract time unit relative to
/// the scheduling epoch (t=0). The dashboard interprets one unit as an hour
/// by default; see [`crate::report::TimeUnit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier, unique within its job.
    pub id: usize,
    /// Human-readable name (e.g. "Heating").
    #[serde(default)]
    pub name: String,
    /// Machine that processes this task.
    pub machine: String,
    /// Processing time. Must be positive.
    pub duration: i64,
    /// Assigned start time. `None` until solved.
    #[serde(default)]
    pub start: Option<i64>,
    /// Assigned end time. `None` until solved.
    #[serde(default)]
    pub end: Option<i64>,
}

impl Task {
    /// Creates an unscheduled task.
    pub fn new(id: usize, machine: impl Into<String>, duration: i64) -> Self {
        Self {
            id,
            name: String::new(),
            machine: machine.into(),
            duration,
            start: None,
            end: None,
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name shown in charts, falling back to the numeric id.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }

    /// Records the solver's assignment.
    pub fn assign(&mut self, start: i64, end: i64) {
        self.start = Some(start);
        self.end = Some(end);
    }

    /// Clears a previous assignment.
    pub fn reset(&mut self) {
        self.start = None;
        self.end = None;
    }

    /// Whether start and end have been assigned.
    pub fn is_scheduled(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}
