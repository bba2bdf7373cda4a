//! Solver interface: configuration, status and solution types.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::{CpModel, IntervalId};

/// A backend that solves a [`CpModel`].
///
/// Implementations must never panic on well-formed models; any failure is
/// reported through [`CpSolution::status`].
pub trait CpSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

/// Search limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Wall-clock budget. `None` = unlimited.
    pub time_limit: Option<Duration>,
    /// Maximum number of search steps (propagate-and-decide rounds).
    /// `None` = unlimited.
    pub node_limit: Option<u64>,
}

impl SolverConfig {
    /// Sets the time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Some(Duration::from_secs(10)),
            node_limit: None,
        }
    }
}

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Best possible objective, proven by the solver.
    Optimal,
    /// A solution was found but not proven optimal.
    Feasible,
    /// Proven that no solution exists.
    Infeasible,
    /// Limits reached before any solution was found.
    Unknown,
    /// The model is malformed for this backend.
    ModelInvalid,
}

impl SolveStatus {
    /// Whether a usable assignment is available.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Optimal => "OPTIMAL",
            Self::Feasible => "FEASIBLE",
            Self::Infeasible => "INFEASIBLE",
            Self::Unknown => "UNKNOWN",
            Self::ModelInvalid => "MODEL_INVALID",
        };
        f.write_str(s)
    }
}

/// Search statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Solutions found, each improving on the previous one.
    pub solutions: u64,
    /// Elapsed wall-clock time.
    pub wall_time: Duration,
}

/// Assigned value of one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSolution {
    pub start: i64,
    pub end: i64,
}

/// Result of [`CpSolver::solve`].
#[derive(Debug, Clone)]
pub struct CpSolution {
    pub status: SolveStatus,
    /// One entry per model interval when a solution was found, else empty.
    pub intervals: Vec<IntervalSolution>,
    /// Objective value of the returned assignment.
    pub objective_value: Option<i64>,
    pub stats: SolveStats,
}

impl CpSolution {
    /// A solution carrying no assignment.
    pub fn without_solution(status: SolveStatus, stats: SolveStats) -> Self {
        Self {
            status,
            intervals: Vec::new(),
            objective_value: None,
            stats,
        }
    }

    /// Whether an assignment is available.
    pub fn is_solution_found(&self) -> bool {
        self.status.is_success() && !self.intervals.is_empty()
    }

    /// Assigned value of an interval.
    pub fn value(&self, id: IntervalId) -> Option<IntervalSolution> {
        self.intervals.get(id.0).copied()
    }

    pub fn start(&self, id: IntervalId) -> Option<i64> {
        self.value(id).map(|v| v.start)
    }

    pub fn end(&self, id: IntervalId) -> Option<i64> {
        self.value(id).map(|v| v.end)
    }
}
