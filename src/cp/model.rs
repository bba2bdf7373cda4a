//! Constraint model for disjunctive scheduling.
//!
//! A [`CpModel`] holds fixed-duration interval variables, the constraints
//! linking them and an objective. It is the narrow interface between the
//! job-shop translation layer and any [`super::CpSolver`] backend.
//!
//! # Reference
//! Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

use std::fmt;

/// Index of an interval variable inside its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(pub usize);

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An interval variable with a fixed duration.
///
/// The solver chooses `start` in `[start_min, start_max]`; the end is
/// `start + duration` and must not exceed `end_max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalVar {
    /// Variable name (for logs and debugging).
    pub name: String,
    /// Earliest start.
    pub start_min: i64,
    /// Latest start.
    pub start_max: i64,
    /// Fixed duration.
    pub duration: i64,
    /// Latest end.
    pub end_max: i64,
}

impl IntervalVar {
    /// Creates an interval variable.
    pub fn new(
        name: impl Into<String>,
        start_min: i64,
        start_max: i64,
        duration: i64,
        end_max: i64,
    ) -> Self {
        Self {
            name: name.into(),
            start_min,
            start_max,
            duration,
            end_max,
        }
    }

    /// Latest start that still respects both `start_max` and `end_max`.
    pub fn latest_start(&self) -> i64 {
        self.start_max.min(self.end_max - self.duration)
    }
}

/// A constraint over interval variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpConstraint {
    /// The listed intervals are pairwise disjoint in time.
    NoOverlap { intervals: Vec<IntervalId> },
    /// `after` starts no earlier than `before` ends.
    Precedence { before: IntervalId, after: IntervalId },
}

/// Optimization goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Objective {
    /// Minimize the latest end over all intervals (makespan).
    #[default]
    MinimizeMaxEnd,
    /// Any feasible assignment.
    Satisfy,
}

/// A constraint model.
#[derive(Debug, Clone)]
pub struct CpModel {
    name: String,
    horizon: i64,
    intervals: Vec<IntervalVar>,
    constraints: Vec<CpConstraint>,
    objective: Objective,
}

impl CpModel {
    /// Creates an empty model with the given planning horizon.
    pub fn new(name: impl Into<String>, horizon: i64) -> Self {
        Self {
            name: name.into(),
            horizon,
            intervals: Vec::new(),
            constraints: Vec::new(),
            objective: Objective::default(),
        }
    }

    /// Adds an interval variable and returns its id.
    pub fn add_interval(&mut self, interval: IntervalVar) -> IntervalId {
        self.intervals.push(interval);
        IntervalId(self.intervals.len() - 1)
    }

    /// Requires `after` to start no earlier than `before` ends.
    pub fn add_precedence(&mut self, before: IntervalId, after: IntervalId) {
        self.constraints
            .push(CpConstraint::Precedence { before, after });
    }

    /// Requires the given intervals to be pairwise disjoint.
    pub fn add_no_overlap(&mut self, intervals: Vec<IntervalId>) {
        self.constraints.push(CpConstraint::NoOverlap { intervals });
    }

    /// Sets the objective.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn intervals(&self) -> &[IntervalVar] {
        &self.intervals
    }

    pub fn interval(&self, id: IntervalId) -> Option<&IntervalVar> {
        self.intervals.get(id.0)
    }

    pub fn constraints(&self) -> &[CpConstraint] {
        &self.constraints
    }

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_building() {
        let mut model = CpModel::new("test", 100);
        let a = model.add_interval(IntervalVar::new("a", 0, 90, 10, 100));
        let b = model.add_interval(IntervalVar::new("b", 0, 95, 5, 100));
        model.add_precedence(a, b);
        model.add_no_overlap(vec![a, b]);

        assert_eq!(model.name(), "test");
        assert_eq!(model.horizon(), 100);
        assert_eq!(model.interval_count(), 2);
        assert_eq!(model.constraint_count(), 2);
        assert_eq!(model.interval(b).unwrap().name, "b");
        assert_eq!(model.objective(), Objective::MinimizeMaxEnd);
    }

    #[test]
    fn test_latest_start() {
        let iv = IntervalVar::new("x", 0, 50, 10, 40);
        assert_eq!(iv.latest_start(), 30);
        let iv = IntervalVar::new("y", 0, 20, 10, 40);
        assert_eq!(iv.latest_start(), 20);
    }
}
