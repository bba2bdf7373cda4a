//! Additional scheduling constraints.
//!
//! The job structure already implies intra-job precedence and the machine
//! assignment implies no-overlap. The constraints here are extra rules a
//! user may add on top, linking tasks of different jobs.
//!
//! # Reference
//! Brucker (2007), "Scheduling Algorithms", Ch. 2

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a task by position: the job's index in the job list and
/// the task's index within that job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRef {
    /// Job position.
    pub job: usize,
    /// Task position within the job.
    pub task: usize,
}

impl TaskRef {
    /// Creates a task reference.
    pub fn new(job: usize, task: usize) -> Self {
        Self { job, task }
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job({}, {})", self.job, self.task)
    }
}

/// A user-defined scheduling constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Task `after` cannot start until task `before` finishes.
    ///
    /// # Reference
    /// Pinedo (2016), "Scheduling", precedence constraints (Ch. 2.1)
    Precedence { before: TaskRef, after: TaskRef },
}

impl Constraint {
    /// Creates a precedence constraint.
    pub fn precedence(before: TaskRef, after: TaskRef) -> Self {
        Self::Precedence { before, after }
    }

    /// Task references mentioned by this constraint.
    pub fn task_refs(&self) -> [TaskRef; 2] {
        match self {
            Self::Precedence { before, after } => [*before, *after],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_refs() {
        let c = Constraint::precedence(TaskRef::new(0, 2), TaskRef::new(1, 0));
        assert_eq!(c.task_refs(), [TaskRef::new(0, 2), TaskRef::new(1, 0)]);
        assert_eq!(TaskRef::new(0, 2).to_string(), "job(0, 2)");
    }

    #[test]
    fn test_constraint_json_shape() {
        let json = r#"{"type":"precedence","before":{"job":0,"task":1},"after":{"job":1,"task":0}}"#;
        let c: Constraint = serde_json::from_str(json).unwrap();
        assert_eq!(
            c,
            Constraint::precedence(TaskRef::new(0, 1), TaskRef::new(1, 0))
        );
    }
}
