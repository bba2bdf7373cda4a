//! Schedule (solution) model.
//!
//! A schedule is a complete assignment of tasks to time slots on their
//! machines. It may carry constraint violations found by
//! [`crate::validation::verify_schedule`].
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::TaskRef;

/// A complete schedule (solution to a job-shop problem).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Task assignments (task → machine × time).
    pub assignments: Vec<Assignment>,
    /// Constraint violations detected in this schedule.
    pub violations: Vec<Violation>,
}

/// A task-machine-time assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Job position in the scheduler's job list.
    pub job: usize,
    /// Task position within the job.
    pub position: usize,
    /// Task identifier (as given by the user).
    pub task_id: usize,
    /// Machine the task runs on.
    pub machine: String,
    /// Start time.
    pub start: i64,
    /// End time.
    pub end: i64,
}

/// A constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity (task label or machine id).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Task completed after its job's deadline.
    DeadlineMiss,
    /// Task started before its job's release time.
    ReleaseViolation,
    /// Two tasks overlap on the same machine.
    MachineOverlap,
    /// Task started before its predecessor finished.
    PrecedenceViolation,
    /// Assigned interval does not match the task's duration.
    DurationMismatch,
    /// Task has no assignment.
    Unscheduled,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(
        job: usize,
        position: usize,
        task_id: usize,
        machine: impl Into<String>,
        start: i64,
        end: i64,
    ) -> Self {
        Self {
            job,
            position,
            task_id,
            machine: machine.into(),
            start,
            end,
        }
    }

    /// Position reference of the assigned task.
    #[inline]
    pub fn task_ref(&self) -> TaskRef {
        TaskRef::new(self.job, self.position)
    }

    /// Duration (end - start).
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether two assignments share any instant. Touching ends do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Assignment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl Violation {
    fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
        severity: i32,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
            severity,
        }
    }

    /// Creates a deadline miss violation.
    pub fn deadline_miss(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::DeadlineMiss, entity_id, message, 80)
    }

    /// Creates a release violation.
    pub fn release_violation(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::ReleaseViolation, entity_id, message, 80)
    }

    /// Creates a machine overlap violation.
    pub fn machine_overlap(machine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::MachineOverlap, machine, message, 90)
    }

    /// Creates a precedence violation.
    pub fn precedence_violation(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::PrecedenceViolation, entity_id, message, 95)
    }

    /// Creates a duration mismatch violation.
    pub fn duration_mismatch(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::DurationMismatch, entity_id, message, 95)
    }

    /// Creates an unscheduled-task violation.
    pub fn unscheduled(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::Unscheduled, entity_id, message, 100)
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the schedule has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Makespan: latest end time across all assignments.
    pub fn makespan(&self) -> i64 {
        self.assignments.iter().map(|a| a.end).max().unwrap_or(0)
    }

    /// Finds the assignment of a task.
    pub fn assignment_for(&self, task: TaskRef) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.task_ref() == task)
    }

    /// All assignments of a job, in task order.
    pub fn assignments_for_job(&self, job: usize) -> Vec<&Assignment> {
        let mut found: Vec<&Assignment> = self.assignments.iter().filter(|a| a.job == job).collect();
        found.sort_by_key(|a| a.position);
        found
    }

    /// All assignments on a machine, ordered by start time.
    pub fn assignments_for_machine(&self, machine: &str) -> Vec<&Assignment> {
        let mut found: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.machine == machine)
            .collect();
        found.sort_by_key(|a| (a.start, a.end));
        found
    }

    /// Machine utilization: busy time / horizon.
    ///
    /// Returns `None` if `horizon` is not positive.
    pub fn machine_utilization(&self, machine: &str, horizon: i64) -> Option<f64> {
        if horizon <= 0 {
            return None;
        }
        let busy: i64 = self
            .assignments_for_machine(machine)
            .iter()
            .map(|a| a.duration())
            .sum();
        Some(busy as f64 / horizon as f64)
    }

    /// Utilization of every machine that has assignments, over the makespan.
    pub fn all_utilizations(&self) -> HashMap<String, f64> {
        let horizon = self.makespan();
        if horizon <= 0 {
            return HashMap::new();
        }

        let mut busy: HashMap<String, i64> = HashMap::new();
        for a in &self.assignments {
            *busy.entry(a.machine.clone()).or_insert(0) += a.duration();
        }

        busy.into_iter()
            .map(|(id, b)| (id, b as f64 / horizon as f64))
            .collect()
    }

    /// Completion time of a job (latest end of its assignments).
    pub fn job_completion_time(&self, job: usize) -> Option<i64> {
        self.assignments
            .iter()
            .filter(|a| a.job == job)
            .map(|a| a.end)
            .max()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(Assignment::new(0, 0, 0, "M1", 0, 5));
        s.add_assignment(Assignment::new(0, 1, 1, "M2", 5, 9));
        s.add_assignment(Assignment::new(1, 0, 0, "M1", 5, 8));
        s
    }

    #[test]
    fn test_schedule_makespan() {
        assert_eq!(sample_schedule().makespan(), 9);
    }

    #[test]
    fn test_schedule_is_valid() {
        let s = sample_schedule();
        assert!(s.is_valid());

        let mut s2 = sample_schedule();
        s2.add_violation(Violation::deadline_miss("job(0, 1)", "Late by 2"));
        assert!(!s2.is_valid());
    }

    #[test]
    fn test_assignment_overlap() {
        let a = Assignment::new(0, 0, 0, "M1", 0, 5);
        let b = Assignment::new(1, 0, 0, "M1", 5, 8);
        let c = Assignment::new(2, 0, 0, "M1", 4, 6);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
        assert_eq!(c.duration(), 2);
    }

    #[test]
    fn test_assignment_lookup() {
        let s = sample_schedule();
        let a = s.assignment_for(TaskRef::new(0, 1)).unwrap();
        assert_eq!(a.machine, "M2");
        assert!(s.assignment_for(TaskRef::new(5, 0)).is_none());
    }

    #[test]
    fn test_assignments_for_job_and_machine() {
        let s = sample_schedule();
        assert_eq!(s.assignments_for_job(0).len(), 2);
        assert_eq!(s.assignments_for_job(1).len(), 1);

        let m1 = s.assignments_for_machine("M1");
        assert_eq!(m1.len(), 2);
        assert!(m1[0].start <= m1[1].start);
    }

    #[test]
    fn test_machine_utilization() {
        let s = sample_schedule();
        // M1: busy 5 + 3 = 8 over horizon 8
        let util = s.machine_utilization("M1", 8).unwrap();
        assert!((util - 1.0).abs() < 1e-10);
        assert!(s.machine_utilization("M1", 0).is_none());

        let all = s.all_utilizations();
        // M2: 4 / 9
        assert!((all["M2"] - 4.0 / 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_job_completion_time() {
        let s = sample_schedule();
        assert_eq!(s.job_completion_time(0), Some(9));
        assert_eq!(s.job_completion_time(1), Some(8));
        assert_eq!(s.job_completion_time(42), None);
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule::new();
        assert_eq!(s.makespan(), 0);
        assert!(s.is_valid());
        assert_eq!(s.assignment_count(), 0);
        assert!(s.all_utilizations().is_empty());
    }
}
