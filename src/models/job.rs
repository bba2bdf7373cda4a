//! Job model.
//!
//! A job is a named, ordered sequence of tasks. Task `i + 1` of a job may
//! not start before task `i` has finished.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use serde::{Deserialize, Serialize};

use super::Task;

/// A job to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: usize,
    /// Human-readable name (e.g. "HDPE").
    #[serde(default)]
    pub name: String,
    /// Tasks in processing order.
    pub tasks: Vec<Task>,
    /// Earliest start time. `None` = available at t=0.
    #[serde(default)]
    pub release_time: Option<i64>,
    /// Latest completion time (hard). `None` = no deadline.
    #[serde(default)]
    pub deadline: Option<i64>,
}

impl Job {
    /// Creates a job with the given tasks.
    pub fn new(id: usize, tasks: Vec<Task>) -> Self {
        Self {
            id,
            name: String::new(),
            tasks,
            release_time: None,
            deadline: None,
        }
    }

    /// Sets the job name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a task.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Sets the release time (earliest start).
    pub fn with_release_time(mut self, release: i64) -> Self {
        self.release_time = Some(release);
        self
    }

    /// Sets the deadline (latest completion).
    pub fn with_deadline(mut self, deadline: i64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Name shown in charts, falling back to `Job #<id>`.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Job #{}", self.id)
        } else {
            self.name.clone()
        }
    }

    /// Job horizon: the job's duration if all its tasks ran back to back.
    /// `None` if the sum overflows.
    pub fn horizon(&self) -> Option<i64> {
        self.tasks
            .iter()
            .try_fold(0i64, |acc, t| acc.checked_add(t.duration))
    }

    /// Distinct machines required by this job, sorted.
    pub fn machines(&self) -> Vec<&str> {
        let mut machines: Vec<&str> = self.tasks.iter().map(|t| t.machine.as_str()).collect();
        machines.sort_unstable();
        machines.dedup();
        machines
    }

    /// Whether every task has been assigned a start and end.
    pub fn is_scheduled(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(Task::is_scheduled)
    }

    /// Completion time (end of the last task), if scheduled.
    pub fn completion_time(&self) -> Option<i64> {
        self.tasks.last().and_then(|t| t.end)
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}
