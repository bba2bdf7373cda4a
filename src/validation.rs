//! Input validation and schedule verification.
//!
//! [`validate_input`] checks the structural integrity of jobs, tasks and
//! constraints before any solver call. Detects:
//! - Empty input and empty jobs
//! - Non-positive durations
//! - Duplicate IDs
//! - Unknown machine references
//! - Invalid release/deadline windows
//! - Time values or planning horizons beyond [`MAX_TIME`]
//! - Constraint references to tasks that do not exist
//!
//! [`validate_limits`] applies the size limits of a deployment (number of
//! jobs, longest duration) on top of that.
//!
//! Conflicting but well-formed constraints (precedence cycles, deadlines
//! tighter than a job's work) are not validation errors: they are left to
//! the solver, which reports them as infeasible.
//!
//! [`verify_schedule`] checks a solved schedule against the job-shop
//! invariants: exact durations, no machine overlap, job order, extra
//! precedences, release times and deadlines.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::models::{Constraint, Job, Machine, Schedule, TaskRef, Violation};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Largest accepted duration, release time or deadline, and the largest
/// planning horizon (latest release plus total work).
pub const MAX_TIME: i64 = 1_000_000_000;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// No jobs were given.
    NoJobs,
    /// A job has no tasks.
    EmptyJob,
    /// A task duration is zero or negative.
    NonPositiveDuration,
    /// Two entities share the same ID.
    DuplicateId,
    /// A task references a machine that doesn't exist.
    UnknownMachine,
    /// Negative release time or deadline before release.
    InvalidTimeWindow,
    /// A constraint or job references a task that doesn't exist.
    InvalidTaskReference,
    /// A time value or the planning horizon exceeds [`MAX_TIME`].
    ValueOutOfRange,
    /// The input exceeds a configured size limit.
    LimitExceeded,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates the input of a job-shop problem.
///
/// Checks:
/// 1. At least one job
/// 2. No duplicate job IDs
/// 3. Every job has at least one task, with unique task IDs
/// 4. All durations are positive
/// 5. All machine references point to known machines (when `machines` is given)
/// 6. Release times are non-negative and deadlines are not before release
/// 7. Durations, release times, deadlines and the planning horizon are at
///    most [`MAX_TIME`]
/// 8. Constraint task references exist and are not self-referencing
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    jobs: &[Job],
    constraints: &[Constraint],
    machines: Option<&[Machine]>,
) -> ValidationResult {
    let mut errors = Vec::new();

    if jobs.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoJobs,
            "At least one job is required",
        ));
    }

    let known_machines: Option<HashSet<&str>> =
        machines.map(|ms| ms.iter().map(|m| m.id.as_str()).collect());

    let mut job_ids = HashSet::new();
    for job in jobs {
        let job_name = job.display_name();

        if !job_ids.insert(job.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }

        if job.tasks.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyJob,
                format!("Job '{job_name}' has no tasks"),
            ));
        }

        let mut task_ids = HashSet::new();
        for task in &job.tasks {
            if !task_ids.insert(task.id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Job '{job_name}' contains task {} more than once", task.id),
                ));
            }

            if task.duration <= 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NonPositiveDuration,
                    format!(
                        "Task '{}' of job '{job_name}' has non-positive duration {}",
                        task.display_name(),
                        task.duration
                    ),
                ));
            } else if task.duration > MAX_TIME {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ValueOutOfRange,
                    format!(
                        "Task '{}' of job '{job_name}' has duration {} above {MAX_TIME}",
                        task.display_name(),
                        task.duration
                    ),
                ));
            }

            if let Some(known) = &known_machines {
                if !known.contains(task.machine.as_str()) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownMachine,
                        format!(
                            "Task '{}' of job '{job_name}' references unknown machine '{}'",
                            task.display_name(),
                            task.machine
                        ),
                    ));
                }
            }
        }

        let release = job.release_time.unwrap_or(0);
        if release < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeWindow,
                format!("Job '{job_name}' has negative release time {release}"),
            ));
        }
        if release > MAX_TIME {
            errors.push(ValidationError::new(
                ValidationErrorKind::ValueOutOfRange,
                format!("Job '{job_name}' has release time {release} above {MAX_TIME}"),
            ));
        }
        if let Some(deadline) = job.deadline {
            if deadline < release {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTimeWindow,
                    format!("Job '{job_name}' has deadline {deadline} before release {release}"),
                ));
            }
            if deadline > MAX_TIME {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ValueOutOfRange,
                    format!("Job '{job_name}' has deadline {deadline} above {MAX_TIME}"),
                ));
            }
        }
    }

    if !planning_horizon(jobs).is_some_and(|h| h <= MAX_TIME) {
        errors.push(ValidationError::new(
            ValidationErrorKind::ValueOutOfRange,
            format!("Latest release plus total work exceeds {MAX_TIME}"),
        ));
    }

    for constraint in constraints {
        let [before, after] = constraint.task_refs();
        for task_ref in [before, after] {
            if !task_exists(jobs, task_ref) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTaskReference,
                    format!("Constraint references unknown task {task_ref}"),
                ));
            }
        }
        if before == after {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTaskReference,
                format!("Constraint links task {before} to itself"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Latest release plus the work of every job, `None` on overflow.
fn planning_horizon(jobs: &[Job]) -> Option<i64> {
    let latest_release = jobs
        .iter()
        .filter_map(|j| j.release_time)
        .max()
        .unwrap_or(0)
        .max(0);
    jobs.iter()
        .try_fold(latest_release, |acc, job| acc.checked_add(job.horizon()?))
}

/// Checks deployment limits: at most `max_jobs` jobs and no task longer
/// than `max_duration`.
pub fn validate_limits(jobs: &[Job], max_jobs: usize, max_duration: i64) -> ValidationResult {
    let mut errors = Vec::new();

    if jobs.len() > max_jobs {
        errors.push(ValidationError::new(
            ValidationErrorKind::LimitExceeded,
            format!("{} jobs given, at most {max_jobs} allowed", jobs.len()),
        ));
    }

    for job in jobs {
        for task in job.tasks.iter().filter(|t| t.duration > max_duration) {
            errors.push(ValidationError::new(
                ValidationErrorKind::LimitExceeded,
                format!(
                    "Task '{}' of job '{}' has duration {}, at most {max_duration} allowed",
                    task.display_name(),
                    job.display_name(),
                    task.duration
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn task_exists(jobs: &[Job], task_ref: TaskRef) -> bool {
    jobs.get(task_ref.job)
        .is_some_and(|job| task_ref.task < job.tasks.len())
}

/// Verifies a solved schedule against the jobs it was computed for.
///
/// Returns every violation found; an empty vector means the schedule
/// satisfies all job-shop invariants.
pub fn verify_schedule(jobs: &[Job], constraints: &[Constraint], schedule: &Schedule) -> Vec<Violation> {
    let mut violations = Vec::new();
    let by_ref: HashMap<TaskRef, &crate::models::Assignment> = schedule
        .assignments
        .iter()
        .map(|a| (a.task_ref(), a))
        .collect();

    for (j, job) in jobs.iter().enumerate() {
        let mut previous_end: Option<i64> = None;
        for (t, task) in job.tasks.iter().enumerate() {
            let task_ref = TaskRef::new(j, t);
            let Some(a) = by_ref.get(&task_ref) else {
                violations.push(Violation::unscheduled(
                    task_ref.to_string(),
                    format!("Task {task_ref} has no assignment"),
                ));
                previous_end = None;
                continue;
            };

            if a.end != a.start + task.duration {
                violations.push(Violation::duration_mismatch(
                    task_ref.to_string(),
                    format!(
                        "Task {task_ref} runs [{}, {}) but its duration is {}",
                        a.start, a.end, task.duration
                    ),
                ));
            }

            if let Some(prev_end) = previous_end {
                if a.start < prev_end {
                    violations.push(Violation::precedence_violation(
                        task_ref.to_string(),
                        format!("Task {task_ref} starts at {} before its predecessor ends at {prev_end}", a.start),
                    ));
                }
            }
            previous_end = Some(a.end);

            if a.start < job.release_time.unwrap_or(0) {
                violations.push(Violation::release_violation(
                    task_ref.to_string(),
                    format!("Task {task_ref} starts at {} before job release", a.start),
                ));
            }
            if let Some(deadline) = job.deadline {
                if a.end > deadline {
                    violations.push(Violation::deadline_miss(
                        task_ref.to_string(),
                        format!("Task {task_ref} ends at {} after deadline {deadline}", a.end),
                    ));
                }
            }
        }
    }

    for constraint in constraints {
        match constraint {
            Constraint::Precedence { before, after } => {
                if let (Some(b), Some(a)) = (by_ref.get(before), by_ref.get(after)) {
                    if a.start < b.end {
                        violations.push(Violation::precedence_violation(
                            after.to_string(),
                            format!("Task {after} starts at {} before task {before} ends at {}", a.start, b.end),
                        ));
                    }
                }
            }
        }
    }

    let mut machines: Vec<&str> = schedule.assignments.iter().map(|a| a.machine.as_str()).collect();
    machines.sort_unstable();
    machines.dedup();
    for machine in machines {
        let on_machine = schedule.assignments_for_machine(machine);
        for pair in on_machine.windows(2) {
            if pair[0].overlaps(pair[1]) {
                violations.push(Violation::machine_overlap(
                    machine,
                    format!(
                        "Tasks {} and {} overlap on machine {machine}",
                        pair[0].task_ref(),
                        pair[1].task_ref()
                    ),
                ));
            }
        }
    }

    violations
}
