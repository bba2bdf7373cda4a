//! User-facing problem definition.
//!
//! The dashboard collects a task catalogue (unique name, machine, duration)
//! and a list of jobs, each naming catalogue tasks in processing order.
//! [`ProblemDefinition::into_jobs`] resolves those names into [`Job`]s for
//! the scheduler. [`generate`] builds seeded random instances for demos and
//! tests.

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::models::{Constraint, Job, Task};
use crate::validation::{ValidationError, ValidationErrorKind};
use crate::{Error, Result};

/// A catalogue task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Unique name, referenced by jobs.
    pub name: String,
    pub machine: String,
    pub duration: i64,
}

/// A job referencing catalogue tasks by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    /// Task names in processing order.
    pub tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<i64>,
}

/// A complete scheduling request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDefinition {
    /// Wall-clock origin of the schedule. `None` = next full hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDateTime>,
    pub tasks: Vec<TaskDefinition>,
    pub jobs: Vec<JobDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl ProblemDefinition {
    /// Reads a definition from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading problem definition");
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Writes the definition as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Wall-clock origin, defaulting to the next full hour.
    pub fn origin(&self) -> NaiveDateTime {
        self.start.unwrap_or_else(default_start)
    }

    /// Resolves jobs against the task catalogue.
    ///
    /// Each job receives its own copy of the referenced tasks; a task's id is
    /// its catalogue index. Duplicate catalogue names and unknown task names
    /// are reported together.
    pub fn into_jobs(self) -> Result<Vec<Job>> {
        let mut errors = Vec::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();

        for (idx, task) in self.tasks.iter().enumerate() {
            if by_name.insert(task.name.as_str(), idx).is_some() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate task name '{}'", task.name),
                ));
            }
        }

        let mut jobs = Vec::with_capacity(self.jobs.len());
        for (j, def) in self.jobs.iter().enumerate() {
            let mut tasks = Vec::with_capacity(def.tasks.len());
            for name in &def.tasks {
                match by_name.get(name.as_str()) {
                    Some(&idx) => {
                        let entry = &self.tasks[idx];
                        tasks.push(
                            Task::new(idx, entry.machine.clone(), entry.duration)
                                .with_name(entry.name.clone()),
                        );
                    }
                    None => errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidTaskReference,
                        format!("Job '{}' references unknown task '{}'", def.name, name),
                    )),
                }
            }

            let mut job = Job::new(j, tasks).with_name(def.name.clone());
            job.release_time = def.release;
            job.deadline = def.deadline;
            jobs.push(job);
        }

        if errors.is_empty() {
            Ok(jobs)
        } else {
            Err(Error::Validation(errors))
        }
    }
}

/// The next full hour in local time.
pub fn default_start() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
        + Duration::hours(1)
}

/// Shape of a generated instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateParams {
    pub jobs: usize,
    pub tasks_per_job: usize,
    /// Durations are drawn from `1..=max_duration`.
    pub max_duration: i64,
    pub machines: Vec<String>,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            jobs: 3,
            tasks_per_job: 3,
            max_duration: 5,
            machines: crate::config::default_machines(),
        }
    }
}

/// Builds a random job-shop instance. The same seed yields the same instance.
///
/// Every job gets its own catalogue tasks. Within a job, machines follow a
/// random permutation, so a job visits each machine at most once while
/// `tasks_per_job <= machines.len()`.
pub fn generate(params: &GenerateParams, seed: u64) -> ProblemDefinition {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut problem = ProblemDefinition::default();
    if params.machines.is_empty() {
        return problem;
    }
    let max_duration = params.max_duration.max(1);

    for j in 0..params.jobs {
        let job_name = format!("Job {}", j + 1);
        let mut order: Vec<usize> = (0..params.machines.len()).collect();
        order.shuffle(&mut rng);

        let mut names = Vec::with_capacity(params.tasks_per_job);
        for t in 0..params.tasks_per_job {
            let name = format!("{job_name} / Step {}", t + 1);
            problem.tasks.push(TaskDefinition {
                name: name.clone(),
                machine: params.machines[order[t % order.len()]].clone(),
                duration: rng.random_range(1..=max_duration),
            });
            names.push(name);
        }

        problem.jobs.push(JobDefinition {
            name: job_name,
            tasks: names,
            release: None,
            deadline: None,
        });
    }

    tracing::debug!(
        seed,
        jobs = problem.jobs.len(),
        tasks = problem.tasks.len(),
        "Generated instance"
    );
    problem
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, machine: &str, duration: i64) -> TaskDefinition {
        TaskDefinition {
            name: name.into(),
            machine: machine.into(),
            duration,
        }
    }

    fn job(name: &str, tasks: &[&str]) -> JobDefinition {
        JobDefinition {
            name: name.into(),
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
            release: None,
            deadline: None,
        }
    }

    fn plant() -> ProblemDefinition {
        ProblemDefinition {
            start: None,
            tasks: vec![
                task("Heating", "E-101", 2),
                task("Cooling", "T-301", 1),
                task("Mixing", "R-201", 3),
            ],
            jobs: vec![
                job("HDPE", &["Heating", "Mixing", "Cooling"]),
                job("PVC", &["Mixing", "Heating"]),
            ],
            constraints: vec![],
        }
    }

    #[test]
    fn test_into_jobs() {
        let jobs = plant().into_jobs().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "HDPE");
        let ids: Vec<usize> = jobs[0].tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 2, 1]);
        assert_eq!(jobs[1].id, 1);
        assert_eq!(jobs[1].tasks[0].machine, "R-201");
        assert_eq!(jobs[1].tasks[0].duration, 3);
        assert_eq!(jobs[1].tasks[1].name, "Heating");
        assert!(jobs.iter().all(|j| !j.is_scheduled()));
    }

    #[test]
    fn test_into_jobs_time_window() {
        let mut problem = plant();
        problem.jobs[0].release = Some(2);
        problem.jobs[0].deadline = Some(20);
        let jobs = problem.into_jobs().unwrap();
        assert_eq!(jobs[0].release_time, Some(2));
        assert_eq!(jobs[0].deadline, Some(20));
    }

    #[test]
    fn test_unknown_task_name() {
        let mut problem = plant();
        problem.jobs[1].tasks.push("Drying".into());
        match problem.into_jobs() {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].kind, ValidationErrorKind::InvalidTaskReference);
                assert!(errors[0].message.contains("Drying"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_catalogue_name() {
        let mut problem = plant();
        problem.tasks.push(task("Heating", "R-201", 1));
        let Err(Error::Validation(errors)) = problem.into_jobs() else {
            panic!("expected validation error");
        };
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "start": "2026-10-16T09:00:00",
            "tasks": [{"name": "Heating", "machine": "E-101", "duration": 2}],
            "jobs": [{"name": "HDPE", "tasks": ["Heating"], "deadline": 10}]
        }"#;
        let problem: ProblemDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(problem.jobs[0].deadline, Some(10));
        assert!(problem.constraints.is_empty());
        assert_eq!(problem.origin().to_string(), "2026-10-16 09:00:00");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problem.json");
        plant().save(&path).unwrap();
        assert_eq!(ProblemDefinition::load(&path).unwrap(), plant());
    }

    #[test]
    fn test_default_start_is_full_hour() {
        let start = default_start();
        assert_eq!(start.minute(), 0);
        assert_eq!(start.second(), 0);
        assert!(start > Local::now().naive_local());
    }

    #[test]
    fn test_generate_deterministic() {
        let params = GenerateParams::default();
        assert_eq!(generate(&params, 7), generate(&params, 7));
        assert_ne!(generate(&params, 7), generate(&params, 8));
    }

    #[test]
    fn test_generate_shape() {
        let params = GenerateParams {
            jobs: 4,
            tasks_per_job: 3,
            max_duration: 5,
            machines: vec!["A".into(), "B".into(), "C".into()],
        };
        let problem = generate(&params, 42);
        assert_eq!(problem.jobs.len(), 4);
        assert_eq!(problem.tasks.len(), 12);
        assert!(problem.tasks.iter().all(|t| (1..=5).contains(&t.duration)));

        for job in problem.into_jobs().unwrap() {
            assert_eq!(job.machines().len(), 3, "each job visits every machine once");
        }
    }

    #[test]
    fn test_generate_without_machines() {
        let params = GenerateParams {
            machines: vec![],
            ..GenerateParams::default()
        };
        let problem = generate(&params, 1);
        assert!(problem.jobs.is_empty());
        assert!(problem.tasks.is_empty());
    }
}
