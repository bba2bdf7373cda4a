//! CP-based job-shop formulation.
//!
//! Translates jobs, tasks and machines into a [`CpModel`] and decodes the
//! solver's answer back into a [`Schedule`]:
//!
//! - one fixed-duration interval variable per task;
//! - a no-overlap constraint per machine;
//! - a precedence chain along each job's task order;
//! - user precedences between tasks of different jobs;
//! - makespan minimization.
//!
//! Solving goes through the [`CpSolver`] trait; [`PumpkinSolver`] is the
//! bundled backend.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod model;
mod pumpkin;
mod solver;

pub use model::{CpConstraint, CpModel, IntervalId, IntervalVar, Objective};
pub use pumpkin::PumpkinSolver;
pub use solver::{CpSolution, CpSolver, IntervalSolution, SolveStats, SolveStatus, SolverConfig};

use std::collections::BTreeMap;

use crate::models::{Assignment, Constraint, Job, Schedule, TaskRef};

/// Builds a CP model from job-shop domain objects.
///
/// # Example
/// ```
/// use shop_scheduler::cp::{PumpkinSolver, ScheduleCpBuilder, SolverConfig};
/// use shop_scheduler::models::{Job, Task};
///
/// let jobs = vec![
///     Job::new(0, vec![Task::new(0, "M1", 2), Task::new(1, "M2", 3)]),
///     Job::new(1, vec![Task::new(0, "M2", 1), Task::new(1, "M1", 2)]),
/// ];
/// let builder = ScheduleCpBuilder::new(&jobs);
/// let (schedule, solution) = builder.solve(&PumpkinSolver, &SolverConfig::default());
/// assert!(solution.is_solution_found());
/// assert_eq!(schedule.assignment_count(), 4);
/// ```
pub struct ScheduleCpBuilder<'a> {
    jobs: &'a [Job],
    constraints: Vec<Constraint>,
    offsets: Vec<usize>,
}

impl<'a> ScheduleCpBuilder<'a> {
    /// Creates a new CP builder.
    pub fn new(jobs: &'a [Job]) -> Self {
        let mut offsets = Vec::with_capacity(jobs.len());
        let mut next = 0;
        for job in jobs {
            offsets.push(next);
            next += job.tasks.len();
        }
        Self {
            jobs,
            constraints: Vec::new(),
            offsets,
        }
    }

    /// Adds user-defined constraints.
    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Planning horizon: latest release plus the sum of all durations.
    ///
    /// No makespan-optimal schedule ends later than this. `None` if the sum
    /// overflows.
    pub fn horizon(&self) -> Option<i64> {
        let latest_release = self
            .jobs
            .iter()
            .filter_map(|j| j.release_time)
            .max()
            .unwrap_or(0)
            .max(0);
        self.jobs
            .iter()
            .try_fold(latest_release, |acc, job| acc.checked_add(job.horizon()?))
    }

    /// Interval variable of a task, if the reference is in range.
    pub fn interval_id(&self, task: TaskRef) -> Option<IntervalId> {
        let job = self.jobs.get(task.job)?;
        if task.task >= job.tasks.len() {
            return None;
        }
        Some(IntervalId(self.offsets[task.job] + task.task))
    }

    /// Builds the CP model.
    ///
    /// # Errors
    /// [`SolveStatus::ModelInvalid`] when a time value overflows or a
    /// constraint references a task that does not exist.
    pub fn build(&self) -> Result<CpModel, SolveStatus> {
        let Some(horizon) = self.horizon() else {
            tracing::warn!("planning horizon overflows");
            return Err(SolveStatus::ModelInvalid);
        };
        let mut model = CpModel::new("job_shop", horizon);

        tracing::info!(
            jobs = self.jobs.len(),
            horizon,
            "Initializing model and defining variables..."
        );
        self.add_intervals(&mut model, horizon)?;

        tracing::info!("Adding no-overlap constraints...");
        self.add_no_overlap_constraints(&mut model);

        tracing::info!("Adding precedence constraints...");
        self.add_precedence_constraints(&mut model)?;

        tracing::info!("Defining optimization goal...");
        model.set_objective(Objective::MinimizeMaxEnd);

        tracing::debug!(
            intervals = model.interval_count(),
            constraints = model.constraint_count(),
            "model built"
        );
        Ok(model)
    }

    /// Builds the model, solves it and decodes the result.
    ///
    /// A model that cannot be built yields an empty schedule and a
    /// [`SolveStatus::ModelInvalid`] solution; the solver is not called.
    pub fn solve<S: CpSolver>(&self, solver: &S, config: &SolverConfig) -> (Schedule, CpSolution) {
        let model = match self.build() {
            Ok(model) => model,
            Err(status) => {
                return (
                    Schedule::new(),
                    CpSolution::without_solution(status, SolveStats::default()),
                )
            }
        };
        tracing::info!("Starting optimization...");
        let solution = solver.solve(&model, config);
        let schedule = self.decode_solution(&solution);
        (schedule, solution)
    }

    fn add_intervals(&self, model: &mut CpModel, horizon: i64) -> Result<(), SolveStatus> {
        for (j, job) in self.jobs.iter().enumerate() {
            let release = job.release_time.unwrap_or(0);
            let end_max = job.deadline.map_or(horizon, |d| d.min(horizon));

            for task in &job.tasks {
                let start_max = end_max
                    .checked_sub(task.duration)
                    .ok_or(SolveStatus::ModelInvalid)?;
                let interval = IntervalVar::new(
                    format!("interval_{j}_{}", task.id),
                    release,
                    start_max,
                    task.duration,
                    end_max,
                );
                model.add_interval(interval);
            }
        }
        Ok(())
    }

    fn add_no_overlap_constraints(&self, model: &mut CpModel) {
        for intervals in self.machine_intervals().into_values() {
            if intervals.len() > 1 {
                model.add_no_overlap(intervals);
            }
        }
    }

    fn add_precedence_constraints(&self, model: &mut CpModel) -> Result<(), SolveStatus> {
        for (j, job) in self.jobs.iter().enumerate() {
            for t in 1..job.tasks.len() {
                let before = IntervalId(self.offsets[j] + t - 1);
                let after = IntervalId(self.offsets[j] + t);
                model.add_precedence(before, after);
            }
        }

        for constraint in &self.constraints {
            match constraint {
                Constraint::Precedence { before, after } => {
                    let (Some(b), Some(a)) = (self.interval_id(*before), self.interval_id(*after))
                    else {
                        tracing::warn!(%before, %after, "precedence references an unknown task");
                        return Err(SolveStatus::ModelInvalid);
                    };
                    model.add_precedence(b, a);
                }
            }
        }
        Ok(())
    }

    /// Interval ids per machine, keyed in machine order.
    fn machine_intervals(&self) -> BTreeMap<&'a str, Vec<IntervalId>> {
        let mut map: BTreeMap<&'a str, Vec<IntervalId>> = BTreeMap::new();
        for (j, job) in self.jobs.iter().enumerate() {
            for (t, task) in job.tasks.iter().enumerate() {
                map.entry(task.machine.as_str())
                    .or_default()
                    .push(IntervalId(self.offsets[j] + t));
            }
        }
        map
    }

    /// Decodes a CP solution into a Schedule.
    fn decode_solution(&self, solution: &CpSolution) -> Schedule {
        let mut schedule = Schedule::new();

        if !solution.is_solution_found() {
            return schedule;
        }

        for (j, job) in self.jobs.iter().enumerate() {
            for (t, task) in job.tasks.iter().enumerate() {
                if let Some(value) = solution.value(IntervalId(self.offsets[j] + t)) {
                    schedule.add_assignment(Assignment::new(
                        j,
                        t,
                        task.id,
                        &task.machine,
                        value.start,
                        value.end,
                    ));
                }
            }
        }

        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use crate::validation::verify_schedule;

    fn make_test_data() -> Vec<Job> {
        vec![
            Job::new(0, vec![Task::new(0, "M1", 1), Task::new(1, "M1", 2)]),
            Job::new(1, vec![Task::new(0, "M1", 3)]),
        ]
    }

    #[test]
    fn test_build_model() {
        let jobs = make_test_data();
        let model = ScheduleCpBuilder::new(&jobs).build().unwrap();

        assert_eq!(model.interval_count(), 3);
        // 1 precedence (job 0) + 1 no-overlap (M1)
        assert_eq!(model.constraint_count(), 2);
        assert_eq!(model.horizon(), 6);
        assert_eq!(ScheduleCpBuilder::new(&jobs).horizon(), Some(6));
        assert_eq!(model.intervals()[1].name, "interval_0_1");
    }

    #[test]
    fn test_build_with_constraints() {
        let jobs = make_test_data();
        let constraints = vec![Constraint::precedence(TaskRef::new(0, 1), TaskRef::new(1, 0))];
        let model = ScheduleCpBuilder::new(&jobs)
            .with_constraints(constraints)
            .build()
            .unwrap();
        assert_eq!(model.constraint_count(), 3);
    }

    #[test]
    fn test_single_task_machine_has_no_group() {
        let jobs = vec![Job::new(0, vec![Task::new(0, "M1", 1), Task::new(1, "M2", 1)])];
        let model = ScheduleCpBuilder::new(&jobs).build().unwrap();
        // Only the precedence; each machine has a single interval.
        assert_eq!(model.constraint_count(), 1);
    }

    #[test]
    fn test_time_window_bounds() {
        let jobs = vec![Job::new(0, vec![Task::new(0, "M1", 2), Task::new(1, "M1", 3)])
            .with_release_time(4)
            .with_deadline(20)];
        let model = ScheduleCpBuilder::new(&jobs).build().unwrap();
        // horizon = 4 + 5 = 9 < deadline
        let iv = &model.intervals()[1];
        assert_eq!(iv.start_min, 4);
        assert_eq!(iv.end_max, 9);
        assert_eq!(iv.start_max, 6);
    }

    #[test]
    fn test_interval_id() {
        let jobs = make_test_data();
        let builder = ScheduleCpBuilder::new(&jobs);
        assert_eq!(builder.interval_id(TaskRef::new(1, 0)), Some(IntervalId(2)));
        assert_eq!(builder.interval_id(TaskRef::new(1, 1)), None);
        assert_eq!(builder.interval_id(TaskRef::new(2, 0)), None);
    }

    #[test]
    fn test_unknown_precedence_reference_is_invalid() {
        crate::logging::init_test();
        let jobs = make_test_data();
        let builder = ScheduleCpBuilder::new(&jobs)
            .with_constraints(vec![Constraint::precedence(TaskRef::new(0, 1), TaskRef::new(4, 0))]);
        assert_eq!(builder.build().unwrap_err(), SolveStatus::ModelInvalid);

        let (schedule, solution) = builder.solve(&PumpkinSolver, &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::ModelInvalid);
        assert_eq!(schedule.assignment_count(), 0);
    }

    #[test]
    fn test_horizon_overflow_is_invalid() {
        let jobs = vec![
            Job::new(0, vec![Task::new(0, "M1", i64::MAX / 2 + 1)]),
            Job::new(1, vec![Task::new(0, "M1", i64::MAX / 2 + 1)]),
        ];
        let builder = ScheduleCpBuilder::new(&jobs);
        assert_eq!(builder.horizon(), None);
        assert_eq!(builder.build().unwrap_err(), SolveStatus::ModelInvalid);
    }

    #[test]
    fn test_solve_basic() {
        crate::logging::init_test();
        let jobs = make_test_data();
        let (schedule, solution) =
            ScheduleCpBuilder::new(&jobs).solve(&PumpkinSolver, &SolverConfig::default());

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(schedule.assignment_count(), 3);
        assert_eq!(schedule.makespan(), 6);
        assert!(verify_schedule(&jobs, &[], &schedule).is_empty());
    }

    #[test]
    fn test_intra_job_precedence() {
        let jobs = make_test_data();
        let (schedule, _) =
            ScheduleCpBuilder::new(&jobs).solve(&PumpkinSolver, &SolverConfig::default());

        let o1 = schedule.assignment_for(TaskRef::new(0, 0)).unwrap();
        let o2 = schedule.assignment_for(TaskRef::new(0, 1)).unwrap();
        assert!(o1.end <= o2.start);
    }

    #[test]
    fn test_no_overlap() {
        let jobs = make_test_data();
        let (schedule, _) =
            ScheduleCpBuilder::new(&jobs).solve(&PumpkinSolver, &SolverConfig::default());

        let m1 = schedule.assignments_for_machine("M1");
        for i in 0..m1.len() {
            for j in (i + 1)..m1.len() {
                let (a, b) = (m1[i], m1[j]);
                assert!(
                    !a.overlaps(b),
                    "Overlap detected: {} [{}, {}] and {} [{}, {}]",
                    a.task_ref(),
                    a.start,
                    a.end,
                    b.task_ref(),
                    b.start,
                    b.end,
                );
            }
        }
    }

    #[test]
    fn test_deadline_conflict_is_infeasible() {
        // Both jobs need M1 for 3 units and must finish by 4.
        let jobs = vec![
            Job::new(0, vec![Task::new(0, "M1", 3)]).with_deadline(4),
            Job::new(1, vec![Task::new(0, "M1", 3)]).with_deadline(4),
        ];
        let (schedule, solution) =
            ScheduleCpBuilder::new(&jobs).solve(&PumpkinSolver, &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert_eq!(schedule.assignment_count(), 0);
    }

    #[test]
    fn test_cross_job_cycle_is_infeasible() {
        let jobs = vec![
            Job::new(0, vec![Task::new(0, "M1", 1), Task::new(1, "M2", 1)]),
            Job::new(1, vec![Task::new(0, "M2", 1), Task::new(1, "M1", 1)]),
        ];
        let constraints = vec![
            Constraint::precedence(TaskRef::new(0, 1), TaskRef::new(1, 0)),
            Constraint::precedence(TaskRef::new(1, 1), TaskRef::new(0, 0)),
        ];
        let (_, solution) = ScheduleCpBuilder::new(&jobs)
            .with_constraints(constraints)
            .solve(&PumpkinSolver, &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }
}
