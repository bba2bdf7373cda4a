//! Job-shop scheduler.
//!
//! # Algorithm
//!
//! 1. Validate the input (no solver call on invalid input).
//! 2. Translate jobs into a CP model via [`ScheduleCpBuilder`].
//! 3. Solve with the configured [`CpSolver`].
//! 4. Verify the decoded schedule and annotate every task with its
//!    start and end times.

use crate::cp::{
    CpSolver, PumpkinSolver, ScheduleCpBuilder, SolveStats, SolveStatus, SolverConfig,
};
use crate::models::{Constraint, Job, Machine, Schedule};
use crate::report::{self, ResultRow};
use crate::validation::{validate_input, verify_schedule};
use crate::{Error, Result};

use super::ScheduleKpi;

/// Schedules a set of jobs and keeps the result.
///
/// Jobs are keyed by their position in the input list. After a successful
/// [`fit`](Self::fit) every task carries its assigned `start` and `end`.
///
/// # Example
///
/// ```
/// use shop_scheduler::models::{Job, Task};
/// use shop_scheduler::scheduler::ShopScheduler;
///
/// let jobs = vec![
///     Job::new(0, vec![Task::new(0, "1", 2), Task::new(1, "2", 2), Task::new(2, "3", 2)]),
///     Job::new(1, vec![Task::new(0, "3", 2), Task::new(1, "2", 2), Task::new(2, "1", 2)]),
/// ];
/// let mut scheduler = ShopScheduler::new(jobs);
/// scheduler.fit().unwrap();
/// assert_eq!(scheduler.schedule().unwrap().makespan(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct ShopScheduler<S = PumpkinSolver> {
    jobs: Vec<Job>,
    constraints: Vec<Constraint>,
    machines: Option<Vec<Machine>>,
    config: SolverConfig,
    solver: S,
    outcome: Option<Outcome>,
}

#[derive(Debug, Clone)]
struct Outcome {
    status: SolveStatus,
    stats: SolveStats,
    schedule: Option<Schedule>,
}

impl ShopScheduler<PumpkinSolver> {
    /// Creates a scheduler using the bundled Pumpkin backend.
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            jobs,
            constraints: Vec::new(),
            machines: None,
            config: SolverConfig::default(),
            solver: PumpkinSolver,
            outcome: None,
        }
    }
}

impl<S: CpSolver> ShopScheduler<S> {
    /// Replaces the solver backend.
    pub fn with_solver<T: CpSolver>(self, solver: T) -> ShopScheduler<T> {
        ShopScheduler {
            jobs: self.jobs,
            constraints: self.constraints,
            machines: self.machines,
            config: self.config,
            solver,
            outcome: None,
        }
    }

    /// Adds cross-job constraints.
    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Restricts tasks to a known machine list.
    pub fn with_machines(mut self, machines: Vec<Machine>) -> Self {
        self.machines = Some(machines);
        self
    }

    /// Sets solver limits.
    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Jobs in input order (annotated after a successful fit).
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Sorted distinct machines used by all jobs.
    pub fn all_machines(&self) -> Vec<String> {
        let mut machines: Vec<String> = self
            .jobs
            .iter()
            .flat_map(|j| j.machines())
            .map(str::to_string)
            .collect();
        machines.sort_unstable();
        machines.dedup();
        machines
    }

    /// Total work: the duration if every task of every job ran back to back.
    /// `None` if the sum overflows.
    pub fn horizon(&self) -> Option<i64> {
        self.jobs
            .iter()
            .try_fold(0i64, |acc, job| acc.checked_add(job.horizon()?))
    }

    /// Whether the last fit produced a schedule.
    pub fn is_fitted(&self) -> bool {
        self.outcome.as_ref().is_some_and(|o| o.schedule.is_some())
    }

    /// Status of the last solve.
    pub fn status(&self) -> Option<SolveStatus> {
        self.outcome.as_ref().map(|o| o.status)
    }

    /// Statistics of the last solve.
    pub fn stats(&self) -> Option<SolveStats> {
        self.outcome.as_ref().map(|o| o.stats)
    }

    /// Validates, builds the model, solves it and annotates the tasks.
    ///
    /// # Errors
    /// - [`Error::Validation`] when the input is malformed (the solver is not called);
    /// - [`Error::Infeasible`] when no schedule satisfies the constraints;
    /// - [`Error::SolverUnsuccessful`] for any other non-success status;
    /// - [`Error::InvalidSchedule`] if the decoded schedule breaks an invariant.
    pub fn fit(&mut self) -> Result<&mut Self> {
        self.outcome = None;
        for task in self.jobs.iter_mut().flat_map(|j| j.tasks.iter_mut()) {
            task.reset();
        }

        if let Err(errors) = validate_input(&self.jobs, &self.constraints, self.machines.as_deref()) {
            tracing::warn!(errors = errors.len(), "rejecting invalid input");
            return Err(Error::Validation(errors));
        }

        let builder =
            ScheduleCpBuilder::new(&self.jobs).with_constraints(self.constraints.clone());
        let (mut schedule, solution) = builder.solve(&self.solver, &self.config);
        let stats = solution.stats;

        tracing::info!("Solver status: {}", solution.status);
        tracing::info!("Solver solutions: {}", stats.solutions);
        tracing::info!("Solver wall time: {:.3}s", stats.wall_time.as_secs_f64());

        if !solution.is_solution_found() {
            self.outcome = Some(Outcome {
                status: solution.status,
                stats,
                schedule: None,
            });
            return Err(match solution.status {
                SolveStatus::Infeasible => Error::Infeasible,
                status => Error::SolverUnsuccessful(status),
            });
        }

        let violations = verify_schedule(&self.jobs, &self.constraints, &schedule);
        if !violations.is_empty() {
            tracing::error!(count = violations.len(), "solver returned a schedule with violations");
            return Err(Error::InvalidSchedule(violations));
        }
        schedule.violations.clear();

        for a in &schedule.assignments {
            self.jobs[a.job].tasks[a.position].assign(a.start, a.end);
        }

        tracing::info!(makespan = schedule.makespan(), "schedule ready");
        self.outcome = Some(Outcome {
            status: solution.status,
            stats,
            schedule: Some(schedule),
        });
        Ok(self)
    }

    /// The solved schedule.
    pub fn schedule(&self) -> Result<&Schedule> {
        self.outcome
            .as_ref()
            .and_then(|o| o.schedule.as_ref())
            .ok_or(Error::NotFitted)
    }

    /// One row per task, sorted by machine then start time.
    pub fn results(&self) -> Result<Vec<ResultRow>> {
        self.schedule()?;
        Ok(report::result_rows(&self.jobs))
    }

    /// Performance indicators of the solved schedule.
    pub fn kpi(&self) -> Result<ScheduleKpi> {
        Ok(ScheduleKpi::calculate(self.schedule()?, &self.jobs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{CpModel, CpSolution};
    use crate::models::{machines_from_ids, Task, TaskRef};
    use crate::validation::ValidationErrorKind;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn example_jobs() -> Vec<Job> {
        vec![
            Job::new(
                0,
                vec![Task::new(0, "1", 2), Task::new(1, "2", 2), Task::new(2, "3", 2)],
            ),
            Job::new(
                1,
                vec![Task::new(0, "3", 2), Task::new(1, "2", 2), Task::new(2, "1", 2)],
            ),
        ]
    }

    #[test]
    fn test_scheduler_instantiated() {
        let scheduler = ShopScheduler::new(example_jobs());
        assert_eq!(scheduler.jobs(), example_jobs().as_slice());
        assert!(!scheduler.is_fitted());
        assert!(scheduler.status().is_none());
    }

    #[test]
    fn test_horizon() {
        assert_eq!(ShopScheduler::new(example_jobs()).horizon(), Some(12));
    }

    #[test]
    fn test_all_machines() {
        assert_eq!(
            ShopScheduler::new(example_jobs()).all_machines(),
            vec!["1", "2", "3"]
        );
    }

    #[test]
    fn test_results_before_fit() {
        let scheduler = ShopScheduler::new(example_jobs());
        assert!(matches!(scheduler.results(), Err(Error::NotFitted)));
        assert!(matches!(scheduler.kpi(), Err(Error::NotFitted)));
    }

    #[test]
    fn test_results_reference_instance() {
        crate::logging::init_test();
        let mut scheduler = ShopScheduler::new(example_jobs());
        scheduler.fit().unwrap();
        assert_eq!(scheduler.status(), Some(SolveStatus::Optimal));
        assert_eq!(scheduler.schedule().unwrap().makespan(), 8);

        let rows = scheduler.results().unwrap();
        assert_eq!(rows.len(), 6);
        let machines: Vec<&str> = rows.iter().map(|r| r.machine.as_str()).collect();
        assert_eq!(machines, vec!["1", "1", "2", "2", "3", "3"]);
        for pair in rows.windows(2) {
            if pair[0].machine == pair[1].machine {
                assert!(pair[0].end <= pair[1].start);
            }
        }

        // Both jobs start on their first machine at t=0 (nothing blocks them),
        // and the two tasks sharing machine "2" run back to back.
        let first = |job: usize| rows.iter().find(|r| r.task == format!("job({job}, 0)")).unwrap();
        assert_eq!((first(0).machine.as_str(), first(0).start), ("1", 0));
        assert_eq!((first(1).machine.as_str(), first(1).start), ("3", 0));
        assert_eq!((rows[2].start, rows[2].end, rows[3].start, rows[3].end), (2, 4, 4, 6));
    }

    #[test]
    fn test_fit_annotates_tasks() {
        let mut scheduler = ShopScheduler::new(example_jobs());
        scheduler.fit().unwrap();
        for job in scheduler.jobs() {
            assert!(job.is_scheduled());
            for task in &job.tasks {
                assert_eq!(task.end.unwrap(), task.start.unwrap() + task.duration);
            }
        }
        assert_eq!(scheduler.kpi().unwrap().makespan, 8);
    }

    #[test]
    fn test_validation_rejected_before_solving() {
        let jobs = vec![Job::new(0, vec![Task::new(0, "E-101", 0)])];
        let mut scheduler =
            ShopScheduler::new(jobs).with_machines(machines_from_ids(["T-301"]));
        let Err(Error::Validation(errors)) = scheduler.fit() else {
            panic!("expected validation error");
        };
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NonPositiveDuration));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownMachine));
        assert!(scheduler.status().is_none());
    }

    #[test]
    fn test_huge_durations_rejected_without_panic() {
        crate::logging::init_test();
        let half = i64::MAX / 2 + 1;
        let jobs = vec![
            Job::new(0, vec![Task::new(0, "M1", half)]),
            Job::new(1, vec![Task::new(0, "M1", half)]),
        ];
        let mut scheduler = ShopScheduler::new(jobs);
        assert_eq!(scheduler.horizon(), None);
        let Err(Error::Validation(errors)) = scheduler.fit() else {
            panic!("expected validation error");
        };
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::ValueOutOfRange));
        assert!(scheduler.status().is_none());
    }

    #[test]
    fn test_infeasible_reported_distinctly() {
        let jobs = vec![
            Job::new(0, vec![Task::new(0, "M1", 3)]).with_deadline(4),
            Job::new(1, vec![Task::new(0, "M1", 3)]).with_deadline(4),
        ];
        let mut scheduler = ShopScheduler::new(jobs);
        assert!(matches!(scheduler.fit(), Err(Error::Infeasible)));
        assert_eq!(scheduler.status(), Some(SolveStatus::Infeasible));
        assert!(matches!(scheduler.results(), Err(Error::NotFitted)));
    }

    #[test]
    fn test_conflicting_constraints_infeasible() {
        let constraints = vec![
            Constraint::precedence(TaskRef::new(0, 2), TaskRef::new(1, 0)),
            Constraint::precedence(TaskRef::new(1, 2), TaskRef::new(0, 0)),
        ];
        let mut scheduler = ShopScheduler::new(example_jobs()).with_constraints(constraints);
        assert!(matches!(scheduler.fit(), Err(Error::Infeasible)));
    }

    #[test]
    fn test_cross_job_precedence_respected() {
        let constraints = vec![Constraint::precedence(TaskRef::new(1, 2), TaskRef::new(0, 0))];
        let mut scheduler = ShopScheduler::new(example_jobs()).with_constraints(constraints);
        scheduler.fit().unwrap();
        let jobs = scheduler.jobs();
        assert!(jobs[0].tasks[0].start.unwrap() >= jobs[1].tasks[2].end.unwrap());
    }

    struct GiveUp;

    impl CpSolver for GiveUp {
        fn solve(&self, _model: &CpModel, _config: &SolverConfig) -> CpSolution {
            CpSolution::without_solution(SolveStatus::Unknown, SolveStats::default())
        }
    }

    #[test]
    fn test_solver_unsuccessful() {
        let mut scheduler = ShopScheduler::new(example_jobs()).with_solver(GiveUp);
        assert!(matches!(
            scheduler.fit(),
            Err(Error::SolverUnsuccessful(SolveStatus::Unknown))
        ));
    }

    #[test]
    fn test_refit_clears_previous_assignment() {
        let mut scheduler = ShopScheduler::new(example_jobs());
        scheduler.fit().unwrap();
        let mut scheduler = scheduler.with_solver(GiveUp);
        assert!(scheduler.fit().is_err());
        assert!(scheduler.jobs().iter().all(|j| !j.is_scheduled()));
    }

    fn random_jobs(rng: &mut StdRng) -> Vec<Job> {
        let machines = ["M1", "M2", "M3", "M4"];
        let n_jobs = rng.random_range(1..=4);
        (0..n_jobs)
            .map(|j| {
                let n_tasks = rng.random_range(1..=4);
                let tasks = (0..n_tasks)
                    .map(|t| {
                        let machine = machines[rng.random_range(0..machines.len())];
                        Task::new(t, machine, rng.random_range(1..=5))
                    })
                    .collect();
                Job::new(j, tasks)
            })
            .collect()
    }

    #[test]
    fn test_random_instances_satisfy_invariants() {
        crate::logging::init_test();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..25 {
            let jobs = random_jobs(&mut rng);
            let mut scheduler = ShopScheduler::new(jobs);
            scheduler.fit().unwrap();

            let jobs = scheduler.jobs();
            for job in jobs {
                for pair in job.tasks.windows(2) {
                    assert!(pair[1].start.unwrap() >= pair[0].end.unwrap());
                }
                for task in &job.tasks {
                    assert_eq!(task.end.unwrap(), task.start.unwrap() + task.duration);
                }
            }

            let tasks: Vec<&Task> = jobs.iter().flat_map(|j| &j.tasks).collect();
            for (i, a) in tasks.iter().enumerate() {
                for b in &tasks[i + 1..] {
                    if a.machine == b.machine {
                        assert!(
                            a.end.unwrap() <= b.start.unwrap() || b.end.unwrap() <= a.start.unwrap()
                        );
                    }
                }
            }

            let schedule = scheduler.schedule().unwrap();
            let longest_job = jobs.iter().filter_map(Job::horizon).max().unwrap_or(0);
            assert!(schedule.makespan() >= longest_job);
            assert!(schedule.makespan() <= scheduler.horizon().unwrap());
        }
    }
}
