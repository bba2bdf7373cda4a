//! Lazy clause generation backend on the Pumpkin solver.
//!
//! Each interval becomes one integer start variable with domain
//! `[start_min, latest_start]`. Constraints map as follows:
//!
//! - precedence: `s_before - s_after <= -d_before` (linear inequality);
//! - no-overlap: Pumpkin's strict disjunctive (edge-finding) constraint;
//! - makespan: a variable `C` with `s_i - C <= -d_i` for every interval,
//!   minimized by linear SAT-UNSAT search.
//!
//! Pumpkin works on `i32` domains; models with values outside that range are
//! rejected as [`SolveStatus::ModelInvalid`]. Returned assignments are
//! left-shifted: every interval starts at its release or right after the
//! latest of its predecessors (job and machine order of the solver's answer).
//!
//! # Reference
//! - Flippo et al. (2024), "A Multi-Stage Proof Logging Framework to Certify the Correctness of CP Solvers"
//! - Vilím (2008), "Filtering algorithms for the unary resource constraint"

use std::ops::ControlFlow;
use std::time::Instant;

use pumpkin_conflict_resolvers::resolvers::ResolutionResolver;
use pumpkin_core::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_core::optimisation::OptimisationDirection;
use pumpkin_core::results::{OptimisationResult, ProblemSolution, SatisfactionResult, SolutionReference};
use pumpkin_core::termination::{Combinator, TerminationCondition, TimeBudget};
use pumpkin_core::variables::{DomainId, TransformableVariable};
use pumpkin_core::{DefaultBrancher, Solver};
use pumpkin_propagators::disjunctive::ArgDisjunctiveTask;

use super::{
    CpConstraint, CpModel, CpSolution, CpSolver, IntervalId, IntervalSolution, Objective,
    SolveStats, SolveStatus, SolverConfig,
};

/// [`CpSolver`] backed by the Pumpkin constraint solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpkinSolver;

impl PumpkinSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for PumpkinSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let started = Instant::now();
        let mut solutions = 0;

        let status_or_starts = match Encoding::from_model(model) {
            Ok(encoding) => encoding.run(model, config, &mut solutions),
            Err(status) => {
                tracing::debug!(model = model.name(), %status, "model rejected before search");
                Err(status)
            }
        };

        let stats = SolveStats {
            solutions,
            wall_time: started.elapsed(),
        };

        match status_or_starts {
            Ok((status, mut starts)) => {
                left_shift(model, &mut starts);
                let intervals: Vec<IntervalSolution> = starts
                    .iter()
                    .zip(model.intervals())
                    .map(|(&start, iv)| IntervalSolution {
                        start,
                        end: start + iv.duration,
                    })
                    .collect();
                let objective_value = intervals.iter().map(|v| v.end).max().unwrap_or(0);
                CpSolution {
                    status,
                    intervals,
                    objective_value: Some(objective_value),
                    stats,
                }
            }
            Err(status) => CpSolution::without_solution(status, stats),
        }
    }
}

/// Stops the search after a fixed number of propagate-and-decide steps.
#[derive(Debug, Clone, Copy)]
struct NodeBudget {
    remaining: u64,
}

impl TerminationCondition for NodeBudget {
    fn should_stop(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}

/// The model checked and converted to the `i32` values Pumpkin works with.
struct Encoding {
    lower: Vec<i32>,
    upper: Vec<i32>,
    duration: Vec<i32>,
    makespan_lower: i32,
    makespan_upper: i32,
}

impl Encoding {
    fn from_model(model: &CpModel) -> Result<Self, SolveStatus> {
        let n = model.interval_count();
        let mut lower = Vec::with_capacity(n);
        let mut upper = Vec::with_capacity(n);
        let mut duration = Vec::with_capacity(n);

        for iv in model.intervals() {
            if iv.duration < 0 {
                return Err(SolveStatus::ModelInvalid);
            }
            let latest_start = iv
                .end_max
                .checked_sub(iv.duration)
                .map(|latest| latest.min(iv.start_max))
                .ok_or(SolveStatus::ModelInvalid)?;
            let (lo, hi, d) = (
                to_i32(iv.start_min)?,
                to_i32(latest_start)?,
                to_i32(iv.duration)?,
            );
            // The end of every interval must fit as well.
            hi.checked_add(d).ok_or(SolveStatus::ModelInvalid)?;
            lower.push(lo);
            upper.push(hi);
            duration.push(d);
        }

        let known = |id: &IntervalId| id.0 < n;
        for constraint in model.constraints() {
            let valid = match constraint {
                CpConstraint::Precedence { before, after } => known(before) && known(after),
                CpConstraint::NoOverlap { intervals } => intervals.iter().all(known),
            };
            if !valid {
                return Err(SolveStatus::ModelInvalid);
            }
        }

        if (0..n).any(|i| lower[i] > upper[i]) {
            return Err(SolveStatus::Infeasible);
        }

        let makespan_lower = (0..n).map(|i| lower[i] + duration[i]).max().unwrap_or(0);
        let makespan_upper = (0..n).map(|i| upper[i] + duration[i]).max().unwrap_or(0);

        Ok(Self {
            lower,
            upper,
            duration,
            makespan_lower,
            makespan_upper,
        })
    }

    /// Posts the model and searches. Returns the status and the raw starts.
    fn run(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        solutions: &mut u64,
    ) -> Result<(SolveStatus, Vec<i64>), SolveStatus> {
        if model.interval_count() == 0 {
            return Ok((SolveStatus::Optimal, Vec::new()));
        }

        let mut solver = Solver::default();

        // Variables first: none can be created once posting has made the
        // root inconsistent.
        let starts: Vec<DomainId> = model
            .intervals()
            .iter()
            .enumerate()
            .map(|(i, iv)| {
                solver.new_named_bounded_integer(self.lower[i], self.upper[i], iv.name.clone())
            })
            .collect();
        let makespan = solver.new_named_bounded_integer(
            self.makespan_lower,
            self.makespan_upper,
            "makespan",
        );

        let tag = solver.new_constraint_tag();
        for constraint in model.constraints() {
            match constraint {
                CpConstraint::Precedence { before, after } => {
                    let (b, a) = (before.0, after.0);
                    if b == a {
                        if self.duration[b] > 0 {
                            return Err(SolveStatus::Infeasible);
                        }
                        continue;
                    }
                    solver
                        .add_constraint(pumpkin_constraints::less_than_or_equals(
                            vec![starts[b].scaled(1), starts[a].scaled(-1)],
                            -self.duration[b],
                            tag,
                        ))
                        .post();
                }
                CpConstraint::NoOverlap { intervals } => {
                    if intervals.len() < 2 {
                        continue;
                    }
                    let tasks = intervals.iter().map(|id| ArgDisjunctiveTask {
                        start_time: starts[id.0],
                        processing_time: self.duration[id.0],
                    });
                    solver
                        .add_constraint(pumpkin_constraints::disjunctive_strict(tasks, tag))
                        .post();
                }
            }
        }
        for (i, &start) in starts.iter().enumerate() {
            solver
                .add_constraint(pumpkin_constraints::less_than_or_equals(
                    vec![start.scaled(1), makespan.scaled(-1)],
                    -self.duration[i],
                    tag,
                ))
                .post();
        }

        let mut termination = Combinator::new(
            config.time_limit.map(TimeBudget::starting_now),
            config.node_limit.map(|remaining| NodeBudget { remaining }),
        );
        let mut brancher = solver.default_brancher();
        let mut resolver = ResolutionResolver::default();

        match model.objective() {
            Objective::MinimizeMaxEnd => {
                let callback = |_: &Solver,
                                solution: SolutionReference<'_>,
                                _: &DefaultBrancher,
                                _: &ResolutionResolver|
                 -> ControlFlow<()> {
                    *solutions += 1;
                    tracing::debug!(
                        makespan = solution.get_integer_value(makespan),
                        "improving solution"
                    );
                    ControlFlow::Continue(())
                };
                let result = solver.optimise(
                    &mut brancher,
                    &mut termination,
                    &mut resolver,
                    LinearSatUnsat::new(OptimisationDirection::Minimise, makespan, callback),
                );
                match result {
                    OptimisationResult::Optimal(solution) => Ok((
                        SolveStatus::Optimal,
                        start_values(&starts, &solution),
                    )),
                    OptimisationResult::Satisfiable(solution)
                    | OptimisationResult::Stopped(solution, _) => Ok((
                        SolveStatus::Feasible,
                        start_values(&starts, &solution),
                    )),
                    OptimisationResult::Unsatisfiable => Err(SolveStatus::Infeasible),
                    OptimisationResult::Unknown => Err(SolveStatus::Unknown),
                }
            }
            Objective::Satisfy => {
                match solver.satisfy(&mut brancher, &mut termination, &mut resolver) {
                    SatisfactionResult::Satisfiable(satisfiable) => {
                        *solutions += 1;
                        let solution = satisfiable.solution();
                        Ok((
                            SolveStatus::Feasible,
                            start_values(&starts, &solution),
                        ))
                    }
                    SatisfactionResult::Unsatisfiable(..) => Err(SolveStatus::Infeasible),
                    SatisfactionResult::Unknown(..) => Err(SolveStatus::Unknown),
                }
            }
        }
    }
}

fn start_values(starts: &[DomainId], solution: &impl ProblemSolution) -> Vec<i64> {
    starts
        .iter()
        .map(|&s| i64::from(solution.get_integer_value(s)))
        .collect()
}

fn to_i32(value: i64) -> Result<i32, SolveStatus> {
    i32::try_from(value).map_err(|_| SolveStatus::ModelInvalid)
}

/// Moves every interval to its earliest start under the precedences and the
/// machine sequences of the given assignment. Starts never increase, so a
/// feasible assignment stays feasible and the makespan does not grow.
fn left_shift(model: &CpModel, starts: &mut [i64]) {
    let n = starts.len();
    let intervals = model.intervals();
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];

    for constraint in model.constraints() {
        match constraint {
            CpConstraint::Precedence { before, after } if before != after => {
                preds[after.0].push(before.0);
            }
            CpConstraint::Precedence { .. } => {}
            CpConstraint::NoOverlap { intervals: members } => {
                let mut sequence: Vec<usize> = members.iter().map(|id| id.0).collect();
                sequence.sort_by_key(|&i| (starts[i], starts[i] + intervals[i].duration, i));
                for pair in sequence.windows(2) {
                    preds[pair[1]].push(pair[0]);
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (starts[i], starts[i] + intervals[i].duration, i));
    for i in order {
        let earliest = preds[i]
            .iter()
            .map(|&p| starts[p] + intervals[p].duration)
            .fold(intervals[i].start_min, i64::max);
        starts[i] = earliest.min(starts[i]);
    }
}
