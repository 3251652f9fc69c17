use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError,
    Solution as LpSolution, SolverModel, Variable,
};
use tracing::{debug, warn};

use crate::problem::{ConstraintOp, Problem, VarKind};
use crate::solution::Solution;

/// External solving capability: turn a [`Problem`] into a [`Solution`].
///
/// Implementations never return `Err`; infeasibility, unboundedness, and
/// internal failures are all encoded in the solution status so callers branch
/// on status instead of catching errors.
pub trait SolverBackend: Send + Sync {
    fn solve(&self, problem: &Problem) -> Solution;
}

/// Options for a single solve call.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Give up and report [`crate::SolveStatus::TimedOut`] after this long.
    /// `None` blocks until the backend answers.
    pub timeout: Option<Duration>,
    /// Cooperative cancellation flag, checked before the backend is
    /// dispatched. A solve already handed to the backend runs to completion.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SolveOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: None,
        }
    }
}

/// Wraps a [`SolverBackend`] with timeout and cancellation handling.
pub struct Solver<B = MilpBackend> {
    backend: Arc<B>,
}

impl Solver<MilpBackend> {
    pub fn new() -> Self {
        Self::with_backend(MilpBackend)
    }
}

impl Default for Solver<MilpBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: SolverBackend + 'static> Solver<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn solve(&self, problem: &Problem) -> Solution {
        self.solve_with(problem, &SolveOptions::default())
    }

    pub fn solve_with(&self, problem: &Problem, options: &SolveOptions) -> Solution {
        if let Some(cancel) = &options.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Solution::cancelled();
            }
        }
        match options.timeout {
            None => self.backend.solve(problem),
            Some(limit) => self.solve_bounded(problem, limit),
        }
    }

    /// Runs the backend on a worker thread so an overdue solve cannot hang
    /// the caller. On timeout the thread is detached and its late answer
    /// dropped with the channel.
    fn solve_bounded(&self, problem: &Problem, limit: Duration) -> Solution {
        let backend = Arc::clone(&self.backend);
        let problem = problem.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(backend.solve(&problem));
        });
        match rx.recv_timeout(limit) {
            Ok(solution) => solution,
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "solve timed out");
                Solution::timed_out()
            }
        }
    }
}

/// Default backend: `good_lp` over the pure-Rust microlp solver, which
/// handles the integer decision variables via branch-and-bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpBackend;

impl SolverBackend for MilpBackend {
    fn solve(&self, problem: &Problem) -> Solution {
        let mut vars = variables!();
        let handles: Vec<Variable> = problem
            .variables
            .iter()
            .map(|def| {
                let mut v = variable().min(def.min).name(def.name.clone());
                if let Some(max) = def.max {
                    v = v.max(max);
                }
                if def.kind == VarKind::Integer {
                    v = v.integer();
                }
                vars.add(v)
            })
            .collect();

        let objective = linear_combination(&problem.objective.coefficients, &handles);
        let mut model = if problem.objective.minimize {
            vars.minimise(objective).using(default_solver)
        } else {
            vars.maximise(objective).using(default_solver)
        };
        for c in &problem.constraints {
            let lhs = linear_combination(&c.coefficients, &handles);
            model = model.with(match c.op {
                ConstraintOp::Le => constraint::leq(lhs, c.rhs),
                ConstraintOp::Ge => constraint::geq(lhs, c.rhs),
                ConstraintOp::Eq => constraint::eq(lhs, c.rhs),
            });
        }

        match model.solve() {
            Ok(solved) => {
                let values: Vec<f64> = handles.iter().map(|h| solved.value(*h)).collect();
                let objective_value = problem
                    .objective
                    .coefficients
                    .iter()
                    .zip(&values)
                    .map(|(c, v)| c * v)
                    .sum();
                debug!(objective_value, "solve finished");
                Solution::optimal(values, objective_value)
            }
            Err(ResolutionError::Infeasible) => Solution::infeasible(),
            Err(ResolutionError::Unbounded) => Solution::unbounded(),
            Err(e) => {
                warn!(error = %e, "solver error");
                Solution::error()
            }
        }
    }
}

fn linear_combination(coefficients: &[f64], handles: &[Variable]) -> Expression {
    coefficients
        .iter()
        .zip(handles)
        .fold(Expression::from(0.0), |acc, (c, v)| acc + (*v) * (*c))
}
