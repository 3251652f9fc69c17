mod backend;
mod problem;
mod solution;

pub use backend::{MilpBackend, SolveOptions, Solver, SolverBackend};
pub use problem::{Constraint, ConstraintOp, Objective, Problem, VarKind, VariableDef};
pub use solution::{SolveStatus, Solution};
