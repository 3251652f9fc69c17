/// The result of solving a [`crate::Problem`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Solution {
    /// Solution status
    pub status: SolveStatus,
    /// Optimal values for each variable, indexed by column
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The caller-supplied time limit expired before the solver answered
    TimedOut,
    /// The caller's cancellation flag was set before the solve was dispatched
    Cancelled,
    /// Solver encountered an error
    Error,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values,
            objective_value,
        }
    }

    pub fn infeasible() -> Self {
        Self::failed(SolveStatus::Infeasible)
    }

    pub fn unbounded() -> Self {
        Self::failed(SolveStatus::Unbounded)
    }

    pub fn timed_out() -> Self {
        Self::failed(SolveStatus::TimedOut)
    }

    pub fn cancelled() -> Self {
        Self::failed(SolveStatus::Cancelled)
    }

    pub fn error() -> Self {
        Self::failed(SolveStatus::Error)
    }

    fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: f64::INFINITY,
        }
    }
}
