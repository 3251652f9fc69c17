use goalplan_solver::{ConstraintOp, Problem, VarKind};
use thiserror::Error;
use tracing::debug;

use crate::goal::{GoalSet, GoalSetError};
use crate::supplier::Catalog;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Total demand must be a finite, non-negative number (got {0})")]
    InvalidDemand(f64),
    #[error("Capacity vector has {capacities} entries for {suppliers} suppliers")]
    CapacityMismatch { capacities: usize, suppliers: usize },
    #[error(transparent)]
    Goals(#[from] GoalSetError),
}

/// Variable columns holding a goal's deviation from its target.
#[derive(Debug, Clone, Copy)]
pub struct DeviationColumns {
    /// Amount achieved above the target
    pub over: usize,
    /// Amount achieved below the target
    pub under: usize,
}

/// The assembled goal program for one optimization call, plus the column
/// bookkeeping needed to read the solved assignment back out.
///
/// Ephemeral by design: built fresh per call, dropped after extraction.
#[derive(Debug, Clone)]
pub struct GoalModel {
    pub problem: Problem,
    supplier_columns: Vec<usize>,
    deviation_columns: Vec<DeviationColumns>,
}

impl GoalModel {
    /// Builds the weighted goal program:
    ///
    /// - one non-negative integer purchase variable per supplier;
    /// - per goal, two non-negative continuous deviation variables;
    /// - objective `min Σ_g weight_g * (over_g + under_g)`;
    /// - constraints: total demand equality, one capacity bound per
    ///   supplier, and per goal `Σ coeff_i * x_i + under - over = target`.
    ///
    /// Feasibility is never decided here; an over-constrained model builds
    /// fine and comes back infeasible from the solver.
    pub fn build(
        catalog: &Catalog,
        capacities: &[u32],
        total_demand: f64,
        goal_set: &GoalSet,
    ) -> Result<Self, ModelError> {
        if !total_demand.is_finite() || total_demand < 0.0 {
            return Err(ModelError::InvalidDemand(total_demand));
        }
        if capacities.len() != catalog.len() {
            return Err(ModelError::CapacityMismatch {
                capacities: capacities.len(),
                suppliers: catalog.len(),
            });
        }
        goal_set.validate_against(catalog)?;

        let mut problem = Problem::new();

        let supplier_columns: Vec<usize> = catalog
            .records()
            .iter()
            .map(|record| problem.add_variable(format!("x_{}", record.id), VarKind::Integer, 0.0))
            .collect();

        let deviation_columns: Vec<DeviationColumns> = goal_set
            .goals()
            .iter()
            .map(|goal| DeviationColumns {
                over: problem.add_variable(
                    format!("d_{}_over", goal.name),
                    VarKind::Continuous,
                    0.0,
                ),
                under: problem.add_variable(
                    format!("d_{}_under", goal.name),
                    VarKind::Continuous,
                    0.0,
                ),
            })
            .collect();

        let num_columns = problem.num_variables();

        let mut objective = vec![0.0; num_columns];
        for (goal, columns) in goal_set.goals().iter().zip(&deviation_columns) {
            objective[columns.over] = goal.weight;
            objective[columns.under] = goal.weight;
        }
        problem.set_objective(objective, true);

        let mut demand_row = vec![0.0; num_columns];
        for &column in &supplier_columns {
            demand_row[column] = 1.0;
        }
        problem.add_constraint("total_demand", demand_row, ConstraintOp::Eq, total_demand);

        for ((record, &column), &capacity) in catalog
            .records()
            .iter()
            .zip(&supplier_columns)
            .zip(capacities)
        {
            let mut row = vec![0.0; num_columns];
            row[column] = 1.0;
            problem.add_constraint(
                format!("capacity_{}", record.id),
                row,
                ConstraintOp::Le,
                f64::from(capacity),
            );
        }

        for (goal, columns) in goal_set.goals().iter().zip(&deviation_columns) {
            let mut row = vec![0.0; num_columns];
            for (record, &column) in catalog.records().iter().zip(&supplier_columns) {
                row[column] = goal_set.coefficient(goal, record);
            }
            row[columns.under] = 1.0;
            row[columns.over] = -1.0;
            problem.add_constraint(
                format!("{}_goal", goal.name),
                row,
                ConstraintOp::Eq,
                goal.target,
            );
        }

        debug!(
            suppliers = catalog.len(),
            goals = goal_set.len(),
            constraints = problem.num_constraints(),
            "built goal-programming model"
        );

        Ok(Self {
            problem,
            supplier_columns,
            deviation_columns,
        })
    }

    /// Purchase variable columns, in catalog order.
    pub fn supplier_columns(&self) -> &[usize] {
        &self.supplier_columns
    }

    /// Deviation variable columns, in goal-set order.
    pub fn deviation_columns(&self) -> &[DeviationColumns] {
        &self.deviation_columns
    }
}
