use goalplan_solver::{SolveOptions, Solver, SolverBackend};
use tracing::info;

use crate::goal::GoalSet;
use crate::model::{GoalModel, ModelError};
use crate::result::{extract, OptimizationResult};
use crate::scenario::{adjusted_capacities, Scenario};
use crate::supplier::Catalog;

/// Runs one optimization call end to end: adjust capacities for the
/// scenario, build the goal program, solve, extract.
///
/// Stateless between calls; the whole configuration arrives as arguments,
/// and concurrent calls over a shared `&Catalog` are fine since each builds
/// its own model. `Err` means the inputs never made it to the solver;
/// solver-side outcomes (infeasible, unbounded, timeout) come back as `Ok`
/// with the failure encoded in the result's status and reason.
pub fn optimize<B: SolverBackend + 'static>(
    catalog: &Catalog,
    total_demand: f64,
    goal_set: &GoalSet,
    scenario: Scenario,
    solver: &Solver<B>,
    options: &SolveOptions,
) -> Result<OptimizationResult, ModelError> {
    let capacities = adjusted_capacities(catalog, scenario);
    let model = GoalModel::build(catalog, &capacities, total_demand, goal_set)?;
    let solution = solver.solve_with(&model.problem, options);
    info!(
        %scenario,
        status = ?solution.status,
        "optimization finished"
    );
    Ok(extract(&model, &solution, catalog, goal_set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::GoalSpec;
    use crate::result::{FailureReason, ResultStatus};
    use crate::supplier::SupplierRecord;
    use goalplan_solver::{Problem, Solution};
    use std::collections::BTreeMap;

    fn catalog(rows: &[(&str, u32, &[(&str, f64)])]) -> Catalog {
        Catalog::new(
            rows.iter()
                .map(|(id, capacity, metrics)| {
                    SupplierRecord::fixed(
                        *id,
                        *capacity,
                        metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    fn run(
        catalog: &Catalog,
        demand: f64,
        goals: Vec<GoalSpec>,
        scenario: Scenario,
    ) -> OptimizationResult {
        let goal_set = GoalSet::build(goals).unwrap();
        optimize(
            catalog,
            demand,
            &goal_set,
            scenario,
            &Solver::new(),
            &SolveOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_cost_goal_meets_demand_exactly() {
        // Capacities [40, 30, 50], demand 60, costs [10, 8, 12], target 500.
        // 480 + 2*q1 + 4*q3 can get no closer than 540, at q = [30, 30, 0].
        let catalog = catalog(&[
            ("S1", 40, &[("cost", 10.0)]),
            ("S2", 30, &[("cost", 8.0)]),
            ("S3", 50, &[("cost", 12.0)]),
        ]);

        let result = run(&catalog, 60.0, vec![GoalSpec::new("cost", 1.0, 500.0)], Scenario::Average);

        assert_eq!(result.status, ResultStatus::Optimal);
        let total: u32 = result.purchase.iter().map(|line| line.quantity).sum();
        assert_eq!(total, 60);
        // descending quantities, catalog order on the 30/30 tie
        let ids: Vec<&str> = result
            .purchase
            .iter()
            .map(|line| line.supplier_id.as_str())
            .collect();
        assert_eq!(ids, ["S1", "S2"]);
        assert_eq!(result.totals["cost"], 540.0);
        assert_eq!(result.deviations["cost"].over, 40.0);
        assert_eq!(result.deviations["cost"].under, 0.0);
        assert_eq!(result.selected_suppliers.len(), 2);
    }

    #[test]
    fn test_demand_beyond_total_capacity_is_infeasible() {
        let catalog = catalog(&[
            ("S1", 40, &[("cost", 10.0)]),
            ("S2", 30, &[("cost", 8.0)]),
            ("S3", 50, &[("cost", 12.0)]),
        ]);

        let result = run(&catalog, 200.0, vec![GoalSpec::new("cost", 1.0, 500.0)], Scenario::Average);

        assert_eq!(result.status, ResultStatus::Infeasible);
        assert_eq!(result.reason, Some(FailureReason::Infeasible));
        assert!(result.purchase.is_empty());
    }

    #[test]
    fn test_deviation_identity_holds_per_goal() {
        let catalog = catalog(&[
            ("S1", 40, &[("cost", 10.0), ("water", 120.0)]),
            ("S2", 30, &[("cost", 8.0), ("water", 150.0)]),
            ("S3", 50, &[("cost", 12.0), ("water", 90.0)]),
        ]);

        let result = run(
            &catalog,
            60.0,
            vec![
                GoalSpec::new("cost", 1.0, 600.0),
                GoalSpec::new("water", 0.5, 6500.0),
            ],
            Scenario::Average,
        );

        assert_eq!(result.status, ResultStatus::Optimal);
        for goal in ["cost", "water"] {
            let deviation = result.deviations[goal];
            let achieved = result.totals[goal];
            let target = if goal == "cost" { 600.0 } else { 6500.0 };
            // achieved + under - over == target, within rounding of the
            // 1-decimal reported values
            assert!(
                (achieved + deviation.under - deviation.over - target).abs() < 0.2,
                "{goal}: {achieved} + {} - {} != {target}",
                deviation.under,
                deviation.over
            );
        }
    }

    #[test]
    fn test_raising_a_weight_never_worsens_that_goal() {
        let catalog = catalog(&[
            ("S1", 40, &[("cost", 10.0), ("water", 120.0)]),
            ("S2", 30, &[("cost", 8.0), ("water", 150.0)]),
            ("S3", 50, &[("cost", 12.0), ("water", 90.0)]),
        ]);

        let deviation_for = |cost_weight: f64| {
            let result = run(
                &catalog,
                60.0,
                vec![
                    GoalSpec::new("cost", cost_weight, 550.0),
                    GoalSpec::new("water", 1.0, 6000.0),
                ],
                Scenario::Average,
            );
            assert_eq!(result.status, ResultStatus::Optimal);
            let d = result.deviations["cost"];
            d.over + d.under
        };

        let baseline = deviation_for(1.0);
        let raised = deviation_for(10.0);
        assert!(
            raised <= baseline + 1e-9,
            "raising the cost weight worsened its deviation: {baseline} -> {raised}"
        );
    }

    #[test]
    fn test_zero_weight_goal_stays_constrained_and_reported() {
        let catalog = catalog(&[
            ("S1", 40, &[("cost", 10.0), ("water", 120.0)]),
            ("S2", 30, &[("cost", 8.0), ("water", 150.0)]),
        ]);

        let result = run(
            &catalog,
            50.0,
            vec![
                GoalSpec::new("cost", 1.0, 460.0),
                GoalSpec::new("water", 0.0, 0.0),
            ],
            Scenario::Average,
        );

        assert_eq!(result.status, ResultStatus::Optimal);
        // inert in the objective, but still measured
        assert!(result.totals.contains_key("water"));
        assert!(result.deviations.contains_key("water"));
    }

    #[test]
    fn test_high_scenario_unlocks_extra_capacity() {
        // Demand 55 needs more than the average-yield capacity of 50.
        let records = vec![SupplierRecord::derived(
            "S1",
            10.0,
            5.0,
            BTreeMap::from([("cost".to_string(), 10.0)]),
        )];
        let catalog = Catalog::new(records).unwrap();
        let goals = vec![GoalSpec::new("cost", 1.0, 550.0)];

        let average = run(&catalog, 55.0, goals.clone(), Scenario::Average);
        let high = run(&catalog, 55.0, goals, Scenario::High);

        assert_eq!(average.status, ResultStatus::Infeasible);
        assert_eq!(high.status, ResultStatus::Optimal);
        assert_eq!(high.purchase[0].quantity, 55);
    }

    #[test]
    fn test_goal_metric_missing_from_catalog_is_an_input_error() {
        let catalog = catalog(&[("S1", 40, &[("cost", 10.0)])]);
        let goal_set = GoalSet::build(vec![GoalSpec::new("carbon", 1.0, 100.0)]).unwrap();

        let result = optimize(
            &catalog,
            10.0,
            &goal_set,
            Scenario::Average,
            &Solver::new(),
            &SolveOptions::default(),
        );

        assert!(matches!(result, Err(ModelError::Goals(_))));
    }

    struct StuckBackend;

    impl SolverBackend for StuckBackend {
        fn solve(&self, _problem: &Problem) -> Solution {
            std::thread::sleep(std::time::Duration::from_millis(500));
            Solution::infeasible()
        }
    }

    #[test]
    fn test_timeout_surfaces_as_infeasible_with_timeout_reason() {
        let catalog = catalog(&[("S1", 40, &[("cost", 10.0)])]);
        let goal_set = GoalSet::build(vec![GoalSpec::new("cost", 1.0, 100.0)]).unwrap();
        let solver = Solver::with_backend(StuckBackend);
        let options = SolveOptions::with_timeout(std::time::Duration::from_millis(20));

        let result = optimize(&catalog, 10.0, &goal_set, Scenario::Average, &solver, &options)
            .unwrap();

        assert_eq!(result.status, ResultStatus::Infeasible);
        assert_eq!(result.reason, Some(FailureReason::Timeout));
    }
}
