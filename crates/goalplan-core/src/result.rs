use std::collections::BTreeMap;

use goalplan_solver::{Solution, SolveStatus};
use serde::Serialize;

use crate::goal::GoalSet;
use crate::model::GoalModel;
use crate::supplier::{CapacitySpec, Catalog, SupplierRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Optimal,
    Infeasible,
}

/// Why a non-optimal outcome happened, so callers can tell "no solution
/// exists" from "could not determine in time".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    Infeasible,
    Unbounded,
    Timeout,
    Cancelled,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseLine {
    pub supplier_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deviation {
    pub over: f64,
    pub under: f64,
}

/// Canonical output record of one optimization call, plain data ready for
/// any presentation layer. A non-optimal outcome carries only the status and
/// reason; partial results are never surfaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Purchased quantities, descending; ties keep catalog order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub purchase: Vec<PurchaseLine>,
    /// Goal name -> achieved weighted sum, rounded to 1 decimal
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub totals: BTreeMap<String, f64>,
    /// Goal name -> (over, under), rounded to 1 decimal
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub deviations: BTreeMap<String, Deviation>,
    /// Catalog rows of purchased suppliers, attributes rounded to 1
    /// decimal, in purchase-list order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected_suppliers: Vec<SupplierRecord>,
}

impl OptimizationResult {
    pub fn failed(reason: FailureReason) -> Self {
        Self {
            status: ResultStatus::Infeasible,
            reason: Some(reason),
            purchase: Vec::new(),
            totals: BTreeMap::new(),
            deviations: BTreeMap::new(),
            selected_suppliers: Vec::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == ResultStatus::Optimal
    }
}

/// Converts a solved model into the canonical result record.
///
/// Totals are recomputed from the integer-rounded assignment rather than
/// taken from the solver's deviation values, so reported totals and the
/// purchase list cannot drift apart. Deterministic: the same solution
/// always extracts to an identical record.
pub fn extract(
    model: &GoalModel,
    solution: &Solution,
    catalog: &Catalog,
    goal_set: &GoalSet,
) -> OptimizationResult {
    match solution.status {
        SolveStatus::Optimal => {}
        SolveStatus::Infeasible => return OptimizationResult::failed(FailureReason::Infeasible),
        SolveStatus::Unbounded => return OptimizationResult::failed(FailureReason::Unbounded),
        SolveStatus::TimedOut => return OptimizationResult::failed(FailureReason::Timeout),
        SolveStatus::Cancelled => return OptimizationResult::failed(FailureReason::Cancelled),
        SolveStatus::Error => return OptimizationResult::failed(FailureReason::Error),
    }

    // Integer variables can come back as e.g. 29.999999994; snap them before
    // any downstream sums to avoid accumulating sub-unit drift.
    let quantities: Vec<i64> = model
        .supplier_columns()
        .iter()
        .map(|&column| solution.values[column].round() as i64)
        .collect();

    let mut purchase_order: Vec<usize> = (0..catalog.len())
        .filter(|&i| quantities[i] > 0)
        .collect();
    // sort_by is stable, so equal quantities keep catalog order
    purchase_order.sort_by(|&a, &b| quantities[b].cmp(&quantities[a]));

    let purchase: Vec<PurchaseLine> = purchase_order
        .iter()
        .map(|&i| PurchaseLine {
            supplier_id: catalog.records()[i].id.clone(),
            quantity: quantities[i] as u32,
        })
        .collect();

    let mut totals = BTreeMap::new();
    let mut deviations = BTreeMap::new();
    for (goal, columns) in goal_set.goals().iter().zip(model.deviation_columns()) {
        let achieved: f64 = catalog
            .records()
            .iter()
            .zip(&quantities)
            .map(|(record, &quantity)| goal_set.coefficient(goal, record) * quantity as f64)
            .sum();
        totals.insert(goal.name.clone(), round1(achieved));
        deviations.insert(
            goal.name.clone(),
            Deviation {
                over: round1(solution.values[columns.over]),
                under: round1(solution.values[columns.under]),
            },
        );
    }

    let selected_suppliers = purchase_order
        .iter()
        .map(|&i| rounded_record(&catalog.records()[i]))
        .collect();

    OptimizationResult {
        status: ResultStatus::Optimal,
        reason: None,
        purchase,
        totals,
        deviations,
        selected_suppliers,
    }
}

/// Rounds to 1 decimal place, the presentation precision of every real
/// value in the result record.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn rounded_record(record: &SupplierRecord) -> SupplierRecord {
    SupplierRecord {
        id: record.id.clone(),
        capacity: match record.capacity {
            CapacitySpec::Fixed(units) => CapacitySpec::Fixed(units),
            CapacitySpec::Derived {
                farm_size,
                yield_per_unit_area,
            } => CapacitySpec::Derived {
                farm_size: round1(farm_size),
                yield_per_unit_area: round1(yield_per_unit_area),
            },
        },
        metrics: record
            .metrics
            .iter()
            .map(|(name, &value)| (name.clone(), round1(value)))
            .collect(),
    }
}
