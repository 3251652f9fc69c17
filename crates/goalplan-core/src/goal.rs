use thiserror::Error;

use crate::supplier::{Catalog, SupplierRecord};

#[derive(Error, Debug)]
pub enum GoalSetError {
    #[error("Goal set must contain at least one goal")]
    Empty,
    #[error("Duplicate goal name: {0}")]
    DuplicateName(String),
    #[error("Goal {name}: weight must be finite and non-negative (got {weight})")]
    InvalidWeight { name: String, weight: f64 },
    #[error("Goal {name}: target must be finite (got {target})")]
    InvalidTarget { name: String, target: f64 },
    #[error("Goal {goal}: supplier {supplier} has no metric named {metric}")]
    MissingMetric {
        goal: String,
        supplier: String,
        metric: String,
    },
}

/// One goal of the goal program: steer the weighted sum of a supplier metric
/// toward a target value.
#[derive(Debug, Clone)]
pub struct GoalSpec {
    /// Unique key; also names the goal's constraint and deviation variables
    pub name: String,
    /// Which supplier metric this goal draws its coefficients from
    pub metric: String,
    /// Penalty per unit of deviation; 0 leaves the goal constrained but
    /// inert in the objective
    pub weight: f64,
    /// Value the weighted sum is steered toward
    pub target: f64,
}

impl GoalSpec {
    /// Goal whose metric key equals its name (the common case).
    pub fn new(name: impl Into<String>, weight: f64, target: f64) -> Self {
        let name = name.into();
        Self {
            metric: name.clone(),
            name,
            weight,
            target,
        }
    }

    pub fn with_metric(
        name: impl Into<String>,
        metric: impl Into<String>,
        weight: f64,
        target: f64,
    ) -> Self {
        Self {
            name: name.into(),
            metric: metric.into(),
            weight,
            target,
        }
    }
}

/// Ordered, name-unique collection of goals.
///
/// Iteration order is insertion order and fixes the order of objective terms
/// and goal constraints, so two builds from the same specs present the model
/// identically to the solver.
#[derive(Debug, Clone)]
pub struct GoalSet {
    goals: Vec<GoalSpec>,
}

impl GoalSet {
    pub fn build(goals: Vec<GoalSpec>) -> Result<Self, GoalSetError> {
        if goals.is_empty() {
            return Err(GoalSetError::Empty);
        }
        let mut seen = std::collections::HashSet::new();
        for goal in &goals {
            if !seen.insert(goal.name.clone()) {
                return Err(GoalSetError::DuplicateName(goal.name.clone()));
            }
            if !goal.weight.is_finite() || goal.weight < 0.0 {
                return Err(GoalSetError::InvalidWeight {
                    name: goal.name.clone(),
                    weight: goal.weight,
                });
            }
            if !goal.target.is_finite() {
                return Err(GoalSetError::InvalidTarget {
                    name: goal.name.clone(),
                    target: goal.target,
                });
            }
        }
        Ok(Self { goals })
    }

    pub fn goals(&self) -> &[GoalSpec] {
        &self.goals
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Checks every goal's metric key exists on every supplier. Called once
    /// at model build; coefficient lookups afterwards cannot miss.
    pub fn validate_against(&self, catalog: &Catalog) -> Result<(), GoalSetError> {
        for goal in &self.goals {
            for record in catalog.records() {
                if !record.metrics.contains_key(&goal.metric) {
                    return Err(GoalSetError::MissingMetric {
                        goal: goal.name.clone(),
                        supplier: record.id.clone(),
                        metric: goal.metric.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Per-unit contribution of `record` to `goal`, 0 when the metric is
    /// absent (ruled out by [`GoalSet::validate_against`]).
    pub fn coefficient(&self, goal: &GoalSpec, record: &SupplierRecord) -> f64 {
        record.metrics.get(&goal.metric).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_build_preserves_order() {
        let set = GoalSet::build(vec![
            GoalSpec::new("cost", 1.0, 500.0),
            GoalSpec::new("water", 2.0, 300.0),
        ])
        .unwrap();

        let names: Vec<&str> = set.goals().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["cost", "water"]);
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert!(matches!(GoalSet::build(vec![]), Err(GoalSetError::Empty)));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let result = GoalSet::build(vec![
            GoalSpec::new("cost", 1.0, 500.0),
            GoalSpec::new("cost", 2.0, 400.0),
        ]);

        assert!(matches!(result, Err(GoalSetError::DuplicateName(n)) if n == "cost"));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let result = GoalSet::build(vec![GoalSpec::new("cost", -1.0, 500.0)]);

        assert!(matches!(result, Err(GoalSetError::InvalidWeight { .. })));
    }

    #[test]
    fn test_non_finite_target_is_rejected() {
        let result = GoalSet::build(vec![GoalSpec::new("cost", 1.0, f64::INFINITY)]);

        assert!(matches!(result, Err(GoalSetError::InvalidTarget { .. })));
    }

    #[test]
    fn test_zero_weight_is_allowed() {
        assert!(GoalSet::build(vec![GoalSpec::new("cost", 0.0, 500.0)]).is_ok());
    }

    #[test]
    fn test_missing_metric_is_caught_by_validation() {
        let catalog = Catalog::new(vec![crate::supplier::SupplierRecord::fixed(
            "S1",
            40,
            BTreeMap::from([("cost".to_string(), 10.0)]),
        )])
        .unwrap();
        let set = GoalSet::build(vec![GoalSpec::new("water", 1.0, 300.0)]).unwrap();

        assert!(matches!(
            set.validate_against(&catalog),
            Err(GoalSetError::MissingMetric { metric, .. }) if metric == "water"
        ));
    }
}
