use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Supplier catalog is empty")]
    Empty,
    #[error("Duplicate supplier id: {0}")]
    DuplicateId(String),
    #[error("Supplier {id}: {field} must be a finite, non-negative number (got {value})")]
    InvalidCapacityInput {
        id: String,
        field: &'static str,
        value: f64,
    },
    #[error("Supplier {id}: metric {metric} is not a finite number (got {value})")]
    NonFiniteMetric {
        id: String,
        metric: String,
        value: f64,
    },
}

/// How many units a supplier can provide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacitySpec {
    /// Directly specified number of units; unaffected by yield scenarios
    Fixed(u32),
    /// Derived from growing area and yield; sensitive to yield scenarios
    Derived {
        farm_size: f64,
        yield_per_unit_area: f64,
    },
}

/// One supplier row: a stable id, a capacity, and per-unit contributions to
/// each named metric (cost per unit, water per unit, ...). Metrics are keyed
/// by name so any number of goals can reference them; the `BTreeMap` keeps
/// serialized output in a deterministic key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierRecord {
    pub id: String,
    pub capacity: CapacitySpec,
    pub metrics: BTreeMap<String, f64>,
}

impl SupplierRecord {
    pub fn fixed(id: impl Into<String>, capacity: u32, metrics: BTreeMap<String, f64>) -> Self {
        Self {
            id: id.into(),
            capacity: CapacitySpec::Fixed(capacity),
            metrics,
        }
    }

    pub fn derived(
        id: impl Into<String>,
        farm_size: f64,
        yield_per_unit_area: f64,
        metrics: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            id: id.into(),
            capacity: CapacitySpec::Derived {
                farm_size,
                yield_per_unit_area,
            },
            metrics,
        }
    }
}

/// Immutable, validated per-run view of the supplier rows.
///
/// Validation happens once here; downstream stages (scenario adjustment,
/// model construction, extraction) trust the records without re-checking.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<SupplierRecord>,
}

impl Catalog {
    pub fn new(records: Vec<SupplierRecord>) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id.clone()) {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
            if let CapacitySpec::Derived {
                farm_size,
                yield_per_unit_area,
            } = record.capacity
            {
                for (field, value) in [
                    ("farm_size", farm_size),
                    ("yield_per_unit_area", yield_per_unit_area),
                ] {
                    if !value.is_finite() || value < 0.0 {
                        return Err(CatalogError::InvalidCapacityInput {
                            id: record.id.clone(),
                            field,
                            value,
                        });
                    }
                }
            }
            for (metric, &value) in &record.metrics {
                if !value.is_finite() {
                    return Err(CatalogError::NonFiniteMetric {
                        id: record.id.clone(),
                        metric: metric.clone(),
                        value,
                    });
                }
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[SupplierRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_valid_catalog() {
        let catalog = Catalog::new(vec![
            SupplierRecord::fixed("S1", 40, metrics(&[("cost", 10.0)])),
            SupplierRecord::derived("S2", 10.0, 5.0, metrics(&[("cost", 8.0)])),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[1].id, "S2");
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        assert!(matches!(Catalog::new(vec![]), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let result = Catalog::new(vec![
            SupplierRecord::fixed("S1", 40, metrics(&[])),
            SupplierRecord::fixed("S1", 30, metrics(&[])),
        ]);

        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "S1"));
    }

    #[test]
    fn test_negative_farm_size_is_rejected() {
        let result = Catalog::new(vec![SupplierRecord::derived("S1", -1.0, 5.0, metrics(&[]))]);

        assert!(matches!(
            result,
            Err(CatalogError::InvalidCapacityInput { field: "farm_size", .. })
        ));
    }

    #[test]
    fn test_non_finite_metric_is_rejected() {
        let result = Catalog::new(vec![SupplierRecord::fixed(
            "S1",
            40,
            metrics(&[("cost", f64::NAN)]),
        )]);

        assert!(matches!(result, Err(CatalogError::NonFiniteMetric { .. })));
    }
}
