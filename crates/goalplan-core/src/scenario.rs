use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::supplier::{CapacitySpec, Catalog};

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Unknown yield scenario: {0} (expected average, high, or low)")]
    Unknown(String),
}

/// Named yield sensitivity scenario. The multiplier applies to the yield
/// component of derived capacities only; fixed capacities are untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Average,
    High,
    Low,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Average, Scenario::High, Scenario::Low];

    pub fn multiplier(self) -> f64 {
        match self {
            Scenario::Average => 1.0,
            Scenario::High => 1.2,
            Scenario::Low => 0.8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Average => "average",
            Scenario::High => "high",
            Scenario::Low => "low",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "average" => Ok(Scenario::Average),
            "high" => Ok(Scenario::High),
            "low" => Ok(Scenario::Low),
            other => Err(ScenarioError::Unknown(other.to_string())),
        }
    }
}

/// Capacity of each supplier under the given scenario, in catalog order.
///
/// Derived capacities scale their yield first, then take the floor of
/// `farm_size * adjusted_yield`. Side-effect free: the catalog is never
/// mutated.
pub fn adjusted_capacities(catalog: &Catalog, scenario: Scenario) -> Vec<u32> {
    catalog
        .records()
        .iter()
        .map(|record| match record.capacity {
            CapacitySpec::Fixed(units) => units,
            CapacitySpec::Derived {
                farm_size,
                yield_per_unit_area,
            } => (farm_size * (yield_per_unit_area * scenario.multiplier())).floor() as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supplier::SupplierRecord;
    use std::collections::BTreeMap;

    fn derived(id: &str, farm_size: f64, yield_per_unit_area: f64) -> SupplierRecord {
        SupplierRecord::derived(id, farm_size, yield_per_unit_area, BTreeMap::new())
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.name().parse::<Scenario>().unwrap(), scenario);
        }
        assert!(matches!(
            "pessimistic".parse::<Scenario>(),
            Err(ScenarioError::Unknown(s)) if s == "pessimistic"
        ));
    }

    #[test]
    fn test_high_scenario_scales_yield_before_flooring() {
        let catalog = Catalog::new(vec![derived("S1", 10.0, 5.0)]).unwrap();

        assert_eq!(adjusted_capacities(&catalog, Scenario::High), vec![60]);
        assert_eq!(adjusted_capacities(&catalog, Scenario::Average), vec![50]);
        assert_eq!(adjusted_capacities(&catalog, Scenario::Low), vec![40]);
    }

    #[test]
    fn test_fixed_capacity_passes_through() {
        let catalog =
            Catalog::new(vec![SupplierRecord::fixed("S1", 40, BTreeMap::new())]).unwrap();

        for scenario in Scenario::ALL {
            assert_eq!(adjusted_capacities(&catalog, scenario), vec![40]);
        }
    }

    #[test]
    fn test_scenario_capacity_ordering() {
        // low <= average <= high for every derived supplier
        let catalog = Catalog::new(vec![
            derived("S1", 7.3, 4.1),
            derived("S2", 12.0, 9.9),
            derived("S3", 0.5, 3.0),
        ])
        .unwrap();

        let low = adjusted_capacities(&catalog, Scenario::Low);
        let average = adjusted_capacities(&catalog, Scenario::Average);
        let high = adjusted_capacities(&catalog, Scenario::High);

        for i in 0..catalog.len() {
            assert!(low[i] <= average[i]);
            assert!(average[i] <= high[i]);
        }
    }
}
