use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use goalplan_core::{CapacitySpec, Catalog, CatalogError, SupplierRecord};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: supplier_id")]
    MissingIdColumn,
    #[error("Row {row}: {column} is not a usable number: {value:?}")]
    BadNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error(
        "Row {row}: supplier {id} needs either a capacity column or both \
         farm_size and yield_per_unit_area"
    )]
    MissingCapacity { row: usize, id: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

const ID_COLUMN: &str = "supplier_id";
const CAPACITY_COLUMN: &str = "capacity";
const FARM_SIZE_COLUMN: &str = "farm_size";
const YIELD_COLUMN: &str = "yield_per_unit_area";

/// Reads a supplier catalog from a CSV file.
///
/// `supplier_id` is required. A `capacity` column gives a fixed capacity;
/// `farm_size` plus `yield_per_unit_area` give a scenario-derived one. Every
/// other column is a per-unit metric that goals can reference by header
/// name. Blank cells mean "absent", so one file can mix both capacity forms.
pub fn read_catalog(path: &Path) -> Result<Catalog, IngestError> {
    read_catalog_from(csv::Reader::from_path(path)?)
}

pub fn read_catalog_from<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Catalog, IngestError> {
    let headers = reader.headers()?.clone();
    let id_index = headers
        .iter()
        .position(|h| h.trim() == ID_COLUMN)
        .ok_or(IngestError::MissingIdColumn)?;

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let row_number = line + 2; // 1-based, after the header row

        let id = row.get(id_index).unwrap_or("").trim().to_string();
        let mut capacity_units = None;
        let mut farm_size = None;
        let mut yield_per_unit_area = None;
        let mut metrics = BTreeMap::new();

        for (index, header) in headers.iter().enumerate() {
            if index == id_index {
                continue;
            }
            let header = header.trim();
            let cell = row.get(index).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| IngestError::BadNumber {
                row: row_number,
                column: header.to_string(),
                value: cell.to_string(),
            })?;
            match header {
                CAPACITY_COLUMN => {
                    if !value.is_finite() || value < 0.0 {
                        return Err(IngestError::BadNumber {
                            row: row_number,
                            column: header.to_string(),
                            value: cell.to_string(),
                        });
                    }
                    capacity_units = Some(value.floor() as u32);
                }
                FARM_SIZE_COLUMN => farm_size = Some(value),
                YIELD_COLUMN => yield_per_unit_area = Some(value),
                _ => {
                    metrics.insert(header.to_string(), value);
                }
            }
        }

        let capacity = match (capacity_units, farm_size, yield_per_unit_area) {
            (Some(units), _, _) => CapacitySpec::Fixed(units),
            (None, Some(farm_size), Some(yield_per_unit_area)) => CapacitySpec::Derived {
                farm_size,
                yield_per_unit_area,
            },
            _ => {
                return Err(IngestError::MissingCapacity {
                    row: row_number,
                    id,
                })
            }
        };

        records.push(SupplierRecord {
            id,
            capacity,
            metrics,
        });
    }

    Ok(Catalog::new(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(csv: &str) -> Result<Catalog, IngestError> {
        read_catalog_from(csv::Reader::from_reader(csv.as_bytes()))
    }

    #[test]
    fn test_mixed_capacity_forms() {
        let catalog = read(
            "supplier_id,capacity,farm_size,yield_per_unit_area,cost,water\n\
             S1,40,,,10.0,120\n\
             S2,,10.0,5.0,8.0,150\n",
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].capacity, CapacitySpec::Fixed(40));
        assert_eq!(
            catalog.records()[1].capacity,
            CapacitySpec::Derived {
                farm_size: 10.0,
                yield_per_unit_area: 5.0
            }
        );
        assert_eq!(catalog.records()[0].metrics["water"], 120.0);
    }

    #[test]
    fn test_missing_id_column() {
        let result = read("name,capacity,cost\nS1,40,10\n");

        assert!(matches!(result, Err(IngestError::MissingIdColumn)));
    }

    #[test]
    fn test_row_without_any_capacity_form() {
        let result = read(
            "supplier_id,capacity,farm_size,cost\n\
             S1,,3.0,10\n",
        );

        assert!(matches!(
            result,
            Err(IngestError::MissingCapacity { row: 2, id }) if id == "S1"
        ));
    }

    #[test]
    fn test_unparsable_cell() {
        let result = read("supplier_id,capacity,cost\nS1,forty,10\n");

        assert!(matches!(
            result,
            Err(IngestError::BadNumber { row: 2, column, .. }) if column == "capacity"
        ));
    }

    #[test]
    fn test_negative_capacity_is_rejected() {
        let result = read("supplier_id,capacity,cost\nS1,-5,10\n");

        assert!(matches!(result, Err(IngestError::BadNumber { .. })));
    }

    #[test]
    fn test_duplicate_ids_are_rejected_by_catalog_validation() {
        let result = read(
            "supplier_id,capacity,cost\n\
             S1,40,10\n\
             S1,30,8\n",
        );

        assert!(matches!(
            result,
            Err(IngestError::Catalog(CatalogError::DuplicateId(_)))
        ));
    }
}
