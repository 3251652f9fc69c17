pub mod goal;
pub mod model;
pub mod optimize;
pub mod result;
pub mod scenario;
pub mod supplier;

pub use goal::{GoalSet, GoalSetError, GoalSpec};
pub use model::{DeviationColumns, GoalModel, ModelError};
pub use optimize::optimize;
pub use result::{
    extract, Deviation, FailureReason, OptimizationResult, PurchaseLine, ResultStatus,
};
pub use scenario::{adjusted_capacities, Scenario, ScenarioError};
pub use supplier::{CapacitySpec, Catalog, CatalogError, SupplierRecord};
