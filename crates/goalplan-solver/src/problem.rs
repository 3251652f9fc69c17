/// Represents a mixed-integer linear program as plain data.
///
/// Built by a modelling layer, handed to a [`crate::SolverBackend`]. Nothing
/// here is specific to any solver; backends translate this into their own
/// structures at solve time.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    /// Variable definitions, one per column
    pub variables: Vec<VariableDef>,
    /// Objective function
    pub objective: Objective,
    /// Constraints (rows)
    pub constraints: Vec<Constraint>,
}

/// A single decision variable.
#[derive(Debug, Clone)]
pub struct VariableDef {
    /// Name used in constraint diagnostics
    pub name: String,
    /// Continuous or integer
    pub kind: VarKind,
    /// Lower bound
    pub min: f64,
    /// Upper bound, unbounded above when `None`
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Integer,
}

#[derive(Debug, Clone, Default)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable with no upper bound and returns its column index.
    ///
    /// Variables must all be added before the objective and constraints are
    /// set, since those are indexed by column.
    pub fn add_variable(&mut self, name: impl Into<String>, kind: VarKind, min: f64) -> usize {
        let column = self.variables.len();
        self.variables.push(VariableDef {
            name: name.into(),
            kind,
            min,
            max: None,
        });
        column
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        debug_assert_eq!(coefficients.len(), self.variables.len());
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        debug_assert_eq!(coefficients.len(), self.variables.len());
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}
