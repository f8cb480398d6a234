//! Linear model primitives.
//!
//! A [`Model`] is a minimization problem over bounded variables subject to
//! linear constraints. Variable and constraint identifiers are dense indices
//! assigned in insertion order, so two builds over the same input produce
//! identical models.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Identifier of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identifier of a model constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(usize);

impl ConstraintId {
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Domain of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

/// A bounded decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    /// May be `f64::INFINITY`.
    pub upper: f64,
}

impl Variable {
    pub fn is_binary(&self) -> bool {
        self.kind == VarKind::Binary
    }

    /// Returns true if `value` lies within bounds and matches the domain.
    pub fn admits(&self, value: f64, tolerance: f64) -> bool {
        if !value.is_finite() || value < self.lower - tolerance || value > self.upper + tolerance {
            return false;
        }
        match self.kind {
            VarKind::Continuous => true,
            VarKind::Binary | VarKind::Integer => (value - value.round()).abs() <= tolerance,
        }
    }
}

/// A sparse linear expression `Σ coef·var + constant`.
///
/// Terms are kept sorted by variable id; zero coefficients are dropped.
///
/// # Example
///
/// ```
/// use fleetplan_model::{LinearExpr, VarId};
///
/// let x = VarId::from_index(0);
/// let y = VarId::from_index(1);
///
/// let mut expr = LinearExpr::new();
/// expr.add_term(x, 2.0);
/// expr.add_term(y, -1.0);
/// expr.add_term(x, 1.0);
///
/// assert_eq!(expr.coefficient(x), 3.0);
/// assert_eq!(expr.evaluate(&[1.0, 4.0]), -1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, f64>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_terms(terms: impl IntoIterator<Item = (VarId, f64)>) -> Self {
        let mut expr = Self::new();
        for (var, coef) in terms {
            expr.add_term(var, coef);
        }
        expr
    }

    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = constant;
        self
    }

    /// Adds `coef·var`, merging with an existing term for the same variable.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef == 0.0 {
            return;
        }
        let entry = self.terms.entry(var).or_insert(0.0);
        *entry += coef;
        if *entry == 0.0 {
            self.terms.remove(&var);
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Terms in ascending variable order.
    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|(&var, &coef)| (var, coef))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression. Variables beyond `values` count as zero.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }
}

/// The operational rule a constraint encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintFamily {
    /// A flight is flown by exactly one combination or cancelled.
    Uniqueness,
    /// A flight without eligible combinations is cancelled.
    ForcedCancellation,
    /// Departure minute equals the start of the chosen slot.
    DepartureLink,
    /// Delay is at least departure minus scheduled departure.
    DelayLink,
    /// The SLA indicator is set when departure passes the deadline.
    SlaLink,
    /// An aircraft flies one flight at a time, plus turnaround.
    AircraftOverlap,
    /// A crew flies one flight at a time, plus minimum rest.
    CrewRest,
    /// Crew flight hours within a duty reference window stay under the limit.
    DutyWindow,
    /// Overtime hours are at least hours flown above standard duty.
    Overtime,
    /// Maintenance overrun is at least hours flown beyond maintenance due.
    MaintenanceHours,
}

impl ConstraintFamily {
    pub const ALL: [ConstraintFamily; 10] = [
        ConstraintFamily::Uniqueness,
        ConstraintFamily::ForcedCancellation,
        ConstraintFamily::DepartureLink,
        ConstraintFamily::DelayLink,
        ConstraintFamily::SlaLink,
        ConstraintFamily::AircraftOverlap,
        ConstraintFamily::CrewRest,
        ConstraintFamily::DutyWindow,
        ConstraintFamily::Overtime,
        ConstraintFamily::MaintenanceHours,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintFamily::Uniqueness => "uniqueness",
            ConstraintFamily::ForcedCancellation => "forced_cancellation",
            ConstraintFamily::DepartureLink => "departure_link",
            ConstraintFamily::DelayLink => "delay_link",
            ConstraintFamily::SlaLink => "sla_link",
            ConstraintFamily::AircraftOverlap => "aircraft_overlap",
            ConstraintFamily::CrewRest => "crew_rest",
            ConstraintFamily::DutyWindow => "duty_window",
            ConstraintFamily::Overtime => "overtime",
            ConstraintFamily::MaintenanceHours => "maintenance_hours",
        }
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named linear relation `expr (sense) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub family: ConstraintFamily,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(
        name: impl Into<String>,
        family: ConstraintFamily,
        expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            family,
            expr,
            sense,
            rhs,
        }
    }

    /// Amount by which `values` violate the constraint; zero when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.violation(values) <= tolerance
    }
}

/// A minimization model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        kind: VarKind,
        lower: f64,
        upper: f64,
    ) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name: name.into(),
            kind,
            lower,
            upper,
        });
        id
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name, VarKind::Binary, 0.0, 1.0)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> ConstraintId {
        let id = ConstraintId(self.constraints.len());
        self.constraints.push(constraint);
        id
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.0)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id.0)
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Looks up a variable by name.
    pub fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.name == name)
            .map(VarId)
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Constraints whose violation exceeds `tolerance`.
    pub fn violated_constraints(&self, values: &[f64], tolerance: f64) -> Vec<ConstraintId> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_satisfied(values, tolerance))
            .map(|(i, _)| ConstraintId(i))
            .collect()
    }

    /// Returns true if `values` respect every bound, domain and constraint.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(var, &value)| var.admits(value, tolerance))
            && self
                .constraints
                .iter()
                .all(|c| c.is_satisfied(values, tolerance))
    }

    /// Number of constraints per family.
    pub fn family_counts(&self) -> BTreeMap<ConstraintFamily, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.constraints {
            *counts.entry(c.family).or_insert(0) += 1;
        }
        counts
    }

    /// Maps each variable to the constraints it appears in.
    pub fn occurrences(&self) -> HashMap<VarId, Vec<ConstraintId>> {
        let mut map: HashMap<VarId, Vec<ConstraintId>> = HashMap::new();
        for (i, c) in self.constraints.iter().enumerate() {
            for (var, _) in c.expr.terms() {
                map.entry(var).or_default().push(ConstraintId(i));
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> (Model, VarId, VarId) {
        let mut model = Model::new("test");
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        model.add_constraint(Constraint::new(
            "pick_one",
            ConstraintFamily::Uniqueness,
            LinearExpr::from_terms([(x, 1.0), (y, 1.0)]),
            Sense::Eq,
            1.0,
        ));
        model.set_objective(LinearExpr::from_terms([(x, 3.0), (y, 5.0)]));
        (model, x, y)
    }

    #[test]
    fn test_linear_expr_cancels_terms() {
        let x = VarId::from_index(0);
        let mut expr = LinearExpr::new();
        expr.add_term(x, 2.0);
        expr.add_term(x, -2.0);
        assert!(expr.is_empty());
        assert_eq!(expr.coefficient(x), 0.0);
    }

    #[test]
    fn test_linear_expr_constant() {
        let x = VarId::from_index(1);
        let expr = LinearExpr::from_terms([(x, 2.0)]).with_constant(-3.0);
        assert_eq!(expr.evaluate(&[7.0, 2.0]), 1.0);
    }

    #[test]
    fn test_violation() {
        let x = VarId::from_index(0);
        let c = Constraint::new(
            "cap",
            ConstraintFamily::DutyWindow,
            LinearExpr::from_terms([(x, 2.0)]),
            Sense::Le,
            3.0,
        );
        assert_eq!(c.violation(&[1.0]), 0.0);
        assert_eq!(c.violation(&[2.0]), 1.0);
        assert!(!c.is_satisfied(&[2.0], 1e-6));
    }

    #[test]
    fn test_model_feasibility() {
        let (model, _, _) = knapsack();
        assert!(model.is_feasible(&[1.0, 0.0], 1e-6));
        assert!(!model.is_feasible(&[1.0, 1.0], 1e-6));
        assert!(!model.is_feasible(&[0.5, 0.5], 1e-6));
        assert!(!model.is_feasible(&[1.0], 1e-6));
        assert_eq!(model.violated_constraints(&[0.0, 0.0], 1e-6).len(), 1);
    }

    #[test]
    fn test_model_objective() {
        let (model, x, y) = knapsack();
        assert_eq!(model.objective_value(&[0.0, 1.0]), 5.0);
        assert_eq!(model.find_variable("y"), Some(y));
        assert_eq!(model.occurrences()[&x], vec![ConstraintId::from_index(0)]);
        assert_eq!(model.family_counts()[&ConstraintFamily::Uniqueness], 1);
    }
}
