//! Exhaustive backend for small models.
//!
//! Branches depth-first over every binary variable (0 before 1, in variable
//! order) and completes the remaining variables at each leaf by propagation.
//! Continuous and integer variables must be determined by equality rows or
//! pushed to their smallest feasible value by `≥` rows; this holds for every
//! model the builder produces, since their objective weights are non-negative.
//!
//! Ties keep the first optimum found.

use std::collections::HashMap;
use std::time::Instant;

use fleetplan_model::{
    BackendError, BackendOutcome, BackendSession, BackendStatus, CancellationToken, ConstraintId,
    Model, Sense, SolveLimits, SolverBackend, VarId, VarKind,
};

const FEASIBILITY_TOL: f64 = 1e-6;

/// Solves models by enumeration. Suitable for a few dozen binaries.
#[derive(Debug, Clone, Default)]
pub struct EnumerationBackend {
    node_limit: Option<u64>,
}

impl EnumerationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops with [`BackendStatus::TimeLimit`] after visiting `limit` nodes.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }
}

impl SolverBackend for EnumerationBackend {
    type Session = EnumerationSession;

    fn name(&self) -> &str {
        "enumeration"
    }

    fn open_session(&self, _limits: &SolveLimits) -> Result<Self::Session, BackendError> {
        Ok(EnumerationSession {
            node_limit: self.node_limit,
        })
    }
}

pub struct EnumerationSession {
    node_limit: Option<u64>,
}

impl BackendSession for EnumerationSession {
    fn solve(
        &mut self,
        model: &Model,
        limits: &SolveLimits,
        cancel: &CancellationToken,
    ) -> Result<BackendOutcome, BackendError> {
        let mut search = Search::new(model, limits, cancel, self.node_limit)?;
        search.descend(0, 0.0);

        let incumbent = search.best.take();
        let nodes = search.nodes;
        let outcome = match search.stop {
            Some(Stop::Cancelled) => BackendOutcome::stopped(BackendStatus::Interrupted, incumbent)
                .with_message(format!("cancelled after {nodes} nodes")),
            Some(Stop::Time) => BackendOutcome::stopped(BackendStatus::TimeLimit, incumbent)
                .with_message(format!("time limit reached after {nodes} nodes")),
            Some(Stop::Nodes) => BackendOutcome::stopped(BackendStatus::TimeLimit, incumbent)
                .with_message(format!("node limit reached after {nodes} nodes")),
            None => match incumbent {
                Some((values, objective)) => BackendOutcome::optimal(values, objective),
                None => BackendOutcome::infeasible(),
            },
        };
        Ok(outcome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Cancelled,
    Time,
    Nodes,
}

struct Search<'m> {
    model: &'m Model,
    cancel: &'m CancellationToken,
    gap: f64,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    completion: Completion<'m>,
    binaries: Vec<VarId>,
    /// Rows over binaries only, per binary position.
    rows_of: Vec<Vec<ConstraintId>>,
    /// Objective contribution of everything but fixed binaries, from position i on.
    suffix_bound: Vec<f64>,
    assignment: Vec<Option<f64>>,
    best: Option<(Vec<f64>, f64)>,
    nodes: u64,
    stop: Option<Stop>,
}

impl<'m> Search<'m> {
    fn new(
        model: &'m Model,
        limits: &SolveLimits,
        cancel: &'m CancellationToken,
        node_limit: Option<u64>,
    ) -> Result<Self, BackendError> {
        let objective = model.objective();
        let mut fixed_part = objective.constant();
        for (var, coef) in objective.terms() {
            let Some(v) = model.variable(var) else {
                return Err(BackendError::Unsupported(format!("unknown variable {var}")));
            };
            if v.is_binary() {
                continue;
            }
            if coef < 0.0 {
                return Err(BackendError::Unsupported(format!(
                    "variable '{}' has a negative objective weight",
                    v.name
                )));
            }
            if v.lower.is_finite() {
                fixed_part += coef * v.lower;
            }
        }

        let binaries: Vec<VarId> = model
            .variables()
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_binary())
            .map(|(i, _)| VarId::from_index(i))
            .collect();

        let mut suffix_bound = vec![fixed_part; binaries.len() + 1];
        for i in (0..binaries.len()).rev() {
            suffix_bound[i] = suffix_bound[i + 1] + objective.coefficient(binaries[i]).min(0.0);
        }

        let position: HashMap<VarId, usize> =
            binaries.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let mut rows_of = vec![Vec::new(); binaries.len()];
        for (ci, c) in model.constraints().iter().enumerate() {
            if c.expr.terms().any(|(var, _)| !position.contains_key(&var)) {
                continue;
            }
            for (var, _) in c.expr.terms() {
                rows_of[position[&var]].push(ConstraintId::from_index(ci));
            }
        }

        Ok(Self {
            model,
            cancel,
            gap: limits.optimality_gap,
            deadline: limits.time_limit.map(|limit| Instant::now() + limit),
            node_limit,
            completion: Completion::new(model),
            binaries,
            rows_of,
            suffix_bound,
            assignment: vec![None; model.num_variables()],
            best: None,
            nodes: 0,
            stop: None,
        })
    }

    /// Explores all completions of the binaries from position `depth` on,
    /// given the objective contribution `fixed` of the binaries before it.
    fn descend(&mut self, depth: usize, fixed: f64) {
        if self.stop.is_some() || self.should_stop() {
            return;
        }
        self.nodes += 1;

        if let Some((_, best)) = &self.best {
            let slack = (self.gap * best.abs()).max(1e-9);
            if fixed + self.suffix_bound[depth] >= best - slack {
                return;
            }
        }

        if depth == self.binaries.len() {
            self.evaluate_leaf();
            return;
        }

        let var = self.binaries[depth];
        let coef = self.model.objective().coefficient(var);
        for value in [0.0, 1.0] {
            self.assignment[var.index()] = Some(value);
            if self.rows_admit(depth) {
                self.descend(depth + 1, fixed + coef * value);
            }
            if self.stop.is_some() {
                break;
            }
        }
        self.assignment[var.index()] = None;
    }

    fn should_stop(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.stop = Some(Stop::Cancelled);
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.stop = Some(Stop::Time);
        } else if self.node_limit.is_some_and(|limit| self.nodes >= limit) {
            self.stop = Some(Stop::Nodes);
        }
        self.stop.is_some()
    }

    /// Checks the binary-only rows touching the variable at `depth` for
    /// activity bounds that can no longer meet the right-hand side.
    fn rows_admit(&self, depth: usize) -> bool {
        self.rows_of[depth].iter().all(|&id| {
            let Some(c) = self.model.constraint(id) else {
                return true;
            };
            let mut min_act = c.expr.constant();
            let mut max_act = c.expr.constant();
            for (var, coef) in c.expr.terms() {
                match self.assignment[var.index()] {
                    Some(value) => {
                        min_act += coef * value;
                        max_act += coef * value;
                    }
                    None => {
                        min_act += coef.min(0.0);
                        max_act += coef.max(0.0);
                    }
                }
            }
            let too_high = min_act > c.rhs + FEASIBILITY_TOL;
            let too_low = max_act < c.rhs - FEASIBILITY_TOL;
            match c.sense {
                Sense::Le => !too_high,
                Sense::Ge => !too_low,
                Sense::Eq => !too_high && !too_low,
            }
        })
    }

    fn evaluate_leaf(&mut self) {
        let values = self.completion.complete(&self.assignment);
        if !self.model.is_feasible(&values, FEASIBILITY_TOL) {
            return;
        }
        let objective = self.model.objective_value(&values);
        let improves = match &self.best {
            Some((_, best)) => objective < best - 1e-9,
            None => true,
        };
        if improves {
            self.best = Some((values, objective));
        }
    }
}

/// Derives non-binary values from fixed binaries.
struct Completion<'m> {
    model: &'m Model,
    occurrences: HashMap<VarId, Vec<ConstraintId>>,
}

impl<'m> Completion<'m> {
    fn new(model: &'m Model) -> Self {
        Self {
            model,
            occurrences: model.occurrences(),
        }
    }

    fn complete(&self, fixed: &[Option<f64>]) -> Vec<f64> {
        let model = self.model;
        let mut values: Vec<Option<f64>> = fixed.to_vec();
        values.resize(model.num_variables(), None);

        loop {
            let mut progress = false;

            // Equalities with a single unknown determine it.
            for c in model.constraints().iter().filter(|c| c.sense == Sense::Eq) {
                let mut unknown = None;
                let mut unknown_count = 0;
                let mut rest = c.expr.constant();
                for (var, coef) in c.expr.terms() {
                    match values[var.index()] {
                        Some(value) => rest += coef * value,
                        None => {
                            unknown = Some((var, coef));
                            unknown_count += 1;
                        }
                    }
                }
                if let (1, Some((var, coef))) = (unknown_count, unknown) {
                    values[var.index()] = Some(self.round((c.rhs - rest) / coef, var));
                    progress = true;
                }
            }
            if progress {
                continue;
            }

            // Otherwise push an unknown to its smallest value once every
            // other variable in its rows is known.
            for index in 0..values.len() {
                if values[index].is_some() {
                    continue;
                }
                let var = VarId::from_index(index);
                if let Some(lower) = self.lower_bound(var, &values) {
                    values[index] = Some(lower);
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }

        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                value.unwrap_or_else(|| {
                    let lower = model.variables()[i].lower;
                    if lower.is_finite() {
                        lower
                    } else {
                        0.0
                    }
                })
            })
            .collect()
    }

    fn lower_bound(&self, var: VarId, values: &[Option<f64>]) -> Option<f64> {
        let variable = self.model.variable(var)?;
        let mut lower = variable.lower;
        for &id in self.occurrences.get(&var).map(Vec::as_slice).unwrap_or(&[]) {
            let c = self.model.constraint(id)?;
            let mut rest = c.expr.constant();
            for (other, coef) in c.expr.terms() {
                if other == var {
                    continue;
                }
                rest += coef * values[other.index()]?;
            }
            let coef = c.expr.coefficient(var);
            let bound = (c.rhs - rest) / coef;
            let raises = match c.sense {
                Sense::Ge => coef > 0.0,
                Sense::Le => coef < 0.0,
                Sense::Eq => true,
            };
            if raises {
                lower = lower.max(bound);
            }
        }
        if !lower.is_finite() {
            lower = 0.0;
        }
        Some(self.round(lower, var))
    }

    fn round(&self, value: f64, var: VarId) -> f64 {
        match self.model.variable(var).map(|v| v.kind) {
            Some(VarKind::Integer) | Some(VarKind::Binary) => (value - 1e-9).ceil(),
            _ => value,
        }
    }
}

/// Completes a partial assignment of binaries into a full value vector.
///
/// Unlisted binaries are taken as 0.
pub fn complete_values(model: &Model, binaries: &[(VarId, f64)]) -> Vec<f64> {
    let mut fixed: Vec<Option<f64>> = model
        .variables()
        .iter()
        .map(|v| v.is_binary().then_some(0.0))
        .collect();
    for &(var, value) in binaries {
        if let Some(slot) = fixed.get_mut(var.index()) {
            *slot = Some(value);
        }
    }
    Completion::new(model).complete(&fixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetplan_model::{Constraint, ConstraintFamily, LinearExpr};

    fn assignment_with_slack() -> (Model, VarId, VarId, VarId) {
        // min 10·y + s   s.t.  x + y = 1,  s − 60·x ≥ 0
        let mut model = Model::new("tiny");
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        let s = model.add_variable("s", VarKind::Continuous, 0.0, 100.0);
        model.add_constraint(Constraint::new(
            "one",
            ConstraintFamily::Uniqueness,
            LinearExpr::from_terms([(x, 1.0), (y, 1.0)]),
            Sense::Eq,
            1.0,
        ));
        model.add_constraint(Constraint::new(
            "slack",
            ConstraintFamily::DelayLink,
            LinearExpr::from_terms([(s, 1.0), (x, -60.0)]),
            Sense::Ge,
            0.0,
        ));
        model.set_objective(LinearExpr::from_terms([(y, 10.0), (s, 1.0)]));
        (model, x, y, s)
    }

    fn solve(model: &Model) -> BackendOutcome {
        let backend = EnumerationBackend::new();
        let limits = SolveLimits::default();
        let mut session = backend.open_session(&limits).unwrap();
        session
            .solve(model, &limits, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_finds_optimum() {
        let (model, x, y, s) = assignment_with_slack();
        let outcome = solve(&model);
        assert_eq!(outcome.status, BackendStatus::Optimal);
        let values = outcome.values.unwrap();
        assert_eq!(values[x.index()], 0.0);
        assert_eq!(values[y.index()], 1.0);
        assert_eq!(values[s.index()], 0.0);
        assert_eq!(outcome.objective_value, Some(10.0));
    }

    #[test]
    fn test_infeasible() {
        let mut model = Model::new("none");
        let x = model.add_binary("x");
        model.add_constraint(Constraint::new(
            "impossible",
            ConstraintFamily::Uniqueness,
            LinearExpr::from_terms([(x, 1.0)]),
            Sense::Eq,
            2.0,
        ));
        assert_eq!(solve(&model).status, BackendStatus::Infeasible);
    }

    #[test]
    fn test_cancelled_before_start() {
        let (model, _, _, _) = assignment_with_slack();
        let token = CancellationToken::new();
        token.cancel();
        let limits = SolveLimits::default();
        let mut session = EnumerationBackend::new().open_session(&limits).unwrap();
        let outcome = session.solve(&model, &limits, &token).unwrap();
        assert_eq!(outcome.status, BackendStatus::Interrupted);
        assert!(outcome.values.is_none());
    }

    #[test]
    fn test_node_limit() {
        let (model, _, _, _) = assignment_with_slack();
        let limits = SolveLimits::default();
        let mut session = EnumerationBackend::new()
            .with_node_limit(1)
            .open_session(&limits)
            .unwrap();
        let outcome = session
            .solve(&model, &limits, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.status, BackendStatus::TimeLimit);
    }

    #[test]
    fn test_negative_continuous_weight_rejected() {
        let mut model = Model::new("neg");
        let s = model.add_variable("s", VarKind::Continuous, 0.0, 1.0);
        model.set_objective(LinearExpr::from_terms([(s, -1.0)]));
        let limits = SolveLimits::default();
        let mut session = EnumerationBackend::new().open_session(&limits).unwrap();
        let result = session.solve(&model, &limits, &CancellationToken::new());
        assert!(matches!(result, Err(BackendError::Unsupported(_))));
    }

    #[test]
    fn test_complete_values() {
        let (model, x, _, s) = assignment_with_slack();
        let values = complete_values(&model, &[(x, 1.0)]);
        assert_eq!(values[s.index()], 60.0);
        assert!(model.is_feasible(&values, 1e-6));
    }
}
