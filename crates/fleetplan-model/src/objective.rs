//! Objective Builder.
//!
//! The objective is a minimization of
//!
//! ```text
//! Σ delay_weight·priority(f)·delay(f)
//! + Σ sla_weight·priority(f)·sla(f)
//! + Σ overtime_weight·overtime(c)
//! + Σ maintenance_weight·overrun(a)
//! + Σ cancellation_weight·priority(f)·cancelled(f)
//! ```

use std::fmt;

use fleetplan_config::PenaltyWeights;
use fleetplan_core::Catalog;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::lp::{LinearExpr, VarId};
use crate::variables::VariableSet;

/// Penalty category of an objective term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyCategory {
    Delay,
    Sla,
    Overtime,
    Maintenance,
    Cancellation,
}

impl PenaltyCategory {
    pub const ALL: [PenaltyCategory; 5] = [
        PenaltyCategory::Delay,
        PenaltyCategory::Sla,
        PenaltyCategory::Overtime,
        PenaltyCategory::Maintenance,
        PenaltyCategory::Cancellation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyCategory::Delay => "delay",
            PenaltyCategory::Sla => "sla",
            PenaltyCategory::Overtime => "overtime",
            PenaltyCategory::Maintenance => "maintenance",
            PenaltyCategory::Cancellation => "cancellation",
        }
    }
}

impl fmt::Display for PenaltyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted variable of the objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveTerm {
    pub category: PenaltyCategory,
    pub var: VarId,
    pub coefficient: f64,
    /// Index of the flight, crew or aircraft the term charges.
    pub subject: usize,
}

/// Penalty totals per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    pub delay: f64,
    pub sla: f64,
    pub overtime: f64,
    pub maintenance: f64,
    pub cancellation: f64,
}

impl PenaltyBreakdown {
    pub fn get(&self, category: PenaltyCategory) -> f64 {
        match category {
            PenaltyCategory::Delay => self.delay,
            PenaltyCategory::Sla => self.sla,
            PenaltyCategory::Overtime => self.overtime,
            PenaltyCategory::Maintenance => self.maintenance,
            PenaltyCategory::Cancellation => self.cancellation,
        }
    }

    pub fn add(&mut self, category: PenaltyCategory, amount: f64) {
        let slot = match category {
            PenaltyCategory::Delay => &mut self.delay,
            PenaltyCategory::Sla => &mut self.sla,
            PenaltyCategory::Overtime => &mut self.overtime,
            PenaltyCategory::Maintenance => &mut self.maintenance,
            PenaltyCategory::Cancellation => &mut self.cancellation,
        };
        *slot += amount;
    }

    pub fn total(&self) -> f64 {
        self.delay + self.sla + self.overtime + self.maintenance + self.cancellation
    }
}

/// The weighted objective of one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objective {
    terms: Vec<ObjectiveTerm>,
}

impl Objective {
    /// Collects one term per penalty variable.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonFiniteObjective`] if a weight times a
    /// priority overflows.
    pub fn build(
        catalog: &Catalog,
        weights: &PenaltyWeights,
        vars: &VariableSet,
    ) -> Result<Self, ModelError> {
        let mut terms = Vec::new();

        for (fi, (flight, fv)) in catalog.flights().iter().zip(vars.flights()).enumerate() {
            let p = flight.priority;
            terms.push(ObjectiveTerm {
                category: PenaltyCategory::Delay,
                var: fv.delay,
                coefficient: weights.delay_weight * p,
                subject: fi,
            });
            terms.push(ObjectiveTerm {
                category: PenaltyCategory::Sla,
                var: fv.sla,
                coefficient: weights.sla_weight * p,
                subject: fi,
            });
            terms.push(ObjectiveTerm {
                category: PenaltyCategory::Cancellation,
                var: fv.cancelled,
                coefficient: weights.cancellation_weight * p,
                subject: fi,
            });
        }
        for (ci, &var) in vars.overtime().iter().enumerate() {
            terms.push(ObjectiveTerm {
                category: PenaltyCategory::Overtime,
                var,
                coefficient: weights.overtime_weight,
                subject: ci,
            });
        }
        for (ai, var) in vars.maintenance().iter().enumerate() {
            if let Some(var) = *var {
                terms.push(ObjectiveTerm {
                    category: PenaltyCategory::Maintenance,
                    var,
                    coefficient: weights.maintenance_weight,
                    subject: ai,
                });
            }
        }

        if let Some(bad) = terms.iter().find(|t| !t.coefficient.is_finite()) {
            return Err(ModelError::NonFiniteObjective {
                variable: bad.var.to_string(),
            });
        }
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    /// The objective as one linear expression.
    pub fn expr(&self) -> LinearExpr {
        LinearExpr::from_terms(self.terms.iter().map(|t| (t.var, t.coefficient)))
    }

    /// Objective value of `values`, split by category.
    pub fn breakdown(&self, values: &[f64]) -> PenaltyBreakdown {
        let mut breakdown = PenaltyBreakdown::default();
        for t in &self.terms {
            let value = values.get(t.var.index()).copied().unwrap_or(0.0);
            breakdown.add(t.category, t.coefficient * value);
        }
        breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_total() {
        let mut b = PenaltyBreakdown::default();
        b.add(PenaltyCategory::Delay, 30.0);
        b.add(PenaltyCategory::Cancellation, 5000.0);
        b.add(PenaltyCategory::Delay, 15.0);
        assert_eq!(b.get(PenaltyCategory::Delay), 45.0);
        assert_eq!(b.total(), 5045.0);
    }

    #[test]
    fn test_category_names() {
        let names: Vec<_> = PenaltyCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["delay", "sla", "overtime", "maintenance", "cancellation"]);
    }
}
