//! CPLEX LP file export.
//!
//! Any external MIP solver that reads LP files can solve a built model.

use std::fmt::Write;

use crate::lp::{LinearExpr, Model, VarKind};

const TERMS_PER_LINE: usize = 8;

impl Model {
    /// Renders the model in CPLEX LP format.
    ///
    /// # Example
    ///
    /// ```
    /// use fleetplan_model::{Constraint, ConstraintFamily, LinearExpr, Model, Sense};
    ///
    /// let mut model = Model::new("demo");
    /// let x = model.add_binary("x");
    /// let y = model.add_binary("y");
    /// model.add_constraint(Constraint::new(
    ///     "one",
    ///     ConstraintFamily::Uniqueness,
    ///     LinearExpr::from_terms([(x, 1.0), (y, 1.0)]),
    ///     Sense::Eq,
    ///     1.0,
    /// ));
    /// model.set_objective(LinearExpr::from_terms([(x, 2.0), (y, 3.5)]));
    ///
    /// let lp = model.write_lp();
    /// assert!(lp.starts_with("\\ demo\nMinimize\n obj: +2 x +3.5 y\n"));
    /// assert!(lp.contains(" one: +1 x +1 y = 1\n"));
    /// assert!(lp.ends_with("Binary\n x\n y\nEnd\n"));
    /// ```
    pub fn write_lp(&self) -> String {
        let names: Vec<String> = self.variables().iter().map(|v| lp_name(&v.name)).collect();
        let mut out = String::new();

        let _ = writeln!(out, "\\ {}", self.name());
        out.push_str("Minimize\n obj: ");
        out.push_str(&fmt_lin(self.objective(), &names, true));
        out.push('\n');

        out.push_str("Subject To\n");
        for c in self.constraints() {
            let _ = writeln!(
                out,
                " {}: {} {} {}",
                lp_name(&c.name),
                fmt_lin(&c.expr, &names, false),
                c.sense.as_str(),
                fmt_num(c.rhs - c.expr.constant())
            );
        }

        out.push_str("Bounds\n");
        for (var, name) in self.variables().iter().zip(&names) {
            if var.kind == VarKind::Binary {
                continue;
            }
            if var.upper.is_finite() {
                let _ = writeln!(
                    out,
                    " {} <= {} <= {}",
                    fmt_num(var.lower),
                    name,
                    fmt_num(var.upper)
                );
            } else {
                let _ = writeln!(out, " {} >= {}", name, fmt_num(var.lower));
            }
        }

        let generals: Vec<&String> = self
            .variables()
            .iter()
            .zip(&names)
            .filter(|(v, _)| v.kind == VarKind::Integer)
            .map(|(_, n)| n)
            .collect();
        if !generals.is_empty() {
            out.push_str("General\n");
            for name in generals {
                let _ = writeln!(out, " {name}");
            }
        }

        out.push_str("Binary\n");
        for (var, name) in self.variables().iter().zip(&names) {
            if var.kind == VarKind::Binary {
                let _ = writeln!(out, " {name}");
            }
        }
        out.push_str("End\n");
        out
    }
}

/// Replaces characters the LP format does not accept in names.
fn lp_name(name: &str) -> String {
    const ALLOWED: &str = "!\"#$%&()/,.;?@_`'{}|~";
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || ALLOWED.contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        out.insert(0, '_');
    }
    out
}

fn fmt_num(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        let s = format!("{v:.6}");
        s.trim_end_matches('0').to_string()
    }
}

fn fmt_lin(e: &LinearExpr, names: &[String], with_constant: bool) -> String {
    let mut out = String::new();
    let mut count = 0;
    for (var, coef) in e.terms() {
        if count > 0 {
            out.push(if count % TERMS_PER_LINE == 0 { '\n' } else { ' ' });
            if count % TERMS_PER_LINE == 0 {
                out.push_str("   ");
            }
        }
        let name = names.get(var.index()).map(String::as_str).unwrap_or("?");
        let sign = if coef < 0.0 { '-' } else { '+' };
        let _ = write!(out, "{sign}{} {name}", fmt_num(coef.abs()));
        count += 1;
    }
    if count == 0 {
        out.push_str("+0");
    }
    if with_constant && e.constant().abs() > 1e-12 {
        let _ = write!(out, " {}{}", if e.constant() < 0.0 { '-' } else { '+' }, fmt_num(e.constant().abs()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{Constraint, ConstraintFamily, Sense};

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(-2.0), "-2");
        assert_eq!(fmt_num(0.25), "0.25");
    }

    #[test]
    fn test_lp_name_sanitized() {
        assert_eq!(lp_name("x(F1,A1,C1,3)"), "x(F1,A1,C1,3)");
        assert_eq!(lp_name("dep(UA 100)"), "dep(UA_100)");
        assert_eq!(lp_name("1st"), "_1st");
    }

    #[test]
    fn test_bounds_and_general() {
        let mut model = Model::new("bounds");
        let dep = model.add_variable("dep", VarKind::Integer, 60.0, 240.0);
        let slack = model.add_variable("slack", VarKind::Continuous, 0.0, f64::INFINITY);
        model.add_constraint(Constraint::new(
            "link",
            ConstraintFamily::DelayLink,
            LinearExpr::from_terms([(slack, 1.0), (dep, -1.0)]),
            Sense::Ge,
            -60.0,
        ));
        model.set_objective(LinearExpr::from_terms([(slack, 1.0)]));

        let lp = model.write_lp();
        assert!(lp.contains(" link: -1 dep +1 slack >= -60\n"));
        assert!(lp.contains(" 60 <= dep <= 240\n"));
        assert!(lp.contains(" slack >= 0\n"));
        assert!(lp.contains("General\n dep\n"));
    }

    #[test]
    fn test_long_rows_wrap() {
        let mut model = Model::new("wrap");
        let vars: Vec<_> = (0..10).map(|i| model.add_binary(format!("x{i}"))).collect();
        model.add_constraint(Constraint::new(
            "all",
            ConstraintFamily::AircraftOverlap,
            LinearExpr::from_terms(vars.iter().map(|&v| (v, 1.0))),
            Sense::Le,
            1.0,
        ));
        let lp = model.write_lp();
        assert!(lp.contains("+1 x7\n   +1 x8 +1 x9 <= 1"));
    }
}
