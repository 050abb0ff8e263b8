// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::backend::{
    BackendSolution, BackendStatus, BoolVar, Constraint, ConstraintBackend, Domain, IntVar,
    Literal, SearchLimits,
};

/// A backend that records the model instead of solving it.
///
/// Used to inspect what the encoder produced, to export the model to an
/// external solver, and as the storage of `SearchBackend`. `solve` always
/// reports `BackendStatus::Unknown`.
#[derive(Clone, Debug, Default)]
pub struct ConstraintModel {
    num_bool_vars: usize,
    int_domains: Vec<Domain>,
    constraints: Vec<Constraint>,
    objective: Vec<(Literal, f64)>,
    hints: Vec<Literal>,
}

impl ConstraintModel {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_bool_vars(&self) -> usize {
        self.num_bool_vars
    }

    #[inline]
    pub fn num_int_vars(&self) -> usize {
        self.int_domains.len()
    }

    /// Returns the domain of `var`.
    ///
    /// # Panics
    ///
    /// Panics if `var` was not issued by this model.
    #[inline]
    pub fn domain(&self, var: IntVar) -> &Domain {
        debug_assert!(
            var.index() < self.int_domains.len(),
            "called `ConstraintModel::domain` with variable out of bounds: the len is {} but the index is {}",
            self.int_domains.len(),
            var.index()
        );
        &self.int_domains[var.index()]
    }

    #[inline]
    pub fn domains(&self) -> &[Domain] {
        &self.int_domains
    }

    #[inline]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[inline]
    pub fn objective(&self) -> &[(Literal, f64)] {
        &self.objective
    }

    #[inline]
    pub fn hints(&self) -> &[Literal] {
        &self.hints
    }

    /// Whether a complete assignment satisfies every constraint and domain.
    pub fn is_feasible(&self, bools: &[bool], ints: &[i64]) -> bool {
        bools.len() == self.num_bool_vars
            && ints.len() == self.int_domains.len()
            && ints
                .iter()
                .zip(self.int_domains.iter())
                .all(|(v, d)| d.contains(*v))
            && self.constraints.iter().all(|c| c.is_satisfied(bools, ints))
    }

    /// The objective value of a complete boolean assignment.
    pub fn objective_value(&self, bools: &[bool]) -> f64 {
        self.objective
            .iter()
            .filter(|(l, _)| l.evaluate(bools[l.var().index()]))
            .map(|(_, c)| *c)
            .sum()
    }
}

impl ConstraintBackend for ConstraintModel {
    fn name(&self) -> &str {
        "ConstraintModel"
    }

    fn new_bool_var(&mut self) -> BoolVar {
        let var = BoolVar::new(self.num_bool_vars as u32);
        self.num_bool_vars += 1;
        var
    }

    fn new_int_var(&mut self, domain: Domain) -> IntVar {
        let var = IntVar::new(self.int_domains.len() as u32);
        self.int_domains.push(domain);
        var
    }

    fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    fn add_objective_term(&mut self, literal: Literal, coefficient: f64) {
        self.objective.push((literal, coefficient));
    }

    fn add_hint(&mut self, literal: Literal) {
        self.hints.push(literal);
    }

    fn solve(&mut self, _limits: &SearchLimits) -> BackendSolution {
        BackendSolution::without_solution(BackendStatus::Unknown)
    }
}

impl std::fmt::Display for ConstraintModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ConstraintModel")?;
        writeln!(f, "  Bool variables:  {}", self.num_bool_vars)?;
        writeln!(f, "  Int variables:   {}", self.int_domains.len())?;
        writeln!(f, "  Constraints:     {}", self.constraints.len())?;
        writeln!(f, "  Objective terms: {}", self.objective.len())?;
        writeln!(f, "  Hints:           {}", self.hints.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_are_issued_densely() {
        let mut model = ConstraintModel::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        let v = model.new_int_var(Domain::new([1, 2]));
        assert_eq!((a.index(), b.index(), v.index()), (0, 1, 0));
        assert_eq!(model.num_bool_vars(), 2);
        assert_eq!(model.domain(v).values(), &[1, 2]);
    }

    #[test]
    fn test_solve_reports_unknown() {
        let mut model = ConstraintModel::new();
        let a = model.new_literal();
        model.fix(a);
        let solution = model.solve(&SearchLimits::default());
        assert_eq!(solution.status(), BackendStatus::Unknown);
        assert!(!solution.has_values());
    }

    #[test]
    fn test_feasibility_check() {
        let mut model = ConstraintModel::new();
        let a = model.new_literal();
        let b = model.new_literal();
        let v = model.new_int_var(Domain::new([1, 2]));
        model.add_implication(a, b);
        model.add_constraint(Constraint::int_eq_const(v, 2).only_enforce_if([a]));
        model.add_objective_term(a, 1.5);
        model.add_objective_term(b, 0.5);

        assert!(model.is_feasible(&[true, true], &[2]));
        assert!(!model.is_feasible(&[true, false], &[2]));
        assert!(!model.is_feasible(&[true, true], &[1]));
        // outside the domain
        assert!(!model.is_feasible(&[false, false], &[7]));
        assert_eq!(model.objective_value(&[true, true]), 2.0);
    }
}
