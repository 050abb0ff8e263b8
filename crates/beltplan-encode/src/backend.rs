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

//! # Constraint Backend Interface
//!
//! The vocabulary shared by the encoder and every solver it can drive.
//!
//! ## Highlights
//!
//! - `BoolVar` / `IntVar`: dense variable handles issued by the backend.
//! - `Literal`: a boolean variable or its negation, negated with `!`.
//! - `Domain`: the explicit, finite value set of an integer variable.
//! - `Constraint`: a `ConstraintKind` plus optional enforcement literals. A
//!   constraint with enforcement literals only has to hold when all of them
//!   are true.
//! - `ConstraintBackend`: the trait the encoder writes against, with the
//!   derived helpers `add_implication` and `fix`.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_encode::backend::{Constraint, ConstraintBackend, SearchLimits, BackendStatus};
//! use beltplan_encode::search::SearchBackend;
//!
//! let mut backend = SearchBackend::new();
//! let a = backend.new_literal();
//! let b = backend.new_literal();
//! backend.add_constraint(Constraint::exactly_one([a, b]));
//! backend.add_objective_term(a, 2.0);
//! backend.add_objective_term(b, 1.0);
//!
//! let solution = backend.solve(&SearchLimits::default());
//! assert_eq!(solution.status(), BackendStatus::Optimal);
//! assert!(solution.value(b) && !solution.value(a));
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Duration;

/// A boolean decision variable.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BoolVar(u32);

impl BoolVar {
    #[inline(always)]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A bounded integer decision variable.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct IntVar(u32);

impl IntVar {
    #[inline(always)]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A boolean variable or its negation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Literal {
    var: BoolVar,
    negated: bool,
}

impl Literal {
    #[inline(always)]
    pub const fn positive(var: BoolVar) -> Self {
        Self {
            var,
            negated: false,
        }
    }

    #[inline(always)]
    pub const fn negative(var: BoolVar) -> Self {
        Self { var, negated: true }
    }

    #[inline(always)]
    pub const fn var(self) -> BoolVar {
        self.var
    }

    #[inline(always)]
    pub const fn is_negated(self) -> bool {
        self.negated
    }

    /// The truth value of the literal when its variable is `value`.
    #[inline(always)]
    pub const fn evaluate(self, value: bool) -> bool {
        value != self.negated
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    #[inline(always)]
    fn not(self) -> Self::Output {
        Self {
            var: self.var,
            negated: !self.negated,
        }
    }
}

impl From<BoolVar> for Literal {
    #[inline(always)]
    fn from(var: BoolVar) -> Self {
        Literal::positive(var)
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "!b{}", self.var.0)
        } else {
            write!(f, "b{}", self.var.0)
        }
    }
}

/// The sorted, duplicate-free value set of an integer variable.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Domain {
    values: SmallVec<[i64; 4]>,
}

impl Domain {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut values: SmallVec<[i64; 4]> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Self { values }
    }

    #[inline]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ConstraintKind {
    AtMostOne(Vec<Literal>),
    ExactlyOne(Vec<Literal>),
    /// At least one literal holds. An empty clause never holds.
    BoolOr(Vec<Literal>),
    /// Every literal holds.
    BoolAnd(Vec<Literal>),
    IntEqConst(IntVar, i64),
    IntNeConst(IntVar, i64),
    IntEq(IntVar, IntVar),
}

/// A constraint, active only when every enforcement literal is true.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Constraint {
    kind: ConstraintKind,
    enforcement: SmallVec<[Literal; 2]>,
}

impl Constraint {
    #[inline]
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            enforcement: SmallVec::new(),
        }
    }

    #[inline]
    pub fn at_most_one<I>(literals: I) -> Self
    where
        I: IntoIterator<Item = Literal>,
    {
        Self::new(ConstraintKind::AtMostOne(literals.into_iter().collect()))
    }

    #[inline]
    pub fn exactly_one<I>(literals: I) -> Self
    where
        I: IntoIterator<Item = Literal>,
    {
        Self::new(ConstraintKind::ExactlyOne(literals.into_iter().collect()))
    }

    #[inline]
    pub fn bool_or<I>(literals: I) -> Self
    where
        I: IntoIterator<Item = Literal>,
    {
        Self::new(ConstraintKind::BoolOr(literals.into_iter().collect()))
    }

    #[inline]
    pub fn bool_and<I>(literals: I) -> Self
    where
        I: IntoIterator<Item = Literal>,
    {
        Self::new(ConstraintKind::BoolAnd(literals.into_iter().collect()))
    }

    #[inline]
    pub fn int_eq_const(var: IntVar, value: i64) -> Self {
        Self::new(ConstraintKind::IntEqConst(var, value))
    }

    #[inline]
    pub fn int_ne_const(var: IntVar, value: i64) -> Self {
        Self::new(ConstraintKind::IntNeConst(var, value))
    }

    #[inline]
    pub fn int_eq(a: IntVar, b: IntVar) -> Self {
        Self::new(ConstraintKind::IntEq(a, b))
    }

    /// Adds enforcement literals. The constraint only has to hold when all of them are true.
    #[inline]
    pub fn only_enforce_if<I>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = Literal>,
    {
        self.enforcement.extend(literals);
        self
    }

    #[inline]
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    #[inline]
    pub fn enforcement(&self) -> &[Literal] {
        &self.enforcement
    }

    /// Checks the constraint against a complete assignment.
    pub fn is_satisfied(&self, bools: &[bool], ints: &[i64]) -> bool {
        let holds = |l: &Literal| l.evaluate(bools[l.var().index()]);
        if !self.enforcement.iter().all(holds) {
            return true;
        }
        match &self.kind {
            ConstraintKind::AtMostOne(lits) => lits.iter().filter(|l| holds(*l)).count() <= 1,
            ConstraintKind::ExactlyOne(lits) => lits.iter().filter(|l| holds(*l)).count() == 1,
            ConstraintKind::BoolOr(lits) => lits.iter().any(holds),
            ConstraintKind::BoolAnd(lits) => lits.iter().all(holds),
            ConstraintKind::IntEqConst(v, c) => ints[v.index()] == *c,
            ConstraintKind::IntNeConst(v, c) => ints[v.index()] != *c,
            ConstraintKind::IntEq(a, b) => ints[a.index()] == ints[b.index()],
        }
    }
}

/// The outcome of a backend solve.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BackendStatus {
    /// A solution was found and proven optimal.
    Optimal,
    /// A solution was found but the search stopped before proving optimality.
    Feasible,
    /// The model has no solution.
    Infeasible,
    /// The search stopped early for a reason other than time, without a solution.
    Unknown,
    /// The time limit expired without a solution.
    TimedOut,
}

impl BackendStatus {
    #[inline]
    pub fn has_solution(&self) -> bool {
        matches!(self, BackendStatus::Optimal | BackendStatus::Feasible)
    }
}

impl std::fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendStatus::Optimal => write!(f, "Optimal"),
            BackendStatus::Feasible => write!(f, "Feasible"),
            BackendStatus::Infeasible => write!(f, "Infeasible"),
            BackendStatus::Unknown => write!(f, "Unknown"),
            BackendStatus::TimedOut => write!(f, "TimedOut"),
        }
    }
}

/// Variable values returned by a backend.
#[derive(Clone, PartialEq, Debug)]
pub struct BackendSolution {
    status: BackendStatus,
    objective: Option<f64>,
    bools: Vec<bool>,
    ints: Vec<i64>,
}

impl BackendSolution {
    /// A result carrying only a status.
    #[inline]
    pub fn without_solution(status: BackendStatus) -> Self {
        Self {
            status,
            objective: None,
            bools: Vec::new(),
            ints: Vec::new(),
        }
    }

    #[inline]
    pub fn with_values(
        status: BackendStatus,
        objective: f64,
        bools: Vec<bool>,
        ints: Vec<i64>,
    ) -> Self {
        Self {
            status,
            objective: Some(objective),
            bools,
            ints,
        }
    }

    #[inline]
    pub fn status(&self) -> BackendStatus {
        self.status
    }

    #[inline]
    pub fn objective(&self) -> Option<f64> {
        self.objective
    }

    #[inline]
    pub fn has_values(&self) -> bool {
        self.objective.is_some()
    }

    /// The value of `literal`, `false` when no solution is present.
    #[inline]
    pub fn value(&self, literal: Literal) -> bool {
        self.bools
            .get(literal.var().index())
            .is_some_and(|&v| literal.evaluate(v))
    }

    /// The value of `var`, `None` when no solution is present.
    #[inline]
    pub fn int_value(&self, var: IntVar) -> Option<i64> {
        self.ints.get(var.index()).copied()
    }
}

/// Limits handed to `ConstraintBackend::solve`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchLimits {
    /// Maximum number of search nodes.
    pub node_limit: Option<u64>,
    /// Wall-clock limit in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl SearchLimits {
    #[inline]
    pub fn unlimited() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    #[inline]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[inline]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// A constraint solver the encoder can write a model into.
pub trait ConstraintBackend {
    fn name(&self) -> &str;

    fn new_bool_var(&mut self) -> BoolVar;

    fn new_int_var(&mut self, domain: Domain) -> IntVar;

    fn add_constraint(&mut self, constraint: Constraint);

    /// Adds `coefficient` to the minimized objective whenever `literal` holds.
    fn add_objective_term(&mut self, literal: Literal, coefficient: f64);

    /// Suggests that `literal` holds in a good solution.
    fn add_hint(&mut self, literal: Literal);

    fn solve(&mut self, limits: &SearchLimits) -> BackendSolution;

    #[inline]
    fn new_literal(&mut self) -> Literal {
        Literal::positive(self.new_bool_var())
    }

    /// `premise` implies `conclusion`.
    #[inline]
    fn add_implication(&mut self, premise: Literal, conclusion: Literal) {
        self.add_constraint(Constraint::bool_or([conclusion]).only_enforce_if([premise]));
    }

    /// Forces `literal` to hold.
    #[inline]
    fn fix(&mut self, literal: Literal) {
        self.add_constraint(Constraint::bool_and([literal]));
    }
}
