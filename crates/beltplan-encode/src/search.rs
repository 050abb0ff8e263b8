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

//! Depth-first branch-and-bound over a recorded `ConstraintModel`.
//!
//! `SearchBackend` stores the model like `ConstraintModel` does and solves it
//! with a chronological backtracking search. Every assignment is pushed to a
//! trail and propagated through the constraints watching the variable:
//! unit rules for clauses and cardinality constraints, value transfer for
//! integer equalities, and reverse propagation that falsifies the last open
//! enforcement literal of a constraint whose body can no longer hold.
//!
//! The objective bound of a node is the cost of the assigned literals plus,
//! for every open variable, the cheaper of its two polarities. Nodes whose
//! bound reaches the incumbent are pruned. Branching takes variables in
//! creation order and tries the hinted polarity first, otherwise the cheaper
//! one (false on ties). Integer variables are branched last, in domain order.
//!
//! The backend is complete: without limits it either proves optimality or
//! infeasibility. It is meant for small and medium grids and as a reference
//! for external solvers plugged in through `ConstraintBackend`.

use crate::{
    backend::{
        BackendSolution, BackendStatus, BoolVar, Constraint, ConstraintBackend, ConstraintKind,
        Domain, IntVar, Literal, SearchLimits,
    },
    model::ConstraintModel,
    stats::SearchStatistics,
};
use std::time::Instant;

const OBJECTIVE_EPSILON: f64 = 1e-9;

/// The clock is consulted once every `CLOCK_CHECK_MASK + 1` nodes.
const CLOCK_CHECK_MASK: u64 = 1023;

/// A backend that records the model and solves it with branch-and-bound.
#[derive(Clone, Debug, Default)]
pub struct SearchBackend {
    model: ConstraintModel,
    statistics: SearchStatistics,
}

impl SearchBackend {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The model recorded so far.
    #[inline]
    pub fn model(&self) -> &ConstraintModel {
        &self.model
    }

    /// Statistics of the most recent `solve`.
    #[inline]
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    #[inline]
    pub fn into_model(self) -> ConstraintModel {
        self.model
    }
}

impl From<ConstraintModel> for SearchBackend {
    fn from(model: ConstraintModel) -> Self {
        Self {
            model,
            statistics: SearchStatistics::default(),
        }
    }
}

impl ConstraintBackend for SearchBackend {
    fn name(&self) -> &str {
        "SearchBackend"
    }

    #[inline]
    fn new_bool_var(&mut self) -> BoolVar {
        self.model.new_bool_var()
    }

    #[inline]
    fn new_int_var(&mut self, domain: Domain) -> IntVar {
        self.model.new_int_var(domain)
    }

    #[inline]
    fn add_constraint(&mut self, constraint: Constraint) {
        self.model.add_constraint(constraint);
    }

    #[inline]
    fn add_objective_term(&mut self, literal: Literal, coefficient: f64) {
        self.model.add_objective_term(literal, coefficient);
    }

    #[inline]
    fn add_hint(&mut self, literal: Literal) {
        self.model.add_hint(literal);
    }

    fn solve(&mut self, limits: &SearchLimits) -> BackendSolution {
        let (solution, statistics) = SearchSession::new(&self.model, limits).run();
        self.statistics = statistics;
        solution
    }
}

/// A variable of either kind. Integer keys are offset by the number of
/// boolean variables.
type VarKey = usize;

#[derive(Clone, Copy, PartialEq, Debug)]
enum Value {
    Bool(bool),
    Int(i64),
}

#[derive(Clone, Debug)]
struct DecisionFrame {
    key: VarKey,
    /// Values still to try, in reverse order.
    remaining: Vec<Value>,
    trail_start: usize,
    bound: f64,
}

#[derive(Clone, Debug)]
enum StopReason {
    Exhausted,
    NodeLimit,
    TimeLimit,
}

struct Incumbent {
    objective: f64,
    bools: Vec<bool>,
    ints: Vec<i64>,
}

struct SearchSession<'a> {
    model: &'a ConstraintModel,
    limits: &'a SearchLimits,
    num_bools: usize,
    watches: Vec<Vec<usize>>,
    bools: Vec<Option<bool>>,
    ints: Vec<Option<i64>>,
    hints: Vec<Option<bool>>,
    cost_if_true: Vec<f64>,
    cost_if_false: Vec<f64>,
    bound: f64,
    trail: Vec<VarKey>,
    queue: Vec<VarKey>,
    decisions: Vec<DecisionFrame>,
    cursor: VarKey,
    incumbent: Option<Incumbent>,
    stats: SearchStatistics,
    start_time: Instant,
}

impl<'a> SearchSession<'a> {
    fn new(model: &'a ConstraintModel, limits: &'a SearchLimits) -> Self {
        let num_bools = model.num_bool_vars();
        let num_ints = model.num_int_vars();

        let mut watches = vec![Vec::new(); num_bools + num_ints];
        for (index, constraint) in model.constraints().iter().enumerate() {
            for key in constraint_keys(constraint, num_bools) {
                if watches[key].last() != Some(&index) {
                    watches[key].push(index);
                }
            }
        }

        let mut cost_if_true = vec![0.0; num_bools];
        let mut cost_if_false = vec![0.0; num_bools];
        for &(literal, coefficient) in model.objective() {
            let var = literal.var().index();
            if literal.is_negated() {
                cost_if_false[var] += coefficient;
            } else {
                cost_if_true[var] += coefficient;
            }
        }
        let bound = cost_if_true
            .iter()
            .zip(cost_if_false.iter())
            .map(|(t, f)| t.min(*f))
            .sum();

        let mut hints = vec![None; num_bools];
        for literal in model.hints() {
            hints[literal.var().index()] = Some(!literal.is_negated());
        }

        Self {
            model,
            limits,
            num_bools,
            watches,
            bools: vec![None; num_bools],
            ints: vec![None; num_ints],
            hints,
            cost_if_true,
            cost_if_false,
            bound,
            trail: Vec::with_capacity(num_bools + num_ints),
            queue: Vec::new(),
            decisions: Vec::new(),
            cursor: 0,
            incumbent: None,
            stats: SearchStatistics::default(),
            start_time: Instant::now(),
        }
    }

    fn run(mut self) -> (BackendSolution, SearchStatistics) {
        tracing::debug!(
            bools = self.num_bools,
            ints = self.ints.len(),
            constraints = self.model.constraints().len(),
            "starting branch-and-bound search"
        );

        let reason = if self.initialize() {
            self.search()
        } else {
            StopReason::Exhausted
        };

        self.stats.set_total_time(self.start_time.elapsed());
        tracing::debug!(
            nodes = self.stats.nodes_explored,
            solutions = self.stats.solutions_found,
            reason = ?reason,
            "branch-and-bound search finished"
        );
        self.finalize(reason)
    }

    fn finalize(self, reason: StopReason) -> (BackendSolution, SearchStatistics) {
        let solution = match (reason, self.incumbent) {
            (StopReason::Exhausted, Some(best)) => BackendSolution::with_values(
                BackendStatus::Optimal,
                best.objective,
                best.bools,
                best.ints,
            ),
            (StopReason::Exhausted, None) => {
                BackendSolution::without_solution(BackendStatus::Infeasible)
            }
            (_, Some(best)) => BackendSolution::with_values(
                BackendStatus::Feasible,
                best.objective,
                best.bools,
                best.ints,
            ),
            (StopReason::TimeLimit, None) => {
                BackendSolution::without_solution(BackendStatus::TimedOut)
            }
            (StopReason::NodeLimit, None) => {
                BackendSolution::without_solution(BackendStatus::Unknown)
            }
        };
        (solution, self.stats)
    }

    /// Checks domains and propagates every constraint once.
    fn initialize(&mut self) -> bool {
        if self.model.domains().iter().any(Domain::is_empty) {
            return false;
        }
        for index in 0..self.model.constraints().len() {
            if !self.propagate_constraint(index) {
                return false;
            }
        }
        self.propagate()
    }

    fn search(&mut self) -> StopReason {
        loop {
            self.stats.on_node_explored();
            self.stats.on_depth_update(self.decisions.len() as u64);

            if let Some(reason) = self.limit_reached() {
                return reason;
            }

            if let Some(best) = &self.incumbent
                && self.bound >= best.objective - OBJECTIVE_EPSILON
            {
                self.stats.on_pruning_bound();
                if !self.advance() {
                    return StopReason::Exhausted;
                }
                continue;
            }

            match self.next_unassigned() {
                None => {
                    self.record_solution();
                    if !self.advance() {
                        return StopReason::Exhausted;
                    }
                }
                Some(key) => {
                    let mut remaining = self.branch_values(key);
                    remaining.reverse();
                    self.decisions.push(DecisionFrame {
                        key,
                        remaining,
                        trail_start: self.trail.len(),
                        bound: self.bound,
                    });
                    if !self.advance() {
                        return StopReason::Exhausted;
                    }
                }
            }
        }
    }

    fn limit_reached(&self) -> Option<StopReason> {
        if let Some(limit) = self.limits.node_limit
            && self.stats.nodes_explored > limit
        {
            return Some(StopReason::NodeLimit);
        }
        if let Some(limit) = self.limits.time_limit()
            && self.stats.nodes_explored & CLOCK_CHECK_MASK == 0
            && self.start_time.elapsed() >= limit
        {
            return Some(StopReason::TimeLimit);
        }
        None
    }

    /// Moves to the next consistent node: the next value of the innermost
    /// decision, backtracking through exhausted decisions. Returns `false`
    /// once the tree is exhausted.
    fn advance(&mut self) -> bool {
        while let Some(frame) = self.decisions.last_mut() {
            let key = frame.key;
            let trail_start = frame.trail_start;
            let bound = frame.bound;
            let next = frame.remaining.pop();

            self.undo_to(trail_start);
            self.bound = bound;

            match next {
                None => {
                    self.decisions.pop();
                    self.stats.on_backtrack();
                }
                Some(value) => {
                    self.cursor = key;
                    if self.assign(key, value) && self.propagate() {
                        return true;
                    }
                    self.stats.on_conflict();
                }
            }
        }
        false
    }

    fn undo_to(&mut self, trail_start: usize) {
        while self.trail.len() > trail_start {
            if let Some(key) = self.trail.pop() {
                if key < self.num_bools {
                    self.bools[key] = None;
                } else {
                    self.ints[key - self.num_bools] = None;
                }
            }
        }
        self.queue.clear();
    }

    fn next_unassigned(&mut self) -> Option<VarKey> {
        let total = self.num_bools + self.ints.len();
        while self.cursor < total {
            let assigned = if self.cursor < self.num_bools {
                self.bools[self.cursor].is_some()
            } else {
                self.ints[self.cursor - self.num_bools].is_some()
            };
            if !assigned {
                return Some(self.cursor);
            }
            self.cursor += 1;
        }
        None
    }

    fn branch_values(&self, key: VarKey) -> Vec<Value> {
        if key < self.num_bools {
            let first = self.hints[key].unwrap_or(self.cost_if_true[key] < self.cost_if_false[key]);
            vec![Value::Bool(first), Value::Bool(!first)]
        } else {
            self.model
                .domain(IntVar::new((key - self.num_bools) as u32))
                .values()
                .iter()
                .map(|&v| Value::Int(v))
                .collect()
        }
    }

    fn record_solution(&mut self) {
        let improves = self
            .incumbent
            .as_ref()
            .is_none_or(|best| self.bound < best.objective - OBJECTIVE_EPSILON);
        if !improves {
            return;
        }
        let bools: Vec<bool> = self.bools.iter().map(|v| v.unwrap_or(false)).collect();
        let ints: Vec<i64> = self.ints.iter().map(|v| v.unwrap_or(0)).collect();
        debug_assert!(
            self.model.is_feasible(&bools, &ints),
            "called `SearchSession::record_solution` with an assignment the model rejects"
        );
        let objective = self.model.objective_value(&bools);
        tracing::trace!(objective, nodes = self.stats.nodes_explored, "improving solution");
        self.stats.on_solution_found();
        self.incumbent = Some(Incumbent {
            objective,
            bools,
            ints,
        });
    }

    fn assign(&mut self, key: VarKey, value: Value) -> bool {
        match value {
            Value::Bool(v) => self.assign_bool(key, v),
            Value::Int(v) => self.assign_int(key - self.num_bools, v),
        }
    }

    fn assign_bool(&mut self, var: usize, value: bool) -> bool {
        match self.bools[var] {
            Some(current) => current == value,
            None => {
                self.bools[var] = Some(value);
                let (t, f) = (self.cost_if_true[var], self.cost_if_false[var]);
                self.bound += if value { t } else { f } - t.min(f);
                self.trail.push(var);
                self.queue.push(var);
                true
            }
        }
    }

    fn assign_int(&mut self, var: usize, value: i64) -> bool {
        match self.ints[var] {
            Some(current) => current == value,
            None => {
                if !self.model.domain(IntVar::new(var as u32)).contains(value) {
                    return false;
                }
                self.ints[var] = Some(value);
                self.trail.push(var + self.num_bools);
                self.queue.push(var + self.num_bools);
                true
            }
        }
    }

    fn infer(&mut self, literal: Literal) -> bool {
        if self.literal_value(literal).is_none() {
            self.stats.on_propagation();
        }
        self.assign_bool(literal.var().index(), !literal.is_negated())
    }

    fn infer_int(&mut self, var: IntVar, value: i64) -> bool {
        if self.ints[var.index()].is_none() {
            self.stats.on_propagation();
        }
        self.assign_int(var.index(), value)
    }

    #[inline]
    fn literal_value(&self, literal: Literal) -> Option<bool> {
        self.bools[literal.var().index()].map(|v| literal.evaluate(v))
    }

    fn propagate(&mut self) -> bool {
        while let Some(key) = self.queue.pop() {
            for i in 0..self.watches[key].len() {
                let index = self.watches[key][i];
                if !self.propagate_constraint(index) {
                    self.queue.clear();
                    return false;
                }
            }
        }
        true
    }

    fn propagate_constraint(&mut self, index: usize) -> bool {
        let model = self.model;
        let constraint = &model.constraints()[index];

        let mut open = None;
        let mut num_open = 0;
        for &literal in constraint.enforcement() {
            match self.literal_value(literal) {
                Some(false) => return true,
                Some(true) => {}
                None => {
                    num_open += 1;
                    open = Some(literal);
                }
            }
        }

        match (num_open, open) {
            (0, _) => self.propagate_body(constraint.kind()),
            (1, Some(literal)) if self.is_violated(constraint.kind()) => self.infer(!literal),
            _ => true,
        }
    }

    /// Whether the body can no longer hold under the current partial assignment.
    fn is_violated(&self, kind: &ConstraintKind) -> bool {
        match kind {
            ConstraintKind::AtMostOne(lits) => self.count(lits, Some(true)) > 1,
            ConstraintKind::ExactlyOne(lits) => {
                let trues = self.count(lits, Some(true));
                trues > 1 || (trues == 0 && self.count(lits, None) == 0)
            }
            ConstraintKind::BoolOr(lits) => lits
                .iter()
                .all(|&l| self.literal_value(l) == Some(false)),
            ConstraintKind::BoolAnd(lits) => lits
                .iter()
                .any(|&l| self.literal_value(l) == Some(false)),
            ConstraintKind::IntEqConst(var, value) => match self.ints[var.index()] {
                Some(current) => current != *value,
                None => !self.model.domain(*var).contains(*value),
            },
            ConstraintKind::IntNeConst(var, value) => self.ints[var.index()] == Some(*value),
            ConstraintKind::IntEq(a, b) => match (self.ints[a.index()], self.ints[b.index()]) {
                (Some(x), Some(y)) => x != y,
                (Some(x), None) => !self.model.domain(*b).contains(x),
                (None, Some(y)) => !self.model.domain(*a).contains(y),
                (None, None) => false,
            },
        }
    }

    fn propagate_body(&mut self, kind: &ConstraintKind) -> bool {
        match kind {
            ConstraintKind::AtMostOne(lits) => match self.count(lits, Some(true)) {
                0 => true,
                1 => self.falsify_open(lits),
                _ => false,
            },
            ConstraintKind::ExactlyOne(lits) => match self.count(lits, Some(true)) {
                0 => match self.single_open(lits) {
                    Ok(Some(literal)) => self.infer(literal),
                    Ok(None) => false,
                    Err(()) => true,
                },
                1 => self.falsify_open(lits),
                _ => false,
            },
            ConstraintKind::BoolOr(lits) => {
                if self.count(lits, Some(true)) > 0 {
                    return true;
                }
                match self.single_open(lits) {
                    Ok(Some(literal)) => self.infer(literal),
                    Ok(None) => false,
                    Err(()) => true,
                }
            }
            ConstraintKind::BoolAnd(lits) => lits.iter().all(|&l| self.infer(l)),
            ConstraintKind::IntEqConst(var, value) => self.infer_int(*var, *value),
            ConstraintKind::IntNeConst(var, value) => match self.ints[var.index()] {
                Some(current) => current != *value,
                None => self.model.domain(*var).values() != [*value],
            },
            ConstraintKind::IntEq(a, b) => match (self.ints[a.index()], self.ints[b.index()]) {
                (Some(x), Some(y)) => x == y,
                (Some(x), None) => self.infer_int(*b, x),
                (None, Some(y)) => self.infer_int(*a, y),
                (None, None) => true,
            },
        }
    }

    fn count(&self, lits: &[Literal], value: Option<bool>) -> usize {
        lits.iter()
            .filter(|&&l| self.literal_value(l) == value)
            .count()
    }

    fn falsify_open(&mut self, lits: &[Literal]) -> bool {
        lits.iter()
            .all(|&l| self.literal_value(l).is_some() || self.infer(!l))
    }

    /// The only open literal, `Ok(None)` if none is open, `Err(())` if
    /// several are.
    fn single_open(&self, lits: &[Literal]) -> Result<Option<Literal>, ()> {
        let mut open = lits.iter().filter(|&&l| self.literal_value(l).is_none());
        match (open.next(), open.next()) {
            (None, _) => Ok(None),
            (Some(&l), None) => Ok(Some(l)),
            (Some(_), Some(_)) => Err(()),
        }
    }
}

fn constraint_keys(constraint: &Constraint, num_bools: usize) -> Vec<VarKey> {
    let mut keys: Vec<VarKey> = constraint
        .enforcement()
        .iter()
        .map(|l| l.var().index())
        .collect();
    match constraint.kind() {
        ConstraintKind::AtMostOne(lits)
        | ConstraintKind::ExactlyOne(lits)
        | ConstraintKind::BoolOr(lits)
        | ConstraintKind::BoolAnd(lits) => keys.extend(lits.iter().map(|l| l.var().index())),
        ConstraintKind::IntEqConst(var, _) | ConstraintKind::IntNeConst(var, _) => {
            keys.push(num_bools + var.index())
        }
        ConstraintKind::IntEq(a, b) => {
            keys.push(num_bools + a.index());
            keys.push(num_bools + b.index());
        }
    }
    keys.sort_unstable();
    keys.dedup();
    keys
}
