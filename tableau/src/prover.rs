// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Free-variable tableau search.
//!
//! The prover refutes the negation of its goal: the initial formula is
//! demodalized by the standard translation, normalized, and expanded by
//! Smullyan's rules. Universal formulas are instantiated with placeholder
//! variables (ξ/ζ) that unification resolves when a branch closes; each
//! non-trivial closing unifier is applied to the whole tree, and the other
//! candidate unifiers are kept as backtracking alternatives.

use folm::modal::translate_from_modal;
use folm::syntax::{Formula, FormulaKind, Quantifier, Signature, Term, ACCESSIBILITY};
use folm::term::nnf::nnf;
use folm::term::subst::substitute;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::unify::{self, Substitution};

/// The rule that produced a tableau node.
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Rule {
    Initial,
    Alpha,
    Beta,
    Gamma,
    Delta,
    ModalGamma,
    ModalDelta,
    /// Double-negation elimination, only synthesized during sentence-tree
    /// construction
    Dne,
}

/// Index of a node in the free-variable tree's arena.
pub type FvNodeId = usize;

/// A node of the free-variable tableau.
#[derive(Clone, Debug)]
pub struct FvNode {
    /// The node's formula, in negation normal form
    pub formula: Formula,
    /// The premise(s) of the rule application that produced this node
    pub from_nodes: Vec<FvNodeId>,
    /// The rule that produced this node
    pub from_rule: Rule,
    /// The term substituted by a gamma/delta/modal expansion
    pub instance_term: Option<Term>,
    /// Identifies the rule application this node belongs to
    pub expansion_step: usize,
    /// Whether the node participates in the closure of a branch
    pub used: bool,
}

/// A branch of the tableau: the nodes on it in the order they were added,
/// plus the expansion bookkeeping the search loop needs.
#[derive(Clone, Debug)]
pub struct Branch {
    /// Nodes on the branch, in order of addition
    pub nodes: Vec<FvNodeId>,
    /// Whether the branch was closed
    pub closed: bool,
    todo: Vec<FvNodeId>,
    uses: HashMap<FvNodeId, usize>,
    modal_pairs: HashSet<(FvNodeId, String)>,
}

impl Branch {
    fn new(nodes: Vec<FvNodeId>, todo: Vec<FvNodeId>) -> Self {
        Self {
            nodes,
            closed: false,
            todo,
            uses: HashMap::new(),
            modal_pairs: HashSet::new(),
        }
    }
}

#[derive(Clone, Debug)]
struct State {
    arena: Vec<FvNode>,
    open: Vec<Branch>,
    closed: Vec<Branch>,
    next_step: usize,
}

/// The finished free-variable tableau handed to the sentence-tree
/// assembler.
#[derive(Clone, Debug)]
pub struct FvTree {
    /// All nodes, addressed by [`FvNodeId`]
    pub arena: Vec<FvNode>,
    /// Branches that closed
    pub closed_branches: Vec<Branch>,
    /// Branches that saturated without closing
    pub open_branches: Vec<Branch>,
    /// The initial formulas as parsed (possibly modal)
    pub init_formulas: Vec<Formula>,
    /// The initial formulas after the standard translation
    pub init_formulas_nonmodal: Vec<Formula>,
    /// The initial formulas in negation normal form
    pub init_formulas_normalized: Vec<Formula>,
    /// Whether the search ran under S5
    pub s5: bool,
}

impl FvTree {
    /// Whether every branch closed, i.e. the goal is proved.
    pub fn closed(&self) -> bool {
        self.open_branches.is_empty()
    }
}

/// Search failure: the step limit ran out before the tableau closed or
/// saturated.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    /// Undecided within the step limit
    #[error("gave up after {0} rule applications")]
    LimitReached(usize),
}

/// How many times a reusable (gamma or S5 box) formula may be instantiated
/// per branch. Completeness would need an unbounded supply; the bound keeps
/// saturation finite.
const GAMMA_LIMIT: usize = 3;

/// Prove `goal` by refutation. The signature must be the one built while
/// parsing `goal`; it accumulates the symbols the search introduces.
pub fn prove(
    goal: &Formula,
    sig: &mut Signature,
    s5: bool,
    limit: usize,
) -> Result<FvTree, SearchError> {
    let init = Formula::negate(goal.clone());
    let nonmodal = translate_from_modal(&init, sig);
    let normalized = nnf(&nonmodal);

    let mut state = State {
        arena: vec![],
        open: vec![],
        closed: vec![],
        next_step: 0,
    };
    let root = FvNode {
        formula: normalized.clone(),
        from_nodes: vec![],
        from_rule: Rule::Initial,
        instance_term: None,
        expansion_step: state.next_step,
        used: false,
    };
    state.next_step += 1;
    state.arena.push(root);
    state.open.push(Branch::new(vec![0], vec![0]));

    let mut search = Search {
        sig,
        s5,
        limit,
        steps: 0,
        alternatives: vec![],
    };
    let (state, _closed) = search.run(state)?;

    Ok(FvTree {
        arena: state.arena,
        closed_branches: state.closed,
        open_branches: state.open,
        init_formulas: vec![init],
        init_formulas_nonmodal: vec![nonmodal],
        init_formulas_normalized: vec![normalized],
        s5,
    })
}

struct Search<'a> {
    sig: &'a mut Signature,
    s5: bool,
    limit: usize,
    steps: usize,
    alternatives: Vec<State>,
}

impl Search<'_> {
    fn run(&mut self, mut state: State) -> Result<(State, bool), SearchError> {
        loop {
            if state.open.is_empty() {
                return Ok((state, true));
            }
            // a substitution applied while closing another branch may have
            // made an exact clash appear here
            if self.close_exact(&mut state) {
                continue;
            }
            match self.pick(&state) {
                Some(pos) => {
                    self.steps += 1;
                    if self.steps > self.limit {
                        return Err(SearchError::LimitReached(self.steps));
                    }
                    self.expand(&mut state, pos);
                }
                None => {
                    // the first branch is saturated and open: this
                    // unifier path failed, try another
                    match self.alternatives.pop() {
                        Some(alt) => {
                            log::debug!("open saturated branch, backtracking");
                            state = alt;
                        }
                        None => return Ok((state, false)),
                    }
                }
            }
        }
    }

    /// Close the first open branch on an exact complementary pair, if any.
    fn close_exact(&mut self, state: &mut State) -> bool {
        let branch = &state.open[0];
        let lits: Vec<FvNodeId> = branch
            .nodes
            .iter()
            .copied()
            .filter(|&n| is_literal(&state.arena[n].formula))
            .collect();
        for (i, &a) in lits.iter().enumerate() {
            for &b in &lits[i + 1..] {
                if let Some(sub) =
                    unify::complementary(&state.arena[a].formula, &state.arena[b].formula)
                {
                    if sub.is_empty() {
                        close_branch(state, 0, a, b);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Choose the next node to expand on the first open branch: linear
    /// rules before branching ones, instantiations last.
    fn pick(&self, state: &State) -> Option<usize> {
        let branch = &state.open[0];
        let mut best: Option<(usize, usize)> = None;
        for (pos, &n) in branch.todo.iter().enumerate() {
            let f = &state.arena[n].formula;
            let rank = match f.kind(self.sig) {
                FormulaKind::Literal | FormulaKind::DoubleNegation => continue,
                FormulaKind::Alpha => 0,
                FormulaKind::Delta => 1,
                FormulaKind::Diamondy => 2,
                FormulaKind::Boxy => {
                    if self.s5 {
                        if branch.uses.get(&n).copied().unwrap_or(0) >= GAMMA_LIMIT {
                            continue;
                        }
                        4
                    } else if self.boxy_partner(state, n).is_none() {
                        continue;
                    } else {
                        3
                    }
                }
                FormulaKind::Beta => 5,
                FormulaKind::Gamma => {
                    if branch.uses.get(&n).copied().unwrap_or(0) >= GAMMA_LIMIT {
                        continue;
                    }
                    6
                }
            };
            if best.map_or(true, |(r, _)| rank < r) {
                best = Some((rank, pos));
            }
        }
        best.map(|(_, pos)| pos)
    }

    /// An accessibility literal on the branch the boxy node has not been
    /// instantiated with yet.
    fn boxy_partner(&self, state: &State, n: FvNodeId) -> Option<FvNodeId> {
        let branch = &state.open[0];
        let (source, _, _) = boxy_parts(&state.arena[n].formula)?;
        branch.nodes.iter().copied().find(|&r| {
            match accessibility_edge(&state.arena[r].formula) {
                Some((from, to)) => {
                    *from == source
                        && !branch
                            .modal_pairs
                            .contains(&(n, folm::printer::term(to)))
                }
                None => false,
            }
        })
    }

    fn expand(&mut self, state: &mut State, todo_pos: usize) {
        let n = state.open[0].todo[todo_pos];
        let formula = state.arena[n].formula.clone();
        match formula.kind(self.sig) {
            FormulaKind::Alpha => {
                state.open[0].todo.remove(todo_pos);
                let (a1, a2) = alpha_parts(&formula);
                let step = state.next_step;
                state.next_step += 1;
                self.append(state, 0, vec![a1, a2], vec![n], Rule::Alpha, None, step);
            }
            FormulaKind::Beta => {
                state.open[0].todo.remove(todo_pos);
                let (b1, b2) = beta_parts(&formula);
                let step = state.next_step;
                state.next_step += 1;
                let right = state.open[0].clone();
                let closed_left =
                    self.append(state, 0, vec![b1], vec![n], Rule::Beta, None, step);
                let right_pos = if closed_left { 0 } else { 1 };
                state.open.insert(right_pos, right);
                self.append(state, right_pos, vec![b2], vec![n], Rule::Beta, None, step);
            }
            FormulaKind::Gamma => {
                if let Formula::Quantified(Quantifier::Forall, v, m) = &formula {
                    let fresh = Term::id(self.sig.fresh_prover_variable(false));
                    let inst = substitute(m, &Term::id(v), &fresh, false);
                    let step = state.next_step;
                    state.next_step += 1;
                    *state.open[0].uses.entry(n).or_insert(0) += 1;
                    self.append(state, 0, vec![inst], vec![n], Rule::Gamma, Some(fresh), step);
                }
            }
            FormulaKind::Delta => {
                state.open[0].todo.remove(todo_pos);
                if let Formula::Quantified(Quantifier::Exists, v, m) = &formula {
                    let sk = self.skolem_term(&formula, false);
                    let inst = substitute(m, &Term::id(v), &sk, false);
                    let step = state.next_step;
                    state.next_step += 1;
                    self.append(state, 0, vec![inst], vec![n], Rule::Delta, Some(sk), step);
                }
            }
            FormulaKind::Boxy => {
                let Some((_, v, m)) = boxy_parts(&formula) else {
                    log::warn!("unrecognized box shape {formula}, skipping");
                    state.open[0].todo.remove(todo_pos);
                    return;
                };
                let step = state.next_step;
                state.next_step += 1;
                if self.s5 {
                    let fresh = Term::id(self.sig.fresh_prover_variable(true));
                    let inst = substitute(&m, &Term::id(&v), &fresh, false);
                    *state.open[0].uses.entry(n).or_insert(0) += 1;
                    self.append(
                        state,
                        0,
                        vec![inst],
                        vec![n],
                        Rule::ModalGamma,
                        Some(fresh),
                        step,
                    );
                } else if let Some(r) = self.boxy_partner(state, n) {
                    let (_, to) = accessibility_edge(&state.arena[r].formula)
                        .expect("partner is an accessibility literal");
                    let to = to.clone();
                    state
                        .open[0]
                        .modal_pairs
                        .insert((n, folm::printer::term(&to)));
                    let inst = substitute(&m, &Term::id(&v), &to, false);
                    self.append(
                        state,
                        0,
                        vec![inst],
                        vec![n, r],
                        Rule::ModalGamma,
                        Some(to),
                        step,
                    );
                }
            }
            FormulaKind::Diamondy => {
                state.open[0].todo.remove(todo_pos);
                let Some((source, v, m)) = diamondy_parts(&formula) else {
                    log::warn!("unrecognized diamond shape {formula}, skipping");
                    return;
                };
                let sk = self.skolem_term(&formula, true);
                let inst = substitute(&m, &Term::id(&v), &sk, false);
                let step = state.next_step;
                state.next_step += 1;
                let results = if self.s5 {
                    vec![inst]
                } else {
                    vec![
                        Formula::atom(ACCESSIBILITY, vec![source, sk.clone()]),
                        inst,
                    ]
                };
                self.append(state, 0, results, vec![n], Rule::ModalDelta, Some(sk), step);
            }
            FormulaKind::Literal | FormulaKind::DoubleNegation => {
                state.open[0].todo.remove(todo_pos);
            }
        }
    }

    fn skolem_term(&mut self, formula: &Formula, world: bool) -> Term {
        let name = self.sig.fresh_skolem_symbol(world);
        let args: Vec<Term> = formula
            .prover_variables()
            .into_iter()
            .map(Term::Id)
            .collect();
        if args.is_empty() {
            Term::Id(name)
        } else {
            Term::App(name, args)
        }
    }

    /// Append the results of one rule application to a branch, then try to
    /// close the branch on each new literal. Returns whether the branch
    /// closed.
    fn append(
        &mut self,
        state: &mut State,
        branch_pos: usize,
        results: Vec<Formula>,
        from: Vec<FvNodeId>,
        rule: Rule,
        instance: Option<Term>,
        step: usize,
    ) -> bool {
        let mut new_ids = vec![];
        for f in results {
            let id = state.arena.len();
            state.arena.push(FvNode {
                formula: f,
                from_nodes: from.clone(),
                from_rule: rule,
                instance_term: instance.clone(),
                expansion_step: step,
                used: false,
            });
            let is_lit = is_literal(&state.arena[id].formula);
            let branch = &mut state.open[branch_pos];
            branch.nodes.push(id);
            if !is_lit {
                branch.todo.push(id);
            }
            new_ids.push(id);
        }
        for id in new_ids {
            if is_literal(&state.arena[id].formula) && self.try_close(state, branch_pos, id) {
                return true;
            }
        }
        false
    }

    /// Try to close a branch against a freshly added literal. An exact
    /// clash closes immediately; otherwise the first unifier is applied to
    /// the whole tree and the remaining candidates become backtracking
    /// alternatives.
    fn try_close(&mut self, state: &mut State, branch_pos: usize, lit: FvNodeId) -> bool {
        let others: Vec<FvNodeId> = state.open[branch_pos].nodes.clone();
        let mut candidates = vec![];
        for other in others {
            if other == lit || !is_literal(&state.arena[other].formula) {
                continue;
            }
            if let Some(sub) =
                unify::complementary(&state.arena[lit].formula, &state.arena[other].formula)
            {
                if sub.is_empty() {
                    close_branch(state, branch_pos, lit, other);
                    return true;
                }
                candidates.push((other, sub));
            }
        }
        if candidates.is_empty() {
            return false;
        }
        for (other, sub) in candidates.iter().skip(1) {
            let mut alt = state.clone();
            apply_substitution(&mut alt, sub);
            close_branch(&mut alt, branch_pos, lit, *other);
            self.alternatives.push(alt);
        }
        let (other, sub) = &candidates[0];
        apply_substitution(state, sub);
        close_branch(state, branch_pos, lit, *other);
        true
    }
}

fn is_literal(f: &Formula) -> bool {
    matches!(f, Formula::Atom(_, _))
        || matches!(f, Formula::Not(sub) if matches!(sub.as_ref(), Formula::Atom(_, _)))
}

/// Split a conjunction in negation normal form.
fn alpha_parts(f: &Formula) -> (Formula, Formula) {
    match f {
        Formula::BinOp(folm::syntax::BinOp::And, lhs, rhs) => {
            ((**lhs).clone(), (**rhs).clone())
        }
        _ => unreachable!("alpha expansion on non-conjunction"),
    }
}

/// Split a disjunction in negation normal form.
fn beta_parts(f: &Formula) -> (Formula, Formula) {
    match f {
        Formula::BinOp(folm::syntax::BinOp::Or, lhs, rhs) => ((**lhs).clone(), (**rhs).clone()),
        _ => unreachable!("beta expansion on non-disjunction"),
    }
}

/// Decompose the NNF image of a box: ∀v(¬Rwv ∨ M), returning (w, v, M).
fn boxy_parts(f: &Formula) -> Option<(Term, String, Formula)> {
    if let Formula::Quantified(Quantifier::Forall, v, m) = f {
        if let Formula::BinOp(folm::syntax::BinOp::Or, lhs, rhs) = m.as_ref() {
            if let Formula::Not(g) = lhs.as_ref() {
                if let Some((from, to)) = accessibility_edge_atom(g) {
                    if *to == Term::Id(v.clone()) {
                        return Some((from.clone(), v.clone(), (**rhs).clone()));
                    }
                }
            }
        }
    }
    None
}

/// Decompose the NNF image of a diamond: ∃v(Rwv ∧ M), returning (w, v, M).
fn diamondy_parts(f: &Formula) -> Option<(Term, String, Formula)> {
    if let Formula::Quantified(Quantifier::Exists, v, m) = f {
        if let Formula::BinOp(folm::syntax::BinOp::And, lhs, rhs) = m.as_ref() {
            if let Some((from, to)) = accessibility_edge_atom(lhs) {
                if *to == Term::Id(v.clone()) {
                    return Some((from.clone(), v.clone(), (**rhs).clone()));
                }
            }
        }
    }
    None
}

fn accessibility_edge_atom(f: &Formula) -> Option<(&Term, &Term)> {
    match f {
        Formula::Atom(p, args) if p == ACCESSIBILITY && args.len() == 2 => {
            Some((&args[0], &args[1]))
        }
        _ => None,
    }
}

/// An `R`-literal's endpoints, for positive accessibility facts.
pub fn accessibility_edge(f: &Formula) -> Option<(&Term, &Term)> {
    accessibility_edge_atom(f)
}

fn apply_substitution(state: &mut State, sub: &Substitution) {
    for node in &mut state.arena {
        node.formula = unify::apply_formula(sub, &node.formula);
        if let Some(t) = &node.instance_term {
            node.instance_term = Some(unify::apply(sub, t));
        }
    }
}

fn close_branch(state: &mut State, branch_pos: usize, a: FvNodeId, b: FvNodeId) {
    mark_used(&mut state.arena, a);
    mark_used(&mut state.arena, b);
    let mut branch = state.open.remove(branch_pos);
    branch.closed = true;
    state.closed.push(branch);
}

fn mark_used(arena: &mut [FvNode], n: FvNodeId) {
    let mut stack = vec![n];
    while let Some(id) = stack.pop() {
        if !arena[id].used {
            arena[id].used = true;
            stack.extend(arena[id].from_nodes.iter().copied());
        }
    }
}
