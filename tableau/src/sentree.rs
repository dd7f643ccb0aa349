// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Sentence-tableau construction.
//!
//! The prover searches on normalized formulas, but the tableau shown to a
//! reader should apply the textbook rules to the *unnormalized* input. The
//! [`SentenceTree`] rebuilds that presentation from the free-variable
//! proof: each transferred node's formula is recomputed by applying the
//! textbook rule to its (already denormalized) origin and matching the
//! candidates against the prover's formula up to normalization. Double
//! negations erased by normalization are reinserted as explicit steps,
//! alpha results are reordered when the prover found them in the other
//! order, and the conjunctive byproducts of biconditional expansion are
//! flagged and pruned. A final pass replaces free variables and Skolem
//! terms with readable constants.
//!
//! Nodes live in an arena and are addressed by index: origin links
//! (`from_nodes`, `dne_to`, `swapped_with`) form a DAG over the tree, and
//! every node owns its own `from_nodes` list.

use folm::modal::translate_to_modal;
use folm::printer;
use folm::syntax::{Formula, FormulaKind, Signature, Term, ACCESSIBILITY};
use folm::term::nnf::{alpha, beta, nnf};
use folm::term::subst::substitute;
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use std::mem;

use crate::prover::{Branch, FvNodeId, FvTree, Rule};

/// Index of a node in the sentence tree's arena.
pub type NodeId = usize;

/// A sentence-tableau node.
#[derive(Clone, Debug)]
pub struct Node {
    /// The displayed formula
    pub formula: Formula,
    /// Premises of the rule application that produced this node
    pub from_nodes: Vec<NodeId>,
    /// The producing rule
    pub from_rule: Rule,
    /// Term substituted by a gamma/delta/modal expansion
    pub instance_term: Option<Term>,
    /// Rule-application group this node belongs to
    pub expansion_step: usize,
    /// Whether the node participates in a branch closure
    pub used: bool,
    /// Whether this node terminates a closed branch
    pub closed_end: bool,
    /// Parent in the tree shape
    pub parent: Option<NodeId>,
    /// Children in the tree shape (at most two)
    pub children: Vec<NodeId>,
    /// World label attached by the modalizer, for display
    pub world: Option<String>,
    /// Whether the node is a conjunctive byproduct of expanding a
    /// biconditional, to be pruned
    pub biconditional_expansion: bool,
    /// The double-negation elimination node spliced in below this one
    pub dne_to: Option<NodeId>,
    /// The partner this node was reordered with
    pub swapped_with: Option<NodeId>,
    /// Whether the node was adopted into the sentence tree
    pub is_sen_node: bool,
    /// Whether the node was removed from the tree
    pub is_removed: bool,
}

/// The sentence tableau: a tree of [`Node`]s plus the flat list of live
/// nodes in adoption order.
pub struct SentenceTree {
    arena: Vec<Node>,
    root: NodeId,
    /// Live nodes in adoption order, which matches a pre-order walk of the
    /// final tree along each branch
    pub list: Vec<NodeId>,
    /// The initial formulas as parsed
    pub init_formulas: Vec<Formula>,
    /// The initial formulas after the standard translation
    pub init_formulas_nonmodal: Vec<Formula>,
    /// The initial formulas in negation normal form
    pub init_formulas_normalized: Vec<Formula>,
    /// Whether every branch of the underlying proof closed
    pub closed: bool,
    s5: bool,
}

impl SentenceTree {
    /// Build the sentence tableau for a finished free-variable proof. The
    /// signature must be the one the search ran with; the naming pass
    /// registers the surface constants it hands out.
    pub fn new(fv: &FvTree, sig: &mut Signature) -> Self {
        let mut tree = SentenceTree {
            arena: vec![],
            root: 0,
            list: vec![],
            init_formulas: fv.init_formulas.clone(),
            init_formulas_nonmodal: fv.init_formulas_nonmodal.clone(),
            init_formulas_normalized: fv.init_formulas_normalized.clone(),
            closed: fv.closed(),
            s5: fv.s5,
        };

        // the tree starts from the demodalized but unnormalized initial
        // formulas, chained linearly
        let mut map: HashMap<FvNodeId, NodeId> = HashMap::new();
        let mut prev: Option<NodeId> = None;
        for (i, f) in fv.init_formulas_nonmodal.iter().enumerate() {
            let id = tree.alloc(Node {
                formula: f.clone(),
                from_nodes: vec![],
                from_rule: Rule::Initial,
                instance_term: None,
                expansion_step: fv.arena[i].expansion_step,
                used: true,
                closed_end: false,
                parent: None,
                children: vec![],
                world: None,
                biconditional_expansion: false,
                dne_to: None,
                swapped_with: None,
                is_sen_node: true,
                is_removed: false,
            });
            match prev {
                None => {
                    tree.root = id;
                    tree.list.push(id);
                }
                Some(p) => tree.append_child(p, id),
            }
            map.insert(i, id);
            prev = Some(id);
        }

        for branch in fv.closed_branches.iter().chain(fv.open_branches.iter()) {
            tree.transfer_branch(fv, branch, &mut map, sig);
        }

        if tree.closed {
            tree.prune();
        }
        tree.assign_surface_names(sig);
        tree
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.arena.push(node);
        self.arena.len() - 1
    }

    /// Immutable access to a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    /// The root of the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adopt `child` below `parent`. A closed-branch marker on the parent
    /// moves down to the child, which is now the branch's end.
    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.arena[child].parent = Some(parent);
        self.arena[child].is_sen_node = true;
        self.arena[parent].children.push(child);
        self.list.push(child);
        if self.arena[parent].closed_end {
            self.arena[parent].closed_end = false;
            self.arena[child].closed_end = true;
        }
    }

    /// Swap a node with its only child so the child becomes the parent.
    /// Used to put the first alpha component above the second when the
    /// prover transferred them in the other order. The closed-branch
    /// marker stays at the bottom, and both nodes remember the swap so
    /// later branch walks recognize the shape.
    fn reverse(&mut self, a: NodeId, b: NodeId) {
        debug_assert_eq!(self.arena[a].children, vec![b]);
        let above = self.arena[a].parent;
        let below = mem::take(&mut self.arena[b].children);
        self.arena[a].children = below.clone();
        for k in below {
            self.arena[k].parent = Some(a);
        }
        self.arena[b].children = vec![a];
        self.arena[a].parent = Some(b);
        self.arena[b].parent = above;
        match above {
            Some(p) => {
                let pos = self.arena[p]
                    .children
                    .iter()
                    .position(|&c| c == a)
                    .expect("parent lists its child");
                self.arena[p].children[pos] = b;
            }
            None => self.root = b,
        }
        let ca = self.arena[a].closed_end;
        let cb = self.arena[b].closed_end;
        self.arena[a].closed_end = cb;
        self.arena[b].closed_end = ca;
        self.arena[a].swapped_with = Some(b);
        self.arena[b].swapped_with = Some(a);
        // keep the flat list in tree order
        let ia = self.list.iter().position(|&n| n == a);
        let ib = self.list.iter().position(|&n| n == b);
        if let (Some(ia), Some(ib)) = (ia, ib) {
            self.list.swap(ia, ib);
        }
    }

    /// Remove a node from the tree, splicing its children into its place.
    /// Refused (returning false) when the node has two children while its
    /// parent has another child, since the shape could not absorb both.
    pub fn remove(&mut self, n: NodeId) -> bool {
        let Some(p) = self.arena[n].parent else {
            return false;
        };
        if self.arena[p].children.len() == 1 {
            let kids = mem::take(&mut self.arena[n].children);
            self.arena[p].children = kids.clone();
            for k in &kids {
                self.arena[*k].parent = Some(p);
            }
            if let (Some(&first), Some(t)) = (kids.first(), self.arena[n].instance_term.clone())
            {
                if self.arena[first].instance_term.is_none() {
                    self.arena[first].instance_term = Some(t);
                }
            }
        } else {
            match self.arena[n].children.len() {
                0 => {
                    self.arena[p].children.retain(|&c| c != n);
                }
                1 => {
                    let c = self.arena[n].children[0];
                    let pos = self.arena[p]
                        .children
                        .iter()
                        .position(|&x| x == n)
                        .expect("parent lists its child");
                    self.arena[p].children[pos] = c;
                    self.arena[c].parent = Some(p);
                    self.arena[n].children.clear();
                }
                _ => return false,
            }
        }
        if self.arena[n].closed_end && self.arena[p].children.is_empty() {
            self.arena[p].closed_end = true;
        }
        self.arena[n].closed_end = false;
        self.arena[n].parent = None;
        self.arena[n].is_removed = true;
        self.list.retain(|&x| x != n);
        true
    }

    /// All live nodes belonging to the same rule application as `n`, in
    /// tree order: its linear ancestors and descendants plus siblings on
    /// parallel paths below the common parent.
    pub fn get_expansion(&self, n: NodeId) -> Vec<NodeId> {
        let step = self.arena[n].expansion_step;
        self.list
            .iter()
            .copied()
            .filter(|&m| self.arena[m].expansion_step == step)
            .collect()
    }

    fn resolve_dne(&self, mut n: NodeId) -> NodeId {
        while let Some(d) = self.arena[n].dne_to {
            n = d;
        }
        n
    }

    /// The deepest node of the current branch at or below `t`: a swapped
    /// partner that hangs below, or a double-negation step spliced in.
    fn tip_resolve(&self, mut t: NodeId) -> NodeId {
        loop {
            if let Some(s) = self.arena[t].swapped_with {
                if self.arena[s].parent == Some(t) {
                    t = s;
                    continue;
                }
            }
            if self.arena[t].children.len() == 1 {
                let c = self.arena[t].children[0];
                if self.arena[c].from_rule == Rule::Dne {
                    t = c;
                    continue;
                }
            }
            return t;
        }
    }

    fn transfer_branch(
        &mut self,
        fv: &FvTree,
        branch: &Branch,
        map: &mut HashMap<FvNodeId, NodeId>,
        sig: &Signature,
    ) {
        let mut tip = self.root;
        for (pos, &fv_id) in branch.nodes.iter().enumerate() {
            let sen = match map.get(&fv_id) {
                Some(&sen) => sen,
                None => {
                    let sen = self.transfer_node(fv, branch, pos, tip, map, sig);
                    map.insert(fv_id, sen);
                    sen
                }
            };
            tip = self.tip_resolve(sen);
        }
        if branch.closed {
            self.arena[tip].closed_end = true;
        }
    }

    /// Transfer one prover node into the tree, recomputing the formula the
    /// textbook rule would have produced from the node's (already
    /// denormalized) origin.
    fn transfer_node(
        &mut self,
        fv: &FvTree,
        branch: &Branch,
        pos: usize,
        tip: NodeId,
        map: &HashMap<FvNodeId, NodeId>,
        sig: &Signature,
    ) -> NodeId {
        let fv_id = branch.nodes[pos];
        let fvn = &fv.arena[fv_id];
        let fv_origin = fvn.from_nodes[0];
        let mut origin = self.resolve_dne(map[&fv_origin]);

        // reinsert the double negations that normalization erased
        while self.arena[origin].formula.kind(sig) == FormulaKind::DoubleNegation {
            origin = self.expand_double_negation(origin);
        }
        // a splice may have extended the branch below the old tip
        let tip = self.tip_resolve(tip);

        // a biconditional byproduct is not shown as a premise; its own
        // origin (the biconditional) is
        let from_nodes = if self.arena[origin].biconditional_expansion {
            self.arena[origin].from_nodes.clone()
        } else {
            let mut from = vec![origin];
            for &extra in fvn.from_nodes.iter().skip(1) {
                from.push(self.resolve_dne(map[&extra]));
            }
            from
        };

        let origin_formula = self.arena[origin].formula.clone();
        let denorm = self.denormalize(fv, branch, pos, &origin_formula, map);
        let biconditional = fvn.from_rule == Rule::Beta
            && (matches!(
                &origin_formula,
                Formula::BinOp(folm::syntax::BinOp::Iff, _, _)
            ) || matches!(&origin_formula, Formula::Not(s)
                if matches!(s.as_ref(), Formula::BinOp(folm::syntax::BinOp::Iff, _, _))));

        let id = self.alloc(Node {
            formula: denorm,
            from_nodes,
            from_rule: fvn.from_rule,
            instance_term: fvn.instance_term.clone(),
            expansion_step: fvn.expansion_step,
            used: fvn.used && !biconditional,
            closed_end: false,
            parent: None,
            children: vec![],
            world: None,
            biconditional_expansion: biconditional,
            dne_to: None,
            swapped_with: None,
            is_sen_node: false,
            is_removed: false,
        });
        self.append_child(tip, id);

        match fvn.from_rule {
            Rule::Alpha => self.fix_alpha_order(id, &origin_formula),
            Rule::Beta => self.fix_beta_order(tip, id, &origin_formula),
            _ => {}
        }
        id
    }

    /// Recompute the unnormalized formula for the node at `pos` of
    /// `branch` from its origin's formula. If no candidate's normal form
    /// matches the prover's formula, the prover formula is kept: the tree
    /// stays structurally sound, merely less pretty at that node.
    fn denormalize(
        &self,
        fv: &FvTree,
        branch: &Branch,
        pos: usize,
        origin: &Formula,
        map: &HashMap<FvNodeId, NodeId>,
    ) -> Formula {
        let fvn = &fv.arena[branch.nodes[pos]];
        let fallback = || {
            log::warn!(
                "no candidate matches {} under {}",
                fvn.formula,
                printer::formula(origin)
            );
            fvn.formula.clone()
        };
        match fvn.from_rule {
            Rule::Alpha => {
                let (Some(a1), Some(a2)) = (alpha(origin, 1), alpha(origin, 2)) else {
                    return fallback();
                };
                match (nnf(&a1) == fvn.formula, nnf(&a2) == fvn.formula) {
                    (true, false) => a1,
                    (false, true) => a2,
                    (true, true) => {
                        // both components normalize alike; the first of
                        // the pair is followed on the branch by its twin
                        let next_is_twin = branch.nodes.get(pos + 1).is_some_and(|&next| {
                            !map.contains_key(&next)
                                && fv.arena[next].from_rule == Rule::Alpha
                                && fv.arena[next].from_nodes == fvn.from_nodes
                        });
                        if next_is_twin {
                            a1
                        } else {
                            a2
                        }
                    }
                    (false, false) => fallback(),
                }
            }
            Rule::Beta => {
                let (Some(b1), Some(b2)) = (beta(origin, 1), beta(origin, 2)) else {
                    return fallback();
                };
                match (nnf(&b1) == fvn.formula, nnf(&b2) == fvn.formula) {
                    (true, false) => b1,
                    (false, true) => b2,
                    (true, true) => {
                        // the left case of this application was already
                        // adopted iff some tree node carries its step
                        let taken = self
                            .list
                            .iter()
                            .any(|&c| self.arena[c].expansion_step == fvn.expansion_step);
                        if taken {
                            b2
                        } else {
                            b1
                        }
                    }
                    (false, false) => fallback(),
                }
            }
            Rule::Gamma | Rule::Delta => {
                let Some(inst) = &fvn.instance_term else {
                    return fallback();
                };
                match instantiate(origin, inst) {
                    Some(f) => f,
                    None => fallback(),
                }
            }
            Rule::ModalGamma => {
                let Some(inst) = &fvn.instance_term else {
                    return fallback();
                };
                match modal_matrix(origin, inst) {
                    Some((_, matrix)) => matrix,
                    None => fallback(),
                }
            }
            Rule::ModalDelta => {
                let Some(inst) = &fvn.instance_term else {
                    return fallback();
                };
                match modal_matrix(origin, inst) {
                    Some((guard, matrix)) => {
                        // a diamond expands to the accessibility fact and
                        // the instantiated matrix; under S5 the guard is
                        // bypassed entirely
                        if !self.s5
                            && guard.as_ref().is_some_and(|g| nnf(g) == fvn.formula)
                        {
                            guard.unwrap()
                        } else if nnf(&matrix) == fvn.formula {
                            matrix
                        } else {
                            fallback()
                        }
                    }
                    None => fallback(),
                }
            }
            Rule::Initial | Rule::Dne => fallback(),
        }
    }

    /// Alpha results must appear first-above-second; swap if the prover
    /// transferred them in the other order.
    fn fix_alpha_order(&mut self, id: NodeId, origin: &Formula) {
        let Some(parent) = self.arena[id].parent else {
            return;
        };
        if self.arena[parent].expansion_step != self.arena[id].expansion_step
            || self.arena[parent].from_rule != Rule::Alpha
        {
            return;
        }
        let (Some(a1), Some(a2)) = (alpha(origin, 1), alpha(origin, 2)) else {
            return;
        };
        if self.arena[id].formula == a1 && self.arena[parent].formula == a2 {
            self.reverse(parent, id);
        }
    }

    /// Beta children must appear first-on-the-left; swap the child order
    /// if the second-appended child carries the first component.
    fn fix_beta_order(&mut self, parent: NodeId, id: NodeId, origin: &Formula) {
        let children = self.arena[parent].children.clone();
        if children.len() != 2 || children[1] != id {
            return;
        }
        let (Some(b1), Some(b2)) = (beta(origin, 1), beta(origin, 2)) else {
            return;
        };
        if self.arena[id].formula == b1 && self.arena[children[0]].formula == b2 {
            self.arena[parent].children.swap(0, 1);
        }
    }

    /// Synthesize the double-negation elimination step below a ¬¬ node,
    /// once. The new node is spliced after the node's rule-application
    /// group (after the second alpha result when the origin was the first
    /// of an alpha pair), and every origin link to the ¬¬ node is
    /// redirected to the new node.
    fn expand_double_negation(&mut self, o: NodeId) -> NodeId {
        if let Some(n) = self.arena[o].dne_to {
            return n;
        }
        let inner = match &self.arena[o].formula {
            Formula::Not(s) => match s.as_ref() {
                Formula::Not(x) => (**x).clone(),
                _ => self.arena[o].formula.clone(),
            },
            _ => self.arena[o].formula.clone(),
        };
        let step = self.arena[o].expansion_step;
        let mut at = o;
        loop {
            let next = self.arena[at]
                .children
                .iter()
                .copied()
                .find(|&c| self.arena[c].expansion_step == step);
            match next {
                Some(c) => at = c,
                None => break,
            }
        }
        let id = self.alloc(Node {
            formula: inner,
            from_nodes: vec![o],
            from_rule: Rule::Dne,
            instance_term: None,
            expansion_step: step,
            used: self.arena[o].used,
            closed_end: false,
            parent: None,
            children: vec![],
            world: None,
            biconditional_expansion: false,
            dne_to: None,
            swapped_with: None,
            is_sen_node: true,
            is_removed: false,
        });
        let kids = mem::take(&mut self.arena[at].children);
        self.arena[at].children = vec![id];
        self.arena[id].parent = Some(at);
        self.arena[id].children = kids.clone();
        for k in kids {
            self.arena[k].parent = Some(id);
        }
        if self.arena[at].closed_end {
            self.arena[at].closed_end = false;
            self.arena[id].closed_end = true;
        }
        let at_pos = self
            .list
            .iter()
            .position(|&n| n == at)
            .expect("splice point is in the tree");
        self.list.insert(at_pos + 1, id);
        for n in 0..self.arena.len() {
            if n != id {
                for f in &mut self.arena[n].from_nodes {
                    if *f == o {
                        *f = id;
                    }
                }
            }
        }
        self.arena[o].dne_to = Some(id);
        id
    }

    /// Remove the nodes that did not contribute to closing the tableau.
    /// First every used node's whole rule application is marked used
    /// (except biconditional byproducts), then every still-unused node is
    /// removed; a node whose shape cannot be spliced out survives.
    fn prune(&mut self) {
        for id in self.list.clone() {
            if self.arena[id].used {
                for m in self.get_expansion(id) {
                    if !self.arena[m].biconditional_expansion {
                        self.arena[m].used = true;
                    }
                }
            }
        }
        for id in self.list.clone() {
            if !self.arena[id].used && !self.remove(id) {
                log::debug!("unused node survived pruning: {}", self.arena[id].formula);
            }
        }
    }

    /// Replace every prover variable (ξ/ζ) and Skolem term (φ/ω-rooted)
    /// with a fresh surface constant, walking the nodes in tree order so
    /// the assignment is determined by the final tree shape. The same
    /// internal term maps to the same constant everywhere.
    fn assign_surface_names(&mut self, sig: &mut Signature) {
        let mut map: Vec<(Term, Term)> = vec![];
        for id in self.list.clone() {
            loop {
                let mut f = self.arena[id].formula.clone();
                for (old, new) in &map {
                    f = substitute(&f, old, new, false);
                }
                match first_internal_term(&f) {
                    None => {
                        self.arena[id].formula = f;
                        break;
                    }
                    Some(t) => {
                        let world =
                            t.head().starts_with('ζ') || t.head().starts_with('ω');
                        let fresh = if world {
                            sig.fresh_world_name()
                        } else {
                            sig.fresh_constant()
                        };
                        map.push((t, Term::id(fresh)));
                    }
                }
            }
            if let Some(t) = self.arena[id].instance_term.clone() {
                let mut t = t;
                for (old, new) in &map {
                    t = replace_term(&t, old, new);
                }
                self.arena[id].instance_term = Some(t);
            }
        }
    }

    /// Rewrite every node back into modal notation and attach world
    /// labels. The accessibility facts materialized by modal expansions
    /// are removed and the origin links of their dependents restitched to
    /// the modal premise.
    pub fn modalize(&mut self, sig: &Signature) {
        if !sig.is_modal {
            return;
        }
        for id in self.list.clone() {
            if self.arena[id].is_removed || !is_accessibility_literal(&self.arena[id].formula)
            {
                continue;
            }
            for n in 0..self.arena.len() {
                self.arena[n].from_nodes.retain(|&x| x != id);
            }
            if !self.remove(id) {
                log::debug!(
                    "accessibility node survived modalizing: {}",
                    self.arena[id].formula
                );
            }
        }
        for id in self.list.clone() {
            let (f, world) = translate_to_modal(&self.arena[id].formula, sig);
            self.arena[id].formula = f;
            self.arena[id].world = world;
        }
    }

    /// The first leaf of an open branch, in tree order.
    pub fn open_leaf(&self) -> Option<NodeId> {
        self.list
            .iter()
            .copied()
            .find(|&id| self.arena[id].children.is_empty() && !self.arena[id].closed_end)
    }

    /// The formulas on the path from the root to `leaf`, inclusive.
    pub fn path_to_root(&self, leaf: NodeId) -> Vec<NodeId> {
        let mut path = vec![leaf];
        let mut at = leaf;
        while let Some(p) = self.arena[at].parent {
            path.push(p);
            at = p;
        }
        path.reverse();
        path
    }

    fn line_no(&self, id: NodeId) -> usize {
        self.list.iter().position(|&n| n == id).map_or(0, |p| p + 1)
    }

    fn render(&self, id: NodeId, prefix: &str, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.arena[id];
        let world = node
            .world
            .as_ref()
            .map_or(String::new(), |w| format!(" ({w})"));
        let rule = match node.from_rule {
            Rule::Initial => "assumption".to_string(),
            _ => {
                let premises = node
                    .from_nodes
                    .iter()
                    .map(|&n| self.line_no(n).to_string())
                    .join(",");
                let tag = match node.from_rule {
                    Rule::Alpha => "α",
                    Rule::Beta => "β",
                    Rule::Gamma => "γ",
                    Rule::Delta => "δ",
                    Rule::ModalGamma => "□",
                    Rule::ModalDelta => "◇",
                    Rule::Dne => "¬¬",
                    Rule::Initial => unreachable!(),
                };
                format!("{premises} {tag}")
            }
        };
        let mark = if node.closed_end && node.children.is_empty() {
            " ✗"
        } else {
            ""
        };
        writeln!(
            out,
            "{prefix}{}. {}{world}  [{rule}]{mark}",
            self.line_no(id),
            node.formula
        )?;
        match node.children.len() {
            0 | 1 => {
                if let Some(&c) = node.children.first() {
                    self.render(c, prefix, out)?;
                }
            }
            _ => {
                for &c in &node.children {
                    self.render(c, &format!("{prefix}  "), out)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for SentenceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(self.root, "", f)
    }
}

/// Instantiate a (possibly negated) quantified formula's matrix.
fn instantiate(origin: &Formula, inst: &Term) -> Option<Formula> {
    match origin {
        Formula::Quantified(_, v, m) => Some(substitute(m, &Term::id(v), inst, false)),
        Formula::Not(sub) => match sub.as_ref() {
            Formula::Quantified(_, v, m) => Some(Formula::negate(substitute(
                m,
                &Term::id(v),
                inst,
                false,
            ))),
            _ => None,
        },
        _ => None,
    }
}

/// Decompose a modal expansion origin into its instantiated accessibility
/// guard and matrix: ∀v(Rwv→M) and ¬∃v(Rwv∧M) produce M[v:=t] and
/// ¬M[v:=t]; ∃v(Rwv∧M) and ¬∀v(Rwv→M) additionally produce the guard
/// R(w,t). Collapsed (guard-free) shapes instantiate the matrix directly.
fn modal_matrix(origin: &Formula, inst: &Term) -> Option<(Option<Formula>, Formula)> {
    let split = |v: &str, m: &Formula| -> (Option<Formula>, Formula) {
        match m {
            Formula::BinOp(folm::syntax::BinOp::Implies, g, body)
            | Formula::BinOp(folm::syntax::BinOp::And, g, body)
                if is_guard(g, v) =>
            {
                (
                    Some(substitute(g, &Term::id(v), inst, false)),
                    (**body).clone(),
                )
            }
            Formula::BinOp(folm::syntax::BinOp::Or, g, body) => match g.as_ref() {
                Formula::Not(inner) if is_guard(inner, v) => (
                    Some(substitute(inner, &Term::id(v), inst, false)),
                    (**body).clone(),
                ),
                _ => (None, m.clone()),
            },
            _ => (None, m.clone()),
        }
    };
    match origin {
        Formula::Quantified(_, v, m) => {
            let (guard, body) = split(v, m);
            Some((guard, substitute(&body, &Term::id(v), inst, false)))
        }
        Formula::Not(sub) => match sub.as_ref() {
            Formula::Quantified(_, v, m) => {
                let (guard, body) = split(v, m);
                Some((
                    guard,
                    Formula::negate(substitute(&body, &Term::id(v), inst, false)),
                ))
            }
            _ => None,
        },
        _ => None,
    }
}

fn is_guard(f: &Formula, v: &str) -> bool {
    matches!(f, Formula::Atom(p, args)
        if p == ACCESSIBILITY && args.len() == 2 && args[1] == Term::Id(v.to_string()))
}

fn is_accessibility_literal(f: &Formula) -> bool {
    match f {
        Formula::Atom(p, _) => p == ACCESSIBILITY,
        Formula::Not(s) => matches!(s.as_ref(), Formula::Atom(p, _) if p == ACCESSIBILITY),
        _ => false,
    }
}

/// The first ξ/ζ variable or φ/ω-rooted Skolem term in the formula, in
/// pre-order, whole terms before their arguments.
fn first_internal_term(f: &Formula) -> Option<Term> {
    for t in f.atom_terms() {
        for s in t.subterms() {
            let head = s.head();
            if head.starts_with('ξ')
                || head.starts_with('ζ')
                || head.starts_with('φ')
                || head.starts_with('ω')
            {
                return Some(s.clone());
            }
        }
    }
    None
}

fn replace_term(t: &Term, old: &Term, new: &Term) -> Term {
    if t == old {
        return new.clone();
    }
    match t {
        Term::Id(_) => t.clone(),
        Term::App(f, args) => Term::App(
            f.clone(),
            args.iter().map(|a| replace_term(a, old, new)).collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::prove;
    use folm::parser::parse;

    fn sentree(s: &str, s5: bool) -> (SentenceTree, Signature) {
        let (goal, mut sig) = parse(s).unwrap();
        let fv = prove(&goal, &mut sig, s5, 500).unwrap();
        let tree = SentenceTree::new(&fv, &mut sig);
        (tree, sig)
    }

    fn check_shape(tree: &SentenceTree) {
        // every live node is reachable from the root and listed exactly
        // once; no removed node is listed
        let mut reachable = vec![];
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            reachable.push(id);
            assert!(!tree.node(id).is_removed);
            assert!(tree.node(id).children.len() <= 2);
            stack.extend(tree.node(id).children.iter().copied());
        }
        reachable.sort_unstable();
        let mut listed = tree.list.clone();
        listed.sort_unstable();
        assert_eq!(reachable, listed);
        // origins precede their conclusions on the path to the root
        for &id in &tree.list {
            for &o in &tree.node(id).from_nodes {
                assert!(
                    tree.path_to_root(id).contains(&o),
                    "origin is an ancestor"
                );
            }
        }
    }

    #[test]
    fn test_denormalized_formulas() {
        let (tree, _) = sentree("p→p", false);
        check_shape(&tree);
        assert!(tree.closed);
        // the root shows the unnormalized assumption
        assert_eq!(
            printer::formula(&tree.node(tree.root()).formula),
            "¬(pw→pw)"
        );
        // its alpha expansion shows pw and ¬pw, not the NNF pair
        let shown: Vec<String> = tree
            .list
            .iter()
            .map(|&id| printer::formula(&tree.node(id).formula))
            .collect();
        assert!(shown.contains(&"pw".to_string()));
        assert!(shown.contains(&"¬pw".to_string()));
    }

    #[test]
    fn test_alpha_order() {
        let (tree, _) = sentree("¬(p∧¬p)", false);
        check_shape(&tree);
        assert!(tree.closed);
        // alpha components appear first-above-second wherever both are kept
        for &id in &tree.list {
            let n = tree.node(id);
            if n.from_rule == Rule::Alpha {
                if let Some(parent) = n.parent {
                    let p = tree.node(parent);
                    if p.expansion_step == n.expansion_step {
                        let origin = &tree.node(n.from_nodes[0]).formula;
                        assert_eq!(Some(p.formula.clone()), alpha(origin, 1));
                        assert_eq!(Some(n.formula.clone()), alpha(origin, 2));
                    }
                }
            }
        }
    }

    #[test]
    fn test_double_negation_insertion() {
        let (tree, _) = sentree("¬¬(p∧q)→p", false);
        check_shape(&tree);
        assert!(tree.closed);
        let shown: Vec<String> = tree
            .list
            .iter()
            .map(|&id| printer::formula(&tree.node(id).formula))
            .collect();
        // the assumption's first component is the double negation, and the
        // tableau shows the explicit elimination step below the alpha pair
        assert!(shown.contains(&"¬¬(pw∧qw)".to_string()), "{shown:?}");
        assert!(shown.contains(&"(pw∧qw)".to_string()), "{shown:?}");
        let dne: Vec<NodeId> = tree
            .list
            .iter()
            .copied()
            .filter(|&id| tree.node(id).from_rule == Rule::Dne)
            .collect();
        assert_eq!(dne.len(), 1);
        // the elimination step sits after its origin's whole alpha pair
        let parent = tree.node(dne[0]).parent.unwrap();
        assert_eq!(
            tree.node(parent).expansion_step,
            tree.node(tree.node(dne[0]).from_nodes[0]).expansion_step
        );
    }

    #[test]
    fn test_biconditional_byproducts_pruned() {
        let (tree, _) = sentree("(p↔q)→(q↔p)", false);
        check_shape(&tree);
        assert!(tree.closed);
        for &id in &tree.list {
            assert!(
                !tree.node(id).biconditional_expansion,
                "byproduct survived pruning"
            );
        }
        // children of the biconditional expansion point straight at it
        for &id in &tree.list {
            let n = tree.node(id);
            if n.from_rule == Rule::Alpha && !n.from_nodes.is_empty() {
                let o = tree.node(n.from_nodes[0]);
                assert!(!o.biconditional_expansion);
            }
        }
    }

    #[test]
    fn test_naming_pass() {
        let (tree, _) = sentree("(∀x(Fx→Gx)∧Fa)→Ga", false);
        check_shape(&tree);
        assert!(tree.closed);
        for &id in &tree.list {
            let f = printer::formula(&tree.node(id).formula);
            for bad in ['ξ', 'ζ', 'φ', 'ω'] {
                assert!(!f.contains(bad), "internal symbol in {f}");
            }
        }
    }

    #[test]
    fn test_naming_deterministic() {
        let (goal, mut sig) = parse("∃x(Fx∧Gx)→∃xFx").unwrap();
        let fv = prove(&goal, &mut sig, false, 500).unwrap();
        let mut sig2 = sig.clone();
        let a = SentenceTree::new(&fv, &mut sig);
        let b = SentenceTree::new(&fv, &mut sig2);
        let fa: Vec<String> = a.list.iter().map(|&i| printer::formula(&a.node(i).formula)).collect();
        let fb: Vec<String> = b.list.iter().map(|&i| printer::formula(&b.node(i).formula)).collect();
        assert_eq!(fa, fb);
    }

    #[test]
    fn test_pruning_used_closure() {
        let (tree, _) = sentree("((p→q)∧p)→q", false);
        check_shape(&tree);
        assert!(tree.closed);
        for &id in &tree.list {
            assert!(tree.node(id).used, "unused node survived in closed tree");
            for m in tree.get_expansion(id) {
                assert!(tree.node(m).used);
            }
        }
    }

    #[test]
    fn test_modalize() {
        let (mut tree, sig) = sentree("□(p→q)→(□p→□q)", false);
        check_shape(&tree);
        assert!(tree.closed);
        tree.modalize(&sig);
        check_shape(&tree);
        for &id in &tree.list {
            let f = printer::formula(&tree.node(id).formula);
            assert!(!f.contains(ACCESSIBILITY), "accessibility left in {f}");
            assert!(!f.contains('ζ') && !f.contains('ω'));
        }
        // the root reads as the negated modal assumption again
        assert_eq!(
            printer::formula(&tree.node(tree.root()).formula),
            "¬(□(p→q)→(□p→□q))"
        );
    }

    #[test]
    fn test_open_tree_keeps_all_nodes() {
        let (tree, _) = sentree("p→q", false);
        check_shape(&tree);
        assert!(!tree.closed);
        assert!(tree.open_leaf().is_some());
    }

    #[test]
    fn test_display_renders_every_line() {
        let (tree, _) = sentree("((p→q)∧p)→q", false);
        let out = format!("{tree}");
        for &id in &tree.list {
            let f = printer::formula(&tree.node(id).formula);
            assert!(out.contains(&f), "{f} missing from rendering");
        }
        assert!(out.contains('✗'));
    }
}
