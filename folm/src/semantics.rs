// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Partial first-order models over small integer domains.
//!
//! A [`Model`] interprets ground terms as integers, predicates as positive
//! and negative tuple sets, and function symbols pointwise. It is built
//! incrementally: [`Model::extend_to_satisfy`] tries to grow the
//! interpretation so that a formula comes out true, failing when the
//! positive and negative facts would clash. Countermodel extraction reads a
//! canonical model off an open tableau branch this way.

use crate::printer;
use crate::syntax::{BinOp, Formula, Quantifier, Signature, Term};
use crate::term::nnf::nnf;
use itertools::Itertools;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Element is an integer type for representing members of a universe.
pub type Element = usize;

/// A partial model with a separate universe of worlds for modal input.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    /// The signature the model interprets
    pub signature: Signature,
    /// Individual domain elements, always 0..n
    pub domain: Vec<Element>,
    /// World elements, always 0..k; world 0 is the base world
    pub worlds: Vec<Element>,
    /// Denotation of each individual ground term, keyed by its rendering
    pub denotations: HashMap<String, Element>,
    /// Denotation of each world term
    pub world_denotations: HashMap<String, Element>,
    /// Pointwise function interpretations
    pub functions: HashMap<String, HashMap<Vec<Element>, Element>>,
    positive: HashMap<String, HashSet<Vec<Element>>>,
    negative: HashMap<String, HashSet<Vec<Element>>>,
    element_terms: Vec<Term>,
    world_terms: Vec<Term>,
}

impl Model {
    /// A model with `n_indivs` anonymous individuals and `n_worlds` worlds.
    pub fn new(signature: Signature, n_indivs: usize, n_worlds: usize) -> Self {
        let mut model = Self {
            signature,
            domain: vec![],
            worlds: vec![],
            denotations: HashMap::new(),
            world_denotations: HashMap::new(),
            functions: HashMap::new(),
            positive: HashMap::new(),
            negative: HashMap::new(),
            element_terms: vec![],
            world_terms: vec![],
        };
        for i in 0..n_indivs {
            model.alloc_element(&Term::id(i.to_string()), false);
        }
        for i in 0..n_worlds {
            model.alloc_element(&Term::id(format!("w{i}")), true);
        }
        model
    }

    fn alloc_element(&mut self, canonical: &Term, world: bool) -> Element {
        if world {
            let e = self.worlds.len();
            self.worlds.push(e);
            self.world_terms.push(canonical.clone());
            self.world_denotations.insert(printer::term(canonical), e);
            e
        } else {
            let e = self.domain.len();
            self.domain.push(e);
            self.element_terms.push(canonical.clone());
            self.denotations.insert(printer::term(canonical), e);
            e
        }
    }

    /// The element a ground term denotes, allocating a fresh one the first
    /// time the term is seen. A composite term denotes its own fresh
    /// element, and the functor's interpretation at the arguments' elements
    /// is recorded to match.
    pub fn denote(&mut self, t: &Term) -> Element {
        let world = t.is_world(&self.signature);
        let key = printer::term(t);
        let map = if world {
            &self.world_denotations
        } else {
            &self.denotations
        };
        if let Some(&e) = map.get(&key) {
            return e;
        }
        if let Term::App(f, args) = t {
            let tuple: Vec<Element> = args.iter().map(|a| self.denote(a)).collect();
            let e = self.alloc_element(t, world);
            self.functions
                .entry(f.clone())
                .or_default()
                .insert(tuple, e);
            e
        } else {
            self.alloc_element(t, world)
        }
    }

    /// Promote an empty domain to {0}, and an empty world set likewise.
    pub fn ensure_nonempty(&mut self) {
        if self.domain.is_empty() {
            self.alloc_element(&Term::id("0"), false);
        }
        if self.worlds.is_empty() && self.signature.is_modal {
            self.alloc_element(&Term::id("w"), true);
        }
    }

    fn canonical_term(&self, e: Element, world: bool) -> Term {
        if world {
            self.world_terms[e].clone()
        } else {
            self.element_terms[e].clone()
        }
    }

    /// Try to extend the model so that `f` is satisfied. Mutates the model;
    /// on failure the partial mutations are unspecified and the model
    /// should be discarded.
    pub fn extend_to_satisfy(&mut self, f: &Formula) -> bool {
        match f {
            Formula::Atom(p, args) => {
                let tuple: Vec<Element> = args.iter().map(|a| self.denote(a)).collect();
                if self
                    .negative
                    .get(p)
                    .map_or(false, |set| set.contains(&tuple))
                {
                    return false;
                }
                self.positive.entry(p.clone()).or_default().insert(tuple);
                true
            }
            Formula::Not(sub) => match sub.as_ref() {
                Formula::Atom(p, args) => {
                    let tuple: Vec<Element> = args.iter().map(|a| self.denote(a)).collect();
                    if self
                        .positive
                        .get(p)
                        .map_or(false, |set| set.contains(&tuple))
                    {
                        return false;
                    }
                    self.negative.entry(p.clone()).or_default().insert(tuple);
                    true
                }
                _ => self.extend_to_satisfy(&nnf(f)),
            },
            Formula::BinOp(BinOp::And, lhs, rhs) => {
                self.extend_to_satisfy(lhs) && self.extend_to_satisfy(rhs)
            }
            Formula::BinOp(BinOp::Or, lhs, rhs) => {
                let saved = self.clone();
                if self.extend_to_satisfy(lhs) {
                    return true;
                }
                *self = saved;
                self.extend_to_satisfy(rhs)
            }
            Formula::BinOp(_, _, _) => self.extend_to_satisfy(&nnf(f)),
            Formula::Quantified(Quantifier::Forall, v, m) => {
                let world = Term::id(v).is_world(&self.signature);
                let elems = if world {
                    self.worlds.clone()
                } else {
                    self.domain.clone()
                };
                for e in elems {
                    let t = self.canonical_term(e, world);
                    let inst =
                        crate::term::subst::substitute(m, &Term::id(v), &t, false);
                    if !self.extend_to_satisfy(&inst) {
                        return false;
                    }
                }
                true
            }
            Formula::Quantified(Quantifier::Exists, v, m) => {
                let world = Term::id(v).is_world(&self.signature);
                let elems = if world {
                    self.worlds.clone()
                } else {
                    self.domain.clone()
                };
                for e in elems {
                    let t = self.canonical_term(e, world);
                    let inst =
                        crate::term::subst::substitute(m, &Term::id(v), &t, false);
                    let saved = self.clone();
                    if self.extend_to_satisfy(&inst) {
                        return true;
                    }
                    *self = saved;
                }
                false
            }
            Formula::Modal(_, _) => {
                log::debug!("cannot extend model over untranslated modal formula {f}");
                false
            }
        }
    }

    /// Whether the model can be extended to satisfy every given formula.
    pub fn satisfies_init_formulas(&mut self, init: &[Formula]) -> bool {
        init.iter().all(|f| self.extend_to_satisfy(f))
    }

    /// Render the model for display.
    pub fn fmt(&self) -> String {
        let mut lines = vec![];
        lines.push(format!(
            "Domain: {{ {} }}",
            self.domain.iter().map(|e| e.to_string()).join(", ")
        ));
        if !self.worlds.is_empty() {
            lines.push(format!(
                "Worlds: {{ {} }}",
                self.worlds.iter().map(|e| e.to_string()).join(", ")
            ));
        }
        for (term, e) in self
            .denotations
            .iter()
            .chain(self.world_denotations.iter())
            .sorted()
        {
            lines.push(format!("{term} ↦ {e}"));
        }
        for (p, tuples) in self.positive.iter().sorted_by_key(|(p, _)| p.to_string()) {
            lines.push(format!(
                "{p}: {{ {} }}",
                tuples
                    .iter()
                    .sorted()
                    .map(|t| format!("({})", t.iter().map(|e| e.to_string()).join(",")))
                    .join(", ")
            ));
        }
        lines.join("\n")
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fmt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{formula, parse};

    #[test]
    fn test_denote_composite() {
        let (_, sig) = parse("Pf(a)").unwrap();
        let mut model = Model::new(sig, 0, 0);
        let t = Term::app("f", vec![Term::id("a")]);
        let e = model.denote(&t);
        assert_eq!(model.denotations["a"], 0);
        assert_eq!(e, 1);
        assert_eq!(model.functions["f"][&vec![0]], 1);
        // stable on re-lookup
        assert_eq!(model.denote(&t), 1);
    }

    #[test]
    fn test_extend_literal_conflict() {
        let (_, sig) = parse("Pa∧¬Pa").unwrap();
        let mut model = Model::new(sig, 0, 0);
        assert!(model.extend_to_satisfy(&formula("Pa")));
        assert!(!model.extend_to_satisfy(&formula("¬Pa")));
    }

    #[test]
    fn test_extend_disjunction_backtracks() {
        let (_, sig) = parse("Pa∨Qa").unwrap();
        let mut model = Model::new(sig, 0, 0);
        assert!(model.extend_to_satisfy(&formula("¬Pa")));
        assert!(model.extend_to_satisfy(&formula("Pa∨Qa")));
        // Pa is blocked, so the disjunction must have gone right
        assert!(model.positive["Q"].contains(&vec![0]));
    }

    #[test]
    fn test_extend_quantifiers() {
        let (_, sig) = parse("∀x(Fx∨Gx)").unwrap();
        let mut model = Model::new(sig, 2, 0);
        assert!(model.extend_to_satisfy(&formula("∀x(Fx∨Gx)")));
        assert!(model.extend_to_satisfy(&formula("∃x¬Fx")) || model.positive["F"].len() == 2);
    }

    #[test]
    fn test_ensure_nonempty() {
        let (_, sig) = parse("p").unwrap();
        let mut model = Model::new(sig, 0, 0);
        model.ensure_nonempty();
        assert_eq!(model.domain, vec![0]);
    }
}
