// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The folm AST for terms and formulas, and the symbol table that
//! accompanies every parsed formula.

use serde::Serialize;
use std::collections::HashMap;

/// The reserved accessibility predicate introduced by the standard
/// translation of modal formulas.
pub const ACCESSIBILITY: &str = "R";

/// The distinguished world constant at which the input formula is evaluated.
pub const BASE_WORLD: &str = "w";

/// A kind of quantifier (forall or exists)
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum Quantifier {
    Forall,
    Exists,
}

/// Binary connectives
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum BinOp {
    And,
    Or,
    Implies,
    Iff,
}

/// Modal operators
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum MOp {
    /// The box operator: true at every accessible world
    Necessity,
    /// The diamond operator: true at some accessible world
    Possibility,
}

/// A Term is an individual-denoting (or world-denoting) expression: a plain
/// symbol or a function symbol applied to argument terms.
#[derive(PartialEq, Eq, Clone, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum Term {
    /// A constant, variable, or world name
    Id(String),
    /// Application of a function symbol to argument terms
    App(String, Vec<Term>),
}

impl Term {
    /// Smart constructor for a plain symbol
    pub fn id<S: AsRef<str>>(s: S) -> Self {
        Self::Id(s.as_ref().to_string())
    }

    /// Smart constructor for function applications
    pub fn app(f: &str, args: Vec<Term>) -> Self {
        Self::App(f.to_string(), args)
    }

    /// The head symbol: the identifier itself, or the functor of an
    /// application.
    pub fn head(&self) -> &str {
        match self {
            Term::Id(s) => s,
            Term::App(f, _) => f,
        }
    }

    /// Whether `sub` occurs somewhere inside this term (including as the
    /// whole term).
    pub fn contains(&self, sub: &Term) -> bool {
        if self == sub {
            return true;
        }
        match self {
            Term::Id(_) => false,
            Term::App(_, args) => args.iter().any(|a| a.contains(sub)),
        }
    }

    /// All subterms in pre-order, starting with the term itself.
    pub fn subterms(&self) -> Vec<&Term> {
        let mut out = vec![self];
        if let Term::App(_, args) = self {
            for a in args {
                out.extend(a.subterms());
            }
        }
        out
    }

    /// Whether this term denotes a world: the base world, a world variable
    /// or Skolem world introduced by the prover, or a symbol the signature
    /// registered with a world kind.
    pub fn is_world(&self, sig: &Signature) -> bool {
        let head = self.head();
        head == BASE_WORLD
            || head.starts_with('ζ')
            || head.starts_with('ω')
            || matches!(
                sig.kind(head),
                Some(SymbolKind::WorldConstant | SymbolKind::WorldVariable)
            )
    }
}

/// A Formula is a syntactic tree over atoms built from terms. Formulas are
/// value-like: every transformation produces a fresh formula.
#[derive(PartialEq, Eq, Clone, Debug, Hash, PartialOrd, Ord, Serialize)]
pub enum Formula {
    /// Predicate applied to terms; propositional letters have no terms
    Atom(String, Vec<Term>),
    /// Negation
    Not(Box<Formula>),
    /// Binary connective
    BinOp(BinOp, Box<Formula>, Box<Formula>),
    /// Quantifier binding a single variable
    Quantified(Quantifier, String, Box<Formula>),
    /// Modal operator (absent after translation to first order)
    Modal(MOp, Box<Formula>),
}

/// Smullyan's classification of expansion behavior, extended with the modal
/// and double-negation cases.
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum FormulaKind {
    Literal,
    Alpha,
    Beta,
    Gamma,
    Delta,
    Boxy,
    Diamondy,
    DoubleNegation,
}

impl Formula {
    /// Smart constructor for an atom
    pub fn atom(p: &str, args: Vec<Term>) -> Self {
        Self::Atom(p.to_string(), args)
    }

    /// Returns ¬f without any simplification.
    pub fn negate(f: Formula) -> Self {
        Self::Not(Box::new(f))
    }

    /// Convenience constructor for `lhs ∧ rhs`
    pub fn and(lhs: Formula, rhs: Formula) -> Self {
        Self::BinOp(BinOp::And, Box::new(lhs), Box::new(rhs))
    }

    /// Convenience constructor for `lhs ∨ rhs`
    pub fn or(lhs: Formula, rhs: Formula) -> Self {
        Self::BinOp(BinOp::Or, Box::new(lhs), Box::new(rhs))
    }

    /// Convenience constructor for `lhs → rhs`
    pub fn implies(lhs: Formula, rhs: Formula) -> Self {
        Self::BinOp(BinOp::Implies, Box::new(lhs), Box::new(rhs))
    }

    /// Convenience constructor for `lhs ↔ rhs`
    pub fn iff(lhs: Formula, rhs: Formula) -> Self {
        Self::BinOp(BinOp::Iff, Box::new(lhs), Box::new(rhs))
    }

    /// Convenience constructor for `∀v f`
    pub fn forall(v: &str, f: Formula) -> Self {
        Self::Quantified(Quantifier::Forall, v.to_string(), Box::new(f))
    }

    /// Convenience constructor for `∃v f`
    pub fn exists(v: &str, f: Formula) -> Self {
        Self::Quantified(Quantifier::Exists, v.to_string(), Box::new(f))
    }

    /// Whether any modal operator occurs in the formula.
    pub fn is_modal(&self) -> bool {
        match self {
            Formula::Atom(_, _) => false,
            Formula::Not(f) => f.is_modal(),
            Formula::BinOp(_, lhs, rhs) => lhs.is_modal() || rhs.is_modal(),
            Formula::Quantified(_, _, f) => f.is_modal(),
            Formula::Modal(_, _) => true,
        }
    }

    /// All terms appearing as atom arguments, in pre-order.
    pub fn atom_terms(&self) -> Vec<&Term> {
        match self {
            Formula::Atom(_, args) => args.iter().collect(),
            Formula::Not(f) | Formula::Quantified(_, _, f) | Formula::Modal(_, f) => {
                f.atom_terms()
            }
            Formula::BinOp(_, lhs, rhs) => {
                let mut out = lhs.atom_terms();
                out.extend(rhs.atom_terms());
                out
            }
        }
    }

    /// The free variables the prover introduced into this formula (symbols
    /// prefixed ξ or ζ), deduplicated in order of first occurrence. These
    /// are globally fresh, so no binder tracking is needed.
    pub fn prover_variables(&self) -> Vec<String> {
        let mut out: Vec<String> = vec![];
        for term in self.atom_terms() {
            for sub in term.subterms() {
                if let Term::Id(s) = sub {
                    if (s.starts_with('ξ') || s.starts_with('ζ')) && !out.contains(s) {
                        out.push(s.clone());
                    }
                }
            }
        }
        out
    }

    /// Classify the formula's expansion behavior. The signature decides
    /// whether a quantified variable ranges over worlds, which makes a
    /// quantifier the first-order image of a modal operator.
    pub fn kind(&self, sig: &Signature) -> FormulaKind {
        let world_var = |v: &str| {
            v.starts_with('ζ')
                || matches!(sig.kind(v), Some(SymbolKind::WorldVariable))
        };
        match self {
            Formula::Atom(_, _) => FormulaKind::Literal,
            Formula::BinOp(BinOp::And, _, _) => FormulaKind::Alpha,
            Formula::BinOp(_, _, _) => FormulaKind::Beta,
            Formula::Quantified(Quantifier::Forall, v, _) if world_var(v) => FormulaKind::Boxy,
            Formula::Quantified(Quantifier::Forall, _, _) => FormulaKind::Gamma,
            Formula::Quantified(Quantifier::Exists, v, _) if world_var(v) => FormulaKind::Diamondy,
            Formula::Quantified(Quantifier::Exists, _, _) => FormulaKind::Delta,
            Formula::Modal(MOp::Necessity, _) => FormulaKind::Boxy,
            Formula::Modal(MOp::Possibility, _) => FormulaKind::Diamondy,
            Formula::Not(sub) => match sub.as_ref() {
                Formula::Atom(_, _) => FormulaKind::Literal,
                Formula::Not(_) => FormulaKind::DoubleNegation,
                Formula::BinOp(BinOp::And, _, _) | Formula::BinOp(BinOp::Iff, _, _) => {
                    FormulaKind::Beta
                }
                Formula::BinOp(_, _, _) => FormulaKind::Alpha,
                Formula::Quantified(Quantifier::Forall, v, _) if world_var(v) => {
                    FormulaKind::Diamondy
                }
                Formula::Quantified(Quantifier::Forall, _, _) => FormulaKind::Delta,
                Formula::Quantified(Quantifier::Exists, v, _) if world_var(v) => FormulaKind::Boxy,
                Formula::Quantified(Quantifier::Exists, _, _) => FormulaKind::Gamma,
                Formula::Modal(MOp::Necessity, _) => FormulaKind::Diamondy,
                Formula::Modal(MOp::Possibility, _) => FormulaKind::Boxy,
            },
        }
    }
}

/// The expression kind recorded for each symbol.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize)]
pub enum SymbolKind {
    /// A constant denoting an individual
    IndividualConstant,
    /// A constant denoting a world
    WorldConstant,
    /// A predicate (propositional letters are 0-ary predicates)
    Predicate,
    /// A function symbol
    FunctionSymbol,
    /// A bound individual variable
    Variable,
    /// A bound world variable (introduced by the standard translation)
    WorldVariable,
}

/// Symbol table for a formula: arities, expression kinds, and fresh-symbol
/// sources. This plays the bookkeeping role the parser keeps for itself in
/// interactive provers.
#[derive(PartialEq, Eq, Clone, Debug, Default, Serialize)]
pub struct Signature {
    /// Arity of each registered symbol
    pub arities: HashMap<String, usize>,
    /// Expression kind of each registered symbol
    pub kinds: HashMap<String, SymbolKind>,
    /// Whether the parsed formula contained a modal operator
    pub is_modal: bool,
    /// Whether every predicate in the parsed formula was 0-ary
    pub is_propositional: bool,
    next_free_var: usize,
    next_world_var: usize,
    next_skolem: usize,
    next_world_skolem: usize,
}

const CONSTANT_POOL: [char; 15] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
];
const FUNCTION_POOL: [char; 8] = ['f', 'g', 'h', 'i', 'j', 'k', 'l', 'm'];
const WORLD_POOL: [char; 7] = ['v', 'u', 't', 's', 'r', 'q', 'p'];
const VARIABLE_POOL: [char; 3] = ['x', 'y', 'z'];

impl Signature {
    /// An empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` with the given kind and arity. Re-registration
    /// overwrites, which is how predicates acquire their world argument
    /// during translation.
    pub fn register(&mut self, name: &str, kind: SymbolKind, arity: usize) {
        self.arities.insert(name.to_string(), arity);
        self.kinds.insert(name.to_string(), kind);
    }

    /// The expression kind of `name`, if registered.
    pub fn kind(&self, name: &str) -> Option<SymbolKind> {
        self.kinds.get(name).copied()
    }

    /// The arity of `name`, if registered.
    pub fn arity(&self, name: &str) -> Option<usize> {
        self.arities.get(name).copied()
    }

    fn registered(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    fn fresh_from_pool(&self, pool: &[char], numbered: char) -> String {
        for c in pool {
            let s = c.to_string();
            if !self.registered(&s) {
                return s;
            }
        }
        for i in 2.. {
            let s = format!("{numbered}{i}");
            if !self.registered(&s) {
                return s;
            }
        }
        unreachable!()
    }

    /// A fresh surface constant (`a`..`o`, then `a2`, `a3`, …), registered
    /// as an individual constant.
    pub fn fresh_constant(&mut self) -> String {
        let s = self.fresh_from_pool(&CONSTANT_POOL, 'a');
        self.register(&s, SymbolKind::IndividualConstant, 0);
        s
    }

    /// A fresh function symbol (`f`..`m`, then `f2`, …).
    pub fn fresh_function_symbol(&mut self, arity: usize) -> String {
        let s = self.fresh_from_pool(&FUNCTION_POOL, 'f');
        self.register(&s, SymbolKind::FunctionSymbol, arity);
        s
    }

    /// A fresh world name (`v`, `u`, `t`, …, then `w2`, `w3`, …; `w` is
    /// reserved for the base world), registered as a world constant.
    pub fn fresh_world_name(&mut self) -> String {
        let s = self.fresh_from_pool(&WORLD_POOL, 'w');
        self.register(&s, SymbolKind::WorldConstant, 0);
        s
    }

    /// A fresh world variable from the same letter pool as world names,
    /// registered as a world variable.
    pub fn fresh_world_variable(&mut self) -> String {
        let s = self.fresh_from_pool(&WORLD_POOL, 'w');
        self.register(&s, SymbolKind::WorldVariable, 0);
        s
    }

    /// A fresh individual variable (`x`, `y`, `z`, then `x2`, …).
    pub fn fresh_variable(&mut self) -> String {
        let s = self.fresh_from_pool(&VARIABLE_POOL, 'x');
        self.register(&s, SymbolKind::Variable, 0);
        s
    }

    /// A fresh prover variable: `ξn` for individuals, `ζn` for worlds.
    pub fn fresh_prover_variable(&mut self, world: bool) -> String {
        if world {
            self.next_world_var += 1;
            format!("ζ{}", self.next_world_var)
        } else {
            self.next_free_var += 1;
            format!("ξ{}", self.next_free_var)
        }
    }

    /// A fresh prover Skolem symbol: `φn` for individuals, `ωn` for worlds.
    pub fn fresh_skolem_symbol(&mut self, world: bool) -> String {
        if world {
            self.next_world_skolem += 1;
            format!("ω{}", self.next_world_skolem)
        } else {
            self.next_skolem += 1;
            format!("φ{}", self.next_skolem)
        }
    }

    /// Register every symbol occurring in a freshly parsed formula:
    /// quantified variables, predicates with their arities, constants, and
    /// function symbols. Also records whether the formula is propositional.
    pub fn extend_with(&mut self, f: &Formula) {
        self.extend_rec(f, &im::HashSet::new());
        self.is_propositional = self
            .kinds
            .iter()
            .all(|(name, kind)| *kind != SymbolKind::Predicate || self.arities[name] == 0)
            && !self.kinds.values().any(|k| {
                matches!(
                    k,
                    SymbolKind::Variable | SymbolKind::IndividualConstant | SymbolKind::FunctionSymbol
                )
            });
    }

    fn extend_rec(&mut self, f: &Formula, bound: &im::HashSet<String>) {
        match f {
            Formula::Atom(p, args) => {
                self.register(p, SymbolKind::Predicate, args.len());
                for arg in args {
                    self.extend_term(arg, bound);
                }
            }
            Formula::Not(sub) | Formula::Modal(_, sub) => self.extend_rec(sub, bound),
            Formula::BinOp(_, lhs, rhs) => {
                self.extend_rec(lhs, bound);
                self.extend_rec(rhs, bound);
            }
            Formula::Quantified(_, v, sub) => {
                self.register(v, SymbolKind::Variable, 0);
                self.extend_rec(sub, &bound.update(v.clone()));
            }
        }
    }

    fn extend_term(&mut self, t: &Term, bound: &im::HashSet<String>) {
        match t {
            Term::Id(s) => {
                if !bound.contains(s) && !self.registered(s) {
                    self.register(s, SymbolKind::IndividualConstant, 0);
                }
            }
            Term::App(fun, args) => {
                self.register(fun, SymbolKind::FunctionSymbol, args.len());
                for arg in args {
                    self.extend_term(arg, bound);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::formula;

    #[test]
    fn test_kind_classification() {
        let mut sig = Signature::new();
        let f = formula("((P∧q)∨¬(r∧s))");
        sig.extend_with(&f);
        assert_eq!(f.kind(&sig), FormulaKind::Beta);
        let f = formula("¬(p∨q)");
        assert_eq!(f.kind(&sig), FormulaKind::Alpha);
        let f = formula("¬(p→q)");
        assert_eq!(f.kind(&sig), FormulaKind::Alpha);
        let f = formula("¬¬p");
        assert_eq!(f.kind(&sig), FormulaKind::DoubleNegation);
        let f = formula("∀x(Fx→Gx)");
        sig.extend_with(&f);
        assert_eq!(f.kind(&sig), FormulaKind::Gamma);
        assert_eq!(
            Formula::negate(f).kind(&sig),
            FormulaKind::Delta,
        );
        let f = formula("□p");
        assert_eq!(f.kind(&sig), FormulaKind::Boxy);
        assert_eq!(Formula::negate(f).kind(&sig), FormulaKind::Diamondy);
    }

    #[test]
    fn test_world_quantifier_kinds() {
        let mut sig = Signature::new();
        let v = sig.fresh_world_variable();
        assert_eq!(v, "v");
        let boxy = Formula::forall(
            &v,
            Formula::implies(
                Formula::atom(ACCESSIBILITY, vec![Term::id(BASE_WORLD), Term::id(&v)]),
                Formula::atom("p", vec![Term::id(&v)]),
            ),
        );
        assert_eq!(boxy.kind(&sig), FormulaKind::Boxy);
        assert_eq!(Formula::negate(boxy).kind(&sig), FormulaKind::Diamondy);
    }

    #[test]
    fn test_fresh_pools() {
        let mut sig = Signature::new();
        sig.register("a", SymbolKind::Predicate, 0);
        sig.register("b", SymbolKind::IndividualConstant, 0);
        assert_eq!(sig.fresh_constant(), "c");
        assert_eq!(sig.fresh_world_name(), "v");
        assert_eq!(sig.fresh_world_name(), "u");
        assert_eq!(sig.fresh_prover_variable(false), "ξ1");
        assert_eq!(sig.fresh_prover_variable(true), "ζ1");
        assert_eq!(sig.fresh_skolem_symbol(false), "φ1");
        assert_eq!(sig.fresh_skolem_symbol(true), "ω1");
    }

    #[test]
    fn test_signature_extend() {
        let mut sig = Signature::new();
        let f = formula("∀x∃y(Fx∧Hxyc)");
        sig.extend_with(&f);
        assert_eq!(sig.arity("F"), Some(1));
        assert_eq!(sig.arity("H"), Some(3));
        assert_eq!(sig.kind("x"), Some(SymbolKind::Variable));
        assert_eq!(sig.kind("c"), Some(SymbolKind::IndividualConstant));
        assert!(!sig.is_propositional);

        let mut sig = Signature::new();
        sig.extend_with(&formula("(p∧¬q)"));
        assert!(sig.is_propositional);
    }

    #[test]
    fn test_prover_variables() {
        let f = Formula::atom(
            "F",
            vec![Term::id("ξ2"), Term::app("φ1", vec![Term::id("ξ2"), Term::id("a")])],
        );
        assert_eq!(f.prover_variables(), vec!["ξ2".to_string()]);
    }
}
