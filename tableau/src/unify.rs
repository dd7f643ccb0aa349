// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! First-order unification over prover variables.
//!
//! The prover's placeholder variables are the ξ-prefixed (individual) and
//! ζ-prefixed (world) symbols; everything else is rigid. Unification is
//! sort-respecting: a world variable only binds to world terms and an
//! individual variable only to individual terms, with the usual occurs
//! check.

use folm::syntax::{Formula, Term, BASE_WORLD};
use std::collections::HashMap;

/// A binding of prover variables to terms.
pub type Substitution = HashMap<String, Term>;

/// Whether the symbol is a placeholder variable introduced by the prover.
pub fn is_prover_variable(name: &str) -> bool {
    name.starts_with('ξ') || name.starts_with('ζ')
}

fn is_world_symbol(name: &str) -> bool {
    name == BASE_WORLD || name.starts_with('ζ') || name.starts_with('ω')
}

/// Whether a term denotes a world as far as the prover is concerned. During
/// search the only world terms are the base world, ζ-variables, and
/// ω-Skolems.
fn is_world_term(t: &Term) -> bool {
    is_world_symbol(t.head())
}

fn resolve<'a>(t: &'a Term, sub: &'a Substitution) -> &'a Term {
    let mut t = t;
    while let Term::Id(s) = t {
        match sub.get(s) {
            Some(bound) => t = bound,
            None => break,
        }
    }
    t
}

fn occurs(v: &str, t: &Term, sub: &Substitution) -> bool {
    let t = resolve(t, sub);
    match t {
        Term::Id(s) => s == v,
        Term::App(_, args) => args.iter().any(|a| occurs(v, a, sub)),
    }
}

/// Unify two terms under an accumulating substitution. On failure the
/// substitution may hold partial bindings and should be discarded.
pub fn unify(a: &Term, b: &Term, sub: &mut Substitution) -> bool {
    let a = resolve(a, sub).clone();
    let b = resolve(b, sub).clone();
    match (&a, &b) {
        _ if a == b => true,
        (Term::Id(x), t) if is_prover_variable(x) => {
            if occurs(x, t, sub) || is_world_symbol(x) != is_world_term(t) {
                return false;
            }
            sub.insert(x.clone(), t.clone());
            true
        }
        (t, Term::Id(y)) if is_prover_variable(y) => {
            if occurs(y, t, sub) || is_world_symbol(y) != is_world_term(t) {
                return false;
            }
            sub.insert(y.clone(), t.clone());
            true
        }
        (Term::App(f, xs), Term::App(g, ys)) if f == g && xs.len() == ys.len() => {
            xs.iter().zip(ys).all(|(x, y)| unify(x, y, sub))
        }
        _ => false,
    }
}

/// If `f` and `g` are complementary literals, the unifier making them
/// clash; `None` otherwise.
pub fn complementary(f: &Formula, g: &Formula) -> Option<Substitution> {
    let (pos, neg) = match (f, g) {
        (Formula::Atom(_, _), Formula::Not(sub)) => (f, sub.as_ref()),
        (Formula::Not(sub), Formula::Atom(_, _)) => (g, sub.as_ref()),
        _ => return None,
    };
    match (pos, neg) {
        (Formula::Atom(p, xs), Formula::Atom(q, ys)) if p == q && xs.len() == ys.len() => {
            let mut sub = Substitution::new();
            if xs.iter().zip(ys).all(|(x, y)| unify(x, y, &mut sub)) {
                Some(sub)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Apply a substitution to a term, chasing bindings.
pub fn apply(sub: &Substitution, t: &Term) -> Term {
    let t = resolve(t, sub);
    match t {
        Term::Id(_) => t.clone(),
        Term::App(f, args) => Term::App(f.clone(), args.iter().map(|a| apply(sub, a)).collect()),
    }
}

/// Apply a substitution throughout a formula.
pub fn apply_formula(sub: &Substitution, f: &Formula) -> Formula {
    match f {
        Formula::Atom(p, args) => {
            Formula::Atom(p.clone(), args.iter().map(|a| apply(sub, a)).collect())
        }
        Formula::Not(s) => Formula::negate(apply_formula(sub, s)),
        Formula::BinOp(op, lhs, rhs) => Formula::BinOp(
            *op,
            Box::new(apply_formula(sub, lhs)),
            Box::new(apply_formula(sub, rhs)),
        ),
        Formula::Quantified(q, v, m) => {
            Formula::Quantified(*q, v.clone(), Box::new(apply_formula(sub, m)))
        }
        Formula::Modal(op, s) => Formula::Modal(*op, Box::new(apply_formula(sub, s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folm::parser::formula;

    fn xi(n: usize) -> Term {
        Term::id(format!("ξ{n}"))
    }

    #[test]
    fn test_unify_variable_constant() {
        let mut sub = Substitution::new();
        assert!(unify(&xi(1), &Term::id("a"), &mut sub));
        assert_eq!(apply(&sub, &xi(1)), Term::id("a"));
    }

    #[test]
    fn test_unify_composite() {
        let mut sub = Substitution::new();
        let t1 = Term::app("f", vec![xi(1), Term::id("b")]);
        let t2 = Term::app("f", vec![Term::id("a"), xi(2)]);
        assert!(unify(&t1, &t2, &mut sub));
        assert_eq!(apply(&sub, &xi(1)), Term::id("a"));
        assert_eq!(apply(&sub, &xi(2)), Term::id("b"));
    }

    #[test]
    fn test_occurs_check() {
        let mut sub = Substitution::new();
        let t = Term::app("f", vec![xi(1)]);
        assert!(!unify(&xi(1), &t, &mut sub));
    }

    #[test]
    fn test_sorts_respected() {
        let mut sub = Substitution::new();
        // a world variable does not bind an individual constant
        assert!(!unify(&Term::id("ζ1"), &Term::id("a"), &mut sub));
        let mut sub = Substitution::new();
        assert!(unify(&Term::id("ζ1"), &Term::id("w"), &mut sub));
    }

    #[test]
    fn test_complementary() {
        let f = formula("Fa");
        let g = formula("¬Fa");
        assert_eq!(complementary(&f, &g), Some(Substitution::new()));
        assert!(complementary(&f, &formula("¬Ga")).is_none());

        let f = Formula::atom("F", vec![xi(1)]);
        let sub = complementary(&f, &formula("¬Fa")).unwrap();
        assert_eq!(apply(&sub, &xi(1)), Term::id("a"));
    }
}
