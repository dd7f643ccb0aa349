// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Negation normal form and the alpha/beta decomposition of formulas.
//!
//! [`nnf`] pushes negations down to atoms, eliminates `→` and `↔` (the
//! biconditional becomes a disjunction of conjunctions), and removes double
//! negations. It is idempotent and preserves logical equivalence. [`alpha`]
//! and [`beta`] return the components of conjunctive and disjunctive
//! formulas with the standard classical signs, on the *unnormalized*
//! formula shapes.

use crate::syntax::Formula::{Atom, BinOp, Modal, Not, Quantified};
use crate::syntax::{BinOp as Op, Formula, MOp, Quantifier};

/// Convert a formula to negation normal form.
pub fn nnf(f: &Formula) -> Formula {
    match f {
        Atom(_, _) => f.clone(),
        Not(sub) => match sub.as_ref() {
            Atom(_, _) => f.clone(),
            Not(s) => nnf(s),
            BinOp(Op::And, lhs, rhs) => Formula::or(nnf_negated(lhs), nnf_negated(rhs)),
            BinOp(Op::Or, lhs, rhs) => Formula::and(nnf_negated(lhs), nnf_negated(rhs)),
            BinOp(Op::Implies, lhs, rhs) => Formula::and(nnf(lhs), nnf_negated(rhs)),
            BinOp(Op::Iff, lhs, rhs) => Formula::or(
                Formula::and(nnf(lhs), nnf_negated(rhs)),
                Formula::and(nnf_negated(lhs), nnf(rhs)),
            ),
            Quantified(Quantifier::Forall, v, m) => Formula::exists(v, nnf_negated(m)),
            Quantified(Quantifier::Exists, v, m) => Formula::forall(v, nnf_negated(m)),
            Modal(MOp::Necessity, s) => {
                Formula::Modal(MOp::Possibility, Box::new(nnf_negated(s)))
            }
            Modal(MOp::Possibility, s) => {
                Formula::Modal(MOp::Necessity, Box::new(nnf_negated(s)))
            }
        },
        BinOp(Op::And, lhs, rhs) => Formula::and(nnf(lhs), nnf(rhs)),
        BinOp(Op::Or, lhs, rhs) => Formula::or(nnf(lhs), nnf(rhs)),
        BinOp(Op::Implies, lhs, rhs) => Formula::or(nnf_negated(lhs), nnf(rhs)),
        BinOp(Op::Iff, lhs, rhs) => Formula::or(
            Formula::and(nnf(lhs), nnf(rhs)),
            Formula::and(nnf_negated(lhs), nnf_negated(rhs)),
        ),
        Quantified(q, v, m) => Formula::Quantified(*q, v.clone(), Box::new(nnf(m))),
        Modal(op, s) => Formula::Modal(*op, Box::new(nnf(s))),
    }
}

fn nnf_negated(f: &Formula) -> Formula {
    nnf(&Formula::negate(f.clone()))
}

/// The i-th (i ∈ {1,2}) component of an alpha (conjunctive) formula:
/// `A∧B`, `¬(A∨B)`, or `¬(A→B)`. Returns None for other shapes.
pub fn alpha(f: &Formula, i: usize) -> Option<Formula> {
    debug_assert!(i == 1 || i == 2);
    match f {
        BinOp(Op::And, lhs, rhs) => Some(pick(i, (**lhs).clone(), (**rhs).clone())),
        Not(sub) => match sub.as_ref() {
            BinOp(Op::Or, lhs, rhs) => Some(pick(
                i,
                Formula::negate((**lhs).clone()),
                Formula::negate((**rhs).clone()),
            )),
            BinOp(Op::Implies, lhs, rhs) => {
                Some(pick(i, (**lhs).clone(), Formula::negate((**rhs).clone())))
            }
            _ => None,
        },
        _ => None,
    }
}

/// The i-th (i ∈ {1,2}) component of a beta (disjunctive) formula:
/// `A∨B`, `A→B`, `¬(A∧B)`, or a biconditional. The biconditional expands
/// into its two conjunctive cases: beta of `A↔B` is `A∧B` / `¬A∧¬B`, and
/// beta of `¬(A↔B)` is `A∧¬B` / `¬A∧B`.
pub fn beta(f: &Formula, i: usize) -> Option<Formula> {
    debug_assert!(i == 1 || i == 2);
    match f {
        BinOp(Op::Or, lhs, rhs) => Some(pick(i, (**lhs).clone(), (**rhs).clone())),
        BinOp(Op::Implies, lhs, rhs) => {
            Some(pick(i, Formula::negate((**lhs).clone()), (**rhs).clone()))
        }
        BinOp(Op::Iff, lhs, rhs) => Some(pick(
            i,
            Formula::and((**lhs).clone(), (**rhs).clone()),
            Formula::and(
                Formula::negate((**lhs).clone()),
                Formula::negate((**rhs).clone()),
            ),
        )),
        Not(sub) => match sub.as_ref() {
            BinOp(Op::And, lhs, rhs) => Some(pick(
                i,
                Formula::negate((**lhs).clone()),
                Formula::negate((**rhs).clone()),
            )),
            BinOp(Op::Iff, lhs, rhs) => Some(pick(
                i,
                Formula::and((**lhs).clone(), Formula::negate((**rhs).clone())),
                Formula::and(Formula::negate((**lhs).clone()), (**rhs).clone()),
            )),
            _ => None,
        },
        _ => None,
    }
}

fn pick(i: usize, first: Formula, second: Formula) -> Formula {
    if i == 1 {
        first
    } else {
        second
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::formula;

    #[test]
    fn test_nnf_basic() {
        assert_eq!(nnf(&formula("¬¬p")), formula("p"));
        assert_eq!(nnf(&formula("¬(p∧q)")), formula("¬p∨¬q"));
        assert_eq!(nnf(&formula("p→q")), formula("¬p∨q"));
        assert_eq!(nnf(&formula("¬(p→q)")), formula("p∧¬q"));
        assert_eq!(
            nnf(&formula("p↔q")),
            formula("(p∧q)∨(¬p∧¬q)")
        );
        assert_eq!(
            nnf(&formula("¬(p↔q)")),
            formula("(p∧¬q)∨(¬p∧q)")
        );
    }

    #[test]
    fn test_nnf_quantifiers() {
        assert_eq!(nnf(&formula("¬∀xFx")), formula("∃x¬Fx"));
        assert_eq!(nnf(&formula("¬∃x(Fx∧Gx)")), formula("∀x(¬Fx∨¬Gx)"));
        assert_eq!(nnf(&formula("¬□p")), formula("◇¬p"));
        assert_eq!(nnf(&formula("¬◇¬p")), formula("□p"));
    }

    #[test]
    fn test_nnf_idempotent() {
        for s in [
            "¬((p↔q)→¬(r∨¬s))",
            "¬∀x(Fx→∃y(Hxy∧¬Gy))",
            "¬□(p→◇q)",
            "((a∧b)∨(c∧d))∨e",
        ] {
            let once = nnf(&formula(s));
            assert_eq!(nnf(&once), once, "nnf not idempotent on {s}");
        }
    }

    #[test]
    fn test_alpha() {
        let f = formula("¬(A→B)");
        assert_eq!(alpha(&f, 1), Some(formula("A")));
        assert_eq!(alpha(&f, 2), Some(formula("¬B")));
        let f = formula("¬(A∨B)");
        assert_eq!(alpha(&f, 1), Some(formula("¬A")));
        assert_eq!(alpha(&f, 2), Some(formula("¬B")));
        assert_eq!(alpha(&formula("A∨B"), 1), None);
    }

    #[test]
    fn test_beta() {
        let f = formula("A↔B");
        assert_eq!(beta(&f, 1), Some(formula("A∧B")));
        assert_eq!(beta(&f, 2), Some(formula("¬A∧¬B")));
        let f = formula("¬(A↔B)");
        assert_eq!(beta(&f, 1), Some(formula("A∧¬B")));
        assert_eq!(beta(&f, 2), Some(formula("¬A∧B")));
        let f = formula("A→B");
        assert_eq!(beta(&f, 1), Some(formula("¬A")));
        assert_eq!(beta(&f, 2), Some(formula("B")));
    }
}
