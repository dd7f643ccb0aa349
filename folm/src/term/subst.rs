// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Substitution of terms for terms inside formulas.

use crate::syntax::{Formula, Term};

/// Replace every occurrence of `old` in `f` by `new`, comparing terms
/// structurally. With `shallow` set, only whole-term matches at argument
/// positions are replaced; otherwise the substitution also descends into
/// composite function terms that contain `old`. A quantifier binding a
/// variable with the same name as `old` shadows the substitution below it.
pub fn substitute(f: &Formula, old: &Term, new: &Term, shallow: bool) -> Formula {
    match f {
        Formula::Atom(p, args) => Formula::Atom(
            p.clone(),
            args.iter()
                .map(|a| substitute_term(a, old, new, shallow))
                .collect(),
        ),
        Formula::Not(sub) => Formula::negate(substitute(sub, old, new, shallow)),
        Formula::BinOp(op, lhs, rhs) => Formula::BinOp(
            *op,
            Box::new(substitute(lhs, old, new, shallow)),
            Box::new(substitute(rhs, old, new, shallow)),
        ),
        Formula::Quantified(q, v, sub) => {
            if matches!(old, Term::Id(s) if s == v) {
                f.clone()
            } else {
                Formula::Quantified(*q, v.clone(), Box::new(substitute(sub, old, new, shallow)))
            }
        }
        Formula::Modal(op, sub) => {
            Formula::Modal(*op, Box::new(substitute(sub, old, new, shallow)))
        }
    }
}

fn substitute_term(t: &Term, old: &Term, new: &Term, shallow: bool) -> Term {
    if t == old {
        return new.clone();
    }
    match t {
        Term::Id(_) => t.clone(),
        Term::App(f, args) => {
            if shallow {
                t.clone()
            } else {
                Term::App(
                    f.clone(),
                    args.iter()
                        .map(|a| substitute_term(a, old, new, shallow))
                        .collect(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::formula;
    use crate::syntax::Term;

    #[test]
    fn test_substitute_deep() {
        let f = formula("Fx∧Gf(x)");
        let g = substitute(&f, &Term::id("x"), &Term::id("a"), false);
        assert_eq!(g, formula("Fa∧Gf(a)"));
    }

    #[test]
    fn test_substitute_shallow() {
        let f = formula("Fx∧Gf(x)");
        let g = substitute(&f, &Term::id("x"), &Term::id("a"), true);
        assert_eq!(g, formula("Fa∧Gf(x)"));
    }

    #[test]
    fn test_substitute_whole_composite() {
        let f = formula("Pf(xy)∧Qf(xy)z");
        let old = Term::app("f", vec![Term::id("x"), Term::id("y")]);
        let g = substitute(&f, &old, &Term::id("b"), true);
        assert_eq!(g, formula("Pb∧Qbz"));
    }

    #[test]
    fn test_substitute_shadowing() {
        let f = formula("Fx∧∀xGx");
        let g = substitute(&f, &Term::id("x"), &Term::id("c"), false);
        assert_eq!(g, formula("Fc∧∀xGx"));
    }
}
