// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Convert formulas to conjunctive normal form.
//!
//! A clause is a list of literals; [`cnf`] returns a list of clauses. The
//! conversion is a deterministic left-to-right fold over the distribution
//! tree, so formulas with identical parse shape produce identical clause
//! lists. Duplicate literals within a clause are suppressed, and a clause
//! that is a superset of an earlier clause is dropped.

use crate::syntax::{BinOp, Formula, Signature};
use crate::term::nnf::nnf;
use crate::term::skolem::{prenex, skolemize};

/// A disjunction of literals.
pub type Clause = Vec<Formula>;

/// Convert a formula to CNF. The input is normalized first; quantified
/// subformulas are treated as opaque units (use [`clausal_normal_form`]
/// to eliminate quantifiers).
pub fn cnf(f: &Formula) -> Vec<Clause> {
    subsume(clauses(&nnf(f)))
}

fn clauses(f: &Formula) -> Vec<Clause> {
    match f {
        Formula::BinOp(BinOp::And, lhs, rhs) => {
            let mut cs = clauses(lhs);
            cs.extend(clauses(rhs));
            cs
        }
        Formula::BinOp(BinOp::Or, lhs, rhs) => {
            let rights = clauses(rhs);
            let mut cs = vec![];
            for left in clauses(lhs) {
                for right in &rights {
                    let mut clause = left.clone();
                    for lit in right {
                        if !clause.contains(lit) {
                            clause.push(lit.clone());
                        }
                    }
                    cs.push(clause);
                }
            }
            cs
        }
        _ => vec![vec![f.clone()]],
    }
}

/// Drop exact duplicates and clauses that are supersets of a kept clause,
/// preserving first-occurrence order.
fn subsume(cs: Vec<Clause>) -> Vec<Clause> {
    let mut kept: Vec<Clause> = vec![];
    for c in cs {
        if !kept
            .iter()
            .any(|k| k.iter().all(|lit| c.contains(lit)))
        {
            kept.push(c);
        }
    }
    kept
}

/// Full clausal normal form: normalize, Skolemize away the existentials,
/// pull the remaining universal prefix, and convert the matrix to CNF. The
/// prefix is dropped; remaining variables are implicitly universal.
pub fn clausal_normal_form(f: &Formula, sig: &mut Signature) -> Vec<Clause> {
    let sk = skolemize(&nnf(f), sig);
    let (_prefix, matrix) = prenex(&sk, sig);
    cnf(&matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{formula, parse};
    use crate::printer;

    fn cnf_str(s: &str) -> String {
        printer::clauses(&cnf(&formula(s)))
    }

    #[test]
    fn test_cnf_distribution() {
        assert_eq!(
            cnf_str("((a∧b)∨(c∧d))∨e"),
            "[[a,c,e],[a,d,e],[b,c,e],[b,d,e]]"
        );
    }

    #[test]
    fn test_cnf_nested() {
        assert_eq!(
            cnf_str("((¬F∨G)∧(B∧¬W))∨((C∧¬E)∧(¬T∨D))"),
            "[[¬F,G,C],[¬F,G,¬E],[¬F,G,¬T,D],[B,C],[B,¬E],[B,¬T,D],[¬W,C],[¬W,¬E],[¬W,¬T,D]]"
        );
    }

    #[test]
    fn test_cnf_first_order_literals() {
        assert_eq!(
            cnf_str("(¬Px∨((¬Py∨Pf(xy))∧(Qxg(x)∧(¬Pg(x)∨¬Rcg(x)))))"),
            "[[¬Px,¬Py,Pf(xy)],[¬Px,Qxg(x)],[¬Px,¬Pg(x),¬Rcg(x)]]"
        );
    }

    #[test]
    fn test_cnf_duplicate_literals() {
        assert_eq!(cnf_str("p∨(q∨p)"), "[[p,q]]");
        // (p∨q)∧p: the first clause is subsumed by the unit clause? order
        // matters: supersets of *earlier* clauses are dropped, so [p,q]
        // survives but a later [p,q,r] would not
        assert_eq!(cnf_str("(p∨q)∧(p∨q∨r)"), "[[p,q]]");
    }

    #[test]
    fn test_cnf_canonical_on_equivalents() {
        // syntactically distinct but identically-shaped inputs give the
        // same clause strings
        assert_eq!(cnf_str("¬(p∧q)"), "[[¬p,¬q]]");
        assert_eq!(cnf_str("¬p∨¬q"), "[[¬p,¬q]]");
        assert_eq!(cnf_str("p→q"), "[[¬p,q]]");
    }

    #[test]
    fn test_clausal_normal_form() {
        let (f, mut sig) = parse("∀x∃y(Fx∧∀zHxyz)").unwrap();
        assert_eq!(
            printer::clauses(&clausal_normal_form(&f, &mut sig)),
            "[[Fx],[Hxf(x)z]]"
        );
    }
}
