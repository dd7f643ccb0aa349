// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Skolemization and the prenex transformation.
//!
//! [`skolemize`] expects its input in negation normal form and replaces
//! each ∃-bound variable by a Skolem term over the enclosing ∀-bound
//! variables. Surface Skolem symbols come from the signature pools: a
//! Skolem constant for an empty universal prefix (`a`, `b`, …), a fresh
//! function symbol otherwise (`f`, `g`, …). World-sorted variables get a
//! fresh world name (`u`, …) or an `ωn` function. After Skolemization all
//! remaining quantifiers are universal, and [`prenex`] pulls them into a
//! prefix, renaming on clashes.

use crate::syntax::Formula::{Atom, BinOp, Modal, Not, Quantified};
use crate::syntax::{Formula, Quantifier, Signature, SymbolKind, Term};
use crate::term::subst::substitute;

/// Replace existentially bound variables by Skolem terms.
pub fn skolemize(f: &Formula, sig: &mut Signature) -> Formula {
    skolemize_rec(f, sig, &[])
}

fn skolemize_rec(f: &Formula, sig: &mut Signature, univ: &[Term]) -> Formula {
    match f {
        Quantified(Quantifier::Forall, v, m) => {
            let mut univ = univ.to_vec();
            univ.push(Term::id(v));
            Formula::forall(v, skolemize_rec(m, sig, &univ))
        }
        Quantified(Quantifier::Exists, v, m) => {
            let world =
                v.starts_with('ζ') || matches!(sig.kind(v), Some(SymbolKind::WorldVariable));
            let sk = match (univ.is_empty(), world) {
                (true, true) => Term::id(sig.fresh_world_name()),
                (true, false) => Term::id(sig.fresh_constant()),
                (false, true) => {
                    let s = sig.fresh_skolem_symbol(true);
                    sig.register(&s, SymbolKind::FunctionSymbol, univ.len());
                    Term::App(s, univ.to_vec())
                }
                (false, false) => {
                    Term::App(sig.fresh_function_symbol(univ.len()), univ.to_vec())
                }
            };
            let m = substitute(m, &Term::id(v), &sk, false);
            skolemize_rec(&m, sig, univ)
        }
        BinOp(op, lhs, rhs) => Formula::BinOp(
            *op,
            Box::new(skolemize_rec(lhs, sig, univ)),
            Box::new(skolemize_rec(rhs, sig, univ)),
        ),
        Not(_) | Atom(_, _) => f.clone(),
        Modal(op, sub) => Formula::Modal(*op, Box::new(skolemize_rec(sub, sig, univ))),
    }
}

/// Pull the universal quantifiers of a Skolemized NNF formula into a
/// prefix, returning the prefix variables in left-to-right order and the
/// quantifier-free matrix. A variable already in the prefix is renamed.
pub fn prenex(f: &Formula, sig: &mut Signature) -> (Vec<String>, Formula) {
    let mut prefix = vec![];
    let matrix = pull(f, sig, &mut prefix);
    (prefix, matrix)
}

fn pull(f: &Formula, sig: &mut Signature, prefix: &mut Vec<String>) -> Formula {
    match f {
        Quantified(Quantifier::Forall, v, m) => {
            if prefix.contains(v) {
                let fresh = sig.fresh_variable();
                let m = substitute(m, &Term::id(v), &Term::id(&fresh), false);
                prefix.push(fresh);
                pull(&m, sig, prefix)
            } else {
                prefix.push(v.clone());
                pull(m, sig, prefix)
            }
        }
        BinOp(op, lhs, rhs) => {
            let lhs = pull(lhs, sig, prefix);
            let rhs = pull(rhs, sig, prefix);
            Formula::BinOp(*op, Box::new(lhs), Box::new(rhs))
        }
        _ => f.clone(),
    }
}
