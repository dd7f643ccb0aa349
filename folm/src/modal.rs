// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The standard translation between modal formulas and their first-order
//! correlates.
//!
//! [`translate_from_modal`] gives every predicate an extra world argument
//! and turns □/◇ into guarded quantifiers over worlds: □A becomes
//! ∀v(Rwv→A[w:=v]) and ◇A becomes ∃v(Rwv∧A[w:=v]), where `R` is the
//! reserved accessibility predicate and `w` the distinguished base world.
//! [`translate_to_modal`] inverts this on translation images and on the
//! formulas tableau expansion derives from them, reporting the world at
//! which the modal formula is evaluated.

use crate::syntax::Formula::{Atom, BinOp, Modal, Not, Quantified};
use crate::syntax::{
    BinOp as Op, Formula, MOp, Quantifier, Signature, SymbolKind, Term, ACCESSIBILITY, BASE_WORLD,
};

/// Translate a (possibly modal) formula into first-order logic with an
/// explicit world argument. Registers the base world, the accessibility
/// predicate (for modal input), and the re-aritied predicates. Works on
/// purely propositional input too, where every letter becomes a 1-ary
/// predicate of worlds.
pub fn translate_from_modal(f: &Formula, sig: &mut Signature) -> Formula {
    sig.is_modal = f.is_modal();
    sig.register(BASE_WORLD, SymbolKind::WorldConstant, 0);
    if sig.is_modal {
        sig.register(ACCESSIBILITY, SymbolKind::Predicate, 2);
    }
    translate(f, &Term::id(BASE_WORLD), sig)
}

fn translate(f: &Formula, world: &Term, sig: &mut Signature) -> Formula {
    match f {
        Atom(p, args) => {
            let mut args = args.clone();
            args.push(world.clone());
            sig.register(p, SymbolKind::Predicate, args.len());
            Formula::Atom(p.clone(), args)
        }
        Not(sub) => Formula::negate(translate(sub, world, sig)),
        BinOp(op, lhs, rhs) => Formula::BinOp(
            *op,
            Box::new(translate(lhs, world, sig)),
            Box::new(translate(rhs, world, sig)),
        ),
        Quantified(q, v, m) => {
            Formula::Quantified(*q, v.clone(), Box::new(translate(m, world, sig)))
        }
        Modal(MOp::Necessity, sub) => {
            let v = sig.fresh_world_variable();
            let vt = Term::id(&v);
            let guard = Formula::atom(ACCESSIBILITY, vec![world.clone(), vt.clone()]);
            Formula::forall(&v, Formula::implies(guard, translate(sub, &vt, sig)))
        }
        Modal(MOp::Possibility, sub) => {
            let v = sig.fresh_world_variable();
            let vt = Term::id(&v);
            let guard = Formula::atom(ACCESSIBILITY, vec![world.clone(), vt.clone()]);
            Formula::exists(&v, Formula::and(guard, translate(sub, &vt, sig)))
        }
    }
}

fn is_world_var(v: &str, sig: &Signature) -> bool {
    v.starts_with('ζ') || matches!(sig.kind(v), Some(SymbolKind::WorldVariable))
}

fn guard_world<'a>(guard: &'a Formula, v: &str) -> Option<&'a Term> {
    match guard {
        Atom(p, args)
            if p == ACCESSIBILITY && args.len() == 2 && args[1] == Term::Id(v.to_string()) =>
        {
            Some(&args[0])
        }
        _ => None,
    }
}

fn world_name(t: &Term) -> Option<String> {
    match t {
        Term::Id(s) => Some(s.clone()),
        Term::App(_, _) => None,
    }
}

/// Translate a first-order formula of the shapes produced by
/// [`translate_from_modal`] (or derived from them by tableau expansion)
/// back into modal notation. Returns the formula together with the world
/// it is evaluated at, for display. Accessibility atoms are returned
/// unchanged; callers hide or render those separately.
pub fn translate_to_modal(f: &Formula, sig: &Signature) -> (Formula, Option<String>) {
    match f {
        Atom(p, _) if p == ACCESSIBILITY => (f.clone(), None),
        Atom(p, args) => {
            if let Some((last, rest)) = args.split_last() {
                if last.is_world(sig) {
                    return (Formula::Atom(p.clone(), rest.to_vec()), world_name(last));
                }
            }
            (f.clone(), None)
        }
        Not(sub) => {
            let (g, w) = translate_to_modal(sub, sig);
            (Formula::negate(g), w)
        }
        BinOp(op, lhs, rhs) => {
            let (l, wl) = translate_to_modal(lhs, sig);
            let (r, wr) = translate_to_modal(rhs, sig);
            (Formula::BinOp(*op, Box::new(l), Box::new(r)), wl.or(wr))
        }
        Quantified(Quantifier::Forall, v, m) if is_world_var(v, sig) => match m.as_ref() {
            // ∀v(Rwv→A) and its normalized image ∀v(¬Rwv∨A) both read as □A
            BinOp(Op::Implies, guard, body) if guard_world(guard, v).is_some() => {
                let w = guard_world(guard, v).and_then(world_name);
                let (b, _) = translate_to_modal(body, sig);
                (Formula::Modal(MOp::Necessity, Box::new(b)), w)
            }
            BinOp(Op::Or, neg_guard, body) => {
                let guard = match neg_guard.as_ref() {
                    Not(g) => guard_world(g, v),
                    _ => None,
                };
                match guard {
                    Some(w0) => {
                        let w = world_name(w0);
                        let (b, _) = translate_to_modal(body, sig);
                        (Formula::Modal(MOp::Necessity, Box::new(b)), w)
                    }
                    None => {
                        let (b, _) = translate_to_modal(m, sig);
                        (Formula::Modal(MOp::Necessity, Box::new(b)), None)
                    }
                }
            }
            _ => {
                let (b, _) = translate_to_modal(m, sig);
                (Formula::Modal(MOp::Necessity, Box::new(b)), None)
            }
        },
        Quantified(Quantifier::Exists, v, m) if is_world_var(v, sig) => match m.as_ref() {
            BinOp(Op::And, guard, body) if guard_world(guard, v).is_some() => {
                let w = guard_world(guard, v).and_then(world_name);
                let (b, _) = translate_to_modal(body, sig);
                (Formula::Modal(MOp::Possibility, Box::new(b)), w)
            }
            _ => {
                let (b, _) = translate_to_modal(m, sig);
                (Formula::Modal(MOp::Possibility, Box::new(b)), None)
            }
        },
        Quantified(q, v, m) => {
            let (b, w) = translate_to_modal(m, sig);
            (Formula::Quantified(*q, v.clone(), Box::new(b)), w)
        }
        Modal(op, sub) => {
            let (b, w) = translate_to_modal(sub, sig);
            (Formula::Modal(*op, Box::new(b)), w)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::printer::{formula as print, strip_outer_parens};

    fn from_modal(s: &str) -> (Formula, Signature) {
        let (f, mut sig) = parse(s).unwrap();
        let fo = translate_from_modal(&f, &mut sig);
        (fo, sig)
    }

    #[test]
    fn test_propositional_gets_world() {
        let (fo, sig) = from_modal("¬p");
        assert_eq!(print(&fo), "¬pw");
        assert!(!sig.is_modal);
        assert_eq!(sig.arity(BASE_WORLD), Some(0));
    }

    #[test]
    fn test_box_translation() {
        let (fo, sig) = from_modal("□p");
        assert_eq!(print(&fo), "∀v(Rwv→pv)");
        assert!(sig.is_modal);
        assert!(sig.is_propositional);
        assert_eq!(sig.arity(BASE_WORLD), Some(0));
        assert_eq!(sig.kind(BASE_WORLD), Some(SymbolKind::WorldConstant));
    }

    #[test]
    fn test_predicates_reariried() {
        let (_, sig) = from_modal("□p→p");
        assert_eq!(sig.arity("p"), Some(1));
        assert_eq!(sig.arity("w"), Some(0));
        assert_eq!(sig.kind("w"), Some(SymbolKind::WorldConstant));
        assert_eq!(sig.arity(ACCESSIBILITY), Some(2));
    }

    #[test]
    fn test_diamond_translation() {
        let (fo, _) = from_modal("◇p");
        assert_eq!(print(&fo), "∃v(Rwv∧pv)");
    }

    #[test]
    fn test_nested_modalities_use_fresh_worlds() {
        let (fo, _) = from_modal("□□p");
        assert_eq!(print(&fo), "∀v(Rwv→∀u(Rvu→pu))");
    }

    #[test]
    fn test_round_trip() {
        for s in ["□p→◇p", "□(p→q)→(□p→□q)", "◇(p∧q)", "¬□¬p", "□p→p", "p∨◇¬p"] {
            let (f, mut sig) = parse(s).unwrap();
            let fo = translate_from_modal(&f, &mut sig);
            let (back, _) = translate_to_modal(&fo, &sig);
            assert_eq!(
                strip_outer_parens(&print(&back)),
                strip_outer_parens(&print(&f)),
                "round trip failed on {s}"
            );
        }
    }

    #[test]
    fn test_to_modal_world_labels() {
        let (fo, sig) = from_modal("□p");
        // the instantiated body pv reads as p at world v
        if let Formula::Quantified(_, _, m) = &fo {
            if let Formula::BinOp(_, _, body) = m.as_ref() {
                let (g, world) = translate_to_modal(body, &sig);
                assert_eq!(print(&g), "p");
                assert_eq!(world, Some("v".to_string()));
                return;
            }
        }
        panic!("unexpected translation shape");
    }

    #[test]
    fn test_to_modal_normalized_shape() {
        // the NNF image ∀v(¬Rwv∨pv) also reads back as □p
        let (fo, sig) = from_modal("□p");
        let n = crate::term::nnf::nnf(&fo);
        let (back, world) = translate_to_modal(&n, &sig);
        assert_eq!(print(&back), "□p");
        assert_eq!(world, Some("w".to_string()));
    }
}
