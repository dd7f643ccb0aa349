// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! End-to-end checks of the formula pipeline: translation, normal forms,
//! proof search, sentence-tableau construction, and countermodels.

#![allow(clippy::needless_return)]

use folm::modal::translate_from_modal;
use folm::parser::parse;
use folm::printer;
use folm::syntax::SymbolKind;
use folm::term::cnf::{clausal_normal_form, cnf};
use folm::term::nnf::nnf;
use folm::term::skolem::skolemize;
use tableau::countermodel::counter_model;
use tableau::prover::prove;
use tableau::sentree::SentenceTree;

#[test]
fn test_propositional_translation() {
    let (f, mut sig) = parse("¬p").unwrap();
    let fo = translate_from_modal(&f, &mut sig);
    assert_eq!(printer::formula(&fo), "¬pw");
}

#[test]
fn test_box_translation_registers_world() {
    let (f, mut sig) = parse("□p").unwrap();
    let fo = translate_from_modal(&f, &mut sig);
    assert_eq!(printer::formula(&fo), "∀v(Rwv→pv)");
    assert!(sig.is_modal);
    assert!(sig.is_propositional);
    assert_eq!(sig.arity("w"), Some(0));
    assert_eq!(sig.kind("w"), Some(SymbolKind::WorldConstant));
}

#[test]
fn test_translation_arities() {
    let (f, mut sig) = parse("□p→p").unwrap();
    translate_from_modal(&f, &mut sig);
    assert_eq!(sig.arity("p"), Some(1));
    assert_eq!(sig.arity("w"), Some(0));
    assert_eq!(sig.kind("w"), Some(SymbolKind::WorldConstant));
}

#[test]
fn test_modal_round_trip() {
    let (f, mut sig) = parse("□p→◇p").unwrap();
    let fo = translate_from_modal(&f, &mut sig);
    let (back, _) = folm::modal::translate_to_modal(&fo, &sig);
    assert_eq!(printer::formula(&back), "(□p→◇p)");
}

#[test]
fn test_cnf_examples() {
    let (f, _) = parse("((a∧b)∨(c∧d))∨e").unwrap();
    assert_eq!(
        printer::clauses(&cnf(&f)),
        "[[a,c,e],[a,d,e],[b,c,e],[b,d,e]]"
    );

    let (f, _) = parse("((¬F∨G)∧(B∧¬W))∨((C∧¬E)∧(¬T∨D))").unwrap();
    assert_eq!(
        printer::clauses(&cnf(&f)),
        "[[¬F,G,C],[¬F,G,¬E],[¬F,G,¬T,D],[B,C],[B,¬E],[B,¬T,D],[¬W,C],[¬W,¬E],[¬W,¬T,D]]"
    );

    let (f, _) = parse("(¬Px∨((¬Py∨Pf(xy))∧(Qxg(x)∧(¬Pg(x)∨¬Rcg(x)))))").unwrap();
    assert_eq!(
        printer::clauses(&cnf(&f)),
        "[[¬Px,¬Py,Pf(xy)],[¬Px,Qxg(x)],[¬Px,¬Pg(x),¬Rcg(x)]]"
    );
}

#[test]
fn test_skolemization_examples() {
    let (f, mut sig) = parse("∀x∃y(Fx∧∀zHxyz)").unwrap();
    let sk = skolemize(&nnf(&f), &mut sig);
    assert_eq!(printer::formula(&sk), "∀x(Fx∧∀zHxf(x)z)");
    let (f, mut sig) = parse("∀x∃y(Fx∧∀zHxyz)").unwrap();
    assert_eq!(
        printer::clauses(&clausal_normal_form(&f, &mut sig)),
        "[[Fx],[Hxf(x)z]]"
    );

    let (f, mut sig) = parse("∀x∃y∃zHxyz ∨ ∃v∀wGvw").unwrap();
    let sk = skolemize(&nnf(&f), &mut sig);
    assert_eq!(printer::formula(&sk), "(∀xHxf(x)g(x)∨∀wGaw)");
}

#[test]
fn test_diamond_clausal_form() {
    let (f, mut sig) = parse("◇p").unwrap();
    let fo = translate_from_modal(&f, &mut sig);
    let clauses = clausal_normal_form(&nnf(&fo), &mut sig);
    assert_eq!(printer::clauses(&clauses), "[[Rwu],[pu]]");
    assert_eq!(sig.kind("u"), Some(SymbolKind::WorldConstant));
}

#[test]
fn test_proved_formula_renders_closed_tableau() {
    let (goal, mut sig) = parse("(Fa∧∀x(Fx→Gx))→Ga").unwrap();
    let fv = prove(&goal, &mut sig, false, 1000).unwrap();
    assert!(fv.closed());
    let tree = SentenceTree::new(&fv, &mut sig);
    assert!(tree.closed);
    let rendered = format!("{tree}");
    assert!(rendered.contains("✗"));
    // the displayed tableau applies the textbook rule to the implication
    assert!(rendered.contains("(Fa→Ga)"), "{rendered}");
}

#[test]
fn test_refuted_formula_yields_countermodel() {
    let (goal, mut sig) = parse("□p→p").unwrap();
    let fv = prove(&goal, &mut sig, false, 1000).unwrap();
    assert!(!fv.closed());
    let tree = SentenceTree::new(&fv, &mut sig);
    let model = counter_model(&tree, &sig).expect("countermodel expected");
    assert!(!model.worlds.is_empty());
}

#[test]
fn test_s5_collapse() {
    let (goal, mut sig) = parse("□p→◇p").unwrap();
    let fv = prove(&goal, &mut sig, true, 1000).unwrap();
    assert!(fv.closed());
    let mut tree = SentenceTree::new(&fv, &mut sig);
    tree.modalize(&sig);
    let rendered = format!("{tree}");
    assert!(!rendered.contains('R'), "accessibility shown under S5: {rendered}");
}
