// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Countermodel extraction from an open tableau branch.
//!
//! An open saturated branch describes a canonical model: its ground terms
//! are the domain, and the atoms that appear positively on the branch are
//! the predicate extensions. The literals are then replayed through
//! [`Model::extend_to_satisfy`], which catches clashes; if any replay
//! fails, no countermodel is reported.

use folm::semantics::Model;
use folm::syntax::{Formula, Signature};

use crate::sentree::SentenceTree;

/// Read a countermodel off the first open branch of the tree, or `None`
/// when the tree is closed or the branch facts cannot be satisfied.
pub fn counter_model(tree: &SentenceTree, sig: &Signature) -> Option<Model> {
    let leaf = tree.open_leaf()?;
    let path = tree.path_to_root(leaf);

    let mut model = Model::new(sig.clone(), 0, 0);
    let literals: Vec<&Formula> = path
        .iter()
        .map(|&id| &tree.node(id).formula)
        .filter(|f| is_literal(f))
        .collect();

    // number the ground terms in the order they appear on the branch
    for f in &literals {
        let atom = match f {
            Formula::Not(s) => s.as_ref(),
            _ => f,
        };
        if let Formula::Atom(_, args) = atom {
            for arg in args {
                model.denote(arg);
            }
        }
    }
    model.ensure_nonempty();

    for f in literals {
        if !model.extend_to_satisfy(f) {
            log::debug!("open branch facts are unsatisfiable at {f}");
            return None;
        }
    }
    Some(model)
}

fn is_literal(f: &Formula) -> bool {
    match f {
        Formula::Atom(_, _) => true,
        Formula::Not(s) => matches!(s.as_ref(), Formula::Atom(_, _)),
        _ => false,
    }
}
