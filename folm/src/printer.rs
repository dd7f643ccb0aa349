// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Canonical rendering of terms and formulas.
//!
//! The rendering is the one the parser reads: atom arguments juxtaposed,
//! function arguments juxtaposed inside parentheses, and every binary
//! formula wrapped in parentheses, so `(□p→◇p)` and `∀v(Rwv→pv)` print
//! exactly like that. Two formulas are `equals` iff their ASTs match; the
//! printed string is injective on ASTs and is what tests compare.

use std::fmt;

use crate::syntax::*;
use itertools::Itertools;

/// Render a term.
pub fn term(t: &Term) -> String {
    match t {
        Term::Id(s) => s.clone(),
        Term::App(f, args) => format!("{f}({})", args.iter().map(term).join("")),
    }
}

/// Render a formula.
pub fn formula(f: &Formula) -> String {
    match f {
        Formula::Atom(p, args) => {
            format!("{p}{}", args.iter().map(term).join(""))
        }
        Formula::Not(sub) => format!("¬{}", formula(sub)),
        Formula::BinOp(op, lhs, rhs) => {
            let op = match op {
                BinOp::And => "∧",
                BinOp::Or => "∨",
                BinOp::Implies => "→",
                BinOp::Iff => "↔",
            };
            format!("({}{op}{})", formula(lhs), formula(rhs))
        }
        Formula::Quantified(q, v, sub) => {
            let q = match q {
                Quantifier::Forall => "∀",
                Quantifier::Exists => "∃",
            };
            format!("{q}{v}{}", formula(sub))
        }
        Formula::Modal(op, sub) => {
            let op = match op {
                MOp::Necessity => "□",
                MOp::Possibility => "◇",
            };
            format!("{op}{}", formula(sub))
        }
    }
}

/// Strip one pair of surrounding parentheses, for comparisons that are up to
/// outer parenthesization.
pub fn strip_outer_parens(s: &str) -> &str {
    if let Some(inner) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        // only strip if the parens actually match each other
        let mut depth = 0;
        for (i, c) in inner.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return s;
                    }
                }
                _ => {
                    let _ = i;
                }
            }
        }
        if depth == 0 {
            return inner;
        }
    }
    s
}

/// Render a clause list the way the tests read it: `[[a,c,e],[a,d,e]]`.
pub fn clauses(cs: &[Vec<Formula>]) -> String {
    format!(
        "[{}]",
        cs.iter()
            .map(|c| format!("[{}]", c.iter().map(formula).join(",")))
            .join(",")
    )
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", term(self))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", formula(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn reprint(s: &str) -> String {
        formula(&parser::formula(s))
    }

    #[test]
    fn test_printer_basic() {
        assert_eq!(reprint("¬p"), "¬p");
        assert_eq!(reprint("p∧q"), "(p∧q)");
        assert_eq!(reprint("□p→◇p"), "(□p→◇p)");
        assert_eq!(reprint("∀v(Rwv→pv)"), "∀v(Rwv→pv)");
        assert_eq!(reprint("∀x(Fx∧∀zHxf(x)z)"), "∀x(Fx∧∀zHxf(x)z)");
        assert_eq!(reprint("∀xHxf(x)g(x)∨∀wGaw"), "(∀xHxf(x)g(x)∨∀wGaw)");
    }

    #[test]
    fn test_roundtrip() {
        for s in [
            "((a∧b)∨(c∧d))∨e",
            "(¬Px∨((¬Py∨Pf(xy))∧(Qxg(x)∧(¬Pg(x)∨¬Rcg(x)))))",
            "∀x∃y(Fx∧∀zHxyz)",
            "□(p→q)→(□p→□q)",
        ] {
            let f = parser::formula(s);
            assert_eq!(parser::formula(&formula(&f)), f, "{s} did not roundtrip");
        }
    }

    #[test]
    fn test_strip_outer_parens() {
        assert_eq!(strip_outer_parens("(p∧q)"), "p∧q");
        assert_eq!(strip_outer_parens("p"), "p");
        assert_eq!(strip_outer_parens("(p)∧(q)"), "(p)∧(q)");
    }
}
