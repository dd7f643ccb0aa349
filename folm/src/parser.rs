// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Parser for folm formulas.
//!
//! The concrete syntax is the compact one used in logic textbooks: symbols
//! are single letters (optionally followed by digits), predicate arguments
//! are juxtaposed (`Hxyz`, `Pf(xy)`), and the connectives have Unicode and
//! ASCII spellings (`¬`/`~`/`!`, `∧`/`&`, `∨`/`|`, `→`/`->`, `↔`/`<->`,
//! `□`/`[]`, `◇`/`<>`, `∀`/`forall`, `∃`/`exists`).

use crate::syntax::*;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use peg::{error::ParseError, str::LineCol};

peg::parser! {

grammar parser() for str {
    use Quantifier::*;

    rule ident_start() = ['a'..='z' | 'A'..='Z']
    pub(super) rule ident() -> String
    = s:$(quiet!{ident_start() ['0'..='9']*} / expected!("symbol"))
    { s.to_string() }

    rule _ = quiet!{ [' ' | '\t']* }
    rule word_boundary() = !['a'..='z' | 'A'..='Z' | '0'..='9']

    // Function arguments may be juxtaposed (`f(xy)`) or comma-separated
    // (`f(x,y)`); no space is allowed between a functor and its parenthesis.
    pub(super) rule term() -> Term
    = f:ident() "(" _ args:(term() ++ (_ ","? _)) _ ")" { Term::App(f, args) }
    / s:ident() { Term::Id(s) }

    pub(super) rule formula() -> Formula = precedence!{
        x:@ _ ("→" / "->") _ y:(@) { Formula::implies(x, y) }
        x:(@) _ ("↔" / "<->") _ y:@ { Formula::iff(x, y) }
        --
        x:(@) _ ("∨" / "|") _ y:@ { Formula::or(x, y) }
        --
        x:(@) _ ("∧" / "&") _ y:@ { Formula::and(x, y) }
        --
        ("¬" / "~" / "!") _ x:@ { Formula::negate(x) }
        ("□" / "[]") _ x:@ { Formula::Modal(MOp::Necessity, Box::new(x)) }
        ("◇" / "<>") _ x:@ { Formula::Modal(MOp::Possibility, Box::new(x)) }
        ("∀" / "forall" word_boundary()) _ v:ident() _ x:@
        { Formula::Quantified(Forall, v, Box::new(x)) }
        ("∃" / "exists" word_boundary()) _ v:ident() _ x:@
        { Formula::Quantified(Exists, v, Box::new(x)) }
        --
        // no space is allowed between a predicate and its arguments, so
        // `F x` does not parse as F applied to x
        p:ident() args:(term()*) { Formula::Atom(p, args) }
        "(" _ f:formula() _ ")" { f }
    }

    pub rule input() -> Formula = _ f:formula() _ { f }
}
}

/// Parse a formula and build the signature recording its symbols.
pub fn parse(s: &str) -> Result<(Formula, Signature), ParseError<LineCol>> {
    let f = parser::input(s)?;
    let mut sig = Signature::new();
    sig.extend_with(&f);
    Ok((f, sig))
}

/// Parse a single formula. Panics on parse errors, for use in tests.
pub fn formula(s: &str) -> Formula {
    parser::input(s).expect("test formula should parse")
}

/// Convert an opaque FileId and error to a readable `Diagnostic`
pub fn parse_error_diagnostic<FileId>(
    file_id: FileId,
    e: &ParseError<LineCol>,
) -> Diagnostic<FileId> {
    Diagnostic::error()
        .with_message("could not parse formula")
        .with_labels(vec![Label::primary(
            file_id,
            e.location.offset..e.location.offset + 1,
        )
        .with_message(format!("expected {}", e.expected))])
}
