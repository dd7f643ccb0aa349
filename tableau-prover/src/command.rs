// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The tableau-prover binary's command-line interface.

use std::process;

use clap::Parser;
use codespan_reporting::{
    files::SimpleFile,
    term::{
        self as terminal,
        termcolor::{ColorChoice, StandardStream},
    },
};

use folm::parser::{self, parse_error_diagnostic};
use tableau::countermodel::counter_model;
use tableau::prover::{prove, SearchError};
use tableau::sentree::SentenceTree;

#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ColorOutput {
    Never,
    Auto,
    Always,
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Entrypoint for the tableau-prover binary.
pub struct App {
    #[arg(value_enum, long, default_value_t = ColorOutput::Auto)]
    /// Control color output. Auto disables colors with TERM=dumb or
    /// NO_COLOR=true.
    color: ColorOutput,

    #[arg(long)]
    /// Assume universal accessibility (the modal logic S5) instead of K
    s5: bool,

    #[arg(long, default_value_t = 5000)]
    /// Give up after this many rule applications
    limit: usize,

    #[arg(long)]
    /// Print the first-order tableau instead of remodalizing it
    raw: bool,

    /// The formula to prove, e.g. '□(p→q)→(□p→□q)' or '(Fa∧∀x(Fx→Gx))→Ga'
    formula: String,
}

impl App {
    /// Run the application.
    pub fn exec(self) {
        let files = SimpleFile::new("<formula>", &self.formula);
        let writer = StandardStream::stderr(match &self.color {
            ColorOutput::Never => ColorChoice::Never,
            ColorOutput::Always => ColorChoice::Always,
            ColorOutput::Auto => ColorChoice::Auto,
        });
        let config = codespan_reporting::term::Config::default();

        let (goal, mut sig) = match parser::parse(&self.formula) {
            Ok(v) => v,
            Err(err) => {
                let diagnostic = parse_error_diagnostic((), &err);
                terminal::emit(&mut writer.lock(), &config, &files, &diagnostic).unwrap();
                process::exit(1);
            }
        };

        let fv = match prove(&goal, &mut sig, self.s5, self.limit) {
            Ok(fv) => fv,
            Err(SearchError::LimitReached(n)) => {
                eprintln!("gave up after {n} rule applications");
                process::exit(2);
            }
        };

        if fv.closed() {
            let mut tree = SentenceTree::new(&fv, &mut sig);
            if !self.raw {
                tree.modalize(&sig);
            }
            println!("valid.");
            println!("{tree}");
        } else {
            let tree = SentenceTree::new(&fv, &mut sig);
            println!("not valid.");
            match counter_model(&tree, &sig) {
                Some(mut model) => {
                    let init = tree.init_formulas_nonmodal.clone();
                    if !model.satisfies_init_formulas(&init) {
                        log::warn!("countermodel could not be verified against the assumption");
                    }
                    println!("countermodel:");
                    println!("{model}");
                }
                None => println!("no countermodel extracted"),
            }
        }
    }
}
