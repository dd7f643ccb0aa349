// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Free-variable tableau search and sentence-tableau construction.
//!
//! [`prover`] searches for a closed analytic tableau for a formula;
//! [`sentree`] rebuilds the discovered free-variable proof as the sentence
//! tableau a textbook would show, and [`countermodel`] reads a canonical
//! model off an open branch when the search fails.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::large_enum_variant)]
#![allow(clippy::type_complexity)]
#![deny(clippy::uninlined_format_args)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod countermodel;
pub mod prover;
pub mod sentree;
pub mod unify;
