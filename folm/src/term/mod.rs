// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Utilities for manipulating folm [`crate::syntax::Formula`]s.

pub mod cnf;
pub mod nnf;
pub mod skolem;
pub mod subst;
