/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
// for now we don't need any new feature but we might remove this in the future
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

/// The floating-point type used for weights, ranks and tolerances.
///
/// The precision is a global choice: it is `f64` unless the `f32` feature
/// is enabled.
#[cfg(not(feature = "f32"))]
pub type Float = f64;

/// The floating-point type used for weights, ranks and tolerances.
///
/// The precision is a global choice: it is `f64` unless the `f32` feature
/// is enabled.
#[cfg(feature = "f32")]
pub type Float = f32;

/// Minimum length of the slices handed to a Rayon task.
pub const RAYON_MIN_LEN: usize = 1024;

pub mod collective;
pub mod csr;
pub mod edge_stream;
mod error;
pub mod graph;
pub mod rank;
pub mod split;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::collective::*;
    pub use crate::csr::Csr;
    pub use crate::edge_stream::{EdgeStream, Header};
    pub use crate::graph::{to_zero_based, Graph};
    pub use crate::rank::*;
    pub use crate::split::{split, Partition};
    pub use crate::{Error, Float, Result};
}
