// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path geometry for 2D vector graphics: construction, flattening, stroking
//! and dashing.
//!
//! A [`Path`] is a sequence of [`Command`]s (moves, lines, quadratic and
//! cubic Béziers, elliptical arcs and closes) in absolute coordinates. Paths
//! can be built with the builder methods, parsed from SVG path data, or made
//! by the constructors in [`shapes`].
//!
//! Coordinates follow the mathematical convention: the y axis points up, and
//! positive angles turn counter-clockwise.
//!
//! ```
//! use vello_path::{Cap, Config, Join, Path, Stroke};
//!
//! let path: Path = "M0 0L10 0L10 10".parse().unwrap();
//! let style = Stroke::new(2.0).with_caps(Cap::Round).with_join(Join::Round);
//! let outline = path.stroke(&style, &Config::default());
//! assert!(outline.is_closed());
//! ```
//!
//! Operations that approximate geometry take a [`Config`] carrying the
//! flattening tolerance and the comparison epsilon.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![allow(missing_docs, reason = "Many accessors are self-explanatory.")]
#![allow(
    clippy::cast_possible_truncation,
    clippy::many_single_char_names,
    reason = "Geometry code counts steps in floats and names points by letter."
)]

mod bezier;
mod config;
mod dash;
mod ellipse;
mod flatten;
mod interop;
mod path;
mod point;
mod stroke;
mod svg;
mod transform;

pub mod math;
pub mod shapes;

use thiserror::Error;

pub use bezier::{CubicBez, QuadBez};
pub use config::Config;
pub use ellipse::{EllipseArc, SvgArc};
pub use flatten::{flatten_arc, flatten_cubic, Line};
pub use path::{Command, Path, Segment, Segments};
pub use point::{Point, Rect};
pub use stroke::{Cap, Dashes, GapJoin, Join, Stroke};
pub use transform::Transform;

pub use peniko;
pub use peniko::Fill;

/// Errors that can occur when parsing SVG path data.
///
/// Every variant carries the byte offset in the input at which the problem
/// was found.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The path data does not start with a command letter.
    #[error("Expected a path command at offset {offset}, found {found:?}")]
    MissingCommand { found: char, offset: usize },
    /// A letter that is not a path command.
    #[error("Unknown path command {command:?} at offset {offset}")]
    UnknownCommand { command: char, offset: usize },
    /// A number is missing or malformed.
    #[error("Expected a number at offset {offset}")]
    ExpectedNumber { offset: usize },
    /// An arc flag is not `0` or `1`.
    #[error("Expected an arc flag at offset {offset}")]
    ExpectedFlag { offset: usize },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
