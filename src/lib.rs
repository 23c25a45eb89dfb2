//! # euclide
//!
//! The per-piece deduction core of a solver for retrograde chess problems:
//! "reach this diagram from this position in exactly N half-moves".
//!
//! ## Architecture
//!
//! The codebase is structured as layered components:
//!
//! - [`core`]: allocation-free primitives ([`core::BitSet`], the bounded
//!   [`core::Queue`], [`core::Tristate`]).
//! - [`chess`]: board primitives and the static per-species move tables
//!   (adjacency, capture moves, must-be-empty constraints, unstoppable
//!   checks).
//! - [`problem`]: problem intake and validation, the crate error type,
//!   resource limits.
//! - [`deduction`]: the tracked [`deduction::Piece`] record, single-piece
//!   tightening, pairwise obstacle bypassing, two-piece mutual analysis,
//!   and the fixed-point driver [`deduction::Deduction`].
//! - [`problems`]: built-in example problems.
//!
//! Deduction is a monotone fixed point: possibility sets only shrink and
//! bounds only tighten, so "repeat until nothing changes" terminates, and
//! infeasibility always surfaces as the distinguished
//! [`problem::DeductionError::NoSolution`].
//!
//! ## Quick start
//!
//! ```no_run
//! use euclide::deduction::Deduction;
//! use euclide::problems;
//!
//! let problem = problems::opening_knights().unwrap();
//! let mut deduction = Deduction::new(problem);
//! let report = deduction.run().unwrap();
//! for piece in &report.pieces {
//!     println!("{} {}: {} required moves", piece.glyph, piece.initial_square, piece.required_moves);
//! }
//! ```

pub mod chess;
pub mod core;
pub mod deduction;
pub mod problem;
pub mod problems;
