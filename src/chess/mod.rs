//! Board primitives and the static move tables the deduction core consumes.

pub mod board;
pub mod tables;

pub use board::{
    castling, Castling, CastlingSide, Color, Glyph, Glyphs, Species, Square, SquareMatrix, Squares,
};
pub use tables::{PieceTables, Tables, Variant};
