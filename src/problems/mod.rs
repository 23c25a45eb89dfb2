//! Built-in example problems (compile-time configs).
//!
//! These are small retrograde problems used by the CLI, the tests and the
//! documentation examples. Each returns a fully validated [`Problem`].

use crate::problem::{DeductionError, Problem};

/// Forsythe string of the orthodox initial array.
pub const ORTHODOX_START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

/// Orthodox array to the diagram after 1.e4 e5 2.Nf3 Nc6, in 4 half-moves.
///
/// Every piece except the four movers is pinned to its initial square.
pub fn opening_knights() -> Result<Problem, DeductionError> {
    Problem::from_forsythe(
        ORTHODOX_START,
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R",
        4,
    )
}

/// Orthodox array to itself in 0 half-moves: trivially solvable.
pub fn frozen_start() -> Result<Problem, DeductionError> {
    Problem::from_forsythe(ORTHODOX_START, ORTHODOX_START, 0)
}

/// Orthodox array to itself in 2 half-moves: no solution, because a single
/// move per side cannot be taken back.
pub fn wasted_tempo() -> Result<Problem, DeductionError> {
    Problem::from_forsythe(ORTHODOX_START, ORTHODOX_START, 2)
}

/// White castles kingside in 8 half-moves (1.Nf3 2.e3 3.Be2 4.O-O while
/// Black shuffles its knights out and back).
pub fn kingside_castling() -> Result<Problem, DeductionError> {
    Problem::from_forsythe(
        ORTHODOX_START,
        "rnbqkbnr/pppppppp/8/8/8/4PN2/PPPPBPPP/RNBQ1RK1",
        8,
    )
}

/// The white queen must reach h8 in one move, but a black pawn sits on the
/// long diagonal and cannot be captured: no solution.
pub fn blocked_diagonal() -> Result<Problem, DeductionError> {
    Problem::from_forsythe("4k3/6p1/8/8/8/8/8/Q3K3", "4k2Q/6p1/8/8/8/8/8/4K3", 1)
}

/// Same material, but the queen's target is the reachable corner a8.
pub fn open_file() -> Result<Problem, DeductionError> {
    Problem::from_forsythe("4k3/6p1/8/8/8/8/8/Q3K3", "Q3k3/6p1/8/8/8/8/8/4K3", 1)
}

/// The rook on a1 must reach a3, but its own pawn sits on a2 forever: the
/// one-move file path is dead and the rook needs a three-move detour.
pub fn blocked_file() -> Result<Problem, DeductionError> {
    Problem::from_forsythe("4k3/8/8/8/8/8/P7/R3K3", "4k3/8/8/8/8/R7/P7/4K3", 6)
}

/// Return a built-in problem by name.
pub fn by_name(name: &str) -> Result<Option<Problem>, DeductionError> {
    match name {
        "opening_knights" => Ok(Some(opening_knights()?)),
        "frozen_start" => Ok(Some(frozen_start()?)),
        "wasted_tempo" => Ok(Some(wasted_tempo()?)),
        "kingside_castling" => Ok(Some(kingside_castling()?)),
        "blocked_diagonal" => Ok(Some(blocked_diagonal()?)),
        "open_file" => Ok(Some(open_file()?)),
        "blocked_file" => Ok(Some(blocked_file()?)),
        _ => Ok(None),
    }
}

/// Names of all built-in problems.
pub fn available_names() -> &'static [&'static str] {
    &[
        "opening_knights",
        "frozen_start",
        "wasted_tempo",
        "kingside_castling",
        "blocked_diagonal",
        "open_file",
        "blocked_file",
    ]
}
