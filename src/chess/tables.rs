use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::chess::board::{castling, CastlingSide, Color, Species, Square, SquareMatrix, Squares};

/// Rules variant tag. Only the orthodox game is built in; the tag is carried
/// so fairy tables can slot in behind the same interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Orthodox,
}

pub const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

pub const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

pub const QUEEN_DIRS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

pub const KNIGHT_LEAPS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub const KING_STEPS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Static move tables for one (species, colour) under a variant.
///
/// - `moves[from]`: every square a move may go to, captures included.
/// - `capture_moves`: the subset of moves that *require* a capture (pawn
///   diagonals); `None` for species without capture-distinguished moves.
/// - `constraints[from][to]`: squares that must be empty to play the move
///   without capturing intent (transit squares plus the destination).
/// - `capture_constraints[from][to]`: same with capturing intent (transit
///   squares only; the destination holds the victim). This is the flavour
///   the deduction core blocks and routes with, so that a capture on the
///   destination square is never ruled out.
/// - `checks[sq]`: squares attacked from `sq` that no third piece could
///   block (a necessary but not sufficient check detector).
pub struct PieceTables {
    species: Species,
    color: Color,
    moves: SquareMatrix,
    capture_moves: Option<SquareMatrix>,
    constraints: Box<[SquareMatrix; 64]>,
    capture_constraints: Box<[SquareMatrix; 64]>,
    checks: [Squares; 64],
}

impl PieceTables {
    pub fn build(species: Species, color: Color, _variant: Variant) -> PieceTables {
        let mut tables = PieceTables {
            species,
            color,
            moves: [Squares::empty(); 64],
            capture_moves: None,
            constraints: Box::new([[Squares::empty(); 64]; 64]),
            capture_constraints: Box::new([[Squares::empty(); 64]; 64]),
            checks: [Squares::empty(); 64],
        };

        match species {
            Species::King => {
                tables.fill_leaper(&KING_STEPS);
                tables.fill_king_castling(color);
            }
            Species::Knight => tables.fill_leaper(&KNIGHT_LEAPS),
            Species::Queen => tables.fill_rider(&QUEEN_DIRS),
            Species::Rook => tables.fill_rider(&ROOK_DIRS),
            Species::Bishop => tables.fill_rider(&BISHOP_DIRS),
            Species::Pawn => tables.fill_pawn(color),
        }

        tables
    }

    #[inline]
    pub fn species(&self) -> Species {
        self.species
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// The initial per-piece move graph. When no captures are available to
    /// the piece, capture-requiring moves are left out from the start.
    pub fn legal_moves(&self, captures_possible: bool) -> SquareMatrix {
        let mut moves = self.moves;
        if !captures_possible {
            if let Some(capture_moves) = &self.capture_moves {
                for from in Square::all() {
                    moves[from.index()] -= capture_moves[from.index()];
                }
            }
        }
        moves
    }

    #[inline]
    pub fn capture_moves(&self) -> Option<&SquareMatrix> {
        self.capture_moves.as_ref()
    }

    /// 1 if the move requires a capture, 0 otherwise.
    #[inline]
    pub fn capture_cost(&self, from: Square, to: Square) -> i32 {
        match &self.capture_moves {
            Some(capture_moves) => capture_moves[from.index()].contains(to) as i32,
            None => 0,
        }
    }

    #[inline]
    pub fn constraint(&self, from: Square, to: Square) -> Squares {
        self.constraints[from.index()][to.index()]
    }

    #[inline]
    pub fn capture_constraint(&self, from: Square, to: Square) -> Squares {
        self.capture_constraints[from.index()][to.index()]
    }

    #[inline]
    pub fn checks(&self, square: Square) -> Squares {
        self.checks[square.index()]
    }

    fn fill_leaper(&mut self, steps: &[(i8, i8)]) {
        for from in Square::all() {
            for &(df, dr) in steps {
                if let Some(to) = from.offset(df, dr) {
                    self.moves[from.index()].insert(to);
                    self.constraints[from.index()][to.index()] = Squares::singleton(to);
                    self.checks[from.index()].insert(to);
                }
            }
        }
    }

    fn fill_rider(&mut self, dirs: &[(i8, i8)]) {
        for from in Square::all() {
            for &(df, dr) in dirs {
                let mut transit = Squares::empty();
                let mut step = 1;
                while let Some(to) = from.offset(df * step, dr * step) {
                    self.moves[from.index()].insert(to);
                    self.constraints[from.index()][to.index()] = transit | Squares::singleton(to);
                    self.capture_constraints[from.index()][to.index()] = transit;
                    if step == 1 {
                        // Attacks one step away cannot be interposed against.
                        self.checks[from.index()].insert(to);
                    }
                    transit.insert(to);
                    step += 1;
                }
            }
        }
    }

    // The castling edge is only added to a piece's working graph when the
    // problem grants the right, but its crossed squares are static.
    fn fill_king_castling(&mut self, color: Color) {
        for side in CastlingSide::both() {
            let squares = castling(color, side);
            let between = Squares::of(|square| {
                square.rank() == squares.from.rank()
                    && square.file() > squares.from.file().min(squares.rook.file())
                    && square.file() < squares.from.file().max(squares.rook.file())
            });
            self.constraints[squares.from.index()][squares.to.index()] = between;
            self.capture_constraints[squares.from.index()][squares.to.index()] = between;
        }
    }

    fn fill_pawn(&mut self, color: Color) {
        let mut capture_moves = [Squares::empty(); 64];
        let forward = color.forward();

        for from in Square::all() {
            // No pawn ever stands on the back ranks.
            if from.rank() == 0 || from.rank() == 7 {
                continue;
            }

            if let Some(to) = from.offset(0, forward) {
                self.moves[from.index()].insert(to);
                // A pawn can never capture straight ahead, so the
                // destination must be empty under either intent.
                self.constraints[from.index()][to.index()] = Squares::singleton(to);
                self.capture_constraints[from.index()][to.index()] = Squares::singleton(to);

                if from.rank() == color.pawn_rank() {
                    if let Some(double) = from.offset(0, 2 * forward) {
                        self.moves[from.index()].insert(double);
                        let both = Squares::singleton(to) | Squares::singleton(double);
                        self.constraints[from.index()][double.index()] = both;
                        self.capture_constraints[from.index()][double.index()] = both;
                    }
                }
            }

            for df in [-1, 1] {
                if let Some(to) = from.offset(df, forward) {
                    self.moves[from.index()].insert(to);
                    capture_moves[from.index()].insert(to);
                    self.checks[from.index()].insert(to);
                }
            }
        }

        self.capture_moves = Some(capture_moves);
    }
}

/// Shared, lazily-built table storage for one problem.
///
/// Tables are immutable once built; same-typed pieces share one copy.
pub struct Tables {
    variant: Variant,
    cache: FxHashMap<(Color, Species), Arc<PieceTables>>,
}

impl Tables {
    pub fn new(variant: Variant) -> Tables {
        Tables {
            variant,
            cache: FxHashMap::default(),
        }
    }

    pub fn get(&mut self, color: Color, species: Species) -> Arc<PieceTables> {
        self.cache
            .entry((color, species))
            .or_insert_with(|| Arc::new(PieceTables::build(species, color, self.variant)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn rook_moves_carry_their_transit_constraints() {
        let tables = PieceTables::build(Species::Rook, Color::White, Variant::Orthodox);

        let targets = tables.legal_moves(true)[sq("a1").index()];
        assert_eq!(targets.count(), 14);

        let quiet = tables.constraint(sq("a1"), sq("a4"));
        assert!(quiet.contains(sq("a2")));
        assert!(quiet.contains(sq("a3")));
        assert!(quiet.contains(sq("a4")));

        let capture = tables.capture_constraint(sq("a1"), sq("a4"));
        assert!(capture.contains(sq("a2")));
        assert!(!capture.contains(sq("a4")));
    }

    #[test]
    fn pawn_capture_moves_are_distinguished() {
        let tables = PieceTables::build(Species::Pawn, Color::White, Variant::Orthodox);

        let all = tables.legal_moves(true)[sq("e2").index()];
        assert!(all.contains(sq("e3")));
        assert!(all.contains(sq("e4")));
        assert!(all.contains(sq("d3")));
        assert!(all.contains(sq("f3")));

        // Without captures, the diagonals disappear.
        let quiet = tables.legal_moves(false)[sq("e2").index()];
        assert!(quiet.contains(sq("e4")));
        assert!(!quiet.contains(sq("d3")));

        assert_eq!(tables.capture_cost(sq("e2"), sq("d3")), 1);
        assert_eq!(tables.capture_cost(sq("e2"), sq("e3")), 0);

        // Double step must cross the intermediate square.
        assert!(tables.constraint(sq("e2"), sq("e4")).contains(sq("e3")));
    }

    #[test]
    fn black_pawns_move_down_the_board() {
        let tables = PieceTables::build(Species::Pawn, Color::Black, Variant::Orthodox);
        let targets = tables.legal_moves(true)[sq("e7").index()];
        assert!(targets.contains(sq("e6")));
        assert!(targets.contains(sq("e5")));
        assert!(targets.contains(sq("d6")));
        assert!(!targets.contains(sq("e8")));
    }

    #[test]
    fn unstoppable_checks_stop_at_interposable_distance() {
        let tables = PieceTables::build(Species::Rook, Color::White, Variant::Orthodox);
        let checks = tables.checks(sq("a1"));
        assert!(checks.contains(sq("a2")));
        assert!(checks.contains(sq("b1")));
        assert!(!checks.contains(sq("a3")));

        let knight = PieceTables::build(Species::Knight, Color::White, Variant::Orthodox);
        assert!(knight.checks(sq("g1")).contains(sq("f3")));
    }
}
