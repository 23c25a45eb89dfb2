//! The deduction core: one [`Piece`] per occupant of the initial position,
//! tightened to a fixed point.
//!
//! The driver interleaves four kinds of work until nothing changes:
//!
//! - single-piece updates ([`Piece::update`]),
//! - global budget propagation (each colour's spare moves bound every
//!   piece's `available_moves`),
//! - pairwise obstacle bypassing ([`Piece::bypass_obstacles`]),
//! - two-piece mutual analysis ([`mutual_interactions`]).
//!
//! Every operation is a monotone refinement, so the ordering only affects
//! speed; the fixed point is the same. Infeasibility always surfaces as some
//! piece's `possible_squares` shrinking to empty, reported as
//! [`DeductionError::NoSolution`].

pub mod cache;
pub mod interplay;
pub mod piece;

use serde::{Deserialize, Serialize};

use crate::chess::board::{castling, CastlingSide, Color, Species, Square};
use crate::chess::tables::Tables;
use crate::problem::{DeductionError, Problem, ResourceLimits};

pub use cache::{JointPosition, TwoPieceCache};
pub use interplay::{mutual_interactions, InterplayStats};
pub use piece::{OccupiedFacts, Piece, PieceId, INFINITY};

/// Deduction state for one problem: the tracked pieces and the fixed-point
/// machinery.
pub struct Deduction {
    problem: Problem,
    limits: ResourceLimits,
    pieces: Vec<Piece>,
    passes: u64,
    stats: InterplayStats,
}

impl Deduction {
    pub fn new(problem: Problem) -> Deduction {
        Deduction::with_limits(problem, ResourceLimits::default())
    }

    pub fn with_limits(problem: Problem, limits: ResourceLimits) -> Deduction {
        let mut tables = Tables::new(problem.variant());
        let mut pieces = Vec::new();

        for square in problem.occupied_initial_squares() {
            let glyph = problem.initial_glyph(square);
            let (Some(color), Some(species)) = (glyph.color(), glyph.species()) else {
                continue;
            };
            let id = pieces.len();
            pieces.push(Piece::new(
                &problem,
                square,
                glyph,
                color,
                species,
                id,
                tables.get(color, species),
            ));
        }

        Deduction {
            problem,
            limits,
            pieces,
            passes: 0,
            stats: InterplayStats::default(),
        }
    }

    #[inline]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[inline]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id]
    }

    /// The piece tracked from `square` in the initial position, if any.
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.pieces
            .iter()
            .find(|piece| piece.initial_square() == square)
    }

    /// Run deduction to its fixed point.
    pub fn run(&mut self) -> Result<DeductionReport, DeductionError> {
        loop {
            self.settle_pieces()?;
            if !self.analyse_pairs()? {
                break;
            }
        }
        self.check_exact_budget()?;
        Ok(self.report())
    }

    /// Single-piece updates, budget propagation, obstacle bypassing and
    /// occupancy closure, repeated until no piece is dirty.
    fn settle_pieces(&mut self) -> Result<(), DeductionError> {
        while self.pieces.iter().any(Piece::is_dirty) {
            self.bump_pass()?;

            for index in 0..self.pieces.len() {
                self.pieces[index].update()?;
            }

            self.sync_castling()?;
            self.propagate_budgets()?;
            self.bypass_pairs();
            close_occupied_facts(&mut self.pieces);
        }
        Ok(())
    }

    /// Castling is a joint fact: the king's tristate and the partner rook's
    /// tristate settle together, and disagreement is infeasibility.
    fn sync_castling(&mut self) -> Result<(), DeductionError> {
        for color in Color::both() {
            for side in CastlingSide::both() {
                let squares = castling(color, side);
                let king = self.pieces.iter().position(|piece| {
                    piece.royal()
                        && piece.color() == color
                        && piece.initial_square() == squares.from
                });
                let rook = self.pieces.iter().position(|piece| {
                    piece.species() == Species::Rook
                        && piece.color() == color
                        && piece.initial_square() == squares.rook
                });
                let (Some(king), Some(rook)) = (king, rook) else {
                    continue;
                };

                let king_state = self.pieces[king].castling(side);
                let rook_state = self.pieces[rook].castling(side);
                if !king_state.is_unknown()
                    && !rook_state.is_unknown()
                    && king_state != rook_state
                {
                    return Err(DeductionError::NoSolution);
                }
                if king_state.is_unknown() && !rook_state.is_unknown() {
                    self.pieces[king].set_castling(side, rook_state.is_true());
                }
                if rook_state.is_unknown() && !king_state.is_unknown() {
                    self.pieces[rook].set_castling(side, king_state.is_true());
                }
            }
        }
        Ok(())
    }

    /// One round of mutual analysis over every pair. Returns whether any
    /// piece learned something.
    fn analyse_pairs(&mut self) -> Result<bool, DeductionError> {
        for a in 0..self.pieces.len() {
            for b in a + 1..self.pieces.len() {
                self.analyse_pair(a, b, false)?;
            }
        }

        Ok(self.pieces.iter().any(Piece::is_dirty))
    }

    /// Mutual analysis of one pair, under the current residual budgets.
    ///
    /// Returns a lower bound on the moves the pair consumes together; both
    /// pieces may be tightened as a side effect.
    pub fn analyse_pair(
        &mut self,
        a: PieceId,
        b: PieceId,
        fast: bool,
    ) -> Result<i32, DeductionError> {
        let free_moves = self.free_moves()?;
        let (piece_a, piece_b) = borrow_pair_mut(&mut self.pieces, a, b);
        mutual_interactions(
            piece_a,
            piece_b,
            &free_moves,
            fast,
            &self.limits,
            &mut self.stats,
        )
    }

    /// Residual per-colour budget: moves not yet claimed by required-move
    /// bounds.
    fn free_moves(&self) -> Result<[i32; 2], DeductionError> {
        let mut free_moves = [0; 2];
        for color in Color::both() {
            let required: i32 = self
                .pieces
                .iter()
                .filter(|piece| piece.color() == color)
                .map(Piece::required_moves)
                .sum();
            let budget = self.problem.moves(color);
            if required > budget {
                return Err(DeductionError::NoSolution);
            }
            free_moves[color.index()] = budget - required;
        }
        Ok(free_moves)
    }

    /// Tighten every piece's availability to its own requirement plus the
    /// colour's spare budget.
    fn propagate_budgets(&mut self) -> Result<(), DeductionError> {
        for color in Color::both() {
            let move_budget = self.problem.moves(color);
            let capture_budget = self.problem.captures_available(color);

            let (mut required_moves, mut required_captures) = (0, 0);
            for piece in self.pieces.iter().filter(|piece| piece.color() == color) {
                required_moves += piece.required_moves();
                required_captures += piece.required_captures();
            }

            if required_moves > move_budget || required_captures > capture_budget {
                return Err(DeductionError::NoSolution);
            }

            let free_moves = move_budget - required_moves;
            let free_captures = capture_budget - required_captures;

            for piece in self
                .pieces
                .iter_mut()
                .filter(|piece| piece.color() == color)
            {
                let own_moves = piece.required_moves();
                piece.set_available_moves(own_moves + free_moves);
                let own_captures = piece.required_captures();
                piece.set_available_captures(own_captures + free_captures);
            }
        }
        Ok(())
    }

    fn bypass_pairs(&mut self) {
        for a in 0..self.pieces.len() {
            for b in 0..self.pieces.len() {
                if a == b {
                    continue;
                }
                let (piece, blocker) = borrow_pair(&mut self.pieces, a, b);
                piece.bypass_obstacles(blocker);
            }
        }
    }

    /// The budget must be consumed exactly. A colour with spare moves needs
    /// some piece able to absorb them: the smallest detour or longer-target
    /// increment any piece offers must not exceed the surplus.
    fn check_exact_budget(&self) -> Result<(), DeductionError> {
        for color in Color::both() {
            let required: i32 = self
                .pieces
                .iter()
                .filter(|piece| piece.color() == color)
                .map(Piece::required_moves)
                .sum();
            let surplus = self.problem.moves(color) - required;
            if surplus <= 0 {
                continue;
            }

            let smallest = self
                .pieces
                .iter()
                .filter(|piece| piece.color() == color)
                .map(minimum_extra_moves)
                .min()
                .unwrap_or(INFINITY);

            if surplus < smallest {
                return Err(DeductionError::NoSolution);
            }
        }
        Ok(())
    }

    fn bump_pass(&mut self) -> Result<(), DeductionError> {
        self.passes += 1;
        if self.passes > self.limits.max_fixed_point_passes {
            return Err(DeductionError::InternalLogic {
                stage: "fixed_point",
                detail: format!(
                    "no fixed point after {} passes; monotonicity is broken",
                    self.passes
                ),
            });
        }
        Ok(())
    }

    fn report(&self) -> DeductionReport {
        DeductionReport {
            pieces: self.pieces.iter().map(PieceReport::new).collect(),
            passes: self.passes,
            mutual_calls: self.stats.calls,
            fast_calls: self.stats.fast_calls,
            full_calls: self.stats.full_calls,
            fast_queue_overflows: self.stats.fast_queue_overflows,
        }
    }
}

/// The smallest number of spare moves a piece could absorb while still
/// ending on an admissible square, or [`INFINITY`] if it can absorb none.
///
/// A spare move shows up either as a longer-than-minimal admissible target
/// or as a non-shortest walk; the piece's second-shortest walk lengths bound
/// both from below.
fn minimum_extra_moves(piece: &Piece) -> i32 {
    let (first, second) = piece.walk_lengths();
    let mut extra = INFINITY;

    for goal in piece.possible_squares().iter() {
        for length in [first[goal.index()], second[goal.index()]] {
            if length <= piece.available_moves() && length > piece.required_moves() {
                extra = extra.min(length - piece.required_moves());
            }
        }
    }

    extra
}

/// Chase published occupancy facts to their transitive closure: if reaching
/// `square` implies piece `q` stands on `occ`, then whatever `q` publishes
/// about being on `occ` holds simultaneously too.
fn close_occupied_facts(pieces: &mut [Piece]) {
    for index in 0..pieces.len() {
        for square in Square::all() {
            loop {
                let mut additions: Vec<(Square, PieceId)> = Vec::new();
                {
                    let facts = &pieces[index].occupied[square.index()];
                    for occupied in facts.squares.iter() {
                        let Some(owner) = facts.pieces[occupied.index()] else {
                            continue;
                        };
                        let owner_facts = &pieces[owner].occupied[occupied.index()];
                        for other in owner_facts.squares.iter() {
                            if facts.squares.contains(other) {
                                continue;
                            }
                            if additions.iter().any(|(square, _)| *square == other) {
                                continue;
                            }
                            if let Some(transitive) = owner_facts.pieces[other.index()] {
                                additions.push((other, transitive));
                            }
                        }
                    }
                }

                if additions.is_empty() {
                    break;
                }

                let facts = &mut pieces[index].occupied[square.index()];
                for (other, owner) in additions {
                    facts.squares.insert(other);
                    facts.pieces[other.index()] = Some(owner);
                }
                pieces[index].dirty = true;
            }
        }
    }
}

/// Split a slice into one mutable and one shared element, `a != b`.
fn borrow_pair(pieces: &mut [Piece], a: usize, b: usize) -> (&mut Piece, &Piece) {
    debug_assert!(a != b);
    if a < b {
        let (left, right) = pieces.split_at_mut(b);
        (&mut left[a], &right[0])
    } else {
        let (left, right) = pieces.split_at_mut(a);
        (&mut right[0], &left[b])
    }
}

/// Split a slice into two mutable elements, `a != b`.
fn borrow_pair_mut(pieces: &mut [Piece], a: usize, b: usize) -> (&mut Piece, &mut Piece) {
    debug_assert!(a != b);
    if a < b {
        let (left, right) = pieces.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = pieces.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Per-piece summary of what deduction established.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceReport {
    pub glyph: char,
    pub initial_square: String,
    pub final_square: Option<String>,
    pub possible_squares: Vec<String>,
    pub required_moves: i32,
    pub available_moves: i32,
    pub required_captures: i32,
    pub available_captures: i32,
    pub captured: String,
    pub promoted: String,
    pub castling_kingside: String,
    pub castling_queenside: String,
}

impl PieceReport {
    fn new(piece: &Piece) -> PieceReport {
        use crate::chess::board::CastlingSide;

        PieceReport {
            glyph: piece.glyph().to_char(),
            initial_square: piece.initial_square().to_string(),
            final_square: piece.final_square().map(|square| square.to_string()),
            possible_squares: piece
                .possible_squares()
                .iter()
                .map(|square| square.to_string())
                .collect(),
            required_moves: piece.required_moves(),
            available_moves: piece.available_moves(),
            required_captures: piece.required_captures(),
            available_captures: piece.available_captures(),
            captured: piece.captured().to_string(),
            promoted: piece.promoted().to_string(),
            castling_kingside: piece.castling(CastlingSide::KingSide).to_string(),
            castling_queenside: piece.castling(CastlingSide::QueenSide).to_string(),
        }
    }
}

/// Whole-problem summary returned by [`Deduction::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionReport {
    pub pieces: Vec<PieceReport>,
    pub passes: u64,
    pub mutual_calls: u64,
    pub fast_calls: u64,
    pub full_calls: u64,
    pub fast_queue_overflows: u64,
}
