use std::sync::Arc;

use crate::chess::board::{
    castling, CastlingSide, Color, Glyph, Glyphs, Species, Square, SquareMatrix, Squares,
};
use crate::chess::tables::PieceTables;
use crate::core::queue::Queue;
use crate::core::tristate::Tristate;
use crate::problem::{DeductionError, Problem};

/// Distance sentinel for unreachable squares. Small enough that sums of a
/// few distances stay far from `i32` overflow.
pub const INFINITY: i32 = 1 << 16;

/// Index of a piece in the deduction context's piece list.
pub type PieceId = usize;

/// Simultaneous-occupation facts: if this piece reaches the indexing square,
/// `squares` are provably also occupied, each by the piece named in `pieces`.
#[derive(Clone)]
pub struct OccupiedFacts {
    pub squares: Squares,
    pub pieces: [Option<PieceId>; 64],
}

impl OccupiedFacts {
    fn empty() -> OccupiedFacts {
        OccupiedFacts {
            squares: Squares::empty(),
            pieces: [None; 64],
        }
    }
}

/// One tracked piece: the occupant of one initial-position square, with
/// everything deduction has established about its journey to the diagram.
///
/// Every field is a monotone refinement: possibility sets only shrink,
/// bounds only tighten, move edges only disappear. The mutators are no-ops
/// unless they strictly tighten, and raise the dirty flag when they do;
/// that is what makes the driver's fixed point well-defined.
pub struct Piece {
    pub(crate) id: PieceId,
    pub(crate) glyph: Glyph,
    pub(crate) color: Color,
    pub(crate) species: Species,
    pub(crate) royal: bool,

    pub(crate) initial_square: Square,
    pub(crate) castling_square: Square,
    pub(crate) final_square: Option<Square>,

    pub(crate) captured: Tristate,
    pub(crate) promoted: Tristate,
    pub(crate) glyphs: Glyphs,

    pub(crate) available_moves: i32,
    pub(crate) available_captures: i32,
    pub(crate) required_moves: i32,
    pub(crate) required_captures: i32,

    pub(crate) possible_squares: Squares,
    pub(crate) possible_captures: Squares,
    // Squares where the diagram shows this piece's own glyph.
    pub(crate) diagram_squares: Squares,

    pub(crate) moves: SquareMatrix,
    pub(crate) tables: Arc<PieceTables>,

    pub(crate) distances: [i32; 64],
    pub(crate) captures: [i32; 64],
    pub(crate) rdistances: [i32; 64],
    pub(crate) rcaptures: [i32; 64],

    pub(crate) stops: Squares,
    pub(crate) route: Squares,
    pub(crate) threats: Squares,

    pub(crate) occupied: Vec<OccupiedFacts>,
    pub(crate) castling: [Tristate; 2],
    pub(crate) dirty: bool,
}

impl Piece {
    pub(crate) fn new(
        problem: &Problem,
        square: Square,
        glyph: Glyph,
        color: Color,
        species: Species,
        id: PieceId,
        tables: Arc<PieceTables>,
    ) -> Piece {
        let royal = species == Species::King;

        // Royal pieces, and pieces of a colour that loses nothing between
        // the two positions, are born uncaptured.
        let captured = if royal || problem.captured_count(color) == 0 {
            Tristate::False
        } else {
            Tristate::Unknown
        };
        let promoted = if species == Species::Pawn {
            Tristate::Unknown
        } else {
            Tristate::False
        };

        let mut glyphs = Glyphs::singleton(glyph);
        if captured.maybe() {
            glyphs.insert(Glyph::Empty);
        }
        if promoted.maybe() {
            glyphs |= Glyphs::of(|candidate| candidate.color() == Some(color));
        }

        let available_moves = problem.moves(color);
        let available_captures = problem.captures_available(color);

        let diagram_squares = Squares::of(|target| problem.diagram_glyph(target) == glyph);
        let possible_squares = Squares::of(|target| {
            captured.maybe()
                || problem.diagram_glyph(target) == glyph
                || (promoted.maybe() && problem.diagram_glyph(target).color() == Some(color))
        });
        let possible_captures = if available_captures > 0 {
            Squares::full()
        } else {
            Squares::empty()
        };

        let moves = tables.legal_moves(available_captures > 0);

        let mut piece = Piece {
            id,
            glyph,
            color,
            species,
            royal,
            initial_square: square,
            castling_square: square,
            final_square: None,
            captured,
            promoted,
            glyphs,
            available_moves,
            available_captures,
            required_moves: 0,
            required_captures: 0,
            possible_squares,
            possible_captures,
            diagram_squares,
            moves,
            tables,
            distances: [0; 64],
            captures: [0; 64],
            rdistances: [0; 64],
            rcaptures: [0; 64],
            stops: Squares::full(),
            route: Squares::full(),
            threats: Squares::empty(),
            occupied: vec![OccupiedFacts::empty(); 64],
            castling: [Tristate::False; 2],
            dirty: true,
        };

        if species == Species::King {
            for side in CastlingSide::both() {
                let squares = castling(color, side);
                if piece.initial_square == squares.from && problem.castling(color, side) {
                    piece.moves[squares.from.index()].insert(squares.to);
                    piece.castling[side.index()] = Tristate::Unknown;
                }
            }
        }

        if species == Species::Rook {
            for side in CastlingSide::both() {
                let squares = castling(color, side);
                if piece.initial_square == squares.rook && problem.castling(color, side) {
                    piece.castling_square = squares.free;
                    piece.castling[side.index()] = Tristate::Unknown;
                }
            }
        }

        piece
    }

    #[inline]
    pub fn id(&self) -> PieceId {
        self.id
    }

    #[inline]
    pub fn glyph(&self) -> Glyph {
        self.glyph
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn species(&self) -> Species {
        self.species
    }

    #[inline]
    pub fn royal(&self) -> bool {
        self.royal
    }

    #[inline]
    pub fn initial_square(&self) -> Square {
        self.initial_square
    }

    #[inline]
    pub fn castling_square(&self) -> Square {
        self.castling_square
    }

    #[inline]
    pub fn final_square(&self) -> Option<Square> {
        self.final_square
    }

    #[inline]
    pub fn captured(&self) -> Tristate {
        self.captured
    }

    #[inline]
    pub fn promoted(&self) -> Tristate {
        self.promoted
    }

    #[inline]
    pub fn glyphs(&self) -> Glyphs {
        self.glyphs
    }

    #[inline]
    pub fn available_moves(&self) -> i32 {
        self.available_moves
    }

    #[inline]
    pub fn available_captures(&self) -> i32 {
        self.available_captures
    }

    #[inline]
    pub fn required_moves(&self) -> i32 {
        self.required_moves
    }

    #[inline]
    pub fn required_captures(&self) -> i32 {
        self.required_captures
    }

    #[inline]
    pub fn possible_squares(&self) -> Squares {
        self.possible_squares
    }

    #[inline]
    pub fn possible_captures(&self) -> Squares {
        self.possible_captures
    }

    /// Destinations still admissible from `from`.
    #[inline]
    pub fn move_targets(&self, from: Square) -> Squares {
        self.moves[from.index()]
    }

    /// Total admissible edge count.
    pub fn move_count(&self) -> usize {
        self.moves.iter().map(|targets| targets.count() as usize).sum()
    }

    #[inline]
    pub fn distance(&self, square: Square) -> i32 {
        self.distances[square.index()]
    }

    #[inline]
    pub fn rdistance(&self, square: Square) -> i32 {
        self.rdistances[square.index()]
    }

    #[inline]
    pub fn capture_distance(&self, square: Square) -> i32 {
        self.captures[square.index()]
    }

    #[inline]
    pub fn stops(&self) -> Squares {
        self.stops
    }

    #[inline]
    pub fn route(&self) -> Squares {
        self.route
    }

    #[inline]
    pub fn threats(&self) -> Squares {
        self.threats
    }

    #[inline]
    pub fn occupied(&self, square: Square) -> &OccupiedFacts {
        &self.occupied[square.index()]
    }

    #[inline]
    pub fn castling(&self, side: CastlingSide) -> Tristate {
        self.castling[side.index()]
    }

    /// Unstoppable-check squares for this piece standing on `square`.
    #[inline]
    pub fn checks(&self, square: Square) -> Squares {
        self.tables.checks(square)
    }

    /// Squares the move `from -> to` passes through. This is the
    /// capture-intent constraint flavour: the destination is excluded, so a
    /// capture landing there is never ruled out.
    #[inline]
    pub fn transit_constraint(&self, from: Square, to: Square) -> Squares {
        self.tables.capture_constraint(from, to)
    }

    /// Squares that must be empty for the non-capturing move `from -> to`,
    /// destination included.
    #[inline]
    pub fn quiet_constraint(&self, from: Square, to: Square) -> Squares {
        self.tables.constraint(from, to)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_castling(&mut self, side: CastlingSide, value: bool) {
        if !self.castling[side.index()].is_unknown() {
            return;
        }

        // A king can castle on at most one side.
        if value && self.royal {
            for other in CastlingSide::both() {
                if other != side {
                    self.set_castling(other, false);
                }
            }
        }

        if !value {
            if self.royal {
                let squares = castling(self.color, side);
                self.moves[squares.from.index()].remove(squares.to);
            }
            self.castling_square = self.initial_square;
        }

        self.castling[side.index()] = value.into();
        self.dirty = true;
    }

    pub fn set_captured(&mut self, value: bool) {
        if self.captured.settle(value) {
            self.dirty = true;
        }
    }

    pub fn set_available_moves(&mut self, available_moves: i32) {
        if available_moves >= self.available_moves {
            return;
        }
        self.available_moves = available_moves;
        self.dirty = true;
    }

    pub fn set_available_captures(&mut self, available_captures: i32) {
        if available_captures >= self.available_captures {
            return;
        }
        self.available_captures = available_captures;
        self.dirty = true;
    }

    pub fn set_possible_squares(&mut self, squares: Squares) {
        if (self.possible_squares & squares) == self.possible_squares {
            return;
        }
        self.possible_squares &= squares;
        self.dirty = true;
    }

    pub fn set_possible_captures(&mut self, squares: Squares) {
        if (self.possible_captures & squares) == self.possible_captures {
            return;
        }
        self.possible_captures &= squares;
        self.dirty = true;
    }

    /// Raise the required-move lower bound (used by mutual analysis).
    pub(crate) fn raise_required_moves(&mut self, required_moves: i32) {
        if required_moves > self.required_moves {
            self.required_moves = required_moves;
            self.dirty = true;
        }
    }

    /// Re-run single-piece deduction if anything changed since the last run.
    ///
    /// Loops until the piece's own mutations stop re-raising the dirty flag.
    /// Returns whether the piece had anything to do.
    pub fn update(&mut self) -> Result<bool, DeductionError> {
        if !self.dirty {
            return Ok(false);
        }
        while self.dirty {
            self.dirty = false;
            self.run_deductions()?;
        }
        Ok(true)
    }

    fn run_deductions(&mut self) -> Result<(), DeductionError> {
        let tables = self.tables.clone();

        // Castling for rooks. The castling square is only distinct while
        // castling remains open on some side.
        if self.castling_square != self.initial_square {
            if self.moves[self.castling_square.index()].is_empty()
                && !self.possible_squares.contains(self.castling_square)
            {
                for side in CastlingSide::both() {
                    self.set_castling(side, false);
                }
            }
        }

        if self.castling_square != self.initial_square {
            if self.moves[self.initial_square.index()].is_empty()
                && !self.possible_squares.contains(self.initial_square)
            {
                for side in CastlingSide::both() {
                    self.set_castling(side, true);
                }
            }
        }

        if self.castling_square != self.initial_square
            && self.distances[self.castling_square.index()] > 0
        {
            for side in CastlingSide::both() {
                self.set_castling(side, false);
            }
        }

        // Distances; the vectors are lower bounds and may only grow.
        let castled = CastlingSide::both().any(|side| self.castling[side.index()].is_true());
        let source = if castled {
            self.castling_square
        } else {
            self.initial_square
        };

        let distances = self.compute_distances(source, self.castling_square);
        maximize_all(&mut self.distances, &distances);

        if tables.capture_moves().is_some() {
            let captures = self.compute_captures(source, self.castling_square);
            maximize_all(&mut self.captures, &captures);
        }

        // A pawn that cannot reach the far rank will never promote; its
        // final glyph must then be its own.
        if self.promoted.is_unknown() {
            let far_rank = match self.color {
                Color::White => 7,
                Color::Black => 0,
            };
            let promotable = (0..8).any(|file| {
                self.distances[Square::new(file, far_rank).index()] <= self.available_moves
            });
            if !promotable {
                self.promoted = Tristate::False;
                self.glyphs = Glyphs::singleton(self.glyph);
                if self.captured.maybe() {
                    self.glyphs.insert(Glyph::Empty);
                } else {
                    self.possible_squares &= self.diagram_squares;
                }
            }
        }

        // Reachability pruning.
        for square in self.possible_squares.iter() {
            if self.distances[square.index()] > self.available_moves {
                self.possible_squares.remove(square);
            }
        }
        for square in self.possible_captures.iter() {
            if self.captures[square.index()] > self.available_captures {
                self.possible_captures.remove(square);
            }
        }

        let rdistances = self.compute_distances_to(self.possible_squares);
        maximize_all(&mut self.rdistances, &rdistances);

        if tables.capture_moves().is_some() {
            let rcaptures = self.compute_captures_to(self.possible_squares);
            maximize_all(&mut self.rcaptures, &rcaptures);
        }

        // Any final squares left?
        if self.possible_squares.is_empty() {
            return Err(DeductionError::NoSolution);
        }
        if self.possible_squares.count() == 1 {
            self.final_square = self.possible_squares.first();
        }

        // Minimum moves and captures this piece must perform.
        if let Some(min_distance) = self
            .possible_squares
            .iter()
            .map(|square| self.distances[square.index()])
            .min()
        {
            self.required_moves = self.required_moves.max(min_distance);
        }
        if let Some(min_captures) = self
            .possible_squares
            .iter()
            .map(|square| self.captures[square.index()])
            .min()
        {
            self.required_captures = self.required_captures.max(min_captures);
        }

        // Moves that can no longer appear on any admissible journey.
        for from in Square::all() {
            for to in self.moves[from.index()].iter() {
                if self.distances[from.index()] + 1 + self.rdistances[to.index()]
                    > self.available_moves
                {
                    self.moves[from.index()].remove(to);
                }
            }
        }

        if tables.capture_moves().is_some() {
            for from in Square::all() {
                for to in self.moves[from.index()].iter() {
                    if self.captures[from.index()]
                        + tables.capture_cost(from, to)
                        + self.rcaptures[to.index()]
                        > self.available_captures
                    {
                        self.moves[from.index()].remove(to);
                    }
                }
            }
        }

        // Castling state follows the king's remaining moves.
        if self.royal {
            for side in CastlingSide::both() {
                if self.castling[side.index()].maybe() {
                    let squares = castling(self.color, side);
                    let from_moves = self.moves[squares.from.index()];
                    if !from_moves.contains(squares.to) {
                        self.set_castling(side, false);
                    } else if from_moves.count() == 1 {
                        self.set_castling(side, true);
                    }
                }
            }
        }

        // Squares the piece may stop on, cross, or attack from.
        self.stops = self.possible_squares;
        self.stops.insert(self.initial_square);
        self.stops.insert(self.castling_square);
        for from in Square::all() {
            self.stops |= self.moves[from.index()];
        }

        self.route = self.stops;
        for from in Square::all() {
            for to in self.moves[from.index()].iter() {
                self.route |= tables.capture_constraint(from, to);
            }
        }

        self.threats = Squares::empty();
        for square in self.stops.iter() {
            self.threats |= tables.checks(square);
        }

        Ok(())
    }

    /// Refute moves that a never-moving obstacle makes impossible.
    ///
    /// `blocker.stops()` is the candidate obstacle set: if every square the
    /// blocker might ever stand on lies inside the must-be-empty set of one
    /// of our moves, that move can never be played.
    pub fn bypass_obstacles(&mut self, blocker: &Piece) {
        let tables = self.tables.clone();
        let obstacles = blocker.stops;
        if obstacles.is_empty() {
            return;
        }

        if obstacles.intersects(self.route) {
            for from in self.stops.iter() {
                for to in self.moves[from.index()].iter() {
                    let barrier =
                        tables.capture_constraint(from, to) | Squares::singleton(from);
                    if obstacles.is_subset(barrier) {
                        self.moves[from.index()].remove(to);
                        self.dirty = true;
                    }
                }
            }
        }

        // A permanent obstacle on the rook's castling transit refutes that
        // side.
        if self.castling_square != self.initial_square {
            for side in CastlingSide::both() {
                let squares = castling(self.color, side);
                if obstacles.is_subset(tables.capture_constraint(squares.rook, squares.free)) {
                    self.set_castling(side, false);
                }
            }
        }

        // A pinned enemy sniper: our royal may not step onto any square it
        // attacks through its one possible post.
        if self.royal && blocker.color != self.color && obstacles.count() == 1 {
            if let Some(post) = obstacles.first() {
                for check in blocker.checks(post).iter() {
                    if !self.route.contains(check) {
                        continue;
                    }
                    for from in self.stops.iter() {
                        if self.moves[from.index()].contains(check) {
                            self.moves[from.index()].remove(check);
                            self.dirty = true;
                        }
                    }
                }
            }
        }
    }

    /// Forward BFS over the admissible move graph. The castling square is a
    /// zero-cost second source while castling remains open.
    fn compute_distances(&self, source: Square, castling_square: Square) -> [i32; 64] {
        let mut distances = [INFINITY; 64];
        distances[source.index()] = 0;
        distances[castling_square.index()] = 0;

        let mut frontier: Queue<Square, 64> = Queue::new();
        frontier.push(source);
        if castling_square != source {
            frontier.push(castling_square);
        }

        while let Some(from) = frontier.pop() {
            for to in self.moves[from.index()].iter() {
                if distances[to.index()] < INFINITY {
                    continue;
                }
                distances[to.index()] = distances[from.index()] + 1;
                frontier.push(to);
            }
        }

        distances
    }

    /// Reverse BFS: fewest moves from each square to any destination.
    fn compute_distances_to(&self, destinations: Squares) -> [i32; 64] {
        let mut distances = [INFINITY; 64];
        let mut frontier: Queue<Square, 64> = Queue::new();

        for square in destinations.iter() {
            distances[square.index()] = 0;
            frontier.push(square);
        }

        while let Some(to) = frontier.pop() {
            for from in Square::all() {
                if !self.moves[from.index()].contains(to) {
                    continue;
                }
                if distances[from.index()] < INFINITY {
                    continue;
                }
                distances[from.index()] = distances[to.index()] + 1;
                frontier.push(from);
            }
        }

        distances
    }

    /// Fewest captures consumed to reach each square: 0/1-weighted
    /// relaxation over the move graph.
    fn compute_captures(&self, source: Square, castling_square: Square) -> [i32; 64] {
        let tables = &self.tables;
        let mut captures = [INFINITY; 64];
        captures[source.index()] = 0;
        captures[castling_square.index()] = 0;

        let mut frontier: Queue<Square, 64> = Queue::new();
        let mut queued = Squares::empty();
        frontier.push(source);
        queued.insert(source);
        if castling_square != source {
            frontier.push(castling_square);
            queued.insert(castling_square);
        }

        while let Some(from) = frontier.pop() {
            queued.remove(from);
            for to in self.moves[from.index()].iter() {
                let required = captures[from.index()] + tables.capture_cost(from, to);
                if required >= captures[to.index()] {
                    continue;
                }
                captures[to.index()] = required;
                if !queued.contains(to) {
                    frontier.push(to);
                    queued.insert(to);
                }
            }
        }

        captures
    }

    /// Fewest captures from each square to any destination.
    fn compute_captures_to(&self, destinations: Squares) -> [i32; 64] {
        let tables = &self.tables;
        let mut captures = [INFINITY; 64];
        let mut frontier: Queue<Square, 64> = Queue::new();
        let mut queued = Squares::empty();

        for square in destinations.iter() {
            captures[square.index()] = 0;
            frontier.push(square);
            queued.insert(square);
        }

        while let Some(to) = frontier.pop() {
            queued.remove(to);
            for from in Square::all() {
                if !self.moves[from.index()].contains(to) {
                    continue;
                }
                let required = captures[to.index()] + tables.capture_cost(from, to);
                if required >= captures[from.index()] {
                    continue;
                }
                captures[from.index()] = required;
                if !queued.contains(from) {
                    frontier.push(from);
                    queued.insert(from);
                }
            }
        }

        captures
    }

    /// Shortest and second-shortest walk lengths from the piece's sources to
    /// every square, over the current move graph.
    ///
    /// Walks may revisit squares, so the second length exists wherever any
    /// detour or cycle does; it is what bounds the smallest number of spare
    /// moves the piece could absorb.
    pub(crate) fn walk_lengths(&self) -> ([i32; 64], [i32; 64]) {
        let castled = CastlingSide::both().any(|side| self.castling[side.index()].is_true());
        let source = if castled {
            self.castling_square
        } else {
            self.initial_square
        };

        let mut first = [INFINITY; 64];
        first[source.index()] = 0;
        first[self.castling_square.index()] = 0;

        // Unit-weight edges: iterate to a fixed point; 64 sweeps suffice.
        let mut second = [INFINITY; 64];
        let mut changed = true;
        while changed {
            changed = false;
            for from in Square::all() {
                for to in self.moves[from.index()].iter() {
                    let step = first[from.index()] + 1;
                    if step < first[to.index()] {
                        second[to.index()] = second[to.index()].min(first[to.index()]);
                        first[to.index()] = step;
                        changed = true;
                    } else if step > first[to.index()] && step < second[to.index()] {
                        second[to.index()] = step;
                        changed = true;
                    }
                    let detour = second[from.index()] + 1;
                    if detour > first[to.index()] && detour < second[to.index()] {
                        second[to.index()] = detour;
                        changed = true;
                    }
                }
            }
        }

        (first, second)
    }
}

fn maximize_all(current: &mut [i32; 64], computed: &[i32; 64]) {
    for (current, computed) in current.iter_mut().zip(computed) {
        if *computed > *current {
            *current = *computed;
        }
    }
}
