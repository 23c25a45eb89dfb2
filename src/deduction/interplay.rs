//! Two-piece mutual analysis: co-play every joint journey of a pair of
//! pieces within the residual move budget, and harvest what no realisation
//! can avoid: higher required-move bounds, dead move edges,
//! simultaneous-occupation facts, higher distance bounds.
//!
//! Two modes share the joint-state space `(square_a, moves_a, square_b,
//! moves_b)`:
//!
//! - fast: a bounded-FIFO BFS that only extracts required-move bounds;
//! - full: a memoised DFS that additionally records which edges and which
//!   square pairs appear on realising sequences.

use crate::chess::board::{castling, CastlingSide, Square, SquareMatrix, Squares};
use crate::core::queue::Queue;
use crate::deduction::cache::{JointPosition, TwoPieceCache};
use crate::deduction::piece::{Piece, INFINITY};
use crate::problem::{DeductionError, ResourceLimits};

/// Above this many joint move-pairs, full co-play is too expensive and the
/// call degrades to fast mode.
const FULL_PLAY_THRESHOLD: usize = 5000;

/// Counters the driver aggregates into its report.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterplayStats {
    pub calls: u64,
    pub fast_calls: u64,
    pub full_calls: u64,
    pub fast_queue_overflows: u64,
}

/// Per-piece scratch for one co-play. The pieces themselves are read-only
/// during play; everything learned lands here and is applied afterwards.
struct PlayState {
    available_moves: i32,
    required_moves: i32,
    played_moves: i32,
    square: Square,
    teleportation: bool,
    moves: SquareMatrix,
    squares: [Squares; 64],
    distances: [i32; 64],
}

impl PlayState {
    fn new(piece: &Piece, available_moves: i32) -> PlayState {
        PlayState {
            available_moves,
            required_moves: INFINITY,
            played_moves: 0,
            square: piece.initial_square(),
            teleportation: piece.castling_square() != piece.initial_square(),
            moves: [Squares::empty(); 64],
            squares: [Squares::empty(); 64],
            distances: [INFINITY; 64],
        }
    }
}

/// Analyse the joint play of two pieces. Returns a lower bound on the moves
/// the pair consumes together, never less than the sum of the pieces'
/// individual bounds.
///
/// `free_moves` is the per-colour residual budget (available minus required,
/// summed over the colour). With `fast` the cheap BFS mode is forced; it is
/// also chosen automatically above [`FULL_PLAY_THRESHOLD`].
pub fn mutual_interactions(
    piece_a: &mut Piece,
    piece_b: &mut Piece,
    free_moves: &[i32; 2],
    fast: bool,
    limits: &ResourceLimits,
    stats: &mut InterplayStats,
) -> Result<i32, DeductionError> {
    let required_moves = piece_a.required_moves() + piece_b.required_moves();
    let enemies = piece_a.color() != piece_b.color();

    // No interaction possible: the pieces' routes never meet. Against an
    // enemy royal, attacks extend the route.
    let routes = [
        piece_a.route()
            | if enemies && piece_b.royal() {
                piece_a.threats()
            } else {
                Squares::empty()
            },
        piece_b.route()
            | if enemies && piece_a.royal() {
                piece_b.threats()
            } else {
                Squares::empty()
            },
    ];
    if !routes[0].intersects(routes[1]) {
        return Ok(required_moves);
    }

    stats.calls += 1;
    let fast = fast || piece_a.move_count() * piece_b.move_count() > FULL_PLAY_THRESHOLD;

    let mut states = [
        PlayState::new(
            piece_a,
            piece_a.required_moves() + free_moves[piece_a.color().index()],
        ),
        PlayState::new(
            piece_b,
            piece_b.required_moves() + free_moves[piece_b.color().index()],
        ),
    ];

    let available_moves = required_moves
        + free_moves[piece_a.color().index()]
        + if enemies {
            free_moves[piece_b.color().index()]
        } else {
            0
        };

    let mut cache = TwoPieceCache::new(limits);

    let new_required_moves = {
        let pieces: [&Piece; 2] = [&*piece_a, &*piece_b];
        if fast {
            stats.fast_calls += 1;
            fastplay(pieces, &mut states, available_moves, &mut cache, stats)?
        } else {
            stats.full_calls += 1;
            fullplay(
                pieces,
                &mut states,
                available_moves,
                available_moves,
                &mut cache,
                None,
            )?
        }
    };

    if new_required_moves >= INFINITY {
        return Err(DeductionError::NoSolution);
    }

    // Raise each piece's own bound to what co-play proved.
    piece_a.raise_required_moves(states[0].required_moves);
    piece_b.raise_required_moves(states[1].required_moves);

    // Fast mode extracts nothing further.
    if fast {
        return Ok(new_required_moves);
    }

    // Remove never-played moves, record occupancy facts, raise distances.
    let ids = [piece_a.id(), piece_b.id()];
    for (k, piece) in [&mut *piece_a, &mut *piece_b].into_iter().enumerate() {
        let state = &states[k];
        let other_id = ids[k ^ 1];

        for square in Square::all() {
            let at = square.index();

            if state.moves[at] != piece.moves[at] && state.moves[at].is_subset(piece.moves[at]) {
                piece.moves[at] = state.moves[at];
                piece.dirty = true;
            }

            if state.squares[at].count() == 1 {
                if let Some(occupied) = state.squares[at].first() {
                    if !piece.occupied[at].squares.contains(occupied) {
                        piece.occupied[at].squares.insert(occupied);
                        piece.occupied[at].pieces[occupied.index()] = Some(other_id);
                        piece.dirty = true;
                    }
                }
            }

            if state.distances[at] > piece.distances[at] {
                piece.distances[at] = state.distances[at];
                piece.dirty = true;
            }
        }
    }

    Ok(new_required_moves)
}

fn fastplay(
    pieces: [&Piece; 2],
    states: &mut [PlayState; 2],
    available_moves: i32,
    cache: &mut TwoPieceCache,
    stats: &mut InterplayStats,
) -> Result<i32, DeductionError> {
    const QUEUE_CAPACITY: usize = 8 * 64 * 64;
    let mut queue: Queue<JointPosition, QUEUE_CAPACITY> = Queue::new();

    let mut required_moves = INFINITY;

    let friends = pieces[0].color() == pieces[1].color();
    let partners = friends
        && (pieces[0].royal() || pieces[1].royal())
        && (states[0].teleportation || states[1].teleportation);

    let initial = JointPosition::new(
        pieces[0].initial_square(),
        0,
        pieces[1].initial_square(),
        0,
    );
    queue.push(initial);
    cache.add(initial)?;

    while let Some(position) = queue.pop() {
        // Goal: both pieces stand on admissible final squares.
        if pieces[0].possible_squares().contains(position.squares[0])
            && pieces[1].possible_squares().contains(position.squares[1])
        {
            states[0].required_moves = states[0].required_moves.min(position.moves[0]);
            states[1].required_moves = states[1].required_moves.min(position.moves[1]);
            required_moves = required_moves.min(position.moves[0] + position.moves[1]);
        }

        for s in 0..2 {
            // Advance the piece with fewer played moves first.
            let k = s ^ usize::from(position.moves[0] > position.moves[1]);
            let piece = pieces[k];
            let xpiece = pieces[k ^ 1];
            let from = position.squares[k];
            let other = position.squares[k ^ 1];

            // Zero-cost teleportation for an unmoved castling rook.
            if states[k].teleportation
                && position.moves[k] == 0
                && from == piece.initial_square()
            {
                let to = piece.castling_square();
                if !piece.quiet_constraint(from, to).contains(other) {
                    let mut next = position;
                    next.squares[k] = to;
                    if !cache.hit(next) {
                        if queue.full() {
                            return Ok(overflow(pieces, states, stats));
                        }
                        queue.pass(next);
                        cache.add(next)?;
                    }
                }
            }

            if states[k].available_moves <= position.moves[k] {
                continue;
            }
            if states[k].required_moves <= position.moves[k]
                && states[k ^ 1].required_moves <= position.moves[k ^ 1]
            {
                continue;
            }

            // May not play while giving check.
            if xpiece.royal() && !friends && piece.checks(from).contains(other) {
                continue;
            }

            for to in piece.move_targets(from).iter() {
                let mut next = position;
                next.squares[k] = to;
                next.moves[k] += 1;

                // The partner rook teleports alongside the castling king.
                if piece.royal() && position.moves[k] == 0 && partners {
                    for side in CastlingSide::both() {
                        let squares = castling(piece.color(), side);
                        if to == squares.to
                            && other == squares.rook
                            && position.moves[k ^ 1] == 0
                        {
                            next.squares[k ^ 1] = squares.free;
                        }
                    }
                }

                if cache.hit(next) {
                    continue;
                }

                // Landing on the other piece is a capture: never of a
                // friend, and only with capture budget left.
                if to == other && (friends || piece.available_captures() == 0) {
                    continue;
                }

                // Blocked by the other piece or by what its presence implies.
                let constraint = piece.transit_constraint(from, to);
                if constraint.contains(other)
                    || xpiece.occupied(other).squares.contains(from)
                    || constraint.intersects(xpiece.occupied(other).squares)
                {
                    continue;
                }

                // Too far from every goal.
                if piece.rdistance(to)
                    > available_moves.min(states[k].available_moves - next.moves[k])
                {
                    continue;
                }

                // A royal may not step onto an attacked square.
                if piece.royal() && !friends && xpiece.checks(other).contains(to) {
                    continue;
                }

                if castling_move_rejected(
                    piece,
                    xpiece,
                    friends,
                    from,
                    to,
                    position.moves[k],
                    other,
                ) {
                    continue;
                }

                if queue.full() {
                    return Ok(overflow(pieces, states, stats));
                }
                queue.push(next);
                cache.add(next)?;
            }
        }
    }

    Ok(required_moves)
}

/// Conservative degradation when the BFS frontier outgrows its bound: fall
/// back on the bounds already established, which remain valid.
fn overflow(pieces: [&Piece; 2], states: &mut [PlayState; 2], stats: &mut InterplayStats) -> i32 {
    stats.fast_queue_overflows += 1;
    states[0].required_moves = pieces[0].required_moves();
    states[1].required_moves = pieces[1].required_moves();
    states[0].required_moves + states[1].required_moves
}

fn fullplay(
    pieces: [&Piece; 2],
    states: &mut [PlayState; 2],
    available_moves: i32,
    maximum_moves: i32,
    cache: &mut TwoPieceCache,
    mut invalidate: Option<&mut bool>,
) -> Result<i32, DeductionError> {
    let mut required_moves = INFINITY;

    // Both pieces on goal squares?
    if pieces[0].possible_squares().contains(states[0].square)
        && pieces[1].possible_squares().contains(states[1].square)
    {
        states[0].required_moves = states[0].required_moves.min(states[0].played_moves);
        states[1].required_moves = states[1].required_moves.min(states[1].played_moves);
        required_moves = states[0].played_moves + states[1].played_moves;

        let (here, there) = (states[0].square, states[1].square);
        states[0].squares[here.index()].insert(there);
        states[1].squares[there.index()].insert(here);
    }

    if available_moves < 0 {
        return Ok(required_moves);
    }

    let position = JointPosition::new(
        states[0].square,
        states[0].played_moves,
        states[1].square,
        states[1].played_moves,
    );
    if let Some(cached) = cache.lookup(position) {
        return Ok(cached);
    }

    for s in 0..2 {
        let k = s ^ usize::from(states[0].played_moves > states[1].played_moves);
        let piece = pieces[k];
        let xpiece = pieces[k ^ 1];
        let from = states[k].square;
        let other = states[k ^ 1].square;
        let friends = piece.color() == xpiece.color();

        // Teleportation when castling.
        if states[k].teleportation && states[k].played_moves == 0 {
            let king_square = if xpiece.royal() && friends { Some(other) } else { None };
            let pivot = CastlingSide::both().find_map(|side| {
                let squares = castling(piece.color(), side);
                (squares.rook == from).then_some(squares.to)
            });

            if let Some(pivot) = pivot {
                // With the partner king, the rook teleports exactly when the
                // king has just castled onto the pivot square; alone, only if
                // the other piece does not sit on the transit.
                let allowed = match king_square {
                    Some(king) => king == pivot && states[k ^ 1].played_moves == 1,
                    None => !piece
                        .quiet_constraint(piece.initial_square(), piece.castling_square())
                        .contains(other),
                };

                if allowed && piece.distance(piece.castling_square()) == 0 {
                    let castling_square = piece.castling_square();
                    states[k].square = castling_square;
                    states[k].teleportation = false;

                    let my_required_moves =
                        fullplay(pieces, states, available_moves, maximum_moves, cache, None)?;
                    if my_required_moves <= maximum_moves {
                        states[k].squares[from.index()].insert(other);
                        states[k ^ 1].squares[other.index()].insert(from);
                        states[k].distances[castling_square.index()] = 0;
                    }
                    required_moves = required_moves.min(my_required_moves);

                    states[k].teleportation = true;
                    states[k].square = piece.initial_square();
                }
            }
        }

        if states[k].available_moves <= 0 {
            continue;
        }

        // May not play while giving check.
        if xpiece.royal() && !friends && piece.checks(from).contains(other) {
            continue;
        }

        for to in piece.move_targets(from).iter() {
            // Landing on the other piece is a capture: never of a friend,
            // and only with capture budget left.
            if to == other && (friends || piece.available_captures() == 0) {
                continue;
            }

            // Blocked by the other piece or by what its presence implies.
            let constraint = piece.transit_constraint(from, to);
            if constraint.contains(other)
                || xpiece.occupied(other).squares.contains(from)
                || constraint.intersects(xpiece.occupied(other).squares)
            {
                continue;
            }

            // Too far from every goal.
            if 1 + piece.rdistance(to) > available_moves.min(states[k].available_moves) {
                continue;
            }

            // A path shorter than the known lower bound cannot be real; skip
            // it and flag the caller's cache entry as shortcut-tainted.
            if states[k].played_moves + 1 < piece.distance(to) {
                if let Some(flag) = invalidate.as_deref_mut() {
                    *flag = true;
                }
                continue;
            }

            // A royal may not step onto an attacked square.
            if piece.royal() && !friends && xpiece.checks(other).contains(to) {
                continue;
            }

            if castling_move_rejected(
                piece,
                xpiece,
                friends,
                from,
                to,
                states[k].played_moves,
                other,
            ) {
                continue;
            }

            // Play.
            states[k].available_moves -= 1;
            states[k].played_moves += 1;
            states[k].square = to;

            let mut shortcuts = false;
            let my_required_moves = fullplay(
                pieces,
                states,
                available_moves - 1,
                maximum_moves,
                cache,
                Some(&mut shortcuts),
            )?;

            let reached = JointPosition::new(
                states[0].square,
                states[0].played_moves,
                states[1].square,
                states[1].played_moves,
            );
            cache.record(reached, my_required_moves, shortcuts)?;

            // Label moves, occupancies and distances used by realising
            // sequences.
            if my_required_moves <= maximum_moves {
                states[k].moves[from.index()].insert(to);
                states[k].squares[from.index()].insert(other);
                states[k ^ 1].squares[other.index()].insert(from);

                let played_moves = states[k].played_moves;
                if played_moves < states[k].distances[to.index()] {
                    states[k].distances[to.index()] = played_moves;
                }
            }

            // Undo.
            states[k].available_moves += 1;
            states[k].played_moves -= 1;
            states[k].square = from;

            required_moves = required_moves.min(my_required_moves);
        }
    }

    Ok(required_moves)
}

/// The king's castling edge may fire only on its first move and only with
/// none of the crossed squares attacked by the enemy piece.
fn castling_move_rejected(
    piece: &Piece,
    xpiece: &Piece,
    friends: bool,
    from: Square,
    to: Square,
    played_moves: i32,
    other: Square,
) -> bool {
    if !piece.royal() || friends || from != piece.initial_square() {
        return false;
    }
    for side in CastlingSide::both() {
        let squares = castling(piece.color(), side);
        if squares.from == from && squares.to == to {
            if played_moves > 0
                || xpiece.checks(other).contains(from)
                || xpiece.checks(other).contains(squares.free)
            {
                return true;
            }
        }
    }
    false
}
