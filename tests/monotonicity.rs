use euclide::chess::board::{castling, CastlingSide, Squares};
use euclide::deduction::Deduction;
use euclide::problem::Problem;
use euclide::problems;

fn solvable_problems() -> Vec<Problem> {
    vec![
        problems::opening_knights().unwrap(),
        problems::frozen_start().unwrap(),
        problems::kingside_castling().unwrap(),
        problems::open_file().unwrap(),
        problems::blocked_file().unwrap(),
    ]
}

#[test]
fn bounds_and_geometry_invariants_hold_at_the_fixed_point() {
    for problem in solvable_problems() {
        let mut deduction = Deduction::new(problem);
        deduction.run().unwrap();

        for piece in deduction.pieces() {
            // Lower bounds never exceed upper bounds.
            assert!(piece.required_moves() <= piece.available_moves());
            assert!(piece.required_captures() <= piece.available_captures());

            // Admissible final squares are reachable within the budget, and
            // the required bound is met by at least one of them.
            assert!(piece.possible_squares().any());
            let mut best = i32::MAX;
            for square in piece.possible_squares().iter() {
                assert!(piece.distance(square) <= piece.available_moves());
                best = best.min(piece.distance(square));
            }
            assert!(piece.required_moves() >= best);

            // Geometry: stops within the route, threats from the stops.
            assert!(piece.stops().is_subset(piece.route()));
            let mut threats = Squares::empty();
            for square in piece.stops().iter() {
                threats |= piece.checks(square);
            }
            assert_eq!(piece.threats(), threats);

            // A proved castling keeps the king's castling edge alive and the
            // partner rook displaced.
            for side in CastlingSide::both() {
                if piece.royal() && piece.castling(side).is_true() {
                    let squares = castling(piece.color(), side);
                    assert!(piece.move_targets(squares.from).contains(squares.to));
                }
            }
        }
    }
}

#[test]
fn a_second_run_is_a_fixed_point() {
    for problem in solvable_problems() {
        let mut deduction = Deduction::new(problem);
        deduction.run().unwrap();

        let snapshot: Vec<_> = deduction
            .pieces()
            .iter()
            .map(|piece| {
                (
                    piece.possible_squares(),
                    piece.possible_captures(),
                    piece.required_moves(),
                    piece.required_captures(),
                    piece.available_moves(),
                    piece.available_captures(),
                    piece.stops(),
                    piece.route(),
                    piece.threats(),
                    piece.final_square(),
                    piece.move_count(),
                )
            })
            .collect();

        deduction.run().unwrap();

        let after: Vec<_> = deduction
            .pieces()
            .iter()
            .map(|piece| {
                (
                    piece.possible_squares(),
                    piece.possible_captures(),
                    piece.required_moves(),
                    piece.required_captures(),
                    piece.available_moves(),
                    piece.available_captures(),
                    piece.stops(),
                    piece.route(),
                    piece.threats(),
                    piece.final_square(),
                    piece.move_count(),
                )
            })
            .collect();

        assert_eq!(snapshot, after);
    }
}
