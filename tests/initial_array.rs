use euclide::chess::Square;
use euclide::deduction::Deduction;
use euclide::problems;

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

#[test]
fn four_half_moves_pin_everything_but_the_movers() {
    let mut deduction = Deduction::new(problems::opening_knights().unwrap());
    deduction.run().unwrap();

    let movers = [sq("e2"), sq("e7"), sq("g1"), sq("b8")];
    for piece in deduction.pieces() {
        if movers.contains(&piece.initial_square()) {
            assert_eq!(
                piece.required_moves(),
                1,
                "{} must move exactly once",
                piece.initial_square()
            );
        } else {
            assert_eq!(
                piece.required_moves(),
                0,
                "{} should not need to move",
                piece.initial_square()
            );
            assert_eq!(
                piece.possible_squares().iter().collect::<Vec<_>>(),
                vec![piece.initial_square()],
            );
            assert_eq!(piece.final_square(), Some(piece.initial_square()));
        }
    }

    assert_eq!(
        deduction.piece_at(sq("e2")).unwrap().final_square(),
        Some(sq("e4"))
    );
    assert_eq!(
        deduction.piece_at(sq("g1")).unwrap().final_square(),
        Some(sq("f3"))
    );
    assert_eq!(
        deduction.piece_at(sq("e7")).unwrap().final_square(),
        Some(sq("e5"))
    );
    assert_eq!(
        deduction.piece_at(sq("b8")).unwrap().final_square(),
        Some(sq("c6"))
    );
}

#[test]
fn zero_half_moves_freeze_the_whole_array() {
    let mut deduction = Deduction::new(problems::frozen_start().unwrap());
    let report = deduction.run().unwrap();

    for piece in deduction.pieces() {
        assert_eq!(piece.required_moves(), 0);
        assert_eq!(piece.final_square(), Some(piece.initial_square()));
    }

    // Nobody can castle in zero moves; the rooks' castling squares must
    // have collapsed back to their initial squares.
    for corner in ["a1", "h1", "a8", "h8"] {
        let rook = deduction.piece_at(sq(corner)).unwrap();
        assert_eq!(rook.castling_square(), rook.initial_square());
    }

    assert_eq!(report.pieces.len(), 32);
}
