use euclide::deduction::Deduction;
use euclide::problem::{DeductionError, Problem};
use euclide::problems;

#[test]
fn one_move_per_side_cannot_be_taken_back() {
    let mut deduction = Deduction::new(problems::wasted_tempo().unwrap());
    let result = deduction.run();
    assert!(matches!(result, Err(DeductionError::NoSolution)));
}

#[test]
fn a_knight_trip_absorbs_a_pair_of_spare_moves() {
    // Start to start in 4 half-moves: both sides bounce a knight out and
    // back, so the spare moves are absorbable and deduction cannot refute.
    let problem =
        Problem::from_forsythe(problems::ORTHODOX_START, problems::ORTHODOX_START, 4).unwrap();
    let mut deduction = Deduction::new(problem);
    assert!(deduction.run().is_ok());

    for piece in deduction.pieces() {
        assert_eq!(piece.required_moves(), 0);
        // Reachability alone leaves each rook a second candidate corner;
        // co-play against the neighbouring knight removes it.
        assert_eq!(piece.final_square(), Some(piece.initial_square()));
    }
}

#[test]
fn a_lone_bishop_cannot_waste_a_single_move() {
    // The bishop can only absorb spare moves in pairs; one spare half-move
    // for White is unabsorbable.
    let problem =
        Problem::from_forsythe("4k3/8/8/8/8/8/8/2B1K3", "4k3/8/8/8/8/8/8/2B1K3", 1).unwrap();
    let result = Deduction::new(problem).run();
    assert!(matches!(result, Err(DeductionError::NoSolution)));
}

#[test]
fn a_king_triangle_absorbs_three_spare_moves() {
    let problem =
        Problem::from_forsythe("4k3/8/8/8/8/8/8/4K3", "4k3/8/8/8/8/8/8/4K3", 6).unwrap();
    // White king: e1-d2-d1-e1 (or any triangle) consumes exactly three.
    assert!(Deduction::new(problem).run().is_ok());
}
