use euclide::chess::Square;
use euclide::deduction::Deduction;
use euclide::problem::DeductionError;
use euclide::problems;

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

#[test]
fn an_uncapturable_pawn_closes_the_long_diagonal() {
    // The queen's only admissible target sits behind a pawn that never
    // moves and cannot be captured; deduction proves infeasibility.
    let mut deduction = Deduction::new(problems::blocked_diagonal().unwrap());
    let result = deduction.run();
    assert!(matches!(result, Err(DeductionError::NoSolution)));
}

#[test]
fn the_open_file_stays_reachable() {
    let mut deduction = Deduction::new(problems::open_file().unwrap());
    deduction.run().unwrap();

    let queen = deduction.piece_at(sq("a1")).unwrap();
    assert_eq!(queen.final_square(), Some(sq("a8")));
    assert_eq!(queen.required_moves(), 1);
    assert!(!queen.possible_squares().contains(sq("h8")));
}

#[test]
fn a_permanent_blocker_forces_the_long_way_around() {
    // The rook cannot use the a-file past its own pawn; obstacle analysis
    // removes the one-move path and the detour costs three.
    let mut deduction = Deduction::new(problems::blocked_file().unwrap());
    deduction.run().unwrap();

    let rook = deduction.piece_at(sq("a1")).unwrap();
    assert_eq!(rook.final_square(), Some(sq("a3")));
    assert_eq!(rook.required_moves(), 3);
    assert!(!rook.move_targets(sq("a1")).contains(sq("a3")));

    let pawn = deduction.piece_at(sq("a2")).unwrap();
    assert_eq!(pawn.final_square(), Some(sq("a2")));
    assert_eq!(pawn.required_moves(), 0);
}
