use euclide::chess::Square;
use euclide::core::Tristate;
use euclide::deduction::Deduction;
use euclide::problem::{DeductionError, Problem};

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

#[test]
fn a_pawn_changes_file_only_by_capturing() {
    // b2xc3 in one half-move; the black pawn disappears on c3.
    let problem =
        Problem::from_forsythe("4k3/8/8/8/8/2p5/1P6/4K3", "4k3/8/8/8/8/2P5/8/4K3", 1).unwrap();
    let mut deduction = Deduction::new(problem);
    deduction.run().unwrap();

    let pawn = deduction.piece_at(sq("b2")).unwrap();
    assert_eq!(pawn.final_square(), Some(sq("c3")));
    assert_eq!(pawn.required_moves(), 1);
    assert_eq!(pawn.required_captures(), 1);

    // The victim ends (and ends its game) on c3.
    let victim = deduction.piece_at(sq("c3")).unwrap();
    assert_eq!(victim.final_square(), Some(sq("c3")));
    assert_eq!(victim.required_moves(), 0);
    assert_eq!(victim.captured(), Tristate::Unknown);
}

#[test]
fn without_a_victim_the_pawn_cannot_leave_its_file() {
    // Same journey, but no black piece disappears: the diagonal move has
    // no capture budget and the problem is infeasible.
    let problem =
        Problem::from_forsythe("4k3/8/8/8/8/8/1P6/4K3", "4k3/8/8/8/8/2P5/8/4K3", 1).unwrap();
    let result = Deduction::new(problem).run();
    assert!(matches!(result, Err(DeductionError::NoSolution)));
}

#[test]
fn two_captures_carry_the_pawn_two_files() {
    // 1.bxc3 d4 2.cxd4: both black pawns die on the white pawn's path.
    let problem = Problem::from_forsythe(
        "4k3/8/8/3p4/8/2p5/1P6/4K3",
        "4k3/8/8/8/3P4/8/8/4K3",
        3,
    )
    .unwrap();
    let mut deduction = Deduction::new(problem);
    deduction.run().unwrap();

    let pawn = deduction.piece_at(sq("b2")).unwrap();
    assert_eq!(pawn.final_square(), Some(sq("d4")));
    assert_eq!(pawn.required_moves(), 2);
    assert_eq!(pawn.required_captures(), 2);
}

#[test]
fn three_file_shifts_exceed_two_captures() {
    // e4 is three files away from b2; with only two enemy pieces
    // disappearing the capture-weighted distance rules it out.
    let problem = Problem::from_forsythe(
        "4k3/8/8/3p4/8/2p5/1P6/4K3",
        "4k3/8/8/8/4P3/8/8/4K3",
        3,
    )
    .unwrap();
    let result = Deduction::new(problem).run();
    assert!(matches!(result, Err(DeductionError::NoSolution)));
}
