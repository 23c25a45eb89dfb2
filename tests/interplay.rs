use euclide::chess::Square;
use euclide::deduction::Deduction;
use euclide::problem::Problem;
use euclide::problems;

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

/// Rook on a1 must reach a3 past a knight on a2 that must end where it
/// started. Each piece alone needs 1 and 0 moves; jointly the knight must
/// step aside and come back (or the rook must take the three-move detour).
fn knight_in_the_way() -> Problem {
    Problem::from_forsythe("4k3/8/8/8/8/8/N7/R3K3", "4k3/8/8/8/8/R7/N7/4K3", 6).unwrap()
}

#[test]
fn co_play_proves_a_joint_bound_above_the_naive_sum() {
    let mut deduction = Deduction::new(knight_in_the_way());
    deduction.run().unwrap();

    let rook = deduction.piece_at(sq("a1")).unwrap();
    let knight = deduction.piece_at(sq("a2")).unwrap();
    assert_eq!(rook.required_moves(), 1);
    assert_eq!(knight.required_moves(), 0);

    let (rook_id, knight_id) = (rook.id(), knight.id());
    let joint = deduction.analyse_pair(rook_id, knight_id, false).unwrap();
    assert_eq!(joint, 3, "either the knight detours (2) or the rook does (3-1)");
}

#[test]
fn fast_mode_reaches_the_same_joint_bound_here() {
    let mut deduction = Deduction::new(knight_in_the_way());
    deduction.run().unwrap();

    let rook_id = deduction.piece_at(sq("a1")).unwrap().id();
    let knight_id = deduction.piece_at(sq("a2")).unwrap().id();
    let joint = deduction.analyse_pair(rook_id, knight_id, true).unwrap();
    assert_eq!(joint, 3);
}

#[test]
fn the_joint_bound_never_undercuts_the_individual_bounds() {
    for problem in [
        problems::opening_knights().unwrap(),
        problems::kingside_castling().unwrap(),
        problems::blocked_file().unwrap(),
        knight_in_the_way(),
    ] {
        let mut deduction = Deduction::new(problem);
        deduction.run().unwrap();

        let ids: Vec<_> = deduction.pieces().iter().map(|piece| piece.id()).collect();
        for (index, &a) in ids.iter().enumerate() {
            for &b in &ids[index + 1..] {
                let floor = deduction.piece(a).required_moves()
                    + deduction.piece(b).required_moves();
                let joint = deduction.analyse_pair(a, b, false).unwrap();
                assert!(
                    joint >= floor,
                    "pair ({a}, {b}): joint bound {joint} under the naive sum {floor}"
                );
            }
        }
    }
}

#[test]
fn disjoint_pieces_interact_trivially() {
    let mut deduction = Deduction::new(problems::opening_knights().unwrap());
    deduction.run().unwrap();

    // The two e-pawns never meet: e2-e4 against e7-e5 shares no square.
    let white = deduction.piece_at(sq("e2")).unwrap();
    let black = deduction.piece_at(sq("e7")).unwrap();
    assert!(!white.route().intersects(black.route()));

    let (white_id, black_id) = (white.id(), black.id());
    let joint = deduction.analyse_pair(white_id, black_id, false).unwrap();
    assert_eq!(joint, 2);
}
