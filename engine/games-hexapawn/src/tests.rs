use super::*;
use engine_core::{Color, PieceKind, Rules};

fn rules() -> Hexapawn {
    Hexapawn::standard()
}

fn mv(rules: &Hexapawn, pos: &Board, text: &str) -> PawnMove {
    rules
        .parse_move(pos, text)
        .unwrap_or_else(|| panic!("{text} should be legal"))
}

#[test]
fn startpos_has_one_push_per_pawn() {
    let rules = rules();
    let pos = rules.startpos();
    let moves = rules.legal_moves(&pos);
    assert_eq!(moves.len(), 3);
    let texts: Vec<String> = moves.iter().map(|&m| rules.format_move(m)).collect();
    assert_eq!(texts, vec!["a1a2", "b1b2", "c1c2"]);
}

#[test]
fn move_generation_is_deterministic() {
    let rules = rules();
    let pos = rules.startpos();
    assert_eq!(rules.legal_moves(&pos), rules.legal_moves(&pos));
}

#[test]
fn captures_come_before_pushes() {
    let rules = rules();
    // White b2 can capture a3 and c3; its push is blocked.
    let pos = rules.parse_fen("ppp/1P1/3 w");
    let texts: Vec<String> = rules
        .legal_moves(&pos)
        .iter()
        .map(|&m| rules.format_move(m))
        .collect();
    assert_eq!(texts, vec!["b2a3", "b2c3"]);
}

#[test]
fn play_and_undo_round_trip() {
    let rules = rules();
    let mut pos = rules.startpos();
    let key_before = rules.key(&pos);
    let mv = mv(&rules, &pos, "b1b2");

    rules.play_undoable(&mut pos, mv);
    assert_eq!(rules.side_to_move(&pos), Color::Black);
    assert_eq!(rules.ply(&pos), 1);
    assert_ne!(rules.key(&pos), key_before);

    rules.undo(&mut pos, mv);
    assert_eq!(rules.side_to_move(&pos), Color::White);
    assert_eq!(rules.ply(&pos), 0);
    assert_eq!(rules.key(&pos), key_before);
}

#[test]
fn undo_restores_captured_pawn() {
    let rules = rules();
    let mut pos = rules.parse_fen("p1p/1P1/3 w");
    let key_before = rules.key(&pos);
    let capture = mv(&rules, &pos, "b2a3");

    rules.play_undoable(&mut pos, capture);
    assert_eq!(rules.piece_count(&pos, Color::Black, PieceKind::Pawn), 1);
    rules.undo(&mut pos, capture);
    assert_eq!(rules.piece_count(&pos, Color::Black, PieceKind::Pawn), 2);
    assert_eq!(rules.key(&pos), key_before);
}

#[test]
fn promotion_is_mate_for_the_opponent() {
    let rules = rules();
    // White a2 promotes by pushing to a3 (or capturing b3).
    let pos = rules.parse_fen("1p1/P2/3 w");
    let push = mv(&rules, &pos, "a2a3");
    assert!(rules.gives_check(&pos, push));

    let after = rules.apply(&pos, push);
    assert!(rules.is_mate(&after));
    assert!(rules.legal_moves(&after).is_empty());
}

#[test]
fn blocked_position_is_stalemate_not_mate() {
    let rules = Hexapawn::new(2, 3);
    // White a2 blocks Black a3; Black has no captures.
    let pos = rules.parse_fen("p1/P1/2 b");
    assert!(rules.legal_moves(&pos).is_empty());
    assert!(!rules.is_mate(&pos));
    assert!(!rules.is_draw(&pos));
}

#[test]
fn draw_horizon_marks_long_games() {
    let rules = Hexapawn::standard().with_draw_horizon(4);
    let pos = rules.parse_fen("ppp/3/PPP w 4");
    assert!(rules.is_draw(&pos));
    let earlier = rules.parse_fen("ppp/3/PPP w 3");
    assert!(!rules.is_draw(&earlier));
}

#[test]
fn see_scores_captures_and_defended_squares() {
    let rules = Hexapawn::new(2, 3);
    // White a1 may capture b2; b2 is undefended.
    let pos = rules.parse_fen("2/1p/P1 w");
    let capture = mv(&rules, &pos, "a1b2");
    assert_eq!(rules.see(&pos, capture), 100);
    let push = mv(&rules, &pos, "a1a2");
    assert_eq!(rules.see(&pos, push), 0);

    // Same capture with the target defended by a second pawn nets zero.
    let standard = Hexapawn::standard();
    let defended = standard.parse_fen("1pp/1p1/P2 w");
    let take = mv(&standard, &defended, "a1b2");
    assert_eq!(standard.see(&defended, take), 0);
}

#[test]
fn trap_is_a_short_horizon_forced_loss() {
    let rules = Hexapawn::new(2, 3);
    // White to move: capturing b2 leaves Black without a pawn (trapped, all
    // of nothing), pushing a2 lets Black promote instead.
    let pos = rules.parse_fen("2/1p/P1 w");
    let capture = mv(&rules, &pos, "a1b2");
    let push = mv(&rules, &pos, "a1a2");

    assert!(rules.is_trap(&rules.apply(&pos, capture)));
    assert!(!rules.is_trap(&rules.apply(&pos, push)));

    let traps = rules.trap_moves(&pos);
    assert_eq!(traps, vec![capture]);
}

#[test]
fn keys_are_stable_and_nonzero() {
    let rules = rules();
    let pos = rules.startpos();
    let key = rules.key(&pos);
    assert_ne!(key, 0);
    assert_eq!(key, rules.key(&rules.startpos()));

    // Side to move is part of the key.
    let flipped = rules.parse_fen("ppp/3/PPP b");
    assert_ne!(rules.key(&flipped), key);
}

#[test]
fn invalid_fen_reports_key_zero() {
    let rules = rules();
    for bad in ["", "ppp/3", "ppp/3/PPP x", "pppp/3/PPP w", "ppp/3/PP w"] {
        let pos = rules.parse_fen(bad);
        assert_eq!(rules.key(&pos), 0, "{bad:?} should be invalid");
        assert!(rules.legal_moves(&pos).is_empty());
    }
}

#[test]
fn fen_round_trips() {
    let rules = rules();
    for fen in ["ppp/3/PPP w 0", "1p1/P2/3 w 0", "p1p/1P1/3 b 7"] {
        let pos = rules.parse_fen(fen);
        assert_eq!(rules.to_fen(&pos), fen);
    }
}

#[test]
fn evaluate_is_from_the_side_to_move() {
    let rules = rules();
    // White up a pawn: positive for White to move, negative for Black.
    let white_view = rules.parse_fen("1p1/3/P1P w");
    let black_view = rules.parse_fen("1p1/3/P1P b");
    assert!(rules.evaluate(&white_view).value > 0);
    assert_eq!(
        rules.evaluate(&black_view).value,
        -rules.evaluate(&white_view).value
    );
}

#[test]
fn piece_counts_only_report_pawns() {
    let rules = rules();
    let pos = rules.startpos();
    assert_eq!(rules.piece_count(&pos, Color::White, PieceKind::Pawn), 3);
    assert_eq!(rules.piece_count(&pos, Color::Black, PieceKind::Pawn), 3);
    assert_eq!(rules.piece_count(&pos, Color::White, PieceKind::None), 0);
    assert_eq!(rules.piece_count(&pos, Color::White, PieceKind::King), 0);
}

#[test]
fn parse_move_resolves_legal_text() {
    let rules = rules();
    let pos = rules.startpos();
    assert!(rules.parse_move(&pos, "b1b2").is_some());
    assert!(rules.parse_move(&pos, "b1b3").is_none());
    assert!(rules.parse_move(&pos, "nonsense").is_none());
}
