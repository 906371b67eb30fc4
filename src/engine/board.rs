//! Mailbox chess board representation.
//!
//! `Board` stores the position as a flat array of 64 `Option<Piece>` slots
//! (a1 = 0, h8 = 63), plus side to move, castling rights, the en-passant
//! target, the last move made, and the move counters. Pieces are values
//! owned by their square: relocation moves the value, capture drops it.

use crate::engine::attacks;
use crate::engine::types::{
    CastlingRights, ChessError, Color, Move, Piece, PieceKind, Square,
};

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A complete chess position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    /// One slot per square, LERF order (a1 = 0 … h8 = 63).
    squares: [Option<Piece>; Square::NUM],

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// The immediately preceding move, if any.
    pub last_move: Option<Move>,

    /// Half-move clock for the 50-move rule (reset on pawn move or capture).
    pub halfmove_clock: u16,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u16,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Board {
    /// Create an empty board with no pieces.
    pub fn empty() -> Self {
        Board {
            squares: [None; Square::NUM],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            last_move: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Piece access (low-level, no legality checks)
    // -----------------------------------------------------------------------

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.0 as usize]
    }

    /// Place a piece on a square, replacing whatever was there.
    #[inline]
    pub fn set_piece(&mut self, sq: Square, piece: Piece) {
        self.squares[sq.0 as usize] = Some(piece);
    }

    /// Remove and return the piece on a square.
    #[inline]
    pub fn take_piece(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.0 as usize].take()
    }

    /// Raw relocation: move the piece on `from` to `to`, marking it moved.
    /// Returns the captured occupant of `to`, if any. No legality checks —
    /// legality lives in `movegen`.
    pub fn relocate(&mut self, from: Square, to: Square) -> Option<Piece> {
        debug_assert!(
            self.squares[from.0 as usize].is_some(),
            "relocate from empty square {from}"
        );
        let piece = self.squares[from.0 as usize].take().map(|mut p| {
            p.has_moved = true;
            p
        });
        std::mem::replace(&mut self.squares[to.0 as usize], piece)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Is the square unoccupied?
    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.squares[sq.0 as usize].is_none()
    }

    /// Does the square hold a piece of the given color?
    #[inline]
    pub fn is_color(&self, sq: Square, color: Color) -> bool {
        matches!(self.squares[sq.0 as usize], Some(p) if p.color == color)
    }

    /// All squares holding pieces of a color, with their pieces.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| match self.squares[sq.0 as usize] {
            Some(p) if p.color == color => Some((sq, p)),
            _ => None,
        })
    }

    /// Find the king square for the given color.
    ///
    /// Exactly one king per color is a construction invariant (enforced by
    /// FEN loading), so this cannot fail on a well-formed board.
    #[inline]
    pub fn king_sq(&self, color: Color) -> Square {
        Square::all()
            .find(|&sq| {
                matches!(
                    self.squares[sq.0 as usize],
                    Some(p) if p.color == color && p.kind == PieceKind::King
                )
            })
            .expect("king must exist")
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of color `by`?
    #[inline]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        attacks::square_attacked_by(self, sq, by)
    }

    /// Is the given color's king currently attacked?
    #[inline]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_sq(color), !color)
    }

    // -----------------------------------------------------------------------
    // Make move
    // -----------------------------------------------------------------------

    /// Apply a move for the side to move, updating all bookkeeping: capture
    /// (including en passant), the castling rook, promotion substitution,
    /// castling rights, en-passant target, clocks, last-move record, and
    /// side to move. Returns the captured piece, if any.
    ///
    /// The caller is responsible for ensuring the move is legal; `Game`
    /// and the legality filter in `movegen` only pass generated moves here.
    pub fn make_move(&mut self, mv: Move) -> Option<Piece> {
        let us = self.side_to_move;
        let moving_kind = self
            .piece_at(mv.from)
            .map(|p| p.kind)
            .expect("make_move: no piece on source square");

        // En passant removes a pawn from a square the move doesn't touch.
        let mut captured = None;
        if mv.flags.is_en_passant() {
            let victim_sq = mv
                .to
                .offset(0, -attacks::pawn_push_dir(us))
                .expect("en-passant victim square is on the board");
            captured = self.take_piece(victim_sq);
        }

        let direct = self.relocate(mv.from, mv.to);
        let captured = captured.or(direct);

        // Promotion: the pawn value is replaced in place by the chosen kind.
        if let Some(kind) = mv.promotion {
            if let Some(piece) = self.squares[mv.to.0 as usize].as_mut() {
                piece.kind = kind;
            }
        }

        // Castling also moves the rook.
        if mv.flags.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(mv.to);
            self.relocate(rook_from, rook_to);
        }

        // Castling rights: any move touching a king or rook home square
        // clears the matching right (covers rook captures on home squares).
        self.castling_rights.0 &= CASTLING_MASK[mv.from.0 as usize];
        self.castling_rights.0 &= CASTLING_MASK[mv.to.0 as usize];

        // Double pawn push opens an en-passant window for one move.
        self.en_passant = if mv.flags.is_double_push() {
            mv.from.offset(0, attacks::pawn_push_dir(us))
        } else {
            None
        };

        if moving_kind == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            // Saturating: a hand-loaded FEN can start the clock near the
            // u16 ceiling, and the raw board API has no fifty-move cutoff.
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.last_move = Some(mv);
        self.side_to_move = !us;

        captured
    }

    // -----------------------------------------------------------------------
    // Repetition key
    // -----------------------------------------------------------------------

    /// Position identity for threefold repetition: piece placement, side to
    /// move, castling rights, and en-passant target. Clocks are excluded.
    pub fn repetition_key(&self) -> String {
        let ep = match self.en_passant {
            Some(sq) => sq.to_algebraic(),
            None => "-".to_string(),
        };
        format!(
            "{} {} {} {}",
            self.placement_fen(),
            match self.side_to_move {
                Color::White => 'w',
                Color::Black => 'b',
            },
            self.castling_rights.to_fen(),
            ep
        )
    }

    // -----------------------------------------------------------------------
    // Invariant check
    // -----------------------------------------------------------------------

    /// Verify the one-king-per-color invariant. Panics on violation;
    /// intended for tests and debugging aids.
    pub fn assert_consistent(&self) {
        for color in [Color::White, Color::Black] {
            let kings = self
                .pieces_of(color)
                .filter(|(_, p)| p.kind == PieceKind::King)
                .count();
            assert_eq!(kings, 1, "{color} must have exactly one king");
        }
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                let ch = match self.piece_at(sq) {
                    Some(p) => p.to_char(),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

// ---------------------------------------------------------------------------
// Castling helpers (free functions)
// ---------------------------------------------------------------------------

/// For a king-destination square (after castling), return (rook_from, rook_to).
pub(crate) fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to.0 {
        // White kingside: king e1→g1, rook h1→f1.
        6 => (Square(7), Square(5)),
        // White queenside: king e1→c1, rook a1→d1.
        2 => (Square(0), Square(3)),
        // Black kingside: king e8→g8, rook h8→f8.
        62 => (Square(63), Square(61)),
        // Black queenside: king e8→c8, rook a8→d8.
        58 => (Square(56), Square(59)),
        _ => panic!("invalid castling king destination: {king_to}"),
    }
}

/// Mask table indexed by square index. When a move touches a square, AND the
/// castling rights with this mask. E.g. if a rook on a1 moves (or is captured),
/// remove White-queenside. The king's home square removes both that side's rights.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    mask[0]  = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
    mask[4]  = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    mask[7]  = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
    mask[56] = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
    mask[60] = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    mask[63] = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
    mask
};

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

impl Board {
    /// Parse a FEN string into a `Board`.
    ///
    /// Validates all 6 fields (piece placement, side to move, castling,
    /// en passant, halfmove clock, fullmove number) and ensures exactly one
    /// king per side.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut board = Board::empty();

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty count '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += digit as u8;
                } else if let Some((color, kind)) = PieceKind::from_char(ch) {
                    let sq = Square::from_file_rank(file, rank);
                    let mut piece = Piece::new(color, kind);
                    piece.has_moved = !on_home_square(color, kind, sq);
                    board.set_piece(sq, piece);
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        // Validate exactly one king per side.
        for color in [Color::White, Color::Black] {
            let king_count = board
                .pieces_of(color)
                .filter(|(_, p)| p.kind == PieceKind::King)
                .count();
            if king_count != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {king_count} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: Side to move -----
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        board.castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::InvalidFen(format!("invalid castling string: '{}'", fields[2]))
        })?;

        // ----- Field 4: En passant target square -----
        if fields[3] != "-" {
            let ep_sq = Square::from_algebraic(fields[3]).ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            // En passant target must be on rank 3 (after a White push) or
            // rank 6 (after a Black push).
            let rank = ep_sq.rank();
            if rank != 2 && rank != 5 {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} is not on rank 3 or 6",
                    fields[3]
                )));
            }
            board.en_passant = Some(ep_sq);
        }

        // ----- Field 5: Halfmove clock -----
        board.halfmove_clock = fields[4].parse::<u16>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid halfmove clock: '{}'", fields[4]))
        })?;

        // ----- Field 6: Fullmove number -----
        board.fullmove_number = fields[5].parse::<u16>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid fullmove number: '{}'", fields[5]))
        })?;
        if board.fullmove_number == 0 {
            return Err(ChessError::InvalidFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        Ok(board)
    }

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = self.placement_fen();

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());

        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }

    /// Piece-placement field of the FEN (field 1 only).
    fn placement_fen(&self) -> String {
        let mut fen = String::with_capacity(72);
        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => {
                        empty_count += 1;
                    }
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        fen
    }
}

/// Conventional home square test, used to reconstruct `has_moved` when
/// loading a FEN (the format does not carry per-piece history). Only the
/// pawn case affects legality — double steps — since castling consults the
/// rights flags; the rest is best-effort.
fn on_home_square(color: Color, kind: PieceKind, sq: Square) -> bool {
    let back_rank = match color {
        Color::White => 0,
        Color::Black => 7,
    };
    match kind {
        PieceKind::Pawn => {
            sq.rank()
                == match color {
                    Color::White => 1,
                    Color::Black => 6,
                }
        }
        PieceKind::King => sq == Square::from_file_rank(4, back_rank),
        PieceKind::Rook => sq.rank() == back_rank && (sq.file() == 0 || sq.file() == 7),
        PieceKind::Knight => sq.rank() == back_rank && (sq.file() == 1 || sq.file() == 6),
        PieceKind::Bishop => sq.rank() == back_rank && (sq.file() == 2 || sq.file() == 5),
        PieceKind::Queen => sq == Square::from_file_rank(3, back_rank),
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::MoveFlags;

    // -- helpers --

    fn starting() -> Board {
        Board::starting()
    }

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    // ===================================================================
    // Starting position
    // ===================================================================

    #[test]
    fn starting_position_fen() {
        let b = starting();
        assert_eq!(
            b.to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn starting_position_side_to_move() {
        assert_eq!(starting().side_to_move, Color::White);
    }

    #[test]
    fn starting_position_castling() {
        assert_eq!(starting().castling_rights, CastlingRights::ALL);
    }

    #[test]
    fn starting_position_en_passant_and_last_move() {
        let b = starting();
        assert_eq!(b.en_passant, None);
        assert_eq!(b.last_move, None);
    }

    #[test]
    fn starting_position_clocks() {
        let b = starting();
        assert_eq!(b.halfmove_clock, 0);
        assert_eq!(b.fullmove_number, 1);
    }

    #[test]
    fn starting_position_piece_counts() {
        let b = starting();
        assert_eq!(b.pieces_of(Color::White).count(), 16);
        assert_eq!(b.pieces_of(Color::Black).count(), 16);
    }

    #[test]
    fn starting_pieces_unmoved() {
        let b = starting();
        for color in [Color::White, Color::Black] {
            assert!(b.pieces_of(color).all(|(_, p)| !p.has_moved));
        }
    }

    // ===================================================================
    // piece_at queries
    // ===================================================================

    #[test]
    fn piece_at_back_ranks() {
        let b = starting();
        let white_king = b.piece_at(sq("e1")).unwrap();
        assert_eq!(white_king.color, Color::White);
        assert_eq!(white_king.kind, PieceKind::King);

        let black_queen = b.piece_at(sq("d8")).unwrap();
        assert_eq!(black_queen.color, Color::Black);
        assert_eq!(black_queen.kind, PieceKind::Queen);
    }

    #[test]
    fn piece_at_pawn_ranks() {
        let b = starting();
        for file in b'a'..=b'h' {
            let white = b.piece_at(sq(&format!("{}2", file as char))).unwrap();
            assert_eq!((white.color, white.kind), (Color::White, PieceKind::Pawn));
            let black = b.piece_at(sq(&format!("{}7", file as char))).unwrap();
            assert_eq!((black.color, black.kind), (Color::Black, PieceKind::Pawn));
        }
    }

    #[test]
    fn piece_at_empty_squares() {
        let b = starting();
        for rank in 3..=6 {
            for file in b'a'..=b'h' {
                let name = format!("{}{}", file as char, rank);
                assert_eq!(b.piece_at(sq(&name)), None, "expected empty on {name}");
            }
        }
    }

    // ===================================================================
    // king_sq / pieces_of / is_color
    // ===================================================================

    #[test]
    fn king_sq_starting() {
        let b = starting();
        assert_eq!(b.king_sq(Color::White), sq("e1"));
        assert_eq!(b.king_sq(Color::Black), sq("e8"));
    }

    #[test]
    fn is_color_and_is_empty() {
        let b = starting();
        assert!(b.is_color(sq("e1"), Color::White));
        assert!(!b.is_color(sq("e1"), Color::Black));
        assert!(b.is_empty(sq("e4")));
        assert!(!b.is_empty(sq("e2")));
    }

    // ===================================================================
    // set / take / relocate
    // ===================================================================

    #[test]
    fn set_and_take_piece() {
        let mut b = Board::empty();
        let e4 = sq("e4");
        b.set_piece(e4, Piece::new(Color::White, PieceKind::Knight));
        assert_eq!(b.piece_at(e4).unwrap().kind, PieceKind::Knight);

        let taken = b.take_piece(e4).unwrap();
        assert_eq!(taken.kind, PieceKind::Knight);
        assert!(b.is_empty(e4));
    }

    #[test]
    fn relocate_moves_value_and_marks_moved() {
        let mut b = Board::empty();
        b.set_piece(sq("b1"), Piece::new(Color::White, PieceKind::Knight));
        let captured = b.relocate(sq("b1"), sq("c3"));
        assert_eq!(captured, None);
        assert!(b.is_empty(sq("b1")));
        let knight = b.piece_at(sq("c3")).unwrap();
        assert!(knight.has_moved);
    }

    #[test]
    fn relocate_returns_captured_piece() {
        let mut b = Board::empty();
        b.set_piece(sq("d4"), Piece::new(Color::White, PieceKind::Queen));
        b.set_piece(sq("d8"), Piece::new(Color::Black, PieceKind::Rook));
        let captured = b.relocate(sq("d4"), sq("d8")).unwrap();
        assert_eq!(captured.kind, PieceKind::Rook);
        assert_eq!(captured.color, Color::Black);
        assert_eq!(b.piece_at(sq("d8")).unwrap().kind, PieceKind::Queen);
    }

    // ===================================================================
    // make_move bookkeeping
    // ===================================================================

    #[test]
    fn make_move_simple_push() {
        let mut b = starting();
        let mv = Move::with_flags(sq("e2"), sq("e4"), MoveFlags::DOUBLE_PUSH);
        let captured = b.make_move(mv);
        assert_eq!(captured, None);
        assert!(b.is_empty(sq("e2")));
        assert_eq!(b.piece_at(sq("e4")).unwrap().kind, PieceKind::Pawn);
        assert_eq!(b.side_to_move, Color::Black);
        assert_eq!(b.en_passant, Some(sq("e3")));
        assert_eq!(b.last_move, Some(mv));
        assert_eq!(b.halfmove_clock, 0);
        assert_eq!(b.fullmove_number, 1);
    }

    #[test]
    fn make_move_capture_resets_clock() {
        let mut b =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 3 2")
                .unwrap();
        let captured = b.make_move(Move::with_flags(sq("e4"), sq("d5"), MoveFlags::CAPTURE));
        assert_eq!(captured.unwrap().kind, PieceKind::Pawn);
        assert_eq!(b.halfmove_clock, 0);
    }

    #[test]
    fn make_move_quiet_increments_clock() {
        let mut b = starting();
        b.make_move(Move::new(sq("g1"), sq("f3")));
        assert_eq!(b.halfmove_clock, 1);
    }

    #[test]
    fn halfmove_clock_saturates_at_max() {
        let mut b = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 65535 1").unwrap();
        b.make_move(Move::new(sq("a1"), sq("a2")));
        assert_eq!(b.halfmove_clock, u16::MAX);
    }

    #[test]
    fn fullmove_increments_after_black() {
        let mut b = starting();
        b.make_move(Move::new(sq("g1"), sq("f3")));
        assert_eq!(b.fullmove_number, 1);
        b.make_move(Move::new(sq("g8"), sq("f6")));
        assert_eq!(b.fullmove_number, 2);
    }

    #[test]
    fn en_passant_window_closes_after_one_move() {
        let mut b = starting();
        b.make_move(Move::with_flags(sq("e2"), sq("e4"), MoveFlags::DOUBLE_PUSH));
        assert_eq!(b.en_passant, Some(sq("e3")));
        b.make_move(Move::new(sq("g8"), sq("f6")));
        assert_eq!(b.en_passant, None);
    }

    #[test]
    fn en_passant_capture_removes_bypassed_pawn() {
        // White pawn e5, black plays d7-d5, white captures exd6 e.p.
        let mut b =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
                .unwrap();
        let mv = Move::with_flags(
            sq("e5"),
            sq("d6"),
            MoveFlags::CAPTURE | MoveFlags::EN_PASSANT,
        );
        let captured = b.make_move(mv).unwrap();
        assert_eq!(captured.kind, PieceKind::Pawn);
        assert_eq!(captured.color, Color::Black);
        assert!(b.is_empty(sq("d5")), "bypassed pawn must be gone");
        assert_eq!(b.piece_at(sq("d6")).unwrap().kind, PieceKind::Pawn);
    }

    #[test]
    fn castling_moves_the_rook_too() {
        let mut b = Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        b.make_move(Move::with_flags(sq("e1"), sq("g1"), MoveFlags::CASTLING));
        assert_eq!(b.piece_at(sq("g1")).unwrap().kind, PieceKind::King);
        assert_eq!(b.piece_at(sq("f1")).unwrap().kind, PieceKind::Rook);
        assert!(b.is_empty(sq("e1")));
        assert!(b.is_empty(sq("h1")));
        // Both white rights are gone; black's remain.
        assert!(!b.castling_rights.can_castle_kingside(Color::White));
        assert!(!b.castling_rights.can_castle_queenside(Color::White));
        assert!(b.castling_rights.can_castle_kingside(Color::Black));
    }

    #[test]
    fn queenside_castling_rook_squares() {
        let mut b = Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1").unwrap();
        b.make_move(Move::with_flags(sq("e8"), sq("c8"), MoveFlags::CASTLING));
        assert_eq!(b.piece_at(sq("c8")).unwrap().kind, PieceKind::King);
        assert_eq!(b.piece_at(sq("d8")).unwrap().kind, PieceKind::Rook);
        assert!(b.is_empty(sq("a8")));
    }

    #[test]
    fn rook_move_clears_one_right() {
        let mut b = Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        b.make_move(Move::new(sq("h1"), sq("g1")));
        assert!(!b.castling_rights.can_castle_kingside(Color::White));
        assert!(b.castling_rights.can_castle_queenside(Color::White));
    }

    #[test]
    fn rook_captured_on_home_square_clears_right() {
        // White bishop takes the h8 rook.
        let mut b = Board::from_fen("r3k2r/pppppp1p/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .unwrap();
        // Put a white queen where it can capture h8 (artificial but legal board).
        b.set_piece(sq("h5"), Piece::new(Color::White, PieceKind::Queen));
        b.make_move(Move::with_flags(sq("h5"), sq("h8"), MoveFlags::CAPTURE));
        assert!(!b.castling_rights.can_castle_kingside(Color::Black));
        assert!(b.castling_rights.can_castle_queenside(Color::Black));
    }

    #[test]
    fn promotion_substitutes_piece() {
        let mut b = Board::from_fen("7k/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        b.make_move(Move::with_promotion(sq("e7"), sq("e8"), PieceKind::Queen));
        let promoted = b.piece_at(sq("e8")).unwrap();
        assert_eq!(promoted.kind, PieceKind::Queen);
        assert_eq!(promoted.color, Color::White);
        assert_eq!(
            b.pieces_of(Color::White)
                .filter(|(_, p)| p.kind == PieceKind::Pawn)
                .count(),
            0
        );
    }

    // ===================================================================
    // Repetition key
    // ===================================================================

    #[test]
    fn repetition_key_ignores_clocks() {
        let a = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let b = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 42 30").unwrap();
        assert_eq!(a.repetition_key(), b.repetition_key());
    }

    #[test]
    fn repetition_key_includes_side_castling_and_ep() {
        let base = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let black = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_ne!(base.repetition_key(), black.repetition_key());

        let rights_a =
            Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let rights_b =
            Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w Kq - 0 1").unwrap();
        assert_ne!(rights_a.repetition_key(), rights_b.repetition_key());

        let ep_a =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        let ep_b =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
                .unwrap();
        assert_ne!(ep_a.repetition_key(), ep_b.repetition_key());
    }

    // ===================================================================
    // FEN parsing
    // ===================================================================

    #[test]
    fn fen_round_trip_starting() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_round_trip_after_e4() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_round_trip_kiwipete() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_round_trip_endgame() {
        let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_round_trip_castling_partial() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w Kq - 5 20";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_pawn_off_home_rank_counts_as_moved() {
        let b = Board::from_fen("4k3/8/8/8/4P3/8/3P4/4K3 w - - 0 1").unwrap();
        assert!(b.piece_at(sq("e4")).unwrap().has_moved);
        assert!(!b.piece_at(sq("d2")).unwrap().has_moved);
    }

    // ===================================================================
    // FEN validation errors
    // ===================================================================

    #[test]
    fn fen_error_wrong_field_count() {
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").is_err());
    }

    #[test]
    fn fen_error_wrong_rank_count() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err()
        );
    }

    #[test]
    fn fen_error_invalid_piece_char() {
        assert!(
            Board::from_fen("xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err()
        );
    }

    #[test]
    fn fen_error_invalid_side_to_move() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err()
        );
    }

    #[test]
    fn fen_error_invalid_castling() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w XYZ - 0 1").is_err()
        );
    }

    #[test]
    fn fen_error_invalid_ep_square() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9 0 1").is_err()
        );
    }

    #[test]
    fn fen_error_ep_wrong_rank() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e4 0 1")
                .is_err()
        );
    }

    #[test]
    fn fen_error_invalid_halfmove() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - abc 1").is_err()
        );
    }

    #[test]
    fn fen_error_fullmove_zero() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0").is_err()
        );
    }

    #[test]
    fn fen_error_no_white_king() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w KQkq - 0 1").is_err()
        );
    }

    #[test]
    fn fen_error_two_white_kings() {
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBKKBNR w KQkq - 0 1").is_err()
        );
    }

    #[test]
    fn fen_error_rank_too_long() {
        assert!(
            Board::from_fen("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err()
        );
    }

    // ===================================================================
    // Check detection
    // ===================================================================

    #[test]
    fn check_detection() {
        let b = Board::from_fen("4k3/8/8/8/8/8/8/R3K2q w Q - 0 1").unwrap();
        assert!(b.is_in_check(Color::White));
        assert!(!b.is_in_check(Color::Black));
    }

    // ===================================================================
    // Consistency & display
    // ===================================================================

    #[test]
    fn starting_position_is_consistent() {
        starting().assert_consistent();
    }

    #[test]
    fn board_string_starting() {
        let s = starting().board_string();
        assert!(s.starts_with("8 r n b q k b n r"));
        assert!(s.ends_with("a b c d e f g h"));
    }

    #[test]
    fn empty_board_defaults() {
        let b = Board::empty();
        assert_eq!(b.pieces_of(Color::White).count(), 0);
        assert_eq!(b.castling_rights, CastlingRights::NONE);
        assert_eq!(b.en_passant, None);
        assert_eq!(b.side_to_move, Color::White);
        assert_eq!(b.fullmove_number, 1);
    }
}
