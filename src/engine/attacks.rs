//! Attack detection for the mailbox board.
//!
//! Direction vectors are `(d_file, d_rank)` pairs. Attack queries work
//! backwards from the target square: instead of asking every enemy piece
//! where it can go, we ask which squares could hold an attacker of each
//! kind and look there. One board scan per query, no precomputed tables.

use crate::engine::board::Board;
use crate::engine::types::{Color, PieceKind, Square};

/// Orthogonal directions (rook rays).
pub const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Diagonal directions (bishop rays).
pub const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// All eight directions (king steps, queen rays).
pub const KING_DIRS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Knight jump offsets.
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// Rank direction a pawn of `color` pushes towards (+1 white, -1 black).
#[inline]
pub fn pawn_push_dir(color: Color) -> i8 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

/// Is `sq` attacked by any piece of color `by`?
pub fn square_attacked_by(board: &Board, sq: Square, by: Color) -> bool {
    // Pawns: an attacking pawn sits one rank towards its own side,
    // diagonally adjacent.
    let pawn_rank_dir = -pawn_push_dir(by);
    for d_file in [-1i8, 1] {
        if let Some(from) = sq.offset(d_file, pawn_rank_dir) {
            if let Some(piece) = board.piece_at(from) {
                if piece.color == by && piece.kind == PieceKind::Pawn {
                    return true;
                }
            }
        }
    }

    // Knights.
    for (df, dr) in KNIGHT_OFFSETS {
        if let Some(from) = sq.offset(df, dr) {
            if let Some(piece) = board.piece_at(from) {
                if piece.color == by && piece.kind == PieceKind::Knight {
                    return true;
                }
            }
        }
    }

    // Adjacent enemy king.
    for (df, dr) in KING_DIRS {
        if let Some(from) = sq.offset(df, dr) {
            if let Some(piece) = board.piece_at(from) {
                if piece.color == by && piece.kind == PieceKind::King {
                    return true;
                }
            }
        }
    }

    // Sliders: walk each ray until the first piece; only the first piece
    // on a ray can attack through it.
    if ray_attacker(board, sq, by, &ROOK_DIRS, PieceKind::Rook) {
        return true;
    }
    if ray_attacker(board, sq, by, &BISHOP_DIRS, PieceKind::Bishop) {
        return true;
    }

    false
}

/// Walk rays in `dirs` outward from `sq`; report whether the first piece
/// found on any ray is a `by`-colored `slider` or queen.
fn ray_attacker(
    board: &Board,
    sq: Square,
    by: Color,
    dirs: &[(i8, i8)],
    slider: PieceKind,
) -> bool {
    for &(df, dr) in dirs {
        let mut current = sq;
        while let Some(next) = current.offset(df, dr) {
            if let Some(piece) = board.piece_at(next) {
                if piece.color == by && (piece.kind == slider || piece.kind == PieceKind::Queen) {
                    return true;
                }
                break; // blocked, friendly or not
            }
            current = next;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
