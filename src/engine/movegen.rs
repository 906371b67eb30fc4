//! Legal move generation.
//!
//! Two stages: pseudo-legal generation per piece kind, then a king-safety
//! filter that plays each candidate on a scratch copy of the board and
//! rejects it if the mover's king ends up attacked. Castling additionally
//! checks the transit squares during generation.

use crate::engine::attacks::{pawn_push_dir, BISHOP_DIRS, KING_DIRS, KNIGHT_OFFSETS, ROOK_DIRS};
use crate::engine::board::Board;
use crate::engine::types::{Color, Move, MoveFlags, Piece, PieceKind, Square};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// All legal moves for the side to move.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    legal_moves_for(board, board.side_to_move)
}

/// All legal moves for the given color, regardless of whose turn it is.
pub fn legal_moves_for(board: &Board, color: Color) -> Vec<Move> {
    let mut moves = pseudo_legal_moves(board, color);
    moves.retain(|&mv| is_king_safe(board, mv, color));
    moves
}

/// All legal moves available to the piece on `sq` (empty if none).
pub fn legal_moves_from(board: &Board, sq: Square) -> Vec<Move> {
    match board.piece_at(sq) {
        Some(piece) => {
            let mut moves = legal_moves_for(board, piece.color);
            moves.retain(|mv| mv.from == sq);
            moves
        }
        None => Vec::new(),
    }
}

/// Does the given color have at least one legal move?
pub fn has_legal_moves(board: &Board, color: Color) -> bool {
    // Short-circuits on the first safe move instead of collecting them all.
    pseudo_legal_moves(board, color)
        .into_iter()
        .any(|mv| is_king_safe(board, mv, color))
}

// ---------------------------------------------------------------------------
// King-safety filter
// ---------------------------------------------------------------------------

/// Play `mv` on a scratch copy and check the mover's king survives.
fn is_king_safe(board: &Board, mv: Move, color: Color) -> bool {
    let mut scratch = board.clone();
    scratch.side_to_move = color;
    scratch.make_move(mv);
    !scratch.is_in_check(color)
}

// ---------------------------------------------------------------------------
// Pseudo-legal generation
// ---------------------------------------------------------------------------

/// Moves that follow piece movement rules but may leave the king in check.
fn pseudo_legal_moves(board: &Board, color: Color) -> Vec<Move> {
    let mut moves = Vec::with_capacity(48);
    for (from, piece) in board.pieces_of(color) {
        match piece.kind {
            PieceKind::Pawn => generate_pawn_moves(board, from, piece, &mut moves),
            PieceKind::Knight => {
                generate_step_moves(board, from, color, &KNIGHT_OFFSETS, &mut moves)
            }
            PieceKind::Bishop => generate_slider_moves(board, from, color, &BISHOP_DIRS, &mut moves),
            PieceKind::Rook => generate_slider_moves(board, from, color, &ROOK_DIRS, &mut moves),
            PieceKind::Queen => generate_slider_moves(board, from, color, &KING_DIRS, &mut moves),
            PieceKind::King => {
                generate_step_moves(board, from, color, &KING_DIRS, &mut moves);
                generate_castling_moves(board, from, color, &mut moves);
            }
        }
    }
    moves
}

fn generate_pawn_moves(board: &Board, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    let color = piece.color;
    let dir = pawn_push_dir(color);
    let final_rank = match color {
        Color::White => 7,
        Color::Black => 0,
    };
    let start_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };

    // Single push.
    if let Some(to) = from.offset(0, dir) {
        if board.is_empty(to) {
            if to.rank() == final_rank {
                add_promotions(moves, from, to, MoveFlags::NONE);
            } else {
                moves.push(Move::new(from, to));
            }

            // Double push, only from the start rank with a fresh pawn.
            if from.rank() == start_rank && !piece.has_moved {
                if let Some(two) = from.offset(0, 2 * dir) {
                    if board.is_empty(two) {
                        moves.push(Move::with_flags(from, two, MoveFlags::DOUBLE_PUSH));
                    }
                }
            }
        }
    }

    // Diagonal captures, including en passant.
    for d_file in [-1i8, 1] {
        let Some(to) = from.offset(d_file, dir) else {
            continue;
        };
        if board.is_color(to, !color) {
            if to.rank() == final_rank {
                add_promotions(moves, from, to, MoveFlags::CAPTURE);
            } else {
                moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE));
            }
        } else if board.en_passant == Some(to) {
            moves.push(Move::with_flags(
                from,
                to,
                MoveFlags::CAPTURE | MoveFlags::EN_PASSANT,
            ));
        }
    }
}

/// Expand a pawn arrival on the final rank into the four promotion choices.
fn add_promotions(moves: &mut Vec<Move>, from: Square, to: Square, flags: MoveFlags) {
    for kind in PieceKind::PROMOTIONS {
        moves.push(Move::promotion_with_flags(from, to, kind, flags));
    }
}

/// Fixed-offset movers (knight jumps, king steps).
fn generate_step_moves(
    board: &Board,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in offsets {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match board.piece_at(to) {
            None => moves.push(Move::new(from, to)),
            Some(p) if p.color != color => {
                moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE))
            }
            Some(_) => {}
        }
    }
}

/// Ray movers (bishop, rook, queen): walk each direction until blocked.
fn generate_slider_moves(
    board: &Board,
    from: Square,
    color: Color,
    dirs: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in dirs {
        let mut current = from;
        while let Some(to) = current.offset(df, dr) {
            match board.piece_at(to) {
                None => {
                    moves.push(Move::new(from, to));
                    current = to;
                }
                Some(p) => {
                    if p.color != color {
                        moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE));
                    }
                    break;
                }
            }
        }
    }
}

fn generate_castling_moves(board: &Board, from: Square, color: Color, moves: &mut Vec<Move>) {
    let back_rank = match color {
        Color::White => 0,
        Color::Black => 7,
    };
    let king_home = Square::from_file_rank(4, back_rank);

    // Rights imply the king is home in any position reached by play; the
    // square check also covers hand-built positions with stale rights.
    if from != king_home || board.is_in_check(color) {
        return;
    }

    let enemy = !color;

    // Kingside: f and g empty, neither attacked, rook still in the corner.
    if board.castling_rights.can_castle_kingside(color) {
        let f = Square::from_file_rank(5, back_rank);
        let g = Square::from_file_rank(6, back_rank);
        let corner = Square::from_file_rank(7, back_rank);
        let rook_home = matches!(
            board.piece_at(corner),
            Some(p) if p.color == color && p.kind == PieceKind::Rook
        );
        if rook_home
            && board.is_empty(f)
            && board.is_empty(g)
            && !board.is_square_attacked(f, enemy)
            && !board.is_square_attacked(g, enemy)
        {
            moves.push(Move::with_flags(from, g, MoveFlags::CASTLING));
        }
    }

    // Queenside: b, c, d empty; the king transits d and lands on c, so only
    // those two must be unattacked.
    if board.castling_rights.can_castle_queenside(color) {
        let b = Square::from_file_rank(1, back_rank);
        let c = Square::from_file_rank(2, back_rank);
        let d = Square::from_file_rank(3, back_rank);
        let corner = Square::from_file_rank(0, back_rank);
        let rook_home = matches!(
            board.piece_at(corner),
            Some(p) if p.color == color && p.kind == PieceKind::Rook
        );
        if rook_home
            && board.is_empty(b)
            && board.is_empty(c)
            && board.is_empty(d)
            && !board.is_square_attacked(c, enemy)
            && !board.is_square_attacked(d, enemy)
        {
            moves.push(Move::with_flags(from, c, MoveFlags::CASTLING));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
