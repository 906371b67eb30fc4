//! # chess-core
//!
//! A chess rules engine: complete board state, per-piece legal move
//! generation with full special-move support (castling, en passant,
//! promotion), check/checkmate/stalemate and draw detection, and a
//! turn-based game controller with undo.
//!
//! The crate is a pure library. It never reads the clock or does any I/O;
//! hosts drive player time and render positions themselves (FEN in and
//! out is provided).
//!
//! ```
//! use chess_core::{Game, Move, Square};
//!
//! let mut game = Game::new();
//! game.start().unwrap();
//! let e2 = Square::from_algebraic("e2").unwrap();
//! let e4 = Square::from_algebraic("e4").unwrap();
//! game.submit_move(Move::new(e2, e4)).unwrap();
//! assert_eq!(game.move_history().len(), 1);
//! ```

pub mod engine;

pub use engine::{
    Board, CastlingRights, ChessError, Color, DrawReason, Game, GameConfig, GameResult,
    GameStatus, Move, MoveFlags, MoveRecord, Piece, PieceKind, Player, Square,
};
