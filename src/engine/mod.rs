//! The chess rules engine: board representation, attack detection, legal
//! move generation, players, and the game state machine.

pub mod attacks;
pub mod board;
pub mod game;
pub mod movegen;
pub mod player;
pub mod types;

pub use board::Board;
pub use game::{Game, GameConfig, MoveRecord};
pub use movegen::{legal_moves, legal_moves_for, legal_moves_from};
pub use player::Player;
pub use types::{
    CastlingRights, ChessError, Color, DrawReason, GameResult, GameStatus, Move, MoveFlags,
    Piece, PieceKind, Square,
};
