//! Game controller: turn-based state machine over the board.
//!
//! `Game` owns a `Board`, two `Player`s, the move history with its undo
//! snapshots, and the repetition bookkeeping. Every mutation goes through
//! `submit_move`, which validates, applies, updates statistics, and then
//! re-evaluates the game status. Errors never leave partial state behind.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::board::Board;
use crate::engine::movegen;
use crate::engine::player::Player;
use crate::engine::types::{
    ChessError, Color, DrawReason, GameResult, GameStatus, Move, Piece, PieceKind, Square,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-game behavior switches.
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    /// Whether `undo` is available.
    pub allow_undo: bool,

    /// Whether clock events (`timeout`) are accepted. The engine never
    /// reads wall time itself; the host drives the clocks.
    pub time_control_enabled: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            allow_undo: true,
            time_control_enabled: false,
        }
    }
}

// ---------------------------------------------------------------------------
// History records
// ---------------------------------------------------------------------------

/// One applied move, as kept in the game history.
#[derive(Clone, Debug)]
pub struct MoveRecord {
    pub mv: Move,
    /// The piece that moved (pre-move value; promotions record the pawn).
    pub piece: Piece,
    pub captured: Option<Piece>,
    /// Game status immediately after this move.
    pub status_after: GameStatus,
}

/// Full pre-move state, one per applied move. Undo restores the top entry.
#[derive(Clone, Debug)]
struct Snapshot {
    board: Board,
    white: Player,
    black: Player,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A chess game: board, players, history, and the status machine.
pub struct Game {
    board: Board,
    white: Player,
    black: Player,
    status: GameStatus,
    config: GameConfig,
    move_history: Vec<MoveRecord>,
    snapshots: Vec<Snapshot>,
    /// Repetition keys of every position reached, starting one included.
    repetition_keys: Vec<String>,
    pub id: String,
    pub created_at: DateTime<Utc>,
    starting_fen: String,
}

impl Game {
    /// A new game from the standard starting position.
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    /// A new game from the standard starting position with explicit config.
    pub fn with_config(config: GameConfig) -> Self {
        Self::build(Board::starting(), config)
    }

    /// A new game from an arbitrary FEN position.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(Self::build(Board::from_fen(fen)?, GameConfig::default()))
    }

    /// A new game from FEN with explicit config.
    pub fn from_fen_with_config(fen: &str, config: GameConfig) -> Result<Self, ChessError> {
        Ok(Self::build(Board::from_fen(fen)?, config))
    }

    fn build(board: Board, config: GameConfig) -> Self {
        let starting_fen = board.to_fen();
        let repetition_keys = vec![board.repetition_key()];
        Game {
            board,
            white: Player::new("White", Color::White),
            black: Player::new("Black", Color::Black),
            status: GameStatus::NotStarted,
            config,
            move_history: Vec::new(),
            snapshots: Vec::new(),
            repetition_keys,
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            starting_fen,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Bind both players. Only allowed before the game starts.
    pub fn set_players(&mut self, white: Player, black: Player) -> Result<(), ChessError> {
        if self.status != GameStatus::NotStarted {
            return Err(ChessError::InvalidState(
                "players can only be set before the game starts".to_string(),
            ));
        }
        debug_assert_eq!(white.color, Color::White);
        debug_assert_eq!(black.color, Color::Black);
        self.white = white;
        self.black = black;
        Ok(())
    }

    /// Start the game: `NotStarted` becomes `InProgress` (or directly a
    /// terminal status if the loaded position is already decided).
    pub fn start(&mut self) -> Result<GameStatus, ChessError> {
        if self.status != GameStatus::NotStarted {
            return Err(ChessError::InvalidState(format!(
                "cannot start a game in status {}",
                self.status
            )));
        }
        self.status = self.evaluate_status();
        info!(game_id = %self.id, status = %self.status, "game started");
        Ok(self.status)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[inline]
    pub fn config(&self) -> GameConfig {
        self.config
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move
    }

    pub fn player(&self, color: Color) -> &Player {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn player_mut(&mut self, color: Color) -> &mut Player {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> &Player {
        self.player(self.side_to_move())
    }

    pub fn move_history(&self) -> &[MoveRecord] {
        &self.move_history
    }

    /// The FEN the game was created from.
    pub fn starting_fen(&self) -> &str {
        &self.starting_fen
    }

    /// Current position as FEN.
    pub fn fen(&self) -> String {
        self.board.to_fen()
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(&self.board)
    }

    /// All legal moves for the given color, regardless of whose turn it is.
    pub fn legal_moves_for(&self, color: Color) -> Vec<Move> {
        movegen::legal_moves_for(&self.board, color)
    }

    /// Legal moves for the piece on `sq`.
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        movegen::legal_moves_from(&self.board, sq)
    }

    /// Is the given color's king in check right now?
    pub fn is_in_check(&self, color: Color) -> bool {
        self.board.is_in_check(color)
    }

    /// Final outcome, `Ongoing` while the game is undecided.
    pub fn result(&self) -> GameResult {
        match self.status {
            GameStatus::NotStarted | GameStatus::InProgress => GameResult::Ongoing,
            GameStatus::Checkmate {
                winner: Color::White,
            } => GameResult::WhiteWins,
            GameStatus::Checkmate {
                winner: Color::Black,
            } => GameResult::BlackWins,
            GameStatus::Stalemate => GameResult::DrawStalemate,
            GameStatus::Draw(DrawReason::FiftyMoveRule) => GameResult::DrawFiftyMove,
            GameStatus::Draw(DrawReason::ThreefoldRepetition) => GameResult::DrawThreefold,
            GameStatus::Draw(DrawReason::InsufficientMaterial) => {
                GameResult::DrawInsufficientMaterial
            }
            GameStatus::Draw(DrawReason::Agreement) => GameResult::DrawAgreement,
            GameStatus::Resigned(color) => GameResult::Resigned(color),
            GameStatus::Timeout(color) => GameResult::Timeout(color),
        }
    }

    // -----------------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------------

    /// Validate and apply a move for the side to move.
    ///
    /// The caller fills in `from`, `to`, and (for promotions) `promotion`;
    /// flags are resolved against the generated legal-move list. Returns
    /// the status after the move. On error the game is unchanged.
    pub fn submit_move(&mut self, mv: Move) -> Result<GameStatus, ChessError> {
        match self.status {
            GameStatus::NotStarted => {
                return Err(ChessError::InvalidState(
                    "game has not started".to_string(),
                ));
            }
            GameStatus::InProgress => {}
            terminal => {
                return Err(ChessError::InvalidState(format!(
                    "game is over: {terminal}"
                )));
            }
        }

        self.validate_shape(mv)?;

        let mover = self.side_to_move();
        let piece = match self.board.piece_at(mv.from) {
            Some(p) if p.color == mover => p,
            Some(_) => {
                return Err(ChessError::IllegalMove {
                    from: mv.from.to_algebraic(),
                    to: mv.to.to_algebraic(),
                    reason: format!("it is {mover}'s turn"),
                });
            }
            None => {
                return Err(ChessError::IllegalMove {
                    from: mv.from.to_algebraic(),
                    to: mv.to.to_algebraic(),
                    reason: "no piece on the source square".to_string(),
                });
            }
        };

        // A bare final-rank pawn move needs an explicit promotion choice.
        if piece.kind == PieceKind::Pawn && mv.promotion.is_none() {
            let final_rank = match mover {
                Color::White => 7,
                Color::Black => 0,
            };
            if mv.to.rank() == final_rank {
                return Err(ChessError::MalformedMove(
                    "promotion piece required for a pawn reaching the final rank".to_string(),
                ));
            }
        }

        // Resolve the caller's intent against the generated legal moves;
        // the resolved move carries the correct mechanics flags.
        let resolved = movegen::legal_moves_from(&self.board, mv.from)
            .into_iter()
            .find(|legal| legal.same_action(mv))
            .ok_or_else(|| ChessError::IllegalMove {
                from: mv.from.to_algebraic(),
                to: mv.to.to_algebraic(),
                reason: "not a legal move in this position".to_string(),
            })?;

        self.snapshots.push(Snapshot {
            board: self.board.clone(),
            white: self.white.clone(),
            black: self.black.clone(),
        });

        let captured = self.board.make_move(resolved);

        // Statistics.
        self.player_mut(mover).record_move();
        if let Some(taken) = captured {
            self.player_mut(mover).record_capture(taken);
        }
        let opponent_in_check = self.board.is_in_check(!mover);
        if opponent_in_check {
            self.player_mut(mover).record_check_given();
        }
        self.player_mut(mover).in_check = false;
        self.player_mut(!mover).in_check = opponent_in_check;

        self.repetition_keys.push(self.board.repetition_key());
        self.status = self.evaluate_status();

        self.move_history.push(MoveRecord {
            mv: resolved,
            piece,
            captured,
            status_after: self.status,
        });

        debug!(
            game_id = %self.id,
            mv = %resolved,
            by = %mover,
            capture = captured.is_some(),
            check = opponent_in_check,
            status = %self.status,
            "move applied"
        );
        if self.status.is_terminal() {
            info!(game_id = %self.id, status = %self.status, "game over");
        }

        Ok(self.status)
    }

    /// Submit a move given as algebraic square names ("e2", "e4"), with an
    /// optional promotion choice. Convenience wrapper over `submit_move`.
    pub fn submit_move_coords(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<PieceKind>,
    ) -> Result<GameStatus, ChessError> {
        let from = Square::from_algebraic(from)
            .ok_or_else(|| ChessError::InvalidSquare(from.to_string()))?;
        let to = Square::from_algebraic(to)
            .ok_or_else(|| ChessError::InvalidSquare(to.to_string()))?;
        self.submit_move(Move {
            from,
            to,
            promotion,
            flags: crate::engine::types::MoveFlags::NONE,
        })
    }

    /// Structural checks that don't need the board.
    fn validate_shape(&self, mv: Move) -> Result<(), ChessError> {
        if mv.from == mv.to {
            return Err(ChessError::MalformedMove(format!(
                "source and destination are both {}",
                mv.from
            )));
        }
        if let Some(kind) = mv.promotion {
            if !kind.is_promotion_target() {
                return Err(ChessError::MalformedMove(format!(
                    "cannot promote to {kind}"
                )));
            }
        }
        Ok(())
    }

    /// Take back the most recent move, restoring board and player state.
    ///
    /// Allowed after positional endings (checkmate, stalemate, automatic
    /// draws) since undoing the move reopens the game, but not after
    /// resignation, timeout, or an agreed draw, which the position cannot
    /// justify reversing.
    pub fn undo(&mut self) -> Result<(), ChessError> {
        if !self.config.allow_undo {
            return Err(ChessError::InvalidState("undo is disabled".to_string()));
        }
        match self.status {
            GameStatus::Resigned(_)
            | GameStatus::Timeout(_)
            | GameStatus::Draw(DrawReason::Agreement) => {
                return Err(ChessError::InvalidState(format!(
                    "cannot undo after {}",
                    self.status
                )));
            }
            _ => {}
        }
        let snapshot = self.snapshots.pop().ok_or(ChessError::NoHistory)?;
        self.board = snapshot.board;
        self.white = snapshot.white;
        self.black = snapshot.black;
        self.move_history.pop();
        self.repetition_keys.pop();
        self.status = GameStatus::InProgress;
        debug!(game_id = %self.id, "move undone");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Non-move endings
    // -----------------------------------------------------------------------

    /// The given color resigns; the opponent wins.
    pub fn resign(&mut self, color: Color) -> Result<GameStatus, ChessError> {
        self.require_in_progress("resign")?;
        self.status = GameStatus::Resigned(color);
        info!(game_id = %self.id, by = %color, "resignation");
        Ok(self.status)
    }

    /// Both players agree to a draw.
    pub fn agree_draw(&mut self) -> Result<GameStatus, ChessError> {
        self.require_in_progress("agree to a draw")?;
        self.status = GameStatus::Draw(DrawReason::Agreement);
        info!(game_id = %self.id, "draw agreed");
        Ok(self.status)
    }

    /// The given color's flag fell. Only meaningful with time control on.
    pub fn timeout(&mut self, color: Color) -> Result<GameStatus, ChessError> {
        if !self.config.time_control_enabled {
            return Err(ChessError::InvalidState(
                "time control is not enabled".to_string(),
            ));
        }
        self.require_in_progress("flag a timeout")?;
        self.status = GameStatus::Timeout(color);
        info!(game_id = %self.id, by = %color, "timeout");
        Ok(self.status)
    }

    fn require_in_progress(&self, action: &str) -> Result<(), ChessError> {
        if self.status != GameStatus::InProgress {
            return Err(ChessError::InvalidState(format!(
                "cannot {action} in status {}",
                self.status
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Status evaluation
    // -----------------------------------------------------------------------

    /// Determine the status of the current position for the side to move.
    ///
    /// Priority: checkmate, stalemate, insufficient material, fifty-move
    /// rule, threefold repetition; otherwise the game continues.
    fn evaluate_status(&self) -> GameStatus {
        let stm = self.board.side_to_move;

        if !movegen::has_legal_moves(&self.board, stm) {
            return if self.board.is_in_check(stm) {
                GameStatus::Checkmate { winner: !stm }
            } else {
                GameStatus::Stalemate
            };
        }

        if self.is_insufficient_material() {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }

        if self.board.halfmove_clock >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoveRule);
        }

        if self.is_threefold_repetition() {
            return GameStatus::Draw(DrawReason::ThreefoldRepetition);
        }

        GameStatus::InProgress
    }

    /// Has the current position occurred three times?
    fn is_threefold_repetition(&self) -> bool {
        let current = self.board.repetition_key();
        self.repetition_keys
            .iter()
            .filter(|key| **key == current)
            .count()
            >= 3
    }

    /// Neither side can possibly deliver mate: king vs king, king and one
    /// minor piece vs king, or king and bishop each with both bishops on
    /// the same square color.
    fn is_insufficient_material(&self) -> bool {
        let mut extras: Vec<(Square, Piece)> = Vec::new();
        for color in [Color::White, Color::Black] {
            for (sq, piece) in self.board.pieces_of(color) {
                if piece.kind != PieceKind::King {
                    extras.push((sq, piece));
                }
            }
        }

        match extras.as_slice() {
            [] => true,
            [(_, piece)] => {
                matches!(piece.kind, PieceKind::Knight | PieceKind::Bishop)
            }
            [(sq_a, a), (sq_b, b)] => {
                a.kind == PieceKind::Bishop
                    && b.kind == PieceKind::Bishop
                    && a.color != b.color
                    && square_shade(*sq_a) == square_shade(*sq_b)
            }
            _ => false,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Light or dark square (0 or 1).
fn square_shade(sq: Square) -> u8 {
    (sq.file() + sq.rank()) & 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
