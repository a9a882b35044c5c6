//! JSON messages exchanged with clients over the WebSocket.
//!
//! Every frame is an object tagged by its `"event"` field. Field names are
//! camelCase; colors, piece kinds and end reasons are upper case.

use crate::session::{AccountId, ColorChoice, GameId, PlayerId};
use chess_core::{Color, Coordinate, Move, PieceKind};
use chess_engine::{checked_coordinate, Game, GameResult, MoveError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A request sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Identify {
        display_name: String,
        #[serde(default)]
        account_id: Option<AccountId>,
    },
    #[serde(rename_all = "camelCase")]
    Create {
        color_choice: ColorChoice,
        timer_duration_seconds: u64,
    },
    #[serde(rename_all = "camelCase")]
    Join { game_id: GameId },
    Start,
    Move {
        #[serde(rename = "move")]
        mv: MovePayload,
    },
    Resign,
    Leave,
}

/// A square as sent by clients. Components are unchecked until converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSquare {
    pub rank: i64,
    pub file: i64,
}

impl From<Coordinate> for WireSquare {
    fn from(coord: Coordinate) -> Self {
        WireSquare {
            rank: coord.rank() as i64,
            file: coord.file() as i64,
        }
    }
}

impl WireSquare {
    pub fn to_coordinate(self) -> Result<Coordinate, MoveError> {
        checked_coordinate(self.rank, self.file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionPiece {
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "R")]
    Rook,
    #[serde(rename = "B")]
    Bishop,
    #[serde(rename = "N")]
    Knight,
}

impl From<PromotionPiece> for PieceKind {
    fn from(piece: PromotionPiece) -> Self {
        match piece {
            PromotionPiece::Queen => PieceKind::Queen,
            PromotionPiece::Rook => PieceKind::Rook,
            PromotionPiece::Bishop => PieceKind::Bishop,
            PromotionPiece::Knight => PieceKind::Knight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub from: WireSquare,
    pub to: WireSquare,
    #[serde(default)]
    pub promotion_piece: Option<PromotionPiece>,
}

impl MovePayload {
    /// Converts the payload into an engine move, rejecting off-board squares.
    pub fn to_move(self) -> Result<Move, MoveError> {
        let m = Move::new(self.from.to_coordinate()?, self.to.to_coordinate()?);
        Ok(match self.promotion_piece {
            Some(piece) => m.with_promotion(piece.into()),
            None => m,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorName {
    White,
    Black,
}

impl From<Color> for ColorName {
    fn from(color: Color) -> Self {
        match color {
            Color::White => ColorName::White,
            Color::Black => ColorName::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KindName {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl From<PieceKind> for KindName {
    fn from(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Pawn => KindName::Pawn,
            PieceKind::Knight => KindName::Knight,
            PieceKind::Bishop => KindName::Bishop,
            PieceKind::Rook => KindName::Rook,
            PieceKind::Queen => KindName::Queen,
            PieceKind::King => KindName::King,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceView {
    pub square: WireSquare,
    pub color: ColorName,
    pub kind: KindName,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveView {
    pub from: WireSquare,
    pub to: WireSquare,
}

impl From<Move> for MoveView {
    fn from(m: Move) -> Self {
        MoveView {
            from: m.from.into(),
            to: m.to.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultView {
    pub winner: Option<ColorName>,
    pub reason: &'static str,
}

impl From<GameResult> for ResultView {
    fn from(result: GameResult) -> Self {
        ResultView {
            winner: result.winner.map(ColorName::from),
            reason: result.reason.as_str(),
        }
    }
}

/// Snapshot of a game as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub pieces: Vec<PieceView>,
    pub legal_moves: Vec<MoveView>,
    pub active_color: ColorName,
    /// Remaining clock time in seconds.
    pub white_time: f64,
    pub black_time: f64,
    pub result: Option<ResultView>,
}

impl PositionView {
    pub fn new(game: &Game, white_time: Duration, black_time: Duration) -> Self {
        let pieces = game
            .position()
            .board
            .pieces(None)
            .map(|(square, piece)| PieceView {
                square: square.into(),
                color: piece.color.into(),
                kind: piece.kind.into(),
            })
            .collect();
        PositionView {
            pieces,
            legal_moves: game.legal_moves().iter().copied().map(MoveView::from).collect(),
            active_color: game.active_color().into(),
            white_time: white_time.as_secs_f64(),
            black_time: black_time.as_secs_f64(),
            result: game.result().map(ResultView::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub display_name: String,
    pub color: ColorName,
}

/// A response or notification sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Identified {
        player_id: PlayerId,
        display_name: String,
    },
    #[serde(rename_all = "camelCase")]
    GameCreated {
        game_id: GameId,
        color: ColorName,
        color_was_random: bool,
        timer_duration_seconds: u64,
    },
    /// Sent to the player who joined.
    #[serde(rename_all = "camelCase")]
    GameJoined {
        game_id: GameId,
        color: ColorName,
        opponent: PlayerView,
    },
    /// Sent to the host when a guest arrives.
    #[serde(rename_all = "camelCase")]
    PlayerJoined { game_id: GameId, opponent: PlayerView },
    #[serde(rename_all = "camelCase")]
    GameStarted {
        game_id: GameId,
        position: PositionView,
    },
    /// Sent to the mover.
    #[serde(rename_all = "camelCase")]
    MoveAccepted {
        game_id: GameId,
        position: PositionView,
    },
    /// Sent to everyone in the room but the mover.
    #[serde(rename_all = "camelCase")]
    MoveApplied {
        game_id: GameId,
        #[serde(rename = "move")]
        mv: MoveView,
        position: PositionView,
    },
    #[serde(rename_all = "camelCase")]
    GameEnded { game_id: GameId, result: ResultView },
    /// The guest left before the game started.
    #[serde(rename_all = "camelCase")]
    OpponentLeft { game_id: GameId },
    /// The host left before the game started.
    #[serde(rename_all = "camelCase")]
    GameClosed { game_id: GameId },
    #[serde(rename_all = "camelCase")]
    Left { game_id: GameId },
    Error { kind: String, message: String },
}

impl ServerMessage {
    pub fn error(err: &crate::GameError) -> Self {
        ServerMessage::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::EndReason;
    use serde_json::{json, Value};

    fn parse(text: &str) -> ClientMessage {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn decodes_requests() {
        assert_eq!(
            parse(r#"{"event":"identify","displayName":"ann"}"#),
            ClientMessage::Identify {
                display_name: "ann".into(),
                account_id: None
            }
        );
        assert_eq!(
            parse(r#"{"event":"create","colorChoice":"RANDOM","timerDurationSeconds":300}"#),
            ClientMessage::Create {
                color_choice: ColorChoice::Random,
                timer_duration_seconds: 300
            }
        );
        assert_eq!(
            parse(r#"{"event":"join","gameId":"g1"}"#),
            ClientMessage::Join {
                game_id: "g1".into()
            }
        );
        assert_eq!(parse(r#"{"event":"start"}"#), ClientMessage::Start);
        assert_eq!(parse(r#"{"event":"resign"}"#), ClientMessage::Resign);
        assert_eq!(parse(r#"{"event":"leave"}"#), ClientMessage::Leave);
    }

    #[test]
    fn decodes_move_with_promotion() {
        let msg = parse(
            r#"{"event":"move","move":{"from":{"rank":6,"file":0},"to":{"rank":7,"file":0},"promotionPiece":"N"}}"#,
        );
        let mv = match msg {
            ClientMessage::Move { mv } => mv,
            other => panic!("expected a move, got {:?}", other),
        };
        let m = mv.to_move().unwrap();
        assert_eq!(m.to_uci(), "a7a8n");
    }

    #[test]
    fn off_board_square_is_rejected() {
        let payload = MovePayload {
            from: WireSquare { rank: 1, file: 4 },
            to: WireSquare { rank: 8, file: 4 },
            promotion_piece: None,
        };
        assert_eq!(
            payload.to_move(),
            Err(MoveError::OffBoard { rank: 8, file: 4 })
        );
    }

    #[test]
    fn unknown_events_and_pieces_fail_to_decode() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"event":"dance"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(
            r#"{"event":"move","move":{"from":{"rank":6,"file":0},"to":{"rank":7,"file":0},"promotionPiece":"K"}}"#
        )
        .is_err());
    }

    #[test]
    fn position_view_of_opening() {
        let game = Game::new();
        let view = PositionView::new(&game, Duration::from_secs(60), Duration::from_millis(59_500));
        assert_eq!(view.pieces.len(), 32);
        assert_eq!(view.legal_moves.len(), 20);

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["activeColor"], "WHITE");
        assert_eq!(value["whiteTime"], 60.0);
        assert_eq!(value["blackTime"], 59.5);
        assert_eq!(value["result"], Value::Null);
        assert_eq!(
            value["pieces"][0],
            json!({"square": {"rank": 0, "file": 0}, "color": "WHITE", "kind": "ROOK"})
        );
    }

    #[test]
    fn encodes_notifications() {
        let ended = ServerMessage::GameEnded {
            game_id: "g1".into(),
            result: GameResult::win(Color::Black, EndReason::Timeout).into(),
        };
        assert_eq!(
            serde_json::to_value(&ended).unwrap(),
            json!({"event": "gameEnded", "gameId": "g1", "result": {"winner": "BLACK", "reason": "TIMEOUT"}})
        );

        let draw = ResultView::from(GameResult::draw(EndReason::Stalemate));
        assert_eq!(
            serde_json::to_value(draw).unwrap(),
            json!({"winner": null, "reason": "STALEMATE"})
        );

        let err = ServerMessage::error(&crate::GameError::GameNotFound("g9".into()));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"event": "error", "kind": "GameNotFound", "message": "game g9 not found"})
        );
    }
}
