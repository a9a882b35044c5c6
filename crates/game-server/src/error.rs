//! Errors returned by session and registry operations.

use crate::session::{GameId, PlayerId};
use chess_engine::MoveError;
use thiserror::Error;

/// A rejected request. Nothing is changed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("cannot create game: {0}")]
    InvalidGameCreation(String),

    #[error("cannot join game: {0}")]
    InvalidGameJoin(String),

    #[error("game {0} not found")]
    GameNotFound(GameId),

    #[error("cannot start game: {0}")]
    InvalidStart(String),

    #[error("{0}")]
    InvalidGameState(String),

    /// The engine refused a move; `source` says why.
    #[error("invalid move by {player_id}: {source}")]
    InvalidGameMove {
        player_id: PlayerId,
        source: MoveError,
    },

    /// The request could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl GameError {
    /// Names the error category on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidGameCreation(_) => "InvalidGameCreation",
            GameError::InvalidGameJoin(_) => "InvalidGameJoin",
            GameError::GameNotFound(_) => "GameNotFound",
            GameError::InvalidStart(_) => "InvalidStart",
            GameError::InvalidGameState(_) => "InvalidGameState",
            GameError::InvalidGameMove { .. } => "InvalidGameMove",
            GameError::BadRequest(_) => "BadRequest",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Move;
    use std::error::Error as _;

    #[test]
    fn move_error_is_kept_as_source() {
        let m = Move::from_uci("e2e5").unwrap();
        let err = GameError::InvalidGameMove {
            player_id: "p1".to_string(),
            source: MoveError::Illegal(m),
        };
        assert_eq!(err.kind(), "InvalidGameMove");
        assert_eq!(err.to_string(), "invalid move by p1: illegal move: e2e5");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("illegal move: e2e5".to_string())
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(GameError::GameNotFound("g".into()).kind(), "GameNotFound");
        assert_eq!(GameError::BadRequest("x".into()).kind(), "BadRequest");
        assert_eq!(
            GameError::GameNotFound("abc".into()).to_string(),
            "game abc not found"
        );
    }
}
