//! Real-time two-player chess over WebSocket.
//!
//! - [`session`] - one clocked game and its lifecycle
//! - [`registry`] - live sessions and the one-game-per-player rule
//! - [`room`] - fan-out of messages to a game's connections
//! - [`history`] - storage of finished games
//! - [`protocol`] - the JSON wire format
//! - [`server`] - the WebSocket transport tying it together

pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod server;
pub mod session;

pub use config::{ConfigError, ServerConfig};
pub use error::GameError;
pub use history::{DiscardHistory, FinishedGameRecord, HistoryError, HistorySink, SqliteHistory};
pub use registry::{LeaveOutcome, MoveOutcome, SessionRegistry};
pub use room::{Connection, RoomBroadcaster};
pub use server::{AppState, Client};
pub use session::{ColorChoice, GameSession, PlayerIdentity, SessionState, TimeoutEvent};
