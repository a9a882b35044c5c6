//! One clocked game between two players.
//!
//! A [`GameSession`] walks `WaitingForOpponent -> Ready -> InProgress ->
//! Finished`. It owns the engine [`Game`], both players' remaining time and
//! the [`TurnClock`] for the player to move. When a clock runs out the
//! session finishes itself and sends a single [`TimeoutEvent`].

use crate::clock::TurnClock;
use crate::error::GameError;
use crate::history::FinishedGameRecord;
use crate::protocol::{ColorName, PlayerView, PositionView};
use chess_core::{Color, Move, PieceKind};
use chess_engine::{EndReason, Game, GameResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

pub type PlayerId = String;
pub type AccountId = i64;
pub type GameId = String;

/// Shared handle to a session. Lock with [`lock`].
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Locks a session, recovering the guard if a previous holder panicked.
pub fn lock(session: &SessionHandle) -> MutexGuard<'_, GameSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A resolved player: the server-assigned id plus whatever the account
/// layer vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub id: PlayerId,
    pub display_name: String,
    pub account_id: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub identity: PlayerIdentity,
    pub color: Color,
    /// Clock time left, excluding the turn in progress.
    pub remaining: Duration,
}

impl Player {
    fn new(identity: PlayerIdentity, color: Color, remaining: Duration) -> Self {
        Player {
            identity,
            color,
            remaining,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.identity.id.clone(),
            display_name: self.identity.display_name.clone(),
            color: self.color.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorChoice {
    White,
    Black,
    Random,
}

impl ColorChoice {
    pub fn resolve(self) -> Color {
        match self {
            ColorChoice::White => Color::White,
            ColorChoice::Black => Color::Black,
            ColorChoice::Random if rand::random::<bool>() => Color::White,
            ColorChoice::Random => Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    WaitingForOpponent,
    Ready,
    InProgress,
    Finished,
}

/// Sent once when a player's clock runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutEvent {
    pub game_id: GameId,
    pub result: GameResult,
    /// The player whose clock expired.
    pub loser: PlayerId,
}

pub struct GameSession {
    id: GameId,
    host: Player,
    guest: Option<Player>,
    color_was_random: bool,
    timer_duration: Duration,
    state: SessionState,
    game: Game,
    clock: TurnClock,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    timeouts: UnboundedSender<TimeoutEvent>,
    this: Weak<Mutex<GameSession>>,
}

impl GameSession {
    /// Creates a session waiting for an opponent. A random color choice is
    /// resolved here, once.
    pub fn create(
        id: GameId,
        host: PlayerIdentity,
        choice: ColorChoice,
        timer_duration: Duration,
        timeouts: UnboundedSender<TimeoutEvent>,
    ) -> SessionHandle {
        let color = choice.resolve();
        Arc::new_cyclic(|this| {
            Mutex::new(GameSession {
                id,
                host: Player::new(host, color, timer_duration),
                guest: None,
                color_was_random: choice == ColorChoice::Random,
                timer_duration,
                state: SessionState::WaitingForOpponent,
                game: Game::new(),
                clock: TurnClock::new(),
                started_at: None,
                ended_at: None,
                timeouts,
                this: this.clone(),
            })
        })
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn host(&self) -> &Player {
        &self.host
    }

    pub fn guest(&self) -> Option<&Player> {
        self.guest.as_ref()
    }

    pub fn color_was_random(&self) -> bool {
        self.color_was_random
    }

    pub fn timer_duration(&self) -> Duration {
        self.timer_duration
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn result(&self) -> Option<GameResult> {
        self.game.result()
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host.identity.id == player_id
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        std::iter::once(&self.host)
            .chain(self.guest.as_ref())
            .find(|p| p.identity.id == player_id)
    }

    pub fn player_by_color(&self, color: Color) -> Option<&Player> {
        std::iter::once(&self.host)
            .chain(self.guest.as_ref())
            .find(|p| p.color == color)
    }

    fn player_by_color_mut(&mut self, color: Color) -> Option<&mut Player> {
        std::iter::once(&mut self.host)
            .chain(self.guest.as_mut())
            .find(|p| p.color == color)
    }

    /// Seats `guest` with the color opposite the host's.
    pub fn join(&mut self, guest: PlayerIdentity) -> Result<&Player, GameError> {
        if self.guest.is_some() || self.state != SessionState::WaitingForOpponent {
            return Err(GameError::InvalidGameJoin(format!("game {} is full", self.id)));
        }
        if guest.id == self.host.identity.id {
            return Err(GameError::InvalidGameJoin(
                "cannot join your own game".to_string(),
            ));
        }
        let color = self.host.color.opposite();
        self.state = SessionState::Ready;
        tracing::info!(game_id = %self.id, player_id = %guest.id, "Guest joined");
        Ok(self.guest.insert(Player::new(guest, color, self.timer_duration)))
    }

    /// Removes the guest before the game starts. Returns false if
    /// `player_id` is not a guest that can leave.
    pub fn remove_guest(&mut self, player_id: &str) -> bool {
        let is_guest = self
            .guest
            .as_ref()
            .is_some_and(|g| g.identity.id == player_id);
        if !is_guest || self.state != SessionState::Ready {
            return false;
        }
        self.guest = None;
        self.state = SessionState::WaitingForOpponent;
        true
    }

    /// Starts the game from the standard opening and runs White's clock.
    pub fn start(&mut self, requester: &str) -> Result<(), GameError> {
        if !self.is_host(requester) {
            return Err(GameError::InvalidStart(
                "only the host can start the game".to_string(),
            ));
        }
        match self.state {
            SessionState::Ready => {}
            SessionState::WaitingForOpponent => {
                return Err(GameError::InvalidStart("no opponent has joined".to_string()))
            }
            SessionState::InProgress | SessionState::Finished => {
                return Err(GameError::InvalidStart("game has already started".to_string()))
            }
        }

        self.game = Game::new();
        self.state = SessionState::InProgress;
        self.started_at = Some(Utc::now());
        self.arm_active_clock();
        tracing::info!(game_id = %self.id, "Game started");
        Ok(())
    }

    /// Plays `m` for `requester`, who must be the player to move.
    ///
    /// A promoting move without a hint becomes a queen. If the mover's time
    /// is already gone the session times out instead and the move is
    /// rejected.
    pub fn make_move(
        &mut self,
        requester: &str,
        m: Move,
    ) -> Result<Option<GameResult>, GameError> {
        if self.state != SessionState::InProgress {
            return Err(GameError::InvalidGameState(
                "game is not in progress".to_string(),
            ));
        }
        let active = self.game.active_color();
        let (mover_id, remaining) = self
            .player_by_color(active)
            .map(|p| (p.identity.id.clone(), p.remaining))
            .ok_or_else(|| GameError::InvalidGameState(format!("no {active} player")))?;
        if mover_id != requester {
            return Err(GameError::InvalidGameState("it is not your turn".to_string()));
        }

        let elapsed = self.clock.elapsed();
        if elapsed >= remaining {
            self.time_out();
            return Err(GameError::InvalidGameState(
                "your clock has run out".to_string(),
            ));
        }

        let m = if m.promotion.is_none() && self.game.is_promotion(m) {
            m.with_promotion(PieceKind::Queen)
        } else {
            m
        };
        let result = self
            .game
            .make_move(m)
            .map_err(|source| GameError::InvalidGameMove {
                player_id: mover_id.clone(),
                source,
            })?;
        tracing::debug!(game_id = %self.id, player_id = %mover_id, "Played {}", m.to_uci());

        self.charge(active, elapsed);
        match result {
            Some(result) => self.finish(result),
            None => self.arm_active_clock(),
        }
        Ok(result)
    }

    /// Ends the game in the opponent's favour.
    pub fn resign(&mut self, requester: &str) -> Result<GameResult, GameError> {
        self.forfeit(requester, EndReason::Resigned)
    }

    /// Ends the game in favour of whoever stayed.
    pub fn abandon(&mut self, leaver: &str) -> Result<GameResult, GameError> {
        self.forfeit(leaver, EndReason::Abandoned)
    }

    fn forfeit(&mut self, player_id: &str, reason: EndReason) -> Result<GameResult, GameError> {
        if self.state != SessionState::InProgress {
            return Err(GameError::InvalidGameState(
                "game is not in progress".to_string(),
            ));
        }
        let color = self
            .player(player_id)
            .map(|p| p.color)
            .ok_or_else(|| {
                GameError::InvalidGameState(format!("{player_id} is not playing in this game"))
            })?;

        let active = self.game.active_color();
        let elapsed = self.clock.elapsed();
        self.charge(active, elapsed);

        let result = GameResult::win(color.opposite(), reason);
        self.finish(result);
        Ok(result)
    }

    /// Called by the timer task armed with `generation`. Stale timers do
    /// nothing.
    pub fn expire(&mut self, generation: u64) -> Option<TimeoutEvent> {
        if self.state != SessionState::InProgress || !self.clock.is_current(generation) {
            return None;
        }
        Some(self.time_out())
    }

    fn time_out(&mut self) -> TimeoutEvent {
        let loser_color = self.game.active_color();
        if let Some(loser) = self.player_by_color_mut(loser_color) {
            loser.remaining = Duration::ZERO;
        }
        let result = GameResult::win(loser_color.opposite(), EndReason::Timeout);
        self.finish(result);

        let loser = self
            .player_by_color(loser_color)
            .map(|p| p.identity.id.clone())
            .unwrap_or_default();
        tracing::info!(game_id = %self.id, player_id = %loser, "Clock expired");
        let event = TimeoutEvent {
            game_id: self.id.clone(),
            result,
            loser,
        };
        if self.timeouts.send(event.clone()).is_err() {
            tracing::warn!(game_id = %self.id, "Timeout listener is gone");
        }
        event
    }

    fn charge(&mut self, color: Color, elapsed: Duration) {
        if let Some(player) = self.player_by_color_mut(color) {
            player.remaining = player.remaining.saturating_sub(elapsed);
        }
    }

    fn arm_active_clock(&mut self) {
        let remaining = self
            .player_by_color(self.game.active_color())
            .map(|p| p.remaining)
            .unwrap_or_default();
        let session = self.this.clone();
        self.clock.arm(remaining, move |generation| {
            if let Some(session) = session.upgrade() {
                lock(&session).expire(generation);
            }
        });
    }

    fn finish(&mut self, result: GameResult) {
        self.game.conclude(result);
        self.clock.disarm();
        self.state = SessionState::Finished;
        self.ended_at = Some(Utc::now());
        tracing::info!(game_id = %self.id, "{}", result);
    }

    /// Time left for `player`, counting the turn in progress.
    pub fn live_remaining(&self, player: &Player) -> Duration {
        if self.state == SessionState::InProgress && player.color == self.game.active_color() {
            player.remaining.saturating_sub(self.clock.elapsed())
        } else {
            player.remaining
        }
    }

    pub fn view(&self) -> PositionView {
        let time = |color| {
            self.player_by_color(color)
                .map(|p| self.live_remaining(p))
                .unwrap_or_default()
        };
        PositionView::new(&self.game, time(Color::White), time(Color::Black))
    }

    pub fn color_of(&self, player_id: &str) -> Option<ColorName> {
        self.player(player_id).map(|p| p.color.into())
    }

    /// The history record for a finished game, if either player has an
    /// account.
    pub fn finished_record(&self) -> Option<FinishedGameRecord> {
        let result = self.result()?;
        let started_at = self.started_at?;
        let ended_at = self.ended_at?;
        let account = |color| self.player_by_color(color).and_then(|p| p.identity.account_id);
        let (white_account_id, black_account_id) = (account(Color::White), account(Color::Black));
        if white_account_id.is_none() && black_account_id.is_none() {
            return None;
        }
        Some(FinishedGameRecord {
            game_id: self.id.clone(),
            started_at,
            ended_at,
            winner: result.winner,
            reason: result.reason,
            white_account_id,
            black_account_id,
        })
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("host", &self.host)
            .field("guest", &self.guest)
            .field("fen", &self.game.to_fen())
            .finish()
    }
}
