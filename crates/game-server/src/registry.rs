//! Live sessions and who is playing in them.
//!
//! The registry maps game ids to sessions and player (and account) ids to
//! the one live game each may take part in. Both indices sit behind one
//! lock so they always change together. When the registry must also touch a
//! session it takes its own lock first. Moves run with only the session
//! locked, so games never wait on each other's engine work.

use crate::error::GameError;
use crate::history::{FinishedGameRecord, HistorySink};
use crate::protocol::PositionView;
use crate::session::{
    lock, AccountId, ColorChoice, GameId, GameSession, PlayerId, PlayerIdentity, SessionHandle,
    SessionState, TimeoutEvent,
};
use chess_core::Move;
use chess_engine::GameResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// What happened when a player left a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The host left before the start; the session is gone.
    GameClosed,
    /// The guest left before the start; the session waits for someone else.
    GuestLeft,
    /// A game in progress was forfeited by the leaver.
    Abandoned(GameResult),
    /// The game had already ended and is now released.
    AlreadyFinished,
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub result: Option<GameResult>,
    pub position: PositionView,
}

#[derive(Debug, Default)]
struct RegistryState {
    games: HashMap<GameId, SessionHandle>,
    by_player: HashMap<PlayerId, GameId>,
    by_account: HashMap<AccountId, GameId>,
}

impl RegistryState {
    /// The live game `player` is bound to, by player id or account id.
    fn bound_game(&self, player: &PlayerIdentity) -> Option<&GameId> {
        self.by_player.get(&player.id).or_else(|| {
            player
                .account_id
                .and_then(|account| self.by_account.get(&account))
        })
    }

    fn bind(&mut self, player: &PlayerIdentity, game_id: &GameId) {
        self.by_player.insert(player.id.clone(), game_id.clone());
        if let Some(account) = player.account_id {
            self.by_account.insert(account, game_id.clone());
        }
    }

    fn unbind(&mut self, player: &PlayerIdentity, game_id: &GameId) {
        if self.by_player.get(&player.id) == Some(game_id) {
            self.by_player.remove(&player.id);
        }
        if let Some(account) = player.account_id {
            if self.by_account.get(&account) == Some(game_id) {
                self.by_account.remove(&account);
            }
        }
    }
}

pub struct SessionRegistry {
    state: Mutex<RegistryState>,
    history: Arc<dyn HistorySink>,
    timeouts: UnboundedSender<TimeoutEvent>,
    max_timer: Duration,
}

impl SessionRegistry {
    /// Creates an empty registry. Every clock expiry of its sessions arrives
    /// on the returned receiver and should be passed to
    /// [`SessionRegistry::handle_timeout`].
    pub fn new(
        history: Arc<dyn HistorySink>,
        max_timer: Duration,
    ) -> (Self, UnboundedReceiver<TimeoutEvent>) {
        let (timeouts, rx) = unbounded_channel();
        let registry = SessionRegistry {
            state: Mutex::new(RegistryState::default()),
            history,
            timeouts,
            max_timer,
        };
        (registry, rx)
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(
        &self,
        host: PlayerIdentity,
        choice: ColorChoice,
        timer_seconds: u64,
    ) -> Result<SessionHandle, GameError> {
        let timer = Duration::from_secs(timer_seconds);
        if timer.is_zero() || timer > self.max_timer {
            return Err(GameError::InvalidGameCreation(format!(
                "timer must be between 1 and {} seconds",
                self.max_timer.as_secs()
            )));
        }

        let mut state = self.state();
        if let Some(existing) = state.bound_game(&host) {
            return Err(GameError::InvalidGameCreation(format!(
                "{} is already in game {}",
                host.id, existing
            )));
        }

        let game_id = Uuid::new_v4().to_string();
        let session = GameSession::create(
            game_id.clone(),
            host.clone(),
            choice,
            timer,
            self.timeouts.clone(),
        );
        state.games.insert(game_id.clone(), Arc::clone(&session));
        state.bind(&host, &game_id);
        tracing::info!(game_id = %game_id, player_id = %host.id, "Game created");
        Ok(session)
    }

    pub fn join(&self, game_id: &str, guest: PlayerIdentity) -> Result<SessionHandle, GameError> {
        let mut state = self.state();
        if let Some(existing) = state.bound_game(&guest) {
            return Err(GameError::InvalidGameJoin(format!(
                "{} is already in game {}",
                guest.id, existing
            )));
        }
        let session = state
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::InvalidGameJoin(format!("game {game_id} does not exist")))?;

        let bound_to = {
            let mut s = lock(&session);
            s.join(guest.clone())?;
            s.id().clone()
        };
        state.bind(&guest, &bound_to);
        Ok(session)
    }

    pub fn session(&self, game_id: &str) -> Result<SessionHandle, GameError> {
        self.state()
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::GameNotFound(game_id.to_string()))
    }

    /// The live game `player_id` is playing in or waiting for.
    pub fn game_of(&self, player_id: &str) -> Option<GameId> {
        self.state().by_player.get(player_id).cloned()
    }

    pub fn active_games(&self) -> usize {
        self.state().games.len()
    }

    pub fn start(&self, game_id: &str, requester: &str) -> Result<PositionView, GameError> {
        let session = self.session(game_id)?;
        let mut s = lock(&session);
        s.start(requester)?;
        Ok(s.view())
    }

    pub fn make_move(
        &self,
        game_id: &str,
        requester: &str,
        m: Move,
    ) -> Result<MoveOutcome, GameError> {
        let session = self.session(game_id)?;
        let (result, position) = {
            let mut s = lock(&session);
            let result = s.make_move(requester, m)?;
            (result, s.view())
        };
        if result.is_some() {
            self.retire_if_live(game_id, &session);
        }
        Ok(MoveOutcome { result, position })
    }

    /// Retires `session` unless something else already removed it.
    fn retire_if_live(&self, game_id: &str, session: &SessionHandle) {
        let mut state = self.state();
        let live = state
            .games
            .get(game_id)
            .is_some_and(|handle| Arc::ptr_eq(handle, session));
        if live {
            let s = lock(session);
            self.retire(&mut state, &s);
        }
    }

    pub fn resign(&self, game_id: &str, requester: &str) -> Result<GameResult, GameError> {
        let mut state = self.state();
        let session = state
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::GameNotFound(game_id.to_string()))?;
        let mut s = lock(&session);
        if s.player(requester).is_none() {
            return Err(GameError::InvalidGameState(format!(
                "{requester} is not playing in game {game_id}"
            )));
        }
        let result = s.resign(requester)?;
        self.retire(&mut state, &s);
        Ok(result)
    }

    pub fn leave(&self, game_id: &str, player_id: &str) -> Result<LeaveOutcome, GameError> {
        let mut state = self.state();
        let session = state
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::GameNotFound(game_id.to_string()))?;
        let mut s = lock(&session);
        let leaver = s
            .player(player_id)
            .map(|p| p.identity.clone())
            .ok_or_else(|| {
                GameError::InvalidGameState(format!("{player_id} is not in game {game_id}"))
            })?;

        let outcome = match s.state() {
            SessionState::WaitingForOpponent | SessionState::Ready if s.is_host(player_id) => {
                self.retire(&mut state, &s);
                LeaveOutcome::GameClosed
            }
            SessionState::WaitingForOpponent | SessionState::Ready => {
                s.remove_guest(player_id);
                state.unbind(&leaver, &game_id.to_string());
                LeaveOutcome::GuestLeft
            }
            SessionState::InProgress => {
                let result = s.abandon(player_id)?;
                self.retire(&mut state, &s);
                LeaveOutcome::Abandoned(result)
            }
            SessionState::Finished => {
                self.retire(&mut state, &s);
                LeaveOutcome::AlreadyFinished
            }
        };
        tracing::info!(game_id, player_id, ?outcome, "Player left");
        Ok(outcome)
    }

    /// Releases the session whose clock ran out. Returns false if it was
    /// already gone.
    pub fn handle_timeout(&self, event: &TimeoutEvent) -> bool {
        let mut state = self.state();
        let Some(session) = state.games.get(&event.game_id).cloned() else {
            return false;
        };
        let s = lock(&session);
        self.retire(&mut state, &s);
        true
    }

    /// Drops `session` from every index and hands a finished game to the
    /// history sink.
    fn retire(&self, state: &mut RegistryState, session: &GameSession) {
        let game_id = session.id();
        state.games.remove(game_id);
        state.unbind(&session.host().identity, game_id);
        if let Some(guest) = session.guest() {
            state.unbind(&guest.identity, game_id);
        }
        tracing::debug!(game_id = %game_id, "Session removed");

        if let Some(record) = session.finished_record() {
            self.persist(record);
        }
    }

    fn persist(&self, record: FinishedGameRecord) {
        let history = Arc::clone(&self.history);
        let write = move || {
            if let Err(e) = history.persist(&record) {
                tracing::error!(game_id = %record.game_id, "Failed to persist finished game: {}", e);
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(write);
            }
            Err(_) => write(),
        }
    }
}
