//! WebSocket transport: accepts clients, decodes their requests, drives the
//! registry and fans results out to game rooms.

use crate::error::GameError;
use crate::protocol::{ClientMessage, MovePayload, ServerMessage};
use crate::registry::{LeaveOutcome, SessionRegistry};
use crate::room::{Connection, ConnectionId, RoomBroadcaster};
use crate::session::{lock, AccountId, ColorChoice, GameId, PlayerIdentity, TimeoutEvent};
use chess_engine::GameResult;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

/// Everything the connection handlers share.
pub struct AppState {
    pub registry: SessionRegistry,
    pub rooms: RoomBroadcaster,
    next_connection: AtomicU64,
}

impl AppState {
    pub fn new(registry: SessionRegistry) -> Self {
        AppState {
            registry,
            rooms: RoomBroadcaster::new(),
            next_connection: AtomicU64::new(1),
        }
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }
}

/// One connected client and the player it has identified as.
#[derive(Debug)]
pub struct Client {
    connection: Connection,
    player: Option<PlayerIdentity>,
}

impl Client {
    pub fn new(connection: Connection) -> Self {
        Client {
            connection,
            player: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.connection.id
    }

    pub fn player(&self) -> Option<&PlayerIdentity> {
        self.player.as_ref()
    }

    fn identity(&self) -> Result<PlayerIdentity, GameError> {
        self.player
            .clone()
            .ok_or_else(|| GameError::BadRequest("identify before playing".to_string()))
    }

    fn reply(&self, message: &ServerMessage) {
        match message.to_json() {
            Ok(frame) => {
                self.connection.send(frame);
            }
            Err(e) => tracing::error!(connection = self.id(), "Failed to encode reply: {}", e),
        }
    }
}

/// Accepts WebSocket clients on `listener` until it fails.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, state).await {
                tracing::warn!(%peer, "Connection error: {}", e);
            }
        });
    }
}

/// Forwards every clock expiry to the registry and announces the result.
pub fn spawn_timeout_forwarder(
    state: Arc<AppState>,
    mut timeouts: UnboundedReceiver<TimeoutEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = timeouts.recv().await {
            state.registry.handle_timeout(&event);
            end_game(&state, &event.game_id, event.result);
        }
    })
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<AppState>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (tx, mut rx) = unbounded_channel::<String>();
    let mut client = Client::new(Connection::new(state.next_connection_id(), tx));
    tracing::info!(%peer, connection = client.id(), "Client connected");

    let forward_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(%peer, "WebSocket error: {}", e);
                break;
            }
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(request) => dispatch(&state, &mut client, request),
            Err(e) => {
                let err = GameError::BadRequest(e.to_string());
                tracing::warn!(%peer, "Undecodable request: {}", e);
                client.reply(&ServerMessage::error(&err));
            }
        }
    }

    disconnect(&state, &client);
    forward_task.abort();
    tracing::info!(%peer, connection = client.id(), "Client disconnected");
    Ok(())
}

/// Handles one decoded request. Failures are reported back to the client.
pub fn dispatch(state: &AppState, client: &mut Client, request: ClientMessage) {
    tracing::debug!(connection = client.id(), ?request, "Request");
    if let Err(err) = handle_request(state, client, request) {
        tracing::warn!(connection = client.id(), kind = err.kind(), "Request rejected: {}", err);
        client.reply(&ServerMessage::error(&err));
    }
}

/// Treats a closed connection as leaving its live game.
pub fn disconnect(state: &AppState, client: &Client) {
    let Some(player) = client.player() else {
        return;
    };
    let Some(game_id) = state.registry.game_of(&player.id) else {
        return;
    };
    match state.registry.leave(&game_id, &player.id) {
        Ok(outcome) => announce_leave(state, client.id(), &game_id, outcome),
        Err(e) => tracing::warn!(game_id = %game_id, player_id = %player.id, "Leave on disconnect failed: {}", e),
    }
}

fn handle_request(
    state: &AppState,
    client: &mut Client,
    request: ClientMessage,
) -> Result<(), GameError> {
    match request {
        ClientMessage::Identify {
            display_name,
            account_id,
        } => identify(client, display_name, account_id),
        ClientMessage::Create {
            color_choice,
            timer_duration_seconds,
        } => create(state, client, color_choice, timer_duration_seconds),
        ClientMessage::Join { game_id } => join(state, client, game_id),
        ClientMessage::Start => {
            let player = client.identity()?;
            let game_id = current_game(state, &player)?;
            let position = state.registry.start(&game_id, &player.id)?;
            let message = ServerMessage::GameStarted {
                game_id: game_id.clone(),
                position,
            };
            state.rooms.emit(&game_id, &message, &[]);
            Ok(())
        }
        ClientMessage::Move { mv } => play(state, client, mv),
        ClientMessage::Resign => {
            let player = client.identity()?;
            let game_id = current_game(state, &player)?;
            let result = state.registry.resign(&game_id, &player.id)?;
            end_game(state, &game_id, result);
            Ok(())
        }
        ClientMessage::Leave => {
            let player = client.identity()?;
            let game_id = current_game(state, &player)?;
            let outcome = state.registry.leave(&game_id, &player.id)?;
            announce_leave(state, client.id(), &game_id, outcome);
            client.reply(&ServerMessage::Left { game_id });
            Ok(())
        }
    }
}

fn identify(
    client: &mut Client,
    display_name: String,
    account_id: Option<AccountId>,
) -> Result<(), GameError> {
    if client.player.is_some() {
        return Err(GameError::BadRequest("already identified".to_string()));
    }
    let identity = PlayerIdentity {
        id: Uuid::new_v4().to_string(),
        display_name,
        account_id,
    };
    tracing::info!(connection = client.id(), player_id = %identity.id, "Player identified");
    client.reply(&ServerMessage::Identified {
        player_id: identity.id.clone(),
        display_name: identity.display_name.clone(),
    });
    client.player = Some(identity);
    Ok(())
}

fn create(
    state: &AppState,
    client: &Client,
    color_choice: ColorChoice,
    timer_duration_seconds: u64,
) -> Result<(), GameError> {
    let player = client.identity()?;
    let session = state
        .registry
        .create(player, color_choice, timer_duration_seconds)?;
    let s = lock(&session);
    state.rooms.join(s.id(), client.connection.clone());
    client.reply(&ServerMessage::GameCreated {
        game_id: s.id().clone(),
        color: s.host().color.into(),
        color_was_random: s.color_was_random(),
        timer_duration_seconds,
    });
    Ok(())
}

fn join(state: &AppState, client: &Client, game_id: GameId) -> Result<(), GameError> {
    let player = client.identity()?;
    let session = state.registry.join(&game_id, player.clone())?;
    let (host, guest) = {
        let s = lock(&session);
        let guest = s
            .player(&player.id)
            .map(|p| p.view())
            .ok_or_else(|| GameError::InvalidGameState("join did not seat the player".to_string()))?;
        (s.host().view(), guest)
    };

    state.rooms.join(&game_id, client.connection.clone());
    client.reply(&ServerMessage::GameJoined {
        game_id: game_id.clone(),
        color: guest.color,
        opponent: host,
    });
    let joined = ServerMessage::PlayerJoined {
        game_id: game_id.clone(),
        opponent: guest,
    };
    state.rooms.emit(&game_id, &joined, &[client.id()]);
    Ok(())
}

fn play(state: &AppState, client: &Client, payload: MovePayload) -> Result<(), GameError> {
    let player = client.identity()?;
    let game_id = current_game(state, &player)?;
    let m = payload
        .to_move()
        .map_err(|source| GameError::InvalidGameMove {
            player_id: player.id.clone(),
            source,
        })?;
    let outcome = state.registry.make_move(&game_id, &player.id, m)?;

    client.reply(&ServerMessage::MoveAccepted {
        game_id: game_id.clone(),
        position: outcome.position.clone(),
    });
    let applied = ServerMessage::MoveApplied {
        game_id: game_id.clone(),
        mv: m.into(),
        position: outcome.position,
    };
    state.rooms.emit(&game_id, &applied, &[client.id()]);

    if let Some(result) = outcome.result {
        end_game(state, &game_id, result);
    }
    Ok(())
}

fn current_game(state: &AppState, player: &PlayerIdentity) -> Result<GameId, GameError> {
    state
        .registry
        .game_of(&player.id)
        .ok_or_else(|| GameError::InvalidGameState("you are not in a game".to_string()))
}

fn announce_leave(state: &AppState, leaver: ConnectionId, game_id: &GameId, outcome: LeaveOutcome) {
    state.rooms.leave(game_id, leaver);
    match outcome {
        LeaveOutcome::GameClosed => {
            let closed = ServerMessage::GameClosed {
                game_id: game_id.clone(),
            };
            state.rooms.emit(game_id, &closed, &[]);
            state.rooms.close(game_id);
        }
        LeaveOutcome::GuestLeft => {
            let left = ServerMessage::OpponentLeft {
                game_id: game_id.clone(),
            };
            state.rooms.emit(game_id, &left, &[]);
        }
        LeaveOutcome::Abandoned(result) => end_game(state, game_id, result),
        LeaveOutcome::AlreadyFinished => state.rooms.close(game_id),
    }
}

fn end_game(state: &AppState, game_id: &GameId, result: GameResult) {
    let ended = ServerMessage::GameEnded {
        game_id: game_id.clone(),
        result: result.into(),
    };
    state.rooms.emit(game_id, &ended, &[]);
    state.rooms.close(game_id);
}
