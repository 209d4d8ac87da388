//! One match, one task.
//!
//! [`spawn_session`] moves a [`Match`] into a tokio task that is the only
//! code ever touching it. Players and tools talk to the task through a
//! [`SessionHandle`]; bots run inside the task right after each tick.

use std::sync::Arc;
use std::time::Duration;

use arena_core::agent::DecisionAgent;
use arena_core::components::{CardId, SideId};
use arena_core::data::CardCatalog;
use arena_core::error::GameError;
use arena_core::facade::{CommandSink, DeployCommand};
use arena_core::math::seconds_from_duration;
use arena_core::simulation::Match;
use arena_core::snapshot::{GameOverEvent, MatchSnapshot};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{ServerConfig, SessionError};

/// Commands queued before the task falls behind.
const COMMAND_BUFFER: usize = 64;

/// Requests handled by a session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Take the next free seat.
    Join {
        /// Deck to play.
        deck: Vec<CardId>,
        /// Receives the assigned side or [`GameError::RoomFull`].
        reply: oneshot::Sender<Result<SideId, GameError>>,
    },
    /// Play a card.
    Deploy(DeployCommand),
    /// End the session without a result.
    Stop,
}

/// Messages published by a session task.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// State after a tick.
    Snapshot(Arc<MatchSnapshot>),
    /// The match ended. Sent once, right before the task exits.
    GameOver(GameOverEvent),
}

/// Client side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
    task: Arc<JoinHandle<()>>,
}

impl SessionHandle {
    /// Take a seat with `deck`.
    pub async fn join(&self, deck: Vec<CardId>) -> Result<SideId, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Join { deck, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        let side = response.await.map_err(|_| SessionError::Closed)??;
        Ok(side)
    }

    /// Queue a deploy. Invalid deploys are dropped by the match.
    pub async fn deploy(&self, command: DeployCommand) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::Deploy(command))
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Receive snapshots and the game-over event from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Ask the task to stop. Calling this on a finished session is a no-op.
    pub async fn stop(&self) {
        // A send error means the task is already gone.
        let _ = self.commands.send(SessionCommand::Stop).await;
    }

    /// Whether the task has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Wait until the task has ended.
    pub async fn closed(&self) {
        self.commands.closed().await;
    }

    /// Whether the task has fully finished running.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Fire-and-forget deploys, like a remote client.
impl CommandSink for SessionHandle {
    fn deploy(&mut self, command: &DeployCommand) {
        if let Err(e) = self
            .commands
            .try_send(SessionCommand::Deploy(command.clone()))
        {
            debug!(side = ?command.side, card_id = %command.card_id, error = %e, "Deploy dropped");
        }
    }
}

/// Start a session task for one match.
///
/// The first `bots` seats (at most two) are taken by decision agents using
/// the configured bot deck and difficulty. Must be called from inside a
/// tokio runtime.
#[must_use]
pub fn spawn_session(catalog: Arc<CardCatalog>, config: &ServerConfig, bots: usize) -> SessionHandle {
    let match_config = config.match_config.clone();
    let mut game = Match::new(Arc::clone(&catalog), match_config.clone());

    let mut agents = Vec::new();
    for _ in 0..bots.min(SideId::ALL.len()) {
        match game.join(config.bot_deck.clone()) {
            Ok(side) => {
                let seed = match_config.seed.wrapping_add(side.index() as u64 + 1);
                agents.push(DecisionAgent::new(
                    side,
                    config.bot_difficulty,
                    Arc::clone(&catalog),
                    &match_config,
                    seed,
                ));
            }
            Err(e) => warn!(error = %e, "Bot could not join"),
        }
    }

    let seated = agents.len();
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let (events, _) = broadcast::channel(config.snapshot_buffer.max(1));
    let task = tokio::spawn(run_session(
        game,
        agents,
        receiver,
        events.clone(),
        config.tick_interval(),
    ));

    info!(bots = seated, tick_rate = config.tick_rate, "Session started");
    SessionHandle {
        commands,
        events,
        task: Arc::new(task),
    }
}

async fn run_session(
    mut game: Match,
    mut agents: Vec<DecisionAgent>,
    mut commands: mpsc::Receiver<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
    tick_every: Duration,
) {
    let mut ticker = time::interval(tick_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    let outcome = loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Join { deck, reply }) => {
                    // The caller may have given up waiting.
                    let _ = reply.send(game.join(deck));
                }
                Some(SessionCommand::Deploy(command)) => {
                    CommandSink::deploy(&mut game, &command);
                    if let Some(over) = game.take_game_over() {
                        publish(&events, SessionEvent::Snapshot(Arc::new(game.snapshot())));
                        break Some(over);
                    }
                }
                Some(SessionCommand::Stop) | None => break None,
            },
            _ = ticker.tick() => {
                let now = Instant::now();
                let dt = seconds_from_duration(now.duration_since(last_tick));
                last_tick = now;

                let mut over = game.tick(dt).game_over;
                if over.is_none() && game.both_joined() {
                    let snapshot = game.snapshot();
                    for agent in &mut agents {
                        agent.act(dt, &snapshot, &mut game);
                    }
                    over = game.take_game_over();
                }

                publish(&events, SessionEvent::Snapshot(Arc::new(game.snapshot())));
                if over.is_some() {
                    break over;
                }
            }
        }
    };

    match outcome {
        Some(event) => {
            info!(winner = ?event.winner, tick = game.current_tick(), "Session finished");
            publish(&events, SessionEvent::GameOver(event));
        }
        None => info!(tick = game.current_tick(), "Session stopped"),
    }
}

fn publish(events: &broadcast::Sender<SessionEvent>, event: SessionEvent) {
    // No subscribers is fine; snapshots are not replayed.
    let _ = events.send(event);
}
