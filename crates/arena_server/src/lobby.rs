//! Room registry.
//!
//! A lobby hands out room ids, caps how many sessions run at once and
//! routes player requests to the right session.

use std::collections::BTreeMap;
use std::sync::Arc;

use arena_core::components::{CardId, SideId};
use arena_core::data::CardCatalog;
use arena_core::error::GameError;
use arena_core::facade::DeployCommand;
use tokio::sync::broadcast;
use tracing::info;

use crate::session::{spawn_session, SessionEvent, SessionHandle};
use crate::{ServerConfig, SessionError};

/// Room identifier, unique per lobby.
pub type RoomId = u64;

/// Registry of running sessions.
#[derive(Debug)]
pub struct Lobby {
    catalog: Arc<CardCatalog>,
    config: ServerConfig,
    rooms: BTreeMap<RoomId, SessionHandle>,
    next_room: RoomId,
}

impl Lobby {
    /// Create an empty lobby.
    #[must_use]
    pub fn new(catalog: Arc<CardCatalog>, config: ServerConfig) -> Self {
        Self {
            catalog,
            config,
            rooms: BTreeMap::new(),
            next_room: 1,
        }
    }

    /// Open a room with `bots` seats taken by decision agents.
    ///
    /// Finished rooms are dropped first. Fails with [`GameError::RoomFull`]
    /// when `max_rooms` sessions are still running.
    pub fn create_room(&mut self, bots: usize) -> Result<RoomId, GameError> {
        self.prune_finished();
        if self.rooms.len() >= self.config.max_rooms {
            return Err(GameError::RoomFull);
        }

        let room = self.next_room;
        self.next_room += 1;

        let mut config = self.config.clone();
        config.match_config.seed = config.match_config.seed.wrapping_add(room);
        let handle = spawn_session(Arc::clone(&self.catalog), &config, bots);
        self.rooms.insert(room, handle);

        info!(room, bots, "Room created");
        Ok(room)
    }

    /// Take a seat in `room`.
    pub async fn join(&self, room: RoomId, deck: Vec<CardId>) -> Result<SideId, SessionError> {
        self.room(room)?.join(deck).await
    }

    /// Play a card in `room`.
    pub async fn deploy(&self, room: RoomId, command: DeployCommand) -> Result<(), SessionError> {
        self.room(room)?.deploy(command).await
    }

    /// Follow snapshots and the result of `room`.
    pub fn subscribe(&self, room: RoomId) -> Result<broadcast::Receiver<SessionEvent>, SessionError> {
        Ok(self.room(room)?.subscribe())
    }

    /// Stop and forget `room`. Closing an unknown or closed room is a no-op.
    pub async fn close(&mut self, room: RoomId) {
        if let Some(handle) = self.rooms.remove(&room) {
            handle.stop().await;
            info!(room, "Room closed");
        }
    }

    /// Stop every room.
    pub async fn close_all(&mut self) {
        let rooms: Vec<RoomId> = self.rooms.keys().copied().collect();
        for room in rooms {
            self.close(room).await;
        }
    }

    /// Handle of a room.
    pub fn room(&self, room: RoomId) -> Result<&SessionHandle, SessionError> {
        self.rooms.get(&room).ok_or(SessionError::UnknownRoom(room))
    }

    /// Number of tracked rooms, including finished ones not yet pruned.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Forget rooms whose session has ended.
    pub fn prune_finished(&mut self) {
        self.rooms.retain(|_, handle| !handle.is_closed());
    }
}
