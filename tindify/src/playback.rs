//! Typed model of the in-browser Spotify player.
//!
//! The browser forwards the SDK's `ready`, `not_ready`, `player_state_changed`
//! and error callbacks as [`PlayerEvent`] values. The bridge keeps track of the
//! device the SDK registered so a play command can be sent to it.

use std::{collections::HashMap, sync::Arc};

use futures::Stream;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast, watch};

use crate::clients::{
    SpotifyClient,
    entities::AccessCredential,
    errors::{Error, Result},
};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerErrorKind {
    Initialization,
    Authentication,
    Account,
    Playback,
}

/// Snapshot reported by the SDK on `player_state_changed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub paused: bool,
    #[serde(default)]
    pub position_ms: u64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub track_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    Ready {
        device_id: String,
    },
    NotReady {
        device_id: String,
    },
    StateChanged {
        state: Option<PlaybackState>,
    },
    Error {
        kind: PlayerErrorKind,
        message: String,
    },
}

/// What the bridge currently knows about its player
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStatus {
    pub device_id: Option<String>,
    pub ready: bool,
    pub playing: bool,
}

impl BridgeStatus {
    fn apply(&mut self, event: &PlayerEvent) {
        match event {
            PlayerEvent::Ready { device_id } => {
                self.device_id = Some(device_id.clone());
                self.ready = true;
            }
            PlayerEvent::NotReady { device_id } => {
                // a late event for a replaced device must not take the new one offline
                if self.device_id.as_deref() == Some(device_id.as_str()) {
                    self.ready = false;
                    self.playing = false;
                }
            }
            PlayerEvent::StateChanged { state: Some(state) } => {
                self.playing = !state.paused;
            }
            PlayerEvent::StateChanged { state: None } | PlayerEvent::Error { .. } => {}
        }
    }
}

/// One browser player: event fan-out plus readiness tracking.
///
/// Cloning yields another handle to the same player.
#[derive(Clone)]
pub struct PlaybackBridge {
    name: String,
    events: broadcast::Sender<PlayerEvent>,
    status: watch::Sender<BridgeStatus>,
}

impl PlaybackBridge {
    pub fn new(name: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (status, _) = watch::channel(BridgeStatus::default());
        PlaybackBridge {
            name: name.into(),
            events,
            status,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receiver for every event dispatched after this call
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Same as [`Self::subscribe`] as a stream; lagging subscribers skip what they missed
    pub fn events(&self) -> impl Stream<Item = PlayerEvent> + Send + use<> {
        let name = self.name.clone();
        futures::stream::unfold(self.subscribe(), move |mut rx| {
            let name = name.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(event) => return Some((event, rx)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Player {name} subscriber lagged, skipped {skipped} events");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        })
    }

    pub fn dispatch(&self, event: PlayerEvent) {
        match &event {
            PlayerEvent::Ready { device_id } => {
                info!("Player {} ready with device id {device_id}", self.name);
            }
            PlayerEvent::NotReady { device_id } => {
                info!("Player {} device {device_id} has gone offline", self.name);
            }
            PlayerEvent::StateChanged { state } => {
                debug!("Player {} state changed: {state:?}", self.name);
            }
            PlayerEvent::Error { kind, message } => {
                warn!("Player {} reported {kind:?} error: {message}", self.name);
            }
        }
        self.status.send_modify(|status| status.apply(&event));
        // nobody listening is fine, the status above is what play commands use
        let _ = self.events.send(event);
    }

    pub fn status(&self) -> BridgeStatus {
        self.status.borrow().clone()
    }

    /// Device id of the player, only while it is ready
    pub fn device_id(&self) -> Option<String> {
        let status = self.status.borrow();
        if status.ready {
            status.device_id.clone()
        } else {
            None
        }
    }

    /// Suspends until the player reports ready and returns its device id
    pub async fn wait_ready(&self) -> Option<String> {
        let mut rx = self.status.subscribe();
        rx.wait_for(|status| status.ready && status.device_id.is_some())
            .await
            .ok()
            .and_then(|status| status.device_id.clone())
    }

    /// Plays `uri` on this player's device
    pub async fn play(
        &self,
        client: &SpotifyClient,
        credential: &AccessCredential,
        uri: &str,
    ) -> Result<()> {
        let device_id = self
            .device_id()
            .ok_or_else(|| Error::PlayerNotReady(self.name.clone()))?;
        client.play_track(credential, &device_id, uri).await
    }
}

/// Upper bound on bridges held at once across all sessions
pub const MAX_PLAYERS: usize = 256;

/// One browser player of one signed-in session
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PlayerKey {
    owner: String,
    name: String,
}

impl PlayerKey {
    pub fn new(credential: &AccessCredential, name: impl Into<String>) -> Self {
        PlayerKey {
            owner: credential.bearer().to_string(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Bridges of every session, keyed by owner and the player name the browser chose.
///
/// A bridge is created by a `Ready` event and dropped when its device goes
/// offline or its owner signs out. At most `capacity` bridges are held.
#[derive(Clone)]
pub struct PlayerRegistry {
    players: Arc<RwLock<HashMap<PlayerKey, PlaybackBridge>>>,
    capacity: usize,
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::with_capacity(MAX_PLAYERS)
    }
}

impl PlayerRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        PlayerRegistry {
            players: Arc::default(),
            capacity,
        }
    }

    /// Existing bridge for `key`, or a fresh one while there is room
    pub async fn bridge(&self, key: &PlayerKey) -> Result<PlaybackBridge> {
        if let Some(bridge) = self.players.read().await.get(key) {
            return Ok(bridge.clone());
        }

        let mut players = self.players.write().await;
        if let Some(bridge) = players.get(key) {
            return Ok(bridge.clone());
        }
        if players.len() >= self.capacity {
            warn!(
                "Player registry full with {} players, refusing {}",
                players.len(),
                key.name
            );
            return Err(Error::PlayerLimitReached);
        }
        let bridge = PlaybackBridge::new(key.name.clone());
        players.insert(key.clone(), bridge.clone());
        Ok(bridge)
    }

    /// Routes a browser event to its bridge.
    ///
    /// Only `Ready` registers a player. Other events for an unknown player are
    /// dropped, and a `NotReady` that takes the device offline removes the bridge.
    pub async fn dispatch(&self, key: &PlayerKey, event: PlayerEvent) -> Result<()> {
        if matches!(event, PlayerEvent::Ready { .. }) {
            self.bridge(key).await?.dispatch(event);
            return Ok(());
        }

        let Some(bridge) = self.get(key).await else {
            debug!("Dropping event for unregistered player {}", key.name);
            return Ok(());
        };
        let going_offline = matches!(event, PlayerEvent::NotReady { .. });
        bridge.dispatch(event);

        if going_offline {
            let mut players = self.players.write().await;
            // a Ready may have slipped in since the dispatch above
            if players.get(key).is_some_and(|bridge| !bridge.status().ready) {
                players.remove(key);
                debug!("Player {} unregistered", key.name);
            }
        }
        Ok(())
    }

    pub async fn get(&self, key: &PlayerKey) -> Option<PlaybackBridge> {
        self.players.read().await.get(key).cloned()
    }

    /// Drops every bridge of the credential's session and returns how many went
    pub async fn remove_owner(&self, credential: &AccessCredential) -> usize {
        let mut players = self.players.write().await;
        let before = players.len();
        players.retain(|key, _| key.owner != credential.bearer());
        before - players.len()
    }

    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn ready(device_id: &str) -> PlayerEvent {
        PlayerEvent::Ready {
            device_id: device_id.to_string(),
        }
    }

    #[test]
    fn events_use_type_tag() {
        let event: PlayerEvent =
            serde_json::from_str(r#"{"type":"ready","device_id":"dev-1"}"#).unwrap();
        assert_eq!(event, ready("dev-1"));

        let event: PlayerEvent =
            serde_json::from_str(r#"{"type":"state_changed","state":{"paused":false}}"#).unwrap();
        assert_eq!(
            event,
            PlayerEvent::StateChanged {
                state: Some(PlaybackState {
                    paused: false,
                    position_ms: 0,
                    duration_ms: 0,
                    track_uri: None,
                })
            }
        );

        let event: PlayerEvent = serde_json::from_str(
            r#"{"type":"error","kind":"authentication","message":"bad token"}"#,
        )
        .unwrap();
        assert!(matches!(
            event,
            PlayerEvent::Error {
                kind: PlayerErrorKind::Authentication,
                ..
            }
        ));
    }

    #[test]
    fn device_id_only_while_ready() {
        let bridge = PlaybackBridge::new("web");
        assert_eq!(bridge.device_id(), None);

        bridge.dispatch(ready("dev-1"));
        assert_eq!(bridge.device_id().as_deref(), Some("dev-1"));

        bridge.dispatch(PlayerEvent::NotReady {
            device_id: "dev-1".into(),
        });
        assert_eq!(bridge.device_id(), None);
    }

    #[test]
    fn stale_not_ready_keeps_new_device() {
        let bridge = PlaybackBridge::new("web");
        bridge.dispatch(ready("dev-1"));
        bridge.dispatch(ready("dev-2"));
        bridge.dispatch(PlayerEvent::NotReady {
            device_id: "dev-1".into(),
        });
        assert_eq!(bridge.device_id().as_deref(), Some("dev-2"));
    }

    #[test]
    fn state_changes_track_playing() {
        let bridge = PlaybackBridge::new("web");
        bridge.dispatch(ready("dev-1"));
        bridge.dispatch(PlayerEvent::StateChanged {
            state: Some(PlaybackState {
                paused: false,
                position_ms: 1200,
                duration_ms: 30_000,
                track_uri: Some("spotify:track:t1".into()),
            }),
        });
        assert!(bridge.status().playing);

        // null state (another device took over) leaves the flag alone
        bridge.dispatch(PlayerEvent::StateChanged { state: None });
        assert!(bridge.status().playing);
    }

    #[tokio::test]
    async fn subscribers_see_dispatched_events() {
        let bridge = PlaybackBridge::new("web");
        let mut rx = bridge.subscribe();
        let mut stream = std::pin::pin!(bridge.events());

        bridge.dispatch(ready("dev-1"));

        assert_eq!(rx.recv().await.unwrap(), ready("dev-1"));
        assert_eq!(stream.next().await, Some(ready("dev-1")));
    }

    #[tokio::test]
    async fn wait_ready_resolves_on_ready_event() {
        let bridge = PlaybackBridge::new("web");
        let waiter = {
            let bridge = bridge.clone();
            tokio::spawn(async move { bridge.wait_ready().await })
        };

        tokio::task::yield_now().await;
        bridge.dispatch(ready("dev-9"));

        assert_eq!(waiter.await.unwrap().as_deref(), Some("dev-9"));
    }

    fn session(token: &str) -> AccessCredential {
        AccessCredential::new(token, None).unwrap()
    }

    #[tokio::test]
    async fn registry_reuses_bridges() {
        let registry = PlayerRegistry::default();
        let key = PlayerKey::new(&session("alice"), "web");
        registry.dispatch(&key, ready("dev-1")).await.unwrap();

        let again = registry.get(&key).await.unwrap();
        assert_eq!(again.device_id().as_deref(), Some("dev-1"));
        assert_eq!(again.name(), "web");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_sharing_a_player_name_stay_apart() {
        let registry = PlayerRegistry::default();
        let alice = PlayerKey::new(&session("alice"), "web");
        let bob = PlayerKey::new(&session("bob"), "web");

        registry.dispatch(&alice, ready("alice-device")).await.unwrap();
        registry.dispatch(&bob, ready("bob-device")).await.unwrap();

        let device = registry.get(&alice).await.unwrap().device_id();
        assert_eq!(device.as_deref(), Some("alice-device"));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn not_ready_unregisters_player() {
        let registry = PlayerRegistry::default();
        let key = PlayerKey::new(&session("alice"), "web");
        registry.dispatch(&key, ready("dev-1")).await.unwrap();

        // stale device, the bridge stays
        registry
            .dispatch(&key, PlayerEvent::NotReady { device_id: "dev-0".into() })
            .await
            .unwrap();
        assert!(registry.get(&key).await.is_some());

        registry
            .dispatch(&key, PlayerEvent::NotReady { device_id: "dev-1".into() })
            .await
            .unwrap();
        assert!(registry.get(&key).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn only_ready_registers_a_player() {
        let registry = PlayerRegistry::default();
        let key = PlayerKey::new(&session("alice"), "web");

        registry
            .dispatch(&key, PlayerEvent::StateChanged { state: None })
            .await
            .unwrap();
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn full_registry_refuses_new_players() {
        let registry = PlayerRegistry::with_capacity(2);
        let owner = session("alice");
        for name in ["one", "two"] {
            registry
                .dispatch(&PlayerKey::new(&owner, name), ready(name))
                .await
                .unwrap();
        }

        let result = registry
            .dispatch(&PlayerKey::new(&owner, "three"), ready("three"))
            .await;
        assert!(matches!(result, Err(Error::PlayerLimitReached)));

        // known players still get their events
        registry
            .dispatch(&PlayerKey::new(&owner, "one"), ready("one-again"))
            .await
            .unwrap();
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn sign_out_drops_only_own_players() {
        let registry = PlayerRegistry::default();
        let alice = session("alice");
        let bob = session("bob");
        registry
            .dispatch(&PlayerKey::new(&alice, "web"), ready("a1"))
            .await
            .unwrap();
        registry
            .dispatch(&PlayerKey::new(&alice, "phone"), ready("a2"))
            .await
            .unwrap();
        registry
            .dispatch(&PlayerKey::new(&bob, "web"), ready("b1"))
            .await
            .unwrap();

        assert_eq!(registry.remove_owner(&alice).await, 2);
        assert!(registry.get(&PlayerKey::new(&bob, "web")).await.is_some());
    }
}
