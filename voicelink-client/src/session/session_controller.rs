use crate::channel::{
    ChannelConnector, ChannelEvent, ChannelEventKind, ChannelEventSender, ChannelHandle,
    ChannelTarget, WsConnector,
};
use crate::error::SessionError;
use crate::negotiation::{NegotiationEngine, RelayOutput};
use crate::peer::{PeerEvent, PeerEventKind, PeerSessionFactory};
use crate::reconnect::{ReconnectConfig, ReconnectionPolicy, RetryDecision};
use crate::session::{SessionCommand, SessionEvent};
use crate::transport::{MediaCapture, TransportConfig, WebRtcSessionFactory};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use voicelink_core::{ConnectionStatus, PeerConnectionState, Role, Room, SignalMessage};

/// Everything needed to run a call against a real relay.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base url of the relay, e.g. `ws://localhost:3000`.
    pub relay_url: String,
    pub transport: TransportConfig,
    pub reconnect: ReconnectConfig,
}

impl SessionConfig {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            transport: TransportConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Spawns a session that talks WebSocket to the relay and WebRTC to
    /// the peer.
    pub fn spawn(
        self,
        capture: Option<Arc<dyn MediaCapture>>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        spawn_session(
            self.reconnect,
            Arc::new(WsConnector::new(self.relay_url)),
            Arc::new(WebRtcSessionFactory::new(self.transport, capture)),
        )
    }
}

/// Cloneable front end of a running [`SessionController`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn join(&self, room_id: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::Join(room_id.into())).await
    }

    pub async fn leave(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Leave).await
    }

    pub async fn reconnect(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Reconnect).await
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::ControllerStopped)
    }
}

/// Starts a [`SessionController`] on the current runtime.
pub fn spawn_session(
    reconnect: ReconnectConfig,
    connector: Arc<dyn ChannelConnector>,
    factory: Arc<dyn PeerSessionFactory>,
) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
    let (command_tx, command_rx) = mpsc::channel(64);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let controller = SessionController::new(reconnect, connector, factory, command_rx, events_tx);
    tokio::spawn(async move {
        controller.run().await;
    });

    (SessionHandle { command_tx }, events_rx)
}

/// The session actor.
///
/// Owns the room, the relay channel, the negotiation engine and the retry
/// policy. Commands, channel events, peer events and the retry timer are
/// handled one at a time by [`SessionController::run`], so no two of them
/// ever interleave.
pub struct SessionController {
    connector: Arc<dyn ChannelConnector>,
    engine: NegotiationEngine,
    policy: ReconnectionPolicy,

    room: Option<Room>,
    status: ConnectionStatus,

    /// Current relay channel and its generation. Events tagged with any
    /// other generation come from a socket that was already replaced.
    channel: Option<ChannelHandle>,
    generation: u64,

    /// When the next reconnection attempt is due.
    retry_at: Option<Instant>,

    /// The microphone error was already shown for this call.
    media_reported: bool,

    command_rx: mpsc::Receiver<SessionCommand>,
    channel_rx: mpsc::Receiver<ChannelEvent>,
    channel_tx: mpsc::Sender<ChannelEvent>,
    peer_rx: mpsc::Receiver<PeerEvent>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        reconnect: ReconnectConfig,
        connector: Arc<dyn ChannelConnector>,
        factory: Arc<dyn PeerSessionFactory>,
        command_rx: mpsc::Receiver<SessionCommand>,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (channel_tx, channel_rx) = mpsc::channel(256);
        let (peer_tx, peer_rx) = mpsc::channel(256);

        Self {
            connector,
            engine: NegotiationEngine::new(factory, peer_tx),
            policy: ReconnectionPolicy::new(reconnect),
            room: None,
            status: ConnectionStatus::Disconnected,
            channel: None,
            generation: 0,
            retry_at: None,
            media_reported: false,
            command_rx,
            channel_rx,
            channel_tx,
            peer_rx,
            events_tx,
        }
    }

    pub async fn run(mut self) {
        info!("Session event loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down session.");
                            break;
                        }
                    }
                }

                Some(evt) = self.channel_rx.recv() => {
                    self.handle_channel_event(evt).await;
                }

                Some(evt) = self.peer_rx.recv() => {
                    self.handle_peer_event(evt).await;
                }

                _ = retry_timer(self.retry_at) => {
                    self.retry_at = None;
                    self.open_channel().await;
                }
            }
        }

        self.teardown(true).await;
        info!("Session event loop finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join(room_id) => self.join(&room_id).await,
            SessionCommand::Leave => self.leave().await,
            SessionCommand::Reconnect => self.reconnect().await,
        }
    }

    async fn join(&mut self, room_id: &str) {
        if self.room.is_some() {
            info!("Already in a room, leaving it before joining");
            self.leave().await;
        }

        let room = Room::for_join(room_id);
        match room.id() {
            Some(id) => {
                self.notice("Joining call...");
                self.emit(SessionEvent::RoomAssigned(id.clone()));
            }
            None => self.notice("Creating new room..."),
        }
        info!("Joining as {}", room.role());

        self.room = Some(room);
        self.policy.reset();
        self.open_channel().await;
    }

    /// Leaves the room. Safe to call any number of times.
    async fn leave(&mut self) {
        if self.room.is_none() && self.channel.is_none() {
            debug!("Leave on an idle session ignored");
            return;
        }

        self.notice("Leaving call...");
        self.teardown(true).await;
        self.set_status(ConnectionStatus::Disconnected);
        self.emit(SessionEvent::Left);
    }

    async fn reconnect(&mut self) {
        if self.room.is_none() {
            warn!("Reconnect requested without a room");
            self.notice("Not in a room, nothing to reconnect");
            return;
        }

        self.notice("Attempting to reconnect...");
        self.retry_at = None;
        self.open_channel().await;
    }

    /// Replaces the relay channel with a new one for the current room.
    ///
    /// The negotiation engine is left alone: a reopened channel resumes the
    /// call, it does not restart it.
    async fn open_channel(&mut self) {
        let Some(target) = self.room.as_ref().map(ChannelTarget::from) else {
            return;
        };

        self.close_channel();
        self.set_status(ConnectionStatus::Connecting);

        let events = ChannelEventSender::new(self.generation, self.channel_tx.clone());
        match self.connector.open(&target, events).await {
            Ok(handle) => self.channel = Some(handle),
            Err(e) => {
                warn!("Failed to open relay channel: {}", e);
                self.on_channel_lost(e.to_string()).await;
            }
        }
    }

    /// Drops the current channel. Anything it still reports is stale from
    /// here on.
    fn close_channel(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
        self.generation += 1;
    }

    async fn handle_channel_event(&mut self, evt: ChannelEvent) {
        if evt.generation != self.generation {
            debug!(
                event_generation = evt.generation,
                generation = self.generation,
                "Ignoring event from a replaced relay channel"
            );
            return;
        }

        match evt.kind {
            ChannelEventKind::Opened => {
                self.policy.on_channel_opened();
                self.retry_at = None;
                self.set_status(ConnectionStatus::Connected);
                if let Some(room) = &self.room {
                    let msg = format!("Connected to relay as {}", room.role());
                    self.notice(msg);
                }
            }
            ChannelEventKind::MessageReceived(msg) => self.handle_message(msg).await,
            ChannelEventKind::ErrorOccurred(reason) => {
                warn!("Relay channel error: {}", reason);
            }
            ChannelEventKind::Closed(reason) => {
                self.channel = None;
                if let Some(room) = &self.room {
                    let msg = format!("{} connection lost", capitalized(room.role()));
                    self.notice(msg);
                }
                self.on_channel_lost(reason).await;
            }
        }
    }

    async fn on_channel_lost(&mut self, reason: String) {
        match self.policy.on_channel_closed(&reason) {
            RetryDecision::Retry { attempt, delay } => {
                self.retry_at = Some(Instant::now() + delay);
                self.set_status(ConnectionStatus::Connecting);
                self.emit(SessionEvent::Reconnecting { attempt, delay });
            }
            RetryDecision::GiveUp { attempts } => {
                error!("Relay unreachable after {} attempts", attempts);
                self.emit(SessionEvent::Error(format!(
                    "Failed to reconnect after {attempts} attempts"
                )));
                self.teardown(false).await;
                self.set_status(ConnectionStatus::Failed);
            }
        }
    }

    async fn handle_message(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::RoomCreated(id) => {
                let Some(room) = self.room.as_mut() else {
                    return;
                };
                if room.assign_id(id.clone()) {
                    self.emit(SessionEvent::RoomAssigned(id));
                    self.notice("Room created! Share the room id to start the call");
                } else if room.id() == Some(&id) {
                    debug!("Relay confirmed room {}", id);
                } else {
                    warn!("Relay announced room {}, keeping the current one", id);
                }
            }
            SignalMessage::UserDisconnected => {
                self.notice("Other user disconnected");
            }
            SignalMessage::RoomNotFound => self.fail_room("Room not found").await,
            SignalMessage::RoomClosed => self.fail_room("Room closed").await,
            SignalMessage::CalleeJoined(_) | SignalMessage::CalleeReconnected(_) => {
                if self.room.as_ref().map(Room::role) != Some(Role::Caller) {
                    warn!("Ignoring {} on the callee side", msg.tag());
                    return;
                }
                let notice = match &msg {
                    SignalMessage::CalleeJoined(_) => "Callee joined",
                    _ => "Callee reconnected",
                };
                self.notice(notice);
                self.negotiate(msg).await;
            }
            SignalMessage::Offer(_) | SignalMessage::Answer(_) | SignalMessage::IceCandidate(_) => {
                self.negotiate(msg).await;
            }
        }
    }

    async fn negotiate(&mut self, msg: SignalMessage) {
        let out = RelayOutput(self.channel.as_ref());
        if let Err(e) = self.engine.handle_signal(msg, &out).await {
            error!("Negotiation failed: {}", e);
            self.emit(SessionEvent::Error(
                "Error establishing connection. Please try again.".to_owned(),
            ));
        }
    }

    async fn handle_peer_event(&mut self, evt: PeerEvent) {
        if !self.engine.is_current(&evt) {
            debug!(epoch = evt.epoch, "Ignoring event from a closed peer session");
            return;
        }

        match &evt.kind {
            PeerEventKind::ConnectionState(state) => {
                self.emit(SessionEvent::PeerConnection(*state));
                match state {
                    PeerConnectionState::Connected => self.notice("Call connected"),
                    PeerConnectionState::Failed => {
                        self.emit(SessionEvent::Error("Peer connection failed".to_owned()))
                    }
                    _ => {}
                }
            }
            PeerEventKind::RemoteTrack { kind, .. } => {
                self.emit(SessionEvent::RemoteTrack { kind: kind.clone() });
            }
            PeerEventKind::MediaUnavailable(_) if self.media_reported => {
                debug!("Microphone still unavailable");
            }
            PeerEventKind::MediaUnavailable(reason) => {
                self.media_reported = true;
                self.emit(SessionEvent::Error(format!(
                    "Error accessing microphone: {reason}. Continuing without it."
                )));
            }
            PeerEventKind::LocalCandidate(_) | PeerEventKind::IceConnectionState(_) => {}
        }

        let out = RelayOutput(self.channel.as_ref());
        if let Err(e) = self.engine.handle_peer_event(evt, &out).await {
            error!("Renegotiation failed: {}", e);
            self.emit(SessionEvent::Error(
                "Error establishing connection. Please try again.".to_owned(),
            ));
        }
    }

    async fn fail_room(&mut self, reason: &str) {
        warn!("{}", reason);
        self.emit(SessionEvent::Error(reason.to_owned()));
        self.teardown(false).await;
        self.set_status(ConnectionStatus::Disconnected);
        self.emit(SessionEvent::Left);
    }

    /// Releases the peer session, the channel and the room.
    async fn teardown(&mut self, notify_peer: bool) {
        if notify_peer {
            if let Some(channel) = self.channel.as_ref().filter(|c| c.is_open()) {
                if let Err(e) = channel.send(&SignalMessage::UserDisconnected) {
                    debug!("Could not tell the peer we are leaving: {}", e);
                }
            }
        }

        self.engine.reset().await;
        self.close_channel();
        self.policy.reset();
        self.retry_at = None;
        self.room = None;
        self.media_reported = false;
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            debug!("Status {:?} -> {:?}", self.status, status);
            self.status = status;
            self.emit(SessionEvent::StatusChanged(status));
        }
    }

    fn notice(&self, text: impl Into<String>) {
        self.emit(SessionEvent::Notice(text.into()));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}

async fn retry_timer(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn capitalized(role: Role) -> &'static str {
    match role {
        Role::Caller => "Caller",
        Role::Callee => "Callee",
    }
}
