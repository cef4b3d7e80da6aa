use std::sync::Arc;

use shared::domain::PlayerId;
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, watch, Mutex},
    task::JoinHandle,
};
use tracing::debug;

pub mod commands;
pub mod intake;
pub mod overlay;
pub mod state;
pub mod transport;

pub use commands::GameHandle;
pub use state::{Action, GameView};
use overlay::OverlayScheduler;
use state::reduce;
use transport::Connection;

/// Error type for engine operations. Commands are not fallible (sending while
/// disconnected is a silent no-op); only channel lifecycle is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0} (expected http, https, ws, or wss)")]
    InvalidScheme(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Out-of-band happenings the presentation layer may want to surface.
/// None of these are part of the durable match snapshot.
#[derive(Debug, Clone)]
pub enum Notification {
    Chat {
        player_id: PlayerId,
        display_name: String,
        message: String,
    },
    /// Server rejected a user intent; display-only, no state impact.
    GameError(String),
    /// A malformed inbound frame was dropped before reaching the reducer.
    ProtocolError(String),
    ConnectionLost(String),
    Disconnected,
}

/// The realtime game client: folds the server's event stream into a single
/// renderable [`GameView`] and forwards user intents back out.
///
/// All inbound events and timer firings funnel into one ordered action queue
/// consumed by a single loop, so snapshots are produced strictly in arrival
/// order. Readers observe snapshots through a watch channel and never hold a
/// reference into live state.
pub struct GameClient {
    connection: Mutex<Option<Connection>>,
    actions: mpsc::UnboundedSender<Action>,
    view: watch::Receiver<GameView>,
    notifications: broadcast::Sender<Notification>,
    action_loop: JoinHandle<()>,
}

impl GameClient {
    pub fn new() -> Arc<Self> {
        let (actions, action_queue) = mpsc::unbounded_channel();
        let (view_writer, view) = watch::channel(GameView::default());
        let (notifications, _) = broadcast::channel(256);

        let action_loop = spawn_action_loop(
            action_queue,
            actions.clone(),
            view_writer,
            notifications.clone(),
        );

        Arc::new(Self {
            connection: Mutex::new(None),
            actions,
            view,
            notifications,
            action_loop,
        })
    }

    /// Open the channel to the game server, replacing any previous one.
    /// `token` is the opaque session credential; how it is obtained is out of
    /// this engine's scope.
    pub async fn open(&self, server_url: &str, token: Option<&str>) -> Result<()> {
        let url = transport::game_socket_url(server_url, token)?;
        let connection = Connection::open(
            url,
            self.actions.clone(),
            self.notifications.clone(),
        )
        .await?;

        let previous = self.connection.lock().await.replace(connection);
        if let Some(previous) = previous {
            previous.shutdown();
        }
        Ok(())
    }

    /// Tear down the channel. Held state is kept as-is: a later reconnect is
    /// expected to deliver a fresh full-state snapshot, which is always safe
    /// to apply.
    pub async fn close(&self) {
        if let Some(connection) = self.connection.lock().await.take() {
            connection.shutdown();
        }
    }

    /// Current snapshot plus change notifications. The watch channel has
    /// exactly one writer (the action loop); clones of this receiver are the
    /// only read path.
    pub fn watch_view(&self) -> watch::Receiver<GameView> {
        self.view.clone()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub(crate) async fn dispatch(&self, command: shared::protocol::ClientCommand) -> bool {
        let guard = self.connection.lock().await;
        match guard.as_ref() {
            Some(connection) => connection.send(command),
            None => {
                debug!("command dropped: no channel established");
                false
            }
        }
    }

    pub(crate) fn enqueue(&self, action: Action) {
        let _ = self.actions.send(action);
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.action_loop.abort();
    }
}

/// The single-threaded heart of the engine: one action at a time, in arrival
/// order. Timer firings enter the same queue as channel events, so whichever
/// was enqueued first is applied first.
fn spawn_action_loop(
    mut queue: mpsc::UnboundedReceiver<Action>,
    feedback: mpsc::UnboundedSender<Action>,
    view: watch::Sender<GameView>,
    notifications: broadcast::Sender<Notification>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut scheduler = OverlayScheduler::new(feedback);
        while let Some(action) = queue.recv().await {
            // Expiry firings from a superseded timer arming are discarded
            // before they can touch the snapshot.
            if !scheduler.admits(&action) {
                continue;
            }

            match &action {
                Action::Chat {
                    player_id,
                    display_name,
                    message,
                } => {
                    let _ = notifications.send(Notification::Chat {
                        player_id: player_id.clone(),
                        display_name: display_name.clone(),
                        message: message.clone(),
                    });
                }
                Action::ServerError(message) => {
                    let _ = notifications.send(Notification::GameError(message.clone()));
                }
                _ => {}
            }

            scheduler.observe(&action);
            view.send_modify(|current| {
                let previous = std::mem::take(current);
                *current = reduce(previous, action);
            });
        }
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
