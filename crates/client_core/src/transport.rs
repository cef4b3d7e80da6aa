//! The owned channel handle and its pump tasks.
//!
//! One websocket per match session. The writer half is fed by an unbounded
//! command queue (the Command Emitter's only touchpoint) and the reader half
//! feeds Event Intake; neither direction shares mutable state with the other.

use futures::{SinkExt, StreamExt};
use shared::protocol::ClientCommand;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use url::Url;

use crate::{intake, state::Action, Notification, Result};

/// Derive the websocket endpoint from a server base URL, mapping http(s) to
/// ws(s) and attaching the opaque session credential when present.
pub fn game_socket_url(server_url: &str, token: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(server_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(crate::Error::InvalidScheme(other.to_string())),
    };
    // set_scheme only rejects invalid transitions; ws/wss are always fine here.
    let _ = url.set_scheme(scheme);
    url.set_path("/ws");
    url.set_query(token.map(|token| format!("token={token}")).as_deref());
    Ok(url)
}

/// An open channel to the game server. Dropping the handle does not close the
/// socket; call [`Connection::shutdown`].
pub struct Connection {
    outbound: mpsc::UnboundedSender<ClientCommand>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    pub(crate) async fn open(
        url: Url,
        actions: mpsc::UnboundedSender<Action>,
        notifications: broadcast::Sender<Notification>,
    ) -> Result<Self> {
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        info!(%url, "game channel established");
        let (mut ws_writer, mut ws_reader) = ws_stream.split();

        let (outbound, mut outbound_queue) = mpsc::unbounded_channel::<ClientCommand>();
        let writer = tokio::spawn(async move {
            while let Some(command) = outbound_queue.recv().await {
                let frame = match serde_json::to_string(&command) {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!("failed to encode outbound command: {err}");
                        continue;
                    }
                };
                if let Err(err) = ws_writer.send(Message::Text(frame)).await {
                    warn!("websocket send failed: {err}");
                    break;
                }
            }
            let _ = ws_writer.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(message) = ws_reader.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        intake::handle_frame(&text, &actions, &notifications);
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        let _ = notifications
                            .send(Notification::ConnectionLost(err.to_string()));
                        break;
                    }
                }
            }
            let _ = notifications.send(Notification::Disconnected);
        });

        Ok(Self {
            outbound,
            reader,
            writer,
        })
    }

    /// Queue one outbound message. Returns false if the writer is gone.
    pub(crate) fn send(&self, command: ClientCommand) -> bool {
        self.outbound.send(command).is_ok()
    }

    pub(crate) fn shutdown(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}
