//! Command emitter: user intents → outbound protocol messages.
//!
//! Stateless by contract: every visible effect of a command arrives later as
//! an inbound event. The single exception is `leave_game`, which also resets
//! local state immediately so leaving never waits on a round trip. Commands
//! issued with no channel open are silent no-ops.

use async_trait::async_trait;

use shared::{
    domain::{BotDifficulty, Card, GameConfigPatch, PlayerId},
    protocol::ClientCommand,
};
use tokio::sync::{broadcast, watch};

use crate::{state::Action, GameClient, GameView, Notification};

/// Outbound chat is clamped to this many characters before transmission.
pub const MAX_CHAT_LEN: usize = 200;

/// The engine surface the presentation layer holds, usually as
/// `Arc<dyn GameHandle>`.
#[async_trait]
pub trait GameHandle: Send + Sync {
    async fn join_game(&self, room_code: &str);
    async fn leave_game(&self);
    async fn create_game(&self, config: Option<GameConfigPatch>);
    async fn start_game(&self);
    async fn place_bid(&self, bid: u8);
    async fn play_card(&self, card: Card);
    async fn add_bot(&self, difficulty: BotDifficulty);
    async fn remove_bot(&self, player_id: PlayerId);
    async fn update_config(&self, config: GameConfigPatch);
    async fn send_chat(&self, message: &str);
    fn watch_view(&self) -> watch::Receiver<GameView>;
    fn subscribe_notifications(&self) -> broadcast::Receiver<Notification>;
}

#[async_trait]
impl GameHandle for GameClient {
    async fn join_game(&self, room_code: &str) {
        self.dispatch(ClientCommand::JoinGame {
            room_code: room_code.to_string(),
        })
        .await;
    }

    async fn leave_game(&self) {
        self.dispatch(ClientCommand::LeaveGame).await;
        // Local state resets regardless of whether the message went out.
        self.enqueue(Action::Reset);
    }

    async fn create_game(&self, config: Option<GameConfigPatch>) {
        self.dispatch(ClientCommand::CreateGame { config }).await;
    }

    async fn start_game(&self) {
        self.dispatch(ClientCommand::StartGame).await;
    }

    async fn place_bid(&self, bid: u8) {
        self.dispatch(ClientCommand::PlaceBid { bid }).await;
    }

    async fn play_card(&self, card: Card) {
        self.dispatch(ClientCommand::PlayCard { card }).await;
    }

    async fn add_bot(&self, difficulty: BotDifficulty) {
        self.dispatch(ClientCommand::AddBot { difficulty }).await;
    }

    async fn remove_bot(&self, player_id: PlayerId) {
        self.dispatch(ClientCommand::RemoveBot { player_id }).await;
    }

    async fn update_config(&self, config: GameConfigPatch) {
        self.dispatch(ClientCommand::UpdateConfig { config }).await;
    }

    async fn send_chat(&self, message: &str) {
        let message: String = message.chars().take(MAX_CHAT_LEN).collect();
        self.dispatch(ClientCommand::SendChat { message }).await;
    }

    fn watch_view(&self) -> watch::Receiver<GameView> {
        GameClient::watch_view(self)
    }

    fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        GameClient::subscribe_notifications(self)
    }
}
