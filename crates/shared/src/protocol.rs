use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        BotDifficulty, Card, GameConfigPatch, GamePhase, GameState, PlayerId, PlayerInfo,
        RoundScore, Suit, TrickCard,
    },
    error::GameError,
};

/// User intents, client → server. One message per intent; every visible
/// effect comes back later as a `ServerEvent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientCommand {
    JoinGame {
        room_code: String,
    },
    LeaveGame,
    CreateGame {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        config: Option<GameConfigPatch>,
    },
    StartGame,
    PlaceBid {
        bid: u8,
    },
    PlayCard {
        card: Card,
    },
    AddBot {
        difficulty: BotDifficulty,
    },
    RemoveBot {
        player_id: PlayerId,
    },
    UpdateConfig {
        config: GameConfigPatch,
    },
    SendChat {
        message: String,
    },
}

/// Authoritative facts, server → client. The client folds these into its
/// snapshot and never second-guesses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    GameState(Box<GameState>),
    CardsDealt {
        hand: Vec<Card>,
        trump_card: Option<Card>,
        trump_suit: Option<Suit>,
        hand_size: u8,
        round_number: u32,
    },
    YourTurn {
        #[serde(default)]
        valid_cards: Vec<Card>,
        #[serde(default)]
        valid_bids: Vec<u8>,
        time_remaining: u64,
    },
    PlayerJoined {
        player: PlayerInfo,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    PlayerReconnected {
        player_id: PlayerId,
    },
    BidPlaced {
        player_id: PlayerId,
        bid: u8,
        #[serde(default)]
        current_player_id: Option<PlayerId>,
        #[serde(default)]
        phase: Option<GamePhase>,
    },
    CardPlayed {
        player_id: PlayerId,
        card: Card,
        #[serde(default)]
        current_player_id: Option<PlayerId>,
    },
    TrickWon {
        winner_id: PlayerId,
        trick: Vec<TrickCard>,
    },
    RoundScored {
        scores: Vec<RoundScore>,
        round_number: u32,
    },
    GameOver {
        final_scores: Vec<RoundScore>,
        winner_id: Option<PlayerId>,
    },
    ChatMessage {
        player_id: PlayerId,
        display_name: String,
        message: String,
    },
    TurnTimedOut {
        player_id: PlayerId,
        display_name: String,
    },
    Error(GameError),
}
