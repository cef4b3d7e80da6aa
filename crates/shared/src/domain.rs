use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(PlayerId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
            Suit::Clubs => "clubs",
            Suit::Spades => "spades",
        };
        f.write_str(label)
    }
}

impl FromStr for Suit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hearts" | "h" => Ok(Suit::Hearts),
            "diamonds" | "d" => Ok(Suit::Diamonds),
            "clubs" | "c" => Ok(Suit::Clubs),
            "spades" | "s" => Ok(Suit::Spades),
            other => Err(format!("unknown suit '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "A")]
    Ace,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        };
        f.write_str(label)
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "2" => Ok(Rank::Two),
            "3" => Ok(Rank::Three),
            "4" => Ok(Rank::Four),
            "5" => Ok(Rank::Five),
            "6" => Ok(Rank::Six),
            "7" => Ok(Rank::Seven),
            "8" => Ok(Rank::Eight),
            "9" => Ok(Rank::Nine),
            "10" | "T" => Ok(Rank::Ten),
            "J" => Ok(Rank::Jack),
            "Q" => Ok(Rank::Queen),
            "K" => Ok(Rank::King),
            "A" => Ok(Rank::Ace),
            other => Err(format!("unknown rank '{other}'")),
        }
    }
}

/// A card from the standard 52-card deck. Equality is by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.rank, self.suit)
    }
}

/// Match progression phases, always server-asserted; the client never infers
/// a transition on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Lobby,
    Dealing,
    Bidding,
    Playing,
    Scoring,
    GameOver,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringVariant {
    Standard,
    Progressive,
    Basic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotDifficulty {
    Basic,
    Intermediate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub scoring_variant: ScoringVariant,
    pub hook_rule: bool,
    pub turn_timer_seconds: u16,
    pub max_players: u8,
    pub max_hand_size: Option<u8>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scoring_variant: ScoringVariant::Standard,
            hook_rule: true,
            turn_timer_seconds: 30,
            max_players: 7,
            max_hand_size: None,
        }
    }
}

/// Partial config for `create_game`/`update_config`; absent fields keep the
/// server-side value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_variant: Option<ScoringVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_rule: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_timer_seconds: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hand_size: Option<u8>,
}

/// One seat at the table as every participant sees it. `card_count` stands in
/// for the hand itself, which the server only reveals to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub display_name: String,
    pub seat_index: u8,
    pub is_bot: bool,
    pub is_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub card_count: u8,
    pub bid: Option<u8>,
    pub tricks_won: u8,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrickCard {
    pub player_id: PlayerId,
    pub card: Card,
}

/// Per-player scoring record for one completed round; immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundScore {
    pub player_id: PlayerId,
    pub bid: u8,
    pub tricks_won: u8,
    pub round_points: i32,
    pub cumulative_score: i32,
}

/// The durable match snapshot, exactly as the server asserts it. `hand`,
/// `valid_cards` and `valid_bids` are already filtered to the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub room_code: String,
    pub phase: GamePhase,
    pub players: Vec<PlayerInfo>,
    pub host_id: PlayerId,
    pub my_id: PlayerId,
    pub hand: Vec<Card>,
    pub trump_card: Option<Card>,
    pub trump_suit: Option<Suit>,
    pub current_trick: Vec<TrickCard>,
    pub current_player_id: Option<PlayerId>,
    pub dealer_id: Option<PlayerId>,
    pub round_number: u32,
    pub hand_size: u8,
    pub total_rounds: u32,
    pub valid_cards: Vec<Card>,
    pub valid_bids: Vec<u8>,
    pub scores_history: Vec<Vec<RoundScore>>,
    pub config: GameConfig,
}

impl GameState {
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn is_my_turn(&self) -> bool {
        self.current_player_id.as_ref() == Some(&self.my_id)
    }
}
