//! Snapshot types and the pure reducer.
//!
//! The reducer is a plain function `(view, action) -> view` that performs no
//! I/O and never reads a clock. Everything time-dependent (expiry scheduling,
//! the turn deadline) is decided before an action reaches it.

use std::time::Instant;

use shared::domain::{
    Card, GamePhase, GameState, PlayerId, PlayerInfo, RoundScore, Suit, TrickCard,
};
use tracing::warn;

/// The just-won trick, kept on display until its expiry timer clears it or a
/// newer resolution supersedes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrick {
    pub winner_id: PlayerId,
    pub trick: Vec<TrickCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub scores: Vec<RoundScore>,
    pub round_number: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameOverSummary {
    pub final_scores: Vec<RoundScore>,
    pub winner_id: Option<PlayerId>,
}

/// Transient "player ran out of time" notice.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutNotice {
    pub player_id: PlayerId,
    pub display_name: String,
}

/// Everything the presentation layer reads: the durable match state plus the
/// self-expiring overlays derived from it. `game` is `None` before a match is
/// joined and again after leaving; leaving always restores this exact
/// baseline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameView {
    pub game: Option<GameState>,
    pub last_trick: Option<ResolvedTrick>,
    pub last_round_scores: Option<RoundSummary>,
    pub game_over: Option<GameOverSummary>,
    pub last_timeout: Option<TimeoutNotice>,
    /// Absolute deadline for the viewer's pending turn, if one is running.
    pub turn_deadline: Option<Instant>,
}

/// Internal action vocabulary: one variant per inbound event kind, plus the
/// expiry firings injected by the overlay scheduler and the local reset.
/// Matching is exhaustive by construction; there is no fallthrough arm.
#[derive(Debug, Clone)]
pub enum Action {
    StateReplaced(Box<GameState>),
    PlayerJoined(PlayerInfo),
    PlayerLeft(PlayerId),
    PlayerReconnected(PlayerId),
    BidPlaced {
        player_id: PlayerId,
        bid: u8,
        current_player_id: Option<PlayerId>,
        phase: Option<GamePhase>,
    },
    CardPlayed {
        player_id: PlayerId,
        card: Card,
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
    TurnGranted {
        valid_cards: Vec<Card>,
        valid_bids: Vec<u8>,
        deadline: Instant,
    },
    CardsDealt {
        hand: Vec<Card>,
        trump_card: Option<Card>,
        trump_suit: Option<Suit>,
        hand_size: u8,
        round_number: u32,
    },
    TurnTimedOut {
        player_id: PlayerId,
        display_name: String,
    },
    Chat {
        player_id: PlayerId,
        display_name: String,
        message: String,
    },
    ServerError(String),
    /// Expiry firing for the trick display; `epoch` identifies the arming it
    /// belongs to so a superseded firing can be discarded.
    TrickDisplayElapsed {
        epoch: u64,
    },
    /// Expiry firing for the timeout notice.
    TimeoutNoticeElapsed {
        epoch: u64,
    },
    Reset,
}

/// Apply one action, producing the next snapshot.
///
/// Actions that presuppose an active match are no-ops while `game` is `None`;
/// the server is free to race a broadcast against our join and the stray
/// event must not fabricate state.
pub fn reduce(mut view: GameView, action: Action) -> GameView {
    match action {
        Action::StateReplaced(state) => {
            view.game = Some(*state);
            view.last_trick = None;
        }
        Action::PlayerJoined(player) => {
            if let Some(game) = view.game.as_mut() {
                // Insert-or-replace by id: duplicate delivery is harmless.
                game.players.retain(|p| p.id != player.id);
                game.players.push(player);
                game.players.sort_by_key(|p| p.seat_index);
            }
        }
        Action::PlayerLeft(player_id) => {
            if let Some(game) = view.game.as_mut() {
                game.players.retain(|p| p.id != player_id);
            }
        }
        Action::PlayerReconnected(player_id) => {
            if let Some(game) = view.game.as_mut() {
                if let Some(player) = game.players.iter_mut().find(|p| p.id == player_id) {
                    player.is_connected = true;
                }
            }
        }
        Action::BidPlaced {
            player_id,
            bid,
            current_player_id,
            phase,
        } => {
            if let Some(game) = view.game.as_mut() {
                if let Some(player) = game.players.iter_mut().find(|p| p.id == player_id) {
                    player.bid = Some(bid);
                }
                // Turn order and phase are server-authoritative; whatever the
                // action carries wins over the locally held value.
                game.current_player_id = current_player_id;
                if let Some(phase) = phase {
                    game.phase = phase;
                }
                if player_id == game.my_id {
                    game.valid_bids.clear();
                    view.turn_deadline = None;
                }
            }
        }
        Action::CardPlayed {
            player_id,
            card,
            current_player_id,
        } => {
            if let Some(game) = view.game.as_mut() {
                if player_id == game.my_id {
                    match game.hand.iter().position(|c| *c == card) {
                        Some(index) => {
                            game.hand.remove(index);
                        }
                        None => warn!(
                            card = %card,
                            "played card missing from local hand; leaving hand unchanged"
                        ),
                    }
                    view.turn_deadline = None;
                }
                if let Some(player) = game.players.iter_mut().find(|p| p.id == player_id) {
                    player.card_count = player.card_count.saturating_sub(1);
                }
                game.current_trick.push(TrickCard { player_id, card });
                // A play always ends the viewer's eligibility to act until
                // the next grant, no matter whose play it was.
                game.valid_cards.clear();
                game.current_player_id = current_player_id;
            }
        }
        Action::TrickWon { winner_id, trick } => {
            if let Some(game) = view.game.as_mut() {
                game.current_trick.clear();
                if let Some(winner) = game.players.iter_mut().find(|p| p.id == winner_id) {
                    winner.tricks_won += 1;
                }
                view.last_trick = Some(ResolvedTrick { winner_id, trick });
            }
        }
        Action::RoundScored {
            scores,
            round_number,
        } => {
            // Display overlay only. The cumulative record inside the match
            // state is refreshed by the next full-state snapshot.
            view.last_round_scores = Some(RoundSummary {
                scores,
                round_number,
            });
        }
        Action::GameOver {
            final_scores,
            winner_id,
        } => {
            view.game_over = Some(GameOverSummary {
                final_scores,
                winner_id,
            });
        }
        Action::TurnGranted {
            valid_cards,
            valid_bids,
            deadline,
        } => {
            if let Some(game) = view.game.as_mut() {
                game.current_player_id = Some(game.my_id.clone());
                game.valid_cards = valid_cards;
                game.valid_bids = valid_bids;
                view.turn_deadline = Some(deadline);
            }
        }
        Action::CardsDealt {
            hand,
            trump_card,
            trump_suit,
            hand_size,
            round_number,
        } => {
            if let Some(game) = view.game.as_mut() {
                game.hand = hand;
                game.trump_card = trump_card;
                game.trump_suit = trump_suit;
                game.hand_size = hand_size;
                game.round_number = round_number;
                game.current_trick.clear();
                view.last_trick = None;
                view.last_round_scores = None;
            }
        }
        Action::TurnTimedOut {
            player_id,
            display_name,
        } => {
            view.last_timeout = Some(TimeoutNotice {
                player_id,
                display_name,
            });
        }
        // Surfaced through notifications by the action loop; no state impact.
        Action::Chat { .. } | Action::ServerError(_) => {}
        Action::TrickDisplayElapsed { .. } => {
            view.last_trick = None;
        }
        Action::TimeoutNoticeElapsed { .. } => {
            view.last_timeout = None;
        }
        Action::Reset => {
            view = GameView::default();
        }
    }
    view
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
