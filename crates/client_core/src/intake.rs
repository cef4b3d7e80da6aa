//! Event intake: one raw frame in, at most one tagged action out.
//!
//! Decode failures are reported and dropped here; a malformed frame never
//! reaches the reducer. Delivery order is preserved as-is, without batching
//! or deduplication.

use std::time::{Duration, Instant};

use shared::protocol::ServerEvent;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use crate::{state::Action, Notification};

pub fn handle_frame(
    text: &str,
    actions: &mpsc::UnboundedSender<Action>,
    notifications: &broadcast::Sender<Notification>,
) {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => {
            let _ = actions.send(action_from_event(event));
        }
        Err(err) => {
            warn!("dropping malformed server event: {err}");
            let _ = notifications.send(Notification::ProtocolError(format!(
                "invalid server event: {err}"
            )));
        }
    }
}

/// Exhaustive event-to-action mapping. The relative `time_remaining` of a
/// turn grant is converted to an absolute deadline here so the reducer never
/// reads a clock.
pub fn action_from_event(event: ServerEvent) -> Action {
    match event {
        ServerEvent::GameState(state) => Action::StateReplaced(state),
        ServerEvent::CardsDealt {
            hand,
            trump_card,
            trump_suit,
            hand_size,
            round_number,
        } => Action::CardsDealt {
            hand,
            trump_card,
            trump_suit,
            hand_size,
            round_number,
        },
        ServerEvent::YourTurn {
            valid_cards,
            valid_bids,
            time_remaining,
        } => Action::TurnGranted {
            valid_cards,
            valid_bids,
            deadline: Instant::now() + Duration::from_secs(time_remaining),
        },
        ServerEvent::PlayerJoined { player } => Action::PlayerJoined(player),
        ServerEvent::PlayerLeft { player_id } => Action::PlayerLeft(player_id),
        ServerEvent::PlayerReconnected { player_id } => Action::PlayerReconnected(player_id),
        ServerEvent::BidPlaced {
            player_id,
            bid,
            current_player_id,
            phase,
        } => Action::BidPlaced {
            player_id,
            bid,
            current_player_id,
            phase,
        },
        ServerEvent::CardPlayed {
            player_id,
            card,
            current_player_id,
        } => Action::CardPlayed {
            player_id,
            card,
            current_player_id,
        },
        ServerEvent::TrickWon { winner_id, trick } => Action::TrickWon { winner_id, trick },
        ServerEvent::RoundScored {
            scores,
            round_number,
        } => Action::RoundScored {
            scores,
            round_number,
        },
        ServerEvent::GameOver {
            final_scores,
            winner_id,
        } => Action::GameOver {
            final_scores,
            winner_id,
        },
        ServerEvent::ChatMessage {
            player_id,
            display_name,
            message,
        } => Action::Chat {
            player_id,
            display_name,
            message,
        },
        ServerEvent::TurnTimedOut {
            player_id,
            display_name,
        } => Action::TurnTimedOut {
            player_id,
            display_name,
        },
        ServerEvent::Error(err) => Action::ServerError(err.message),
    }
}
