use anyhow::Result;
use clap::Parser;
use client_core::{GameClient, GameHandle, GameView, Notification};
use shared::domain::{BotDifficulty, Card, GamePhase, PlayerId, Rank, Suit};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing::warn;

mod config;

#[derive(Parser, Debug)]
struct Args {
    /// Room code to join on startup.
    #[arg(long)]
    room: Option<String>,
    /// Overrides the configured server URL.
    #[arg(long)]
    server_url: Option<String>,
    /// Overrides the configured session token.
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(url) = args.server_url {
        settings.server_url = url;
    }
    if let Some(token) = args.token {
        settings.auth_token = Some(token);
    }

    let client = GameClient::new();
    client
        .open(&settings.server_url, settings.auth_token.as_deref())
        .await?;
    println!("Connected to {}", settings.server_url);

    if let Some(room) = &args.room {
        client.join_game(room).await;
    }

    let mut view = client.watch_view();
    let mut notifications = client.subscribe_notifications();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&view.borrow());
            }
            notification = notifications.recv() => {
                match notification {
                    Ok(notification) => render_notification(&notification),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("dropped {skipped} notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(client.as_ref(), line.trim()).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    client.close().await;
    Ok(())
}

fn render(view: &GameView) {
    let Some(game) = &view.game else {
        println!("-- no active match --");
        return;
    };

    println!("== room {} | {:?} | round {}/{} ==",
        game.room_code, game.phase, game.round_number, game.total_rounds);
    for player in &game.players {
        let marks = format!(
            "{}{}{}",
            if Some(&player.id) == game.current_player_id.as_ref() { "*" } else { "" },
            if player.is_bot { "B" } else { "" },
            if player.is_connected { "" } else { "!" },
        );
        println!(
            "  {:12} bid={:?} tricks={} score={} {}",
            player.display_name, player.bid, player.tricks_won, player.score, marks
        );
    }
    if let Some(trump) = &game.trump_suit {
        println!("  trump: {trump}");
    }
    if let Some(resolved) = &view.last_trick {
        println!("  trick won by {}", resolved.winner_id);
    } else if !game.current_trick.is_empty() {
        let plays: Vec<String> = game
            .current_trick
            .iter()
            .map(|tc| format!("{}:{}", tc.player_id, tc.card))
            .collect();
        println!("  trick: {}", plays.join("  "));
    }
    if let Some(notice) = &view.last_timeout {
        println!("  {} timed out", notice.display_name);
    }
    if !game.hand.is_empty() {
        let hand: Vec<String> = game.hand.iter().map(|c| c.to_string()).collect();
        println!("  hand: {}", hand.join(", "));
    }
    if game.phase == GamePhase::Bidding && !game.valid_bids.is_empty() {
        println!("  your bid ({:?}): bid <n>", game.valid_bids);
    }
    if game.phase == GamePhase::Playing && !game.valid_cards.is_empty() {
        let playable: Vec<String> = game.valid_cards.iter().map(|c| c.to_string()).collect();
        println!("  your play ({}): play <rank> <suit>", playable.join(", "));
    }
    if let Some(summary) = &view.game_over {
        match &summary.winner_id {
            Some(winner) => println!("  GAME OVER, winner: {winner}"),
            None => println!("  GAME OVER"),
        }
    }
}

fn render_notification(notification: &Notification) {
    match notification {
        Notification::Chat {
            display_name,
            message,
            ..
        } => println!("[chat] {display_name}: {message}"),
        Notification::GameError(message) => println!("[server] {message}"),
        Notification::ProtocolError(message) => warn!("{message}"),
        Notification::ConnectionLost(reason) => println!("[connection lost] {reason}"),
        Notification::Disconnected => println!("[disconnected]"),
    }
}

async fn handle_line(client: &GameClient, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("join") => match parts.next() {
            Some(room) => client.join_game(room).await,
            None => println!("usage: join <room-code>"),
        },
        Some("create") => client.create_game(None).await,
        Some("start") => client.start_game().await,
        Some("leave") => client.leave_game().await,
        Some("bid") => match parts.next().and_then(|raw| raw.parse().ok()) {
            Some(bid) => client.place_bid(bid).await,
            None => println!("usage: bid <n>"),
        },
        Some("play") => match parse_card(parts.next(), parts.next()) {
            Some(card) => client.play_card(card).await,
            None => println!("usage: play <rank> <suit>"),
        },
        Some("bot") => {
            let difficulty = match parts.next() {
                Some("intermediate") => BotDifficulty::Intermediate,
                _ => BotDifficulty::Basic,
            };
            client.add_bot(difficulty).await;
        }
        Some("unbot") => match parts.next() {
            Some(id) => client.remove_bot(PlayerId::from(id)).await,
            None => println!("usage: unbot <player-id>"),
        },
        Some("chat") => {
            let message = line.trim_start_matches("chat").trim();
            if !message.is_empty() {
                client.send_chat(message).await;
            }
        }
        Some("quit") => return false,
        Some(other) => println!("unknown command '{other}'"),
        None => {}
    }
    true
}

fn parse_card(rank: Option<&str>, suit: Option<&str>) -> Option<Card> {
    let rank: Rank = rank?.parse().ok()?;
    let suit: Suit = suit?.parse().ok()?;
    Some(Card::new(suit, rank))
}
