use super::*;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    routing::get,
    Router,
};
use shared::{
    domain::{Card, GameConfig, GamePhase, GameState, PlayerInfo, Rank, RoundScore, Suit, TrickCard},
    error::GameError,
    protocol::{ClientCommand, ServerEvent},
};
use tokio::{net::TcpListener, time::timeout};

fn pid(id: &str) -> PlayerId {
    PlayerId::from(id)
}

fn player(id: &str, seat: u8, card_count: u8) -> PlayerInfo {
    PlayerInfo {
        id: pid(id),
        display_name: format!("Player {id}"),
        seat_index: seat,
        is_bot: false,
        is_connected: true,
        avatar_url: None,
        card_count,
        bid: None,
        tricks_won: 0,
        score: 0,
    }
}

fn table(player_count: u8, cards_each: u8) -> GameState {
    GameState {
        room_code: "TEST".to_string(),
        phase: GamePhase::Bidding,
        players: (0..player_count)
            .map(|i| player(&format!("p{i}"), i, cards_each))
            .collect(),
        host_id: pid("p0"),
        my_id: pid("p0"),
        hand: Vec::new(),
        trump_card: None,
        trump_suit: None,
        current_trick: Vec::new(),
        current_player_id: None,
        dealer_id: Some(pid("p3")),
        round_number: 1,
        hand_size: cards_each,
        total_rounds: 25,
        valid_cards: Vec::new(),
        valid_bids: Vec::new(),
        scores_history: Vec::new(),
        config: GameConfig::default(),
    }
}

fn inject(client: &GameClient, event: ServerEvent) {
    client
        .actions
        .send(intake::action_from_event(event))
        .expect("action loop alive");
}

async fn wait_for(
    view: &mut watch::Receiver<GameView>,
    predicate: impl Fn(&GameView) -> bool,
) -> GameView {
    timeout(Duration::from_secs(5), async {
        loop {
            if predicate(&view.borrow()) {
                return view.borrow().clone();
            }
            view.changed().await.expect("view channel open");
        }
    })
    .await
    .expect("expected view transition")
}

#[tokio::test(start_paused = true)]
async fn trick_display_clears_after_fixed_delay() {
    let client = GameClient::new();
    let mut view = client.watch_view();

    inject(&client, ServerEvent::GameState(Box::new(table(4, 1))));
    let plays: Vec<TrickCard> = (0..4)
        .map(|i| TrickCard {
            player_id: pid(&format!("p{i}")),
            card: Card::new(Suit::Hearts, Rank::Two),
        })
        .collect();
    inject(
        &client,
        ServerEvent::TrickWon {
            winner_id: pid("p2"),
            trick: plays,
        },
    );

    let shown = wait_for(&mut view, |v| v.last_trick.is_some()).await;
    assert_eq!(
        shown.last_trick.as_ref().expect("trick display").winner_id,
        pid("p2")
    );

    tokio::time::sleep(overlay::TRICK_DISPLAY + Duration::from_millis(100)).await;
    let cleared = wait_for(&mut view, |v| v.last_trick.is_none()).await;
    // The expiry only touches the overlay: the credited trick stays.
    let game = cleared.game.expect("game present");
    assert_eq!(game.player(&pid("p2")).expect("p2").tricks_won, 1);
}

#[tokio::test(start_paused = true)]
async fn superseding_timeout_rearms_the_notice_timer() {
    let client = GameClient::new();
    let mut view = client.watch_view();

    inject(&client, ServerEvent::GameState(Box::new(table(4, 1))));
    inject(
        &client,
        ServerEvent::TurnTimedOut {
            player_id: pid("p1"),
            display_name: "Player p1".to_string(),
        },
    );
    wait_for(&mut view, |v| {
        v.last_timeout.as_ref().is_some_and(|n| n.player_id == pid("p1"))
    })
    .await;

    tokio::time::advance(Duration::from_secs(2)).await;
    inject(
        &client,
        ServerEvent::TurnTimedOut {
            player_id: pid("p2"),
            display_name: "Player p2".to_string(),
        },
    );
    wait_for(&mut view, |v| {
        v.last_timeout.as_ref().is_some_and(|n| n.player_id == pid("p2"))
    })
    .await;

    // The first arming would have expired by now; the replacement keeps the
    // notice alive until its own delay has run.
    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(view.borrow().last_timeout.is_some());

    tokio::time::advance(overlay::TIMEOUT_NOTICE).await;
    wait_for(&mut view, |v| v.last_timeout.is_none()).await;
}

#[tokio::test(start_paused = true)]
async fn leave_mid_timer_keeps_the_empty_baseline() {
    let client = GameClient::new();
    let mut view = client.watch_view();

    inject(&client, ServerEvent::GameState(Box::new(table(4, 1))));
    inject(
        &client,
        ServerEvent::TurnTimedOut {
            player_id: pid("p3"),
            display_name: "Player p3".to_string(),
        },
    );
    wait_for(&mut view, |v| v.last_timeout.is_some()).await;

    client.leave_game().await;
    wait_for(&mut view, |v| *v == GameView::default()).await;

    // No timer may fire after the reset and touch the fresh baseline.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(*view.borrow(), GameView::default());
}

#[tokio::test(start_paused = true)]
async fn single_card_round_runs_end_to_end() {
    let client = GameClient::new();
    let mut view = client.watch_view();
    let nine = Card::new(Suit::Spades, Rank::Nine);

    inject(&client, ServerEvent::GameState(Box::new(table(4, 1))));
    inject(
        &client,
        ServerEvent::CardsDealt {
            hand: vec![nine],
            trump_card: Some(Card::new(Suit::Hearts, Rank::Queen)),
            trump_suit: Some(Suit::Hearts),
            hand_size: 1,
            round_number: 1,
        },
    );
    let dealt = wait_for(&mut view, |v| {
        v.game.as_ref().is_some_and(|g| !g.hand.is_empty())
    })
    .await;
    assert_eq!(dealt.game.expect("game").hand, vec![nine]);

    // Bidding: granted the turn with bids 0..=2, we bid 1.
    inject(
        &client,
        ServerEvent::YourTurn {
            valid_cards: vec![],
            valid_bids: vec![0, 1, 2],
            time_remaining: 30,
        },
    );
    wait_for(&mut view, |v| {
        v.game.as_ref().is_some_and(|g| !g.valid_bids.is_empty())
    })
    .await;

    inject(
        &client,
        ServerEvent::BidPlaced {
            player_id: pid("p0"),
            bid: 1,
            current_player_id: Some(pid("p1")),
            phase: None,
        },
    );
    for (bidder, next, phase) in [
        ("p1", "p2", None),
        ("p2", "p3", None),
        ("p3", "p0", Some(GamePhase::Playing)),
    ] {
        inject(
            &client,
            ServerEvent::BidPlaced {
                player_id: pid(bidder),
                bid: 0,
                current_player_id: Some(pid(next)),
                phase,
            },
        );
    }
    let bids_done = wait_for(&mut view, |v| {
        v.game.as_ref().is_some_and(|g| g.phase == GamePhase::Playing)
    })
    .await;
    let game = bids_done.game.expect("game");
    assert!(game.valid_bids.is_empty());
    assert_eq!(game.player(&pid("p0")).expect("p0").bid, Some(1));

    // Playing: granted the turn with exactly the one card in hand.
    inject(
        &client,
        ServerEvent::YourTurn {
            valid_cards: vec![nine],
            valid_bids: vec![],
            time_remaining: 30,
        },
    );
    wait_for(&mut view, |v| {
        v.game.as_ref().is_some_and(|g| !g.valid_cards.is_empty())
    })
    .await;

    let plays = [
        ("p0", Card::new(Suit::Spades, Rank::Nine), "p1"),
        ("p1", Card::new(Suit::Spades, Rank::Four), "p2"),
        ("p2", Card::new(Suit::Spades, Rank::King), "p3"),
        ("p3", Card::new(Suit::Spades, Rank::Six), "p0"),
    ];
    for (actor, card, next) in plays {
        inject(
            &client,
            ServerEvent::CardPlayed {
                player_id: pid(actor),
                card,
                current_player_id: Some(pid(next)),
            },
        );
    }
    let played = wait_for(&mut view, |v| {
        v.game.as_ref().is_some_and(|g| g.current_trick.len() == 4)
    })
    .await;
    let game = played.game.expect("game");
    assert!(game.hand.is_empty());
    assert!(game.valid_cards.is_empty());

    let trick: Vec<TrickCard> = plays
        .iter()
        .map(|(actor, card, _)| TrickCard {
            player_id: pid(actor),
            card: *card,
        })
        .collect();
    inject(
        &client,
        ServerEvent::TrickWon {
            winner_id: pid("p2"),
            trick,
        },
    );
    let resolved = wait_for(&mut view, |v| v.last_trick.is_some()).await;
    let game = resolved.game.expect("game");
    assert!(game.current_trick.is_empty());
    assert_eq!(game.player(&pid("p2")).expect("p2").tricks_won, 1);

    inject(
        &client,
        ServerEvent::RoundScored {
            scores: vec![RoundScore {
                player_id: pid("p2"),
                bid: 0,
                tricks_won: 1,
                round_points: -1,
                cumulative_score: -1,
            }],
            round_number: 1,
        },
    );
    wait_for(&mut view, |v| v.last_round_scores.is_some()).await;

    tokio::time::sleep(overlay::TRICK_DISPLAY + Duration::from_millis(100)).await;
    wait_for(&mut view, |v| v.last_trick.is_none()).await;
}

#[tokio::test]
async fn commands_without_channel_are_silent_noops() {
    let client = GameClient::new();
    let view_before = client.watch_view().borrow().clone();

    client.join_game("ROOM").await;
    client.place_bid(2).await;
    client.play_card(Card::new(Suit::Clubs, Rank::Ace)).await;
    client.send_chat("anyone here?").await;

    assert_eq!(*client.watch_view().borrow(), view_before);
}

#[tokio::test]
async fn chat_and_server_errors_surface_as_notifications() {
    let client = GameClient::new();
    let mut notifications = client.subscribe_notifications();

    inject(
        &client,
        ServerEvent::ChatMessage {
            player_id: pid("p1"),
            display_name: "Player p1".to_string(),
            message: "good luck".to_string(),
        },
    );
    inject(
        &client,
        ServerEvent::Error(GameError::new("not your turn")),
    );

    let first = timeout(Duration::from_secs(5), notifications.recv())
        .await
        .expect("notification in time")
        .expect("channel open");
    match first {
        Notification::Chat { message, .. } => assert_eq!(message, "good luck"),
        other => panic!("unexpected notification: {other:?}"),
    }
    let second = timeout(Duration::from_secs(5), notifications.recv())
        .await
        .expect("notification in time")
        .expect("channel open");
    match second {
        Notification::GameError(message) => assert_eq!(message, "not your turn"),
        other => panic!("unexpected notification: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_frames_are_dropped_with_a_protocol_error() {
    let (actions, mut action_queue) = mpsc::unbounded_channel();
    let (notifications, mut notification_queue) = broadcast::channel(8);

    intake::handle_frame("{not json", &actions, &notifications);
    intake::handle_frame(
        r#"{"type":"card_played","payload":{"player_id":"p1"}}"#,
        &actions,
        &notifications,
    );

    assert!(action_queue.try_recv().is_err());
    for _ in 0..2 {
        match notification_queue.try_recv().expect("protocol error reported") {
            Notification::ProtocolError(_) => {}
            other => panic!("unexpected notification: {other:?}"),
        }
    }
}

#[derive(Clone)]
struct WsServerState {
    inbound: mpsc::UnboundedSender<ClientCommand>,
    greeting: GameState,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsServerState>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: WsServerState) {
    let greeting = ServerEvent::GameState(Box::new(state.greeting.clone()));
    let frame = serde_json::to_string(&greeting).expect("encode greeting");
    if socket.send(WsMessage::Text(frame)).await.is_err() {
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        if let WsMessage::Text(text) = message {
            let command: ClientCommand =
                serde_json::from_str(&text).expect("well-formed client command");
            let _ = state.inbound.send(command);
        }
    }
}

async fn spawn_game_server(
    greeting: GameState,
) -> (String, mpsc::UnboundedReceiver<ClientCommand>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (inbound, inbound_rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(WsServerState { inbound, greeting });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), inbound_rx)
}

#[tokio::test]
async fn engine_drives_a_real_websocket_channel() {
    let (server_url, mut server_inbound) = spawn_game_server(table(4, 1)).await;

    let client = GameClient::new();
    client.open(&server_url, None).await.expect("open channel");

    let mut view = client.watch_view();
    let joined = wait_for(&mut view, |v| v.game.is_some()).await;
    assert_eq!(joined.game.expect("game").room_code, "TEST");

    client.join_game("TEST").await;
    client.place_bid(1).await;

    let first = timeout(Duration::from_secs(5), server_inbound.recv())
        .await
        .expect("command in time")
        .expect("server running");
    assert_eq!(
        first,
        ClientCommand::JoinGame {
            room_code: "TEST".to_string()
        }
    );
    let second = timeout(Duration::from_secs(5), server_inbound.recv())
        .await
        .expect("command in time")
        .expect("server running");
    assert_eq!(second, ClientCommand::PlaceBid { bid: 1 });

    client.close().await;
}

#[tokio::test]
async fn outbound_chat_is_clamped_to_the_protocol_limit() {
    let (server_url, mut server_inbound) = spawn_game_server(table(4, 1)).await;

    let client = GameClient::new();
    client.open(&server_url, None).await.expect("open channel");

    let long_message = "x".repeat(commands::MAX_CHAT_LEN + 50);
    client.send_chat(&long_message).await;

    let received = timeout(Duration::from_secs(5), server_inbound.recv())
        .await
        .expect("command in time")
        .expect("server running");
    match received {
        ClientCommand::SendChat { message } => {
            assert_eq!(message.chars().count(), commands::MAX_CHAT_LEN);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    client.close().await;
}

#[test]
fn socket_url_maps_schemes_and_attaches_the_credential() {
    let url = transport::game_socket_url("https://play.example.com", Some("abc123"))
        .expect("derive url");
    assert_eq!(url.as_str(), "wss://play.example.com/ws?token=abc123");

    let url = transport::game_socket_url("http://127.0.0.1:9000", None).expect("derive url");
    assert_eq!(url.as_str(), "ws://127.0.0.1:9000/ws");

    let err = transport::game_socket_url("ftp://example.com", None).expect_err("reject scheme");
    assert!(matches!(err, Error::InvalidScheme(scheme) if scheme == "ftp"));
}
