//! Session layer integration tests.
//!
//! These run the router, matchmaker and registry against the in-memory
//! gateway and a channel broadcaster, with tokio's clock paused wherever
//! auto-advance timers are involved.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use ludo_sync::{
    CommandRouter, DieRoller, InMemoryGateway, InboundCommand, MatchId, MatchStatus, Outbound,
    OutboundEvent, PiecePosition, PlayerId, Reply, ScriptedDice, Seat, SessionError,
    SessionRegistry, Stake, SyncConfig, TransportAddress,
};

struct Harness {
    router: CommandRouter,
    gateway: Arc<InMemoryGateway>,
    outbound: UnboundedReceiver<Outbound>,
}

fn harness(faces: Option<Vec<u8>>) -> Harness {
    let gateway = Arc::new(InMemoryGateway::new());
    let (broadcaster, outbound) = ludo_sync::ChannelBroadcaster::channel();
    let mut builder = SessionRegistry::builder(
        SyncConfig::new().with_rng_seed(7),
        gateway.clone(),
        Arc::new(broadcaster),
    );
    if let Some(faces) = faces {
        builder = builder.dice(Arc::new(move |_: u64| {
            Box::new(ScriptedDice::from_faces(&faces).unwrap()) as Box<dyn DieRoller>
        }));
    }
    Harness {
        router: CommandRouter::from_registry(builder.build()),
        gateway,
        outbound,
    }
}

fn addr(name: &str) -> TransportAddress {
    TransportAddress::new(name)
}

fn user(name: &str) -> PlayerId {
    PlayerId::new(name)
}

fn join(user_id: &str, stake: u64) -> InboundCommand {
    InboundCommand::JoinGame {
        user_id: user(user_id),
        stake_amount: Stake::new(stake),
        name: user_id.to_uppercase(),
        avatar: None,
    }
}

/// Seat alice and bob in one match and return its id.
async fn start_match(h: &Harness) -> MatchId {
    let Reply::Joined(first) = h.router.handle(&addr("sock-a"), join("alice", 100)).await.unwrap()
    else {
        panic!("expected a join reply");
    };
    h.router.handle(&addr("sock-b"), join("bob", 100)).await.unwrap();
    first.match_id
}

/// Let spawned tasks run without moving the clock.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(message) = rx.try_recv() {
        out.push(message);
    }
    out
}

fn last_state(messages: &[Outbound]) -> Option<&ludo_sync::MatchSnapshot> {
    messages.iter().rev().find_map(|m| match m.event() {
        OutboundEvent::GameState(snapshot) => Some(snapshot.as_ref()),
        OutboundEvent::GameJoined { .. } => None,
    })
}

// =============================================================================
// Join Flow Tests
// =============================================================================

/// Test that two joins at one stake start a match and notify both clients.
#[tokio::test]
async fn test_join_flow_over_text_frames() {
    let mut h = harness(None);

    let first = h
        .router
        .handle_text(
            &addr("sock-a"),
            r#"{"type":"joinGame","userId":"alice","betAmount":100,"name":"Alice"}"#,
        )
        .await;
    let second = h
        .router
        .handle_text(
            &addr("sock-b"),
            r#"{"type":"joinGame","userId":"bob","stakeAmount":100,"name":"Bob"}"#,
        )
        .await;

    let (Some(Reply::Joined(first)), Some(Reply::Joined(second))) = (first, second) else {
        panic!("both joins should be accepted");
    };
    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.match_id, second.match_id);
    assert_eq!(second.seat, Seat::new(1));

    let messages = drain(&mut h.outbound);
    assert_eq!(messages.len(), 4);
    assert!(matches!(
        &messages[0],
        Outbound::Direct { to, event: OutboundEvent::GameJoined { player_id, .. } }
            if *to == addr("sock-a") && *player_id == user("alice")
    ));
    assert!(matches!(
        &messages[1],
        Outbound::Room { event: OutboundEvent::GameState(s), .. }
            if s.status == MatchStatus::Waiting
    ));
    assert!(matches!(
        &messages[2],
        Outbound::Direct { to, .. } if *to == addr("sock-b")
    ));
    let state = last_state(&messages).unwrap();
    assert_eq!(state.status, MatchStatus::Playing);
    assert_eq!(state.current_turn, Seat::new(0));
    assert!(state.can_roll);

    settle().await;
    let record = h.gateway.record(&first.match_id).await.unwrap();
    assert_eq!(record.players, vec![user("alice"), user("bob")]);
}

/// Test that repeating a join keeps the seat and follows the new socket.
#[tokio::test]
async fn test_repeated_join_rebinds_transport() {
    let mut h = harness(None);
    let Reply::Joined(first) = h.router.handle(&addr("sock-a"), join("alice", 100)).await.unwrap()
    else {
        panic!("expected a join reply");
    };
    drain(&mut h.outbound);

    let Reply::Joined(again) = h.router.handle(&addr("sock-a2"), join("alice", 100)).await.unwrap()
    else {
        panic!("expected a join reply");
    };

    assert_eq!(again.match_id, first.match_id);
    assert_eq!(again.seat, Seat::new(0));
    assert!(!again.created);
    assert_eq!(h.router.registry().len().await, 1);

    let messages = drain(&mut h.outbound);
    assert_eq!(messages.len(), 1);
    assert!(matches!(
        &messages[0],
        Outbound::Direct { to, event: OutboundEvent::GameJoined { .. } } if *to == addr("sock-a2")
    ));

    let slot = h.router.registry().get(&first.match_id).await.unwrap();
    let snapshot = slot.snapshot().await;
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].transport, Some(addr("sock-a2")));
}

/// Test that a disconnect leaves the seat and match untouched.
#[tokio::test]
async fn test_disconnect_leaves_match_intact() {
    let mut h = harness(Some(vec![5]));
    let id = start_match(&h).await;
    drain(&mut h.outbound);
    let slot = h.router.registry().get(&id).await.unwrap();
    let before = slot.snapshot().await;

    h.router.disconnect(&addr("sock-a"));

    assert!(drain(&mut h.outbound).is_empty());
    assert_eq!(slot.snapshot().await, before);
    let rolled = h.router.registry().roll_dice(&id, &user("alice")).await.unwrap();
    assert_eq!(rolled.get(), 5);
}

/// Test that malformed and rejected frames produce no output.
#[tokio::test]
async fn test_bad_frames_are_dropped() {
    let mut h = harness(Some(vec![4]));
    let id = start_match(&h).await;
    drain(&mut h.outbound);

    assert!(h.router.handle_text(&addr("sock-a"), "not json").await.is_none());
    assert!(h
        .router
        .handle_text(&addr("sock-a"), r#"{"type":"castSpell"}"#)
        .await
        .is_none());
    let out_of_turn = format!(r#"{{"type":"rollDice","gameId":"{id}","playerId":"bob"}}"#);
    assert!(h.router.handle_text(&addr("sock-b"), &out_of_turn).await.is_none());
    let unknown = r#"{"type":"rollDice","matchId":"nope","playerId":"alice"}"#;
    assert!(h.router.handle_text(&addr("sock-a"), unknown).await.is_none());

    assert!(drain(&mut h.outbound).is_empty());
}

/// Test that a link failure does not stop the match from starting.
#[tokio::test]
async fn test_link_failure_does_not_block_play() {
    let h = harness(Some(vec![4]));
    h.router.handle(&addr("sock-a"), join("alice", 100)).await.unwrap();
    h.gateway.set_offline(true);

    let Reply::Joined(outcome) = h.router.handle(&addr("sock-b"), join("bob", 100)).await.unwrap()
    else {
        panic!("expected a join reply");
    };
    settle().await;

    let slot = h.router.registry().get(&outcome.match_id).await.unwrap();
    assert_eq!(slot.snapshot().await.status, MatchStatus::Playing);

    let rolled = h
        .router
        .handle(
            &addr("sock-a"),
            InboundCommand::RollDice {
                match_id: outcome.match_id.clone(),
                player_id: user("alice"),
            },
        )
        .await
        .unwrap();
    assert!(matches!(rolled, Reply::Rolled(die) if die.get() == 4));
}

/// Test that concurrent joins at one stake fill matches two at a time.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_never_overfill() {
    let router = Arc::new(harness(None).router);

    let mut tasks = Vec::new();
    for i in 0..8 {
        let router = Arc::clone(&router);
        tasks.push(tokio::spawn(async move {
            let address = addr(&format!("sock-{i}"));
            router.handle(&address, join(&format!("user-{i}"), 250)).await
        }));
    }

    let mut created = 0;
    let mut ids = Vec::new();
    for task in tasks {
        let Reply::Joined(outcome) = task.await.unwrap().unwrap() else {
            panic!("expected a join reply");
        };
        if outcome.created {
            created += 1;
        }
        ids.push(outcome.match_id);
    }

    assert_eq!(created, 4);
    assert_eq!(router.registry().len().await, 4);
    for id in &ids {
        assert_eq!(ids.iter().filter(|other| *other == id).count(), 2);
        let slot = router.registry().get(id).await.unwrap();
        let snapshot = slot.snapshot().await;
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.status, MatchStatus::Playing);
    }
}

// =============================================================================
// Auto-Advance Tests
// =============================================================================

/// Test that an unusable roll passes the turn only after the delay.
#[tokio::test(start_paused = true)]
async fn test_auto_advance_waits_for_delay() {
    let mut h = harness(Some(vec![3]));
    let id = start_match(&h).await;
    drain(&mut h.outbound);

    let registry = h.router.registry();
    registry.roll_dice(&id, &user("alice")).await.unwrap();
    let slot = registry.get(&id).await.unwrap();

    tokio::time::advance(Duration::from_millis(999)).await;
    settle().await;
    let snapshot = slot.snapshot().await;
    assert_eq!(snapshot.current_turn, Seat::new(0));
    assert_eq!(snapshot.dice_value.map(|d| d.get()), Some(3));

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    let snapshot = slot.snapshot().await;
    assert_eq!(snapshot.current_turn, Seat::new(1));
    assert!(snapshot.can_roll);
    assert_eq!(snapshot.dice_value, None);

    let messages = drain(&mut h.outbound);
    assert_eq!(messages.len(), 2);
    assert_eq!(last_state(&messages).unwrap().current_turn, Seat::new(1));
}

/// Test that the delay runs from the roll, not from when the timer task starts.
#[tokio::test(start_paused = true)]
async fn test_auto_advance_deadline_counts_from_roll() {
    let h = harness(Some(vec![3]));
    let id = start_match(&h).await;
    let registry = h.router.registry();

    registry.roll_dice(&id, &user("alice")).await.unwrap();
    tokio::time::advance(Duration::from_millis(1500)).await;
    settle().await;

    let snapshot = registry.get(&id).await.unwrap().snapshot().await;
    assert_eq!(snapshot.current_turn, Seat::new(1));
    assert_eq!(snapshot.dice_value, None);
}

/// Test that one timer passes the turn exactly once.
#[tokio::test(start_paused = true)]
async fn test_timer_fires_once() {
    let h = harness(Some(vec![3, 6]));
    let id = start_match(&h).await;
    let registry = h.router.registry();

    registry.roll_dice(&id, &user("alice")).await.unwrap();
    tokio::time::advance(Duration::from_millis(1000)).await;
    settle().await;

    registry.roll_dice(&id, &user("bob")).await.unwrap();
    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    let snapshot = registry.get(&id).await.unwrap().snapshot().await;
    assert_eq!(snapshot.current_turn, Seat::new(1));
    assert_eq!(snapshot.dice_value.map(|d| d.get()), Some(6));
}

// =============================================================================
// Completion Tests
// =============================================================================

/// Test that a finished match is persisted once and then retired.
#[tokio::test(start_paused = true)]
async fn test_completed_match_is_finalized_and_retired() {
    let mut faces = Vec::new();
    for _ in 0..4 {
        faces.extend([6; 10]);
        faces.extend([3, 1]);
    }
    let mut h = harness(Some(faces));
    let id = start_match(&h).await;
    let registry = Arc::clone(h.router.registry());

    for piece in 0..4u8 {
        for _ in 0..11 {
            registry.roll_dice(&id, &user("alice")).await.unwrap();
            registry.move_piece(&id, &user("alice"), piece).await.unwrap();
        }
        if piece < 3 {
            registry.roll_dice(&id, &user("bob")).await.unwrap();
            tokio::time::advance(Duration::from_millis(1000)).await;
            settle().await;
        }
    }
    settle().await;

    assert_eq!(h.gateway.finalize_calls(), 1);
    let record = h.gateway.record(&id).await.unwrap();
    assert_eq!(record.status, MatchStatus::Completed);
    assert_eq!(record.winner, Some(user("alice")));
    assert!(registry.get(&id).await.is_none());

    let last = last_state(&drain(&mut h.outbound)).cloned().unwrap();
    assert_eq!(last.status, MatchStatus::Completed);
    assert_eq!(last.winners, vec![user("alice")]);
    assert!(last.players[0].pieces.iter().all(|p| *p == PiecePosition::Home));

    let err = registry.roll_dice(&id, &user("bob")).await.unwrap_err();
    assert_eq!(err, SessionError::MatchNotFound(id));
}

// =============================================================================
// Wire Format Tests
// =============================================================================

/// Test the JSON shape of a broadcast state frame.
#[tokio::test]
async fn test_state_frame_shape() {
    let mut h = harness(Some(vec![4]));
    start_match(&h).await;

    let messages = drain(&mut h.outbound);
    let frame = messages.last().unwrap().encode().unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();

    assert_eq!(value["event"], "gameState");
    let data = &value["data"];
    assert_eq!(data["status"], "playing");
    assert_eq!(data["stake"], 100);
    assert_eq!(data["canRoll"], true);
    assert_eq!(data["diceValue"], serde_json::Value::Null);
    assert_eq!(data["players"][0]["pieces"][0], -1);
    assert_eq!(data["players"][1]["color"], "green");
    assert!(data.get("history").is_none());
}
