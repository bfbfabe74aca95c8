//! Tests for the session state machine over an in-memory channel.

use turing_chat::{
    ChannelEvent, ClientConfig, DisconnectPolicy, Guess, GuessOutcome, InboundEvent,
    MemoryChannel, MemoryServer, Message, OutboundEvent, PartnerType, Phase, Sender,
    SessionController,
};

const ME: &str = "me-123";

/// Creates a controller that already knows its own identity.
fn setup(config: ClientConfig) -> (SessionController<MemoryChannel>, MemoryServer) {
    let (channel, server) = MemoryChannel::pair();
    let mut controller = SessionController::start(channel, &config);
    controller.handle_event(ChannelEvent::Connected(ME.into()));
    (controller, server)
}

fn matched(room: &str, partner_type: PartnerType) -> ChannelEvent {
    InboundEvent::Matched {
        room: room.into(),
        partner_type,
    }
    .into()
}

fn message(user: &str, text: &str) -> ChannelEvent {
    InboundEvent::MessageReceived {
        user: user.into(),
        text: text.to_string(),
    }
    .into()
}

fn timer(seconds_remaining: u32) -> ChannelEvent {
    InboundEvent::TimerTick { seconds_remaining }.into()
}

fn game_over() -> ChannelEvent {
    InboundEvent::GameOver.into()
}

/// Plays start → matched → one partner line → timer → game over.
fn play_round(controller: &mut SessionController<MemoryChannel>, partner_type: PartnerType) {
    controller.start_chat();
    controller.handle_event(matched("r1", partner_type));
    controller.handle_event(message("peer", "hi"));
    controller.handle_event(timer(45));
    controller.handle_event(game_over());
}

#[test]
fn test_correct_ai_guess_scenario() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Agent);
    let outcome = controller.guess("AI".parse::<Guess>().expect("label parses"));

    let session = controller.session();
    assert_eq!(outcome, Some(GuessOutcome::Correct));
    assert_eq!(*session.phase(), Phase::Ended);
    assert_eq!(
        session.messages(),
        &vec![Message::new(Sender::Partner, "hi".to_string())]
    );
    assert_eq!(*session.seconds_remaining(), Some(45));
    assert_eq!(*session.guess_outcome(), Some(GuessOutcome::Correct));
    assert_eq!(session.score().value(), 1);
    assert_eq!(server.drain_outbound(), vec![OutboundEvent::StartChat]);
}

#[test]
fn test_wrong_human_guess_scenario() {
    let (mut controller, _server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Agent);
    let outcome = controller.guess(Guess::Human);

    assert_eq!(outcome, Some(GuessOutcome::Incorrect));
    assert_eq!(*controller.session().guess_outcome(), Some(GuessOutcome::Incorrect));
    assert_eq!(controller.session().score().value(), 0);
}

#[test]
fn test_score_streak_carries_across_rounds_and_resets_on_miss() {
    let (mut controller, _server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Human);
    controller.guess(Guess::Human);
    assert!(controller.restart());

    controller.handle_event(matched("r2", PartnerType::Agent));
    controller.handle_event(game_over());
    controller.guess(Guess::Agent);
    assert_eq!(controller.session().score().value(), 2);

    assert!(controller.restart());
    controller.handle_event(matched("r3", PartnerType::Human));
    controller.handle_event(game_over());
    controller.guess(Guess::Agent);
    assert_eq!(controller.session().score().value(), 0);
}

#[test]
fn test_second_guess_is_ignored() {
    let (mut controller, _server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Human);
    assert_eq!(controller.guess(Guess::Human), Some(GuessOutcome::Correct));
    assert_eq!(controller.guess(Guess::Agent), None);

    assert_eq!(*controller.session().guess_outcome(), Some(GuessOutcome::Correct));
    assert_eq!(controller.session().score().value(), 1);
}

#[test]
fn test_guess_before_round_ends_is_ignored() {
    let (mut controller, _server) = setup(ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Agent));
    assert_eq!(controller.guess(Guess::Agent), None);
    assert!(controller.session().guess_outcome().is_none());
    assert_eq!(controller.session().score().value(), 0);
}

#[test]
fn test_restart_clears_round_and_searches_again() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Agent);
    controller.guess(Guess::Agent);
    server.drain_outbound();

    assert!(controller.restart());

    let session = controller.session();
    assert_eq!(*session.phase(), Phase::Searching);
    assert!(session.room_id().is_none());
    assert!(session.messages().is_empty());
    assert!(session.guess_outcome().is_none());
    assert_eq!(*session.partner_type(), PartnerType::Unknown);
    assert_eq!(server.drain_outbound(), vec![OutboundEvent::StartChat]);
}

#[test]
fn test_restart_without_guess_is_allowed_from_ended() {
    let (mut controller, _server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Human);
    assert!(controller.restart());
    assert_eq!(*controller.session().phase(), Phase::Searching);
}

#[test]
fn test_restart_is_ignored_while_chatting() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Human));
    server.drain_outbound();

    assert!(!controller.restart());
    assert_eq!(*controller.session().phase(), Phase::Active);
    assert!(server.drain_outbound().is_empty());
}

#[test]
fn test_start_only_from_idle() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    assert!(controller.start_chat());
    assert!(!controller.start_chat());
    assert_eq!(server.drain_outbound(), vec![OutboundEvent::StartChat]);
}

#[test]
fn test_messages_keep_arrival_order_and_attribution() {
    let (mut controller, _server) = setup(ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Human));
    controller.handle_event(message("peer", "A"));
    controller.handle_event(message(ME, "B"));
    controller.handle_event(message("peer", "C"));

    let texts: Vec<(Sender, &str)> = controller
        .session()
        .messages()
        .iter()
        .map(|m| (*m.sender(), m.text().as_str()))
        .collect();
    assert_eq!(
        texts,
        [
            (Sender::Partner, "A"),
            (Sender::Me, "B"),
            (Sender::Partner, "C")
        ]
    );
}

#[test]
fn test_new_match_clears_previous_messages() {
    let (mut controller, _server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Human);
    controller.restart();
    controller.handle_event(matched("r2", PartnerType::Agent));

    assert!(controller.session().messages().is_empty());
    assert_eq!(controller.session().room_id().as_ref().map(|r| r.as_str()), Some("r2"));
}

#[test]
fn test_send_emits_message_and_clears_draft() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Human));
    server.drain_outbound();

    controller.update_draft("  hello  ");
    assert!(controller.send_message());

    assert_eq!(
        server.drain_outbound(),
        vec![OutboundEvent::Message {
            room: "r1".into(),
            text: "  hello  ".to_string(),
        }]
    );
    assert_eq!(controller.draft(), "");
    // Our own line arrives only when the server relays it back.
    assert!(controller.session().messages().is_empty());
}

#[test]
fn test_blank_send_is_dropped() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Human));
    server.drain_outbound();

    assert!(!controller.send_text(""));
    assert!(!controller.send_text(" \t\n "));

    assert!(server.drain_outbound().is_empty());
    assert!(controller.session().messages().is_empty());
    assert_eq!(controller.draft(), " \t\n ");
}

#[test]
fn test_send_without_room_is_dropped() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    assert!(!controller.send_text("anyone there?"));
    controller.start_chat();
    server.drain_outbound();
    assert!(!controller.send_text("still searching"));

    assert!(server.drain_outbound().is_empty());
    assert_eq!(controller.draft(), "still searching");
}

#[test]
fn test_send_after_game_over_is_dropped() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Human);
    server.drain_outbound();

    assert!(!controller.send_text("too late"));
    assert!(server.drain_outbound().is_empty());
}

#[test]
fn test_events_outside_their_phase_are_ignored() {
    let (mut controller, _server) = setup(ClientConfig::default());

    controller.handle_event(matched("early", PartnerType::Human));
    controller.handle_event(message("peer", "ghost"));
    controller.handle_event(game_over());
    assert_eq!(*controller.session().phase(), Phase::Idle);
    assert!(controller.session().room_id().is_none());

    play_round(&mut controller, PartnerType::Human);
    controller.handle_event(message("peer", "after the bell"));
    controller.handle_event(matched("other", PartnerType::Agent));

    let session = controller.session();
    assert_eq!(*session.phase(), Phase::Ended);
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.room_id().as_ref().map(|r| r.as_str()), Some("r1"));
    assert_eq!(*session.partner_type(), PartnerType::Human);
}

#[test]
fn test_snapshot_masks_partner_until_guess() {
    let (mut controller, _server) = setup(ClientConfig::default());

    play_round(&mut controller, PartnerType::Agent);
    assert_eq!(*controller.snapshot().partner_type(), PartnerType::Unknown);
    assert!(controller.snapshot().awaiting_guess());

    controller.guess(Guess::Human);
    let snapshot = controller.snapshot();
    assert_eq!(*snapshot.partner_type(), PartnerType::Agent);
    assert!(!snapshot.awaiting_guess());
}

#[test]
fn test_snapshot_reveals_partner_when_masking_disabled() {
    let (mut controller, _server) = setup(ClientConfig::default().with_mask_partner_type(false));

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Human));
    assert_eq!(*controller.snapshot().partner_type(), PartnerType::Human);
}

#[test]
fn test_freeze_policy_keeps_state_and_allows_forced_restart() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Human));
    controller.handle_event(message("peer", "hi"));
    controller.handle_event(ChannelEvent::Disconnected { reason: None });

    assert!(!controller.is_connected());
    assert_eq!(*controller.session().phase(), Phase::Active);
    assert_eq!(controller.session().messages().len(), 1);

    server.drain_outbound();
    assert!(controller.restart());

    let session = controller.session();
    assert_eq!(*session.phase(), Phase::Searching);
    assert!(session.room_id().is_none());
    assert!(session.messages().is_empty());
    assert_eq!(server.drain_outbound(), vec![OutboundEvent::StartChat]);
}

#[test]
fn test_reconnect_unfreezes_the_round() {
    let (mut controller, mut server) = setup(ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Human));
    controller.handle_event(ChannelEvent::Disconnected { reason: None });
    controller.handle_event(ChannelEvent::Connected("me-456".into()));
    controller.handle_event(timer(30));
    server.drain_outbound();

    assert!(controller.is_connected());
    assert!(!controller.restart());

    let session = controller.session();
    assert_eq!(*session.phase(), Phase::Active);
    assert_eq!(session.room_id().as_ref().map(|r| r.as_str()), Some("r1"));
    assert!(server.drain_outbound().is_empty());
}

#[test]
fn test_timer_after_game_over_is_kept() {
    let (mut controller, _server) = setup(ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Agent));
    controller.handle_event(timer(1));
    controller.handle_event(game_over());
    controller.handle_event(timer(0));

    let session = controller.session();
    assert_eq!(*session.phase(), Phase::Ended);
    assert_eq!(*session.seconds_remaining(), Some(0));
}

#[test]
fn test_reset_policy_returns_to_idle_and_keeps_score() {
    let config = ClientConfig::default().with_disconnect_policy(DisconnectPolicy::Reset);
    let (mut controller, _server) = setup(config);

    play_round(&mut controller, PartnerType::Human);
    controller.guess(Guess::Human);
    controller.restart();
    controller.handle_event(matched("r2", PartnerType::Agent));
    controller.handle_event(ChannelEvent::Disconnected {
        reason: Some("server went away".to_string()),
    });

    let session = controller.session();
    assert_eq!(*session.phase(), Phase::Idle);
    assert!(session.room_id().is_none());
    assert!(session.seconds_remaining().is_none());
    assert_eq!(session.score().value(), 1);
    assert!(controller.start_chat());
}

#[test]
fn test_messages_before_connect_are_from_partner() {
    let (channel, _server) = MemoryChannel::pair();
    let mut controller = SessionController::start(channel, &ClientConfig::default());

    controller.start_chat();
    controller.handle_event(matched("r1", PartnerType::Human));
    controller.handle_event(message(ME, "who am I"));

    assert_eq!(*controller.session().messages()[0].sender(), Sender::Partner);
}

#[tokio::test]
async fn test_dispose_stops_delivery() {
    let (mut controller, server) = setup(ClientConfig::default());

    controller.start_chat();
    let session = controller.dispose().await;

    assert_eq!(*session.phase(), Phase::Searching);
    assert!(server.is_client_closed());
    assert!(server.timer(10).is_err());
}
