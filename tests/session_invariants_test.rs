//! Property tests: arbitrary intent/event sequences never break the
//! session invariants.

use proptest::prelude::*;
use turing_chat::{
    ChannelEvent, ClientConfig, DisconnectPolicy, Guess, InboundEvent, MemoryChannel,
    OutboundEvent, PartnerType, Phase, SessionController,
};

#[derive(Debug, Clone)]
enum Step {
    Start,
    Send(String),
    Guess(Guess),
    Restart,
    Connected,
    Matched(PartnerType),
    Message(bool, String),
    Timer(u32),
    GameOver,
    Disconnected,
}

fn partner() -> impl Strategy<Value = PartnerType> {
    prop_oneof![Just(PartnerType::Human), Just(PartnerType::Agent)]
}

fn guess() -> impl Strategy<Value = Guess> {
    prop_oneof![Just(Guess::Human), Just(Guess::Agent)]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Start),
        2 => "[ a-z]{0,6}".prop_map(Step::Send),
        3 => guess().prop_map(Step::Guess),
        3 => Just(Step::Restart),
        1 => Just(Step::Connected),
        3 => partner().prop_map(Step::Matched),
        3 => (any::<bool>(), "[a-z]{1,4}").prop_map(|(mine, text)| Step::Message(mine, text)),
        2 => (0u32..60).prop_map(Step::Timer),
        3 => Just(Step::GameOver),
        1 => Just(Step::Disconnected),
    ]
}

fn policy() -> impl Strategy<Value = DisconnectPolicy> {
    prop_oneof![Just(DisconnectPolicy::Freeze), Just(DisconnectPolicy::Reset)]
}

fn apply(controller: &mut SessionController<MemoryChannel>, step: Step, round: &mut u32) {
    match step {
        Step::Start => {
            controller.start_chat();
        }
        Step::Send(text) => {
            controller.send_text(text);
        }
        Step::Guess(guess) => {
            controller.guess(guess);
        }
        Step::Restart => {
            controller.restart();
        }
        Step::Connected => controller.handle_event(ChannelEvent::Connected("me".into())),
        Step::Matched(partner_type) => {
            *round += 1;
            controller.handle_event(
                InboundEvent::Matched {
                    room: format!("r{}", round).into(),
                    partner_type,
                }
                .into(),
            );
        }
        Step::Message(mine, text) => controller.handle_event(
            InboundEvent::MessageReceived {
                user: if mine { "me" } else { "peer" }.into(),
                text,
            }
            .into(),
        ),
        Step::Timer(seconds_remaining) => {
            controller.handle_event(InboundEvent::TimerTick { seconds_remaining }.into())
        }
        Step::GameOver => controller.handle_event(InboundEvent::GameOver.into()),
        Step::Disconnected => controller.handle_event(ChannelEvent::Disconnected { reason: None }),
    }
}

proptest! {
    #[test]
    fn room_present_iff_active_or_ended(
        policy in policy(),
        steps in prop::collection::vec(step(), 0..60),
    ) {
        let (channel, _server) = MemoryChannel::pair();
        let config = ClientConfig::default().with_disconnect_policy(policy);
        let mut controller = SessionController::start(channel, &config);
        let mut round = 0;

        for step in steps {
            apply(&mut controller, step, &mut round);
            let session = controller.session();
            prop_assert_eq!(session.room_id().is_some(), session.phase().holds_room());
            if session.guess_outcome().is_some() {
                prop_assert_eq!(*session.phase(), Phase::Ended);
            }
        }
    }

    #[test]
    fn score_changes_only_through_guesses(
        steps in prop::collection::vec(step(), 0..60),
    ) {
        let (channel, _server) = MemoryChannel::pair();
        let mut controller = SessionController::start(channel, &ClientConfig::default());
        let mut round = 0;

        for step in steps {
            let before = controller.session().score().value();
            let outcome_before = *controller.session().guess_outcome();
            let is_guess = matches!(step, Step::Guess(_));

            apply(&mut controller, step, &mut round);

            let after = controller.session().score().value();
            let accepted = outcome_before.is_none() && controller.session().guess_outcome().is_some();
            if is_guess && accepted {
                prop_assert!(after == before + 1 || after == 0);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }

    #[test]
    fn blank_or_roomless_sends_never_reach_the_wire(
        text in "[ \t]{0,5}",
        searching in any::<bool>(),
    ) {
        let (channel, mut server) = MemoryChannel::pair();
        let mut controller = SessionController::start(channel, &ClientConfig::default());
        if searching {
            controller.start_chat();
        }
        server.drain_outbound();

        controller.send_text(text);
        controller.send_text("hello");

        let sent = server.drain_outbound();
        prop_assert!(!sent.iter().any(|e| matches!(e, OutboundEvent::Message { .. })), "no Message event may be sent");
        prop_assert!(controller.session().messages().is_empty());
    }
}
