//! Property-based tests for the state machine
//!
//! Drives the pure transition function through arbitrary event sequences and
//! replays the effects onto a real store.

use super::*;
use crate::llm::{GenerationErrorKind, Usage};
use crate::store::{ConversationStore, Message, Role};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_error_kind() -> impl Strategy<Value = GenerationErrorKind> {
    prop_oneof![
        Just(GenerationErrorKind::Network),
        Just(GenerationErrorKind::Timeout),
        Just(GenerationErrorKind::RateLimit),
        Just(GenerationErrorKind::ServerError),
        Just(GenerationErrorKind::Auth),
        Just(GenerationErrorKind::InvalidRequest),
        Just(GenerationErrorKind::EmptyResponse),
        Just(GenerationErrorKind::Unavailable),
        Just(GenerationErrorKind::Unknown),
    ]
}

fn arb_outcome() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z .!]{1,40}".prop_map(|text| Event::ModelReply {
            text,
            usage: Usage::default(),
        }),
        ("[a-z ]{1,20}", arb_error_kind())
            .prop_map(|(message, kind)| Event::ModelFailed { message, kind }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{0,30}".prop_map(|text| Event::UserMessage { text }),
        arb_outcome(),
    ]
}

// ============================================================================
// Helpers
// ============================================================================

/// Apply a transition result the way the runtime does, minus the I/O
fn apply(store: &mut ConversationStore, result: &TransitionResult) {
    for effect in &result.effects {
        if let Effect::AppendMessage { role, content } = effect {
            store.append(Message::new(*role, content.clone()));
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// N completed turns leave 2N messages alternating user/assistant.
    #[test]
    fn prop_completed_turns_alternate(
        turns in proptest::collection::vec(("[a-zA-Z ]{1,30}", arb_outcome()), 0..10)
    ) {
        let mut state = ConvState::Idle;
        let mut store = ConversationStore::new();

        for (text, outcome) in &turns {
            let r = transition(state, Event::UserMessage { text: text.clone() }).unwrap();
            apply(&mut store, &r);
            state = r.new_state;

            let r = transition(state, outcome.clone()).unwrap();
            apply(&mut store, &r);
            state = r.new_state;
        }

        let snapshot = store.snapshot();
        prop_assert_eq!(state, ConvState::Idle);
        prop_assert_eq!(snapshot.len(), turns.len() * 2);
        for (i, msg) in snapshot.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            prop_assert_eq!(msg.role, expected);
        }
        for (i, (text, _)) in turns.iter().enumerate() {
            prop_assert_eq!(&snapshot[i * 2].content, text);
        }
    }

    /// Whatever arrives, the transcript never contains an orphan assistant
    /// message and rejected events leave it untouched.
    #[test]
    fn prop_no_orphan_assistant_messages(
        events in proptest::collection::vec(arb_event(), 0..30)
    ) {
        let mut state = ConvState::Idle;
        let mut store = ConversationStore::new();

        for event in events {
            let before = store.len();
            match transition(state, event) {
                Ok(r) => {
                    apply(&mut store, &r);
                    state = r.new_state;
                    prop_assert_eq!(store.len(), before + 1);
                }
                Err(_) => prop_assert_eq!(store.len(), before),
            }
            prop_assert_eq!(state.is_working(), store.len() % 2 == 1);
        }

        for pair in store.snapshot().chunks(2) {
            prop_assert_eq!(pair[0].role, Role::User);
            if let Some(second) = pair.get(1) {
                prop_assert_eq!(second.role, Role::Assistant);
            }
        }
    }

    /// A failed completion always yields exactly one fallback reply.
    #[test]
    fn prop_failure_appends_exactly_one_fallback(kind in arb_error_kind()) {
        let mut store = ConversationStore::new();
        let r = transition(ConvState::Idle, Event::UserMessage { text: "hi".into() }).unwrap();
        apply(&mut store, &r);

        let r = transition(r.new_state, Event::ModelFailed { message: "x".into(), kind }).unwrap();
        apply(&mut store, &r);

        prop_assert_eq!(store.len(), 2);
        let last = store.last().unwrap();
        prop_assert_eq!(last.role, Role::Assistant);
        prop_assert_eq!(last.content.as_str(), fallback_reply(kind));
    }
}
