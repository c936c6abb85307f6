//! Sessions survive a process restart and can be reset

use pond_core::{
    JsonFileSessionStore, MemorySessionStore, Phase, RitualEngine, RoundStep, SessionStore,
};
use pond_providers::ScriptedClient;
use pond_types::{PhaseLabel, SessionId};

const DIALOGUE: &str = "You noticed the bus was late. What did you do while waiting?";
const CLOSING: &str = "You waited with patience and noticed the cold.";
const TRANSITION: &str = "You described a cold wait for a late bus. Next comes why it mattered.";

#[tokio::test]
async fn resumed_session_continues_where_it_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let id = SessionId::new("alice");

    {
        let engine = RitualEngine::new(ScriptedClient::replying([DIALOGUE, DIALOGUE]));
        let mut store = JsonFileSessionStore::open(&path).unwrap();
        let (mut session, _) = engine.begin("Late Bus", "the bus never came").await.unwrap();
        engine.advance(&mut session, "I walked instead").await.unwrap();
        store.put(&id, Some(session)).unwrap();
    }

    let mut store = JsonFileSessionStore::open(&path).unwrap();
    let mut session = store.get(&id).expect("session persisted");
    assert_eq!(session.title(), "Late Bus");
    assert_eq!(session.round_step(), RoundStep::Closing);

    let engine = RitualEngine::new(ScriptedClient::replying([CLOSING, TRANSITION]));
    let turn = engine.advance(&mut session, "it was freezing").await.unwrap();
    assert_eq!(turn.phase_label, PhaseLabel::Transition);
    assert_eq!(session.phase(), Phase::AwaitingLevelDecision);
    store.put(&id, Some(session)).unwrap();

    let reopened = JsonFileSessionStore::open(&path).unwrap();
    let stored = reopened.get(&id).unwrap();
    assert_eq!(stored.summaries().len(), 1);
    assert_eq!(stored.summaries()[0].summary_text, TRANSITION);
}

#[tokio::test]
async fn reset_forgets_the_ritual() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let id = SessionId::default();
    let engine = RitualEngine::new(ScriptedClient::replying([DIALOGUE]));

    let mut store = JsonFileSessionStore::open(&path).unwrap();
    let (session, _) = engine.begin("Late Bus", "the bus never came").await.unwrap();
    store.put(&id, Some(session)).unwrap();
    store.put(&id, None).unwrap();

    let reopened = JsonFileSessionStore::open(&path).unwrap();
    assert!(reopened.get(&id).is_none());
    assert_eq!(reopened.ids(), vec![id]);
}

#[tokio::test]
async fn sessions_are_isolated_by_id() {
    let engine = RitualEngine::new(ScriptedClient::replying([DIALOGUE, DIALOGUE]));
    let mut store = MemorySessionStore::new();

    let (alice, _) = engine.begin("Alice", "one").await.unwrap();
    let (bob, _) = engine.begin("Bob", "two").await.unwrap();
    store.put(&SessionId::new("alice"), Some(alice)).unwrap();
    store.put(&SessionId::new("bob"), Some(bob)).unwrap();

    assert_eq!(store.get(&SessionId::new("alice")).unwrap().title(), "Alice");
    assert_eq!(store.get(&SessionId::new("bob")).unwrap().title(), "Bob");
}
