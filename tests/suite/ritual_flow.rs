//! End-to-end ritual runs against a mocked chat completions backend

use pond_core::{
    ArchiveOutcome, JsonlArchive, Phase, RitualEngine, RitualError, stance_clause,
};
use pond_providers::GenerationError;
use pond_types::{ArchiveChoice, HistoryEntry, Level, PhaseLabel};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{chat_client, mount_chat_sequence, received_bodies};

const LEVEL_ONE: [&str; 4] = [
    "You should notice the nerves. What did you see first? Anything else?",
    "You found the room eventually. What happened when you arrived?",
    "You carried the nerves and the kindness through the morning.",
    "You described a first morning of getting lost and being found. \
     Meaning begins to gather around welcome. Next you look at why it mattered. \
     The day holds still for now.",
];

const LEVEL_TWO: [&str; 4] = [
    "Welcome changed the shape of the day. Why did that kindness matter?",
    "Fear loosened when you were seen. What does that tell you?",
    "You named how welcome turned worry into ease.",
    "You traced how being welcomed softened the fear. Next you look at what it says about you. \
     Hold that gently.",
];

const LEVEL_THREE: [&str; 4] = [
    "Asking for help became possible. How might that shape tomorrow?",
    "Kindness given can be kindness passed on. Who could you welcome next?",
    "You connected your welcome to the welcome you want to give.",
    "You found that being helped makes you want to help. The archive waits.",
];

const ARTIFACT: &str = "You arrived nervous and were met with kindness. \
     That welcome showed you the kind of colleague you want to be.";

fn full_script() -> Vec<&'static str> {
    let mut script = Vec::new();
    script.extend(LEVEL_ONE);
    script.extend(LEVEL_TWO);
    script.extend(LEVEL_THREE);
    script.push(ARTIFACT);
    script
}

#[tokio::test]
async fn first_day_ritual_runs_to_archive() {
    let server = MockServer::start().await;
    mount_chat_sequence(&server, full_script()).await;
    let engine = RitualEngine::new(chat_client(&server));
    let dir = tempfile::tempdir().unwrap();
    let archive = JsonlArchive::new(dir.path().join("memories.jsonl"));

    let (mut session, first) = engine
        .begin("First Day", "Started a new job; nervous but excited.")
        .await
        .unwrap();
    assert_eq!(first.phase_label, PhaseLabel::RoundOne);
    // Sanitized and cut down to one statement and one question.
    assert_eq!(first.body, "You notice the nerves. What did you see first?");

    let round_two = engine
        .advance(&mut session, "I got lost looking for the meeting room")
        .await
        .unwrap();
    assert_eq!(round_two.phase_label, PhaseLabel::RoundTwo);

    let transition = engine
        .advance(&mut session, "My manager found me and laughed kindly")
        .await
        .unwrap();
    assert_eq!(transition.phase_label, PhaseLabel::Transition);
    assert!(transition.body.contains("Level 2: Analytic"));
    assert_eq!(session.phase(), Phase::AwaitingLevelDecision);

    for reply in [
        "continue",
        "It mattered because people were kind",
        "Being lost felt less scary",
        "yes",
        "Asking for help is allowed",
        "Welcome the next new person",
    ] {
        engine.advance(&mut session, reply).await.unwrap();
    }
    assert_eq!(session.level(), Level::Reflexive);
    assert_eq!(session.phase(), Phase::AwaitingArchiveChoice);

    let artifact = engine.advance(&mut session, "let it float").await.unwrap();
    assert_eq!(artifact.phase_label, PhaseLabel::Artifact);
    assert!(artifact.body.starts_with("You arrived nervous"));
    assert!(artifact.body.ends_with(stance_clause(ArchiveChoice::Float)));
    assert_eq!(session.archive_choice(), Some(ArchiveChoice::Float));

    let outcome = engine.archive(&session, true, &archive).await.unwrap();
    assert!(matches!(outcome, ArchiveOutcome::Saved(_)));
    assert_eq!(outcome.message(), "Saved: a small ripple joins the pond archive.");

    let records = archive.read_all().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.title, "First Day");
    assert_eq!(record.offering, "Started a new job; nervous but excited.");
    assert_eq!(record.archive_choice, ArchiveChoice::Float);
    assert_eq!(record.artifact, artifact.body);
    let levels: Vec<_> = record.summaries.iter().map(|s| s.level_name.as_str()).collect();
    assert_eq!(levels, vec!["Descriptive", "Analytic", "Reflexive"]);
    assert!(record.timestamp.ends_with('Z'));
}

#[tokio::test]
async fn requests_use_phase_temperatures_and_shared_sampling() {
    let server = MockServer::start().await;
    mount_chat_sequence(&server, full_script()).await;
    let engine = RitualEngine::new(chat_client(&server));

    let (mut session, _) = engine.begin("First Day", "new job").await.unwrap();
    for reply in [
        "lost", "found", "continue", "kindness", "ease", "yes", "help", "welcome", "float",
    ] {
        engine.advance(&mut session, reply).await.unwrap();
    }
    assert!(session.is_finished());

    let bodies = received_bodies(&server).await;
    let temperatures: Vec<f64> = bodies
        .iter()
        .map(|b| b["temperature"].as_f64().unwrap())
        .collect();
    let level = [0.16, 0.16, 0.1, 0.14];
    let mut expected: Vec<f64> = level.iter().chain(&level).chain(&level).copied().collect();
    expected.push(0.12);
    assert_eq!(temperatures.len(), expected.len());
    for (got, want) in temperatures.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-9, "temperature {got} != {want}");
    }

    for body in &bodies {
        assert!((body["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-9);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    let first_context = bodies[0]["messages"][1]["content"].as_str().unwrap();
    assert!(first_context.starts_with("Title: First Day\n\nOffering: new job"));
    let artifact_context = bodies[12]["messages"][1]["content"].as_str().unwrap();
    assert_eq!(artifact_context.lines().count(), 3);
}

#[tokio::test]
async fn backend_failure_surfaces_and_keeps_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;
    let engine = RitualEngine::new(chat_client(&server));

    let err = engine.begin("Lake", "a cold swim").await.unwrap_err();
    assert!(matches!(
        err,
        RitualError::Generation(GenerationError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn failed_round_leaves_player_entry_without_answer() {
    let server = MockServer::start().await;
    mount_chat_sequence(&server, [LEVEL_ONE[0]]).await;
    let engine = RitualEngine::new(chat_client(&server));
    let (mut session, _) = engine.begin("Lake", "a cold swim").await.unwrap();

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = engine.advance(&mut session, "the water bit").await;

    assert!(result.is_err());
    assert_eq!(
        session.history().last(),
        Some(&HistoryEntry::Player("the water bit".to_string()))
    );
    assert_eq!(session.summaries().len(), 0);
}

#[tokio::test]
async fn blank_completion_falls_back_to_fixed_dialogue() {
    let server = MockServer::start().await;
    mount_chat_sequence(&server, [LEVEL_ONE[0], ""]).await;
    let engine = RitualEngine::new(chat_client(&server));
    let (mut session, _) = engine.begin("Lake", "a cold swim").await.unwrap();

    let turn = engine.advance(&mut session, "the water bit").await.unwrap();

    assert_eq!(turn.phase_label, PhaseLabel::RoundTwo);
    assert_eq!(
        turn.body,
        "You've named something clearly. What detail stands out most?"
    );
    assert_eq!(
        session.history().last(),
        Some(&HistoryEntry::Pond(turn.body.clone()))
    );
}
