//! End-to-end turns through the fallback orchestrator

mod common;

use common::{utterances, Fixture, CHAT_AIML};
use fallbot_common::dialog::DialogKey;
use fallbot_common::{ConversationState, ConverseOutcome, FallbotError, PriorityRegistry};

#[test]
fn test_cold_start_answers_hello() {
    let fixture = Fixture::new(&[("hello.aiml", CHAT_AIML)]);
    assert!(!fixture.snapshot_path().exists());

    let mut orchestrator = fixture.orchestrator();
    assert!(fixture.snapshot_path().exists());

    assert!(orchestrator.handle("HELLO"));
    assert_eq!(
        orchestrator.speaker().last(),
        Some(&("Hi there".to_string(), false))
    );
    assert_eq!(orchestrator.state(), ConversationState::Idle);
}

#[test]
fn test_begin_chat_enters_conversation() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();

    assert!(orchestrator.start_conversation("begin chat"));
    assert_eq!(orchestrator.state(), ConversationState::Active);
    assert_eq!(
        orchestrator.speaker().last(),
        Some(&("Sure, what shall we talk about?".to_string(), true))
    );
}

#[test]
fn test_converse_begin_chat_while_idle() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    assert_eq!(orchestrator.state(), ConversationState::Idle);

    assert!(orchestrator.converse(&utterances("begin chat"), "en-us"));
    assert_eq!(orchestrator.state(), ConversationState::Active);
    assert_eq!(
        orchestrator.speaker().last(),
        Some(&("Sure, what shall we talk about?".to_string(), true))
    );
}

#[test]
fn test_converse_declines_other_idle_utterances() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.brain_mut().engine_mut().queries.clear();

    assert_eq!(
        orchestrator.converse_turn(&utterances("hello"), "en-us"),
        ConverseOutcome::Declined
    );
    assert!(orchestrator.brain().engine().queries.is_empty());
    assert_eq!(orchestrator.state(), ConversationState::Idle);
}

#[test]
fn test_end_keyword_reports_why() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.converse(&utterances("begin chat"), "en-us");

    assert_eq!(
        orchestrator.converse_turn(&utterances("please stop"), "en-us"),
        ConverseOutcome::EndedByKeyword
    );
    assert_eq!(orchestrator.state(), ConversationState::Idle);
}

#[test]
fn test_end_keyword_ends_conversation_without_answer() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.start_conversation("begin chat");
    let spoken_before = orchestrator.speaker().spoken.len();
    let queries_before = orchestrator.brain().engine().queries.len();

    assert!(!orchestrator.converse(&utterances("please stop"), "en-us"));
    assert_eq!(orchestrator.state(), ConversationState::Idle);
    assert_eq!(orchestrator.speaker().spoken.len(), spoken_before);
    assert_eq!(orchestrator.brain().engine().queries.len(), queries_before);
}

#[test]
fn test_filler_query_then_silence_ends_conversation() {
    // No filler category in this corpus
    let corpus = r#"<aiml>
      <category><pattern>BEGIN CHAT</pattern><template>What shall we talk about?</template></category>
    </aiml>"#;
    let fixture = Fixture::new(&[("tiny.aiml", corpus)]);
    let mut orchestrator = fixture.orchestrator();
    orchestrator.start_conversation("begin chat");
    orchestrator.brain_mut().engine_mut().queries.clear();

    assert!(!orchestrator.converse(&utterances("tell me about volcanoes"), "en-us"));
    assert_eq!(
        orchestrator.brain().engine().queries,
        vec!["tell me about volcanoes".to_string(), "random pick up line".to_string()]
    );
    assert_eq!(orchestrator.state(), ConversationState::Idle);
}

#[test]
fn test_filler_query_answers_mid_conversation() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.start_conversation("begin chat");

    assert!(orchestrator.converse(&utterances("tell me about volcanoes"), "en-us"));
    assert_eq!(
        orchestrator.speaker().last(),
        Some(&("Do you come here often?".to_string(), true))
    );
    assert!(orchestrator.is_active());
}

#[test]
fn test_no_filler_on_cold_fallback() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.brain_mut().engine_mut().queries.clear();

    assert!(!orchestrator.handle("tell me about volcanoes"));
    assert_eq!(orchestrator.brain().engine().queries.len(), 1);
    assert!(orchestrator.speaker().spoken.is_empty());
}

#[test]
fn test_reset_mid_conversation_rebuilds_snapshot() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.start_conversation("begin chat");
    assert!(orchestrator.is_active());

    orchestrator.reset_memory().unwrap();
    assert_eq!(orchestrator.state(), ConversationState::Idle);
    assert!(fixture.snapshot_path().exists());
    assert_eq!(fixture.storage.removals.get(), 1);
    assert_eq!(orchestrator.speaker().dialogs, vec![DialogKey::ResetMemory]);
    assert!(orchestrator.handle("hello"));
}

#[test]
fn test_reset_failure_makes_skill_unavailable() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    fixture.storage.fail_remove.set(true);

    let err = orchestrator.reset_memory().unwrap_err();
    assert!(matches!(err, FallbotError::ResetFailed(_)));
    assert!(!orchestrator.is_available());
    assert_eq!(orchestrator.speaker().dialogs, vec![DialogKey::ResetFailed]);
    assert!(!orchestrator.handle("hello"));

    // Begin chat must not engage a skill that cannot answer
    assert!(!orchestrator.start_conversation("begin chat"));
    assert!(!orchestrator.converse(&utterances("begin chat"), "en-us"));
    assert_eq!(orchestrator.state(), ConversationState::Idle);

    // A later successful reset brings it back
    fixture.storage.fail_remove.set(false);
    orchestrator.reset_memory().unwrap();
    assert!(orchestrator.is_available());
    assert!(orchestrator.handle("hello"));
}

#[test]
fn test_reset_fails_when_corpus_is_gone() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    std::fs::remove_dir_all(fixture.corpus_dir()).unwrap();

    assert!(orchestrator.reset_memory().is_err());
    assert!(!orchestrator.is_available());
    assert!(!orchestrator.converse(&utterances("hello"), "en-us"));
}

#[test]
fn test_end_conversation_answers_and_goes_idle() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.start_conversation("begin chat");

    assert!(orchestrator.end_conversation("end chat"));
    assert_eq!(orchestrator.state(), ConversationState::Idle);
    assert_eq!(
        orchestrator.speaker().last(),
        Some(&("Okay, talk to you later.".to_string(), false))
    );
}

#[test]
fn test_statement_hands_floor_back() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.start_conversation("begin chat");

    assert!(orchestrator.converse(&utterances("I like trains"), "en-us"));
    assert_eq!(orchestrator.state(), ConversationState::Idle);
    // Idle again: continuation declines without querying
    assert!(!orchestrator.converse(&utterances("how are you"), "en-us"));
}

#[test]
fn test_stop_leaves_conversation() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    orchestrator.start_conversation("begin chat");
    orchestrator.stop();
    assert_eq!(orchestrator.state(), ConversationState::Idle);
}

#[test]
fn test_bot_predicates_and_srai() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();

    assert!(orchestrator.handle("who are you"));
    assert_eq!(
        orchestrator.speaker().last(),
        Some(&("My name is Marvin.".to_string(), false))
    );
}

#[test]
fn test_initialize_and_shutdown_registration() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    let mut registry = PriorityRegistry::default();

    orchestrator.initialize(&mut registry).unwrap();
    assert!(registry.contains("AimlFallback"));
    assert!(orchestrator.status().registered);

    orchestrator.start_conversation("begin chat");
    orchestrator.shutdown(&mut registry);
    assert!(registry.is_empty());
    assert_eq!(orchestrator.state(), ConversationState::Idle);
    assert!(!orchestrator.status().registered);
}

#[test]
fn test_shutdown_survives_engine_failure() {
    let fixture = Fixture::standard();
    let mut orchestrator = fixture.orchestrator();
    let mut registry = PriorityRegistry::default();
    orchestrator.initialize(&mut registry).unwrap();

    orchestrator.brain_mut().engine_mut().fail_reset = true;
    orchestrator.shutdown(&mut registry);
    assert!(registry.is_empty());
}

#[test]
fn test_bootstrap_failure_yields_no_orchestrator() {
    let fixture = Fixture::standard();
    std::fs::remove_dir_all(fixture.corpus_dir()).unwrap();

    let result = fallbot_common::FallbackOrchestrator::new(
        fixture.repository(),
        common::RecordingSpeaker::default(),
        &fixture.config,
    );
    assert!(matches!(
        result.err(),
        Some(FallbotError::CorpusUnavailable { .. })
    ));
}
