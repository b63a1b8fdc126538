//! Tutor service integration tests
//!
//! Drives chat and explain flows through the public API with a mock
//! provider, covering the LLM-then-fallback contract, session history
//! shaping, and the message cap.

use algoscope::catalog::AlgorithmKind;
use algoscope::config::SessionConfig;
use algoscope::llm::provider::MessageRole;
use algoscope::session::SessionStore;
use algoscope::testing::mocks::MockLlmProvider;
use algoscope::tutor::{ReplySource, TutorService, TutorSettings};
use std::sync::Arc;

fn service_with(provider: MockLlmProvider) -> (TutorService, Arc<MockLlmProvider>) {
    let provider = Arc::new(provider);
    let sessions = SessionStore::new(SessionConfig::default());
    let service = TutorService::new(
        Some(provider.clone()),
        sessions,
        TutorSettings {
            model: "mock-model".to_string(),
            ..TutorSettings::default()
        },
    );
    (service, provider)
}

fn fallback_service() -> TutorService {
    TutorService::new(
        None,
        SessionStore::new(SessionConfig::default()),
        TutorSettings::default(),
    )
}

#[tokio::test]
async fn test_chat_uses_llm_reply_and_records_both_sides() {
    let (service, provider) =
        service_with(MockLlmProvider::single_response("Compare, then swap."));

    let reply = service
        .chat("lesson-1", "What happens first?", Some(AlgorithmKind::BubbleSort))
        .await
        .unwrap();

    assert_eq!(reply.reply, "Compare, then swap.");
    assert_eq!(reply.source, ReplySource::Llm);
    assert_eq!(reply.model.as_deref(), Some("mock-model"));
    assert_eq!(reply.session_len, 2);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_chat_system_prompt_names_the_algorithm_under_discussion() {
    let (service, provider) = service_with(MockLlmProvider::single_response("ok"));

    service
        .chat("lesson-2", "Why backtrack?", Some(AlgorithmKind::NQueens))
        .await
        .unwrap();

    let requests = provider.get_captured_requests();
    assert_eq!(requests.len(), 1);

    let system = requests[0]
        .messages
        .iter()
        .find(|m| m.role == MessageRole::System)
        .expect("completion must carry a system message");
    assert!(system.content.contains("N-Queens"));

    let last = requests[0].messages.last().unwrap();
    assert_eq!(last.role, MessageRole::User);
    assert_eq!(last.content, "Why backtrack?");
}

#[tokio::test]
async fn test_chat_falls_back_when_provider_fails() {
    let (service, provider) = service_with(MockLlmProvider::with_failure());

    let reply = service
        .chat(
            "lesson-3",
            "What is the time complexity?",
            Some(AlgorithmKind::MergeSort),
        )
        .await
        .unwrap();

    // The request reached the provider, failed, and the fallback answered
    assert_eq!(provider.call_count(), 1);
    assert_eq!(reply.source, ReplySource::Fallback);
    assert!(reply.model.is_none());
    assert!(reply.reply.contains("O(n log n)"));
    assert_eq!(reply.session_len, 2);
}

#[tokio::test]
async fn test_chat_without_provider_answers_from_fallback() {
    let service = fallback_service();

    let reply = service
        .chat("lesson-4", "When is this used for real?", Some(AlgorithmKind::BellmanFord))
        .await
        .unwrap();

    assert_eq!(reply.source, ReplySource::Fallback);
    assert!(reply.reply.contains("RIP") || reply.reply.contains("routing"));
}

#[tokio::test]
async fn test_conversation_accumulates_and_respects_message_cap() {
    let (service, _provider) = service_with(MockLlmProvider::new(vec![
        "first".to_string(),
        "second".to_string(),
    ]));

    // Default cap is 20 messages; 15 exchanges produce 30
    let mut last_len = 0;
    for i in 0..15 {
        let reply = service
            .chat("lesson-5", &format!("question {i}"), None)
            .await
            .unwrap();
        last_len = reply.session_len;
    }

    assert_eq!(last_len, 20);
}

#[tokio::test]
async fn test_history_window_bounds_request_size() {
    let provider = Arc::new(MockLlmProvider::single_response("ok"));
    let sessions = SessionStore::new(SessionConfig::default());
    let service = TutorService::new(
        Some(provider.clone()),
        sessions,
        TutorSettings {
            model: "mock-model".to_string(),
            history_window: 4,
            ..TutorSettings::default()
        },
    );

    for i in 0..8 {
        service
            .chat("lesson-6", &format!("question {i}"), None)
            .await
            .unwrap();
    }

    // System prompt plus at most the last four session messages
    let requests = provider.get_captured_requests();
    let last = requests.last().unwrap();
    assert!(last.messages.len() <= 5);
}

#[tokio::test]
async fn test_explain_is_sessionless() {
    let (service, provider) = service_with(MockLlmProvider::single_response(
        "The cell takes the better of skip and take.",
    ));

    let reply = service
        .explain(AlgorithmKind::Knapsack01, Some("set cell (2, 7) = 12"))
        .await;

    assert_eq!(reply.source, ReplySource::Llm);
    assert_eq!(reply.session_len, 0);

    let requests = provider.get_captured_requests();
    let question = &requests[0].messages.last().unwrap().content;
    assert!(question.contains("set cell (2, 7) = 12"));
    assert!(question.contains("0/1 Knapsack"));
}

#[tokio::test]
async fn test_explain_without_provider_uses_catalog_text() {
    let service = fallback_service();

    let reply = service.explain(AlgorithmKind::LinkedList, None).await;

    assert_eq!(reply.source, ReplySource::Fallback);
    assert!(reply.reply.contains("head"));
}

#[tokio::test]
async fn test_empty_question_is_rejected_before_reaching_the_provider() {
    let (service, provider) = service_with(MockLlmProvider::single_response("unused"));

    let result = service.chat("lesson-7", "   ", None).await;

    assert!(result.is_err());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_provider_responses_cycle_across_turns() {
    let (service, _provider) = service_with(MockLlmProvider::new(vec![
        "first answer".to_string(),
        "second answer".to_string(),
    ]));

    let first = service.chat("lesson-8", "one?", None).await.unwrap();
    let second = service.chat("lesson-8", "two?", None).await.unwrap();
    let third = service.chat("lesson-8", "three?", None).await.unwrap();

    assert_eq!(first.reply, "first answer");
    assert_eq!(second.reply, "second answer");
    assert_eq!(third.reply, "first answer");
}

#[tokio::test]
async fn test_concurrent_chats_on_one_session_respect_the_message_cap() {
    let (service, provider) = service_with(MockLlmProvider::single_response("ok"));

    let chats = (0..15).map(|i| {
        let service = &service;
        async move {
            service
                .chat("lesson-9", &format!("question {i}"), None)
                .await
        }
    });
    let replies = futures::future::join_all(chats).await;

    for reply in replies {
        assert_eq!(reply.unwrap().source, ReplySource::Llm);
    }
    assert_eq!(provider.call_count(), 15);

    // 15 exchanges produce 30 messages; the store trims to the configured cap
    let last = service
        .chat("lesson-9", "one more", None)
        .await
        .unwrap();
    assert_eq!(last.session_len, SessionConfig::default().max_messages);
}
