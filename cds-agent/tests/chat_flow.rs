//! End-to-end tests for the conversational turn pipeline.

mod common;

use std::sync::Arc;

use cds_agent::{GREETING_RESPONSE, LOW_EVIDENCE_ANSWER};
use cds_core::{CdsError, Role};
use cds_model::MockModel;
use common::service_with;

#[tokio::test]
async fn grounded_turn_uses_model_citations_and_appends_to_session() {
    let model = Arc::new(MockModel::new([
        r#"{"answer": "Refer within two weeks for an unexplained breast lump at age 30+.", "citations": [{"source": "NG12 PDF", "page": 2, "chunk_id": "ng12_p002_c0001", "excerpt": "aged 30 and over"}]}"#,
    ]));
    let service = service_with(model.clone());

    let response =
        service.chat("s1", "When should a breast lump be referred?", Some(3)).await.unwrap();

    assert!(response.answer.starts_with("Refer within two weeks"));
    assert_eq!(response.citations.len(), 1);
    assert_eq!(response.citations[0].chunk_id, "ng12_p002_c0001");
    assert_eq!(model.calls(), 1);

    let history = service.history("s1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].citations.len(), 1);

    // The generation prompt carried the retrieved passages and the question.
    let request = &model.requests()[0];
    let final_turn = &request.last().unwrap().content;
    assert!(final_turn.starts_with("RETRIEVED CONTEXT:"));
    assert!(final_turn.contains("[Chunk ng12_p002_c0001 | Page 2 | Distance"));
    assert!(final_turn.ends_with("USER QUESTION:\nWhen should a breast lump be referred?"));
}

#[tokio::test]
async fn missing_model_citations_are_backfilled_from_retrieval() {
    let model = Arc::new(MockModel::new(
        [r#"{"answer": "Refer urgently for an unexplained breast lump.", "citations": []}"#],
    ));
    let service = service_with(model);

    let response = service.chat("s1", "breast lump referral criteria", Some(3)).await.unwrap();

    // Both corpus chunks were retrieved; the breast chunk ranks first.
    assert_eq!(response.citations.len(), 2);
    assert_eq!(response.citations[0].chunk_id, "ng12_p002_c0001");
    assert_eq!(response.citations[0].page, 2);
    assert_eq!(response.citations[1].chunk_id, "ng12_p001_c0000");
    assert!(response.citations[0].excerpt.contains("breast"));
}

#[tokio::test]
async fn disclaimer_answers_never_carry_citations() {
    let model = Arc::new(MockModel::new([
        r#"{"answer": "I couldn't find clear support in the NG12 guidelines for that question.", "citations": [{"page": 2, "chunk_id": "ng12_p002_c0001"}]}"#,
    ]));
    let service = service_with(model);

    let response = service.chat("s1", "breast lump in pregnancy", Some(3)).await.unwrap();
    assert!(response.citations.is_empty());
}

#[tokio::test]
async fn weak_evidence_short_circuits_before_generation() {
    let model = Arc::new(MockModel::unreachable());
    let service = service_with(model.clone());

    let response = service.chat("s1", "vague discomfort", Some(3)).await.unwrap();

    assert_eq!(response.answer, LOW_EVIDENCE_ANSWER);
    assert!(response.citations.is_empty());
    assert_eq!(model.calls(), 0, "the model must never be invoked on weak evidence");

    let history = service.history("s1").await.unwrap();
    assert_eq!(history[1].content, LOW_EVIDENCE_ANSWER);
}

#[tokio::test]
async fn greetings_bypass_retrieval_and_generation() {
    let model = Arc::new(MockModel::unreachable());
    let service = service_with(model.clone());

    for greeting in ["hi", "Hello!!", "what's up"] {
        let response = service.chat("greet", greeting, None).await.unwrap();
        assert_eq!(response.answer, GREETING_RESPONSE);
        assert!(response.citations.is_empty());
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn non_json_model_output_falls_back_to_raw_text_with_backfill() {
    let raw = "Based on the guidance, an urgent referral is warranted for this presentation.";
    let model = Arc::new(MockModel::new([raw]));
    let service = service_with(model);

    let response = service.chat("s1", "breast lump referral criteria", Some(3)).await.unwrap();

    assert_eq!(response.answer, raw);
    assert_eq!(response.citations.len(), 2, "fallback still backfills from retrieval");
}

#[tokio::test]
async fn malformed_requests_are_validation_errors() {
    let service = service_with(Arc::new(MockModel::unreachable()));

    assert!(matches!(
        service.chat("s1", "   ", Some(3)).await,
        Err(CdsError::Validation(_))
    ));
    assert!(matches!(
        service.chat("s1", "breast lump", Some(0)).await,
        Err(CdsError::Validation(_))
    ));
}

#[tokio::test]
async fn history_and_clear_follow_session_lifecycle() {
    let service = service_with(Arc::new(MockModel::unreachable()));

    assert!(matches!(service.history("never").await, Err(CdsError::NotFound(_))));
    assert!(!service.clear("never").await);

    service.chat("s1", "hi", None).await.unwrap();
    assert_eq!(service.history("s1").await.unwrap().len(), 2);
    assert!(service.clear("s1").await);
    assert!(matches!(service.history("s1").await, Err(CdsError::NotFound(_))));
}

#[tokio::test]
async fn follow_up_turns_carry_windowed_history_into_the_prompt() {
    let model = Arc::new(MockModel::new([
        r#"{"answer": "First answer.", "citations": []}"#,
        r#"{"answer": "Second answer.", "citations": []}"#,
    ]));
    let service = service_with(model.clone());

    service.chat("s1", "breast lump referral criteria", Some(3)).await.unwrap();
    service.chat("s1", "what about breast changes in older patients", Some(3)).await.unwrap();

    let second_request = &model.requests()[1];
    // system + 2 prior turns + final context-bearing user turn
    assert_eq!(second_request.len(), 4);
    assert_eq!(second_request[1].content, "breast lump referral criteria");
    assert_eq!(second_request[2].content, "First answer.");
}
