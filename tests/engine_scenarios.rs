//! End-to-end verification scenarios against the mock provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use shinsa::{
    MatchConfig, MatchEngine, MatchKind, MockProvider, QuestionId, QuestionStore, StoreError,
    Worksheet, normalize,
};

fn test_config() -> MatchConfig {
    MatchConfig {
        similarity_threshold: 0.75,
        retry_backoff: Duration::from_millis(1),
        ..MatchConfig::default()
    }
}

#[tokio::test]
async fn semantic_and_exact_verdicts_for_inspection_worksheet() {
    let provider = Arc::new(MockProvider::new());
    // "チェックを実施済み" relates to "点検" at 0.82 under this model.
    provider.set_pair("チェックを実施済み", "点検", 0.82);

    let engine = MatchEngine::new(QuestionStore::new(), Arc::clone(&provider), &test_config());
    let ws = Worksheet::new("W");

    let store = engine.store();
    let q1 = store
        .insert_question(&ws, "前回の点検結果を記載", 1, None)
        .unwrap();
    let q2 = store
        .insert_question(&ws, "作業内容を記載", 2, Some(q1))
        .unwrap();
    store.insert_keyword(q1, "点検").unwrap();
    store.insert_keyword(q2, "作業手順").unwrap();

    let answers: HashMap<QuestionId, String> = [
        (q1, "チェックを実施済み".to_string()),
        (q2, "作業手順".to_string()),
    ]
    .into();

    let verdicts = engine.verify_worksheet(&ws, &answers).await.unwrap();

    assert_eq!(verdicts.len(), 2);

    let v1 = &verdicts[0];
    assert_eq!(v1.question, q1);
    assert_eq!(v1.kind, MatchKind::Semantic);
    assert!(v1.matched);
    assert_eq!(v1.keyword.as_ref().unwrap().text, "点検");
    assert!((v1.score - 0.82).abs() < 1e-3);

    let v2 = &verdicts[1];
    assert_eq!(v2.question, q2);
    assert_eq!(v2.kind, MatchKind::Exact);
    assert_eq!(v2.score, 1.0);

    // Q1 cost two provider calls (candidate + keyword); Q2's exact match
    // cost zero.
    assert_eq!(provider.call_count(), 2);
}

#[test]
fn normalization_strips_all_structural_noise() {
    let cleaned = normalize("1) 規定3 により 2023/05/10 に (AB-12345) を確認");
    assert_eq!(cleaned, "により に を確認");
}

#[test]
fn atomic_question_deletion_applies_all_or_nothing() {
    let store = QuestionStore::new();
    let ws = Worksheet::new("W");

    let mut ids = Vec::new();
    let mut tail = None;
    for i in 1..=5 {
        let id = store
            .insert_question(&ws, format!("Q{i}"), i, tail)
            .unwrap();
        tail = Some(id);
        ids.push(id);
    }

    // Delete Q5, then ask for {Q2, Q5}: Q5 no longer exists, so neither
    // deletion may be applied.
    store.delete_question(ids[4]).unwrap();
    assert_eq!(
        store.delete_questions(&[ids[1], ids[4]]),
        Err(StoreError::QuestionNotFound(ids[4]))
    );

    let remaining: Vec<QuestionId> = store
        .list_ordered(&ws)
        .unwrap()
        .iter()
        .map(|q| q.id)
        .collect();
    assert_eq!(remaining, vec![ids[0], ids[1], ids[2], ids[3]]);
}

#[tokio::test]
async fn verdicts_serialize_for_export() {
    let provider = Arc::new(MockProvider::new());
    let engine = MatchEngine::new(QuestionStore::new(), provider, &test_config());
    let ws = Worksheet::new("W");

    let q1 = engine.store().insert_question(&ws, "記載", 1, None).unwrap();
    engine.store().insert_keyword(q1, "点検").unwrap();

    let answers: HashMap<QuestionId, String> = [(q1, "点検".to_string())].into();
    let verdicts = engine.verify_worksheet(&ws, &answers).await.unwrap();

    let json = serde_json::to_value(&verdicts).unwrap();
    let first = &json[0];
    assert_eq!(first["matched"], true);
    assert_eq!(first["kind"], "exact");
    assert_eq!(first["keyword"]["text"], "点検");
}

#[tokio::test]
async fn undetermined_keyword_does_not_fail_the_report() {
    let provider = Arc::new(MockProvider::new());
    provider.fail_on("埋め込めない回答");
    provider.set_pair("チェックを実施済み", "点検", 0.82);

    let engine = MatchEngine::new(QuestionStore::new(), provider, &test_config());
    let ws_a = Worksheet::new("A");
    let ws_b = Worksheet::new("B");

    let qa = engine
        .store()
        .insert_question(&ws_a, "壊れる質問", 1, None)
        .unwrap();
    engine.store().insert_keyword(qa, "無関係").unwrap();
    let qb = engine
        .store()
        .insert_question(&ws_b, "点検質問", 1, None)
        .unwrap();
    engine.store().insert_keyword(qb, "点検").unwrap();

    let batches = vec![
        (
            ws_a.clone(),
            HashMap::from([(qa, "埋め込めない回答".to_string())]),
        ),
        (
            ws_b.clone(),
            HashMap::from([(qb, "チェックを実施済み".to_string())]),
        ),
    ];

    let reports = engine.verify_report(&batches).await;

    let verdicts_a = reports[0].verdicts.as_ref().unwrap();
    assert_eq!(verdicts_a[0].kind, MatchKind::Undetermined);

    let verdicts_b = reports[1].verdicts.as_ref().unwrap();
    assert_eq!(verdicts_b[0].kind, MatchKind::Semantic);
}
