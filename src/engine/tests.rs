use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{AnswerMap, EngineError, MatchEngine};
use crate::config::MatchConfig;
use crate::embedding::{EmbeddingCache, MockProvider};
use crate::matcher::MatchKind;
use crate::store::{QuestionStore, StoreError, Worksheet};

fn test_config() -> MatchConfig {
    MatchConfig {
        retry_backoff: Duration::from_millis(1),
        ..MatchConfig::default()
    }
}

fn engine_with(provider: Arc<MockProvider>) -> MatchEngine<MockProvider> {
    MatchEngine::new(QuestionStore::new(), provider, &test_config())
}

#[tokio::test]
async fn test_verdicts_follow_traversal_order() {
    let provider = Arc::new(MockProvider::new());
    let engine = engine_with(provider);
    let ws = Worksheet::new("inspection");

    let store = engine.store();
    let q1 = store.insert_question(&ws, "first", 1, None).unwrap();
    let q2 = store.insert_question(&ws, "second", 2, Some(q1)).unwrap();
    let q3 = store.insert_question(&ws, "third", 3, Some(q2)).unwrap();
    store.insert_keyword(q1, "点検").unwrap();
    store.insert_keyword(q2, "確認").unwrap();
    store.insert_keyword(q3, "記録").unwrap();

    // Reorder after seeding: verdicts must follow the *current* order.
    store.move_question(q3, None).unwrap();

    let answers: AnswerMap = [
        (q1, "点検".to_string()),
        (q2, "確認".to_string()),
        (q3, "記録".to_string()),
    ]
    .into();

    let verdicts = engine.verify_worksheet(&ws, &answers).await.unwrap();
    assert_eq!(
        verdicts.iter().map(|v| v.question).collect::<Vec<_>>(),
        vec![q3, q1, q2]
    );
    assert!(verdicts.iter().all(|v| v.kind == MatchKind::Exact));
}

#[tokio::test]
async fn test_missing_answer_yields_no_match_without_matcher() {
    let provider = Arc::new(MockProvider::new());
    let engine = engine_with(Arc::clone(&provider));
    let ws = Worksheet::new("inspection");

    let q1 = engine.store().insert_question(&ws, "first", 1, None).unwrap();
    engine.store().insert_keyword(q1, "点検").unwrap();

    let verdicts = engine.verify_worksheet(&ws, &HashMap::new()).await.unwrap();

    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].kind, MatchKind::None);
    assert!(!verdicts[0].matched);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_answers_are_normalized_before_matching() {
    let provider = Arc::new(MockProvider::new());
    let engine = engine_with(Arc::clone(&provider));
    let ws = Worksheet::new("inspection");

    let q1 = engine.store().insert_question(&ws, "first", 1, None).unwrap();
    engine.store().insert_keyword(q1, "点検済").unwrap();

    // Noise around the exact keyword must not defeat the exact match.
    let answers: AnswerMap = [(q1, "1) 点検済".to_string())].into();
    let verdicts = engine.verify_worksheet(&ws, &answers).await.unwrap();

    assert_eq!(verdicts[0].kind, MatchKind::Exact);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_keyword_edits_visible_to_next_run() {
    let provider = Arc::new(MockProvider::new());
    let engine = engine_with(provider);
    let ws = Worksheet::new("inspection");

    let q1 = engine.store().insert_question(&ws, "first", 1, None).unwrap();
    let answers: AnswerMap = [(q1, "点検".to_string())].into();

    let verdicts = engine.verify_worksheet(&ws, &answers).await.unwrap();
    assert_eq!(verdicts[0].kind, MatchKind::None);

    engine.store().insert_keyword(q1, "点検").unwrap();
    let verdicts = engine.verify_worksheet(&ws, &answers).await.unwrap();
    assert_eq!(verdicts[0].kind, MatchKind::Exact);
}

#[tokio::test]
async fn test_provider_failure_marks_question_undetermined_not_batch() {
    let provider = Arc::new(MockProvider::new());
    provider.fail_on("壊れた答え");
    provider.set_pair("チェック済み", "点検", 0.9);
    let engine = engine_with(provider);
    let ws = Worksheet::new("inspection");

    let store = engine.store();
    let q1 = store.insert_question(&ws, "first", 1, None).unwrap();
    let q2 = store.insert_question(&ws, "second", 2, Some(q1)).unwrap();
    store.insert_keyword(q1, "存在しない").unwrap();
    store.insert_keyword(q2, "点検").unwrap();

    let answers: AnswerMap = [
        (q1, "壊れた答え".to_string()),
        (q2, "チェック済み".to_string()),
    ]
    .into();

    let verdicts = engine.verify_worksheet(&ws, &answers).await.unwrap();
    assert_eq!(verdicts[0].kind, MatchKind::Undetermined);
    assert_eq!(verdicts[1].kind, MatchKind::Semantic);
}

#[tokio::test]
async fn test_engines_sharing_one_cache_reuse_embeddings() {
    let provider = Arc::new(MockProvider::new());
    provider.set_pair("チェック済み", "点検", 0.9);
    let cache = Arc::new(EmbeddingCache::new(Arc::clone(&provider)));
    let threshold = MatchConfig::default().similarity_threshold;

    let first = MatchEngine::with_cache(QuestionStore::new(), Arc::clone(&cache), threshold);
    let second = MatchEngine::with_cache(QuestionStore::new(), cache, threshold);

    let ws = Worksheet::new("inspection");
    for engine in [&first, &second] {
        let q = engine.store().insert_question(&ws, "first", 1, None).unwrap();
        engine.store().insert_keyword(q, "点検").unwrap();
        let answers: AnswerMap = [(q, "チェック済み".to_string())].into();
        let verdicts = engine.verify_worksheet(&ws, &answers).await.unwrap();
        assert_eq!(verdicts[0].kind, MatchKind::Semantic);
    }

    // The second engine's run is served entirely from the shared cache.
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_verify_report_runs_worksheets_concurrently() {
    let provider = Arc::new(MockProvider::new());
    let engine = engine_with(provider);

    let ws_a = Worksheet::new("a");
    let ws_b = Worksheet::new("b");
    let qa = engine.store().insert_question(&ws_a, "qa", 1, None).unwrap();
    let qb = engine.store().insert_question(&ws_b, "qb", 1, None).unwrap();
    engine.store().insert_keyword(qa, "一").unwrap();
    engine.store().insert_keyword(qb, "二").unwrap();

    let batches = vec![
        (ws_a.clone(), AnswerMap::from([(qa, "一".to_string())])),
        (ws_b.clone(), AnswerMap::from([(qb, "二".to_string())])),
    ];

    let reports = engine.verify_report(&batches).await;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].worksheet, ws_a);
    assert_eq!(reports[1].worksheet, ws_b);
    for report in &reports {
        let verdicts = report.verdicts.as_ref().unwrap();
        assert!(verdicts[0].matched);
    }
}

#[tokio::test]
async fn test_corrupt_worksheet_fails_alone() {
    let provider = Arc::new(MockProvider::new());
    let engine = engine_with(provider);

    let ws_good = Worksheet::new("good");
    let ws_bad = Worksheet::new("bad");
    let qg = engine
        .store()
        .insert_question(&ws_good, "qg", 1, None)
        .unwrap();
    engine.store().insert_keyword(qg, "一").unwrap();
    engine
        .store()
        .insert_question(&ws_bad, "qb1", 1, None)
        .unwrap();
    engine.store().force_list_count(&ws_bad, 2);

    let batches = vec![
        (ws_good.clone(), AnswerMap::from([(qg, "一".to_string())])),
        (ws_bad.clone(), AnswerMap::new()),
    ];

    let reports = engine.verify_report(&batches).await;
    assert!(reports[0].verdicts.is_ok());
    assert!(matches!(
        reports[1].verdicts,
        Err(EngineError::Store(StoreError::CorruptOrdering { .. }))
    ));
}
