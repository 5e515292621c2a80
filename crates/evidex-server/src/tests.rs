// crates/evidex-server/src/tests.rs
// ============================================================================
// Module: Evidex Server Unit Tests
// Description: Exercises handlers directly over an in-memory AppState.
// Purpose: Validate case lifecycle, projection, and quality-scoring handlers
//          without a running HTTP listener or live Tool Broker endpoints.
// Dependencies: evidex-server
// ============================================================================

//! ## Overview
//! Handlers are called directly, building state in-process and invoking
//! handler/parsing functions rather than driving them through a
//! `tower`/HTTP harness.
//! Tests that would otherwise need a live Tool Broker endpoint (fixture
//! import, chat, multi-perspective generation) are out of scope here: those
//! paths call `doc_parse`/`generate_structured` over real HTTP and belong
//! in an integration suite with a stubbed provider.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions."
)]

use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::Json;
use evidex_config::AppConfig;
use evidex_config::GraphStoreConfig;
use evidex_config::LlmConfig;
use evidex_config::ObjectStoreConfig;
use evidex_config::VectorStoreConfig;
use evidex_contract::types::CreateCaseRequest;
use evidex_contract::types::ScoreJudgmentRequest;
use evidex_core::core::Assertion;
use evidex_core::core::AssertionKind;
use evidex_core::core::AssertionValue;
use evidex_core::core::CaseKind;
use evidex_core::core::EpistemicTier;
use evidex_core::core::Judgment;
use evidex_core::core::JudgmentKind;
use evidex_core::core::SourceClaimKind;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::error::ErrorKind;
use evidex_store_sqlite::EvidexSqliteStore;
use evidex_store_sqlite::SqliteStoreConfig;
use evidex_store_sqlite::SqliteStoreMode;
use evidex_store_sqlite::SqliteSyncMode;
use tempfile::tempdir;
use time::OffsetDateTime;

use crate::handlers::cases::create_case;
use crate::handlers::cases::get_case;
use crate::handlers::cases::list_case_artifacts;
use crate::handlers::analysis::score_judgment_handler;
use crate::handlers::projections::get_assertion;
use crate::state::AppState;

fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
    let dir = tempdir().expect("tempdir");
    let store_path = dir.path().join("evidex.sqlite3");
    let store = EvidexSqliteStore::open(SqliteStoreConfig {
        path: store_path,
        busy_timeout_ms: 5_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    })
    .expect("open store");

    let config = AppConfig {
        policy: evidex_config::PolicyConfig::default(),
        llm: LlmConfig {
            base_url: "http://127.0.0.1:0".to_string(),
            api_key: None,
            default_model: "test-model".to_string(),
            fallback_model: None,
        },
        object_store: ObjectStoreConfig { endpoint: "http://127.0.0.1:0".to_string(), bucket: "test".to_string() },
        vector_store: VectorStoreConfig { endpoint: "http://127.0.0.1:0".to_string(), collection: "test".to_string() },
        graph_store: GraphStoreConfig { endpoint: "http://127.0.0.1:0".to_string() },
        cache_ttl_secs: 3600,
    };

    let artifact_root = dir.path().join("artifacts");
    let state = Arc::new(AppState::new(config, store, artifact_root).expect("build app state"));
    (state, dir)
}

#[tokio::test]
async fn create_case_then_get_case_roundtrip() {
    let (state, _dir) = test_state();
    let request = CreateCaseRequest {
        title: "port closure".to_string(),
        actor_id: Some("analyst-1".to_string()),
        rationale: None,
    };
    let created = create_case(State(state.clone()), Json(request)).await.expect("create case");
    assert_eq!(created.title, "port closure");

    let fetched = get_case(State(state.clone()), Path(created.case_uid)).await.expect("get case");
    assert_eq!(fetched.title, "port closure");
    assert_eq!(fetched.uid, created.case_uid);
}

#[tokio::test]
async fn get_case_missing_uid_returns_not_found() {
    let (state, _dir) = test_state();
    let missing = Uid::<CaseKind>::random();
    let err = match get_case(State(state), Path(missing)).await {
        Ok(_) => panic!("expected not_found"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn list_case_artifacts_empty_for_new_case() {
    let (state, _dir) = test_state();
    let request = CreateCaseRequest { title: "empty case".to_string(), actor_id: None, rationale: None };
    let created = create_case(State(state.clone()), Json(request)).await.expect("create case");

    let artifacts = list_case_artifacts(State(state), Path(created.case_uid)).await.expect("list artifacts");
    assert!(artifacts.is_empty());
}

#[tokio::test]
async fn get_assertion_missing_uid_returns_not_found() {
    let (state, _dir) = test_state();
    let missing = Uid::<AssertionKind>::random();
    let err = match get_assertion(State(state), Path(missing)).await {
        Ok(_) => panic!("expected not_found"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn score_judgment_reflects_evidence_coverage() {
    let (state, _dir) = test_state();
    let now = Timestamp::new(OffsetDateTime::now_utc());

    let request = CreateCaseRequest { title: "scored case".to_string(), actor_id: None, rationale: None };
    let created = create_case(State(state.clone()), Json(request)).await.expect("create case");
    let case_uid = created.case_uid;

    let assertion = Assertion::new(
        Uid::random(),
        case_uid,
        AssertionValue::Factual {
            subject: "the port".to_string(),
            predicate: "closed its eastern terminal".to_string(),
            object: None,
        },
        vec![Uid::<SourceClaimKind>::random()],
        0.8,
        now,
    )
    .expect("valid assertion");
    state.store.create_assertion(&assertion).await.expect("persist assertion");

    let judgment = Judgment {
        uid: Uid::<JudgmentKind>::random(),
        case_uid,
        title: "what happened at the port".to_string(),
        answer_tier: EpistemicTier::Fact,
        answer_text: "the port closed its eastern terminal".to_string(),
        evidence_citations: vec![assertion.uid],
        cannot_answer_reason: None,
        created_at: now,
    };
    state.store.create_judgment(&judgment).await.expect("persist judgment");

    let report = score_judgment_handler(
        State(state),
        Path(case_uid),
        Json(ScoreJudgmentRequest { judgment_uid: judgment.uid.to_wire_string() }),
    )
    .await
    .expect("score judgment");

    assert!((0.0..=1.0).contains(&report.evidence_coverage));
    assert!(report.evidence_coverage > 0.0, "citing the case's only assertion should yield positive coverage");
}
