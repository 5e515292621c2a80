// crates/evidex-store-sqlite/src/schema.rs
// ============================================================================
// Module: Evidence Model Schema
// Description: SQLite DDL for every entity in the evidence model.
// Purpose: Give each entity one content-addressed-by-uid table, case-scoped for cascade delete.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! Every entity is stored as one row keyed by its own uid, with the full
//! struct persisted as canonical JSON in `data` and the handful of columns
//! needed for lookups/joins/uniqueness promoted alongside it, the same
//! "whole-record JSON blob plus indexed lookup columns" shape a schema
//! registry uses for its own `data_shapes` table. Every entity table
//! carries `case_uid REFERENCES cases(uid) ON DELETE CASCADE` so deleting a
//! case cascades to all of its evidence, per the data model's ownership
//! invariant.

use rusqlite::Connection;

use crate::store::SqliteStoreError;

/// Current schema version. Bump and add a migration arm in
/// [`initialize_schema`] when the table shape changes.
const SCHEMA_VERSION: i64 = 1;

/// Initializes the schema on a freshly opened connection, or validates the
/// stored version against [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns [`SqliteStoreError::Db`] on any DDL failure, or
/// [`SqliteStoreError::VersionMismatch`] when an existing database carries
/// an unsupported schema version.
pub fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", [], |row| row.get(0))
        .ok();
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", [SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(DDL).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Full data definition language for the evidence model.
const DDL: &str = "
CREATE TABLE IF NOT EXISTS cases (
    uid TEXT PRIMARY KEY,
    data BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS artifact_identities (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_artifact_identities_case ON artifact_identities(case_uid);

CREATE TABLE IF NOT EXISTS artifact_versions (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    artifact_identity_uid TEXT NOT NULL REFERENCES artifact_identities(uid) ON DELETE CASCADE,
    content_sha256 TEXT NOT NULL,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_artifact_versions_case ON artifact_versions(case_uid);
CREATE INDEX IF NOT EXISTS idx_artifact_versions_identity ON artifact_versions(artifact_identity_uid);

CREATE TABLE IF NOT EXISTS chunks (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    artifact_version_uid TEXT NOT NULL REFERENCES artifact_versions(uid) ON DELETE CASCADE,
    ordinal INTEGER NOT NULL,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_artifact_version ON chunks(artifact_version_uid);

CREATE TABLE IF NOT EXISTS evidence (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    chunk_uid TEXT NOT NULL REFERENCES chunks(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_evidence_case ON evidence(case_uid);

CREATE TABLE IF NOT EXISTS source_claims (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    evidence_uid TEXT NOT NULL REFERENCES evidence(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_source_claims_evidence ON source_claims(evidence_uid);

CREATE TABLE IF NOT EXISTS assertions (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assertions_case ON assertions(case_uid);

CREATE TABLE IF NOT EXISTS hypotheses (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hypotheses_case ON hypotheses(case_uid);

CREATE TABLE IF NOT EXISTS evidence_assessments (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    hypothesis_uid TEXT NOT NULL REFERENCES hypotheses(uid) ON DELETE CASCADE,
    evidence_uid TEXT NOT NULL REFERENCES evidence(uid) ON DELETE CASCADE,
    data BLOB NOT NULL,
    UNIQUE(hypothesis_uid, evidence_uid)
);
CREATE INDEX IF NOT EXISTS idx_evidence_assessments_hypothesis ON evidence_assessments(hypothesis_uid);

CREATE TABLE IF NOT EXISTS probability_updates (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    hypothesis_uid TEXT NOT NULL REFERENCES hypotheses(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_probability_updates_hypothesis ON probability_updates(hypothesis_uid);

CREATE TABLE IF NOT EXISTS judgments (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_judgments_case ON judgments(case_uid);

CREATE TABLE IF NOT EXISTS narratives (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_narratives_case ON narratives(case_uid);

CREATE TABLE IF NOT EXISTS subscriptions (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_subscriptions_case ON subscriptions(case_uid);

CREATE TABLE IF NOT EXISTS event_log (
    uid TEXT PRIMARY KEY,
    case_uid TEXT REFERENCES cases(uid) ON DELETE CASCADE,
    source_event_uid TEXT NOT NULL UNIQUE,
    data BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS push_log (
    uid TEXT PRIMARY KEY,
    subscription_uid TEXT REFERENCES subscriptions(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS investigations (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_investigations_case ON investigations(case_uid);

CREATE TABLE IF NOT EXISTS actions (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_actions_case ON actions(case_uid);

CREATE TABLE IF NOT EXISTS tool_traces (
    uid TEXT PRIMARY KEY,
    case_uid TEXT NOT NULL REFERENCES cases(uid) ON DELETE CASCADE,
    action_uid TEXT NOT NULL REFERENCES actions(uid) ON DELETE CASCADE,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tool_traces_action ON tool_traces(action_uid);

CREATE TABLE IF NOT EXISTS checkpoints (
    uid TEXT PRIMARY KEY,
    thread_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    data BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_checkpoints_thread ON checkpoints(thread_id, created_at);

CREATE TABLE IF NOT EXISTS artifact_blobs (
    storage_key TEXT PRIMARY KEY,
    sha256 TEXT NOT NULL,
    bytes BLOB NOT NULL
);
";
