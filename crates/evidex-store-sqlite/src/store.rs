// crates/evidex-store-sqlite/src/store.rs
// ============================================================================
// Module: Evidence Model Store
// Description: SQLite-backed durable storage for every entity in the evidence model.
// Purpose: Implement AuditLedger, ArtifactStore, CheckpointStore plus typed CRUD per entity.
// Dependencies: evidex-core, rusqlite, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`EvidexSqliteStore`] is the sole persistence backend for the evidence
//! model: one row per entity, keyed by its own uid, with `case_uid`
//! cascading deletes per the data model's ownership invariant. `rusqlite`
//! is blocking, so every [`evidex_core::interfaces`] trait method bridges
//! onto `tokio`'s blocking pool the same way `evidex-providers` bridges its
//! blocking HTTP client.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use evidex_core::core::Action;
use evidex_core::core::ActionKind;
use evidex_core::core::ActorId;
use evidex_core::core::CaseKind;
use evidex_core::core::HashDigest;
use evidex_core::core::PolicyDecisionSummary;
use evidex_core::core::SpanId;
use evidex_core::core::Timestamp;
use evidex_core::core::ToolTrace;
use evidex_core::core::ToolTraceStatus;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use evidex_core::core::hashing;
use evidex_core::interfaces::ArtifactStoreError;
use evidex_core::interfaces::AuditError;
use evidex_core::interfaces::AuditLedger;
use evidex_core::interfaces::Checkpoint;
use evidex_core::interfaces::CheckpointError;
use evidex_core::interfaces::CheckpointStore;
use parking_lot::Mutex;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::initialize_schema;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the evidence model `SQLite` store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Default busy timeout for `SQLite` connections, in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store data failed a decode/encode step.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// A uniqueness or foreign-key constraint was violated.
    #[error("sqlite store integrity conflict: {0}")]
    IntegrityConflict(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// No row found for the requested key.
    #[error("sqlite store key not found: {0}")]
    NotFound(String),
}

impl SqliteStoreError {
    /// Maps this error onto the shared wire taxonomy.
    #[must_use]
    pub const fn kind(&self) -> evidex_core::error::ErrorKind {
        match self {
            Self::Io(_) | Self::Db(_) | Self::VersionMismatch(_) => evidex_core::error::ErrorKind::Internal,
            Self::Invalid(_) => evidex_core::error::ErrorKind::ValidationError,
            Self::IntegrityConflict(_) => evidex_core::error::ErrorKind::IntegrityConflict,
            Self::NotFound(_) => evidex_core::error::ErrorKind::NotFound,
        }
    }
}

impl From<SqliteStoreError> for AuditError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::IntegrityConflict(message) => Self::IntegrityConflict(message),
            other => Self::Io(other.to_string()),
        }
    }
}

impl From<SqliteStoreError> for ArtifactStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
            other => Self::Io(other.to_string()),
        }
    }
}

impl From<SqliteStoreError> for CheckpointError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Io(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed durable storage for the evidence model.
#[derive(Clone)]
pub struct EvidexSqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl EvidexSqliteStore {
    /// Opens (and, if absent, initializes) the evidence model store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// the schema cannot be initialized/validated.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs `work` against the guarded connection on `tokio`'s blocking pool.
    async fn with_connection<T, F>(&self, work: F) -> Result<T, SqliteStoreError>
    where
        F: FnOnce(&Connection) -> Result<T, SqliteStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection.lock();
            work(&guard)
        })
        .await
        .map_err(|err| SqliteStoreError::Io(format!("blocking task failed: {err}")))?
    }
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Opens an `SQLite` connection with durability pragmas applied.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

// ============================================================================
// SECTION: Generic Row Helpers
// ============================================================================

/// Inserts a JSON-serialized row keyed by `uid`, optionally scoped to `case_uid`.
fn insert_json_row(
    connection: &Connection,
    table: &str,
    columns: &[(&str, &str)],
    data: &[u8],
) -> Result<(), SqliteStoreError> {
    let mut names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    names.push("data");
    let placeholders: Vec<String> = (1..=names.len()).map(|idx| format!("?{idx}")).collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    );
    let mut stmt = connection.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let mut values: Vec<&dyn rusqlite::ToSql> =
        columns.iter().map(|(_, value)| value as &dyn rusqlite::ToSql).collect();
    values.push(&data);
    stmt.execute(rusqlite::params_from_iter(values)).map_err(map_insert_error)?;
    Ok(())
}

/// Maps a constraint violation to [`SqliteStoreError::IntegrityConflict`].
fn map_insert_error(err: rusqlite::Error) -> SqliteStoreError {
    match err {
        rusqlite::Error::SqliteFailure(failure, ref message)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            SqliteStoreError::IntegrityConflict(
                message.clone().unwrap_or_else(|| "constraint violation".to_string()),
            )
        }
        other => SqliteStoreError::Db(other.to_string()),
    }
}

/// Fetches the `data` blob for a single row keyed by `uid`.
fn fetch_json_row(connection: &Connection, table: &str, uid: &str) -> Result<Option<Vec<u8>>, SqliteStoreError> {
    connection
        .query_row(&format!("SELECT data FROM {table} WHERE uid = ?1"), params![uid], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Fetches every `data` blob for rows matching `column = value`, ordered by `rowid`.
fn fetch_json_rows_by(
    connection: &Connection,
    table: &str,
    column: &str,
    value: &str,
) -> Result<Vec<Vec<u8>>, SqliteStoreError> {
    let sql = format!("SELECT data FROM {table} WHERE {column} = ?1 ORDER BY rowid");
    let mut stmt = connection.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let rows = stmt
        .query_map(params![value], |row| row.get::<_, Vec<u8>>(0))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Serializes `entity` to canonical JSON bytes.
fn encode<T: Serialize>(entity: &T) -> Result<Vec<u8>, SqliteStoreError> {
    hashing::canonical_json_bytes(entity).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Deserializes canonical JSON bytes into `T`.
fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, SqliteStoreError> {
    serde_json::from_slice(bytes).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

// ============================================================================
// SECTION: Typed Entity Repository
// ============================================================================

/// Declares typed `create_*`/`get_*`/`list_*_by_case` methods for one
/// evidence-model table, all sharing the [`insert_json_row`]/
/// [`fetch_json_row`]/[`fetch_json_rows_by`] helpers above.
macro_rules! entity_repo {
    ($table:literal, $entity:ty, $uid_kind:ty, $create:ident, $get:ident, $list_by_case:ident) => {
        impl EvidexSqliteStore {
            #[doc = concat!("Inserts a new ", stringify!($entity), " row.")]
            ///
            /// # Errors
            ///
            /// Returns [`SqliteStoreError::IntegrityConflict`] when the uid
            /// already exists, or [`SqliteStoreError::Db`]/`Invalid` on
            /// encoding or I/O failure.
            pub async fn $create(&self, entity: &$entity) -> Result<(), SqliteStoreError> {
                let data = encode(entity)?;
                let uid = entity.uid.to_wire_string();
                let case_uid = entity.case_uid.to_wire_string();
                self.with_connection(move |connection| {
                    insert_json_row($table, connection, &[("uid", &uid), ("case_uid", &case_uid)], &data)
                })
                .await
            }

            #[doc = concat!("Loads a single ", stringify!($entity), " by uid.")]
            ///
            /// # Errors
            ///
            /// Returns [`SqliteStoreError`] on decode or I/O failure.
            pub async fn $get(&self, uid: Uid<$uid_kind>) -> Result<Option<$entity>, SqliteStoreError> {
                let key = uid.to_wire_string();
                let bytes = self.with_connection(move |connection| fetch_json_row(connection, $table, &key)).await?;
                bytes.map(|bytes| decode(&bytes)).transpose()
            }

            #[doc = concat!("Lists every ", stringify!($entity), " belonging to a case.")]
            ///
            /// # Errors
            ///
            /// Returns [`SqliteStoreError`] on decode or I/O failure.
            pub async fn $list_by_case(&self, case_uid: Uid<CaseKind>) -> Result<Vec<$entity>, SqliteStoreError> {
                let key = case_uid.to_wire_string();
                let rows = self
                    .with_connection(move |connection| fetch_json_rows_by(connection, $table, "case_uid", &key))
                    .await?;
                rows.iter().map(|bytes| decode(bytes)).collect()
            }
        }
    };
}

entity_repo!(
    "artifact_identities",
    evidex_core::core::ArtifactIdentity,
    evidex_core::core::ArtifactIdentityKind,
    create_artifact_identity,
    get_artifact_identity,
    list_artifact_identities_by_case
);
entity_repo!(
    "evidence",
    evidex_core::core::Evidence,
    evidex_core::core::EvidenceKind,
    create_evidence,
    get_evidence,
    list_evidence_by_case
);
entity_repo!(
    "assertions",
    evidex_core::core::Assertion,
    evidex_core::core::AssertionKind,
    create_assertion,
    get_assertion,
    list_assertions_by_case
);
entity_repo!(
    "hypotheses",
    evidex_core::core::Hypothesis,
    evidex_core::core::HypothesisKind,
    create_hypothesis,
    get_hypothesis,
    list_hypotheses_by_case
);
entity_repo!(
    "judgments",
    evidex_core::core::Judgment,
    evidex_core::core::JudgmentKind,
    create_judgment,
    get_judgment,
    list_judgments_by_case
);
entity_repo!(
    "narratives",
    evidex_core::core::Narrative,
    evidex_core::core::NarrativeKind,
    create_narrative,
    get_narrative,
    list_narratives_by_case
);
entity_repo!(
    "subscriptions",
    evidex_core::core::Subscription,
    evidex_core::core::SubscriptionKind,
    create_subscription,
    get_subscription,
    list_subscriptions_by_case
);
entity_repo!(
    "investigations",
    evidex_core::core::Investigation,
    evidex_core::core::InvestigationKind,
    create_investigation,
    get_investigation,
    list_investigations_by_case
);

impl EvidexSqliteStore {
    /// Inserts a new case.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::IntegrityConflict`] when the uid already
    /// exists.
    pub async fn create_case(&self, case: &evidex_core::core::Case) -> Result<(), SqliteStoreError> {
        let data = encode(case)?;
        let uid = case.uid.to_wire_string();
        self.with_connection(move |connection| insert_json_row(connection, "cases", &[("uid", &uid)], &data))
            .await
    }

    /// Loads a single case by uid.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn get_case(&self, uid: Uid<CaseKind>) -> Result<Option<evidex_core::core::Case>, SqliteStoreError> {
        let key = uid.to_wire_string();
        let bytes = self.with_connection(move |connection| fetch_json_row(connection, "cases", &key)).await?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    /// Inserts a new artifact version, scoped to its parent artifact identity.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on encode, constraint, or I/O failure.
    pub async fn create_artifact_version(
        &self,
        version: &evidex_core::core::ArtifactVersion,
    ) -> Result<(), SqliteStoreError> {
        let data = encode(version)?;
        let uid = version.uid.to_wire_string();
        let case_uid = version.case_uid.to_wire_string();
        let identity_uid = version.artifact_identity_uid.to_wire_string();
        let sha256 = version.content_sha256.value.clone();
        self.with_connection(move |connection| {
            insert_json_row(
                connection,
                "artifact_versions",
                &[
                    ("uid", &uid),
                    ("case_uid", &case_uid),
                    ("artifact_identity_uid", &identity_uid),
                    ("content_sha256", &sha256),
                ],
                &data,
            )
        })
        .await
    }

    /// Loads a single artifact version by uid.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn get_artifact_version(
        &self,
        uid: Uid<evidex_core::core::ArtifactVersionKind>,
    ) -> Result<Option<evidex_core::core::ArtifactVersion>, SqliteStoreError> {
        let key = uid.to_wire_string();
        let bytes =
            self.with_connection(move |connection| fetch_json_row(connection, "artifact_versions", &key)).await?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    /// Inserts a new chunk, scoped to its parent artifact version.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on encode, constraint, or I/O failure.
    pub async fn create_chunk(&self, chunk: &evidex_core::core::Chunk) -> Result<(), SqliteStoreError> {
        let data = encode(chunk)?;
        let uid = chunk.uid.to_wire_string();
        let case_uid = chunk.case_uid.to_wire_string();
        let artifact_version_uid = chunk.artifact_version_uid.to_wire_string();
        let ordinal = chunk.ordinal.to_string();
        self.with_connection(move |connection| {
            insert_json_row(
                connection,
                "chunks",
                &[
                    ("uid", &uid),
                    ("case_uid", &case_uid),
                    ("artifact_version_uid", &artifact_version_uid),
                    ("ordinal", &ordinal),
                ],
                &data,
            )
        })
        .await
    }

    /// Loads a single chunk by uid.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn get_chunk(
        &self,
        uid: Uid<evidex_core::core::ChunkKind>,
    ) -> Result<Option<evidex_core::core::Chunk>, SqliteStoreError> {
        let key = uid.to_wire_string();
        let bytes = self.with_connection(move |connection| fetch_json_row(connection, "chunks", &key)).await?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    /// Loads every chunk belonging to an artifact version, in ordinal order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn list_chunks_by_artifact_version(
        &self,
        artifact_version_uid: Uid<evidex_core::core::ArtifactVersionKind>,
    ) -> Result<Vec<evidex_core::core::Chunk>, SqliteStoreError> {
        let key = artifact_version_uid.to_wire_string();
        let rows = self
            .with_connection(move |connection| fetch_json_rows_by(connection, "chunks", "artifact_version_uid", &key))
            .await?;
        rows.iter().map(|bytes| decode(bytes)).collect()
    }

    /// Inserts a new source claim, scoped to its parent evidence row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on encode, constraint, or I/O failure.
    pub async fn create_source_claim(
        &self,
        claim: &evidex_core::core::SourceClaim,
    ) -> Result<(), SqliteStoreError> {
        let data = encode(claim)?;
        let uid = claim.uid.to_wire_string();
        let case_uid = claim.case_uid.to_wire_string();
        let evidence_uid = claim.evidence_uid.to_wire_string();
        self.with_connection(move |connection| {
            insert_json_row(
                connection,
                "source_claims",
                &[("uid", &uid), ("case_uid", &case_uid), ("evidence_uid", &evidence_uid)],
                &data,
            )
        })
        .await
    }

    /// Loads every source claim citing a given evidence row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn list_source_claims_by_evidence(
        &self,
        evidence_uid: Uid<evidex_core::core::EvidenceKind>,
    ) -> Result<Vec<evidex_core::core::SourceClaim>, SqliteStoreError> {
        let key = evidence_uid.to_wire_string();
        let rows = self
            .with_connection(move |connection| fetch_json_rows_by(connection, "source_claims", "evidence_uid", &key))
            .await?;
        rows.iter().map(|bytes| decode(bytes)).collect()
    }

    /// Loads a single source claim by uid.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn get_source_claim(
        &self,
        uid: Uid<evidex_core::core::SourceClaimKind>,
    ) -> Result<Option<evidex_core::core::SourceClaim>, SqliteStoreError> {
        let key = uid.to_wire_string();
        let bytes = self.with_connection(move |connection| fetch_json_row(connection, "source_claims", &key)).await?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    /// Lists every source claim belonging to a case (read projection for
    /// `GET /cases/{uid}/...` style endpoints).
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn list_source_claims_by_case(
        &self,
        case_uid: Uid<CaseKind>,
    ) -> Result<Vec<evidex_core::core::SourceClaim>, SqliteStoreError> {
        let key = case_uid.to_wire_string();
        let rows = self
            .with_connection(move |connection| fetch_json_rows_by(connection, "source_claims", "case_uid", &key))
            .await?;
        rows.iter().map(|bytes| decode(bytes)).collect()
    }

    /// Inserts a new evidence assessment. The `(hypothesis_uid, evidence_uid)`
    /// pair must be unique, enforced by the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::IntegrityConflict`] when an assessment
    /// already exists for this hypothesis/evidence pair.
    pub async fn create_evidence_assessment(
        &self,
        assessment: &evidex_core::core::EvidenceAssessment,
    ) -> Result<(), SqliteStoreError> {
        let data = encode(assessment)?;
        let uid = assessment.uid.to_wire_string();
        let case_uid = assessment.case_uid.to_wire_string();
        let hypothesis_uid = assessment.hypothesis_uid.to_wire_string();
        let evidence_uid = assessment.evidence_uid.to_wire_string();
        self.with_connection(move |connection| {
            insert_json_row(
                connection,
                "evidence_assessments",
                &[
                    ("uid", &uid),
                    ("case_uid", &case_uid),
                    ("hypothesis_uid", &hypothesis_uid),
                    ("evidence_uid", &evidence_uid),
                ],
                &data,
            )
        })
        .await
    }

    /// Loads every evidence assessment for a hypothesis.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn list_evidence_assessments_by_hypothesis(
        &self,
        hypothesis_uid: Uid<evidex_core::core::HypothesisKind>,
    ) -> Result<Vec<evidex_core::core::EvidenceAssessment>, SqliteStoreError> {
        let key = hypothesis_uid.to_wire_string();
        let rows = self
            .with_connection(move |connection| {
                fetch_json_rows_by(connection, "evidence_assessments", "hypothesis_uid", &key)
            })
            .await?;
        rows.iter().map(|bytes| decode(bytes)).collect()
    }

    /// Appends a new probability update. Rows are never updated or deleted
    /// once written, per the data model's append-only invariant.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on encode, constraint, or I/O failure.
    pub async fn append_probability_update(
        &self,
        update: &evidex_core::core::ProbabilityUpdate,
    ) -> Result<(), SqliteStoreError> {
        let data = encode(update)?;
        let uid = update.uid.to_wire_string();
        let case_uid = update.case_uid.to_wire_string();
        let hypothesis_uid = update.hypothesis_uid.to_wire_string();
        self.with_connection(move |connection| {
            insert_json_row(
                connection,
                "probability_updates",
                &[("uid", &uid), ("case_uid", &case_uid), ("hypothesis_uid", &hypothesis_uid)],
                &data,
            )
        })
        .await
    }

    /// Loads the full probability update history for a hypothesis, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn list_probability_updates_by_hypothesis(
        &self,
        hypothesis_uid: Uid<evidex_core::core::HypothesisKind>,
    ) -> Result<Vec<evidex_core::core::ProbabilityUpdate>, SqliteStoreError> {
        let key = hypothesis_uid.to_wire_string();
        let rows = self
            .with_connection(move |connection| {
                fetch_json_rows_by(connection, "probability_updates", "hypothesis_uid", &key)
            })
            .await?;
        rows.iter().map(|bytes| decode(bytes)).collect()
    }

    /// Appends an event log entry, deduplicating on `source_event_uid`.
    ///
    /// # Errors
    ///
    /// Returns `Ok(false)` (not an error) when `source_event_uid` was
    /// already recorded; returns [`SqliteStoreError`] on other failures.
    pub async fn append_event_log(
        &self,
        entry: &evidex_core::core::EventLog,
    ) -> Result<bool, SqliteStoreError> {
        let data = encode(entry)?;
        let uid = entry.uid.to_wire_string();
        let case_uid = entry.case_uid.map(|case_uid| case_uid.to_wire_string());
        let source_event_uid = entry.source_event_uid.clone();
        self.with_connection(move |connection| {
            let result = insert_json_row(
                connection,
                "event_log",
                &[
                    ("uid", &uid),
                    ("case_uid", case_uid.as_deref().unwrap_or_default()),
                    ("source_event_uid", &source_event_uid),
                ],
                &data,
            );
            match result {
                Ok(()) => Ok(true),
                Err(SqliteStoreError::IntegrityConflict(_)) => Ok(false),
                Err(other) => Err(other),
            }
        })
        .await
    }

    /// Appends a push log entry recording a notification delivery attempt.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on encode or I/O failure.
    pub async fn append_push_log(&self, entry: &evidex_core::core::PushLog) -> Result<(), SqliteStoreError> {
        let data = encode(entry)?;
        let uid = entry.uid.to_wire_string();
        let subscription_uid = entry.subscription_uid.map(|uid| uid.to_wire_string());
        self.with_connection(move |connection| {
            insert_json_row(
                connection,
                "push_log",
                &[("uid", &uid), ("subscription_uid", subscription_uid.as_deref().unwrap_or_default())],
                &data,
            )
        })
        .await
    }
}

// ============================================================================
// SECTION: AuditLedger
// ============================================================================

#[async_trait]
impl AuditLedger for EvidexSqliteStore {
    async fn record_action(
        &self,
        case_uid: Uid<CaseKind>,
        action_type: &str,
        actor_id: &ActorId,
        rationale: &str,
        inputs: Value,
        outputs: Value,
        trace_id: &TraceId,
        span_id: &SpanId,
    ) -> Result<Action, AuditError> {
        let action = Action {
            uid: Uid::random(),
            case_uid,
            action_type: action_type.to_string(),
            actor_id: actor_id.clone(),
            rationale: rationale.to_string(),
            inputs,
            outputs,
            trace_id: trace_id.clone(),
            span_id: span_id.clone(),
            created_at: Timestamp::new(now()),
        };
        let data = encode(&action).map_err(SqliteStoreError::into)?;
        let uid = action.uid.to_wire_string();
        let case_uid_key = action.case_uid.to_wire_string();
        self.with_connection(move |connection| {
            insert_json_row(connection, "actions", &[("uid", &uid), ("case_uid", &case_uid_key)], &data)
        })
        .await?;
        Ok(action)
    }

    async fn record_tool_trace(
        &self,
        action_uid: Uid<ActionKind>,
        tool_name: &str,
        request: Value,
        response: Option<Value>,
        status: ToolTraceStatus,
        duration_ms: u64,
        error: Option<String>,
        policy: PolicyDecisionSummary,
    ) -> Result<ToolTrace, AuditError> {
        let case_uid = self
            .with_connection({
                let action_uid_key = action_uid.to_wire_string();
                move |connection| {
                    connection
                        .query_row(
                            "SELECT case_uid FROM actions WHERE uid = ?1",
                            params![action_uid_key],
                            |row| row.get::<_, String>(0),
                        )
                        .optional()
                        .map_err(|err| SqliteStoreError::Db(err.to_string()))
                }
            })
            .await?
            .ok_or_else(|| AuditError::IntegrityConflict(format!("unknown action uid {action_uid}")))?;
        let case_uid: Uid<CaseKind> =
            case_uid.parse().map_err(|err: evidex_core::core::UidParseError| AuditError::Io(err.to_string()))?;
        let trace = ToolTrace {
            uid: Uid::random(),
            case_uid,
            action_uid,
            tool_name: tool_name.to_string(),
            request,
            response,
            status,
            duration_ms,
            error,
            policy,
            created_at: Timestamp::new(now()),
        };
        let data = encode(&trace).map_err(SqliteStoreError::into)?;
        let uid = trace.uid.to_wire_string();
        let case_uid_key = trace.case_uid.to_wire_string();
        let action_uid_key = trace.action_uid.to_wire_string();
        self.with_connection(move |connection| {
            insert_json_row(
                connection,
                "tool_traces",
                &[("uid", &uid), ("case_uid", &case_uid_key), ("action_uid", &action_uid_key)],
                &data,
            )
        })
        .await?;
        Ok(trace)
    }
}

impl EvidexSqliteStore {
    /// Loads a single action by uid (read projection; audit rows are never
    /// mutated after insert).
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn get_action(&self, uid: Uid<ActionKind>) -> Result<Option<Action>, SqliteStoreError> {
        let key = uid.to_wire_string();
        let bytes = self.with_connection(move |connection| fetch_json_row(connection, "actions", &key)).await?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    /// Loads a single tool trace by uid.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn get_tool_trace(
        &self,
        uid: Uid<evidex_core::core::ToolTraceKind>,
    ) -> Result<Option<ToolTrace>, SqliteStoreError> {
        let key = uid.to_wire_string();
        let bytes = self.with_connection(move |connection| fetch_json_row(connection, "tool_traces", &key)).await?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    /// Lists every tool trace recorded for an action.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on decode or I/O failure.
    pub async fn list_tool_traces_by_action(
        &self,
        action_uid: Uid<ActionKind>,
    ) -> Result<Vec<ToolTrace>, SqliteStoreError> {
        let key = action_uid.to_wire_string();
        let rows = self
            .with_connection(move |connection| fetch_json_rows_by(connection, "tool_traces", "action_uid", &key))
            .await?;
        rows.iter().map(|bytes| decode(bytes)).collect()
    }
}

/// Returns the current instant, used to stamp audit records and checkpoints.
fn now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_utc()
}

// ============================================================================
// SECTION: ArtifactStore
// ============================================================================

#[async_trait]
impl evidex_core::interfaces::ArtifactStore for EvidexSqliteStore {
    async fn put(&self, digest: &HashDigest, bytes: &[u8]) -> Result<String, ArtifactStoreError> {
        let storage_key = format!("{}/{}", digest.prefix(2), digest.value);
        let sha256 = digest.value.clone();
        let payload = bytes.to_vec();
        let key = storage_key.clone();
        self.with_connection(move |connection| {
            connection
                .execute(
                    "INSERT INTO artifact_blobs (storage_key, sha256, bytes) VALUES (?1, ?2, ?3) \
                     ON CONFLICT(storage_key) DO NOTHING",
                    params![key, sha256, payload],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))
        })
        .await?;
        Ok(storage_key)
    }

    async fn get(&self, storage_key: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        let key = storage_key.to_string();
        let bytes = self
            .with_connection(move |connection| {
                connection
                    .query_row("SELECT bytes FROM artifact_blobs WHERE storage_key = ?1", params![key], |row| {
                        row.get::<_, Vec<u8>>(0)
                    })
                    .optional()
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))
            })
            .await?;
        bytes.ok_or_else(|| ArtifactStoreError::NotFound(storage_key.to_string()))
    }

    async fn exists(&self, storage_key: &str) -> Result<bool, ArtifactStoreError> {
        let key = storage_key.to_string();
        let found: Option<i64> = self
            .with_connection(move |connection| {
                connection
                    .query_row("SELECT 1 FROM artifact_blobs WHERE storage_key = ?1", params![key], |row| {
                        row.get(0)
                    })
                    .optional()
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))
            })
            .await?;
        Ok(found.is_some())
    }
}

// ============================================================================
// SECTION: CheckpointStore
// ============================================================================

#[async_trait]
impl CheckpointStore for EvidexSqliteStore {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        let data = encode(&checkpoint).map_err(SqliteStoreError::into)?;
        let uid = checkpoint.uid.to_wire_string();
        let thread_id = checkpoint.thread_id.to_wire_string();
        let created_at = checkpoint
            .created_at
            .as_offset_date_time()
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|err| CheckpointError::Io(err.to_string()))?;
        self.with_connection(move |connection| {
            insert_json_row(
                connection,
                "checkpoints",
                &[("uid", &uid), ("thread_id", &thread_id), ("created_at", &created_at)],
                &data,
            )
        })
        .await?;
        Ok(())
    }

    async fn load_latest(
        &self,
        thread_id: Uid<evidex_core::core::RunKind>,
    ) -> Result<Option<Checkpoint>, CheckpointError> {
        let key = thread_id.to_wire_string();
        let bytes = self
            .with_connection(move |connection| {
                connection
                    .query_row(
                        "SELECT data FROM checkpoints WHERE thread_id = ?1 ORDER BY created_at DESC LIMIT 1",
                        params![key],
                        |row| row.get::<_, Vec<u8>>(0),
                    )
                    .optional()
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))
            })
            .await?;
        bytes.map(|bytes| decode(&bytes).map_err(CheckpointError::from)).transpose()
    }
}

impl From<SqliteStoreError> for evidex_core::interfaces::CheckpointError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Io(error.to_string())
    }
}
