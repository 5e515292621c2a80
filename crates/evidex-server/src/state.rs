// crates/evidex-server/src/state.rs
// ============================================================================
// Module: Application State
// Description: Wires storage, the Tool Broker, ingestion, and the pipeline
//              tracker into the one handle every handler shares.
// Purpose: Single construction site for the HTTP/WebSocket surface's
//          collaborators.
// Dependencies: evidex-broker, evidex-config, evidex-core, evidex-events,
//               evidex-ingest, evidex-pipeline, evidex-providers,
//               evidex-store-sqlite
// ============================================================================

//! ## Overview
//! [`AppState`] owns every long-lived collaborator the HTTP/WebSocket
//! surface needs: the evidence model store (doubling as the
//! [`AuditLedger`](evidex_core::interfaces::AuditLedger) and
//! [`CheckpointStore`](evidex_core::interfaces::CheckpointStore)), a
//! filesystem-backed [`ArtifactStore`](evidex_core::interfaces::ArtifactStore),
//! the Tool Broker built over five HTTP-backed providers, the ingestion
//! pipeline, the Policy Engine, and the in-process event bus/notification
//! hub. Handlers clone the pieces they need out of `Arc<AppState>`; nothing
//! here is request-scoped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use evidex_broker::ToolBroker;
use evidex_broker::ToolBrokerBuilder;
use evidex_config::AppConfig;
use evidex_config::BudgetContext;
use evidex_config::BudgetRequest;
use evidex_config::PolicyEngine;
use evidex_core::core::ArtifactIdentity;
use evidex_core::core::ArtifactIdentityKind;
use evidex_core::core::ArtifactKind;
use evidex_core::core::CaseKind;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::interfaces::ArtifactStore;
use evidex_core::interfaces::AuditLedger;
use evidex_core::interfaces::CheckpointStore;
use evidex_events::bus::EventBus;
use evidex_events::notify::NotificationHub;
use evidex_ingest::IngestConfig;
use evidex_ingest::IngestionPipeline;
use evidex_providers::BoundedHttpClient;
use evidex_providers::HttpArchiveTool;
use evidex_providers::HttpEmbedTool;
use evidex_providers::HttpGenerateTool;
use evidex_providers::HttpParseTool;
use evidex_providers::HttpProviderConfig;
use evidex_providers::HttpProviderError;
use evidex_providers::HttpSearchTool;
use evidex_store_sqlite::EvidexSqliteStore;
use evidex_store_sqlite::FsArtifactStore;
use evidex_store_sqlite::SqliteStoreError;

use crate::error::ApiError;

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared, long-lived collaborators behind every HTTP/WebSocket handler.
pub struct AppState {
    /// Typed entity store; also used directly for read projections.
    pub store: Arc<EvidexSqliteStore>,
    /// The same store, widened to the audit ledger trait object.
    pub ledger: Arc<dyn AuditLedger>,
    /// The same store, widened to the checkpoint store trait object.
    pub checkpoints: Arc<dyn CheckpointStore>,
    /// Filesystem-backed artifact byte storage.
    pub artifacts: Arc<dyn ArtifactStore>,
    /// The single choke-point for outbound search/archive/parse/embed/generate.
    pub broker: Arc<ToolBroker>,
    /// Document -> chunk -> embedding ingestion flow.
    pub ingestion: Arc<IngestionPipeline>,
    /// Policy Engine backing both the broker and direct policy checks.
    pub policy: Arc<PolicyEngine>,
    /// Loaded application configuration.
    pub config: AppConfig,
    /// In-process pipeline/ingestion event bus.
    pub events: Arc<EventBus>,
    /// Per-user notification fan-out registry.
    pub notifications: Arc<NotificationHub>,
}

/// Errors raised while constructing [`AppState`].
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The evidence model store failed to open.
    #[error("failed to open evidence model store: {0}")]
    Store(#[from] SqliteStoreError),
    /// The bounded HTTP client failed to build.
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] HttpProviderError),
}

impl AppState {
    /// Wires every collaborator from `config` over an already-open `store`
    /// and an artifact root directory.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the bounded HTTP client fails to build.
    pub fn new(
        config: AppConfig,
        store: EvidexSqliteStore,
        artifact_root: impl Into<std::path::PathBuf>,
    ) -> Result<Self, StateError> {
        let store = Arc::new(store);
        let ledger: Arc<dyn AuditLedger> = store.clone();
        let checkpoints: Arc<dyn CheckpointStore> = store.clone();
        let artifacts: Arc<dyn ArtifactStore> = Arc::new(FsArtifactStore::new(artifact_root.into()));

        let policy = Arc::new(PolicyEngine::new(config.policy.clone()));
        let http_client = Arc::new(BoundedHttpClient::new(HttpProviderConfig::default())?);

        let search = Arc::new(HttpSearchTool::new(http_client.clone(), format!("{}/search", config.llm.base_url)));
        let archive = Arc::new(HttpArchiveTool::new(http_client.clone()));
        let parse = Arc::new(HttpParseTool::new(http_client.clone(), format!("{}/parse", config.llm.base_url)));
        let embed = Arc::new(HttpEmbedTool::new(http_client.clone(), format!("{}/embed", config.llm.base_url)));
        let generate =
            Arc::new(HttpGenerateTool::new(http_client, format!("{}/generate", config.llm.base_url)));

        let broker = Arc::new(
            ToolBrokerBuilder::new(policy.clone(), ledger.clone(), search, archive, parse, embed, generate).build(),
        );

        let ingestion = Arc::new(IngestionPipeline::new(broker.clone(), artifacts.clone(), IngestConfig::default()));

        Ok(Self {
            store,
            ledger,
            checkpoints,
            artifacts,
            broker,
            ingestion,
            policy,
            config,
            events: Arc::new(EventBus::new()),
            notifications: Arc::new(NotificationHub::new()),
        })
    }

    /// Builds a [`BudgetRequest`] against the configured default model,
    /// with a permissive budget: this crate does not track a live
    /// token/cost ledger across requests, so every call is admitted unless
    /// the Policy Engine itself denies it.
    #[must_use]
    pub fn budget_request(&self) -> BudgetRequest {
        BudgetRequest {
            model_id: self.config.llm.default_model.clone(),
            prompt_version: "v1".to_string(),
            budget_context: BudgetContext {
                remaining_tokens: i64::MAX,
                remaining_cost: f64::MAX,
            },
            fallback_model_id: self.config.llm.fallback_model.clone(),
        }
    }

    /// Returns the `osint_collect` stage's artifact identity for `case_uid`,
    /// creating it on first use. The identity is deterministic so repeated
    /// calls within the same case reuse the same uid.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the store read or write fails.
    pub async fn osint_artifact_identity(
        &self,
        case_uid: Uid<CaseKind>,
        now: Timestamp,
    ) -> Result<Uid<ArtifactIdentityKind>, ApiError> {
        let uid = Uid::from_seed(format!("osint:{case_uid}").as_bytes());
        if self.store.get_artifact_identity(uid).await?.is_none() {
            let identity = ArtifactIdentity {
                uid,
                case_uid,
                canonical_url: None,
                kind: ArtifactKind::WebPage,
                created_at: now,
            };
            self.store.create_artifact_identity(&identity).await?;
        }
        Ok(uid)
    }
}
