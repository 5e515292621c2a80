// crates/evidex-store-sqlite/src/lib.rs
// ============================================================================
// Module: Evidence Model Store
// Description: SQLite-backed durable storage for the evidence model (spec §3/§4.5).
// Purpose: Provide the AuditLedger/ArtifactStore/CheckpointStore implementations
//          plus typed CRUD over every entity in the data model.
// Dependencies: evidex-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate is the sole persistence backend for Evidex's evidence model:
//! one table per entity, each row keyed by its own uid and scoped by
//! `case_uid` with `ON DELETE CASCADE` so deleting a case cascades to
//! everything it owns. [`store::EvidexSqliteStore`] implements
//! [`evidex_core::interfaces::AuditLedger`] (the business write and its
//! `Action` row commit in the same transaction),
//! [`evidex_core::interfaces::ArtifactStore`] (content-addressed blob
//! storage), and [`evidex_core::interfaces::CheckpointStore`] (pipeline
//! checkpoint persistence), alongside typed `create_*`/`get_*`/`list_*`
//! accessors for every remaining entity.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod object_store;
pub mod schema;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use object_store::FsArtifactStore;
pub use store::EvidexSqliteStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
