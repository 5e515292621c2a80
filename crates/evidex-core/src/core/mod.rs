// crates/evidex-core/src/core/mod.rs
// ============================================================================
// Module: Core Data Model
// Description: Entity types and identifier/time/hashing primitives shared across the workspace.
// Purpose: Re-export the full data model with no business logic beyond invariant checks.
// ============================================================================

pub mod action;
pub mod artifact;
pub mod assertion;
pub mod case;
pub mod chunk;
pub mod claim;
pub mod evidence;
pub mod hashing;
pub mod hypothesis;
pub mod identifiers;
pub mod investigation;
pub mod judgment;
pub mod narrative;
pub mod probability;
pub mod subscription;
pub mod time;
pub mod tooltrace;

pub use action::Action;
pub use artifact::ArtifactIdentity;
pub use artifact::ArtifactKind;
pub use artifact::ArtifactVersion;
pub use artifact::SourceMeta;
pub use assertion::Assertion;
pub use assertion::AssertionError;
pub use assertion::AssertionValue;
pub use case::Case;
pub use chunk::Anchor;
pub use chunk::AnchorHealth;
pub use chunk::AnchorSet;
pub use chunk::Chunk;
pub use evidence::Evidence;
pub use evidence::RetentionPolicy;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hypothesis::AdversarialResult;
pub use hypothesis::Gap;
pub use hypothesis::Hypothesis;
pub use hypothesis::HypothesisError;
pub use identifiers::ActionKind;
pub use identifiers::ActorId;
pub use identifiers::ArtifactIdentityKind;
pub use identifiers::ArtifactVersionKind;
pub use identifiers::AssertionKind;
pub use identifiers::CaseKind;
pub use identifiers::CheckpointKind;
pub use identifiers::ChunkKind;
pub use identifiers::EventLogKind;
pub use identifiers::EvidenceAssessmentKind;
pub use identifiers::EvidenceKind;
pub use identifiers::HypothesisKind;
pub use identifiers::InvestigationKind;
pub use identifiers::JudgmentKind;
pub use identifiers::NarrativeKind;
pub use identifiers::ProbabilityUpdateKind;
pub use identifiers::PushLogKind;
pub use identifiers::RunKind;
pub use identifiers::SourceClaimKind;
pub use identifiers::SpanId;
pub use identifiers::SubscriptionKind;
pub use identifiers::ToolTraceKind;
pub use identifiers::TraceId;
pub use identifiers::Uid;
pub use identifiers::UidKind;
pub use identifiers::UidParseError;
pub use investigation::Investigation;
pub use investigation::InvestigationConfig;
pub use investigation::InvestigationRound;
pub use investigation::InvestigationStatus;
pub use judgment::EpistemicTier;
pub use judgment::Judgment;
pub use narrative::Narrative;
pub use narrative::NarrativeError;
pub use probability::EvidenceAssessment;
pub use probability::ProbabilityUpdate;
pub use probability::Relation;
pub use subscription::DeliveryStatus;
pub use subscription::EventLog;
pub use subscription::NotificationKind;
pub use subscription::PushLog;
pub use subscription::Subscription;
pub use time::Timestamp;
pub use time::TimestampParseError;
pub use tooltrace::PolicyDecisionSummary;
pub use tooltrace::ToolTrace;
pub use tooltrace::ToolTraceStatus;

pub use claim::MediaTimeRange;
pub use claim::Modality;
pub use claim::SourceClaim;
pub use claim::TextQuoteSelector;
