// crates/evidex-core/src/core/identifiers.rs
// ============================================================================
// Module: Evidex Identifiers
// Description: Canonical, kind-prefixed opaque identifiers for every entity.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every entity in the evidence model carries a globally unique, opaque
//! identifier prefixed by kind (`case_`, `av_`, `ev_`, …) for debuggability,
//! per the data model's identifier convention. Rather than hand-rolling one
//! newtype per kind, [`Uid<K>`] is generic over a zero-sized marker type `K`
//! implementing [`UidKind`], so `Uid<CaseKind>` and `Uid<EvidenceKind>` are
//! distinct, non-interchangeable types that share one parsing, formatting,
//! and random-generation implementation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Kind Markers
// ============================================================================

/// A zero-sized marker type binding a [`Uid`] to its kind prefix.
///
/// # Invariants
/// - `PREFIX` is a stable, lowercase, non-empty identifier segment.
pub trait UidKind: Clone + fmt::Debug {
    /// Stable kind prefix (e.g. `"case"`, `"av"`, `"ev"`).
    const PREFIX: &'static str;
}

/// Declares a zero-sized [`UidKind`] marker and its prefix.
macro_rules! uid_kind {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("Marker type for ", $prefix, "_* identifiers.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl UidKind for $name {
            const PREFIX: &'static str = $prefix;
        }
    };
}

uid_kind!(CaseKind, "case");
uid_kind!(ArtifactIdentityKind, "artid");
uid_kind!(ArtifactVersionKind, "av");
uid_kind!(ChunkKind, "chunk");
uid_kind!(EvidenceKind, "ev");
uid_kind!(SourceClaimKind, "sc");
uid_kind!(AssertionKind, "a");
uid_kind!(HypothesisKind, "h");
uid_kind!(EvidenceAssessmentKind, "ea");
uid_kind!(ProbabilityUpdateKind, "pu");
uid_kind!(NarrativeKind, "nar");
uid_kind!(JudgmentKind, "j");
uid_kind!(ActionKind, "act");
uid_kind!(ToolTraceKind, "tt");
uid_kind!(InvestigationKind, "inv");
uid_kind!(SubscriptionKind, "sub");
uid_kind!(EventLogKind, "evl");
uid_kind!(PushLogKind, "pl");
uid_kind!(RunKind, "run");
uid_kind!(CheckpointKind, "chk");

// ============================================================================
// SECTION: Uid
// ============================================================================

/// A kind-prefixed opaque identifier, e.g. `case_8f3a…`.
///
/// # Invariants
/// - Wire form is always `"<K::PREFIX>_<32 lowercase hex chars>"`.
/// - Two `Uid<K>` values with different `K` never compare equal, even if
///   their suffixes collide, because `K` is part of the Rust type.
pub struct Uid<K: UidKind> {
    suffix: [u8; 16],
    _kind: PhantomData<K>,
}

impl<K: UidKind> Uid<K> {
    /// Builds a uid deterministically from a seed (used for fixtures and
    /// reproducible tests; production code should prefer [`Uid::random`]).
    #[must_use]
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        let mut suffix = [0_u8; 16];
        suffix.copy_from_slice(&digest[..16]);
        Self {
            suffix,
            _kind: PhantomData,
        }
    }

    /// Builds a uid from an externally supplied random source.
    #[must_use]
    pub fn from_bytes(suffix: [u8; 16]) -> Self {
        Self {
            suffix,
            _kind: PhantomData,
        }
    }

    /// Builds a fresh, cryptographically-irrelevant random uid. Used by
    /// every crate that mints new entity identifiers at runtime.
    #[must_use]
    pub fn random() -> Self {
        let suffix: [u8; 16] = rand::random();
        Self::from_bytes(suffix)
    }

    /// Returns the kind prefix for this uid.
    #[must_use]
    pub const fn kind_prefix() -> &'static str {
        K::PREFIX
    }
}

impl<K: UidKind> Clone for Uid<K> {
    fn clone(&self) -> Self {
        Self {
            suffix: self.suffix,
            _kind: PhantomData,
        }
    }
}

impl<K: UidKind> Copy for Uid<K> {}

impl<K: UidKind> PartialEq for Uid<K> {
    fn eq(&self, other: &Self) -> bool {
        self.suffix == other.suffix
    }
}

impl<K: UidKind> Eq for Uid<K> {}

impl<K: UidKind> std::hash::Hash for Uid<K> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.suffix.hash(state);
    }
}

impl<K: UidKind> PartialOrd for Uid<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: UidKind> Ord for Uid<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.suffix.cmp(&other.suffix)
    }
}

impl<K: UidKind> fmt::Debug for Uid<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.to_wire_string())
    }
}

impl<K: UidKind> fmt::Display for Uid<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire_string())
    }
}

impl<K: UidKind> Uid<K> {
    /// Renders the canonical `"<prefix>_<hex>"` wire form.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        let mut out = String::with_capacity(K::PREFIX.len() + 1 + self.suffix.len() * 2);
        out.push_str(K::PREFIX);
        out.push('_');
        for byte in self.suffix {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

/// Errors raised when parsing a [`Uid`] from its wire form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UidParseError {
    /// The prefix did not match the expected kind.
    #[error("uid prefix mismatch: expected `{expected}_`, got `{actual}`")]
    PrefixMismatch {
        /// Expected kind prefix.
        expected: &'static str,
        /// Raw string that failed to parse.
        actual: String,
    },
    /// The suffix was not valid lowercase hex of the expected length.
    #[error("uid suffix is not 32 lowercase hex characters: `{0}`")]
    InvalidSuffix(String),
}

impl<K: UidKind> FromStr for Uid<K> {
    type Err = UidParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let prefix = K::PREFIX;
        let Some(suffix_str) = raw.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('_'))
        else {
            return Err(UidParseError::PrefixMismatch {
                expected: prefix,
                actual: raw.to_string(),
            });
        };
        if suffix_str.len() != 32 || !suffix_str.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(UidParseError::InvalidSuffix(raw.to_string()));
        }
        let mut suffix = [0_u8; 16];
        for (idx, chunk) in suffix_str.as_bytes().chunks(2).enumerate() {
            let byte_str = std::str::from_utf8(chunk).map_err(|_err| {
                UidParseError::InvalidSuffix(raw.to_string())
            })?;
            let byte = u8::from_str_radix(byte_str, 16)
                .map_err(|_err| UidParseError::InvalidSuffix(raw.to_string()))?;
            suffix[idx] = byte;
        }
        Ok(Self {
            suffix,
            _kind: PhantomData,
        })
    }
}

impl<K: UidKind> Serialize for Uid<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire_string())
    }
}

impl<'de, K: UidKind> Deserialize<'de> for Uid<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(DeError::custom)
    }
}

// ============================================================================
// SECTION: Plain Identifiers
// ============================================================================

/// Actor identifier (user, agent, or system principal); opaque, unprefixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates a new actor identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Distributed-trace identifier, propagated across stages and tool calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Creates a new trace identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Span identifier, scoped within a [`TraceId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(String);

impl SpanId {
    /// Creates a new span identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_wire_string() {
        let uid = Uid::<CaseKind>::from_seed(b"case-one");
        let wire = uid.to_wire_string();
        assert!(wire.starts_with("case_"));
        let parsed: Uid<CaseKind> = wire.parse().expect("roundtrip parse");
        assert_eq!(uid, parsed);
    }

    #[test]
    fn rejects_mismatched_prefix() {
        let wire = Uid::<CaseKind>::from_seed(b"case-one").to_wire_string();
        let err = wire.parse::<Uid<EvidenceKind>>().expect_err("prefix mismatch");
        assert!(matches!(err, UidParseError::PrefixMismatch { expected: "ev", .. }));
    }

    #[test]
    fn distinct_kinds_are_distinct_types() {
        let case_uid = Uid::<CaseKind>::from_seed(b"same-seed");
        let ev_uid = Uid::<EvidenceKind>::from_seed(b"same-seed");
        // Same seed bytes, but distinct wire forms due to the kind prefix.
        assert_ne!(case_uid.to_wire_string(), ev_uid.to_wire_string());
    }
}
