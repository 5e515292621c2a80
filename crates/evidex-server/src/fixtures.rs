// crates/evidex-server/src/fixtures.rs
// ============================================================================
// Module: Built-In Fixture Bundles
// Description: Canned source documents importable by name for demo/test cases.
// Purpose: Give `POST /cases/{uid}/fixtures/import` something deterministic
//          to ingest without reaching an external network.
// Dependencies: none
// ============================================================================

//! ## Overview
//! A production deployment would resolve `fixture_name` against a curated
//! corpus (the defgeo/OSINT-style bundles named in early design notes);
//! this crate ships a small fixed set so the import endpoint and its tests
//! are self-contained.

/// One built-in fixture: a name plus the raw plaintext bytes to ingest.
pub struct Fixture {
    /// Fixture name, matched against `ImportFixtureRequest::fixture_name`.
    pub name: &'static str,
    /// Raw bytes to ingest as `text/plain`.
    pub bytes: &'static [u8],
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        name: "defgeo-001",
        bytes: b"The port of Veles closed its eastern terminal on 2026-01-05. \
Harbor authorities cited structural damage from the prior week's storm. \
Shipping traffic was rerouted through the northern terminal within 48 hours.",
    },
    Fixture {
        name: "osint-sample-001",
        bytes: b"A satellite image dated 2026-02-11 shows new construction at the \
site previously identified as a disused airfield. Vehicle activity increased \
threefold compared to the prior month's imagery.",
    },
];

/// Looks up a built-in fixture by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Fixture> {
    FIXTURES.iter().find(|fixture| fixture.name == name)
}
