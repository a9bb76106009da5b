// crates/data-lifecycle-config/src/lib.rs
// ============================================================================
// Module: Data Lifecycle Config Library
// Description: Canonical job configuration model and validation.
// Purpose: Single source of truth for data-lifecycle.toml semantics.
// Dependencies: data-lifecycle-core, serde, toml
// ============================================================================

//! ## Overview
//! `data-lifecycle-config` loads the job configuration from TOML, layers
//! command-line overrides on top, and validates the result before any
//! connection is opened.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
