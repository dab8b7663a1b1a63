#![deny(unsafe_code)]

//! Multi-source record consolidation engine.
//!
//! Consolidates many independently produced tables describing the same
//! patients (and usually patient visits) into one table per modality without
//! losing conflicting information:
//!
//! 1. [`merge`] joins two tables on an adaptively selected key set (primary
//!    key alone, or primary + secondary when both sides carry the visit
//!    column), marking same-named non-key columns as collision pairs.
//! 2. [`resolve_collisions`] fuses each collision pair back into one column
//!    under the value-combination rule in [`combine`]: equal values collapse,
//!    one-sided values pass through, and genuine conflicts are pipe-joined
//!    rather than dropped.
//! 3. [`consolidate`] folds the merge over an ordered sequence of tables.
//! 4. [`aggregate`] collapses duplicate key tuples into single rows with the
//!    same combination rule, guaranteeing one output row per key.
//!
//! The engine is a pure pipeline: every stage takes owned tables and returns
//! a fresh table, holds no cross-call state, and performs no I/O.

pub mod aggregate;
pub mod collision;
pub mod combine;
pub mod consolidate;
pub mod error;
pub mod merge;

pub use aggregate::aggregate;
pub use collision::{CollisionSet, LEFT_MARKER, RIGHT_MARKER, resolve_collisions};
pub use combine::{CONFLICT_DELIMITER, combine, combine_all};
pub use consolidate::{consolidate, consolidate_onto_index, key_index};
pub use error::{EngineError, Result};
pub use merge::{JoinKind, merge, merge_with};
