//! Core use-case services.
//!
//! # Responsibility
//! - Assemble notes from parsed documents.
//! - Resolve named collections over candidate document paths.
//!
//! # Invariants
//! - Per-block and per-document failures never abort sibling blocks or
//!   sibling documents; callers choose strict or lenient entry points.

pub mod collection;
pub mod extract;
pub mod scaffold;
