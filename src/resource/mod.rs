//! Resource abstraction layer
//!
//! This module sits between a declarative caller and the raw API calls in
//! [`crate::clouding`]. It knows which calls make up a create, read, update
//! or delete, waits for asynchronous actions, and merges what the provider
//! returns into the record the caller holds.
//!
//! # Architecture
//!
//! - [`reconcile`] - Read normalization steps and merge rules
//! - [`lifecycle`] - Per-resource flows and the [`Tracked`](lifecycle::Tracked) state wrapper

pub mod lifecycle;
pub mod reconcile;
