//! Dialogue Engine — a branching dialogue runtime for games.
//!
//! Loads a JSON-authored dialogue graph, runs one or more independent
//! execution cursors over it, interpolates line text against a typed
//! variable store, invokes host-registered callbacks for scripted side
//! effects, and resolves weighted branches from a seeded random source.

pub mod core;
pub mod schema;
