//! Domain models for Reservoir.
//!
//! # Core Concepts
//!
//! - [`Thought`]: a single authored fragment: text, optional embedded images,
//!   a category, a creation timestamp and a resonate counter. The sole durable
//!   entity; everything else in the store is derived bookkeeping.
//! - [`Category`]: the closed set of six shelves a thought can live on.
//! - [`Reflection`]: the structured output of the external AI collaborator,
//!   synthesized from the accumulated feed. Never persisted.

mod reflection;
mod thought;

pub use reflection::*;
pub use thought::*;
