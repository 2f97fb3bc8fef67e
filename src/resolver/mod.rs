//! Dependency resolution.
//!
//! The solver intersects every requirer's constraint per component name and
//! picks the highest satisfying version from that component's source. There
//! is no backtracking: conflicting requirements are reported, not searched
//! around, so resolution is deterministic and its failures name every
//! contributor.

pub mod errors;
pub mod solve;

pub use errors::ResolveError;
pub use solve::{Resolver, SolvedComponent, Solution};
