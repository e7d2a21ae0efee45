//! # Geneflow Runtime
//!
//! The cell, its strand and genes, and the tick loop.
//!
//! The runtime is the "world": it owns every biomolecule, answers their
//! site-search and spawning requests, keeps the strand's geometry in step
//! with the polymerases separating it, and recomputes gene regulation
//! every tick.

pub mod builder;
pub mod cell;
pub mod dna;
pub mod gene;
pub mod scenario;
pub mod search;
pub mod prelude;
