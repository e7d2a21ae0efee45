//! # Geneflow
//!
//! Attachment-and-motion simulation of the molecules behind gene expression.
//!
//! A cell holds a double-stranded DNA molecule with one or more genes and a
//! population of free-moving biomolecules. Transcription factors and RNA
//! polymerases search the strand for attachment sites; a favoured gene is
//! transcribed into messenger RNA, which ribosomes translate into protein and
//! degraders chop into fragments.
//!
//! ## Quick Start
//!
//! ```rust
//! use geneflow::prelude::*;
//!
//! // Build the default cell: one regulated gene and a small population
//! let mut cell = CellBuilder::new().seed(7).build().unwrap();
//!
//! // Run ten simulated seconds
//! cell.step(10.0);
//!
//! let stats = cell.stats();
//! println!("{} transcriptions, {} proteins", stats.transcriptions_started, stats.proteins_released);
//! ```
//!
//! ## Architecture
//!
//! Geneflow is organized into several crates:
//!
//! - [`geneflow_core`] - Shared types, sites, motion strategies, polymer winding
//! - [`geneflow_agents`] - Biomolecules and their attachment state machines
//! - [`geneflow_runtime`] - Cell, strand, genes, site search and the tick loop
//!
//! ## Key Concepts
//!
//! ### Attachment
//!
//! | State | What the molecule does |
//! |-------|------------------------|
//! | Unattached and available | Random walk; proposes a site each step |
//! | Moving towards attachment | Holds a reservation; travels to the site |
//! | Attached | Kind-specific behaviour on the site |
//! | Unattached but unavailable | Refractory countdown; drifts away |
//!
//! A site has at most one occupant. A gene's start site only attracts
//! polymerases while every positive factor site is truly bound and no
//! negative one is.
//!
//! ### Polymers
//!
//! mRNA and its fragments are winding polymers: chains of shape segments
//! whose total length is conserved as machinery pulls it through channels.

pub use geneflow_agents as agents;
pub use geneflow_core as core;
pub use geneflow_runtime as runtime;

/// Convenient imports for common usage.
///
/// ```rust
/// use geneflow::prelude::*;
/// ```
pub mod prelude {
    pub use geneflow_runtime::prelude::*;
}
