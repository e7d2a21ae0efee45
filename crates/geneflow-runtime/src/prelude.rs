//! Geneflow Runtime Prelude — convenient imports for common usage.
//!
//! ```rust
//! use geneflow_runtime::prelude::*;
//! ```

// Re-export the cell
pub use crate::cell::{Cell, CellSnapshot, CellStats, DnaSnapshot, GeneSnapshot, MoleculeSnapshot};

// Re-export the builder
pub use crate::builder::CellBuilder;

// Re-export scenario and layout types
pub use crate::scenario::{FactorPopulation, Populations, ScenarioConfig};
pub use crate::gene::{FactorSiteLayout, Gene, GeneLayout};
pub use crate::dna::{BasePair, DnaMolecule, Separation};

// Re-export from agents
pub use geneflow_agents::prelude::*;
