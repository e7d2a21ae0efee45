//! Cell builder.
//!
//! Assembles a [`Cell`] from simulation parameters and a scenario, with
//! shortcuts for the scenario fields tests and tools change most often.
//!
//! # Example
//!
//! ```rust
//! use geneflow_runtime::builder::CellBuilder;
//!
//! let mut cell = CellBuilder::new()
//!     .seed(7)
//!     .no_populations()
//!     .build()
//!     .unwrap();
//! cell.step(0.5);
//! ```

use crate::cell::Cell;
use crate::gene::GeneLayout;
use crate::scenario::{Populations, ScenarioConfig};
use geneflow_core::config::SimConfig;
use geneflow_core::error::Result;
use geneflow_core::types::Rect;

/// Builder for creating cells.
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    config: SimConfig,
    scenario: ScenarioConfig,
    explicit_genes: bool,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the simulation parameters.
    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the whole scenario.
    pub fn with_scenario(mut self, scenario: ScenarioConfig) -> Self {
        self.scenario = scenario;
        self.explicit_genes = true;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn strand_length(mut self, length: usize) -> Self {
        self.scenario.strand_length = length;
        self
    }

    /// Add a gene. The first call replaces the default gene.
    pub fn gene(mut self, layout: GeneLayout) -> Self {
        if !self.explicit_genes {
            self.scenario.genes.clear();
            self.explicit_genes = true;
        }
        self.scenario.genes.push(layout);
        self
    }

    pub fn populations(mut self, populations: Populations) -> Self {
        self.scenario.populations = populations;
        self
    }

    /// Start with no molecules; tests spawn what they need.
    pub fn no_populations(self) -> Self {
        self.populations(Populations::empty())
    }

    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.scenario.bounds = bounds;
        self
    }

    pub fn recycle_zone(mut self, zone: Rect) -> Self {
        self.scenario.recycle_zones.push(zone);
        self
    }

    pub fn recycle_mode(mut self, on: bool) -> Self {
        self.scenario.recycle_mode = on;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Cell> {
        Cell::new(self.config, self.scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_gene_replaces_default() {
        let cell = CellBuilder::new()
            .no_populations()
            .gene(GeneLayout {
                regulatory: 10..20,
                transcribed: 20..100,
                factor_sites: Vec::new(),
                ..GeneLayout::default()
            })
            .gene(GeneLayout {
                regulatory: 200..220,
                transcribed: 220..400,
                factor_sites: Vec::new(),
                ..GeneLayout::default()
            })
            .build()
            .unwrap();
        assert_eq!(cell.dna().genes().len(), 2);
        assert_eq!(cell.dna().genes()[0].start_index(), 20);
    }

    #[test]
    fn invalid_layout_fails_to_build() {
        let result = CellBuilder::new().strand_length(60).build();
        assert!(result.is_err());
    }

    #[test]
    fn empty_populations() {
        let cell = CellBuilder::new().no_populations().build().unwrap();
        assert_eq!(cell.molecule_count(), 0);
    }
}
