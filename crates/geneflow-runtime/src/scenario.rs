//! Scenario layout — strand, genes, starting populations and regions.
//!
//! Everything a cell is rebuilt from on start and on reset. Loadable from
//! TOML through serde; missing fields fall back to the defaults.

use crate::gene::{validate_layouts, GeneLayout};
use geneflow_core::error::{GeneflowError, Result};
use geneflow_core::types::*;
use serde::{Deserialize, Serialize};

/// How many molecules of each kind a scenario starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Populations {
    pub polymerases: usize,
    pub factors: Vec<FactorPopulation>,
    pub ribosomes: usize,
    pub destroyers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorPopulation {
    pub factor: FactorKind,
    pub count: usize,
}

impl Default for Populations {
    fn default() -> Self {
        Self {
            polymerases: 3,
            factors: vec![
                FactorPopulation {
                    factor: FactorKind::positive(0),
                    count: 4,
                },
                FactorPopulation {
                    factor: FactorKind::negative(1),
                    count: 1,
                },
            ],
            ribosomes: 2,
            destroyers: 1,
        }
    }
}

impl Populations {
    /// No molecules at all.
    pub fn empty() -> Self {
        Self {
            polymerases: 0,
            factors: Vec::new(),
            ribosomes: 0,
            destroyers: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.polymerases + self.factors.iter().map(|f| f.count).sum::<usize>() + self.ribosomes + self.destroyers
    }
}

/// Layout of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Number of base pairs on the strand (default: 500).
    pub strand_length: usize,
    /// Model-space x of the first base pair (default: 0).
    pub strand_left_x: f64,
    /// Model-space y of the strand's centre line (default: 0).
    pub strand_y: f64,
    pub genes: Vec<GeneLayout>,
    pub populations: Populations,
    /// Region every free molecule must stay inside.
    pub bounds: Rect,
    /// Where recycled polymerases reappear.
    pub recycle_zones: Vec<Rect>,
    /// Start with polymerase recycling on (default: false).
    pub recycle_mode: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            strand_length: 500,
            strand_left_x: 0.0,
            strand_y: 0.0,
            genes: vec![GeneLayout::default()],
            populations: Populations::default(),
            bounds: Rect::new(-600.0, -1500.0, 17600.0, 1500.0),
            recycle_zones: vec![
                Rect::new(0.0, 900.0, 2000.0, 1300.0),
                Rect::new(15000.0, 900.0, 17000.0, 1300.0),
            ],
            recycle_mode: false,
        }
    }
}

impl ScenarioConfig {
    /// Check the strand, gene layout and regions.
    pub fn validate(&self) -> Result<()> {
        if self.strand_length == 0 {
            return Err(GeneflowError::invalid_value(
                "strand_length",
                "0",
                "strand needs at least one base pair",
            ));
        }
        validate_layouts(&self.genes, self.strand_length)?;
        for gene in &self.genes {
            if !(0.0..=1.0).contains(&gene.start_affinity) {
                return Err(GeneflowError::out_of_range("start_affinity", gene.start_affinity, 0.0, 1.0));
            }
        }
        if self.bounds.width() <= 0.0 || self.bounds.height() <= 0.0 {
            return Err(GeneflowError::invalid_value(
                "bounds",
                format!("{:?}", self.bounds),
                "bounds must have a positive area",
            ));
        }
        if self.recycle_mode && self.recycle_zones.is_empty() {
            return Err(GeneflowError::invalid_value(
                "recycle_zones",
                "[]",
                "recycle mode needs at least one zone",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geneflow_core::error::LayoutError;

    #[test]
    fn default_scenario_is_valid() {
        assert!(ScenarioConfig::default().validate().is_ok());
    }

    #[test]
    fn gene_beyond_strand_is_rejected() {
        let scenario = ScenarioConfig {
            strand_length: 100,
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            scenario.validate(),
            Err(GeneflowError::Layout(LayoutError::OutOfStrand { .. }))
        ));
    }

    #[test]
    fn recycle_mode_needs_zones() {
        let scenario = ScenarioConfig {
            recycle_mode: true,
            recycle_zones: Vec::new(),
            ..ScenarioConfig::default()
        };
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn population_total_counts_every_kind() {
        assert_eq!(Populations::default().total(), 11);
        assert_eq!(Populations::empty().total(), 0);
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_string(&ScenarioConfig::default()).unwrap();
        let back: ScenarioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScenarioConfig::default());
    }
}
