//! The DNA strand — base pairs, twist geometry, separations and sites.
//!
//! The strand lies horizontally along `y = center_y`, one base pair every
//! [`DISTANCE_BETWEEN_BASE_PAIRS`] starting at `left_x`. Two backbone
//! sequences twist around the centre line with period
//! [`LENGTH_PER_TWIST`]. A nominal copy of the backbone is never touched;
//! a shadow copy is rebuilt every tick with the active separations applied
//! and everything observable (base pairs, twist points) is derived from
//! the shadow.
//!
//! Sites inside a gene come from the gene. Everywhere else a
//! default-affinity site per `(SiteClass, base pair)` is created the first
//! time a search picks it.

use crate::gene::{Gene, GeneLayout};
use geneflow_agents::environment::BindingKind;
use geneflow_core::config::SimConfig;
use geneflow_core::site::{SiteOwner, SiteRegistry};
use geneflow_core::types::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::f64::consts::PI;

pub const DISTANCE_BETWEEN_BASE_PAIRS: f64 = 34.0;
pub const LENGTH_PER_TWIST: f64 = 340.0;
pub const DIAMETER: f64 = 200.0;
pub const BASE_PAIR_WIDTH: f64 = 13.0;

/// Phase lag of the second backbone, which gives the major and minor grooves.
const BACKBONE_PHASE_LAG: f64 = 0.6 * PI;
/// Half width of the region a separation opens, in model units.
const SEPARATION_HALF_WIDTH: f64 = 120.0;
/// Twist-rendering points per base pair.
const TWIST_POINTS_PER_BASE_PAIR: usize = 2;

/// One rung of the ladder, as rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BasePair {
    pub x: f64,
    pub top_y: f64,
    pub bottom_y: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StrandPoint {
    x: f64,
    strand1_y: f64,
    strand2_y: f64,
}

/// A strand opening held by one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Separation {
    pub x: f64,
    /// How far the strand is opened, in `[0, 1]`.
    pub amount: f64,
}

/// Where a candidate site comes from. Default sites are only created once
/// chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteRef {
    Existing(SiteId),
    Default { class: SiteClass, index: usize },
}

#[derive(Debug, Clone)]
pub struct DnaMolecule {
    left_x: f64,
    center_y: f64,
    length: usize,
    nominal: Vec<StrandPoint>,
    shadow: Vec<StrandPoint>,
    base_pairs: Vec<BasePair>,
    strand1: Vec<Vec2>,
    strand2: Vec<Vec2>,
    genes: Vec<Gene>,
    separations: BTreeMap<AgentId, Separation>,
    default_sites: BTreeMap<(SiteClass, usize), SiteId>,
}

impl DnaMolecule {
    /// Build a strand of `length` base pairs and place `layouts` on it.
    /// Layouts are expected to be validated already.
    pub fn new(
        length: usize,
        left_x: f64,
        center_y: f64,
        layouts: &[GeneLayout],
        sites: &mut SiteRegistry,
    ) -> Self {
        let nominal: Vec<StrandPoint> = (0..length * TWIST_POINTS_PER_BASE_PAIR)
            .map(|i| {
                let x = left_x + i as f64 * DISTANCE_BETWEEN_BASE_PAIRS / TWIST_POINTS_PER_BASE_PAIR as f64;
                let phase = 2.0 * PI * (x - left_x) / LENGTH_PER_TWIST;
                StrandPoint {
                    x,
                    strand1_y: center_y + DIAMETER / 2.0 * phase.sin(),
                    strand2_y: center_y + DIAMETER / 2.0 * (phase + BACKBONE_PHASE_LAG).sin(),
                }
            })
            .collect();
        let mut dna = Self {
            left_x,
            center_y,
            length,
            shadow: nominal.clone(),
            nominal,
            base_pairs: Vec::new(),
            strand1: Vec::new(),
            strand2: Vec::new(),
            genes: Vec::new(),
            separations: BTreeMap::new(),
            default_sites: BTreeMap::new(),
        };
        for (index, layout) in layouts.iter().enumerate() {
            let gene = Gene::place(index, layout.clone(), sites, |bp| dna.site_position(bp));
            dna.genes.push(gene);
        }
        dna.refresh_geometry();
        dna
    }

    // --- Layout --------------------------------------------------------

    /// Number of base pairs.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn left_x(&self) -> f64 {
        self.left_x
    }

    pub fn right_x(&self) -> f64 {
        self.base_pair_x(self.length.saturating_sub(1))
    }

    pub fn center_y(&self) -> f64 {
        self.center_y
    }

    pub fn base_pair_x(&self, index: usize) -> f64 {
        self.left_x + index as f64 * DISTANCE_BETWEEN_BASE_PAIRS
    }

    /// Where a site at base pair `index` sits: on the centre line.
    pub fn site_position(&self, index: usize) -> Vec2 {
        Vec2::new(self.base_pair_x(index), self.center_y)
    }

    /// Nearest base-pair index to `x`, clamped to the strand.
    pub fn nearest_index(&self, x: f64) -> usize {
        let raw = ((x - self.left_x) / DISTANCE_BETWEEN_BASE_PAIRS).round();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.length.saturating_sub(1))
        }
    }

    /// Base-pair indices whose x lies within `radius` of `x`.
    pub fn indices_near(&self, x: f64, radius: f64) -> std::ops::RangeInclusive<usize> {
        let lo = self.nearest_index(x - radius);
        let hi = self.nearest_index(x + radius);
        lo..=hi
    }

    /// Model-space bounds of the strand including its twist.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.left_x,
            self.center_y - DIAMETER / 2.0,
            self.right_x(),
            self.center_y + DIAMETER / 2.0,
        )
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    pub fn gene_at(&self, index: usize) -> Option<&Gene> {
        self.genes.iter().find(|g| g.contains(index))
    }

    pub fn gene_with_start_site(&self, site: SiteId) -> Option<&Gene> {
        self.genes.iter().find(|g| g.start_site() == site)
    }

    // --- Sites ---------------------------------------------------------

    /// The site a molecule binding as `binding` would use at base pair
    /// `index`, together with its affinity.
    pub fn site_ref(
        &self,
        binding: BindingKind,
        index: usize,
        sites: &SiteRegistry,
        config: &SimConfig,
    ) -> Option<(SiteRef, f64)> {
        let class = binding.site_class()?;
        if let Some(gene) = self.gene_at(index) {
            if let Some(id) = gene.site_at(binding, index) {
                return sites.get(id).map(|s| (SiteRef::Existing(id), s.affinity));
            }
        }
        if let Some(id) = self.default_sites.get(&(class, index)) {
            return sites.get(*id).map(|s| (SiteRef::Existing(*id), s.affinity));
        }
        Some((SiteRef::Default { class, index }, default_affinity(class, config)))
    }

    /// Occupant of a candidate site; a default site not yet created has none.
    pub fn occupant(&self, site: SiteRef, sites: &SiteRegistry) -> Option<AgentId> {
        match site {
            SiteRef::Existing(id) => sites.get(id).and_then(|s| s.occupant),
            SiteRef::Default { .. } => None,
        }
    }

    /// Position of a candidate site.
    pub fn ref_position(&self, site: SiteRef, sites: &SiteRegistry) -> Option<Vec2> {
        match site {
            SiteRef::Existing(id) => sites.get(id).map(|s| s.position),
            SiteRef::Default { index, .. } => Some(self.site_position(index)),
        }
    }

    /// Turn a candidate into a registered site.
    pub fn materialize(&mut self, site: SiteRef, sites: &mut SiteRegistry, config: &SimConfig) -> SiteId {
        match site {
            SiteRef::Existing(id) => id,
            SiteRef::Default { class, index } => {
                let position = self.site_position(index);
                *self
                    .default_sites
                    .entry((class, index))
                    .or_insert_with(|| sites.insert(position, default_affinity(class, config), SiteOwner::Dna))
            }
        }
    }

    /// Base-pair index of a strand site, if `site` is one.
    pub fn index_of_site(&self, site: SiteId, sites: &SiteRegistry) -> Option<usize> {
        let s = sites.get(site)?;
        match s.owner {
            SiteOwner::Dna | SiteOwner::Gene(_) => Some(self.nearest_index(s.position.x)),
            _ => None,
        }
    }

    /// Number of default sites created so far.
    pub fn default_site_count(&self) -> usize {
        self.default_sites.len()
    }

    // --- Separations ---------------------------------------------------

    pub fn set_separation(&mut self, owner: AgentId, x: f64, amount: f64) {
        self.separations.insert(
            owner,
            Separation {
                x,
                amount: amount.clamp(0.0, 1.0),
            },
        );
    }

    pub fn remove_separation(&mut self, owner: AgentId) {
        self.separations.remove(&owner);
    }

    pub fn separations(&self) -> impl Iterator<Item = (&AgentId, &Separation)> {
        self.separations.iter()
    }

    /// How far the strand is opened at `x`, in `[0, 1]`.
    pub fn separation_at(&self, x: f64) -> f64 {
        self.separations
            .values()
            .map(|s| s.amount * separation_window(x - s.x))
            .fold(0.0, f64::max)
    }

    // --- Geometry ------------------------------------------------------

    /// Rebuild the shadow backbone from the nominal one and the active
    /// separations, then the base pairs and twist points from the shadow.
    pub fn refresh_geometry(&mut self) {
        let half = DIAMETER / 2.0;
        let center = self.center_y;
        let shadow: Vec<StrandPoint> = self
            .nominal
            .iter()
            .map(|p| {
                let open = self.separation_at(p.x);
                if open <= 0.0 {
                    return *p;
                }
                let (top, bottom) = if p.strand1_y >= p.strand2_y { (1.0, -1.0) } else { (-1.0, 1.0) };
                StrandPoint {
                    x: p.x,
                    strand1_y: p.strand1_y + (center + top * half - p.strand1_y) * open,
                    strand2_y: p.strand2_y + (center + bottom * half - p.strand2_y) * open,
                }
            })
            .collect();
        self.shadow = shadow;

        self.base_pairs = self
            .shadow
            .iter()
            .step_by(TWIST_POINTS_PER_BASE_PAIR)
            .map(|p| BasePair {
                x: p.x,
                top_y: p.strand1_y.max(p.strand2_y),
                bottom_y: p.strand1_y.min(p.strand2_y),
                width: BASE_PAIR_WIDTH,
            })
            .collect();
        self.strand1 = self.shadow.iter().map(|p| Vec2::new(p.x, p.strand1_y)).collect();
        self.strand2 = self.shadow.iter().map(|p| Vec2::new(p.x, p.strand2_y)).collect();
    }

    pub fn base_pairs(&self) -> &[BasePair] {
        &self.base_pairs
    }

    /// The two backbone sequences, for drawing the twist.
    pub fn twist_points(&self) -> (&[Vec2], &[Vec2]) {
        (&self.strand1, &self.strand2)
    }

    // --- Reset ---------------------------------------------------------

    /// Clear gene site occupants, default site occupants and separations.
    pub fn reset(&mut self, sites: &mut SiteRegistry) {
        for gene in &mut self.genes {
            gene.clear_occupants(sites);
        }
        for id in self.default_sites.values() {
            if let Some(site) = sites.get_mut(*id) {
                site.release();
            }
        }
        self.separations.clear();
        self.refresh_geometry();
    }
}

fn default_affinity(class: SiteClass, config: &SimConfig) -> f64 {
    match class {
        SiteClass::Polymerase => config.default_polymerase_affinity,
        SiteClass::TranscriptionFactor => config.default_factor_affinity,
    }
}

/// Raised-cosine window, 1 at the centre and 0 from the half width on.
fn separation_window(dx: f64) -> f64 {
    let d = dx.abs();
    if d >= SEPARATION_HALF_WIDTH {
        0.0
    } else {
        0.5 * (1.0 + (PI * d / SEPARATION_HALF_WIDTH).cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strand() -> (DnaMolecule, SiteRegistry) {
        let mut sites = SiteRegistry::new();
        let dna = DnaMolecule::new(500, 0.0, 0.0, &[GeneLayout::default()], &mut sites);
        (dna, sites)
    }

    #[test]
    fn base_pairs_follow_spacing() {
        let (dna, _) = strand();
        assert_eq!(dna.base_pairs().len(), 500);
        assert_eq!(dna.base_pairs()[3].x, 3.0 * DISTANCE_BETWEEN_BASE_PAIRS);
        assert!(dna.base_pairs().iter().all(|bp| bp.top_y >= bp.bottom_y));
        assert!(dna.base_pairs().iter().all(|bp| bp.top_y <= DIAMETER / 2.0 + 1e-9));
    }

    #[test]
    fn nearest_index_clamps() {
        let (dna, _) = strand();
        assert_eq!(dna.nearest_index(-1000.0), 0);
        assert_eq!(dna.nearest_index(35.0), 1);
        assert_eq!(dna.nearest_index(1e9), 499);
    }

    #[test]
    fn gene_site_wins_over_default() {
        let (dna, sites) = strand();
        let config = SimConfig::default();
        let gene_start = dna.genes()[0].start_site();
        let (at_start, _) = dna.site_ref(BindingKind::Polymerase, 70, &sites, &config).unwrap();
        assert_eq!(at_start, SiteRef::Existing(gene_start));
        let (elsewhere, affinity) = dna.site_ref(BindingKind::Polymerase, 10, &sites, &config).unwrap();
        assert_eq!(
            elsewhere,
            SiteRef::Default {
                class: SiteClass::Polymerase,
                index: 10
            }
        );
        assert_eq!(affinity, config.default_polymerase_affinity);
    }

    #[test]
    fn default_sites_are_created_once() {
        let (mut dna, mut sites) = strand();
        let config = SimConfig::default();
        let site = SiteRef::Default {
            class: SiteClass::TranscriptionFactor,
            index: 5,
        };
        let a = dna.materialize(site, &mut sites, &config);
        let b = dna.materialize(site, &mut sites, &config);
        assert_eq!(a, b);
        assert_eq!(dna.default_site_count(), 1);
        assert_eq!(dna.index_of_site(a, &sites), Some(5));
    }

    #[test]
    fn separation_opens_strand_locally() {
        let (mut dna, _) = strand();
        let x = dna.base_pair_x(200);
        let agent = AgentId::from_seed(1);
        dna.set_separation(agent, x, 1.0);
        dna.refresh_geometry();
        let opened = dna.base_pairs()[200];
        assert!((opened.top_y - DIAMETER / 2.0).abs() < 1e-9);
        assert!((opened.bottom_y + DIAMETER / 2.0).abs() < 1e-9);
        assert_eq!(dna.separation_at(dna.base_pair_x(100)), 0.0);

        dna.remove_separation(agent);
        dna.refresh_geometry();
        assert!(dna.base_pairs()[200].top_y - dna.base_pairs()[200].bottom_y < DIAMETER);
    }

    #[test]
    fn reset_clears_separations_and_occupants() {
        let (mut dna, mut sites) = strand();
        let agent = AgentId::from_seed(3);
        let start = dna.genes()[0].start_site();
        sites.reserve(start, agent);
        dna.set_separation(agent, 100.0, 0.5);
        dna.reset(&mut sites);
        assert!(sites.get(start).unwrap().is_available());
        assert_eq!(dna.separations().count(), 0);
    }
}
