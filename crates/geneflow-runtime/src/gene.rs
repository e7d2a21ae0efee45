//! Genes — regulatory and transcribed regions on the strand.
//!
//! A gene owns one dedicated polymerase "start" site at its first
//! transcribed base pair and one dedicated site per configured factor
//! binding position in its regulatory region. Whether transcription is
//! favoured is recomputed every tick from which factor sites are *truly*
//! occupied; the start site's affinity follows that flag.

use geneflow_agents::environment::BindingKind;
use geneflow_core::error::LayoutError;
use geneflow_core::site::{SiteOwner, SiteRegistry};
use geneflow_core::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// A factor binding position inside a regulatory region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSiteLayout {
    pub factor: FactorKind,
    /// Base pairs from the start of the regulatory region.
    pub offset: usize,
    pub affinity: f64,
}

/// Where a gene sits on the strand and how it is regulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneLayout {
    /// Base-pair indices of the regulatory region.
    pub regulatory: Range<usize>,
    /// Base-pair indices of the transcribed region; starts where the
    /// regulatory region ends.
    pub transcribed: Range<usize>,
    pub product: ProductKind,
    /// Start-site affinity while transcription is favoured.
    pub start_affinity: f64,
    #[serde(default)]
    pub factor_sites: Vec<FactorSiteLayout>,
}

impl Default for GeneLayout {
    fn default() -> Self {
        Self {
            regulatory: 50..70,
            transcribed: 70..470,
            product: ProductKind(0),
            start_affinity: 0.8,
            factor_sites: vec![
                FactorSiteLayout {
                    factor: FactorKind::positive(0),
                    offset: 10,
                    affinity: 0.9,
                },
                FactorSiteLayout {
                    factor: FactorKind::negative(1),
                    offset: 16,
                    affinity: 0.9,
                },
            ],
        }
    }
}

impl GeneLayout {
    /// Check the regions against each other and a strand of `strand_length`.
    pub fn validate(&self, strand_length: usize) -> Result<(), LayoutError> {
        for (name, region) in [("regulatory", &self.regulatory), ("transcribed", &self.transcribed)] {
            if region.start >= region.end {
                return Err(LayoutError::EmptyRegion {
                    name: name.to_string(),
                    start: region.start,
                    end: region.end,
                });
            }
            if region.end > strand_length {
                return Err(LayoutError::OutOfStrand {
                    name: name.to_string(),
                    end: region.end,
                    strand_length,
                });
            }
        }
        if self.regulatory.end != self.transcribed.start {
            return Err(LayoutError::NotAdjacent {
                regulatory_end: self.regulatory.end,
                transcribed_start: self.transcribed.start,
            });
        }
        let length = self.regulatory.len();
        if let Some(site) = self.factor_sites.iter().find(|s| s.offset >= length) {
            return Err(LayoutError::SiteOutsideRegion {
                offset: site.offset,
                length,
            });
        }
        Ok(())
    }

    /// Every base pair the gene covers.
    pub fn span(&self) -> Range<usize> {
        self.regulatory.start..self.transcribed.end
    }

    fn overlaps(&self, other: &GeneLayout) -> bool {
        let (a, b) = (self.span(), other.span());
        a.start < b.end && b.start < a.end
    }
}

/// Validate a whole gene list: each gene on its own, then pairwise overlap.
pub fn validate_layouts(layouts: &[GeneLayout], strand_length: usize) -> Result<(), LayoutError> {
    for layout in layouts {
        layout.validate(strand_length)?;
    }
    for (i, a) in layouts.iter().enumerate() {
        for (j, b) in layouts.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                return Err(LayoutError::OverlappingGenes { first: i, second: j });
            }
        }
    }
    Ok(())
}

/// A gene placed on the strand, with its dedicated sites registered.
#[derive(Debug, Clone)]
pub struct Gene {
    index: usize,
    layout: GeneLayout,
    start_site: SiteId,
    factor_sites: BTreeMap<FactorKind, BTreeMap<usize, SiteId>>,
    favored: bool,
}

impl Gene {
    /// Register the gene's sites; `position_of` maps a base-pair index to
    /// its site position on the strand.
    pub fn place(
        index: usize,
        layout: GeneLayout,
        sites: &mut SiteRegistry,
        position_of: impl Fn(usize) -> Vec2,
    ) -> Self {
        let owner = SiteOwner::Gene(index);
        let start = layout.transcribed.start;
        let start_site = sites.insert(position_of(start), 0.0, owner);
        let mut factor_sites: BTreeMap<FactorKind, BTreeMap<usize, SiteId>> = BTreeMap::new();
        for site in &layout.factor_sites {
            let bp = layout.regulatory.start + site.offset;
            let id = sites.insert(position_of(bp), site.affinity.clamp(0.0, 1.0), owner);
            factor_sites.entry(site.factor).or_default().insert(bp, id);
        }
        Self {
            index,
            layout,
            start_site,
            factor_sites,
            favored: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn layout(&self) -> &GeneLayout {
        &self.layout
    }

    pub fn product(&self) -> ProductKind {
        self.layout.product
    }

    pub fn start_site(&self) -> SiteId {
        self.start_site
    }

    pub fn start_index(&self) -> usize {
        self.layout.transcribed.start
    }

    /// Last transcribed base pair.
    pub fn end_index(&self) -> usize {
        self.layout.transcribed.end.saturating_sub(1)
    }

    pub fn contains(&self, bp: usize) -> bool {
        self.layout.span().contains(&bp)
    }

    pub fn is_transcription_favored(&self) -> bool {
        self.favored
    }

    /// The dedicated site at `bp` a molecule binding as `binding` could use.
    pub fn site_at(&self, binding: BindingKind, bp: usize) -> Option<SiteId> {
        match binding {
            BindingKind::Polymerase if bp == self.start_index() => Some(self.start_site),
            BindingKind::Factor(kind) => self.factor_sites.get(&kind)?.get(&bp).copied(),
            _ => None,
        }
    }

    /// All dedicated sites for `binding`.
    pub fn sites_for(&self, binding: BindingKind) -> Vec<SiteId> {
        match binding {
            BindingKind::Polymerase => vec![self.start_site],
            BindingKind::Factor(kind) => self
                .factor_sites
                .get(&kind)
                .map(|m| m.values().copied().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Every dedicated site, start site first.
    pub fn all_sites(&self) -> Vec<SiteId> {
        std::iter::once(self.start_site)
            .chain(self.factor_sites.values().flat_map(|m| m.values().copied()))
            .collect()
    }

    /// Positions to highlight while a user holds a molecule binding as `binding`.
    pub fn hint_positions(&self, binding: BindingKind, sites: &SiteRegistry) -> Vec<Vec2> {
        self.sites_for(binding)
            .into_iter()
            .filter_map(|id| sites.get(id))
            .filter(|s| s.is_available())
            .map(|s| s.position)
            .collect()
    }

    /// Recompute the transcription gate and the start-site affinity.
    ///
    /// A factor site counts only when its occupant is truly attached, as
    /// reported by `attachment_point`. Any bound negative factor closes the
    /// gate; otherwise every positive site must be bound.
    pub fn update_affinity(
        &mut self,
        sites: &mut SiteRegistry,
        attachment_point: impl Fn(AgentId) -> Option<Vec2>,
    ) -> bool {
        let truly_bound = |id: SiteId| {
            sites
                .get(id)
                .and_then(|site| {
                    let point = attachment_point(site.occupant?)?;
                    Some(site.is_attached(point))
                })
                .unwrap_or(false)
        };
        let mut favored = true;
        for (kind, by_index) in &self.factor_sites {
            for site in by_index.values() {
                let bound = truly_bound(*site);
                if kind.is_positive() && !bound {
                    favored = false;
                }
                if !kind.is_positive() && bound {
                    favored = false;
                }
            }
        }
        if favored != self.favored {
            debug!(gene = self.index, favored, "Transcription gate changed");
        }
        self.favored = favored;
        let affinity = if favored { self.layout.start_affinity } else { 0.0 };
        if let Some(site) = sites.get_mut(self.start_site) {
            site.affinity = affinity.clamp(0.0, 1.0);
        }
        favored
    }

    /// Clear every occupant of the gene's sites.
    pub fn clear_occupants(&mut self, sites: &mut SiteRegistry) {
        for id in self.all_sites() {
            if let Some(site) = sites.get_mut(id) {
                site.release();
            }
        }
        self.favored = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(layout: GeneLayout) -> (Gene, SiteRegistry) {
        let mut sites = SiteRegistry::new();
        let gene = Gene::place(0, layout, &mut sites, |bp| Vec2::new(bp as f64 * 34.0, 0.0));
        (gene, sites)
    }

    #[test]
    fn default_layout_is_valid() {
        assert!(GeneLayout::default().validate(500).is_ok());
    }

    #[test]
    fn rejects_gap_between_regions() {
        let layout = GeneLayout {
            transcribed: 71..470,
            ..GeneLayout::default()
        };
        assert!(matches!(layout.validate(500), Err(LayoutError::NotAdjacent { .. })));
    }

    #[test]
    fn rejects_overlapping_genes() {
        let a = GeneLayout::default();
        let b = GeneLayout {
            regulatory: 400..420,
            transcribed: 420..480,
            factor_sites: Vec::new(),
            ..GeneLayout::default()
        };
        assert_eq!(
            validate_layouts(&[a, b], 500),
            Err(LayoutError::OverlappingGenes { first: 0, second: 1 })
        );
    }

    #[test]
    fn start_site_sits_at_first_transcribed_base_pair() {
        let (gene, sites) = place(GeneLayout::default());
        let start = sites.get(gene.start_site()).map(|s| s.position);
        assert_eq!(start, Some(Vec2::new(70.0 * 34.0, 0.0)));
        assert_eq!(gene.site_at(BindingKind::Polymerase, 70), Some(gene.start_site()));
        assert_eq!(gene.site_at(BindingKind::Polymerase, 71), None);
    }

    #[test]
    fn negative_factor_closes_gate_regardless_of_positives() {
        let (mut gene, mut sites) = place(GeneLayout::default());
        let positive = gene.site_at(BindingKind::Factor(FactorKind::positive(0)), 60).unwrap();
        let negative = gene.site_at(BindingKind::Factor(FactorKind::negative(1)), 66).unwrap();
        let pos_agent = AgentId::from_seed(1);
        let neg_agent = AgentId::from_seed(2);
        sites.reserve(positive, pos_agent);
        let positions: BTreeMap<AgentId, Vec2> = [
            (pos_agent, sites.get(positive).unwrap().position),
            (neg_agent, sites.get(negative).unwrap().position),
        ]
        .into_iter()
        .collect();
        assert!(gene.update_affinity(&mut sites, |id| positions.get(&id).copied()));
        assert_eq!(sites.get(gene.start_site()).unwrap().affinity, 0.8);

        sites.reserve(negative, neg_agent);
        assert!(!gene.update_affinity(&mut sites, |id| positions.get(&id).copied()));
        assert_eq!(sites.get(gene.start_site()).unwrap().affinity, 0.0);
    }

    #[test]
    fn reserved_but_distant_factor_does_not_count() {
        let (mut gene, mut sites) = place(GeneLayout::default());
        let positive = gene.site_at(BindingKind::Factor(FactorKind::positive(0)), 60).unwrap();
        let agent = AgentId::from_seed(1);
        sites.reserve(positive, agent);
        assert!(!gene.update_affinity(&mut sites, |_| Some(Vec2::new(-500.0, 300.0))));
    }
}
