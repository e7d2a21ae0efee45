//! Site search and ranking.
//!
//! Strand search for polymerases and factors:
//!
//! 1. Scan base pairs within the capture radius of the requester's
//!    attachment point and keep the unoccupied sites.
//! 2. If none is free and pursuit is on, consider each gene's dedicated
//!    sites held by an incumbent that is still approaching and strictly
//!    farther away than the requester.
//! 3. Drop candidates whose docked footprint leaves the requester's motion
//!    bounds or overlaps another molecule on (or heading for) the strand.
//! 4. Rank by `affinity / distance` and keep the best.
//!
//! Ribosomes and degraders instead scan live mRNAs for a free docking site
//! and take the nearest.

use crate::dna::{DnaMolecule, SiteRef};
use geneflow_agents::environment::{BindingKind, Requester};
use geneflow_agents::molecule::Biomolecule;
use geneflow_core::config::SimConfig;
use geneflow_core::site::{SiteRegistry, ATTACHED_DISTANCE_THRESHOLD};
use geneflow_core::types::*;
use std::collections::BTreeMap;

/// Floor on the distance used for ranking, so a candidate right under the
/// requester does not score infinitely.
const MIN_RANKING_DISTANCE: f64 = 1e-6;

/// Read-only view of who is on the strand.
pub trait StrandOccupancy {
    /// Whether a molecule other than `exclude` that is attached to or
    /// approaching the strand covers any part of `region`.
    fn blocks(&self, region: &Rect, exclude: &[AgentId]) -> bool;

    /// Where a molecule's attachment point currently is.
    fn attachment_point(&self, id: AgentId) -> Option<Vec2>;
}

/// Occupancy view over the cell's molecules.
pub struct MoleculeOccupancy<'a> {
    pub molecules: &'a BTreeMap<AgentId, Biomolecule>,
    pub sites: &'a SiteRegistry,
}

impl StrandOccupancy for MoleculeOccupancy<'_> {
    fn blocks(&self, region: &Rect, exclude: &[AgentId]) -> bool {
        self.molecules.values().any(|m| {
            if exclude.contains(&m.id()) {
                return false;
            }
            let footprint = if m.attached_to_dna() {
                m.footprint()
            } else if m.approaching_dna() {
                match m.attachment_site().and_then(|s| self.sites.get(s)) {
                    Some(site) => m.docked_footprint(site.position),
                    None => return false,
                }
            } else {
                return false;
            };
            footprint.intersects(region)
        })
    }

    fn attachment_point(&self, id: AgentId) -> Option<Vec2> {
        self.molecules.get(&id).map(|m| m.attachment_point())
    }
}

/// The chosen strand site, and the incumbent to push off it if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub site: SiteRef,
    pub steal_from: Option<AgentId>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    site: SiteRef,
    position: Vec2,
    affinity: f64,
    incumbent: Option<AgentId>,
}

/// Best strand site for `requester`, or `None` if nothing legal is in reach.
pub fn consider_proposal(
    dna: &DnaMolecule,
    sites: &SiteRegistry,
    occupancy: &dyn StrandOccupancy,
    requester: &Requester<'_>,
    config: &SimConfig,
) -> Option<Proposal> {
    requester.binding.site_class()?;
    let origin = requester.attachment_point;
    let radius = config.capture_radius;

    let mut candidates: Vec<Candidate> = dna
        .indices_near(origin.x, radius)
        .filter_map(|index| {
            let (site, affinity) = dna.site_ref(requester.binding, index, sites, config)?;
            let position = dna.ref_position(site, sites)?;
            if position.distance_to(&origin) > radius || dna.occupant(site, sites).is_some() {
                return None;
            }
            Some(Candidate {
                site,
                position,
                affinity,
                incumbent: None,
            })
        })
        .collect();

    if candidates.is_empty() && config.pursue_attachments {
        candidates = pursuit_candidates(dna, sites, occupancy, requester);
    }

    candidates
        .into_iter()
        .filter(|c| is_legal(c, occupancy, requester))
        .map(|c| Proposal {
            site: c.site,
            steal_from: c.incumbent,
            score: c.affinity / c.position.distance_to(&origin).max(MIN_RANKING_DISTANCE),
        })
        .fold(None, |best: Option<Proposal>, p| match best {
            Some(b) if b.score >= p.score => Some(b),
            _ => Some(p),
        })
}

/// Dedicated gene sites held by a farther, not yet arrived incumbent.
fn pursuit_candidates(
    dna: &DnaMolecule,
    sites: &SiteRegistry,
    occupancy: &dyn StrandOccupancy,
    requester: &Requester<'_>,
) -> Vec<Candidate> {
    let origin = requester.attachment_point;
    dna.genes()
        .iter()
        .flat_map(|gene| gene.sites_for(requester.binding))
        .filter_map(|id| {
            let site = sites.get(id)?;
            let incumbent = site.occupant?;
            if incumbent == requester.id {
                return None;
            }
            let incumbent_point = occupancy.attachment_point(incumbent)?;
            let incumbent_distance = incumbent_point.distance_to(&site.position);
            if incumbent_distance < ATTACHED_DISTANCE_THRESHOLD {
                return None;
            }
            if origin.distance_to(&site.position) >= incumbent_distance {
                return None;
            }
            Some(Candidate {
                site: SiteRef::Existing(id),
                position: site.position,
                affinity: site.affinity,
                incumbent: Some(incumbent),
            })
        })
        .collect()
}

fn is_legal(candidate: &Candidate, occupancy: &dyn StrandOccupancy, requester: &Requester<'_>) -> bool {
    let footprint = requester.docked_footprint(candidate.position);
    if !requester.bounds.in_bounds(&footprint) {
        return false;
    }
    let mut exclude = vec![requester.id];
    exclude.extend(candidate.incumbent);
    !occupancy.blocks(&footprint, &exclude)
}

/// Free, legal strand sites one base pair either side of `site`.
pub fn adjacent_sites(
    dna: &DnaMolecule,
    sites: &SiteRegistry,
    occupancy: &dyn StrandOccupancy,
    requester: &Requester<'_>,
    site: SiteId,
    config: &SimConfig,
) -> Vec<SiteRef> {
    let Some(index) = dna.index_of_site(site, sites) else {
        return Vec::new();
    };
    let neighbours = [index.checked_sub(1), index.checked_add(1).filter(|i| *i < dna.len())];
    neighbours
        .into_iter()
        .flatten()
        .filter_map(|i| {
            let (site, affinity) = dna.site_ref(requester.binding, i, sites, config)?;
            if dna.occupant(site, sites).is_some() {
                return None;
            }
            let position = dna.ref_position(site, sites)?;
            let candidate = Candidate {
                site,
                position,
                affinity,
                incumbent: None,
            };
            is_legal(&candidate, occupancy, requester).then_some(site)
        })
        .collect()
}

/// Nearest live mRNA docking site a ribosome or degrader may take.
pub fn nearest_messenger_rna_site(
    molecules: &BTreeMap<AgentId, Biomolecule>,
    sites: &SiteRegistry,
    requester: &Requester<'_>,
    config: &SimConfig,
) -> Option<SiteId> {
    let origin = requester.attachment_point;
    molecules
        .values()
        .filter_map(|m| {
            let rna = m.as_messenger_rna()?;
            let accepts = match requester.binding {
                BindingKind::Ribosome => rna.accepts_translator(),
                BindingKind::Destroyer => rna.accepts_destroyer(),
                _ => false,
            };
            if !accepts {
                return None;
            }
            let site = sites.get(rna.site()?)?;
            if !site.is_available() {
                return None;
            }
            let distance = origin.distance_to(&site.position);
            if distance > config.messenger_rna_capture_radius {
                return None;
            }
            if !requester.bounds.in_bounds(&requester.docked_footprint(site.position)) {
                return None;
            }
            Some((site.id, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::GeneLayout;
    use geneflow_core::bounds::MotionBounds;

    struct Empty;

    impl StrandOccupancy for Empty {
        fn blocks(&self, _region: &Rect, _exclude: &[AgentId]) -> bool {
            false
        }

        fn attachment_point(&self, _id: AgentId) -> Option<Vec2> {
            None
        }
    }

    fn requester(bounds: &MotionBounds, binding: BindingKind, at: Vec2) -> Requester<'_> {
        Requester {
            id: AgentId::from_seed(99),
            binding,
            attachment_point: at,
            attachment_offset: Vec2::new(0.0, -15.0),
            width: 20.0,
            height: 20.0,
            bounds,
        }
    }

    #[test]
    fn higher_affinity_wins_at_equal_distance() {
        let mut sites = SiteRegistry::new();
        let mut dna = DnaMolecule::new(100, 0.0, 0.0, &[], &mut sites);
        let config = SimConfig::default();
        let bounds = MotionBounds::unbounded();
        // Equidistant from base pairs 10 and 12.
        let r = requester(&bounds, BindingKind::Factor(FactorKind::positive(0)), Vec2::new(11.0 * 34.0, 0.0));
        let strong = dna.materialize(
            SiteRef::Default {
                class: SiteClass::TranscriptionFactor,
                index: 12,
            },
            &mut sites,
            &config,
        );
        sites.get_mut(strong).unwrap().affinity = 0.9;
        // Block base pair 11 so only the equidistant pair competes.
        let blocked = dna.materialize(
            SiteRef::Default {
                class: SiteClass::TranscriptionFactor,
                index: 11,
            },
            &mut sites,
            &config,
        );
        sites.reserve(blocked, AgentId::from_seed(5));
        let pick = consider_proposal(&dna, &sites, &Empty, &r, &config).unwrap();
        assert_eq!(pick.site, SiteRef::Existing(strong));
    }

    #[test]
    fn closer_wins_at_equal_affinity() {
        let mut sites = SiteRegistry::new();
        let dna = DnaMolecule::new(100, 0.0, 0.0, &[], &mut sites);
        let config = SimConfig::default();
        let bounds = MotionBounds::unbounded();
        let r = requester(&bounds, BindingKind::Polymerase, Vec2::new(20.0 * 34.0 + 3.0, 0.0));
        let pick = consider_proposal(&dna, &sites, &Empty, &r, &config).unwrap();
        assert_eq!(
            pick.site,
            SiteRef::Default {
                class: SiteClass::Polymerase,
                index: 20
            }
        );
    }

    #[test]
    fn nothing_in_reach_yields_none() {
        let mut sites = SiteRegistry::new();
        let dna = DnaMolecule::new(10, 0.0, 0.0, &[], &mut sites);
        let config = SimConfig::default();
        let bounds = MotionBounds::unbounded();
        let r = requester(&bounds, BindingKind::Polymerase, Vec2::new(0.0, 5000.0));
        assert!(consider_proposal(&dna, &sites, &Empty, &r, &config).is_none());
    }

    #[test]
    fn out_of_bounds_sites_are_skipped() {
        let mut sites = SiteRegistry::new();
        let dna = DnaMolecule::new(100, 0.0, 0.0, &[], &mut sites);
        let config = SimConfig::default();
        // Only the left part of the strand fits inside the bounds.
        let bounds = MotionBounds::new(Rect::new(-100.0, -200.0, 10.0 * 34.0, 200.0));
        let r = requester(&bounds, BindingKind::Polymerase, Vec2::new(15.0 * 34.0, 0.0));
        let pick = consider_proposal(&dna, &sites, &Empty, &r, &config).unwrap();
        match pick.site {
            SiteRef::Default { index, .. } => assert!(index <= 9),
            SiteRef::Existing(_) => panic!("expected a default site"),
        }
    }

    #[test]
    fn pursuit_targets_farther_incumbent_only() {
        let mut sites = SiteRegistry::new();
        let layout = GeneLayout {
            factor_sites: Vec::new(),
            ..GeneLayout::default()
        };
        let mut config = SimConfig::default();
        config.capture_radius = 10.0;
        let dna = DnaMolecule::new(500, 0.0, 0.0, &[layout], &mut sites);
        let start = dna.genes()[0].start_site();
        let incumbent = AgentId::from_seed(7);
        sites.reserve(start, incumbent);
        let bounds = MotionBounds::unbounded();
        let start_pos = sites.get(start).unwrap().position;

        struct Far(Vec2);
        impl StrandOccupancy for Far {
            fn blocks(&self, _region: &Rect, _exclude: &[AgentId]) -> bool {
                false
            }
            fn attachment_point(&self, _id: AgentId) -> Option<Vec2> {
                Some(self.0)
            }
        }

        // Requester sits over an occupied start site with no free neighbour in reach.
        let r = requester(&bounds, BindingKind::Polymerase, start_pos + Vec2::new(0.0, 5.0));
        let far = Far(start_pos + Vec2::new(0.0, 900.0));
        let pick = consider_proposal(&dna, &sites, &far, &r, &config).unwrap();
        assert_eq!(pick.site, SiteRef::Existing(start));
        assert_eq!(pick.steal_from, Some(incumbent));

        let near = Far(start_pos + Vec2::new(0.0, 2.0));
        assert!(consider_proposal(&dna, &sites, &near, &r, &config).is_none());
    }
}
