//! Attachment sites — the atomic reservation unit.
//!
//! A site is a point with an affinity and at most one occupant. Sites live
//! in a [`SiteRegistry`] arena and are referred to by [`SiteId`]; their
//! owners (strand, gene, mRNA, ribosome) keep only the handle.
//!
//! Reservation needs no locking: occupancy is written only from inside a
//! single-threaded tick, and callers check [`AttachmentSite::is_available`]
//! before calling [`SiteRegistry::reserve`].

use crate::types::{AgentId, SiteId, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distance below which an occupant counts as truly attached.
pub const ATTACHED_DISTANCE_THRESHOLD: f64 = 10.0;

/// Who a site belongs to. Sites are removed together with their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteOwner {
    /// Default-affinity site at a strand position.
    Dna,
    /// Dedicated site of the gene at this index.
    Gene(usize),
    /// Translator/degrader docking point of an mRNA.
    MessengerRna(AgentId),
    /// Docking point for the protein a ribosome is producing.
    Ribosome(AgentId),
}

/// A reservable point of potential binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentSite {
    pub id: SiteId,
    pub position: Vec2,
    /// How strongly the site attracts a compatible agent, in `[0, 1]`.
    pub affinity: f64,
    pub occupant: Option<AgentId>,
    pub owner: SiteOwner,
}

impl AttachmentSite {
    pub fn is_available(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn is_held_by(&self, agent: AgentId) -> bool {
        self.occupant == Some(agent)
    }

    /// Whether an occupant whose attachment point is at `occupant_point`
    /// has arrived, as opposed to merely holding a reservation.
    pub fn is_attached(&self, occupant_point: Vec2) -> bool {
        self.occupant.is_some()
            && occupant_point.distance_to(&self.position) < ATTACHED_DISTANCE_THRESHOLD
    }

    pub fn reserve(&mut self, agent: AgentId) {
        debug_assert!(
            self.occupant.is_none() || self.occupant == Some(agent),
            "site {:?} reserved while held by {:?}",
            self.id,
            self.occupant
        );
        self.occupant = Some(agent);
    }

    pub fn release(&mut self) {
        self.occupant = None;
    }
}

/// Arena of every attachment site in the cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteRegistry {
    sites: BTreeMap<SiteId, AttachmentSite>,
    next_id: u64,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: Vec2, affinity: f64, owner: SiteOwner) -> SiteId {
        let id = SiteId(self.next_id);
        self.next_id += 1;
        self.sites.insert(
            id,
            AttachmentSite {
                id,
                position,
                affinity: affinity.clamp(0.0, 1.0),
                occupant: None,
                owner,
            },
        );
        id
    }

    pub fn get(&self, id: SiteId) -> Option<&AttachmentSite> {
        self.sites.get(&id)
    }

    pub fn get_mut(&mut self, id: SiteId) -> Option<&mut AttachmentSite> {
        self.sites.get_mut(&id)
    }

    pub fn remove(&mut self, id: SiteId) -> Option<AttachmentSite> {
        self.sites.remove(&id)
    }

    /// Drop every site belonging to `owner`.
    pub fn remove_owned_by(&mut self, owner: SiteOwner) -> usize {
        let before = self.sites.len();
        self.sites.retain(|_, site| site.owner != owner);
        before - self.sites.len()
    }

    /// Claim `site` for `agent`. Returns `false` if the site is gone or
    /// already held by someone else.
    pub fn reserve(&mut self, site: SiteId, agent: AgentId) -> bool {
        match self.sites.get_mut(&site) {
            Some(s) if s.occupant.is_none() || s.occupant == Some(agent) => {
                s.reserve(agent);
                true
            }
            _ => false,
        }
    }

    /// Release `site` if `agent` holds it.
    pub fn release(&mut self, site: SiteId, agent: AgentId) {
        if let Some(s) = self.sites.get_mut(&site) {
            if s.occupant == Some(agent) {
                s.release();
            }
        }
    }

    /// Release every site held by `agent`.
    pub fn release_all_held_by(&mut self, agent: AgentId) -> usize {
        let mut released = 0;
        for site in self.sites.values_mut() {
            if site.occupant == Some(agent) {
                site.release();
                released += 1;
            }
        }
        released
    }

    pub fn occupied_by(&self, agent: AgentId) -> Vec<SiteId> {
        self.sites
            .values()
            .filter(|s| s.occupant == Some(agent))
            .map(|s| s.id)
            .collect()
    }

    pub fn set_position(&mut self, site: SiteId, position: Vec2) {
        if let Some(s) = self.sites.get_mut(&site) {
            s.position = position;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttachmentSite> {
        self.sites.values()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Clear every occupant without removing any site.
    pub fn release_all(&mut self) {
        for site in self.sites.values_mut() {
            site.release();
        }
    }
}
