//! The world as seen by a stepping biomolecule.
//!
//! A biomolecule never holds references to other molecules, sites or the
//! strand. Everything it needs while stepping goes through a
//! [`CellEnvironment`], which the runtime's cell implements. The molecule
//! being stepped is checked out of the cell for the duration of its step,
//! so looking itself up returns `None`.

use crate::molecule::Biomolecule;
use geneflow_core::bounds::MotionBounds;
use geneflow_core::config::SimConfig;
use geneflow_core::motion::MotionContext;
use geneflow_core::site::SiteRegistry;
use geneflow_core::types::*;
use serde::Serialize;

/// What a polymerase needs to know about the gene behind a start site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TranscriptionTarget {
    /// Index of the gene on the strand.
    pub gene: usize,
    /// Model-space x of the last transcribed base pair.
    pub end_x: f64,
    /// Protein the gene codes for.
    pub product: ProductKind,
}

/// What a molecule binds to, as far as site search is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindingKind {
    Polymerase,
    Factor(FactorKind),
    Ribosome,
    Destroyer,
    Protein,
}

impl BindingKind {
    /// The strand site family, for kinds that bind the strand.
    pub fn site_class(&self) -> Option<SiteClass> {
        match self {
            BindingKind::Polymerase => Some(SiteClass::Polymerase),
            BindingKind::Factor(_) => Some(SiteClass::TranscriptionFactor),
            _ => None,
        }
    }
}

/// The parts of a molecule a site search looks at.
#[derive(Debug, Clone, Copy)]
pub struct Requester<'a> {
    pub id: AgentId,
    pub binding: BindingKind,
    pub attachment_point: Vec2,
    pub attachment_offset: Vec2,
    pub width: f64,
    pub height: f64,
    pub bounds: &'a MotionBounds,
}

impl Requester<'_> {
    /// Footprint the requester would have once docked on `site_position`.
    pub fn docked_footprint(&self, site_position: Vec2) -> Rect {
        Rect::from_center(site_position - self.attachment_offset, self.width, self.height)
    }
}

/// Event emitted while the cell steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellEvent {
    /// A biomolecule entered the cell.
    Spawned { id: AgentId, kind: String },
    /// A biomolecule left the cell.
    Removed { id: AgentId },
    /// A biomolecule reserved a site and started approaching it.
    Approaching { id: AgentId, site: SiteId },
    /// A biomolecule arrived at its reserved site.
    Attached { id: AgentId, site: SiteId },
    /// A biomolecule let go of its site.
    Detached { id: AgentId },
    /// A polymerase hopped to a neighbouring strand site.
    Hopped { id: AgentId, from: SiteId, to: SiteId },
    /// A polymerase started producing an mRNA.
    TranscriptionStarted { polymerase: AgentId, messenger_rna: AgentId, gene: usize },
    /// A polymerase let go of a finished mRNA.
    MessengerRnaReleased { polymerase: AgentId, messenger_rna: AgentId, length: f64 },
    /// A ribosome started pulling an mRNA through its channel.
    TranslationStarted { ribosome: AgentId, messenger_rna: AgentId, protein: Option<AgentId> },
    /// A finished protein left its ribosome.
    ProteinReleased { ribosome: AgentId, protein: AgentId, product: ProductKind },
    /// A degrader latched onto an mRNA.
    DestructionStarted { destroyer: AgentId, messenger_rna: AgentId },
    /// A degrader released a completed fragment.
    FragmentReleased { destroyer: AgentId, fragment: AgentId, length: f64 },
    /// An mRNA was consumed completely.
    MessengerRnaDestroyed { destroyer: AgentId, messenger_rna: AgentId },
}

/// Capabilities the cell offers to a stepping biomolecule.
pub trait CellEnvironment: MotionContext {
    fn config(&self) -> &SimConfig;

    fn sites(&self) -> &SiteRegistry;

    fn sites_mut(&mut self) -> &mut SiteRegistry;

    fn molecule(&self, id: AgentId) -> Option<&Biomolecule>;

    fn molecule_mut(&mut self, id: AgentId) -> Option<&mut Biomolecule>;

    /// Best site for `requester`, or `None`. A returned site is free to
    /// reserve; any incumbent it was taken from has already been aborted.
    fn propose_attachment(&mut self, requester: Requester<'_>) -> Option<SiteId>;

    /// Free, legal strand sites next to `site` for a hop by `requester`.
    fn adjacent_sites(&mut self, requester: Requester<'_>, site: SiteId) -> Vec<SiteId>;

    /// The gene behind a start site, if `site` is one.
    fn transcription_target(&self, site: SiteId) -> Option<TranscriptionTarget>;

    /// Open (or keep open) the strand around `x` by `amount` in `[0, 1]`.
    fn set_separation(&mut self, owner: AgentId, x: f64, amount: f64);

    fn remove_separation(&mut self, owner: AgentId);

    /// Agents attached to the strand whose attachment point lies in
    /// `(from_x, to_x]`, `exclude` aside.
    fn dna_attached_between(&self, from_x: f64, to_x: f64, exclude: AgentId) -> Vec<AgentId>;

    /// Fresh id for a molecule about to be spawned.
    fn next_agent_id(&mut self) -> AgentId;

    /// Add a molecule to the cell. It is stepped from the next tick on.
    fn spawn(&mut self, molecule: Biomolecule) -> AgentId;

    /// Schedule a molecule for removal at the end of the tick.
    fn remove(&mut self, id: AgentId);

    fn force_detach(&mut self, id: AgentId);

    fn force_abort_pending_attachment(&mut self, id: AgentId);

    fn recycle_mode(&self) -> bool;

    fn recycle_zones(&self) -> Vec<Rect>;

    /// Count one finished protein.
    fn record_product(&mut self, product: ProductKind);

    fn emit(&mut self, event: CellEvent);
}
