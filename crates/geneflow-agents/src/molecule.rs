//! Biomolecule — the common mobile body shared by every agent kind.
//!
//! The set of kinds is closed. Kind-specific data and behaviour live in
//! the per-kind modules; this module owns what every kind has in common:
//! position and depth, footprint, appearance, motion and the random
//! stream that drives it.

use crate::destroyer::MessengerRnaDestroyer;
use crate::environment::{BindingKind, CellEnvironment, Requester};
use crate::factor::TranscriptionFactor;
use crate::fragment::MessengerRnaFragment;
use crate::machine::{AttachmentState, AttachmentStateMachine};
use crate::messenger_rna::MessengerRna;
use crate::polymerase::RnaPolymerase;
use crate::protein::Protein;
use crate::ribosome::Ribosome;
use geneflow_core::bounds::MotionBounds;
use geneflow_core::config::SimConfig;
use geneflow_core::motion::{MotionStrategy, Pose};
use geneflow_core::polymer::WindingPolymer;
use geneflow_core::site::{SiteOwner, SiteRegistry};
use geneflow_core::types::*;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

const POLYMERASE_SIZE: (f64, f64) = (220.0, 140.0);
const FACTOR_SIZE: (f64, f64) = (70.0, 50.0);
const RIBOSOME_SIZE: (f64, f64) = (180.0, 140.0);
const DESTROYER_SIZE: (f64, f64) = (120.0, 100.0);
const PROTEIN_SIZE: (f64, f64) = (60.0, 60.0);

/// Smallest share of full size a growing protein is drawn at.
const MIN_PROTEIN_SCALE: f64 = 0.1;

const POLYMERASE_COLOR: Rgba = Rgba::rgb(0.55, 0.45, 0.85);
const POLYMERASE_CONFORMED_COLOR: Rgba = Rgba::rgb(0.85, 0.45, 0.55);
const POSITIVE_FACTOR_COLOR: Rgba = Rgba::rgb(0.3, 0.8, 0.35);
const NEGATIVE_FACTOR_COLOR: Rgba = Rgba::rgb(0.9, 0.3, 0.25);
const RIBOSOME_COLOR: Rgba = Rgba::rgb(0.8, 0.65, 0.3);
const DESTROYER_COLOR: Rgba = Rgba::rgb(0.45, 0.45, 0.5);
const RNA_COLOR: Rgba = Rgba::rgb(0.2, 0.2, 0.2);
const PROTEIN_COLOR: Rgba = Rgba::rgb(0.3, 0.55, 0.9);

/// Kind plus the kind's private data.
#[derive(Debug, Clone)]
pub enum MoleculeKind {
    RnaPolymerase(RnaPolymerase),
    TranscriptionFactor(TranscriptionFactor),
    Ribosome(Ribosome),
    MessengerRnaDestroyer(MessengerRnaDestroyer),
    MessengerRna(MessengerRna),
    MessengerRnaFragment(MessengerRnaFragment),
    Protein(Protein),
}

impl MoleculeKind {
    pub fn name(&self) -> &'static str {
        match self {
            MoleculeKind::RnaPolymerase(_) => "rna_polymerase",
            MoleculeKind::TranscriptionFactor(_) => "transcription_factor",
            MoleculeKind::Ribosome(_) => "ribosome",
            MoleculeKind::MessengerRnaDestroyer(_) => "messenger_rna_destroyer",
            MoleculeKind::MessengerRna(_) => "messenger_rna",
            MoleculeKind::MessengerRnaFragment(_) => "messenger_rna_fragment",
            MoleculeKind::Protein(_) => "protein",
        }
    }

    /// What this kind binds to; `None` for kinds that never propose.
    pub fn binding_kind(&self) -> Option<BindingKind> {
        match self {
            MoleculeKind::RnaPolymerase(_) => Some(BindingKind::Polymerase),
            MoleculeKind::TranscriptionFactor(f) => Some(BindingKind::Factor(f.factor())),
            MoleculeKind::Ribosome(_) => Some(BindingKind::Ribosome),
            MoleculeKind::MessengerRnaDestroyer(_) => Some(BindingKind::Destroyer),
            MoleculeKind::Protein(_) => Some(BindingKind::Protein),
            _ => None,
        }
    }

    /// The strand site family this kind binds to, if it binds the strand.
    pub fn site_class(&self) -> Option<SiteClass> {
        self.binding_kind().and_then(|b| b.site_class())
    }

    /// Offset from the body position to the point that docks on a site.
    pub fn attachment_offset(&self) -> Vec2 {
        match self {
            MoleculeKind::RnaPolymerase(_) => RnaPolymerase::ATTACHMENT_OFFSET,
            MoleculeKind::TranscriptionFactor(_) => TranscriptionFactor::ATTACHMENT_OFFSET,
            MoleculeKind::Ribosome(_) => Ribosome::ATTACHMENT_OFFSET,
            MoleculeKind::MessengerRnaDestroyer(_) => MessengerRnaDestroyer::ATTACHMENT_OFFSET,
            _ => Vec2::ZERO,
        }
    }

    /// Whether this kind runs the generic attachment state machine.
    pub fn uses_attachment_machine(&self) -> bool {
        !matches!(
            self,
            MoleculeKind::MessengerRna(_) | MoleculeKind::MessengerRnaFragment(_)
        )
    }
}

/// State every biomolecule carries regardless of kind.
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    /// Depth in `[-1, 0]`, 0 being in front.
    pub z: f64,
    pub width: f64,
    pub height: f64,
    pub color: Rgba,
    /// Opacity-like fade factor in `[0, 1]`.
    pub existence_strength: f64,
    pub user_controlled: bool,
    /// Whether the current state lets a user pick the molecule up.
    pub movable_by_user: bool,
    pub attached_to_dna: bool,
    pub approaching_dna: bool,
    pub motion_bounds: MotionBounds,
    pub motion: MotionStrategy,
    pub rng: ChaCha12Rng,
}

impl Body {
    fn new(position: Vec2, size: (f64, f64), color: Rgba, seed: u64) -> Self {
        Self {
            position,
            z: 0.0,
            width: size.0,
            height: size.1,
            color,
            existence_strength: 1.0,
            user_controlled: false,
            movable_by_user: true,
            attached_to_dna: false,
            approaching_dna: false,
            motion_bounds: MotionBounds::default(),
            motion: MotionStrategy::random_walk(),
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }
}

/// A mobile simulated entity.
#[derive(Debug, Clone)]
pub struct Biomolecule {
    pub(crate) id: AgentId,
    pub(crate) kind: MoleculeKind,
    pub(crate) body: Body,
    pub(crate) machine: AttachmentStateMachine,
}

impl Biomolecule {
    fn assemble(id: AgentId, kind: MoleculeKind, body: Body) -> Self {
        let offset = kind.attachment_offset();
        Self {
            id,
            kind,
            body,
            machine: AttachmentStateMachine::new(-offset),
        }
    }

    pub fn rna_polymerase(id: AgentId, position: Vec2, seed: u64) -> Self {
        let body = Body::new(position, POLYMERASE_SIZE, POLYMERASE_COLOR, seed);
        Self::assemble(id, MoleculeKind::RnaPolymerase(RnaPolymerase::new()), body)
    }

    pub fn transcription_factor(id: AgentId, factor: FactorKind, position: Vec2, seed: u64) -> Self {
        let color = if factor.is_positive() {
            POSITIVE_FACTOR_COLOR
        } else {
            NEGATIVE_FACTOR_COLOR
        };
        let body = Body::new(position, FACTOR_SIZE, color, seed);
        Self::assemble(
            id,
            MoleculeKind::TranscriptionFactor(TranscriptionFactor::new(factor)),
            body,
        )
    }

    pub fn ribosome(id: AgentId, position: Vec2, seed: u64) -> Self {
        let body = Body::new(position, RIBOSOME_SIZE, RIBOSOME_COLOR, seed);
        Self::assemble(id, MoleculeKind::Ribosome(Ribosome::new()), body)
    }

    pub fn messenger_rna_destroyer(id: AgentId, position: Vec2, seed: u64) -> Self {
        let body = Body::new(position, DESTROYER_SIZE, DESTROYER_COLOR, seed);
        Self::assemble(
            id,
            MoleculeKind::MessengerRnaDestroyer(MessengerRnaDestroyer::new()),
            body,
        )
    }

    /// A new, empty mRNA whose growing end sits at `position`.
    pub fn messenger_rna(
        id: AgentId,
        product: ProductKind,
        position: Vec2,
        config: &SimConfig,
        seed: u64,
    ) -> Self {
        let mut body = Body::new(position, (0.0, 0.0), RNA_COLOR, seed);
        let polymer = WindingPolymer::with_leader(
            position,
            config.leader_length,
            config.inter_point_distance,
            &mut body.rng,
        );
        body.motion = MotionStrategy::Stillness;
        body.movable_by_user = false;
        Self::assemble(
            id,
            MoleculeKind::MessengerRna(MessengerRna::new(product, polymer)),
            body,
        )
    }

    /// A new, empty fragment coiled from `position`, held by `destroyer`.
    pub fn messenger_rna_fragment(
        id: AgentId,
        destroyer: AgentId,
        position: Vec2,
        target_length: f64,
        config: &SimConfig,
        seed: u64,
    ) -> Self {
        let mut body = Body::new(position, (0.0, 0.0), RNA_COLOR, seed);
        let polymer = WindingPolymer::coiled(position, config.inter_point_distance, &mut body.rng);
        body.motion = MotionStrategy::Stillness;
        body.movable_by_user = false;
        Self::assemble(
            id,
            MoleculeKind::MessengerRnaFragment(MessengerRnaFragment::new(
                destroyer,
                target_length,
                polymer,
            )),
            body,
        )
    }

    /// A protein already docked on its ribosome's product site.
    pub fn protein(id: AgentId, product: ProductKind, site: SiteId, position: Vec2, seed: u64) -> Self {
        let body = Body::new(position, PROTEIN_SIZE, PROTEIN_COLOR, seed);
        let mut molecule = Self::assemble(id, MoleculeKind::Protein(Protein::new(product)), body);
        molecule.machine.dock(site);
        molecule.body.motion = MotionStrategy::follow_site(site, Vec2::ZERO);
        molecule.body.movable_by_user = false;
        molecule
    }

    // --- Accessors -----------------------------------------------------

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn kind(&self) -> &MoleculeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut MoleculeKind {
        &mut self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn machine(&self) -> &AttachmentStateMachine {
        &self.machine
    }

    pub fn attachment_state(&self) -> Option<AttachmentState> {
        self.kind
            .uses_attachment_machine()
            .then_some(self.machine.state())
    }

    /// The site this molecule holds, whether approaching or attached.
    pub fn attachment_site(&self) -> Option<SiteId> {
        self.machine.attachment_site()
    }

    pub fn position(&self) -> Vec2 {
        match self.polymer() {
            Some(polymer) => polymer.position(),
            None => self.body.position,
        }
    }

    pub fn z(&self) -> f64 {
        self.body.z
    }

    pub fn size(&self) -> (f64, f64) {
        match &self.kind {
            MoleculeKind::Protein(p) => {
                let scale = p.growth().max(MIN_PROTEIN_SCALE);
                (self.body.width * scale, self.body.height * scale)
            }
            _ => (self.body.width, self.body.height),
        }
    }

    /// Axis-aligned extent of the molecule.
    pub fn footprint(&self) -> Rect {
        match self.polymer() {
            Some(polymer) => polymer.shape_bounds(),
            None => {
                let (w, h) = self.size();
                Rect::from_center(self.body.position, w, h)
            }
        }
    }

    /// Footprint this molecule would have with its attachment point on `site_position`.
    pub fn docked_footprint(&self, site_position: Vec2) -> Rect {
        let (w, h) = self.size();
        Rect::from_center(site_position - self.kind.attachment_offset(), w, h)
    }

    pub fn attachment_point(&self) -> Vec2 {
        self.position() + self.kind.attachment_offset()
    }

    /// Search view of this molecule, for kinds that propose attachments.
    pub fn requester(&self) -> Option<Requester<'_>> {
        let binding = self.kind.binding_kind()?;
        let (width, height) = self.size();
        Some(Requester {
            id: self.id,
            binding,
            attachment_point: self.attachment_point(),
            attachment_offset: self.kind.attachment_offset(),
            width,
            height,
            bounds: &self.body.motion_bounds,
        })
    }

    pub fn color(&self) -> Rgba {
        match &self.kind {
            MoleculeKind::RnaPolymerase(p) => {
                self.body.color.blend(&POLYMERASE_CONFORMED_COLOR, p.conformation())
            }
            _ => self.body.color,
        }
    }

    pub fn existence_strength(&self) -> f64 {
        self.body.existence_strength
    }

    pub fn is_user_controlled(&self) -> bool {
        self.body.user_controlled
    }

    pub fn is_movable_by_user(&self) -> bool {
        self.body.movable_by_user
    }

    pub fn attached_to_dna(&self) -> bool {
        self.body.attached_to_dna
    }

    pub fn approaching_dna(&self) -> bool {
        self.body.approaching_dna
    }

    pub fn motion_name(&self) -> &'static str {
        self.body.motion.name()
    }

    /// Name of the current state, for display and logs.
    pub fn state_name(&self) -> &'static str {
        match &self.kind {
            MoleculeKind::MessengerRna(rna) => rna.state_name(),
            MoleculeKind::MessengerRnaFragment(fragment) => fragment.state_name(),
            MoleculeKind::RnaPolymerase(p) if self.machine.state() == AttachmentState::Attached => {
                p.phase_name()
            }
            _ => self.machine.state().name(),
        }
    }

    /// Conformation ramp of a polymerase, in `[0, 1]`.
    pub fn conformation(&self) -> Option<f64> {
        match &self.kind {
            MoleculeKind::RnaPolymerase(p) => Some(p.conformation()),
            _ => None,
        }
    }

    pub fn polymer(&self) -> Option<&WindingPolymer> {
        match &self.kind {
            MoleculeKind::MessengerRna(rna) => Some(rna.polymer()),
            MoleculeKind::MessengerRnaFragment(fragment) => Some(fragment.polymer()),
            _ => None,
        }
    }

    pub fn as_messenger_rna(&self) -> Option<&MessengerRna> {
        match &self.kind {
            MoleculeKind::MessengerRna(rna) => Some(rna),
            _ => None,
        }
    }

    pub fn as_messenger_rna_mut(&mut self) -> Option<&mut MessengerRna> {
        match &mut self.kind {
            MoleculeKind::MessengerRna(rna) => Some(rna),
            _ => None,
        }
    }

    pub fn as_fragment(&self) -> Option<&MessengerRnaFragment> {
        match &self.kind {
            MoleculeKind::MessengerRnaFragment(fragment) => Some(fragment),
            _ => None,
        }
    }

    pub fn as_ribosome(&self) -> Option<&Ribosome> {
        match &self.kind {
            MoleculeKind::Ribosome(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_protein(&self) -> Option<&Protein> {
        match &self.kind {
            MoleculeKind::Protein(protein) => Some(protein),
            _ => None,
        }
    }

    pub fn as_fragment_mut(&mut self) -> Option<&mut MessengerRnaFragment> {
        match &mut self.kind {
            MoleculeKind::MessengerRnaFragment(fragment) => Some(fragment),
            _ => None,
        }
    }

    pub fn as_protein_mut(&mut self) -> Option<&mut Protein> {
        match &mut self.kind {
            MoleculeKind::Protein(protein) => Some(protein),
            _ => None,
        }
    }

    pub fn factor_kind(&self) -> Option<FactorKind> {
        match &self.kind {
            MoleculeKind::TranscriptionFactor(f) => Some(f.factor()),
            _ => None,
        }
    }

    // --- Mutation ------------------------------------------------------

    /// Move the body (or whole polymer) so its position lands on `p`.
    pub fn set_position(&mut self, p: Vec2) {
        match &mut self.kind {
            MoleculeKind::MessengerRna(rna) => rna.polymer_mut().set_position(p),
            MoleculeKind::MessengerRnaFragment(fragment) => fragment.polymer_mut().set_position(p),
            _ => {}
        }
        self.body.position = p;
    }

    /// Create the sites this molecule carries for others to dock on: the
    /// shared docking site of an mRNA, the product site of a ribosome.
    pub fn register_owned_sites(&mut self, sites: &mut SiteRegistry) {
        let id = self.id;
        let position = self.body.position;
        match &mut self.kind {
            MoleculeKind::MessengerRna(rna) if rna.site().is_none() => {
                let site = sites.insert(rna.site_anchor(), 1.0, SiteOwner::MessengerRna(id));
                rna.set_site(site);
            }
            MoleculeKind::Ribosome(r) if r.product_site().is_none() => {
                let site = sites.insert(position + Ribosome::PRODUCT_SITE_OFFSET, 1.0, SiteOwner::Ribosome(id));
                r.set_product_site(site);
            }
            _ => {}
        }
    }

    /// Owned sites paired with where they belong right now.
    pub fn owned_site_positions(&self) -> Vec<(SiteId, Vec2)> {
        match &self.kind {
            MoleculeKind::MessengerRna(rna) => rna.site().map(|s| (s, rna.site_anchor())).into_iter().collect(),
            MoleculeKind::Ribosome(r) => r
                .product_site()
                .map(|s| (s, self.body.position + Ribosome::PRODUCT_SITE_OFFSET))
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_motion_bounds(&mut self, bounds: MotionBounds) {
        self.body.motion_bounds = bounds;
    }

    pub fn set_user_controlled(&mut self, controlled: bool) {
        self.body.user_controlled = controlled;
    }

    pub fn set_z(&mut self, z: f64) {
        self.body.z = z.clamp(-1.0, 0.0);
    }

    // --- Stepping ------------------------------------------------------

    /// Advance this molecule by `dt` seconds: motion first, then the
    /// state machine. A user-held molecule does neither.
    pub fn step<E: CellEnvironment + ?Sized>(&mut self, dt: f64, env: &mut E) {
        if self.body.user_controlled {
            return;
        }
        self.apply_motion(dt, env);
        if matches!(self.kind, MoleculeKind::MessengerRna(_)) {
            crate::messenger_rna::step(self, dt, env);
        } else if matches!(self.kind, MoleculeKind::MessengerRnaFragment(_)) {
            crate::fragment::step(self, dt, env);
        } else {
            self.step_machine(dt, env);
        }
    }

    fn apply_motion<E: CellEnvironment + ?Sized>(&mut self, dt: f64, env: &E) {
        let footprint = self.footprint();
        let current = Pose::new(self.position(), self.body.z);
        let Body {
            motion,
            motion_bounds,
            rng,
            ..
        } = &mut self.body;
        let next = motion.next_pose(current, &footprint, motion_bounds, dt, rng, env);
        if next.position != current.position {
            self.set_position(next.position);
        }
        self.body.z = next.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_point_tracks_position() {
        let mut m = Biomolecule::rna_polymerase(AgentId::from_seed(1), Vec2::new(100.0, 100.0), 1);
        assert_eq!(m.attachment_point(), Vec2::new(100.0, 70.0));
        m.set_position(Vec2::new(0.0, 0.0));
        assert_eq!(m.attachment_point(), Vec2::new(0.0, -30.0));
    }

    #[test]
    fn docked_footprint_centres_on_site() {
        let m = Biomolecule::transcription_factor(
            AgentId::from_seed(1),
            FactorKind::positive(0),
            Vec2::ZERO,
            1,
        );
        let fp = m.docked_footprint(Vec2::new(500.0, 0.0));
        assert_eq!(fp.center(), Vec2::new(500.0, 15.0));
        assert_eq!(fp.width(), 70.0);
    }

    #[test]
    fn messenger_rna_position_follows_polymer() {
        let config = SimConfig::default();
        let mut m = Biomolecule::messenger_rna(
            AgentId::from_seed(2),
            ProductKind(0),
            Vec2::new(10.0, 10.0),
            &config,
            3,
        );
        m.set_position(Vec2::new(-40.0, 25.0));
        assert!(m.position().distance_to(&Vec2::new(-40.0, 25.0)) < 1e-9);
        assert_eq!(m.kind_name(), "messenger_rna");
        assert!(m.attachment_state().is_none());
    }

    #[test]
    fn docked_protein_starts_attached() {
        let m = Biomolecule::protein(AgentId::from_seed(4), ProductKind(1), SiteId(9), Vec2::ZERO, 5);
        assert_eq!(m.attachment_state(), Some(AttachmentState::Attached));
        assert_eq!(m.attachment_site(), Some(SiteId(9)));
        assert!(!m.is_movable_by_user());
    }

    #[test]
    fn factor_colour_reflects_polarity() {
        let pos = Biomolecule::transcription_factor(AgentId::from_seed(1), FactorKind::positive(0), Vec2::ZERO, 1);
        let neg = Biomolecule::transcription_factor(AgentId::from_seed(2), FactorKind::negative(0), Vec2::ZERO, 1);
        assert_ne!(pos.color(), neg.color());
    }
}
