//! Messenger RNA — the polymer a polymerase writes and ribosomes read.
//!
//! The mRNA runs its own machine rather than the generic one:
//!
//! ```text
//! BeingSynthesized --released--> DetachingFromProducer --3 s--> WanderingAroundCytoplasm
//!                                          |                        |    ^
//!                                          | fade when formed       |    | last translator leaves
//!                                          v                        v    |
//!                                  UnattachedAndFading        BeingTranslated
//!
//! any state but fading --degrader attaches--> BeingDestroyed
//! ```
//!
//! Transitions triggered from outside (by the polymerase, a ribosome or a
//! degrader) only record the new state; its entry hook runs on the mRNA's
//! own next step, where the body is at hand.

use crate::environment::CellEnvironment;
use crate::machine::DETACH_DIRECTION;
use crate::molecule::{Biomolecule, Body, MoleculeKind};
use geneflow_core::config::SimConfig;
use geneflow_core::motion::MotionStrategy;
use geneflow_core::polymer::WindingPolymer;
use geneflow_core::types::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessengerRnaState {
    BeingSynthesized,
    BeingTranslated,
    WanderingAroundCytoplasm,
    BeingDestroyed,
    DetachingFromProducer { remaining: f64 },
    UnattachedAndFading { delay_remaining: f64, fade_remaining: f64 },
}

#[derive(Debug, Clone)]
pub struct MessengerRna {
    state: MessengerRnaState,
    product: ProductKind,
    polymer: WindingPolymer,
    site: Option<SiteId>,
    synthesizing: bool,
    translators: BTreeMap<AgentId, SegmentId>,
    destroyer: Option<(AgentId, SegmentId)>,
    entry_pending: bool,
}

impl MessengerRna {
    pub fn new(product: ProductKind, polymer: WindingPolymer) -> Self {
        Self {
            state: MessengerRnaState::BeingSynthesized,
            product,
            polymer,
            site: None,
            synthesizing: true,
            translators: BTreeMap::new(),
            destroyer: None,
            entry_pending: true,
        }
    }

    pub fn state(&self) -> MessengerRnaState {
        self.state
    }

    pub fn state_name(&self) -> &'static str {
        match self.state {
            MessengerRnaState::BeingSynthesized => "being_synthesized",
            MessengerRnaState::BeingTranslated => "being_translated",
            MessengerRnaState::WanderingAroundCytoplasm => "wandering_around_cytoplasm",
            MessengerRnaState::BeingDestroyed => "being_destroyed",
            MessengerRnaState::DetachingFromProducer { .. } => "detaching_from_producer",
            MessengerRnaState::UnattachedAndFading { .. } => "unattached_and_fading",
        }
    }

    pub fn product(&self) -> ProductKind {
        self.product
    }

    pub fn polymer(&self) -> &WindingPolymer {
        &self.polymer
    }

    pub(crate) fn polymer_mut(&mut self) -> &mut WindingPolymer {
        &mut self.polymer
    }

    pub fn length(&self) -> f64 {
        self.polymer.length()
    }

    /// Docking site shared by ribosomes and degraders.
    pub fn site(&self) -> Option<SiteId> {
        self.site
    }

    pub(crate) fn set_site(&mut self, site: SiteId) {
        self.site = Some(site);
    }

    pub fn is_being_synthesized(&self) -> bool {
        self.synthesizing
    }

    pub fn translator_count(&self) -> usize {
        self.translators.len()
    }

    pub fn destroyer(&self) -> Option<AgentId> {
        self.destroyer.map(|(id, _)| id)
    }

    /// Whether a ribosome may dock right now.
    pub fn accepts_translator(&self) -> bool {
        self.state == MessengerRnaState::WanderingAroundCytoplasm && self.destroyer.is_none()
    }

    /// Whether a degrader may dock right now.
    pub fn accepts_destroyer(&self) -> bool {
        matches!(
            self.state,
            MessengerRnaState::BeingSynthesized | MessengerRnaState::WanderingAroundCytoplasm
        ) && self.destroyer.is_none()
            && self.translators.is_empty()
    }

    /// Where the docking site should sit: the translation channel's exit if
    /// one exists, else the end of the leader.
    pub fn site_anchor(&self) -> Vec2 {
        let channel = self
            .translators
            .values()
            .next()
            .and_then(|id| self.polymer.segment(*id));
        match channel.or_else(|| self.polymer.first_segment()) {
            Some(segment) => segment.lower_right(),
            None => self.polymer.position(),
        }
    }

    /// Where a degrader is consuming this mRNA.
    pub fn destruction_point(&self) -> Option<Vec2> {
        let (_, channel) = self.destroyer?;
        self.polymer.segment(channel).map(|s| s.lower_right())
    }

    fn set_state(&mut self, state: MessengerRnaState) {
        if self.state != state {
            debug!(from = self.state_name(), "mRNA state change");
        }
        self.state = state;
        self.entry_pending = true;
    }

    // --- Synthesis -----------------------------------------------------

    /// Extend the mRNA at its growing end.
    pub fn grow(&mut self, length: f64) {
        self.polymer.add_length(length);
    }

    /// Keep the growing end on the polymerase.
    pub fn set_lower_right(&mut self, p: Vec2) {
        self.polymer.set_lower_right_position(p);
    }

    /// Called once by the producing polymerase when synthesis is complete.
    pub fn release_from_polymerase(&mut self, config: &SimConfig) -> bool {
        if !self.synthesizing {
            debug_assert!(false, "released an mRNA that is not being synthesized");
            warn!("Release of an mRNA that is not being synthesized");
            return false;
        }
        self.synthesizing = false;
        if self.state == MessengerRnaState::BeingSynthesized {
            self.set_state(MessengerRnaState::DetachingFromProducer {
                remaining: config.detach_drift_time,
            });
        }
        true
    }

    // --- Translation ---------------------------------------------------

    /// Turn the leader into a translation channel of `capacity` for
    /// `ribosome`. Returns the channel segment.
    pub fn initiate_translation(&mut self, ribosome: AgentId, capacity: f64) -> Option<SegmentId> {
        if !self.accepts_translator() && self.state != MessengerRnaState::BeingTranslated {
            return None;
        }
        let channel = self.polymer.first_segment()?.id();
        self.polymer.set_segment_capacity(channel, capacity);
        self.translators.insert(ribosome, channel);
        self.set_state(MessengerRnaState::BeingTranslated);
        Some(channel)
    }

    /// Pull `length` through `ribosome`'s channel. Returns `true` once the
    /// whole mRNA has passed through.
    pub fn advance_translation(&mut self, ribosome: AgentId, length: f64) -> bool {
        match self.translators.get(&ribosome) {
            Some(channel) => self.polymer.advance(*channel, length),
            None => true,
        }
    }

    /// Keep `ribosome`'s channel exit on the ribosome.
    pub fn align_channel(&mut self, ribosome: AgentId, p: Vec2) {
        if let Some(channel) = self.translators.get(&ribosome) {
            self.polymer.set_segment_lower_right(*channel, p);
        }
    }

    pub fn end_translation(&mut self, ribosome: AgentId, config: &SimConfig) {
        if self.translators.remove(&ribosome).is_none() {
            return;
        }
        self.polymer.recoil(config.leader_length);
        if self.translators.is_empty() && self.state == MessengerRnaState::BeingTranslated {
            self.set_state(MessengerRnaState::WanderingAroundCytoplasm);
        }
    }

    // --- Destruction ---------------------------------------------------

    /// Start consumption by `destroyer` at the leader, which becomes a
    /// channel of `capacity`. Returns the channel.
    pub fn initiate_destruction(&mut self, destroyer: AgentId, capacity: f64) -> Option<SegmentId> {
        if !self.accepts_destroyer() {
            return None;
        }
        let channel = self.polymer.first_segment()?.id();
        self.polymer.set_segment_capacity(channel, capacity);
        self.destroyer = Some((destroyer, channel));
        self.set_state(MessengerRnaState::BeingDestroyed);
        Some(channel)
    }

    /// Consume `length`. Returns `true` once nothing is left and synthesis
    /// has ended.
    pub fn advance_destruction(&mut self, length: f64) -> bool {
        let Some((_, channel)) = self.destroyer else {
            return false;
        };
        let empty = self.polymer.advance_and_remove(channel, length);
        empty && !self.synthesizing
    }

    pub fn abort_destruction(&mut self) {
        if self.destroyer.take().is_none() {
            return;
        }
        let next = if self.synthesizing {
            MessengerRnaState::BeingSynthesized
        } else {
            MessengerRnaState::WanderingAroundCytoplasm
        };
        self.set_state(next);
    }

    fn apply_entry(&mut self, body: &mut Body) {
        self.entry_pending = false;
        let (motion, movable) = match self.state {
            MessengerRnaState::BeingSynthesized
            | MessengerRnaState::BeingTranslated
            | MessengerRnaState::BeingDestroyed => (MotionStrategy::Stillness, false),
            MessengerRnaState::WanderingAroundCytoplasm => (MotionStrategy::random_walk(), true),
            MessengerRnaState::DetachingFromProducer { .. } => {
                (MotionStrategy::wander(DETACH_DIRECTION), true)
            }
            MessengerRnaState::UnattachedAndFading { .. } => (MotionStrategy::random_walk(), false),
        };
        body.motion = motion;
        body.movable_by_user = movable;
    }
}

pub(crate) fn step<E: CellEnvironment + ?Sized>(molecule: &mut Biomolecule, dt: f64, env: &mut E) {
    let Biomolecule { id, kind, body, .. } = molecule;
    let MoleculeKind::MessengerRna(rna) = kind else {
        return;
    };
    if rna.entry_pending {
        rna.apply_entry(body);
    }
    match rna.state {
        MessengerRnaState::WanderingAroundCytoplasm => {
            // Hold still while a ribosome or degrader is on its way.
            let reserved = rna
                .site
                .and_then(|s| env.sites().get(s))
                .map(|s| s.occupant.is_some())
                .unwrap_or(false);
            let still = matches!(body.motion, MotionStrategy::Stillness);
            if reserved && !still {
                body.motion = MotionStrategy::Stillness;
            } else if !reserved && still {
                body.motion = MotionStrategy::random_walk();
            }
        }
        MessengerRnaState::DetachingFromProducer { remaining } => {
            let remaining = remaining - dt;
            if remaining > 0.0 {
                rna.state = MessengerRnaState::DetachingFromProducer { remaining };
            } else if env.config().fade_when_formed {
                rna.set_state(MessengerRnaState::UnattachedAndFading {
                    delay_remaining: env.config().fade_delay,
                    fade_remaining: env.config().fade_duration,
                });
            } else {
                rna.set_state(MessengerRnaState::WanderingAroundCytoplasm);
            }
        }
        MessengerRnaState::UnattachedAndFading {
            delay_remaining,
            fade_remaining,
        } => {
            if delay_remaining > 0.0 {
                rna.state = MessengerRnaState::UnattachedAndFading {
                    delay_remaining: delay_remaining - dt,
                    fade_remaining,
                };
                return;
            }
            let fade_remaining = fade_remaining - dt;
            let duration = env.config().fade_duration;
            body.existence_strength = if duration > 0.0 {
                (fade_remaining / duration).clamp(0.0, 1.0)
            } else {
                0.0
            };
            rna.state = MessengerRnaState::UnattachedAndFading {
                delay_remaining,
                fade_remaining,
            };
            if fade_remaining <= 0.0 {
                debug!(agent = %id, "mRNA faded out");
                env.remove(*id);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn rna(length: f64) -> MessengerRna {
        let config = SimConfig::default();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let polymer =
            WindingPolymer::with_leader(Vec2::ZERO, config.leader_length, config.inter_point_distance, &mut rng);
        let mut rna = MessengerRna::new(ProductKind(0), polymer);
        rna.grow(length);
        rna
    }

    #[test]
    fn release_moves_to_detaching() {
        let config = SimConfig::default();
        let mut r = rna(500.0);
        assert!(r.release_from_polymerase(&config));
        assert!(!r.is_being_synthesized());
        assert_eq!(r.state_name(), "detaching_from_producer");
    }

    #[test]
    fn translation_needs_a_free_wandering_strand() {
        let config = SimConfig::default();
        let mut r = rna(500.0);
        assert!(r.initiate_translation(AgentId::from_seed(1), 170.0).is_none());
        r.release_from_polymerase(&config);
        r.set_state(MessengerRnaState::WanderingAroundCytoplasm);
        let channel = r.initiate_translation(AgentId::from_seed(1), 170.0);
        assert!(channel.is_some());
        assert_eq!(r.state(), MessengerRnaState::BeingTranslated);
        assert!(!r.accepts_destroyer());
    }

    #[test]
    fn full_translation_keeps_length_and_recoils() {
        let config = SimConfig::default();
        let mut r = rna(800.0);
        r.release_from_polymerase(&config);
        r.set_state(MessengerRnaState::WanderingAroundCytoplasm);
        let ribosome = AgentId::from_seed(5);
        r.initiate_translation(ribosome, 170.0);
        let mut steps = 0;
        while !r.advance_translation(ribosome, 20.0) {
            steps += 1;
            assert!(steps < 500);
        }
        assert!((r.length() - 800.0).abs() < 1e-6);
        r.end_translation(ribosome, &config);
        assert_eq!(r.state(), MessengerRnaState::WanderingAroundCytoplasm);
        assert!(r.polymer().segments()[0].is_flat());
    }

    #[test]
    fn destruction_is_never_complete_during_synthesis() {
        let mut r = rna(300.0);
        r.initiate_destruction(AgentId::from_seed(9), 60.0);
        assert!(!r.advance_destruction(1000.0));
        assert!(r.destruction_point().is_some());
    }

    #[test]
    fn destruction_completes_after_release() {
        let config = SimConfig::default();
        let mut r = rna(300.0);
        r.release_from_polymerase(&config);
        r.set_state(MessengerRnaState::WanderingAroundCytoplasm);
        r.initiate_destruction(AgentId::from_seed(9), 60.0);
        let mut done = false;
        for _ in 0..100 {
            done = r.advance_destruction(30.0);
            if done {
                break;
            }
        }
        assert!(done);
    }
}
