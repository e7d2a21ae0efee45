//! mRNA fragment — a piece shed by a degrader. Grows while held, then
//! drifts off and fades away.

use crate::environment::CellEnvironment;
use crate::molecule::{Biomolecule, MoleculeKind};
use geneflow_core::motion::MotionStrategy;
use geneflow_core::polymer::WindingPolymer;
use geneflow_core::types::*;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FragmentState {
    AttachedToDegrader,
    UnattachedAndFading { remaining: f64, duration: f64 },
}

#[derive(Debug, Clone)]
pub struct MessengerRnaFragment {
    state: FragmentState,
    destroyer: AgentId,
    target_length: f64,
    polymer: WindingPolymer,
    entry_pending: bool,
}

impl MessengerRnaFragment {
    pub fn new(destroyer: AgentId, target_length: f64, polymer: WindingPolymer) -> Self {
        Self {
            state: FragmentState::AttachedToDegrader,
            destroyer,
            target_length,
            polymer,
            entry_pending: false,
        }
    }

    pub fn state(&self) -> FragmentState {
        self.state
    }

    pub fn state_name(&self) -> &'static str {
        match self.state {
            FragmentState::AttachedToDegrader => "attached_to_degrader",
            FragmentState::UnattachedAndFading { .. } => "unattached_and_fading",
        }
    }

    pub fn destroyer(&self) -> AgentId {
        self.destroyer
    }

    pub fn target_length(&self) -> f64 {
        self.target_length
    }

    pub fn length(&self) -> f64 {
        self.polymer.length()
    }

    pub fn is_complete(&self) -> bool {
        self.length() >= self.target_length
    }

    pub fn polymer(&self) -> &WindingPolymer {
        &self.polymer
    }

    pub(crate) fn polymer_mut(&mut self) -> &mut WindingPolymer {
        &mut self.polymer
    }

    pub fn add_length(&mut self, length: f64) {
        if length > 0.0 {
            self.polymer.add_length(length);
        }
    }

    /// Let the fragment drift off; it fades out over `fade_duration`.
    pub fn release_from_degrader(&mut self, fade_duration: f64) {
        if self.state != FragmentState::AttachedToDegrader {
            return;
        }
        self.state = FragmentState::UnattachedAndFading {
            remaining: fade_duration,
            duration: fade_duration,
        };
        self.entry_pending = true;
    }
}

pub(crate) fn step<E: CellEnvironment + ?Sized>(molecule: &mut Biomolecule, dt: f64, env: &mut E) {
    let Biomolecule { id, kind, body, .. } = molecule;
    let MoleculeKind::MessengerRnaFragment(fragment) = kind else {
        return;
    };
    if fragment.entry_pending {
        fragment.entry_pending = false;
        body.motion = MotionStrategy::random_walk();
    }
    if let FragmentState::UnattachedAndFading { remaining, duration } = fragment.state {
        let remaining = remaining - dt;
        body.existence_strength = if duration > 0.0 {
            (remaining / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        fragment.state = FragmentState::UnattachedAndFading { remaining, duration };
        if remaining <= 0.0 {
            debug!(agent = %id, "Fragment faded out");
            env.remove(*id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn fragment(target: f64) -> MessengerRnaFragment {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let polymer = WindingPolymer::coiled(Vec2::ZERO, 15.0, &mut rng);
        MessengerRnaFragment::new(AgentId::from_seed(1), target, polymer)
    }

    #[test]
    fn completes_at_target_length() {
        let mut f = fragment(50.0);
        f.add_length(30.0);
        assert!(!f.is_complete());
        f.add_length(25.0);
        assert!(f.is_complete());
    }

    #[test]
    fn release_starts_fade_once() {
        let mut f = fragment(50.0);
        f.release_from_degrader(2.0);
        assert_eq!(
            f.state(),
            FragmentState::UnattachedAndFading {
                remaining: 2.0,
                duration: 2.0
            }
        );
        f.release_from_degrader(5.0);
        assert_eq!(f.state_name(), "unattached_and_fading");
        assert!(matches!(f.state(), FragmentState::UnattachedAndFading { duration, .. } if duration == 2.0));
    }
}
