//! Attachment state machine tests against a minimal scripted environment.

use geneflow_agents::prelude::*;
use std::collections::BTreeMap;

const DT: f64 = 0.05;

/// A cell stand-in that always proposes the same site and has no strand.
struct ScriptedCell {
    config: SimConfig,
    sites: SiteRegistry,
    proposal: Option<SiteId>,
    /// Sites offered as hop targets, whichever site the hopper holds.
    neighbours: Vec<SiteId>,
    target: Option<TranscriptionTarget>,
    molecules: BTreeMap<AgentId, Biomolecule>,
    events: Vec<CellEvent>,
    next: u64,
}

impl ScriptedCell {
    fn new() -> Self {
        Self {
            config: SimConfig::default(),
            sites: SiteRegistry::new(),
            proposal: None,
            neighbours: Vec::new(),
            target: None,
            molecules: BTreeMap::new(),
            events: Vec::new(),
            next: 1000,
        }
    }
}

impl MotionContext for ScriptedCell {
    fn site_position(&self, site: SiteId) -> Option<Vec2> {
        self.sites.get(site).map(|s| s.position)
    }

    fn destruction_point(&self, _messenger_rna: AgentId) -> Option<Vec2> {
        None
    }
}

impl CellEnvironment for ScriptedCell {
    fn config(&self) -> &SimConfig {
        &self.config
    }

    fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    fn sites_mut(&mut self) -> &mut SiteRegistry {
        &mut self.sites
    }

    fn molecule(&self, id: AgentId) -> Option<&Biomolecule> {
        self.molecules.get(&id)
    }

    fn molecule_mut(&mut self, id: AgentId) -> Option<&mut Biomolecule> {
        self.molecules.get_mut(&id)
    }

    fn propose_attachment(&mut self, _requester: Requester<'_>) -> Option<SiteId> {
        self.proposal.filter(|s| self.sites.get(*s).is_some_and(|site| site.is_available()))
    }

    fn adjacent_sites(&mut self, _requester: Requester<'_>, site: SiteId) -> Vec<SiteId> {
        self.neighbours
            .iter()
            .copied()
            .filter(|s| *s != site && self.sites.get(*s).is_some_and(|n| n.is_available()))
            .collect()
    }

    fn transcription_target(&self, _site: SiteId) -> Option<TranscriptionTarget> {
        self.target
    }

    fn set_separation(&mut self, _owner: AgentId, _x: f64, _amount: f64) {}

    fn remove_separation(&mut self, _owner: AgentId) {}

    fn dna_attached_between(&self, _from_x: f64, _to_x: f64, _exclude: AgentId) -> Vec<AgentId> {
        Vec::new()
    }

    fn next_agent_id(&mut self) -> AgentId {
        self.next += 1;
        AgentId::from_seed(self.next)
    }

    fn spawn(&mut self, molecule: Biomolecule) -> AgentId {
        let id = molecule.id();
        self.molecules.insert(id, molecule);
        id
    }

    fn remove(&mut self, id: AgentId) {
        self.molecules.remove(&id);
    }

    fn force_detach(&mut self, _id: AgentId) {}

    fn force_abort_pending_attachment(&mut self, _id: AgentId) {}

    fn recycle_mode(&self) -> bool {
        false
    }

    fn recycle_zones(&self) -> Vec<Rect> {
        Vec::new()
    }

    fn record_product(&mut self, _product: ProductKind) {}

    fn emit(&mut self, event: CellEvent) {
        self.events.push(event);
    }
}

fn factor_above(site: Vec2, id: u64) -> Biomolecule {
    Biomolecule::transcription_factor(
        AgentId::from_seed(id),
        FactorKind::positive(0),
        site - TranscriptionFactor::ATTACHMENT_OFFSET + Vec2::new(0.0, 100.0),
        id,
    )
}

fn polymerase_above(site: Vec2, id: u64) -> Biomolecule {
    Biomolecule::rna_polymerase(
        AgentId::from_seed(id),
        site - RnaPolymerase::ATTACHMENT_OFFSET + Vec2::new(0.0, 100.0),
        id,
    )
}

fn hop_threshold(molecule: &Biomolecule) -> f64 {
    match molecule.kind() {
        MoleculeKind::TranscriptionFactor(f) => f.hop_threshold(),
        other => panic!("not a factor: {}", other.name()),
    }
}

fn step_until(
    molecule: &mut Biomolecule,
    cell: &mut ScriptedCell,
    state: AttachmentState,
    max_ticks: usize,
) -> usize {
    for tick in 0..max_ticks {
        if molecule.attachment_state() == Some(state) {
            return tick;
        }
        molecule.step(DT, cell);
    }
    panic!("never reached {:?}; stuck in {:?}", state, molecule.attachment_state());
}

#[test]
fn factor_cycles_through_every_state() {
    let mut cell = ScriptedCell::new();
    let site = cell.sites.insert(Vec2::ZERO, 0.0, SiteOwner::Dna);
    cell.proposal = Some(site);
    let mut factor = factor_above(Vec2::ZERO, 1);
    let id = factor.id();

    factor.step(DT, &mut cell);
    assert_eq!(factor.attachment_state(), Some(AttachmentState::MovingTowardsAttachment));
    assert_eq!(cell.sites.get(site).unwrap().occupant, Some(id));
    assert!(factor.approaching_dna());

    step_until(&mut factor, &mut cell, AttachmentState::Attached, 100);
    assert!(factor.attached_to_dna());

    // Zero affinity decays on the first attached step.
    factor.step(DT, &mut cell);
    assert_eq!(factor.attachment_state(), Some(AttachmentState::UnattachedButUnavailable));
    assert!(cell.sites.get(site).unwrap().is_available());

    let refractory_ticks = step_until(&mut factor, &mut cell, AttachmentState::UnattachedAndAvailable, 200);
    assert!(refractory_ticks as f64 * DT >= cell.config.refractory_time - DT);

    let kinds: Vec<&str> = cell
        .events
        .iter()
        .map(|e| match e {
            CellEvent::Approaching { .. } => "approaching",
            CellEvent::Attached { .. } => "attached",
            CellEvent::Detached { .. } => "detached",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["approaching", "attached", "detached"]);
}

#[test]
fn second_requester_cannot_reserve_a_held_site() {
    let mut cell = ScriptedCell::new();
    let site = cell.sites.insert(Vec2::ZERO, 0.9, SiteOwner::Dna);
    cell.proposal = Some(site);
    let mut first = factor_above(Vec2::ZERO, 1);
    let mut second = factor_above(Vec2::ZERO, 2);

    first.step(DT, &mut cell);
    // A held site refuses a second reservation.
    assert!(!cell.sites.reserve(site, second.id()));
    second.step(DT, &mut cell);

    assert_eq!(cell.sites.get(site).unwrap().occupant, Some(first.id()));
    assert_eq!(second.attachment_state(), Some(AttachmentState::UnattachedAndAvailable));
}

#[test]
fn aborting_an_approach_frees_the_site() {
    let mut cell = ScriptedCell::new();
    let site = cell.sites.insert(Vec2::ZERO, 0.9, SiteOwner::Dna);
    cell.proposal = Some(site);
    let mut factor = factor_above(Vec2::ZERO, 1);
    factor.step(DT, &mut cell);

    cell.proposal = None;
    factor.force_abort_pending_attachment(&mut cell);
    assert_eq!(factor.attachment_state(), Some(AttachmentState::UnattachedAndAvailable));
    assert!(cell.sites.get(site).unwrap().is_available());
    assert!(!factor.approaching_dna());
}

#[test]
fn vanished_site_detaches_an_attached_molecule() {
    let mut cell = ScriptedCell::new();
    let site = cell.sites.insert(Vec2::ZERO, 0.99, SiteOwner::Dna);
    cell.config.factor_half_life = 1e6;
    cell.proposal = Some(site);
    let mut factor = factor_above(Vec2::ZERO, 1);
    step_until(&mut factor, &mut cell, AttachmentState::Attached, 100);

    cell.sites.remove(site);
    factor.step(DT, &mut cell);
    assert_eq!(factor.attachment_state(), Some(AttachmentState::UnattachedButUnavailable));
    assert!(factor.attachment_site().is_none());
}

#[test]
fn grab_skips_the_refractory_period() {
    let mut cell = ScriptedCell::new();
    let site = cell.sites.insert(Vec2::ZERO, 0.99, SiteOwner::Dna);
    cell.config.factor_half_life = 1e6;
    cell.proposal = Some(site);
    let mut factor = factor_above(Vec2::ZERO, 1);
    step_until(&mut factor, &mut cell, AttachmentState::Attached, 100);

    factor.force_immediate_unattached_and_available(&mut cell);
    assert_eq!(factor.attachment_state(), Some(AttachmentState::UnattachedAndAvailable));
    assert!(cell.sites.get(site).unwrap().is_available());
}

#[test]
fn factor_hop_chance_halves_until_it_lets_go() {
    let mut cell = ScriptedCell::new();
    cell.config.factor_hop_probability = 1.0;
    let left = cell.sites.insert(Vec2::ZERO, 0.0, SiteOwner::Dna);
    let right = cell.sites.insert(Vec2::new(34.0, 0.0), 0.0, SiteOwner::Dna);
    cell.neighbours = vec![left, right];
    cell.proposal = Some(left);
    let mut factor = factor_above(Vec2::ZERO, 3);
    let id = factor.id();
    step_until(&mut factor, &mut cell, AttachmentState::Attached, 100);
    assert_eq!(hop_threshold(&factor), 1.0);

    // Zero affinity makes every attached step a detach decision.
    let mut hops = 0;
    for _ in 0..200 {
        if factor.attachment_state() != Some(AttachmentState::Attached) {
            break;
        }
        factor.step(DT, &mut cell);
        let seen = cell
            .events
            .iter()
            .filter(|e| matches!(e, CellEvent::Hopped { id: h, .. } if *h == id))
            .count();
        if seen > hops {
            hops = seen;
            assert_eq!(hop_threshold(&factor), 0.5f64.powi(hops as i32));
        }
    }

    assert!(hops >= 1, "a certain first hop never happened");
    assert_eq!(factor.attachment_state(), Some(AttachmentState::UnattachedButUnavailable));
    assert!(cell.sites.get(left).unwrap().is_available());
    assert!(cell.sites.get(right).unwrap().is_available());
}

#[test]
fn polymerase_commit_waits_for_a_decay_event() {
    let mut waits = Vec::new();
    for seed in 1..=8u64 {
        let mut cell = ScriptedCell::new();
        let site = cell.sites.insert(Vec2::ZERO, 0.8, SiteOwner::Dna);
        cell.proposal = Some(site);
        cell.target = Some(TranscriptionTarget {
            gene: 0,
            end_x: 3400.0,
            product: ProductKind(0),
        });
        let mut polymerase = polymerase_above(Vec2::ZERO, seed);
        step_until(&mut polymerase, &mut cell, AttachmentState::Attached, 200);

        let mut ticks = 0;
        while polymerase.state_name() != "conforming" {
            polymerase.step(DT, &mut cell);
            ticks += 1;
            assert_eq!(
                polymerase.attachment_state(),
                Some(AttachmentState::Attached),
                "a favoured start site never lets go"
            );
            assert!(ticks < 10_000, "seed {} never committed", seed);
        }
        waits.push(ticks);
    }
    waits.sort_unstable();
    waits.dedup();
    assert!(waits.len() > 1, "every seed committed after the same wait");
}

#[test]
fn polymerase_leaves_a_weak_start_site() {
    let mut cell = ScriptedCell::new();
    let site = cell.sites.insert(Vec2::ZERO, 0.3, SiteOwner::Dna);
    cell.proposal = Some(site);
    cell.target = Some(TranscriptionTarget {
        gene: 0,
        end_x: 3400.0,
        product: ProductKind(0),
    });
    let mut polymerase = polymerase_above(Vec2::ZERO, 4);
    step_until(&mut polymerase, &mut cell, AttachmentState::Attached, 200);

    for _ in 0..2_000 {
        if polymerase.attachment_state() != Some(AttachmentState::Attached) {
            break;
        }
        polymerase.step(DT, &mut cell);
        assert_ne!(polymerase.state_name(), "conforming");
    }
    assert_eq!(polymerase.attachment_state(), Some(AttachmentState::UnattachedButUnavailable));
    assert_eq!(polymerase.conformation(), Some(0.0));
    assert!(cell.sites.get(site).unwrap().is_available());
}

#[test]
fn destroyer_halves_its_rate_while_the_messenger_rna_is_written() {
    let mut cell = ScriptedCell::new();
    let rna_id = AgentId::from_seed(500);
    let mut rna = Biomolecule::messenger_rna(rna_id, ProductKind(0), Vec2::new(0.0, 400.0), &cell.config, 7);
    rna.as_messenger_rna_mut().unwrap().grow(1000.0);
    rna.register_owned_sites(&mut cell.sites);
    let site = rna.as_messenger_rna().unwrap().site().unwrap();
    cell.molecules.insert(rna_id, rna);
    cell.proposal = Some(site);

    let site_position = cell.sites.get(site).unwrap().position;
    let mut destroyer = Biomolecule::messenger_rna_destroyer(
        AgentId::from_seed(1),
        site_position - MessengerRnaDestroyer::ATTACHMENT_OFFSET + Vec2::new(0.0, 100.0),
        1,
    );
    step_until(&mut destroyer, &mut cell, AttachmentState::Attached, 200);
    let length = |cell: &ScriptedCell| cell.molecules[&rna_id].as_messenger_rna().unwrap().length();
    let full_rate = cell.config.destruction_rate * DT;

    let before = length(&cell);
    destroyer.step(DT, &mut cell);
    let consumed = before - length(&cell);
    assert!((consumed - full_rate * 0.5).abs() < 1e-6, "consumed {} while synthesizing", consumed);

    let config = cell.config.clone();
    let released = cell
        .molecules
        .get_mut(&rna_id)
        .and_then(|m| m.as_messenger_rna_mut())
        .map(|r| r.release_from_polymerase(&config));
    assert_eq!(released, Some(true));

    let before = length(&cell);
    destroyer.step(DT, &mut cell);
    let consumed = before - length(&cell);
    assert!((consumed - full_rate).abs() < 1e-6, "consumed {} after release", consumed);
}
