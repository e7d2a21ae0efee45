//! Cell — the world every biomolecule lives in.
//!
//! The cell owns the molecules, the site registry and the strand, and runs
//! the tick loop. Each tick:
//!
//! 1. Molecules spawned since the last tick join the step order, which is
//!    reshuffled once per reshuffle interval
//! 2. Every molecule steps in order (motion, then its state machine)
//! 3. Molecules scheduled for removal leave, taking their sites along
//! 4. Sites carried by molecules follow their owners
//! 5. Strand geometry is rebuilt from the active separations
//! 6. Gene gates and start-site affinities are recomputed
//!
//! A stepping molecule is taken out of the arena for the length of its
//! step and handed the cell as its [`CellEnvironment`].

use crate::dna::{BasePair, DnaMolecule, Separation};
use crate::scenario::ScenarioConfig;
use crate::search::{self, MoleculeOccupancy};
use geneflow_agents::environment::{BindingKind, CellEnvironment, CellEvent, Requester, TranscriptionTarget};
use geneflow_agents::molecule::Biomolecule;
use geneflow_core::bounds::MotionBounds;
use geneflow_core::config::SimConfig;
use geneflow_core::error::{AgentError, GeneflowError, Result};
use geneflow_core::motion::MotionContext;
use geneflow_core::site::{SiteOwner, SiteRegistry};
use geneflow_core::types::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

/// Most events kept in the history; the oldest are dropped first.
pub const EVENT_HISTORY_CAPACITY: usize = 10_000;

/// Statistics about the cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellStats {
    pub time: f64,
    pub ticks: u64,
    pub molecules: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub attached_to_dna: usize,
    pub total_spawned: usize,
    pub total_removed: usize,
    pub transcriptions_started: usize,
    pub messenger_rnas_released: usize,
    pub translations_started: usize,
    pub proteins_released: usize,
    pub messenger_rnas_destroyed: usize,
    pub fragments_released: usize,
    pub products: BTreeMap<ProductKind, u64>,
}

/// A serializable snapshot of one molecule.
#[derive(Debug, Clone, Serialize)]
pub struct MoleculeSnapshot {
    pub id: AgentId,
    pub kind: String,
    pub state: String,
    pub motion: String,
    pub position: Vec2,
    pub z: f64,
    pub footprint: Rect,
    pub color: Rgba,
    pub existence_strength: f64,
    pub attached_to_dna: bool,
    pub approaching_dna: bool,
    pub user_controlled: bool,
    pub conformation: Option<f64>,
    pub attachment_site: Option<SiteId>,
    pub polymer_points: Vec<Vec2>,
}

/// A serializable snapshot of one gene.
#[derive(Debug, Clone, Serialize)]
pub struct GeneSnapshot {
    pub index: usize,
    pub product: ProductKind,
    pub transcription_favored: bool,
    pub start_affinity: f64,
}

/// A serializable snapshot of the strand.
#[derive(Debug, Clone, Serialize)]
pub struct DnaSnapshot {
    pub base_pairs: Vec<BasePair>,
    pub strand1: Vec<Vec2>,
    pub strand2: Vec<Vec2>,
    pub separations: Vec<Separation>,
    pub genes: Vec<GeneSnapshot>,
}

/// A complete serializable snapshot of the cell at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct CellSnapshot {
    pub time: f64,
    pub molecules: Vec<MoleculeSnapshot>,
    pub dna: DnaSnapshot,
    /// Sites highlighted while the user holds a molecule.
    pub hints: Vec<Vec2>,
    pub stats: CellStats,
}

/// The cell. Owns every molecule and runs the simulation.
pub struct Cell {
    config: SimConfig,
    scenario: ScenarioConfig,
    bounds: MotionBounds,
    sites: SiteRegistry,
    dna: DnaMolecule,
    molecules: BTreeMap<AgentId, Biomolecule>,
    order: Vec<AgentId>,
    spawned: Vec<AgentId>,
    pending_removals: Vec<AgentId>,
    event_history: VecDeque<(f64, CellEvent)>,
    stats: CellStats,
    rng: ChaCha12Rng,
    next_id: u64,
    since_reshuffle: f64,
    recycle_mode: bool,
    held: Option<AgentId>,
    hints: Vec<Vec2>,
}

impl Cell {
    /// Build a cell from validated parameters and populate it.
    pub fn new(config: SimConfig, scenario: ScenarioConfig) -> Result<Self> {
        config.validate()?;
        scenario.validate()?;
        let mut sites = SiteRegistry::new();
        let dna = DnaMolecule::new(
            scenario.strand_length,
            scenario.strand_left_x,
            scenario.strand_y,
            &scenario.genes,
            &mut sites,
        );
        let mut cell = Self {
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            bounds: MotionBounds::new(scenario.bounds),
            recycle_mode: scenario.recycle_mode,
            config,
            scenario,
            sites,
            dna,
            molecules: BTreeMap::new(),
            order: Vec::new(),
            spawned: Vec::new(),
            pending_removals: Vec::new(),
            event_history: VecDeque::new(),
            stats: CellStats::default(),
            next_id: 0,
            since_reshuffle: 0.0,
            held: None,
            hints: Vec::new(),
        };
        cell.populate();
        info!(
            base_pairs = cell.dna.len(),
            genes = cell.dna.genes().len(),
            molecules = cell.molecules.len(),
            "Cell built"
        );
        Ok(cell)
    }

    fn populate(&mut self) {
        let populations = self.scenario.populations.clone();
        for _ in 0..populations.polymerases {
            let id = self.allocate_id();
            let m = Biomolecule::rna_polymerase(id, Vec2::ZERO, self.seed_for(id));
            self.place_randomly(m);
        }
        for group in &populations.factors {
            for _ in 0..group.count {
                let id = self.allocate_id();
                let m = Biomolecule::transcription_factor(id, group.factor, Vec2::ZERO, self.seed_for(id));
                self.place_randomly(m);
            }
        }
        for _ in 0..populations.ribosomes {
            let id = self.allocate_id();
            let m = Biomolecule::ribosome(id, Vec2::ZERO, self.seed_for(id));
            self.place_randomly(m);
        }
        for _ in 0..populations.destroyers {
            let id = self.allocate_id();
            let m = Biomolecule::messenger_rna_destroyer(id, Vec2::ZERO, self.seed_for(id));
            self.place_randomly(m);
        }
    }

    fn place_randomly(&mut self, mut molecule: Biomolecule) -> AgentId {
        let (w, h) = molecule.size();
        let b = self.scenario.bounds;
        let x = sample(&mut self.rng, b.min_x + w / 2.0, b.max_x - w / 2.0);
        let y = sample(&mut self.rng, b.min_y + h / 2.0, b.max_y - h / 2.0);
        molecule.set_position(Vec2::new(x, y));
        self.insert(molecule)
    }

    fn allocate_id(&mut self) -> AgentId {
        let id = AgentId::from_seed(self.config.seed.rotate_left(32) ^ self.next_id);
        self.next_id += 1;
        id
    }

    fn seed_for(&self, id: AgentId) -> u64 {
        self.config.seed ^ id.stable_bits()
    }

    fn insert(&mut self, mut molecule: Biomolecule) -> AgentId {
        let id = molecule.id();
        molecule.set_motion_bounds(self.bounds.clone());
        molecule.register_owned_sites(&mut self.sites);
        let kind = molecule.kind_name().to_string();
        debug!(agent = %id, kind = %kind, "Spawned");
        self.molecules.insert(id, molecule);
        self.spawned.push(id);
        self.stats.total_spawned += 1;
        self.emit(CellEvent::Spawned { id, kind });
        id
    }

    // --- Spawning ------------------------------------------------------

    pub fn spawn_polymerase(&mut self, position: Vec2) -> AgentId {
        let id = self.allocate_id();
        let m = Biomolecule::rna_polymerase(id, position, self.seed_for(id));
        self.insert(m)
    }

    pub fn spawn_transcription_factor(&mut self, factor: FactorKind, position: Vec2) -> AgentId {
        let id = self.allocate_id();
        let m = Biomolecule::transcription_factor(id, factor, position, self.seed_for(id));
        self.insert(m)
    }

    pub fn spawn_ribosome(&mut self, position: Vec2) -> AgentId {
        let id = self.allocate_id();
        let m = Biomolecule::ribosome(id, position, self.seed_for(id));
        self.insert(m)
    }

    pub fn spawn_destroyer(&mut self, position: Vec2) -> AgentId {
        let id = self.allocate_id();
        let m = Biomolecule::messenger_rna_destroyer(id, position, self.seed_for(id));
        self.insert(m)
    }

    /// A finished mRNA of `length`, already let go by its producer.
    pub fn spawn_messenger_rna(&mut self, product: ProductKind, position: Vec2, length: f64) -> AgentId {
        let id = self.allocate_id();
        let mut m = Biomolecule::messenger_rna(id, product, position, &self.config, self.seed_for(id));
        if let Some(rna) = m.as_messenger_rna_mut() {
            rna.grow(length);
            rna.release_from_polymerase(&self.config);
        }
        self.insert(m)
    }

    /// Remove a molecule right away, letting go of everything it holds.
    pub fn remove(&mut self, id: AgentId) -> Result<()> {
        if !self.molecules.contains_key(&id) {
            return Err(GeneflowError::agent_not_found(id));
        }
        self.with_checked_out(id, |m, cell| m.force_detach(cell));
        self.pending_removals.push(id);
        self.apply_removals();
        Ok(())
    }

    // --- User control --------------------------------------------------

    /// Pick a molecule up. It drops whatever it holds and stops stepping
    /// until released; compatible sites are highlighted meanwhile.
    pub fn grab(&mut self, id: AgentId) -> Result<()> {
        let molecule = self.molecules.get(&id).ok_or_else(|| GeneflowError::agent_not_found(id))?;
        if !molecule.is_movable_by_user() {
            return Err(AgentError::NotGrabbable(id).into());
        }
        self.with_checked_out(id, |m, cell| {
            m.force_immediate_unattached_and_available(cell);
            m.set_user_controlled(true);
        });
        self.held = Some(id);
        self.hints = self.compute_hints(id);
        debug!(agent = %id, hints = self.hints.len(), "Grabbed");
        Ok(())
    }

    pub fn drag_to(&mut self, id: AgentId, position: Vec2) -> Result<()> {
        let molecule = self.molecules.get_mut(&id).ok_or_else(|| GeneflowError::agent_not_found(id))?;
        if !molecule.is_user_controlled() {
            return Err(AgentError::NotHeld(id).into());
        }
        molecule.set_position(position);
        Ok(())
    }

    pub fn release(&mut self, id: AgentId) -> Result<()> {
        let molecule = self.molecules.get_mut(&id).ok_or_else(|| GeneflowError::agent_not_found(id))?;
        if !molecule.is_user_controlled() {
            return Err(AgentError::NotHeld(id).into());
        }
        molecule.set_user_controlled(false);
        if self.held == Some(id) {
            self.held = None;
            self.hints.clear();
        }
        debug!(agent = %id, "Released");
        Ok(())
    }

    /// Make a molecule let go of its site and start its refractory period.
    pub fn force_detach(&mut self, id: AgentId) -> Result<()> {
        self.with_checked_out(id, |m, cell| m.force_detach(cell))
            .ok_or_else(|| GeneflowError::agent_not_found(id))
    }

    pub fn set_recycle_mode(&mut self, on: bool) {
        self.recycle_mode = on;
    }

    /// Rebuild the cell from its scenario.
    pub fn reset(&mut self) {
        for id in self.molecules.keys().copied().collect::<Vec<_>>() {
            self.drop_sites_of(id);
        }
        self.molecules.clear();
        self.order.clear();
        self.spawned.clear();
        self.pending_removals.clear();
        self.dna.reset(&mut self.sites);
        self.event_history.clear();
        self.stats = CellStats::default();
        self.rng = ChaCha12Rng::seed_from_u64(self.config.seed);
        self.next_id = 0;
        self.since_reshuffle = 0.0;
        self.recycle_mode = self.scenario.recycle_mode;
        self.held = None;
        self.hints.clear();
        self.populate();
        info!("Cell reset");
    }

    fn compute_hints(&self, id: AgentId) -> Vec<Vec2> {
        let Some(binding) = self.molecules.get(&id).and_then(|m| m.kind().binding_kind()) else {
            return Vec::new();
        };
        match binding {
            BindingKind::Polymerase | BindingKind::Factor(_) => self
                .dna
                .genes()
                .iter()
                .flat_map(|g| g.hint_positions(binding, &self.sites))
                .collect(),
            BindingKind::Ribosome | BindingKind::Destroyer => self
                .molecules
                .values()
                .filter_map(|m| m.as_messenger_rna())
                .filter(|rna| match binding {
                    BindingKind::Ribosome => rna.accepts_translator(),
                    _ => rna.accepts_destroyer(),
                })
                .filter_map(|rna| self.sites.get(rna.site()?))
                .filter(|s| s.is_available())
                .map(|s| s.position)
                .collect(),
            BindingKind::Protein => Vec::new(),
        }
    }

    // --- Stepping ------------------------------------------------------

    /// Advance the cell by `dt` seconds, in increments no larger than
    /// the configured maximum time step.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let ticks = (dt / self.config.max_time_step - 1e-9).ceil().max(1.0) as u64;
        let h = dt / ticks as f64;
        for _ in 0..ticks {
            self.tick(h);
        }
    }

    /// Run `seconds` of simulated time.
    pub fn run(&mut self, seconds: f64) {
        self.step(seconds);
    }

    fn tick(&mut self, dt: f64) {
        self.order.append(&mut self.spawned);
        self.since_reshuffle += dt;
        if self.since_reshuffle >= self.config.reshuffle_interval {
            self.order.shuffle(&mut self.rng);
            self.since_reshuffle = 0.0;
        }

        let order = self.order.clone();
        for id in order {
            if self.pending_removals.contains(&id) {
                continue;
            }
            if let Some(mut molecule) = self.molecules.remove(&id) {
                molecule.step(dt, self);
                self.molecules.insert(id, molecule);
            }
        }

        self.apply_removals();
        self.refresh_owned_sites();
        self.dna.refresh_geometry();
        self.update_gene_affinities();
        if let Some(id) = self.held {
            self.hints = self.compute_hints(id);
        }
        self.stats.time += dt;
        self.stats.ticks += 1;
    }

    fn with_checked_out<R>(&mut self, id: AgentId, f: impl FnOnce(&mut Biomolecule, &mut Self) -> R) -> Option<R> {
        let mut molecule = self.molecules.remove(&id)?;
        let result = f(&mut molecule, self);
        self.molecules.insert(id, molecule);
        Some(result)
    }

    fn drop_sites_of(&mut self, id: AgentId) {
        self.sites.release_all_held_by(id);
        self.sites.remove_owned_by(SiteOwner::MessengerRna(id));
        self.sites.remove_owned_by(SiteOwner::Ribosome(id));
        self.dna.remove_separation(id);
    }

    fn apply_removals(&mut self) {
        for id in std::mem::take(&mut self.pending_removals) {
            if self.molecules.remove(&id).is_none() {
                continue;
            }
            self.drop_sites_of(id);
            self.order.retain(|o| *o != id);
            self.spawned.retain(|o| *o != id);
            if self.held == Some(id) {
                self.held = None;
                self.hints.clear();
            }
            self.stats.total_removed += 1;
            debug!(agent = %id, "Removed");
            self.emit(CellEvent::Removed { id });
        }
    }

    fn refresh_owned_sites(&mut self) {
        let updates: Vec<(SiteId, Vec2)> = self
            .molecules
            .values()
            .flat_map(|m| m.owned_site_positions())
            .collect();
        for (site, position) in updates {
            self.sites.set_position(site, position);
        }
    }

    fn update_gene_affinities(&mut self) {
        let molecules = &self.molecules;
        for gene in self.dna.genes_mut() {
            gene.update_affinity(&mut self.sites, |id| molecules.get(&id).map(|m| m.attachment_point()));
        }
    }

    // --- Queries -------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    pub fn time(&self) -> f64 {
        self.stats.time
    }

    pub fn dna(&self) -> &DnaMolecule {
        &self.dna
    }

    pub fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    pub fn molecule(&self, id: AgentId) -> Option<&Biomolecule> {
        self.molecules.get(&id)
    }

    pub fn molecules(&self) -> impl Iterator<Item = &Biomolecule> {
        self.molecules.values()
    }

    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    /// Ids of every molecule of the given kind name.
    pub fn ids_of_kind(&self, kind: &str) -> Vec<AgentId> {
        self.molecules
            .values()
            .filter(|m| m.kind_name() == kind)
            .map(|m| m.id())
            .collect()
    }

    pub fn recycle_mode(&self) -> bool {
        self.recycle_mode
    }

    pub fn hints(&self) -> &[Vec2] {
        &self.hints
    }

    pub fn held(&self) -> Option<AgentId> {
        self.held
    }

    /// Finished proteins of `product` released so far.
    pub fn product_count(&self, product: ProductKind) -> u64 {
        self.stats.products.get(&product).copied().unwrap_or(0)
    }

    /// The most recent events, oldest first, up to [`EVENT_HISTORY_CAPACITY`].
    pub fn events(&self) -> &VecDeque<(f64, CellEvent)> {
        &self.event_history
    }

    /// Take the event history, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<(f64, CellEvent)> {
        self.event_history.drain(..).collect()
    }

    pub fn stats(&self) -> CellStats {
        let mut stats = self.stats.clone();
        stats.molecules = self.molecules.len();
        stats.attached_to_dna = self.molecules.values().filter(|m| m.attached_to_dna()).count();
        stats.by_kind = BTreeMap::new();
        for m in self.molecules.values() {
            *stats.by_kind.entry(m.kind_name().to_string()).or_insert(0) += 1;
        }
        stats
    }

    pub fn snapshot(&self) -> CellSnapshot {
        let molecules = self
            .molecules
            .values()
            .map(|m| MoleculeSnapshot {
                id: m.id(),
                kind: m.kind_name().to_string(),
                state: m.state_name().to_string(),
                motion: m.motion_name().to_string(),
                position: m.position(),
                z: m.z(),
                footprint: m.footprint(),
                color: m.color(),
                existence_strength: m.existence_strength(),
                attached_to_dna: m.attached_to_dna(),
                approaching_dna: m.approaching_dna(),
                user_controlled: m.is_user_controlled(),
                conformation: m.conformation(),
                attachment_site: m.attachment_site(),
                polymer_points: m.polymer().map(|p| p.point_positions()).unwrap_or_default(),
            })
            .collect();
        let (strand1, strand2) = self.dna.twist_points();
        let dna = DnaSnapshot {
            base_pairs: self.dna.base_pairs().to_vec(),
            strand1: strand1.to_vec(),
            strand2: strand2.to_vec(),
            separations: self.dna.separations().map(|(_, s)| *s).collect(),
            genes: self
                .dna
                .genes()
                .iter()
                .map(|g| GeneSnapshot {
                    index: g.index(),
                    product: g.product(),
                    transcription_favored: g.is_transcription_favored(),
                    start_affinity: self.sites.get(g.start_site()).map(|s| s.affinity).unwrap_or(0.0),
                })
                .collect(),
        };
        CellSnapshot {
            time: self.stats.time,
            molecules,
            dna,
            hints: self.hints.clone(),
            stats: self.stats(),
        }
    }

    /// The snapshot as JSON.
    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

fn sample(rng: &mut ChaCha12Rng, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        (lo + hi) / 2.0
    }
}

impl MotionContext for Cell {
    fn site_position(&self, site: SiteId) -> Option<Vec2> {
        self.sites.get(site).map(|s| s.position)
    }

    fn destruction_point(&self, messenger_rna: AgentId) -> Option<Vec2> {
        self.molecules
            .get(&messenger_rna)
            .and_then(|m| m.as_messenger_rna())
            .and_then(|rna| rna.destruction_point())
    }
}

impl CellEnvironment for Cell {
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

    fn propose_attachment(&mut self, requester: Requester<'_>) -> Option<SiteId> {
        match requester.binding {
            BindingKind::Polymerase | BindingKind::Factor(_) => {
                let proposal = {
                    let occupancy = MoleculeOccupancy {
                        molecules: &self.molecules,
                        sites: &self.sites,
                    };
                    search::consider_proposal(&self.dna, &self.sites, &occupancy, &requester, &self.config)
                }?;
                if let Some(incumbent) = proposal.steal_from {
                    debug!(agent = %requester.id, incumbent = %incumbent, "Taking over a gene site");
                    CellEnvironment::force_abort_pending_attachment(self, incumbent);
                }
                Some(self.dna.materialize(proposal.site, &mut self.sites, &self.config))
            }
            BindingKind::Ribosome | BindingKind::Destroyer => {
                search::nearest_messenger_rna_site(&self.molecules, &self.sites, &requester, &self.config)
            }
            BindingKind::Protein => None,
        }
    }

    fn adjacent_sites(&mut self, requester: Requester<'_>, site: SiteId) -> Vec<SiteId> {
        let refs = {
            let occupancy = MoleculeOccupancy {
                molecules: &self.molecules,
                sites: &self.sites,
            };
            search::adjacent_sites(&self.dna, &self.sites, &occupancy, &requester, site, &self.config)
        };
        refs.into_iter()
            .map(|r| self.dna.materialize(r, &mut self.sites, &self.config))
            .collect()
    }

    fn transcription_target(&self, site: SiteId) -> Option<TranscriptionTarget> {
        let gene = self.dna.gene_with_start_site(site)?;
        Some(TranscriptionTarget {
            gene: gene.index(),
            end_x: self.dna.base_pair_x(gene.end_index()),
            product: gene.product(),
        })
    }

    fn set_separation(&mut self, owner: AgentId, x: f64, amount: f64) {
        self.dna.set_separation(owner, x, amount);
    }

    fn remove_separation(&mut self, owner: AgentId) {
        self.dna.remove_separation(owner);
    }

    fn dna_attached_between(&self, from_x: f64, to_x: f64, exclude: AgentId) -> Vec<AgentId> {
        self.molecules
            .values()
            .filter(|m| m.id() != exclude && m.attached_to_dna())
            .filter(|m| {
                let x = m.attachment_point().x;
                x > from_x && x <= to_x
            })
            .map(|m| m.id())
            .collect()
    }

    fn next_agent_id(&mut self) -> AgentId {
        self.allocate_id()
    }

    fn spawn(&mut self, molecule: Biomolecule) -> AgentId {
        self.insert(molecule)
    }

    fn remove(&mut self, id: AgentId) {
        if !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
    }

    fn force_detach(&mut self, id: AgentId) {
        self.with_checked_out(id, |m, cell| m.force_detach(cell));
    }

    fn force_abort_pending_attachment(&mut self, id: AgentId) {
        self.with_checked_out(id, |m, cell| m.force_abort_pending_attachment(cell));
    }

    fn recycle_mode(&self) -> bool {
        self.recycle_mode
    }

    fn recycle_zones(&self) -> Vec<Rect> {
        self.scenario.recycle_zones.clone()
    }

    fn record_product(&mut self, product: ProductKind) {
        *self.stats.products.entry(product).or_insert(0) += 1;
    }

    fn emit(&mut self, event: CellEvent) {
        match &event {
            CellEvent::TranscriptionStarted { .. } => self.stats.transcriptions_started += 1,
            CellEvent::MessengerRnaReleased { .. } => self.stats.messenger_rnas_released += 1,
            CellEvent::TranslationStarted { .. } => self.stats.translations_started += 1,
            CellEvent::ProteinReleased { .. } => self.stats.proteins_released += 1,
            CellEvent::MessengerRnaDestroyed { .. } => self.stats.messenger_rnas_destroyed += 1,
            CellEvent::FragmentReleased { .. } => self.stats.fragments_released += 1,
            _ => {}
        }
        if self.event_history.len() == EVENT_HISTORY_CAPACITY {
            self.event_history.pop_front();
        }
        self.event_history.push_back((self.stats.time, event));
    }
}
