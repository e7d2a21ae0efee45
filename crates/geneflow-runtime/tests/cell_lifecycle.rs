//! Cell lifecycle tests — transcription, translation and destruction
//! running end to end inside a full cell.

use geneflow_runtime::prelude::*;
use std::collections::BTreeMap;

const DT: f64 = 0.05;

/// A gene with no factor sites is favoured as soon as the gate is computed.
fn unregulated_gene() -> GeneLayout {
    GeneLayout {
        factor_sites: Vec::new(),
        ..GeneLayout::default()
    }
}

/// Polymerases on a favoured start site commit within a few ticks.
fn eager_config() -> SimConfig {
    SimConfig {
        polymerase_half_life: 0.05,
        ..SimConfig::default()
    }
}

fn quiet_cell() -> Cell {
    CellBuilder::new()
        .with_config(eager_config())
        .no_populations()
        .gene(unregulated_gene())
        .build()
        .unwrap()
}

fn start_site_position(cell: &Cell) -> Vec2 {
    let gene = &cell.dna().genes()[0];
    cell.sites().get(gene.start_site()).unwrap().position
}

#[test]
fn transcription_produces_one_messenger_rna() {
    let mut cell = quiet_cell();
    cell.step(DT);
    assert!(cell.dna().genes()[0].is_transcription_favored());

    let start = start_site_position(&cell);
    let polymerase = cell.spawn_polymerase(start - RnaPolymerase::ATTACHMENT_OFFSET);

    let mut messenger_rna = None;
    let mut last_length = 0.0;
    let mut saw_separation = false;
    let mut released_at_x = None;
    for _ in 0..(30.0 / DT) as usize {
        cell.step(DT);
        saw_separation |= cell.dna().separations().count() > 0;
        if released_at_x.is_none()
            && cell
                .events()
                .iter()
                .any(|(_, e)| matches!(e, CellEvent::MessengerRnaReleased { polymerase: p, .. } if *p == polymerase))
        {
            let attachment_x = cell.molecule(polymerase).unwrap().position().x + RnaPolymerase::ATTACHMENT_OFFSET.x;
            released_at_x = Some(attachment_x);
        }
        if messenger_rna.is_none() {
            messenger_rna = cell.events().iter().find_map(|(_, e)| match e {
                CellEvent::TranscriptionStarted { messenger_rna, .. } => Some(*messenger_rna),
                _ => None,
            });
        }
        if let Some(rna) = messenger_rna.and_then(|id| cell.molecule(id)).and_then(|m| m.as_messenger_rna()) {
            assert!(rna.length() + 1e-9 >= last_length, "mRNA shrank during synthesis");
            last_length = rna.length();
        }
    }

    let started: Vec<_> = cell
        .events()
        .iter()
        .filter(|(_, e)| matches!(e, CellEvent::TranscriptionStarted { polymerase: p, .. } if *p == polymerase))
        .collect();
    assert_eq!(started.len(), 1);

    let released: Vec<f64> = cell
        .events()
        .iter()
        .filter_map(|(_, e)| match e {
            CellEvent::MessengerRnaReleased { length, .. } => Some(*length),
            _ => None,
        })
        .collect();
    assert_eq!(released.len(), 1);

    let gene = &cell.dna().genes()[0];
    let span = cell.dna().base_pair_x(gene.end_index()) - cell.dna().base_pair_x(gene.start_index());
    assert!(released[0] >= span * 0.95, "released {} for a span of {}", released[0], span);
    let end_x = cell.dna().base_pair_x(gene.end_index());
    let released_at_x = released_at_x.unwrap();
    assert!((released_at_x - end_x).abs() < 1e-6, "released at {} instead of {}", released_at_x, end_x);

    let rna = cell.molecule(messenger_rna.unwrap()).unwrap().as_messenger_rna().unwrap();
    assert!(!rna.is_being_synthesized());
    assert!(saw_separation);
    assert_eq!(cell.dna().separations().count(), 0);
}

#[test]
fn factor_only_counts_once_truly_attached() {
    let config = SimConfig {
        factor_half_life: 10_000.0,
        ..SimConfig::default()
    };
    let mut cell = CellBuilder::new().with_config(config).no_populations().build().unwrap();
    let gene = &cell.dna().genes()[0];
    let site = gene.site_at(BindingKind::Factor(FactorKind::positive(0)), 60).unwrap();
    let site_position = cell.sites().get(site).unwrap().position;

    let factor = cell.spawn_transcription_factor(FactorKind::positive(0), site_position + Vec2::new(0.0, 250.0));
    cell.step(DT);
    assert_eq!(cell.sites().get(site).unwrap().occupant, Some(factor));
    assert!(!cell.dna().genes()[0].is_transcription_favored());

    cell.step(2.0);
    assert_eq!(
        cell.molecule(factor).unwrap().attachment_state(),
        Some(AttachmentState::Attached)
    );
    assert!(cell.dna().genes()[0].is_transcription_favored());
    let start = cell.dna().genes()[0].start_site();
    assert!(cell.sites().get(start).unwrap().affinity > 0.5);
}

#[test]
fn refractory_period_separates_detach_and_next_approach() {
    let mut cell = quiet_cell();
    let x = cell.dna().base_pair_x(300);
    let polymerase = cell.spawn_polymerase(Vec2::new(x, 0.0) - RnaPolymerase::ATTACHMENT_OFFSET);
    cell.step(30.0);

    let mut detached_at = None;
    let mut detaches = 0;
    let refractory = cell.config().refractory_time;
    for (t, event) in cell.events() {
        match event {
            CellEvent::Detached { id } if *id == polymerase => {
                detached_at = Some(*t);
                detaches += 1;
            }
            CellEvent::Approaching { id, .. } if *id == polymerase => {
                if let Some(d) = detached_at.take() {
                    assert!(t - d >= refractory - 2.0 * DT, "re-approached {} s after detaching", t - d);
                }
            }
            _ => {}
        }
    }
    assert!(detaches > 0, "a polymerase on low-affinity sites should let go");
}

#[test]
fn sites_are_never_shared() {
    let mut cell = CellBuilder::new().seed(11).build().unwrap();
    for _ in 0..(20.0 / DT) as usize {
        cell.step(DT);
        let mut holders: BTreeMap<SiteId, AgentId> = BTreeMap::new();
        for m in cell.molecules() {
            let Some(site) = m.attachment_site() else {
                continue;
            };
            if let Some(other) = holders.insert(site, m.id()) {
                panic!("{} and {} both claim site {:?}", other, m.id(), site);
            }
            assert_eq!(cell.sites().get(site).and_then(|s| s.occupant), Some(m.id()));
        }
    }
}

#[test]
fn ribosome_translates_into_counted_protein() {
    let mut cell = quiet_cell();
    let rna = cell.spawn_messenger_rna(ProductKind(0), Vec2::new(3000.0, 800.0), 1000.0);
    cell.spawn_ribosome(Vec2::new(3000.0, 1100.0));
    cell.step(20.0);

    assert!(cell.product_count(ProductKind(0)) >= 1);
    assert!(cell
        .events()
        .iter()
        .any(|(_, e)| matches!(e, CellEvent::TranslationStarted { messenger_rna, .. } if *messenger_rna == rna)));
    assert!(cell.molecule(rna).is_some(), "translation leaves the mRNA intact");
}

#[test]
fn destroyer_consumes_messenger_rna_and_fragments_fade() {
    let mut cell = quiet_cell();
    let rna = cell.spawn_messenger_rna(ProductKind(0), Vec2::new(3000.0, 800.0), 600.0);
    cell.spawn_destroyer(Vec2::new(3000.0, 1000.0));
    cell.step(30.0);

    assert!(cell.molecule(rna).is_none());
    assert!(cell
        .events()
        .iter()
        .any(|(_, e)| matches!(e, CellEvent::MessengerRnaDestroyed { messenger_rna, .. } if *messenger_rna == rna)));
    assert!(cell.stats().fragments_released >= 1);
    assert!(cell.ids_of_kind("messenger_rna_fragment").is_empty());
}

#[test]
fn removing_a_transcribing_polymerase_closes_the_strand() {
    let mut cell = quiet_cell();
    cell.step(DT);
    let start = start_site_position(&cell);
    let polymerase = cell.spawn_polymerase(start - RnaPolymerase::ATTACHMENT_OFFSET);
    cell.step(4.0);
    assert!(cell.dna().separations().count() > 0);

    cell.remove(polymerase).unwrap();
    assert_eq!(cell.dna().separations().count(), 0);
    assert!(cell.molecule(polymerase).is_none());
}

#[test]
fn nearer_polymerase_takes_over_an_approached_start_site() {
    // Short ticks keep the free wander to well under a base pair.
    const TICK: f64 = 0.001;
    let config = SimConfig {
        capture_radius: 15.0,
        approach_speed: 1.0,
        ..SimConfig::default()
    };
    let mut cell = CellBuilder::new()
        .with_config(config)
        .no_populations()
        .gene(unregulated_gene())
        .build()
        .unwrap();
    let start = start_site_position(&cell);
    let start_site = cell.dna().genes()[0].start_site();

    let far = cell.spawn_polymerase(start + Vec2::new(0.0, 14.0) - RnaPolymerase::ATTACHMENT_OFFSET);
    cell.step(TICK);
    assert_eq!(cell.sites().get(start_site).unwrap().occupant, Some(far));
    assert_eq!(
        cell.molecule(far).unwrap().attachment_state(),
        Some(AttachmentState::MovingTowardsAttachment)
    );

    let near = cell.spawn_polymerase(start - RnaPolymerase::ATTACHMENT_OFFSET);
    cell.step(TICK);
    assert_eq!(cell.sites().get(start_site).unwrap().occupant, Some(near));
    let displaced = cell.molecule(far).unwrap();
    assert_eq!(displaced.attachment_state(), Some(AttachmentState::UnattachedAndAvailable));
    assert!(displaced.attachment_site().is_none());

    cell.step(TICK);
    assert!(cell.molecule(near).unwrap().attached_to_dna());
    assert!(cell.molecule(far).unwrap().attachment_site().is_none());
}

#[test]
fn recycled_polymerase_reappears_in_a_return_zone() {
    let mut cell = CellBuilder::new()
        .with_config(eager_config())
        .no_populations()
        .gene(unregulated_gene())
        .recycle_mode(true)
        .build()
        .unwrap();
    cell.step(DT);
    let zones = cell.scenario().recycle_zones.clone();
    let start = start_site_position(&cell);
    let polymerase = cell.spawn_polymerase(start - RnaPolymerase::ATTACHMENT_OFFSET);

    let mut released = false;
    for _ in 0..(40.0 / DT) as usize {
        cell.step(DT);
        released |= cell
            .events()
            .iter()
            .any(|(_, e)| matches!(e, CellEvent::MessengerRnaReleased { polymerase: p, .. } if *p == polymerase));
        let m = cell.molecule(polymerase).unwrap();
        if released && m.attachment_state() == Some(AttachmentState::UnattachedAndAvailable) {
            let position = m.position();
            assert!(
                zones.iter().any(|z| z.contains_point(position)),
                "recycled polymerase surfaced at {:?}",
                position
            );
            return;
        }
    }
    panic!("recycled polymerase never became available again");
}
