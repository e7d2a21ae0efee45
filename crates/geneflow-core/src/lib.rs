//! # Geneflow Core
//!
//! Core types and algorithms for the Geneflow gene-expression engine.
//!
//! This crate holds everything a biomolecule needs that is not specific to
//! one kind of biomolecule:
//!
//! - **Sites** — reservable docking points with an affinity and one occupant
//! - **Bounds** — the allowed region test used by every mobile agent
//! - **Motion** — interchangeable strategies computing an agent's next pose
//! - **Polymer** — the segment/winding geometry of growing RNA strands
//! - **Config** — every tunable constant of the simulation
//!
//! ## Quick Start
//!
//! ```rust
//! use geneflow_core::prelude::*;
//!
//! let mut sites = SiteRegistry::new();
//! let site = sites.insert(Vec2::new(0.0, 0.0), 0.8, SiteOwner::Dna);
//!
//! // Deterministic agent ID (for testing)
//! let agent = AgentId::from_seed(42);
//! assert!(sites.reserve(site, agent));
//! assert!(!sites.reserve(site, AgentId::from_seed(7)));
//! ```

pub mod types;
pub mod error;
pub mod config;
pub mod site;
pub mod bounds;
pub mod motion;
pub mod polymer;
pub mod prelude;
