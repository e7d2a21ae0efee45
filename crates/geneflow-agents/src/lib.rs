//! # Geneflow Agents
//!
//! The biomolecules that live in a Geneflow cell and the attachment state
//! machine they share.
//!
//! Each kind specializes the machine for its role:
//!
//! - **RnaPolymerase** — walks the strand, opens it and writes an mRNA
//! - **TranscriptionFactor** — binds regulatory sites and gates transcription
//! - **Ribosome** — pulls a free mRNA through its channel and grows a protein
//! - **MessengerRnaDestroyer** — consumes an mRNA, shedding fragments
//! - **MessengerRna** / **MessengerRnaFragment** — winding polymers with their own lifecycles
//! - **Protein** — the product, grown on a ribosome then set loose
//!
//! Agents never see the cell directly: everything they need goes through
//! [`environment::CellEnvironment`].

pub mod environment;
pub mod molecule;
pub mod machine;
pub mod polymerase;
pub mod factor;
pub mod ribosome;
pub mod destroyer;
pub mod messenger_rna;
pub mod fragment;
pub mod protein;
pub mod prelude;
