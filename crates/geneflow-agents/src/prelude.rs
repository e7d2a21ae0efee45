//! Geneflow Agents Prelude — convenient imports for common usage.
//!
//! ```rust
//! use geneflow_agents::prelude::*;
//! ```

// Re-export agent types
pub use crate::destroyer::MessengerRnaDestroyer;
pub use crate::environment::{BindingKind, CellEnvironment, CellEvent, Requester, TranscriptionTarget};
pub use crate::factor::TranscriptionFactor;
pub use crate::fragment::{FragmentState, MessengerRnaFragment};
pub use crate::machine::{AttachmentState, AttachmentStateMachine};
pub use crate::messenger_rna::{MessengerRna, MessengerRnaState};
pub use crate::molecule::{Biomolecule, Body, MoleculeKind};
pub use crate::polymerase::RnaPolymerase;
pub use crate::protein::Protein;
pub use crate::ribosome::Ribosome;

// Re-export from core
pub use geneflow_core::prelude::*;
