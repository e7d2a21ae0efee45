//! Geneflow Core Prelude — convenient imports for common usage.
//!
//! ```rust
//! use geneflow_core::prelude::*;
//! ```

pub use crate::bounds::MotionBounds;
pub use crate::config::SimConfig;
pub use crate::error::{AgentError, ConfigError, GeneflowError, LayoutError, Result};
pub use crate::motion::{MotionContext, MotionStrategy, Pose};
pub use crate::polymer::{SegmentKind, ShapeSegment, WindingPolymer};
pub use crate::site::{AttachmentSite, SiteOwner, SiteRegistry, ATTACHED_DISTANCE_THRESHOLD};
pub use crate::types::*;
