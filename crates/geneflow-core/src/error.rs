//! Error types for Geneflow operations.
//!
//! Only the fallible public surface (configuration, scenario layout, agent
//! lookups) reports errors. Broken reservation or geometry invariants are
//! contract failures and are asserted in debug builds instead.

use crate::types::AgentId;
use thiserror::Error;

/// Result type for Geneflow operations.
pub type Result<T> = std::result::Result<T, GeneflowError>;

/// Errors that can occur during Geneflow operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneflowError {
    /// Configuration errors.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// Strand or gene layout errors.
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
    /// Agent-related errors.
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
    /// Serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GeneflowError {
    fn from(e: serde_json::Error) -> Self {
        GeneflowError::Serialization(e.to_string())
    }
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid value.
    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    /// Out of range.
    #[error("{field} out of range: {value} (must be {min}-{max})")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Strand and gene layout errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A region is empty or reversed.
    #[error("Region {name} is empty: [{start}, {end})")]
    EmptyRegion { name: String, start: usize, end: usize },
    /// A region does not fit on the strand.
    #[error("Region {name} ends at {end}, beyond strand length {strand_length}")]
    OutOfStrand {
        name: String,
        end: usize,
        strand_length: usize,
    },
    /// Regulatory and transcribed regions must touch.
    #[error("Regulatory region ends at {regulatory_end} but transcribed region starts at {transcribed_start}")]
    NotAdjacent {
        regulatory_end: usize,
        transcribed_start: usize,
    },
    /// Two genes share base pairs.
    #[error("Gene {first} overlaps gene {second}")]
    OverlappingGenes { first: usize, second: usize },
    /// A factor site offset falls outside the regulatory region.
    #[error("Factor site offset {offset} outside regulatory region of length {length}")]
    SiteOutsideRegion { offset: usize, length: usize },
}

/// Agent-related errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    /// Agent not found.
    #[error("Agent not found: {0}")]
    NotFound(AgentId),
    /// Agent kind cannot be held by the user.
    #[error("Agent cannot be grabbed: {0}")]
    NotGrabbable(AgentId),
    /// Agent is not currently held by the user.
    #[error("Agent is not user controlled: {0}")]
    NotHeld(AgentId),
}

// Convenience constructors
impl GeneflowError {
    pub fn agent_not_found(id: AgentId) -> Self {
        GeneflowError::Agent(AgentError::NotFound(id))
    }

    pub fn out_of_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        GeneflowError::Config(ConfigError::OutOfRange {
            field: field.into(),
            min,
            max,
            value,
        })
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        GeneflowError::Config(ConfigError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let err = GeneflowError::out_of_range("capture_radius", -1.0, 0.0, 10000.0);
        let text = err.to_string();
        assert!(text.starts_with("Config error"));
        assert!(text.contains("capture_radius"));
    }

    #[test]
    fn layout_error_converts() {
        let err: GeneflowError = LayoutError::OverlappingGenes { first: 0, second: 1 }.into();
        assert!(matches!(err, GeneflowError::Layout(_)));
    }
}
