//! Simulation parameters.
//!
//! Every tunable constant of the engine lives here so scenarios can be
//! loaded from TOML. Missing fields fall back to the defaults below.

use crate::error::{GeneflowError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for cell simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World seed; every agent derives its own stream from it (default: 42).
    pub seed: u64,
    /// Largest increment a single tick may advance, in seconds (default: 0.05).
    pub max_time_step: f64,
    /// Simulated seconds between reshuffles of the step order (default: 1.0).
    pub reshuffle_interval: f64,

    /// Radius scanned around a requester for strand sites (default: 400).
    pub capture_radius: f64,
    /// Radius scanned around a translator or degrader for mRNA (default: 1500).
    pub messenger_rna_capture_radius: f64,
    /// Steal reserved gene sites from farther approaching agents (default: true).
    pub pursue_attachments: bool,
    /// Cooldown after detaching before new proposals are made (default: 3.0).
    pub refractory_time: f64,
    /// Attach time of the plain generic attached state (default: 3.0).
    pub default_attach_time: f64,
    /// Speed used when heading for a reserved site (default: 750).
    pub approach_speed: f64,

    /// Affinity of polymerase sites outside gene start positions (default: 0.05).
    pub default_polymerase_affinity: f64,
    /// Affinity of factor sites without a dedicated gene site (default: 0.05).
    pub default_factor_affinity: f64,
    /// Start-site affinity above which a polymerase commits to transcription (default: 0.5).
    pub transcription_affinity_threshold: f64,
    /// Polymerase half-life at affinity 0.5, in seconds (default: 1.5).
    pub polymerase_half_life: f64,
    /// Factor half-life at affinity 0.5, in seconds (default: 3.0).
    pub factor_half_life: f64,
    /// Chance a detaching polymerase hops to a neighbour instead (default: 0.8).
    pub polymerase_hop_probability: f64,
    /// First-hop chance for a detaching factor; halves after every hop (default: 0.8).
    pub factor_hop_probability: f64,

    /// Time to conform or deconform around the strand, in seconds (default: 1.0).
    pub conformation_time: f64,
    /// Distance per second a transcribing polymerase covers (default: 1000).
    pub transcription_speed: f64,
    /// mRNA length per second pulled through a ribosome (default: 400).
    pub translation_rate: f64,
    /// Length of the ribosome's translation channel (default: 120).
    pub translation_channel_length: f64,
    /// mRNA length per second consumed by a degrader (default: 300).
    pub destruction_rate: f64,
    /// Length of the degrader's destruction channel (default: 60).
    pub destruction_channel_length: f64,
    /// Shortest fragment a degrader emits (default: 100).
    pub fragment_length_min: f64,
    /// Longest fragment a degrader emits (default: 400).
    pub fragment_length_max: f64,

    /// Spacing of shape-defining points on polymers (default: 75).
    pub inter_point_distance: f64,
    /// Capacity of the flat leader segment of a new mRNA (default: 50).
    pub leader_length: f64,

    /// Upward drift after release from the polymerase, in seconds (default: 3.0).
    pub detach_drift_time: f64,
    /// Fade mRNA once it is fully formed (default: false).
    pub fade_when_formed: bool,
    /// Delay before a formed mRNA starts fading, in seconds (default: 5.0).
    pub fade_delay: f64,
    /// Duration of the mRNA opacity ramp, in seconds (default: 2.0).
    pub fade_duration: f64,
    /// Duration of the fragment fade, in seconds (default: 3.0).
    pub fragment_fade_duration: f64,
    /// Drift before a recycled polymerase starts to fade out, in seconds (default: 1.5).
    pub recycle_drift_time: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_time_step: 0.05,
            reshuffle_interval: 1.0,
            capture_radius: 400.0,
            messenger_rna_capture_radius: 1500.0,
            pursue_attachments: true,
            refractory_time: 3.0,
            default_attach_time: 3.0,
            approach_speed: 750.0,
            default_polymerase_affinity: 0.05,
            default_factor_affinity: 0.05,
            transcription_affinity_threshold: 0.5,
            polymerase_half_life: 1.5,
            factor_half_life: 3.0,
            polymerase_hop_probability: 0.8,
            factor_hop_probability: 0.8,
            conformation_time: 1.0,
            transcription_speed: 1000.0,
            translation_rate: 400.0,
            translation_channel_length: 120.0,
            destruction_rate: 300.0,
            destruction_channel_length: 60.0,
            fragment_length_min: 100.0,
            fragment_length_max: 400.0,
            inter_point_distance: 75.0,
            leader_length: 50.0,
            detach_drift_time: 3.0,
            fade_when_formed: false,
            fade_delay: 5.0,
            fade_duration: 2.0,
            fragment_fade_duration: 3.0,
            recycle_drift_time: 1.5,
        }
    }
}

impl SimConfig {
    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<()> {
        positive("max_time_step", self.max_time_step, 1.0)?;
        positive("reshuffle_interval", self.reshuffle_interval, 3600.0)?;
        positive("capture_radius", self.capture_radius, 1e6)?;
        positive("messenger_rna_capture_radius", self.messenger_rna_capture_radius, 1e6)?;
        non_negative("refractory_time", self.refractory_time, 3600.0)?;
        non_negative("default_attach_time", self.default_attach_time, 3600.0)?;
        positive("approach_speed", self.approach_speed, 1e6)?;

        unit("default_polymerase_affinity", self.default_polymerase_affinity)?;
        unit("default_factor_affinity", self.default_factor_affinity)?;
        unit("transcription_affinity_threshold", self.transcription_affinity_threshold)?;
        positive("polymerase_half_life", self.polymerase_half_life, 3600.0)?;
        positive("factor_half_life", self.factor_half_life, 3600.0)?;
        unit("polymerase_hop_probability", self.polymerase_hop_probability)?;
        unit("factor_hop_probability", self.factor_hop_probability)?;

        positive("conformation_time", self.conformation_time, 60.0)?;
        positive("transcription_speed", self.transcription_speed, 1e6)?;
        positive("translation_rate", self.translation_rate, 1e6)?;
        positive("translation_channel_length", self.translation_channel_length, 1e4)?;
        positive("destruction_rate", self.destruction_rate, 1e6)?;
        positive("destruction_channel_length", self.destruction_channel_length, 1e4)?;
        positive("fragment_length_min", self.fragment_length_min, 1e5)?;
        if self.fragment_length_max < self.fragment_length_min {
            return Err(GeneflowError::invalid_value(
                "fragment_length_max",
                self.fragment_length_max.to_string(),
                "must not be below fragment_length_min",
            ));
        }

        positive("inter_point_distance", self.inter_point_distance, 1e4)?;
        positive("leader_length", self.leader_length, 1e4)?;
        non_negative("detach_drift_time", self.detach_drift_time, 3600.0)?;
        non_negative("fade_delay", self.fade_delay, 3600.0)?;
        positive("fade_duration", self.fade_duration, 3600.0)?;
        positive("fragment_fade_duration", self.fragment_fade_duration, 3600.0)?;
        non_negative("recycle_drift_time", self.recycle_drift_time, 3600.0)?;
        Ok(())
    }
}

fn unit(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GeneflowError::out_of_range(field, value, 0.0, 1.0))
    }
}

fn positive(field: &str, value: f64, max: f64) -> Result<()> {
    if value > 0.0 && value <= max {
        Ok(())
    } else {
        Err(GeneflowError::out_of_range(field, value, f64::MIN_POSITIVE, max))
    }
}

fn non_negative(field: &str, value: f64, max: f64) -> Result<()> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(GeneflowError::out_of_range(field, value, 0.0, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn affinity_above_one_is_rejected() {
        let config = SimConfig {
            default_factor_affinity: 1.5,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn reversed_fragment_range_is_rejected() {
        let config = SimConfig {
            fragment_length_min: 300.0,
            fragment_length_max: 200.0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "seed": 7 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.capture_radius, 400.0);
    }
}
