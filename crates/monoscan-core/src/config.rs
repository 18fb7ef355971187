// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline and assembly configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MonoscanError, Result};
use crate::types::{Factor, Stage, ThresholdMode};

/// Parameters of the per-page enhancement pipeline.
///
/// Every field has a documented no-op value; [`PipelineConfig::identity`]
/// turns every stage except the greyscale conversion off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Contrast factor (1.0 = no-op).
    pub contrast: Factor,
    /// Brightness factor (1.0 = no-op).
    pub brightness: Factor,
    /// Sharpness factor (1.0 = no-op, < 1.0 blurs).
    pub sharpness: Factor,
    /// Threshold stage (default: binarize at 0xc0).
    pub threshold: ThresholdMode,
    /// Flood-fill tolerance for the corner cleanup; `None` disables it.
    pub corner_tolerance: Option<u8>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            contrast: Factor::IDENTITY,
            brightness: Factor::IDENTITY,
            sharpness: Factor::IDENTITY,
            threshold: ThresholdMode::default(),
            corner_tolerance: None,
        }
    }
}

impl PipelineConfig {
    /// A configuration whose only effect is the greyscale conversion.
    pub fn identity() -> Self {
        Self {
            threshold: ThresholdMode::Off,
            ..Self::default()
        }
    }

    /// Load a preset from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject factors that cannot be applied meaningfully.
    pub fn validate(&self) -> Result<()> {
        for (name, factor) in [
            ("contrast", self.contrast),
            ("brightness", self.brightness),
            ("sharpness", self.sharpness),
        ] {
            if !factor.value().is_finite() {
                return Err(MonoscanError::InvalidConfig(format!(
                    "{name} factor must be a finite number, got {}",
                    factor.value()
                )));
            }
        }
        Ok(())
    }

    /// The ordered list of stages this configuration runs.
    ///
    /// Greyscale conversion is always first; the remaining stages appear only
    /// when their parameter differs from the no-op value.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![Stage::Grayscale];
        if self.contrast.is_active() {
            stages.push(Stage::Contrast(self.contrast.value()));
        }
        if self.brightness.is_active() {
            stages.push(Stage::Brightness(self.brightness.value()));
        }
        if self.sharpness.is_active() {
            stages.push(Stage::Sharpness(self.sharpness.value()));
        }
        if self.threshold.is_active() {
            stages.push(Stage::Threshold(self.threshold));
        }
        if let Some(tolerance) = self.corner_tolerance {
            stages.push(Stage::CornerFill(tolerance));
        }
        stages
    }
}

/// How assembled PDFs are laid out and written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    /// Pixels per inch used to size each page (72 = one pixel per point).
    pub dpi: f32,
    /// Number of queued images encoded into the document at a time.
    pub batch_size: usize,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            dpi: 72.0,
            batch_size: 20,
        }
    }
}

impl AssemblyOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(MonoscanError::InvalidConfig(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        if self.batch_size == 0 {
            return Err(MonoscanError::InvalidConfig(
                "batch size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_config_only_converts_to_grayscale() {
        assert_eq!(PipelineConfig::identity().stages(), vec![Stage::Grayscale]);
    }

    #[test]
    fn stages_follow_fixed_order() {
        let config = PipelineConfig {
            contrast: Factor(1.5),
            brightness: Factor(0.8),
            sharpness: Factor(2.0),
            threshold: ThresholdMode::WhitenAbove(200),
            corner_tolerance: Some(40),
        };
        assert_eq!(
            config.stages(),
            vec![
                Stage::Grayscale,
                Stage::Contrast(1.5),
                Stage::Brightness(0.8),
                Stage::Sharpness(2.0),
                Stage::Threshold(ThresholdMode::WhitenAbove(200)),
                Stage::CornerFill(40),
            ]
        );
    }

    #[test]
    fn default_binarizes_at_c0() {
        let stages = PipelineConfig::default().stages();
        assert_eq!(
            stages,
            vec![Stage::Grayscale, Stage::Threshold(ThresholdMode::Binarize(0xc0))]
        );
    }

    #[test]
    fn partial_preset_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"contrast": 1.3, "corner_tolerance": 25}"#).unwrap();
        assert_eq!(config.contrast, Factor(1.3));
        assert_eq!(config.brightness, Factor::IDENTITY);
        assert_eq!(config.threshold, ThresholdMode::Binarize(0xc0));
        assert_eq!(config.corner_tolerance, Some(25));
    }

    #[test]
    fn preset_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        let config = PipelineConfig {
            threshold: ThresholdMode::Otsu,
            ..PipelineConfig::default()
        };
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(PipelineConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn non_finite_factor_is_rejected() {
        let config = PipelineConfig {
            sharpness: Factor(f32::INFINITY),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MonoscanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn assembly_options_reject_zero_batch() {
        let options = AssemblyOptions {
            batch_size: 0,
            ..AssemblyOptions::default()
        };
        assert!(options.validate().is_err());
        assert!(AssemblyOptions::default().validate().is_ok());
    }
}
