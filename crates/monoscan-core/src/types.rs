// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Monoscan enhancement pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MonoscanError;

/// Multiplicative enhancement factor (contrast, brightness, sharpness).
///
/// `1.0` is the identity. Factors that are not strictly positive are also
/// treated as a no-op, so a stage only runs when [`Factor::is_active`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Factor(pub f32);

impl Factor {
    /// The no-op factor.
    pub const IDENTITY: Factor = Factor(1.0);

    pub fn value(self) -> f32 {
        self.0
    }

    /// Whether applying this factor changes the image.
    pub fn is_active(self) -> bool {
        self.0.is_finite() && self.0 > 0.0 && self.0 != 1.0
    }
}

impl Default for Factor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<f32> for Factor {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

/// How the threshold stage treats each greyscale pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdSetting", into = "ThresholdSetting")]
pub enum ThresholdMode {
    /// Level 0: pixels are left alone.
    Off,
    /// Level `t > 0`: `p < t` becomes black, everything else white.
    Binarize(u8),
    /// Level `-t`: `p < t` keeps its value, everything else becomes white.
    WhitenAbove(u8),
    /// Binarize at the level picked by Otsu's method for each image.
    Otsu,
}

impl ThresholdMode {
    /// Build a mode from the signed command-line level.
    ///
    /// `0` is off, positive levels binarize, negative levels whiten only.
    pub fn from_level(level: i32) -> Result<Self, MonoscanError> {
        let magnitude = u8::try_from(level.unsigned_abs()).map_err(|_| {
            MonoscanError::InvalidConfig(format!(
                "threshold {level} out of range (expected -255..=255)"
            ))
        })?;
        Ok(match level {
            0 => Self::Off,
            l if l > 0 => Self::Binarize(magnitude),
            _ => Self::WhitenAbove(magnitude),
        })
    }

    /// Signed level for this mode, or `None` for [`ThresholdMode::Otsu`].
    pub fn level(self) -> Option<i32> {
        match self {
            Self::Off => Some(0),
            Self::Binarize(t) => Some(i32::from(t)),
            Self::WhitenAbove(t) => Some(-i32::from(t)),
            Self::Otsu => None,
        }
    }

    pub fn is_active(self) -> bool {
        self != Self::Off
    }
}

impl Default for ThresholdMode {
    /// The historical default level, `0xc0`.
    fn default() -> Self {
        Self::Binarize(0xc0)
    }
}

impl FromStr for ThresholdMode {
    type Err = MonoscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") || trimmed.eq_ignore_ascii_case("otsu") {
            return Ok(Self::Otsu);
        }
        let level = trimmed.parse::<i32>().map_err(|_| {
            MonoscanError::InvalidConfig(format!(
                "threshold must be an integer or \"auto\", got {s:?}"
            ))
        })?;
        Self::from_level(level)
    }
}

impl fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level() {
            Some(level) => write!(f, "{level}"),
            None => f.write_str("auto"),
        }
    }
}

/// Serialised form of [`ThresholdMode`]: a signed level or `"auto"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ThresholdSetting {
    Level(i32),
    Named(String),
}

impl TryFrom<ThresholdSetting> for ThresholdMode {
    type Error = MonoscanError;

    fn try_from(setting: ThresholdSetting) -> Result<Self, Self::Error> {
        match setting {
            ThresholdSetting::Level(level) => Self::from_level(level),
            ThresholdSetting::Named(name) => name.parse(),
        }
    }
}

impl From<ThresholdMode> for ThresholdSetting {
    fn from(mode: ThresholdMode) -> Self {
        match mode.level() {
            Some(level) => Self::Level(level),
            None => Self::Named("auto".into()),
        }
    }
}

/// One step of the enhancement pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Grayscale,
    Contrast(f32),
    Brightness(f32),
    Sharpness(f32),
    Threshold(ThresholdMode),
    CornerFill(u8),
}
