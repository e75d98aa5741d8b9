//! Centralized configuration and builder for TxrmIO sessions.
//!
//! Goals:
//! - Single explicit object passed into every session instead of process-wide flags.
//! - TxrmConfig::from_env() reads the TXRM_* environment variables.
//! - SessionBuilder returns a TxrmConfig, which TxrmFile consumes.
//!
//! Options:
//! - angle_unit (ENV TXRM_ANGLE_UNIT = degree|radian): working unit of `angles`.
//!   Storage is always degrees; conversion happens on load and in the save payload.
//! - const_deviation_threshold (ENV TXRM_CONST_DEVIATION, default 0.1): sample std-dev
//!   (ddof=1) boundary between quasi-constant and varying per-image arrays.
//! - capture_snapshot (ENV TXRM_SNAPSHOT, default false): keep a rollback point for reset().
//! - overwrite (ENV TXRM_OVERWRITE, default false): write sessions edit the source file
//!   in place instead of a `_edit` clone.
//! - eager_images (ENV TXRM_EAGER_IMAGES, default true): decode the full stack at open.
//!   Off: only metadata is loaded, pages are read through LazyStack and left untouched on save.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::consts::DEFAULT_CONST_DEVIATION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    #[default]
    Degree,
    Radian,
}

impl AngleUnit {
    /// Storage (degrees) -> working unit.
    #[inline]
    pub fn from_degrees(self, v: f32) -> f32 {
        match self {
            AngleUnit::Degree => v,
            AngleUnit::Radian => v.to_radians(),
        }
    }

    /// Working unit -> storage (degrees).
    #[inline]
    pub fn to_degrees(self, v: f32) -> f32 {
        match self {
            AngleUnit::Degree => v,
            AngleUnit::Radian => v.to_degrees(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AngleUnit::Degree => "degree",
            AngleUnit::Radian => "radian",
        }
    }
}

impl FromStr for AngleUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degree" | "degrees" | "deg" => Ok(AngleUnit::Degree),
            "radian" | "radians" | "rad" => Ok(AngleUnit::Radian),
            other => Err(anyhow!("unknown angle unit '{}' (use degree|radian)", other)),
        }
    }
}

/// Top-level configuration of a TXRM session.
#[derive(Clone, Debug)]
pub struct TxrmConfig {
    /// Env: TXRM_ANGLE_UNIT (default degree)
    pub angle_unit: AngleUnit,

    /// Env: TXRM_CONST_DEVIATION (default 0.1)
    pub const_deviation_threshold: f64,

    /// Env: TXRM_SNAPSHOT = 0|1 (default 0)
    pub capture_snapshot: bool,

    /// Env: TXRM_OVERWRITE = 0|1 (default 0)
    pub overwrite: bool,

    /// Env: TXRM_EAGER_IMAGES = 0|1 (default 1)
    pub eager_images: bool,
}

impl Default for TxrmConfig {
    fn default() -> Self {
        Self {
            angle_unit: AngleUnit::Degree,
            const_deviation_threshold: DEFAULT_CONST_DEVIATION,
            capture_snapshot: false,
            overwrite: false,
            eager_images: true,
        }
    }
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "yes" || s == "on"
    })
}

impl TxrmConfig {
    /// Load configuration from environment variables; unparsable values keep defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("TXRM_ANGLE_UNIT") {
            if let Ok(u) = v.parse::<AngleUnit>() {
                cfg.angle_unit = u;
            }
        }

        if let Ok(v) = std::env::var("TXRM_CONST_DEVIATION") {
            if let Ok(x) = v.trim().parse::<f64>() {
                if x.is_finite() && x >= 0.0 {
                    cfg.const_deviation_threshold = x;
                }
            }
        }

        if let Some(on) = env_bool("TXRM_SNAPSHOT") {
            cfg.capture_snapshot = on;
        }
        if let Some(on) = env_bool("TXRM_OVERWRITE") {
            cfg.overwrite = on;
        }
        if let Some(on) = env_bool("TXRM_EAGER_IMAGES") {
            cfg.eager_images = on;
        }

        cfg
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_angle_unit(mut self, unit: AngleUnit) -> Self {
        self.angle_unit = unit;
        self
    }

    pub fn with_const_deviation_threshold(mut self, thr: f64) -> Self {
        self.const_deviation_threshold = thr;
        self
    }

    pub fn with_capture_snapshot(mut self, on: bool) -> Self {
        self.capture_snapshot = on;
        self
    }

    pub fn with_overwrite(mut self, on: bool) -> Self {
        self.overwrite = on;
        self
    }

    pub fn with_eager_images(mut self, on: bool) -> Self {
        self.eager_images = on;
        self
    }

    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for TxrmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TxrmConfig {{ \
             angle_unit: {}, \
             const_deviation_threshold: {}, \
             capture_snapshot: {}, \
             overwrite: {}, \
             eager_images: {} \
             }}",
            self.angle_unit.as_str(),
            self.const_deviation_threshold,
            self.capture_snapshot,
            self.overwrite,
            self.eager_images,
        )
    }
}

/// Lightweight builder that produces a TxrmConfig.
/// TxrmFile exposes `TxrmFile::builder()` returning this builder.
#[derive(Clone, Debug)]
pub struct SessionBuilder {
    cfg: TxrmConfig,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: TxrmConfig::from_env(),
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: TxrmConfig::default(),
        }
    }

    pub fn angle_unit(mut self, unit: AngleUnit) -> Self {
        self.cfg.angle_unit = unit;
        self
    }

    pub fn const_deviation_threshold(mut self, thr: f64) -> Self {
        self.cfg.const_deviation_threshold = thr;
        self
    }

    pub fn capture_snapshot(mut self, on: bool) -> Self {
        self.cfg.capture_snapshot = on;
        self
    }

    pub fn overwrite(mut self, on: bool) -> Self {
        self.cfg.overwrite = on;
        self
    }

    pub fn eager_images(mut self, on: bool) -> Self {
        self.cfg.eager_images = on;
        self
    }

    pub fn build(self) -> TxrmConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_unit_parse_and_convert() {
        assert_eq!("rad".parse::<AngleUnit>().unwrap(), AngleUnit::Radian);
        assert_eq!(" Degree ".parse::<AngleUnit>().unwrap(), AngleUnit::Degree);
        assert!("grad".parse::<AngleUnit>().is_err());

        let u = AngleUnit::Radian;
        let r = u.from_degrees(180.0);
        assert!((r - std::f32::consts::PI).abs() < 1e-6);
        assert!((u.to_degrees(r) - 180.0).abs() < 1e-4);
        assert_eq!(AngleUnit::Degree.from_degrees(42.5), 42.5);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = SessionBuilder::from_default()
            .angle_unit(AngleUnit::Radian)
            .const_deviation_threshold(0.25)
            .capture_snapshot(true)
            .build();
        assert_eq!(cfg.angle_unit, AngleUnit::Radian);
        assert_eq!(cfg.const_deviation_threshold, 0.25);
        assert!(cfg.capture_snapshot);
        assert!(!cfg.overwrite);
        assert!(cfg.to_string().contains("angle_unit: radian"));
    }
}
