//! # Generator Configuration
//!
//! Every spacing, snapping and branching constant of the road layout.
//! Loaded once at startup, usually from a TOML file:
//!
//! ```toml
//! tile_size = 80
//! region_tiles = 10
//! snap_radius = 40.0
//!
//! [streets.primary]
//! probability = 0.35
//! min_length = 120.0
//! max_length = 320.0
//! spacing = 96.0
//! ```
//!
//! Missing keys fall back to [`GeneratorConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::units::Units;

/// Branching parameters of one street tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Chance that a candidate point on the parent spawns a street.
    pub probability: f64,
    /// Shortest street drawn before border and overlap adjustments.
    pub min_length: f64,
    /// Longest street drawn.
    pub max_length: f64,
    /// Distance between candidate points along the parent.
    pub spacing: f64,
}

impl TierConfig {
    const fn new(probability: f64, min_length: f64, max_length: f64, spacing: f64) -> Self {
        Self {
            probability,
            min_length,
            max_length,
            spacing,
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ConfigError::invalid(field, format!("probability {} outside 0..=1", self.probability)));
        }
        if !(self.min_length > 0.0 && self.min_length <= self.max_length) {
            return Err(ConfigError::invalid(
                field,
                format!("length range {}..={} is empty", self.min_length, self.max_length),
            ));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ConfigError::invalid(field, format!("spacing must be positive, got {}", self.spacing)));
        }
        Ok(())
    }
}

/// Per-tier street parameters, from the widest to the narrowest.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetTiers {
    /// Streets branching off main roads.
    pub primary: TierConfig,
    /// Streets branching off primary streets.
    pub secondary: TierConfig,
    /// Streets branching off secondary streets.
    pub tertiary: TierConfig,
    /// Streets branching off tertiary streets. Never branch further.
    pub quaternary: TierConfig,
}

impl Default for StreetTiers {
    fn default() -> Self {
        Self {
            primary: TierConfig::new(0.35, 120.0, 320.0, 96.0),
            secondary: TierConfig::new(0.3, 80.0, 200.0, 64.0),
            tertiary: TierConfig::new(0.25, 48.0, 120.0, 48.0),
            quaternary: TierConfig::new(0.2, 32.0, 80.0, 40.0),
        }
    }
}

/// Road generator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Tile edge in nodes.
    pub tile_size: i32,
    /// Tiles per region edge.
    pub region_tiles: i32,
    /// Height of the road surface.
    pub ground_level: i32,
    /// Regions kept per store (canvases and pathpavers each).
    pub max_cached_regions: usize,
    /// Neighbor layers generated around a requested region.
    pub recursion_level: u32,
    /// Distance kept between border points and region corners.
    pub corner_margin: f64,
    /// Street connection points per region edge.
    pub connections_per_edge: u32,
    /// Distance within which a street end snaps to a connection point.
    pub snap_radius: f64,
    /// Distance a street that cannot snap keeps from the border.
    pub border_clearance: f64,
    /// Closest two parallel paths may run.
    pub min_spacing: f64,
    /// Angle in degrees under which two directions count as parallel.
    pub parallel_tolerance_deg: f64,
    /// Share of a street running alongside a parallel path that rejects it.
    pub parallel_reject_fraction: f64,
    /// Shortest street kept after snapping or cutting.
    pub min_street_length: f64,
    /// Chance that a street end merges into a nearby path.
    pub merge_probability: f64,
    /// Search radius for merging.
    pub merge_radius: f64,
    /// Distance under which a crossing reuses an existing vertex.
    pub vertex_snap: f64,
    /// Turn angle in degrees under which unused vertices are dropped.
    pub simplify_angle_deg: f64,
    /// Draw origin/midpoint markers at path vertices.
    pub draw_markers: bool,
    /// Street tiers.
    pub streets: StreetTiers,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tile_size: 80,
            region_tiles: 10,
            ground_level: 0,
            max_cached_regions: 64,
            recursion_level: 1,
            corner_margin: 80.0,
            connections_per_edge: 4,
            snap_radius: 40.0,
            border_clearance: 12.0,
            min_spacing: 24.0,
            parallel_tolerance_deg: 10.0,
            parallel_reject_fraction: 0.5,
            min_street_length: 32.0,
            merge_probability: 0.5,
            merge_radius: 48.0,
            vertex_snap: 1.0,
            simplify_angle_deg: 1.0,
            draw_markers: true,
            streets: StreetTiers::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or a value is invalid.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Serializes the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::invalid("config", e.to_string()))
    }

    /// Unit system described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error unless both sizes are positive.
    pub fn units(&self) -> Result<Units, ConfigError> {
        Units::new(self.tile_size, self.region_tiles)
    }

    /// Smallest store that holds every region one request can touch.
    #[must_use]
    pub const fn min_cached_regions(&self) -> usize {
        let side = 2 * self.recursion_level as usize + 3;
        side * side
    }

    /// Parallel tolerance in radians.
    #[must_use]
    pub fn parallel_tolerance(&self) -> f64 {
        self.parallel_tolerance_deg.to_radians()
    }

    /// Simplification angle in radians.
    #[must_use]
    pub fn simplify_angle(&self) -> f64 {
        self.simplify_angle_deg.to_radians()
    }

    /// Checks every invariant the generator relies on.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let units = self.units()?;
        let region_size = f64::from(units.region_size());

        if self.recursion_level > 3 {
            return Err(ConfigError::invalid(
                "recursion_level",
                format!("at most 3 neighbor layers, got {}", self.recursion_level),
            ));
        }
        if self.max_cached_regions < self.min_cached_regions() {
            return Err(ConfigError::invalid(
                "max_cached_regions",
                format!(
                    "{} cannot hold the {} regions touched at recursion level {}",
                    self.max_cached_regions,
                    self.min_cached_regions(),
                    self.recursion_level
                ),
            ));
        }
        if !(self.corner_margin >= 0.0 && self.corner_margin * 2.0 < region_size) {
            return Err(ConfigError::invalid(
                "corner_margin",
                format!("{} leaves no room on a {region_size} edge", self.corner_margin),
            ));
        }
        if self.connections_per_edge == 0 {
            return Err(ConfigError::invalid("connections_per_edge", "must be at least 1"));
        }
        for (field, value) in [
            ("snap_radius", self.snap_radius),
            ("border_clearance", self.border_clearance),
            ("min_spacing", self.min_spacing),
            ("min_street_length", self.min_street_length),
            ("merge_radius", self.merge_radius),
            ("vertex_snap", self.vertex_snap),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(field, format!("must be a non-negative distance, got {value}")));
            }
        }
        for (field, value) in [
            ("parallel_reject_fraction", self.parallel_reject_fraction),
            ("merge_probability", self.merge_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, format!("{value} outside 0..=1")));
            }
        }
        for (field, value) in [
            ("parallel_tolerance_deg", self.parallel_tolerance_deg),
            ("simplify_angle_deg", self.simplify_angle_deg),
        ] {
            if !(0.0..90.0).contains(&value) {
                return Err(ConfigError::invalid(field, format!("{value} outside 0..90 degrees")));
            }
        }

        self.streets.primary.validate("streets.primary")?;
        self.streets.secondary.validate("streets.secondary")?;
        self.streets.tertiary.validate("streets.tertiary")?;
        self.streets.quaternary.validate("streets.quaternary")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GeneratorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.units().unwrap().region_size(), 800);
        assert_eq!(config.min_cached_regions(), 25);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            snap_radius = 30.0

            [streets.primary]
            probability = 0.5
            min_length = 100.0
            max_length = 200.0
            spacing = 80.0
            "#,
        )
        .unwrap();
        assert!((config.snap_radius - 30.0).abs() < f64::EPSILON);
        assert!((config.streets.primary.probability - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.streets.secondary, StreetTiers::default().secondary);
        assert_eq!(config.tile_size, 80);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = GeneratorConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(GeneratorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_small_cache() {
        let config = GeneratorConfig {
            max_cached_regions: 24,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "max_cached_regions", .. })
        ));

        let deeper = GeneratorConfig {
            recursion_level: 2,
            max_cached_regions: 48,
            ..GeneratorConfig::default()
        };
        assert!(deeper.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = GeneratorConfig::default();
        config.streets.tertiary.min_length = 500.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "streets.tertiary", .. })
        ));

        let config = GeneratorConfig {
            merge_probability: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GeneratorConfig {
            corner_margin: 400.0,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());

        assert!(matches!(
            GeneratorConfig::from_toml_str("tile_size = \"big\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
