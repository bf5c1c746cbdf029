//! Road hierarchy: main roads and four tiers of streets.

use crate::config::{StreetTiers, TierConfig};
use crate::material::Material;

/// Position of a path in the road hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Border-to-border road.
    Main,
    /// Street off a main road.
    Primary,
    /// Street off a primary street.
    Secondary,
    /// Street off a secondary street.
    Tertiary,
    /// Street off a tertiary street.
    Quaternary,
}

impl Tier {
    /// All tiers, widest first.
    pub const ALL: [Self; 5] = [
        Self::Main,
        Self::Primary,
        Self::Secondary,
        Self::Tertiary,
        Self::Quaternary,
    ];

    /// Branching depth (0 for main roads).
    #[must_use]
    pub const fn depth(self) -> u8 {
        self as u8
    }

    /// Tier of streets branching off this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Main => Some(Self::Primary),
            Self::Primary => Some(Self::Secondary),
            Self::Secondary => Some(Self::Tertiary),
            Self::Tertiary => Some(Self::Quaternary),
            Self::Quaternary => None,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::Quaternary => "quaternary",
        }
    }

    /// Circular brushes `(radius, material)` in drawing order.
    #[must_use]
    pub const fn brushes(self) -> &'static [(u32, Material)] {
        match self {
            Self::Main => &[(5, Material::Margin), (4, Material::Asphalt)],
            Self::Primary => &[(4, Material::Margin), (3, Material::Asphalt)],
            Self::Secondary => &[(3, Material::Margin), (2, Material::Asphalt)],
            Self::Tertiary => &[(2, Material::Margin), (1, Material::Gravel)],
            Self::Quaternary => &[(1, Material::Margin), (0, Material::Gravel)],
        }
    }

    /// Widest brush radius.
    #[must_use]
    pub fn width(self) -> u32 {
        self.brushes().iter().map(|&(r, _)| r).max().unwrap_or(0)
    }

    /// Branching parameters, `None` for main roads.
    #[must_use]
    pub const fn config(self, tiers: &StreetTiers) -> Option<&TierConfig> {
        match self {
            Self::Main => None,
            Self::Primary => Some(&tiers.primary),
            Self::Secondary => Some(&tiers.secondary),
            Self::Tertiary => Some(&tiers.tertiary),
            Self::Quaternary => Some(&tiers.quaternary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_is_finite() {
        let mut tier = Tier::Main;
        let mut steps = 0;
        while let Some(next) = tier.next() {
            assert!(next.depth() == tier.depth() + 1);
            tier = next;
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(tier, Tier::Quaternary);
    }

    #[test]
    fn test_brushes_narrow_with_depth() {
        for pair in Tier::ALL.windows(2) {
            assert!(pair[0].width() > pair[1].width());
        }
        assert!(Tier::Main.config(&StreetTiers::default()).is_none());
        assert!(Tier::Quaternary.config(&StreetTiers::default()).is_some());
    }
}
