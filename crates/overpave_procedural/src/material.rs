//! # Canvas Materials
//!
//! Every canvas cell holds one material id. Materials carry a fixed
//! priority: a write only lands when the new priority is at least the
//! priority already in the cell, so narrow street surfaces never erase a
//! main road and verges never cover asphalt.
//!
//! Ids at or above [`MARKER_THRESHOLD`] are algorithm markers. They are
//! kept in the canvas for inspection but never reach real terrain.

/// First id reserved for internal markers.
pub const MARKER_THRESHOLD: u8 = 200;

/// Materials a canvas cell can hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Material {
    /// Nothing drawn.
    #[default]
    Empty = 0,
    /// Verge along a road edge.
    Margin = 1,
    /// Surface of minor streets.
    Gravel = 2,
    /// Surface of roads and major streets.
    Asphalt = 3,
    /// Marker: start of a path.
    Origin = 250,
    /// Marker: any other path vertex.
    Midpoint = 251,
}

impl Material {
    /// All materials, in id order.
    pub const ALL: [Self; 6] = [
        Self::Empty,
        Self::Margin,
        Self::Gravel,
        Self::Asphalt,
        Self::Origin,
        Self::Midpoint,
    ];

    /// Numeric id stored in canvas cells.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Looks a material up by id.
    #[inline]
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Empty),
            1 => Some(Self::Margin),
            2 => Some(Self::Gravel),
            3 => Some(Self::Asphalt),
            250 => Some(Self::Origin),
            251 => Some(Self::Midpoint),
            _ => None,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Margin => "margin",
            Self::Gravel => "gravel",
            Self::Asphalt => "asphalt",
            Self::Origin => "origin",
            Self::Midpoint => "midpoint",
        }
    }

    /// Overwrite priority.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Margin => 1,
            Self::Gravel => 2,
            Self::Asphalt => 3,
            Self::Midpoint => 8,
            Self::Origin => 9,
        }
    }

    /// Returns true for internal algorithm markers.
    #[inline]
    #[must_use]
    pub const fn is_marker(self) -> bool {
        self.id() >= MARKER_THRESHOLD
    }

    /// Material a terrain writer should place for this cell.
    ///
    /// Markers always sit on a drawn road vertex, so they surface as
    /// asphalt; `Empty` has no surface.
    #[must_use]
    pub const fn surface(self) -> Option<Self> {
        match self {
            Self::Empty => None,
            Self::Origin | Self::Midpoint => Some(Self::Asphalt),
            other => Some(other),
        }
    }
}

/// Priority of the material stored under a raw cell id.
///
/// Unknown ids have priority 0 so that anything may overwrite them.
#[inline]
#[must_use]
pub const fn priority_of_id(id: u8) -> u8 {
    match Material::from_id(id) {
        Some(material) => material.priority(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        for material in Material::ALL {
            assert_eq!(Material::from_id(material.id()), Some(material));
        }
        assert_eq!(Material::from_id(99), None);
    }

    #[test]
    fn test_markers_are_above_threshold() {
        for material in Material::ALL {
            assert_eq!(material.is_marker(), matches!(material, Material::Origin | Material::Midpoint));
        }
        assert_eq!(Material::Origin.surface(), Some(Material::Asphalt));
        assert_eq!(Material::Empty.surface(), None);
    }

    #[test]
    fn test_priority_order() {
        assert!(Material::Asphalt.priority() > Material::Gravel.priority());
        assert!(Material::Gravel.priority() > Material::Margin.priority());
        assert!(Material::Margin.priority() > Material::Empty.priority());
        assert_eq!(priority_of_id(77), 0);
    }
}
