// Locations and map packs loaded from the dataset.

use std::fmt;

use crate::domain::coords::{ActualCoordinate, GeoPoint};

/// Pack name that logically contains every loaded location.
pub const ALL_PACK_NAME: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackId(pub u32);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub point: GeoPoint,
    // Building floor index; negative values are parking levels.
    pub z_level: i32,
    // Scene image shown to the player.
    pub image_ref: String,
}

impl Location {
    pub fn actual_coordinate(&self) -> ActualCoordinate {
        ActualCoordinate {
            point: self.point,
            z_level: self.z_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPack {
    pub id: PackId,
    pub name: String,
    pub location_ids: Vec<LocationId>,
}

impl MapPack {
    pub fn is_all(&self) -> bool {
        self.name.eq_ignore_ascii_case(ALL_PACK_NAME)
    }
}

/// How a session scopes random location selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackSelector {
    #[default]
    All,
    Id(PackId),
    Name(String),
}

impl PackSelector {
    /// True for the "all" sentinel, whether selected explicitly or by name.
    pub fn is_all(&self) -> bool {
        match self {
            PackSelector::All => true,
            PackSelector::Name(name) => name.eq_ignore_ascii_case(ALL_PACK_NAME),
            PackSelector::Id(_) => false,
        }
    }
}

impl fmt::Display for PackSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackSelector::All => f.write_str(ALL_PACK_NAME),
            PackSelector::Id(id) => write!(f, "#{id}"),
            PackSelector::Name(name) => f.write_str(name),
        }
    }
}
