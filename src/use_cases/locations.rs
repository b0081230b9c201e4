// In-memory location catalogue with pack-scoped random selection.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::warn;

use crate::domain::{
    DataLoadError, Location, LocationId, MapPack, PackId, PackSelector, SelectionError,
};

/// Immutable set of locations and map packs loaded at startup.
#[derive(Debug, Clone)]
pub struct LocationStore {
    locations: Vec<Location>,
    /// Location id to index in `locations`.
    by_id: HashMap<LocationId, usize>,
    packs: Vec<MapPack>,
    /// Pack id to the indices of its resolvable locations.
    pack_members: HashMap<PackId, Vec<usize>>,
}

impl LocationStore {
    /// Builds the store and its indices, validating ids and coordinates.
    pub fn from_parts(
        locations: Vec<Location>,
        packs: Vec<MapPack>,
    ) -> Result<Self, DataLoadError> {
        if locations.is_empty() {
            return Err(DataLoadError::NoLocations);
        }

        let mut by_id = HashMap::with_capacity(locations.len());
        for (index, location) in locations.iter().enumerate() {
            if !location.point.is_valid() {
                return Err(DataLoadError::InvalidCoordinate {
                    id: location.id,
                    latitude: location.point.latitude,
                    longitude: location.point.longitude,
                });
            }
            if by_id.insert(location.id, index).is_some() {
                return Err(DataLoadError::DuplicateLocation(location.id));
            }
        }

        let mut pack_members = HashMap::with_capacity(packs.len());
        for pack in &packs {
            let mut seen = HashSet::new();
            let mut members = Vec::with_capacity(pack.location_ids.len());
            for id in &pack.location_ids {
                match by_id.get(id) {
                    Some(&index) => {
                        if seen.insert(index) {
                            members.push(index);
                        }
                    }
                    None => {
                        warn!(pack_id = %pack.id, location_id = %id, "map pack references unknown location; skipping");
                    }
                }
            }
            if pack_members.insert(pack.id, members).is_some() {
                return Err(DataLoadError::DuplicatePack(pack.id));
            }
        }

        Ok(Self {
            locations,
            by_id,
            packs,
            pack_members,
        })
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn packs(&self) -> &[MapPack] {
        &self.packs
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.by_id.get(&id).map(|&index| &self.locations[index])
    }

    pub fn pack(&self, id: PackId) -> Option<&MapPack> {
        self.packs.iter().find(|pack| pack.id == id)
    }

    pub fn pack_by_name(&self, name: &str) -> Option<&MapPack> {
        self.packs
            .iter()
            .find(|pack| pack.name.eq_ignore_ascii_case(name))
    }

    fn resolve(&self, selector: &PackSelector) -> Option<&MapPack> {
        match selector {
            PackSelector::All => None,
            PackSelector::Id(id) => self.pack(*id),
            PackSelector::Name(name) => self.pack_by_name(name),
        }
    }

    /// Picks a location uniformly at random from the selected pack, with replacement.
    ///
    /// The sentinel "all" pack and selectors that resolve to no pack draw from every location.
    pub fn select_random<R: Rng + ?Sized>(
        &self,
        selector: &PackSelector,
        rng: &mut R,
    ) -> Result<&Location, SelectionError> {
        let pack = self.resolve(selector);
        if pack.is_none() && !selector.is_all() {
            warn!(pack = %selector, "map pack not found; falling back to all locations");
        }

        match pack {
            Some(pack) if !pack.is_all() => {
                let members = self
                    .pack_members
                    .get(&pack.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                if members.is_empty() {
                    return Err(SelectionError::EmptyPack {
                        pack: pack.name.clone(),
                    });
                }
                let index = members[rng.gen_range(0..members.len())];
                Ok(&self.locations[index])
            }
            _ => {
                if self.locations.is_empty() {
                    return Err(SelectionError::EmptyPack {
                        pack: selector.to_string(),
                    });
                }
                Ok(&self.locations[rng.gen_range(0..self.locations.len())])
            }
        }
    }
}
