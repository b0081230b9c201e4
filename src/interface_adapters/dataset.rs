// Dataset DTOs for the location file. Older files name coordinates `x`/`y`/`z`;
// newer ones use `latitude`/`longitude`/`zLevel`. Both normalize to the same domain types.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::domain::{DataLoadError, GeoPoint, Location, LocationId, MapPack, PackId};
use crate::use_cases::LocationStore;

#[derive(Debug, Deserialize)]
struct DatasetDto {
    #[serde(rename = "Locations", alias = "locations")]
    locations: Vec<LocationDto>,
    #[serde(rename = "MapPacks", alias = "mapPacks", default)]
    map_packs: Vec<MapPackDto>,
}

#[derive(Debug, Deserialize)]
struct LocationDto {
    #[serde(rename = "ID", alias = "id", alias = "Id")]
    id: u32,
    #[serde(rename = "Name", alias = "name", default)]
    name: String,
    #[serde(rename = "FileName", alias = "fileName", alias = "imageRef", default)]
    image_ref: String,
    #[serde(rename = "latitude", alias = "x", alias = "lat")]
    latitude: f64,
    #[serde(rename = "longitude", alias = "y", alias = "lng")]
    longitude: f64,
    #[serde(
        rename = "zLevel",
        alias = "z",
        default,
        deserialize_with = "deserialize_level"
    )]
    z_level: i32,
}

#[derive(Debug, Deserialize)]
struct MapPackDto {
    #[serde(rename = "ID", alias = "id", alias = "Id")]
    id: u32,
    #[serde(rename = "Name", alias = "name")]
    name: String,
    #[serde(
        rename = "locationIDs",
        alias = "locationIds",
        alias = "LocationIDs",
        default
    )]
    location_ids: Vec<u32>,
}

// Older exports write floor indices as floats (`"z": 2.0`).
fn deserialize_level<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.fract() != 0.0 || raw < f64::from(i32::MIN) || raw > f64::from(i32::MAX) {
        return Err(serde::de::Error::custom(format!(
            "floor level {raw} is not an integer"
        )));
    }
    Ok(raw as i32)
}

impl From<LocationDto> for Location {
    fn from(dto: LocationDto) -> Self {
        Self {
            id: LocationId(dto.id),
            name: dto.name,
            point: GeoPoint::new(dto.latitude, dto.longitude),
            z_level: dto.z_level,
            image_ref: dto.image_ref,
        }
    }
}

impl From<MapPackDto> for MapPack {
    fn from(dto: MapPackDto) -> Self {
        Self {
            id: PackId(dto.id),
            name: dto.name,
            location_ids: dto.location_ids.into_iter().map(LocationId).collect(),
        }
    }
}

/// Parses a dataset document and builds the location store.
pub fn load_store(dataset: &str) -> Result<LocationStore, DataLoadError> {
    let dto: DatasetDto = serde_json::from_str(dataset)?;
    let locations = dto.locations.into_iter().map(Location::from).collect();
    let packs = dto.map_packs.into_iter().map(MapPack::from).collect();
    let store = LocationStore::from_parts(locations, packs)?;
    info!(
        locations = store.len(),
        packs = store.packs().len(),
        "location dataset loaded"
    );
    Ok(store)
}

pub fn load_store_from_path(path: impl AsRef<Path>) -> Result<LocationStore, DataLoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| DataLoadError::Missing {
        path: path.to_path_buf(),
        source,
    })?;
    load_store(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackSelector;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Write;

    const LEGACY: &str = r#"{
        "Locations": [
            { "ID": 10, "Name": "Great Court", "FileName": "court.jpg", "x": -27.4975, "y": 153.0130, "z": 1.0 },
            { "ID": 11, "Name": "Car Park", "FileName": "p2.jpg", "x": -27.4990, "y": 153.0150, "z": -2 }
        ],
        "MapPacks": [
            { "ID": 0, "Name": "all", "locationIDs": [] },
            { "ID": 1, "Name": "europe", "locationIDs": [10, 11] }
        ]
    }"#;

    #[test]
    fn when_dataset_uses_legacy_names_then_fields_are_normalized() {
        let store = load_store(LEGACY).expect("legacy dataset loads");
        let court = store.location(LocationId(10)).expect("location 10");
        assert_eq!(court.point, GeoPoint::new(-27.4975, 153.0130));
        assert_eq!(court.z_level, 1);
        assert_eq!(court.image_ref, "court.jpg");
        assert_eq!(store.location(LocationId(11)).map(|l| l.z_level), Some(-2));
        assert_eq!(store.packs().len(), 2);
    }

    #[test]
    fn when_dataset_uses_current_names_then_it_loads_the_same() {
        let text = r#"{
            "Locations": [
                { "ID": 3, "Name": "Library", "imageRef": "lib.jpg", "latitude": 51.5, "longitude": -0.12, "zLevel": 4 }
            ]
        }"#;
        let store = load_store(text).expect("current dataset loads");
        let library = store.location(LocationId(3)).expect("location 3");
        assert_eq!(library.point, GeoPoint::new(51.5, -0.12));
        assert_eq!(library.z_level, 4);
        assert!(store.packs().is_empty());
    }

    #[test]
    fn when_pack_is_loaded_then_selection_is_scoped_to_it() {
        let store = load_store(LEGACY).expect("dataset loads");
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..50 {
            let picked = store
                .select_random(&PackSelector::Id(PackId(1)), &mut rng)
                .expect("pack has locations");
            assert!(picked.id == LocationId(10) || picked.id == LocationId(11));
        }
    }

    #[test]
    fn when_dataset_is_malformed_then_load_fails() {
        assert!(matches!(
            load_store("{ \"Locations\": [ { \"ID\": 1 } ] }"),
            Err(DataLoadError::Malformed(_))
        ));
        assert!(matches!(
            load_store("not json"),
            Err(DataLoadError::Malformed(_))
        ));
    }

    #[test]
    fn when_floor_level_is_fractional_then_load_fails() {
        let text = r#"{ "Locations": [ { "ID": 1, "x": 0.0, "y": 0.0, "z": 1.5 } ] }"#;
        assert!(matches!(load_store(text), Err(DataLoadError::Malformed(_))));
    }

    #[test]
    fn when_file_is_missing_then_load_reports_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        match load_store_from_path(&path) {
            Err(DataLoadError::Missing { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected missing dataset, got {other:?}"),
        }
    }

    #[test]
    fn when_file_exists_then_it_is_loaded_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(LEGACY.as_bytes()).expect("write dataset");
        let store = load_store_from_path(file.path()).expect("dataset loads");
        assert_eq!(store.len(), 2);
    }
}
