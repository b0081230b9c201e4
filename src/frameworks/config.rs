use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::domain::{FloorError, FloorTable, PackId, PackSelector};

// Runtime constants (not gameplay tuning).

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const EVENT_BROADCAST_CAPACITY: usize = 128;
pub const UI_CHANNEL_CAPACITY: usize = 64;

const DEFAULT_DATASET_PATH: &str = "data/locations.json";
const DEFAULT_TOTAL_ROUNDS: u32 = 5;
const DEFAULT_MAX_SCORE: u32 = 500;
const DEFAULT_MAP_READY_ATTEMPTS: u32 = 50;
const DEFAULT_MAP_READY_INTERVAL_MS: u64 = 100;
const DEFAULT_BRIDGE_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_AUTOPLAY_JITTER_METERS: f64 = 40.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is not a valid value")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
    #[error("invalid floor bounds: {0}")]
    Floors(#[from] FloorError),
}

/// Everything the headless runtime reads from the environment.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub dataset_path: PathBuf,
    pub total_rounds: u32,
    pub pack: PackSelector,
    pub max_score: u32,
    pub rng_seed: Option<u64>,
    // `None` waits for an explicit NextRound.
    pub next_round_delay: Option<Duration>,
    pub round_time_limit: Option<Duration>,
    pub floors: FloorTable,
    pub map_ready_attempts: u32,
    pub map_ready_interval: Duration,
    pub bridge_channel_capacity: usize,
    pub autoplay_jitter_meters: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            pack: PackSelector::All,
            max_score: DEFAULT_MAX_SCORE,
            rng_seed: None,
            next_round_delay: None,
            round_time_limit: None,
            floors: FloorTable::default(),
            map_ready_attempts: DEFAULT_MAP_READY_ATTEMPTS,
            map_ready_interval: Duration::from_millis(DEFAULT_MAP_READY_INTERVAL_MS),
            bridge_channel_capacity: DEFAULT_BRIDGE_CHANNEL_CAPACITY,
            autoplay_jitter_meters: DEFAULT_AUTOPLAY_JITTER_METERS,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dataset_path = get("GAME_DATASET_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.dataset_path);

        let total_rounds = positive(
            "GAME_TOTAL_ROUNDS",
            parse(&get, "GAME_TOTAL_ROUNDS")?.unwrap_or(defaults.total_rounds),
        )?;
        let max_score = positive(
            "GAME_MAX_SCORE",
            parse(&get, "GAME_MAX_SCORE")?.unwrap_or(defaults.max_score),
        )?;
        // The running total must fit every round at full marks.
        if max_score.checked_mul(total_rounds).is_none() {
            return Err(ConfigError::Invalid {
                key: "GAME_MAX_SCORE",
                value: max_score.to_string(),
            });
        }

        // An explicit id wins over a name.
        let pack = match parse::<u32>(&get, "GAME_PACK_ID")? {
            Some(id) => PackSelector::Id(PackId(id)),
            None => match get("GAME_PACK_NAME") {
                Some(name) => PackSelector::Name(name.trim().to_string()),
                None => PackSelector::All,
            },
        };

        let min_floor = parse(&get, "MAP_MIN_FLOOR")?.unwrap_or(defaults.floors.min());
        let max_floor = parse(&get, "MAP_MAX_FLOOR")?.unwrap_or(defaults.floors.max());

        Ok(Self {
            dataset_path,
            total_rounds,
            pack,
            max_score,
            rng_seed: parse(&get, "GAME_RNG_SEED")?,
            next_round_delay: optional_millis(&get, "GAME_NEXT_ROUND_DELAY_MS")?,
            round_time_limit: optional_millis(&get, "GAME_ROUND_TIME_LIMIT_MS")?,
            floors: FloorTable::new(min_floor, max_floor)?,
            map_ready_attempts: positive(
                "MAP_READY_ATTEMPTS",
                parse(&get, "MAP_READY_ATTEMPTS")?.unwrap_or(defaults.map_ready_attempts),
            )?,
            map_ready_interval: parse(&get, "MAP_READY_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.map_ready_interval),
            bridge_channel_capacity: positive(
                "BRIDGE_CHANNEL_CAPACITY",
                parse(&get, "BRIDGE_CHANNEL_CAPACITY")?
                    .unwrap_or(defaults.bridge_channel_capacity),
            )?,
            autoplay_jitter_meters: match parse::<f64>(&get, "AUTOPLAY_JITTER_METERS")? {
                Some(meters) if !meters.is_finite() || meters < 0.0 => {
                    return Err(ConfigError::Invalid {
                        key: "AUTOPLAY_JITTER_METERS",
                        value: meters.to_string(),
                    });
                }
                Some(meters) => meters,
                None => defaults.autoplay_jitter_meters,
            },
        })
    }
}

fn parse<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

// Zero means the timer is off.
fn optional_millis(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(parse::<u64>(get, key)?
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis))
}

fn positive<T: Default + PartialEq>(key: &'static str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::Zero { key });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<GameConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GameConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn when_nothing_is_set_then_defaults_apply() {
        let config = config_from(&[]).expect("defaults");
        assert_eq!(config.dataset_path, PathBuf::from("data/locations.json"));
        assert_eq!(config.total_rounds, 5);
        assert_eq!(config.pack, PackSelector::All);
        assert_eq!(config.max_score, 500);
        assert_eq!(config.rng_seed, None);
        assert_eq!(config.next_round_delay, None);
        assert_eq!(config.round_time_limit, None);
        assert_eq!(config.floors, FloorTable::default());
        assert_eq!(config.bridge_channel_capacity, 256);
    }

    #[test]
    fn when_values_are_set_then_they_override_defaults() {
        let config = config_from(&[
            ("GAME_TOTAL_ROUNDS", "3"),
            ("GAME_PACK_NAME", " Europe "),
            ("GAME_RNG_SEED", "99"),
            ("GAME_NEXT_ROUND_DELAY_MS", "1500"),
            ("GAME_ROUND_TIME_LIMIT_MS", "0"),
            ("MAP_MIN_FLOOR", "-2"),
            ("MAP_MAX_FLOOR", "3"),
        ])
        .expect("config");
        assert_eq!(config.total_rounds, 3);
        assert_eq!(config.pack, PackSelector::Name("Europe".to_string()));
        assert_eq!(config.rng_seed, Some(99));
        assert_eq!(config.next_round_delay, Some(Duration::from_millis(1500)));
        assert_eq!(config.round_time_limit, None);
        assert_eq!(config.floors.min(), -2);
        assert_eq!(config.floors.max(), 3);
    }

    #[test]
    fn when_pack_id_and_name_are_both_set_then_id_wins() {
        let config =
            config_from(&[("GAME_PACK_ID", "1"), ("GAME_PACK_NAME", "asia")]).expect("config");
        assert_eq!(config.pack, PackSelector::Id(PackId(1)));
    }

    #[test]
    fn when_value_does_not_parse_then_config_fails() {
        assert!(matches!(
            config_from(&[("GAME_TOTAL_ROUNDS", "five")]),
            Err(ConfigError::Invalid {
                key: "GAME_TOTAL_ROUNDS",
                ..
            })
        ));
        assert!(matches!(
            config_from(&[("AUTOPLAY_JITTER_METERS", "-3")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn when_score_ceiling_would_overflow_total_then_config_fails() {
        assert!(matches!(
            config_from(&[("GAME_TOTAL_ROUNDS", "2"), ("GAME_MAX_SCORE", "4294967295")]),
            Err(ConfigError::Invalid {
                key: "GAME_MAX_SCORE",
                ..
            })
        ));
        let config = config_from(&[("GAME_TOTAL_ROUNDS", "2"), ("GAME_MAX_SCORE", "2147483647")])
            .expect("ceiling fits");
        assert_eq!(config.max_score, 2_147_483_647);
    }

    #[test]
    fn when_round_count_is_zero_then_config_fails() {
        assert!(matches!(
            config_from(&[("GAME_TOTAL_ROUNDS", "0")]),
            Err(ConfigError::Zero { .. })
        ));
    }

    #[test]
    fn when_floor_bounds_are_inverted_then_config_fails() {
        assert!(matches!(
            config_from(&[("MAP_MIN_FLOOR", "4"), ("MAP_MAX_FLOOR", "1")]),
            Err(ConfigError::Floors(FloorError::InvertedBounds { .. }))
        ));
    }
}
