//! Configuration types and JSON loading helpers

use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Grid construction options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Skip every elevation-0 layer when building tiles
    #[serde(default)]
    pub ignore_ground_layer: bool,
}

/// Encounter tuning
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Adjacency hops a creature may move per action
    #[serde(default = "default_movement_range")]
    pub movement_range: u32,
    /// Share of the map width, in percent, split between both deployment zones
    #[serde(default = "default_deployment_fraction")]
    pub deployment_fraction_percent: u32,
    /// Action points a single move costs
    #[serde(default = "default_move_cost")]
    pub move_cost: u32,
    /// Random seed for spawning (None = entropy)
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub map: MapConfig,
}

fn default_movement_range() -> u32 {
    3
}

fn default_deployment_fraction() -> u32 {
    70
}

fn default_move_cost() -> u32 {
    1
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            movement_range: default_movement_range(),
            deployment_fraction_percent: default_deployment_fraction(),
            move_cost: default_move_cost(),
            seed: None,
            map: MapConfig::default(),
        }
    }
}

impl EncounterConfig {
    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set movement range
    pub fn with_movement_range(mut self, range: u32) -> Self {
        self.movement_range = range;
        self
    }

    /// RNG for spawning, seeded when a seed is configured
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }
}

/// Read and deserialize a JSON file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = EncounterConfig::from_json("{}").unwrap();
        assert_eq!(config, EncounterConfig::default());
        assert_eq!(config.movement_range, 3);
        assert_eq!(config.deployment_fraction_percent, 70);
        assert!(!config.map.ignore_ground_layer);
    }

    #[test]
    fn test_partial_json() {
        let config =
            EncounterConfig::from_json(r#"{ "movement_range": 5, "map": { "ignore_ground_layer": true } }"#)
                .unwrap();
        assert_eq!(config.movement_range, 5);
        assert!(config.map.ignore_ground_layer);
        assert_eq!(config.move_cost, 1);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = EncounterConfig::default().with_seed(7);
        let a: u64 = config.rng().gen();
        let b: u64 = config.rng().gen();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_file() {
        let err = EncounterConfig::load(Path::new("/nonexistent/encounter.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
