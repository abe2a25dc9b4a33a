//! Maze and session settings, read from `LABYRINTH_*` environment variables.

use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::pathfinding::Algorithm;
use crate::safepoints::{SafepointPlacer, SafepointPolicy, SafepointTarget};

pub const DEFAULT_CELLS_X: usize = 10;
pub const DEFAULT_CELLS_Y: usize = 10;
pub const DEFAULT_TILE_SCALE: f32 = 1.0;
pub const DEFAULT_MIN_SPACING: f32 = 3.0;
pub const DEFAULT_PURSUERS: usize = 5;
pub const DEFAULT_WANDERERS: usize = 1;
pub const DEFAULT_AGENT_SPEED: f32 = 2.0;
pub const DEFAULT_ARRIVE_THRESHOLD: f32 = 0.2;
pub const DEFAULT_IMMUNITY_SECS: f32 = 5.0;
pub const DEFAULT_TIME_LIMIT_SECS: f32 = 60.0;
pub const DEFAULT_SPAWN_CLEARANCE: f32 = 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct MazeConfig {
    pub cells_x: usize,
    pub cells_y: usize,
    /// World units per grid cell.
    pub tile_scale: f32,
    pub safepoint_policy: SafepointPolicy,
    pub safepoint_target: SafepointTarget,
    /// Minimum Euclidean distance between safepoints, in cells.
    pub min_spacing: f32,
    pub pursuers: usize,
    pub wanderers: usize,
    pub algorithm: Algorithm,
    /// World units per second.
    pub agent_speed: f32,
    pub arrive_threshold: f32,
    pub immunity_secs: f32,
    pub time_limit_secs: f32,
    /// Minimum world distance between the player and a freshly spawned agent.
    pub spawn_clearance: f32,
    pub seed: Option<u64>,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            cells_x: DEFAULT_CELLS_X,
            cells_y: DEFAULT_CELLS_Y,
            tile_scale: DEFAULT_TILE_SCALE,
            safepoint_policy: SafepointPolicy::default(),
            safepoint_target: SafepointTarget::default(),
            min_spacing: DEFAULT_MIN_SPACING,
            pursuers: DEFAULT_PURSUERS,
            wanderers: DEFAULT_WANDERERS,
            algorithm: Algorithm::default(),
            agent_speed: DEFAULT_AGENT_SPEED,
            arrive_threshold: DEFAULT_ARRIVE_THRESHOLD,
            immunity_secs: DEFAULT_IMMUNITY_SECS,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            spawn_clearance: DEFAULT_SPAWN_CLEARANCE,
            seed: None,
        }
    }
}

impl MazeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MazeConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, "LABYRINTH_CELLS_X")? {
            config.cells_x = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_CELLS_Y")? {
            config.cells_y = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_TILE_SCALE")? {
            config.tile_scale = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_SAFEPOINT_POLICY")? {
            config.safepoint_policy = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_SAFEPOINTS")? {
            config.safepoint_target = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_MIN_SPACING")? {
            config.min_spacing = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_PURSUERS")? {
            config.pursuers = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_WANDERERS")? {
            config.wanderers = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_ALGORITHM")? {
            config.algorithm = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_AGENT_SPEED")? {
            config.agent_speed = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_IMMUNITY_SECS")? {
            config.immunity_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_TIME_LIMIT")? {
            config.time_limit_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "LABYRINTH_SEED")? {
            config.seed = Some(v);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cells_x == 0 {
            return Err(ConfigError::TooSmall {
                axis: "x",
                value: self.cells_x,
            });
        }
        if self.cells_y == 0 {
            return Err(ConfigError::TooSmall {
                axis: "y",
                value: self.cells_y,
            });
        }
        for (field, value) in [
            ("tile_scale", self.tile_scale),
            ("agent_speed", self.agent_speed),
            ("arrive_threshold", self.arrive_threshold),
            ("time_limit_secs", self.time_limit_secs),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("min_spacing", self.min_spacing),
            ("immunity_secs", self.immunity_secs),
            ("spawn_clearance", self.spawn_clearance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if let SafepointTarget::Fraction(f) = self.safepoint_target {
            if !(f > 0.0 && f <= 1.0) {
                return Err(ConfigError::InvalidFraction(f));
            }
        }
        Ok(())
    }

    pub fn safepoint_placer(&self) -> SafepointPlacer {
        SafepointPlacer {
            policy: self.safepoint_policy,
            target: self.safepoint_target,
            min_spacing: self.min_spacing,
        }
    }
}

/// `Ok(None)` when the variable is unset or blank.
pub fn parse_var<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                })
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(MazeConfig::default().validate(), Ok(()));
        assert_eq!(MazeConfig::from_lookup(lookup(&[])), Ok(MazeConfig::default()));
    }

    #[test]
    fn reads_overrides() {
        let config = MazeConfig::from_lookup(lookup(&[
            ("LABYRINTH_CELLS_X", "4"),
            ("LABYRINTH_CELLS_Y", " 6 "),
            ("LABYRINTH_SAFEPOINT_POLICY", "corner"),
            ("LABYRINTH_SAFEPOINTS", "10%"),
            ("LABYRINTH_ALGORITHM", "bfs"),
            ("LABYRINTH_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!((config.cells_x, config.cells_y), (4, 6));
        assert_eq!(config.safepoint_policy, SafepointPolicy::Corner);
        assert_eq!(config.safepoint_target, SafepointTarget::Fraction(0.1));
        assert_eq!(config.algorithm, Algorithm::BreadthFirst);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn zero_cells_is_fatal() {
        let err = MazeConfig::from_lookup(lookup(&[("LABYRINTH_CELLS_Y", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::TooSmall { axis: "y", value: 0 });
    }

    #[test]
    fn garbage_is_reported_with_key() {
        let err = MazeConfig::from_lookup(lookup(&[("LABYRINTH_CELLS_X", "ten")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "LABYRINTH_CELLS_X"));
    }

    #[test]
    fn rejects_bad_numbers() {
        let config = MazeConfig {
            tile_scale: 0.0,
            ..MazeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NonPositive { field: "tile_scale", .. })));

        let config = MazeConfig {
            safepoint_target: SafepointTarget::Fraction(1.5),
            ..MazeConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFraction(1.5)));
    }
}
