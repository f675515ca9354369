//! # World Configuration
//!
//! Tunables for the voxel world, loadable from JSON. Every field has a default,
//! so a config file only needs to name the values it overrides.
//!
//! ```json
//! { "world_height_chunks": 8, "mesh_builds_per_frame": 4 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine_state::lighting::MAX_LIGHT_LEVEL;
use crate::error::ConfigError;

/// Configuration of a `World` and the driver loop around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of chunks stacked on the y axis. Chunk y coordinates run from 0 to this value minus one.
    pub world_height_chunks: i32,
    /// Light level of unobstructed sky.
    pub sky_light_level: u8,
    /// Generation worker count. 0 selects the available parallelism.
    pub worker_threads: usize,
    /// Maximum mesh rebuilds per update tick, -1 for unlimited.
    pub mesh_builds_per_frame: i32,
    /// Maximum mesh uploads per render call, -1 for unlimited.
    pub mesh_uploads_per_frame: i32,
    /// Global lighting invocations without progress before unresolved voxels default to darkness.
    pub lighting_stall_limit: u32,
    /// Interval between store flushes in the driver loop.
    pub save_interval_ms: u64,
    /// Step length of the raycast march.
    pub raycast_step: f32,
    /// Period of the driver loop.
    pub tick_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            world_height_chunks: 8,
            sky_light_level: MAX_LIGHT_LEVEL,
            worker_threads: 0,
            mesh_builds_per_frame: 1,
            mesh_uploads_per_frame: 1,
            lighting_stall_limit: 32,
            save_interval_ms: 5000,
            raycast_step: 0.05,
            tick_interval_ms: 10,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world_height_chunks <= 0 {
            return Err(ConfigError::Invalid(format!(
                "world_height_chunks must be positive, got {}",
                self.world_height_chunks
            )));
        }
        if self.sky_light_level > MAX_LIGHT_LEVEL {
            return Err(ConfigError::Invalid(format!(
                "sky_light_level must be at most {}, got {}",
                MAX_LIGHT_LEVEL, self.sky_light_level
            )));
        }
        if self.mesh_builds_per_frame < -1 || self.mesh_uploads_per_frame < -1 {
            return Err(ConfigError::Invalid(
                "per-frame budgets must be -1 (unlimited) or non-negative".to_string(),
            ));
        }
        if !(self.raycast_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "raycast_step must be positive, got {}",
                self.raycast_step
            )));
        }
        Ok(())
    }

    /// The y coordinate of the topmost chunk layer.
    pub fn top_chunk_y(&self) -> i32 {
        self.world_height_chunks - 1
    }

    /// Resolves `worker_threads`, falling back to the available parallelism.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = WorldConfig::from_json_str(r#"{ "mesh_builds_per_frame": -1 }"#).unwrap();
        assert_eq!(config.mesh_builds_per_frame, -1);
        assert_eq!(config.world_height_chunks, 8);
        assert_eq!(config.top_chunk_y(), 7);
        assert_eq!(config.sky_light_level, 15);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "sky_light_level": 16 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "world_height_chunks": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "mesh_uploads_per_frame": -2 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "raycast_step": 0.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            WorldConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        std::fs::write(&path, r#"{ "worker_threads": 3 }"#).unwrap();
        let config = WorldConfig::load(&path).unwrap();
        assert_eq!(config.resolved_worker_threads(), 3);

        let missing = WorldConfig::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
