use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Labor-policy limits every position has to respect, plus search knobs.
///
/// Deserializes with per-field defaults, so a policy file only needs the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Policy {
    /// Hard cap on weekly hours for one position.
    pub max_hours: u32,
    /// Floor a finalized position must reach to be viable.
    pub min_hours: u32,
    /// Cap on the (summed) weekly day count of one position.
    pub max_days: u32,
    /// Positions at or below this many hours are part-time.
    pub part_time_max_hours: u32,
    /// Largest weekly load one client may ask for; anything above is treated
    /// as a bad record.
    pub max_client_hours: u32,
    /// Largest day count one client may ask for.
    pub max_client_days: u32,
    pub search: SearchOptions,
    pub merge: MergeMode,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_hours: 45,
            min_hours: 16,
            max_days: 5,
            part_time_max_hours: 24,
            max_client_hours: 168,
            max_client_days: 7,
            search: SearchOptions::default(),
            merge: MergeMode::default(),
        }
    }
}

impl Policy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_hours == 0 {
            return Err(PolicyError::ZeroLimit("max_hours"));
        }
        if self.max_days == 0 {
            return Err(PolicyError::ZeroLimit("max_days"));
        }
        if self.max_client_hours == 0 {
            return Err(PolicyError::ZeroLimit("max_client_hours"));
        }
        if self.min_hours > self.max_hours {
            return Err(PolicyError::FloorAboveCap {
                min_hours: self.min_hours,
                max_hours: self.max_hours,
            });
        }
        if self.part_time_max_hours > self.max_hours {
            return Err(PolicyError::PartTimeAboveCap {
                part_time_max_hours: self.part_time_max_hours,
                max_hours: self.max_hours,
            });
        }
        Ok(())
    }

    /// Whether a single client's request is within the per-client bounds.
    pub fn admits(&self, hours: u32, days: u32) -> bool {
        hours <= self.max_client_hours && days <= self.max_client_days
    }
}

/// Controls how the position-count search explores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Placement budget shared by the whole search; `None` is unbounded.
    pub max_steps: Option<u64>,
    /// Explore candidate position counts on the rayon pool.
    pub parallel: bool,
}

/// Which merge strategy runs after search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    #[default]
    Identity,
    Greedy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("min_hours ({min_hours}) exceeds max_hours ({max_hours})")]
    FloorAboveCap { min_hours: u32, max_hours: u32 },
    #[error("part_time_max_hours ({part_time_max_hours}) exceeds max_hours ({max_hours})")]
    PartTimeAboveCap {
        part_time_max_hours: u32,
        max_hours: u32,
    },
}
