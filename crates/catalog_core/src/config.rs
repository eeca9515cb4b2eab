//! Reorder engine configuration.
//!
//! # Invariants
//! - `sort_gap >= 2`, so every category can hold at least one course key
//!   strictly between its own key and the next sibling's key.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Spacing between canonical sibling sort keys.
pub const DEFAULT_SORT_GAP: i64 = 10_000;

const MIN_SORT_GAP: i64 = 2;

/// Tunables for category reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReorderConfig {
    /// Sibling key spacing; course keys live in `[key, key + sort_gap)`.
    pub sort_gap: i64,
    /// Walk the ancestor chain of a new parent and reject moves under one's
    /// own descendant. Off by default: only direct self-parenting is rejected.
    pub strict_ancestry: bool,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            sort_gap: DEFAULT_SORT_GAP,
            strict_ancestry: false,
        }
    }
}

impl ReorderConfig {
    /// Builds a validated config with the given gap.
    pub fn with_sort_gap(sort_gap: i64) -> Result<Self, ConfigError> {
        let config = Self {
            sort_gap,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Enables or disables the ancestor-chain walk.
    pub fn strict_ancestry(mut self, enabled: bool) -> Self {
        self.strict_ancestry = enabled;
        self
    }

    /// Checks invariants that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sort_gap < MIN_SORT_GAP {
            return Err(ConfigError::GapTooSmall(self.sort_gap));
        }
        Ok(())
    }

    /// Maximum number of courses one category can hold without its course keys
    /// reaching the next sibling's key.
    pub fn course_capacity(&self) -> i64 {
        self.sort_gap - 1
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    GapTooSmall(i64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GapTooSmall(value) => write!(
                f,
                "sort gap must be at least {MIN_SORT_GAP}, got {value}"
            ),
        }
    }
}

impl Error for ConfigError {}
