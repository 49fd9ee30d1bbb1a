// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stitching configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SpreadStitchError};
use crate::types::OverlapPolicy;

/// Tunables for raster stitching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Rightmost columns of the left page searched for a seam (default 50).
    pub overlap_columns: u32,
    /// Per-channel tolerance for JPEG artefacts when matching a seam column
    /// (default 75).
    pub compression_fuzz: u16,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            overlap_columns: 50,
            compression_fuzz: 75,
        }
    }
}

impl StitchConfig {
    /// Read a JSON config file. Missing keys take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            SpreadStitchError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        debug!(
            overlap_columns = config.overlap_columns,
            compression_fuzz = config.compression_fuzz,
            "Loaded stitch config"
        );
        Ok(config)
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        OverlapPolicy {
            columns: self.overlap_columns,
            fuzz: self.compression_fuzz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = StitchConfig::default();
        assert_eq!(config.overlap_columns, 50);
        assert_eq!(config.compression_fuzz, 75);
        assert_eq!(
            config.overlap_policy(),
            OverlapPolicy {
                columns: 50,
                fuzz: 75
            }
        );
    }

    #[test]
    fn load_fills_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stitch.json");
        std::fs::write(&path, r#"{ "overlap_columns": 12 }"#).expect("write config");

        let config = StitchConfig::load(&path).expect("load");
        assert_eq!(config.overlap_columns, 12);
        assert_eq!(config.compression_fuzz, 75);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = StitchConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SpreadStitchError::Config(_)));
    }
}
