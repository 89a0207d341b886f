//! Workflow configuration.
//!
//! The supplier catalog and the approval threshold are injected once at
//! graph-build time and never mutated afterwards; nothing is hardcoded
//! inside the stages.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Configuration for the procurement workflow stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Item name (singular, lowercase) to preferred supplier.
    #[serde(default = "default_supplier_catalog")]
    pub supplier_catalog: BTreeMap<String, String>,

    /// Largest quantity that is auto-approved.
    #[serde(default = "default_approval_threshold")]
    pub approval_threshold: u32,
}

fn default_supplier_catalog() -> BTreeMap<String, String> {
    [
        ("laptop", "Acme Computers"),
        ("monitor", "Display World"),
        ("mouse", "Pointer Pros"),
        ("keyboard", "KeyCo"),
        ("chair", "OfficeCo"),
        ("desk", "FurnishIt"),
    ]
    .into_iter()
    .map(|(item, supplier)| (item.to_string(), supplier.to_string()))
    .collect()
}

fn default_approval_threshold() -> u32 {
    5
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            supplier_catalog: default_supplier_catalog(),
            approval_threshold: default_approval_threshold(),
        }
    }
}

impl WorkflowConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
