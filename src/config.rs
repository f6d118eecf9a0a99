//! Static pipeline configuration: the locality set and the wage index factor.
//!
//! The defaults describe ten Western Sydney postcodes. A JSON file can
//! replace either part:
//! ```json
//! {
//!   "wage_index_factor": 1.142,
//!   "localities": [
//!     { "postcode": 2150, "name": "Parramatta" },
//!     { "postcode": 2148, "name": "Blacktown" }
//!   ]
//! }
//! ```

use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Display name for a postcode missing from the map.
pub const UNKNOWN_LOCALITY: &str = "Unknown";

/// Multiplier taking 2021 census incomes to current estimates.
pub const WAGE_INDEX_FACTOR: f64 = 1.142;

const DEFAULT_LOCALITIES: &[(u32, &str)] = &[
    (2148, "Blacktown"),
    (2150, "Parramatta"),
    (2750, "Penrith"),
    (2770, "Mt Druitt"),
    (2170, "Liverpool"),
    (2560, "Campbelltown"),
    (2144, "Auburn"),
    (2200, "Bankstown"),
    (2145, "Westmead"),
    (2760, "St Marys"),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Locality {
    pub postcode: u32,
    pub name: String,
}

/// Immutable postcode → name lookup. Postcode is the join key everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalityMap {
    entries: BTreeMap<u32, String>,
}

impl LocalityMap {
    pub fn new(localities: impl IntoIterator<Item = Locality>) -> Self {
        Self {
            entries: localities
                .into_iter()
                .map(|l| (l.postcode, l.name))
                .collect(),
        }
    }

    pub fn contains(&self, postcode: u32) -> bool {
        self.entries.contains_key(&postcode)
    }

    /// Returns the display name, or [`UNKNOWN_LOCALITY`].
    pub fn name_of(&self, postcode: u32) -> &str {
        self.entries
            .get(&postcode)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LOCALITY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Postcodes in ascending order.
    pub fn postcodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for LocalityMap {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALITIES.iter().map(|(postcode, name)| Locality {
            postcode: *postcode,
            name: name.to_string(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub localities: LocalityMap,
    pub wage_index_factor: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            localities: LocalityMap::default(),
            wage_index_factor: WAGE_INDEX_FACTOR,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    wage_index_factor: Option<f64>,
    localities: Option<Vec<Locality>>,
}

impl PipelineConfig {
    /// Loads overrides from a JSON file at `path`; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        crate::error::require_input(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(content)?;
        let mut config = Self::default();
        if let Some(factor) = file.wage_index_factor {
            config.wage_index_factor = factor;
        }
        if let Some(localities) = file.localities {
            config.localities = LocalityMap::new(localities);
        }
        info!(
            localities = config.localities.len(),
            wage_index_factor = config.wage_index_factor,
            "Loaded pipeline config"
        );
        Ok(config)
    }
}
