//! Geolocation from a static CIDR table.
//!
//! The table is a JSON array of objects, each with a `network` in CIDR
//! notation plus any descriptor fields:
//!
//! ```json
//! [{"network": "1.1.1.0/24", "country": "AU", "city": "Sydney"}]
//! ```
//!
//! A lookup returns the descriptor fields of the most specific network that
//! contains the address.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use alarmlog_core::Geolocator;
use ipnetwork::IpNetwork;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

#[derive(thiserror::Error, Debug)]
pub enum GeoTableError {
    #[error("Failed to read geolocation table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid geolocation table: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct GeoEntry {
    network: IpNetwork,
    #[serde(flatten)]
    descriptor: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    entries: Vec<(IpNetwork, Value)>,
}

impl GeoTable {
    pub fn from_json(raw: &str) -> Result<Self, GeoTableError> {
        let entries: Vec<GeoEntry> = serde_json::from_str(raw)?;
        Ok(Self {
            entries: entries
                .into_iter()
                .map(|e| (e.network, Value::Object(e.descriptor)))
                .collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, GeoTableError> {
        let raw = std::fs::read_to_string(path).map_err(|source| GeoTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&raw)?;
        info!(path = %path.display(), networks = table.len(), "Loaded geolocation table");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Geolocator for GeoTable {
    fn lookup(&self, address: &str) -> Option<Value> {
        let ip: IpAddr = address.trim().parse().ok()?;
        self.entries
            .iter()
            .filter(|(network, _)| network.contains(ip))
            .max_by_key(|(network, _)| network.prefix())
            .map(|(_, descriptor)| descriptor.clone())
    }
}
