//! Onionoo details document model
//!
//! Records and the top-level document keep the payload's JSON object as-is
//! (key order and explicit `null`s included). The fields the exporter reads
//! are exposed through accessors.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flag marking a relay usable as a first hop
pub const GUARD_FLAG: &str = "guard";

/// Flag marking a relay usable as the last hop
pub const EXIT_FLAG: &str = "exit";

const RELAYS_KEY: &str = "relays";
const SNAPSHOT_TIMESTAMP_KEY: &str = "snapshot_timestamp";

/// One entry of the `relays` array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRecord {
    fields: Map<String, Value>,
}

impl NodeRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Absent when missing, `null` or not a string
    pub fn fingerprint(&self) -> Option<&str> {
        self.get("fingerprint").and_then(Value::as_str)
    }

    /// Advertised OR endpoints, e.g. `185.220.101.33:10033`
    pub fn addresses(&self) -> impl Iterator<Item = &str> + '_ {
        self.strings("or_addresses")
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> + '_ {
        self.strings("flags")
    }

    /// Case-insensitive flag membership
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags().any(|f| f.eq_ignore_ascii_case(flag))
    }

    pub fn is_guard(&self) -> bool {
        self.has_flag(GUARD_FLAG)
    }

    pub fn is_exit(&self) -> bool {
        self.has_flag(EXIT_FLAG)
    }

    /// Ranking weight; absent or non-numeric counts as zero
    pub fn weight(&self) -> f64 {
        self.get("consensus_weight_fraction")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    // Non-string entries are skipped.
    fn strings(&self, key: &str) -> impl Iterator<Item = &str> + '_ {
        self.get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}

/// The full details payload plus the capture timestamp
///
/// An array under `relays` is parsed into [`NodeRecord`]s and written back
/// in its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    fields: Map<String, Value>,
    relays: Option<Vec<NodeRecord>>,
}

impl Dataset {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match (key, &self.relays) {
            (RELAYS_KEY, Some(_)) => None,
            _ => self.fields.get(key),
        }
    }

    pub fn relays(&self) -> &[NodeRecord] {
        self.relays.as_deref().unwrap_or(&[])
    }

    pub fn version(&self) -> Option<&str> {
        self.get("version").and_then(Value::as_str)
    }

    pub fn snapshot_timestamp(&self) -> Option<&str> {
        self.get(SNAPSHOT_TIMESTAMP_KEY).and_then(Value::as_str)
    }

    /// Record the capture instant, replacing any value from the payload
    pub fn stamp(&mut self, captured_at: impl Into<String>) {
        self.fields.insert(
            SNAPSHOT_TIMESTAMP_KEY.to_string(),
            Value::String(captured_at.into()),
        );
    }

    /// True when the payload carried no fields at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            match (key.as_str(), &self.relays) {
                (RELAYS_KEY, Some(relays)) => map.serialize_entry(key, relays)?,
                _ => map.serialize_entry(key, value)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields: Map<String, Value> = Map::deserialize(deserializer)?;

        // the null left behind keeps the key's position for serialization
        let relays = match fields.get_mut(RELAYS_KEY) {
            Some(value) if value.is_array() => {
                let records: Vec<NodeRecord> =
                    serde_json::from_value(value.take()).map_err(de::Error::custom)?;
                Some(records)
            }
            _ => None,
        };

        Ok(Self { fields, relays })
    }
}

/// One CSV row: a single valid endpoint of a relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointTuple {
    /// Empty when the relay had no fingerprint
    pub fingerprint: Option<String>,
    #[serde(rename = "ipaddr")]
    pub ip: String,
    pub port: u16,
}
