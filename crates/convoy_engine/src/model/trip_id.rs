use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a trip in the system of record.
///
/// The backend hands out integer ids but nothing in the engine relies on
/// that, so ids are kept as opaque strings. Numeric ids go back over the
/// wire as numbers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripId(String);

impl TripId {
    pub fn new(id: impl Into<String>) -> Self {
        TripId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TripId {
    fn from(id: u64) -> Self {
        TripId(id.to_string())
    }
}

impl From<&str> for TripId {
    fn from(id: &str) -> Self {
        TripId(id.to_string())
    }
}

impl From<String> for TripId {
    fn from(id: String) -> Self {
        TripId(id)
    }
}

impl Serialize for TripId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<u64>() {
            Ok(numeric) => serializer.serialize_u64(numeric),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTripId {
    Numeric(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for TripId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawTripId::deserialize(deserializer)? {
            RawTripId::Numeric(id) => TripId::from(id),
            RawTripId::Text(id) => TripId(id),
        })
    }
}
