//! Custom serialization for Record.
//!
//! Records travel as flat JSON objects. The identity is an ordinary `id`
//! key on the wire and a separate member in memory:
//!
//! - `{"id": 5, "name": "Ada", "score": 91}` reads as `Record { id: 5, .. }`
//! - a record without identity serializes without an `id` key
//! - a null `id` reads as "no identity"

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;

use super::ID_FIELD;
use super::Record;
use super::RecordId;
use super::Value;

// =============================================================================
// Serialization (for writes)
// =============================================================================

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = self.fields.len() + usize::from(self.id.is_some());
        let mut map = serializer.serialize_map(Some(len))?;

        if let Some(id) = &self.id {
            map.serialize_entry(ID_FIELD, id)?;
        }
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}

// =============================================================================
// Deserialization (from reads)
// =============================================================================

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map representing a record")
    }

    fn visit_map<M>(self, mut map: M) -> Result<Record, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut id: Option<RecordId> = None;
        let mut fields: HashMap<String, Value> = HashMap::new();

        while let Some(key) = map.next_key::<String>()? {
            if key == ID_FIELD {
                id = map.next_value::<Option<RecordId>>()?;
            } else {
                let value: Value = map.next_value()?;
                fields.insert(key, value);
            }
        }

        Ok(Record { id, fields })
    }
}
