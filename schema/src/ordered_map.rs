//! Serde helpers for JSON objects whose key order is significant
//!
//! Enum variants and basic type layouts are rendered as JSON objects but must keep their
//! declaration order, so they are stored as pairs and written with `collect_map`.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Write `(key, value)` pairs as a JSON object in slice order
pub fn serialize_pairs<S, K, V>(pairs: &[(K, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    K: AsRef<str>,
    V: Serialize,
{
    serializer.collect_map(pairs.iter().map(|(key, value)| (key.as_ref(), value)))
}

/// Read a JSON object into `(key, value)` pairs in document order
pub fn deserialize_pairs<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    deserializer.deserialize_map(PairsVisitor(PhantomData))
}

struct PairsVisitor<V>(PhantomData<V>);

impl<'de, V> Visitor<'de> for PairsVisitor<V>
where
    V: Deserialize<'de>,
{
    type Value = Vec<(String, V)>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, V>()? {
            pairs.push((key, value));
        }
        Ok(pairs)
    }
}
