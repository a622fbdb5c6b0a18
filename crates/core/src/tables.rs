//! Reference tables for LTV and interest-rate lookup
//!
//! All three tables are read-only after loading. Row and column order is
//! taken from the source document and drives the order of rendered
//! matrices, so tables are kept in an order-preserving map.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// String-keyed map that remembers insertion order.
///
/// Duplicate keys keep their first position and take the last value, which
/// matches how a JSON object with repeated keys is read by a browser.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedTable<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for OrderedTable<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> OrderedTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if let Some(pos) = self.index.get(&key).copied() {
            return Some(std::mem::replace(&mut self.entries[pos].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedTable<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

impl<V: Serialize> Serialize for OrderedTable<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedTableVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedTableVisitor<V> {
    type Value = OrderedTable<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map with string keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = OrderedTable::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            table.insert(key, value);
        }
        Ok(table)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedTable<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedTableVisitor(PhantomData))
    }
}

/// Percentage value read from a table cell.
///
/// Cells are stored either as strings ("4.5%", "70") or as plain numbers.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percent(f64);

impl Percent {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Parse "4.5%", " 4.5 " or "4.5"; rejects empty and non-finite input
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_end_matches('%').trim_end();
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Self)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) if v.is_finite() => Ok(Percent(v)),
            Raw::Number(v) => Err(de::Error::custom(format!("non-finite percentage {}", v))),
            Raw::Text(s) => Percent::parse(&s)
                .ok_or_else(|| de::Error::custom(format!("invalid percentage '{}'", s))),
        }
    }
}

/// Normalized region name -> tier
pub type RegionTierTable = OrderedTable<u8>;

/// Credit-band label -> region-tier key -> LTV ceiling
pub type LtvTable = OrderedTable<OrderedTable<Percent>>;

/// Credit-band label -> LTV-range label -> base interest rate
pub type RateTable = OrderedTable<OrderedTable<Percent>>;

/// The three reference tables, loaded together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTables {
    pub regions: RegionTierTable,
    pub ltv: LtvTable,
    pub rates: RateTable,
}

impl RateTables {
    pub fn new(regions: RegionTierTable, ltv: LtvTable, rates: RateTable) -> Self {
        Self { regions, ltv, rates }
    }

    /// Column labels in first-seen order across all rows
    pub fn column_union(table: &OrderedTable<OrderedTable<Percent>>) -> Vec<String> {
        let mut seen = OrderedTable::<()>::new();
        for (_, row) in table.iter() {
            for key in row.keys() {
                if !seen.contains_key(key) {
                    seen.insert(key, ());
                }
            }
        }
        seen.keys().map(str::to_string).collect()
    }
}
