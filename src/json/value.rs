//! Tagged value type for ad hoc JSON-shaped data.
//!
//! Flattened records travel through the pipeline as [`FieldMap`]s of
//! [`JsonValue`]s: a closed set of leaf kinds (string, number, bool,
//! date, null) plus nested arrays and mappings. The writer serializes a
//! whole value in one call by matching on the tag, which preserves the
//! "serialize anything shaped like JSON" contract without reflection.

use chrono::{DateTime, Utc};

/// A JSON-shaped value.
///
/// `Date` is kept as its own variant even though JSON has no date type:
/// the writer encodes it as integer milliseconds since the Unix epoch,
/// and keeping the tag distinct means a boolean can never be confused
/// with a numeric 0/1 nor a date with a plain number.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    /// A string value.
    String(String),
    /// A finite numeric value.
    Number(f64),
    /// A boolean value.
    Bool(bool),
    /// A timestamp, serialized as milliseconds since the Unix epoch.
    Date(DateTime<Utc>),
    /// A null value.
    Null,
    /// A nested array.
    Array(Vec<JsonValue>),
    /// A nested mapping with insertion-ordered fields.
    Object(FieldMap),
}

impl JsonValue {
    /// Returns the string content if this is a `String` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric content if this is a `Number` value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the numeric content truncated to an integer, if numeric.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        #[allow(clippy::cast_possible_truncation)]
        match self {
            Self::Number(n) => Some(*n as i64),
            _ => None,
        }
    }

    /// Returns the nested array if this is an `Array` value.
    #[must_use]
    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the nested mapping if this is an `Object` value.
    #[must_use]
    pub fn as_object(&self) -> Option<&FieldMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for JsonValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for JsonValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for JsonValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for JsonValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for JsonValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for JsonValue {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<FieldMap> for JsonValue {
    fn from(map: FieldMap) -> Self {
        Self::Object(map)
    }
}

impl From<Vec<JsonValue>> for JsonValue {
    fn from(items: Vec<JsonValue>) -> Self {
        Self::Array(items)
    }
}

/// An insertion-ordered string-keyed mapping.
///
/// Field order is significant: the round-trip law requires documents to
/// serialize with keys in the order they were written, so a hash map
/// will not do. Lookups are linear, which is fine for record dicts with
/// a handful of fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: Vec<(String, JsonValue)>,
}

impl FieldMap {
    /// Creates an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing any existing value for the key in
    /// place (the original position is kept).
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Returns the value for a key, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns whether the map contains a key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the map has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a JsonValue);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, JsonValue)>,
        fn(&'a (String, JsonValue)) -> (&'a String, &'a JsonValue),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn pair(entry: &(String, JsonValue)) -> (&String, &JsonValue) {
            (&entry.0, &entry.1)
        }
        self.fields.iter().map(pair)
    }
}

impl FromIterator<(String, JsonValue)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (String, JsonValue)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.put(k, v);
        }
        map
    }
}

/// Renders a finite f64 the way the codec writes numbers.
///
/// Integral values within i64 range print without a fractional part, so
/// millisecond epoch timestamps and counts round-trip byte for byte.
#[must_use]
pub fn format_number(n: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    if n.fract() == 0.0 && n.abs() < 9.2e18 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_map_keeps_insertion_order() {
        let mut map = FieldMap::new();
        map.put("sdate", 1_700_000_000_000_i64);
        map.put("value", 1_i64);
        map.put("sdate", 1_700_000_000_001_i64);

        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["sdate", "value"]);
        assert_eq!(map.get("sdate").unwrap().as_i64(), Some(1_700_000_000_001));
    }

    #[test]
    fn test_format_number_integral() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1_700_000_000_000.0), "1700000000000");
        assert_eq!(format_number(-42.0), "-42");
    }

    #[test]
    fn test_format_number_fractional() {
        assert_eq!(format_number(1.6), "1.6");
        assert_eq!(format_number(-0.25), "-0.25");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(JsonValue::from("x").as_str(), Some("x"));
        assert_eq!(JsonValue::from(3_i64).as_i64(), Some(3));
        assert!(JsonValue::Null.as_str().is_none());
    }
}
