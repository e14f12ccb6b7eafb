use std::collections::BTreeMap;

use serde::{
    de::{
        self, value::BorrowedStrDeserializer, DeserializeOwned, DeserializeSeed, IntoDeserializer,
        MapAccess, SeqAccess, Unexpected, Visitor,
    },
    Deserialize, Deserializer,
};

use crate::DecodeError;

use super::WireValue;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A forgiving [`Deserializer`] over a borrowed [`WireValue`].
///
/// The target type decides how the value is read. On top of weak typing (numeric strings into
/// numbers, numbers into strings, a lone scalar into a one-element sequence, ...) two server
/// conventions are applied at every depth:
///
/// - the null sentinel `~` becomes the empty value of the target: an empty map, an empty
///   sequence, an empty string, or `None`. Any other target rejects it.
/// - an integer read as a boolean is `true` iff it is strictly positive.
#[derive(Debug, Clone, Copy)]
pub struct WireDeserializer<'a> {
    value: &'a WireValue,
}

struct SeqDeserializer<'a> {
    iter: std::slice::Iter<'a, WireValue>,
}

struct MapDeserializer<'a> {
    iter: std::collections::btree_map::Iter<'a, String, WireValue>,
    value: Option<&'a WireValue>,
}

struct EmptyMap;

struct WireValueVisitor;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Normalizes a raw wire value into `T`.
///
/// ## Examples
///
/// ```
/// use std::collections::HashMap;
/// use cobblerclient::wire::{normalize, WireValue};
///
/// let empty: HashMap<String, String> = normalize(&WireValue::from("~")).unwrap();
/// assert!(empty.is_empty());
///
/// let enabled: bool = normalize(&WireValue::Int(2)).unwrap();
/// assert!(enabled);
/// ```
pub fn normalize<T: DeserializeOwned>(value: &WireValue) -> Result<T, DecodeError> {
    T::deserialize(WireDeserializer::new(value))
}

/// Converts an integral double that fits in an `i64`.
fn double_to_i64(d: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    let in_range = d >= i64::MIN as f64 && d < i64::MAX as f64;
    (d.fract() == 0.0 && in_range).then_some(d as i64)
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<'a> WireDeserializer<'a> {
    /// Creates a deserializer reading from `value`.
    pub fn new(value: &'a WireValue) -> Self {
        Self { value }
    }

    fn invalid_type(&self, exp: &dyn de::Expected) -> DecodeError {
        let unexpected = match self.value {
            WireValue::Nil => Unexpected::Unit,
            WireValue::Bool(b) => Unexpected::Bool(*b),
            WireValue::Int(i) => Unexpected::Signed(*i),
            WireValue::Double(d) => Unexpected::Float(*d),
            WireValue::String(s) => Unexpected::Str(s),
            WireValue::Bytes(b) => Unexpected::Bytes(b),
            WireValue::Array(_) => Unexpected::Seq,
            WireValue::Struct(_) => Unexpected::Map,
        };
        de::Error::invalid_type(unexpected, exp)
    }

    fn sentinel_error(&self, target: &str) -> DecodeError {
        DecodeError::Message(format!(
            "null sentinel cannot be decoded into {target}; expected a map, sequence or string"
        ))
    }

    fn to_i64(&self) -> Result<i64, DecodeError> {
        match self.value {
            WireValue::Int(i) => Ok(*i),
            WireValue::Bool(b) => Ok(i64::from(*b)),
            WireValue::Double(d) => {
                double_to_i64(*d).ok_or_else(|| self.invalid_type(&"an integer"))
            }
            WireValue::String(s) if s == super::NULL_SENTINEL => {
                Err(self.sentinel_error("an integer"))
            }
            WireValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0);
                }
                trimmed.parse::<i64>().or_else(|_| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(double_to_i64)
                        .ok_or_else(|| self.invalid_type(&"an integer"))
                })
            }
            _ => Err(self.invalid_type(&"an integer")),
        }
    }

    fn to_f64(&self) -> Result<f64, DecodeError> {
        match self.value {
            WireValue::Double(d) => Ok(*d),
            WireValue::Int(i) => Ok(*i as f64),
            WireValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            WireValue::String(s) if s == super::NULL_SENTINEL => {
                Err(self.sentinel_error("a float"))
            }
            WireValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0.0);
                }
                trimmed
                    .parse::<f64>()
                    .map_err(|_| self.invalid_type(&"a float"))
            }
            _ => Err(self.invalid_type(&"a float")),
        }
    }

    fn to_bool(&self) -> Result<bool, DecodeError> {
        match self.value {
            WireValue::Bool(b) => Ok(*b),
            WireValue::Int(i) => Ok(*i > 0),
            WireValue::Double(d) => Ok(*d > 0.0),
            WireValue::String(s) if s == super::NULL_SENTINEL => {
                Err(self.sentinel_error("a boolean"))
            }
            WireValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
                "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
                other => match other.parse::<i64>() {
                    Ok(i) => Ok(i > 0),
                    Err(_) => Err(self.invalid_type(&"a boolean")),
                },
            },
            _ => Err(self.invalid_type(&"a boolean")),
        }
    }
}

impl<'a> SeqDeserializer<'a> {
    fn new(items: &'a [WireValue]) -> Self {
        Self { iter: items.iter() }
    }
}

impl<'a> MapDeserializer<'a> {
    fn new(map: &'a BTreeMap<String, WireValue>) -> Self {
        Self {
            iter: map.iter(),
            value: None,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl<'de> Deserializer<'de> for WireDeserializer<'de> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            WireValue::Nil => visitor.visit_unit(),
            WireValue::Bool(b) => visitor.visit_bool(*b),
            WireValue::Int(i) => visitor.visit_i64(*i),
            WireValue::Double(d) => visitor.visit_f64(*d),
            WireValue::String(s) => visitor.visit_borrowed_str(s),
            WireValue::Bytes(b) => visitor.visit_borrowed_bytes(b),
            WireValue::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            WireValue::Struct(map) => visitor.visit_map(MapDeserializer::new(map)),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bool(self.to_bool()?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.to_i64()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.to_i64()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.to_i64()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.to_i64()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.to_i64()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.to_i64()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.to_i64()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(self.to_i64()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_f64(self.to_f64()?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_f64(self.to_f64()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            WireValue::String(s) if s == super::NULL_SENTINEL => visitor.visit_borrowed_str(""),
            WireValue::String(s) => visitor.visit_borrowed_str(s),
            WireValue::Nil => visitor.visit_borrowed_str(""),
            WireValue::Int(i) => visitor.visit_string(i.to_string()),
            WireValue::Double(d) => visitor.visit_string(d.to_string()),
            WireValue::Bool(b) => visitor.visit_borrowed_str(if *b { "1" } else { "0" }),
            WireValue::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => visitor.visit_borrowed_str(s),
                Err(_) => Err(self.invalid_type(&visitor)),
            },
            WireValue::Array(_) | WireValue::Struct(_) => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            WireValue::Bytes(b) => visitor.visit_borrowed_bytes(b),
            WireValue::String(s) if s == super::NULL_SENTINEL => visitor.visit_borrowed_bytes(&[]),
            WireValue::String(s) => visitor.visit_borrowed_bytes(s.as_bytes()),
            WireValue::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            WireValue::Nil => visitor.visit_none(),
            value if value.is_null_sentinel() => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            WireValue::Nil => visitor.visit_unit(),
            value if value.is_null_sentinel() => visitor.visit_unit(),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            WireValue::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            WireValue::String(s) if s == super::NULL_SENTINEL || s.is_empty() => {
                visitor.visit_seq(SeqDeserializer::new(&[]))
            }
            WireValue::Nil => visitor.visit_seq(SeqDeserializer::new(&[])),
            WireValue::Struct(_) => Err(self.invalid_type(&visitor)),
            scalar => visitor.visit_seq(SeqDeserializer::new(std::slice::from_ref(scalar))),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            WireValue::Struct(map) => visitor.visit_map(MapDeserializer::new(map)),
            WireValue::String(s) if s == super::NULL_SENTINEL || s.is_empty() => {
                visitor.visit_map(EmptyMap)
            }
            WireValue::Array(items) if items.is_empty() => visitor.visit_map(EmptyMap),
            WireValue::Nil => visitor.visit_map(EmptyMap),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value {
            WireValue::String(s) => {
                visitor.visit_enum(BorrowedStrDeserializer::<DecodeError>::new(s.as_str()))
            }
            WireValue::Int(i) => visitor.visit_enum(i.to_string().into_deserializer()),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer<'de> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        match self.iter.next() {
            Some(value) => seed.deserialize(WireDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

impl<'de> MapAccess<'de> for MapDeserializer<'de> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(BorrowedStrDeserializer::new(key.as_str()))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(WireDeserializer::new(value)),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

impl<'de> MapAccess<'de> for EmptyMap {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        _seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        Ok(None)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        _seed: V,
    ) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("empty map has no values"))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

impl<'de> IntoDeserializer<'de, DecodeError> for &'de WireValue {
    type Deserializer = WireDeserializer<'de>;

    fn into_deserializer(self) -> Self::Deserializer {
        WireDeserializer::new(self)
    }
}

impl<'de> Visitor<'de> for WireValueVisitor {
    type Value = WireValue;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("any wire value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(WireValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(WireValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(WireValue::Int)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(WireValue::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(WireValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(WireValue::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(WireValue::Bytes(v.to_vec()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(WireValue::Nil)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(WireValue::Nil)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(WireValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, WireValue>()? {
            entries.insert(key, value);
        }
        Ok(WireValue::Struct(entries))
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireValueVisitor)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq, Default)]
    #[serde(default)]
    struct Nested {
        name: String,
        tags: Vec<String>,
        meta: HashMap<String, String>,
        enabled: bool,
        count: i64,
    }

    fn sentinel() -> WireValue {
        WireValue::from("~")
    }

    #[test]
    fn test_normalize_sentinel_into_empty_shapes() {
        let map: HashMap<String, WireValue> = normalize(&sentinel()).unwrap();
        assert!(map.is_empty());

        let seq: Vec<String> = normalize(&sentinel()).unwrap();
        assert!(seq.is_empty());

        let string: String = normalize(&sentinel()).unwrap();
        assert_eq!(string, "");

        let option: Option<i64> = normalize(&sentinel()).unwrap();
        assert_eq!(option, None);
    }

    #[test]
    fn test_normalize_sentinel_is_idempotent() {
        let map: HashMap<String, String> = normalize(&sentinel()).unwrap();
        let again: HashMap<String, String> =
            normalize(&WireValue::Struct(BTreeMap::new())).unwrap();
        assert_eq!(map, again);

        let seq: Vec<String> = normalize(&sentinel()).unwrap();
        let again: Vec<String> = normalize(&WireValue::Array(vec![])).unwrap();
        assert_eq!(seq, again);

        let string: String = normalize(&sentinel()).unwrap();
        let again: String = normalize(&WireValue::from("")).unwrap();
        assert_eq!(string, again);
    }

    #[test]
    fn test_normalize_sentinel_rejected_for_scalars() {
        assert!(normalize::<i64>(&sentinel()).is_err());
        assert!(normalize::<bool>(&sentinel()).is_err());
        assert!(normalize::<f64>(&sentinel()).is_err());
    }

    #[test]
    fn test_normalize_sentinel_nested() {
        let raw = WireValue::Struct(BTreeMap::from([
            ("name".to_string(), sentinel()),
            ("tags".to_string(), sentinel()),
            ("meta".to_string(), sentinel()),
            ("enabled".to_string(), WireValue::Int(1)),
            ("count".to_string(), WireValue::from("42")),
        ]));

        let nested: Nested = normalize(&raw).unwrap();
        assert_eq!(
            nested,
            Nested {
                name: String::new(),
                tags: vec![],
                meta: HashMap::new(),
                enabled: true,
                count: 42,
            }
        );

        let table = WireValue::Struct(BTreeMap::from([(
            "redhat".to_string(),
            WireValue::Struct(BTreeMap::from([(
                "rhel9".to_string(),
                WireValue::Struct(BTreeMap::from([("tags".to_string(), sentinel())])),
            )])),
        )]));
        let decoded: HashMap<String, HashMap<String, Nested>> = normalize(&table).unwrap();
        assert!(decoded["redhat"]["rhel9"].tags.is_empty());
    }

    #[test]
    fn test_normalize_int_to_bool() {
        for (raw, expected) in [(0, false), (1, true), (2, true), (-1, false), (i64::MAX, true)] {
            let decoded: bool = normalize(&WireValue::Int(raw)).unwrap();
            assert_eq!(decoded, expected, "int {raw}");
        }
    }

    #[test]
    fn test_normalize_weak_typing() {
        assert_eq!(normalize::<i64>(&WireValue::from(" 7 ")).unwrap(), 7);
        assert_eq!(normalize::<u32>(&WireValue::Double(3.0)).unwrap(), 3);
        assert_eq!(normalize::<String>(&WireValue::Int(5)).unwrap(), "5");
        assert_eq!(normalize::<f64>(&WireValue::from("1.5")).unwrap(), 1.5);
        assert!(normalize::<bool>(&WireValue::from("True")).unwrap());
        assert!(!normalize::<bool>(&WireValue::from("0")).unwrap());
        assert_eq!(
            normalize::<Vec<String>>(&WireValue::from("single")).unwrap(),
            vec!["single".to_string()]
        );
        assert!(normalize::<HashMap<String, String>>(&WireValue::Array(vec![]))
            .unwrap()
            .is_empty());
        assert!(normalize::<HashMap<String, String>>(&WireValue::from(""))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_normalize_rejects_wrong_shapes() {
        let map = WireValue::Struct(BTreeMap::from([("a".to_string(), WireValue::Int(1))]));
        assert!(normalize::<String>(&map).is_err());
        assert!(normalize::<i64>(&map).is_err());
        assert!(normalize::<Vec<String>>(&map).is_err());
        assert!(normalize::<HashMap<String, String>>(&WireValue::from("a=b")).is_err());
        assert!(normalize::<u8>(&WireValue::Int(300)).is_err());
        assert!(normalize::<i64>(&WireValue::from("seven")).is_err());
    }

    #[test]
    fn test_normalize_rejects_out_of_range_doubles() {
        assert!(normalize::<i64>(&WireValue::Double(1e30)).is_err());
        assert!(normalize::<i64>(&WireValue::Double(-1e30)).is_err());
        assert!(normalize::<i64>(&WireValue::Double(f64::NAN)).is_err());
        assert!(normalize::<i64>(&WireValue::from("1e30")).is_err());
        assert!(normalize::<i64>(&WireValue::Double(2.5)).is_err());
        assert_eq!(normalize::<i64>(&WireValue::Double(-42.0)).unwrap(), -42);
        assert_eq!(normalize::<i64>(&WireValue::from("1e3")).unwrap(), 1000);
    }

    #[test]
    fn test_wire_value_roundtrips_through_deserialize() {
        let raw = WireValue::Struct(BTreeMap::from([
            ("a".to_string(), WireValue::Array(vec![WireValue::Int(1)])),
            ("b".to_string(), WireValue::from("~")),
        ]));
        let kept: WireValue = normalize(&raw).unwrap();
        assert_eq!(kept, raw);
    }
}
