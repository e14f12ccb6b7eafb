//! The loosely-typed value tree exchanged with the server, and its conversions.
//!
//! Everything the transport decodes from a response envelope arrives as a [`WireValue`]. The
//! [`normalize`] function turns such a tree into a typed value, applying the server's null
//! sentinel and integer-as-boolean conventions at every depth. [`ToWire`] goes the other way for
//! the arguments of `modify_*` calls.

mod de;
mod encode;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use de::*;
pub use encode::*;

use std::{collections::BTreeMap, fmt};

use serde::{ser::SerializeMap, ser::SerializeSeq, Serialize, Serializer};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The string the server sends in place of "no value".
pub const NULL_SENTINEL: &str = "~";

/// The string the server sends for a field whose value comes from the parent object.
pub const INHERIT_MARKER: &str = "<<inherit>>";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A dynamically-typed value as carried by the RPC envelope.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WireValue {
    /// An explicit nil.
    #[default]
    Nil,

    /// A boolean.
    Bool(bool),

    /// A 64-bit integer.
    Int(i64),

    /// A 64-bit float.
    Double(f64),

    /// A string.
    String(String),

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// An ordered sequence.
    Array(Vec<WireValue>),

    /// A mapping with string keys.
    Struct(BTreeMap<String, WireValue>),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl WireValue {
    /// Returns `true` if this is the server's null sentinel.
    pub fn is_null_sentinel(&self) -> bool {
        matches!(self, WireValue::String(s) if s == NULL_SENTINEL)
    }

    /// Returns `true` if this is the inheritance marker.
    pub fn is_inherit_marker(&self) -> bool {
        matches!(self, WireValue::String(s) if s == INHERIT_MARKER)
    }

    /// Returns `true` for values the server treats as "nothing": `false`, zero, empty strings and
    /// empty collections.
    pub fn is_falsy(&self) -> bool {
        match self {
            WireValue::Nil => true,
            WireValue::Bool(b) => !b,
            WireValue::Int(i) => *i == 0,
            WireValue::Double(d) => *d == 0.0,
            WireValue::String(s) => s.is_empty(),
            WireValue::Bytes(b) => b.is_empty(),
            WireValue::Array(a) => a.is_empty(),
            WireValue::Struct(m) => m.is_empty(),
        }
    }

    /// Returns the string if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the mapping if this value is one.
    pub fn as_struct(&self) -> Option<&BTreeMap<String, WireValue>> {
        match self {
            WireValue::Struct(m) => Some(m),
            _ => None,
        }
    }

    /// Returns a short name for the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Nil => "nil",
            WireValue::Bool(_) => "boolean",
            WireValue::Int(_) => "integer",
            WireValue::Double(_) => "double",
            WireValue::String(_) => "string",
            WireValue::Bytes(_) => "bytes",
            WireValue::Array(_) => "array",
            WireValue::Struct(_) => "struct",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Nil => write!(f, "nil"),
            WireValue::Bool(b) => write!(f, "{b}"),
            WireValue::Int(i) => write!(f, "{i}"),
            WireValue::Double(d) => write!(f, "{d}"),
            WireValue::String(s) => write!(f, "{s:?}"),
            WireValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            WireValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            WireValue::Struct(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for WireValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            WireValue::Nil => serializer.serialize_unit(),
            WireValue::Bool(b) => serializer.serialize_bool(*b),
            WireValue::Int(i) => serializer.serialize_i64(*i),
            WireValue::Double(d) => serializer.serialize_f64(*d),
            WireValue::String(s) => serializer.serialize_str(s),
            WireValue::Bytes(b) => serializer.serialize_bytes(b),
            WireValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            WireValue::Struct(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<i32> for WireValue {
    fn from(value: i32) -> Self {
        WireValue::Int(value.into())
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Int(value)
    }
}

impl From<f64> for WireValue {
    fn from(value: f64) -> Self {
        WireValue::Double(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::String(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::String(value)
    }
}

impl From<&String> for WireValue {
    fn from(value: &String) -> Self {
        WireValue::String(value.clone())
    }
}

impl<T: Into<WireValue>> From<Vec<T>> for WireValue {
    fn from(value: Vec<T>) -> Self {
        WireValue::Array(value.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, WireValue>> for WireValue {
    fn from(value: BTreeMap<String, WireValue>) -> Self {
        WireValue::Struct(value)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
