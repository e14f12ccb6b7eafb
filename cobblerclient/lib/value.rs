//! The value wrapper for fields that may inherit from a parent item.

use std::collections::{BTreeMap, HashMap};

use serde::{
    de::{self, DeserializeOwned},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{
    wire::{normalize, ToWire, WireValue, INHERIT_MARKER},
    DecodeError,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A field that is either set explicitly or inherited from the parent chain.
///
/// While [`is_inherited`](Self::is_inherited) is `true` there is no local value: [`value`]
/// returns `None` and nothing but the marker is ever written back. Calling [`set`](Self::set)
/// turns the field explicit.
///
/// [`value`]: Self::value
#[derive(Debug, Clone, PartialEq)]
pub struct Inheritable<T> {
    value: Option<T>,
    flattened: Option<String>,
    inherited: bool,
    raw: WireValue,
}

/// Options in effect when a response was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeContext {
    /// The server was asked to flatten structured fields into display strings.
    pub flattened: bool,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Describes the wire shape of a field's explicit value.
pub trait WireShape {
    /// Returns `true` if the explicit value travels as a map or a sequence.
    fn is_structured() -> bool;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<T> Inheritable<T> {
    /// Creates a field that inherits its value.
    pub fn inherit() -> Self {
        Self {
            value: None,
            flattened: None,
            inherited: true,
            raw: WireValue::String(INHERIT_MARKER.to_string()),
        }
    }

    /// Creates a field with an explicit value.
    pub fn explicit(value: T) -> Self {
        Self {
            value: Some(value),
            flattened: None,
            inherited: false,
            raw: WireValue::Nil,
        }
    }

    /// Returns the explicit value, or `None` while the field is inherited or only known in its
    /// flattened form.
    pub fn value(&self) -> Option<&T> {
        if self.inherited {
            return None;
        }
        self.value.as_ref()
    }

    /// Returns a mutable reference to the explicit value.
    pub fn value_mut(&mut self) -> Option<&mut T> {
        if self.inherited {
            return None;
        }
        self.value.as_mut()
    }

    /// Returns `true` if the value comes from the parent chain.
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Returns the display string sent when a flattened read was requested.
    pub fn flattened(&self) -> Option<&str> {
        self.flattened.as_deref()
    }

    /// Returns the value exactly as the server last sent it.
    pub fn raw(&self) -> &WireValue {
        &self.raw
    }

    /// Overrides the field with an explicit value.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
        self.flattened = None;
        self.inherited = false;
    }

    /// Resets the field to inherit from its parent.
    pub fn set_inherited(&mut self) {
        self.value = None;
        self.flattened = None;
        self.inherited = true;
    }
}

impl<T: DeserializeOwned + WireShape> Inheritable<T> {
    /// Decodes a raw wire value.
    ///
    /// The field is inherited when the raw value is the inheritance marker, or when a structured
    /// field arrives as a non-empty string outside of a flattened read: the only string the
    /// server puts in place of a map or a list is the marker itself.
    pub fn decode(raw: &WireValue, ctx: &DecodeContext) -> Result<Self, DecodeError> {
        if raw.is_inherit_marker() {
            return Ok(Self {
                raw: raw.clone(),
                ..Self::inherit()
            });
        }

        if let WireValue::String(s) = raw {
            if T::is_structured() && !s.is_empty() && !raw.is_null_sentinel() {
                if ctx.flattened {
                    return Ok(Self {
                        value: None,
                        flattened: Some(s.clone()),
                        inherited: false,
                        raw: raw.clone(),
                    });
                }

                return Ok(Self {
                    raw: raw.clone(),
                    ..Self::inherit()
                });
            }
        }

        Ok(Self {
            value: Some(normalize(raw)?),
            flattened: None,
            inherited: false,
            raw: raw.clone(),
        })
    }
}

impl<T: ToWire> Inheritable<T> {
    /// Returns what a `modify_*` call should send for this field, if anything.
    ///
    /// An inherited field sends the marker; a field only known in flattened form sends nothing.
    pub fn encode(&self) -> Option<WireValue> {
        if self.inherited {
            return Some(WireValue::String(INHERIT_MARKER.to_string()));
        }
        self.value.as_ref().map(ToWire::to_wire)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl<T: Default> Default for Inheritable<T> {
    fn default() -> Self {
        Self::explicit(T::default())
    }
}

impl<T> From<T> for Inheritable<T> {
    fn from(value: T) -> Self {
        Self::explicit(value)
    }
}

impl<T: Serialize> Serialize for Inheritable<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.inherited {
            return serializer.serialize_str(INHERIT_MARKER);
        }
        match (&self.value, &self.flattened) {
            (Some(value), _) => value.serialize(serializer),
            (None, Some(flattened)) => serializer.serialize_str(flattened),
            (None, None) => serializer.serialize_none(),
        }
    }
}

impl WireShape for String {
    fn is_structured() -> bool {
        false
    }
}

impl WireShape for bool {
    fn is_structured() -> bool {
        false
    }
}

impl WireShape for i64 {
    fn is_structured() -> bool {
        false
    }
}

impl WireShape for f64 {
    fn is_structured() -> bool {
        false
    }
}

impl WireShape for WireValue {
    fn is_structured() -> bool {
        false
    }
}

impl<T> WireShape for Vec<T> {
    fn is_structured() -> bool {
        true
    }
}

impl<K, V> WireShape for BTreeMap<K, V> {
    fn is_structured() -> bool {
        true
    }
}

impl<K, V> WireShape for HashMap<K, V> {
    fn is_structured() -> bool {
        true
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Deserializes an [`Inheritable`] nested inside a serde-derived type, for use with
/// `#[serde(deserialize_with = "...")]`. The field is decoded as a non-flattened read.
pub fn deserialize_inheritable<'de, D, T>(deserializer: D) -> Result<Inheritable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + WireShape,
{
    let raw = WireValue::deserialize(deserializer)?;
    Inheritable::decode(&raw, &DecodeContext::default()).map_err(de::Error::custom)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
